//! Request and response types for the relayd control protocol.

use serde::{Deserialize, Serialize};

/// Method name for setting relay outputs.
pub const METHOD_SET: &str = "set";
/// Method name for counting I/O pins.
pub const METHOD_COUNT: &str = "count";

/// I/O type token for binary inputs.
pub const IO_TYPE_INPUT: &str = "bi";
/// I/O type token for binary outputs.
pub const IO_TYPE_OUTPUT: &str = "bo";

/// One incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Method name.
    pub method: String,
    /// Zone entries for `set`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<Zone>,
    /// I/O type selector for `count`.
    #[serde(
        rename = "io type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub io_type: Option<String>,
}

impl Request {
    /// Build a `set` request.
    pub fn set(zones: Vec<Zone>) -> Self {
        Self {
            method: METHOD_SET.to_string(),
            zones,
            io_type: None,
        }
    }

    /// Build a `count` request.
    pub fn count(io_type: impl Into<String>) -> Self {
        Self {
            method: METHOD_COUNT.to_string(),
            zones: Vec::new(),
            io_type: Some(io_type.into()),
        }
    }
}

/// One zone entry in a `set` request.
///
/// Both fields are optional on the wire; an entry missing either, or
/// carrying an unrecognized state, is skipped by the gateway without
/// failing the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Relay index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Desired state, "on" or "off" (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Zone {
    /// Zone entry commanding a relay on.
    pub fn on(id: u32) -> Self {
        Self {
            id: Some(id),
            state: Some("on".to_string()),
        }
    }

    /// Zone entry commanding a relay off.
    pub fn off(id: u32) -> Self {
        Self {
            id: Some(id),
            state: Some("off".to_string()),
        }
    }

    /// Case-insensitive state parse; `None` when missing or unrecognized.
    pub fn parsed_state(&self) -> Option<bool> {
        match self.state.as_deref()?.to_ascii_lowercase().as_str() {
            "on" => Some(true),
            "off" => Some(false),
            _ => None,
        }
    }
}

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the request was carried out.
    pub result: bool,
    /// Failure description when `result` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pin count answer for `count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl Response {
    /// Successful reply.
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
            count: None,
        }
    }

    /// Failed reply with a description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(error.into()),
            count: None,
        }
    }

    /// Successful `count` reply.
    pub fn counted(count: u32) -> Self {
        Self {
            result: true,
            error: None,
            count: Some(count),
        }
    }
}
