//! Gateway configuration types.

use std::time::Duration;

use crate::constants::{
    CONNECT_TIMEOUT, DEFAULT_DRIFT_INTERVAL, DEFAULT_IDLE_DISCONNECT, DEFAULT_MODULE_PORT,
    PROMPT_TIMEOUT,
};

/// How to reach and authenticate against the relay module.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    /// Module address (IP or hostname).
    pub address: String,
    /// Telnet port.
    pub port: u16,
    /// Login user name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl ModuleInfo {
    /// Create module info on the default telnet port.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_MODULE_PORT,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Set a non-default port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Settings consumed by the gateway core.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Module connection and credentials.
    pub module: ModuleInfo,
    /// Inactivity window after which the module session is closed.
    pub idle_disconnect: Duration,
    /// Interval after which a non-zero state is re-asserted.
    pub drift_interval: Duration,
    /// Per-read deadline while waiting on prompts.
    pub prompt_timeout: Duration,
    /// Deadline for the TCP connect to the module.
    pub connect_timeout: Duration,
}

impl GatewayConfig {
    /// Create a config with default timing for the given module.
    pub fn new(module: ModuleInfo) -> Self {
        Self {
            module,
            idle_disconnect: DEFAULT_IDLE_DISCONNECT,
            drift_interval: DEFAULT_DRIFT_INTERVAL,
            prompt_timeout: PROMPT_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Set the idle disconnect window.
    pub fn with_idle_disconnect(mut self, window: Duration) -> Self {
        self.idle_disconnect = window;
        self
    }

    /// Set the drift-correction interval.
    pub fn with_drift_interval(mut self, interval: Duration) -> Self {
        self.drift_interval = interval;
        self
    }

    /// Set the per-read prompt deadline.
    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Set the connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
