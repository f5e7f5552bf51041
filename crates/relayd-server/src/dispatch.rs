//! Decode control requests into actions for the gateway.

use tracing::warn;

use relayd_control::types::{Request, IO_TYPE_INPUT, IO_TYPE_OUTPUT, METHOD_COUNT, METHOD_SET};
use relayd_core::constants::NUM_RELAYS;
use relayd_core::error::{Error, Result};
use relayd_core::states::RelayStates;

/// What a decoded request asks the gateway to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Apply relay output intents.
    Set(RelayStates),
    /// Report a pin count.
    Count(u32),
}

/// Decode one request.
///
/// An unknown method or a `count` without an I/O type fails the whole
/// request; a malformed zone entry only skips that zone.
pub fn dispatch(request: &Request) -> Result<Action> {
    match request.method.as_str() {
        METHOD_SET => Ok(Action::Set(decode_zones(request))),
        METHOD_COUNT => Ok(Action::Count(count_pins(request)?)),
        other => Err(Error::Request {
            message: format!("unknown method: {}", other),
        }),
    }
}

fn decode_zones(request: &Request) -> RelayStates {
    let mut states = RelayStates::new();
    for zone in &request.zones {
        let Some(id) = zone.id else {
            warn!("zone entry without id skipped");
            continue;
        };
        if id as usize >= NUM_RELAYS {
            warn!(id, "zone id out of range, skipped");
            continue;
        }
        let Some(on) = zone.parsed_state() else {
            warn!(id, state = ?zone.state, "unrecognized zone state, skipped");
            continue;
        };
        states.set(id as usize, on);
    }
    states
}

fn count_pins(request: &Request) -> Result<u32> {
    match request.io_type.as_deref() {
        Some(IO_TYPE_OUTPUT) => Ok(NUM_RELAYS as u32),
        Some(IO_TYPE_INPUT) => Ok(0),
        // unknown io types count zero pins rather than failing
        Some(_) => Ok(0),
        None => Err(Error::Request {
            message: "count requires an io type".to_string(),
        }),
    }
}
