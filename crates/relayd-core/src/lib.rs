//! relayd-core: gateway logic for driving a telnet-administered relay module.
//!
//! This crate provides:
//! - The relay state model and its overlay-biased merge
//! - A telnet-aware byte transport with per-read deadlines
//! - The prompt scanner and module session client (login handshake, writeall)
//! - The single-slot connection lifecycle
//! - The belief-tracking reconciliation engine
//! - Error taxonomy and logging setup

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod reconcile;
pub mod session;
pub mod states;
pub mod telnet;

pub use config::{GatewayConfig, ModuleInfo};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat};
pub use states::RelayStates;
