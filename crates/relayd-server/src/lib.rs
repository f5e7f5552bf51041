//! relayd-server: the gateway daemon.
//!
//! Listens on a Unix control socket, decodes set/count requests, and
//! drives the relay module through the core reconciliation engine.

pub mod cli;
pub mod dispatch;
pub mod gateway;

pub use cli::Cli;
pub use gateway::Gateway;
