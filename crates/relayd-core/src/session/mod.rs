//! Module session management: the authenticated telnet client and the
//! single-slot connection lifecycle.

pub mod client;
pub mod slot;

pub use client::{ModuleClient, SessionStatus};
pub use slot::{ModuleConnector, SessionSlot, TcpConnector};
