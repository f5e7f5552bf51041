//! relayd-control: control socket protocol and client.
//!
//! Defines the JSON request/response types exchanged with the gateway, the
//! length-prefixed wire framing, Unix socket path resolution, and a client
//! for sending requests.

pub mod client;
pub mod protocol;
pub mod socket;
pub mod types;

pub use client::ControlClient;
pub use protocol::ProtocolError;
pub use socket::{SocketError, SocketResult};
pub use types::{Request, Response, Zone};
