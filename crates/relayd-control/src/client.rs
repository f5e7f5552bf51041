//! Control socket client.

use bytes::BytesMut;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use crate::protocol;
use crate::socket::{default_socket_path, SocketError, SocketResult};
use crate::types::{Request, Response, Zone};

/// Client for sending requests to a running gateway.
pub struct ControlClient {
    stream: UnixStream,
    read_buffer: BytesMut,
}

impl ControlClient {
    /// Connect to the gateway at the default socket path.
    pub async fn connect() -> SocketResult<Self> {
        Self::connect_path(&default_socket_path()).await
    }

    /// Connect to the gateway at a specific socket path.
    pub async fn connect_path(path: &Path) -> SocketResult<Self> {
        debug!(path = %path.display(), "connecting to control socket");
        let stream = UnixStream::connect(path).await?;
        Ok(Self {
            stream,
            read_buffer: BytesMut::with_capacity(4096),
        })
    }

    /// Send one request and wait for its response.
    pub async fn send(&mut self, request: &Request) -> SocketResult<Response> {
        let frame = protocol::encode(request).map_err(|e| SocketError::Codec(e.to_string()))?;
        self.stream.write_all(&frame).await?;

        loop {
            if let Some(response) = protocol::try_decode::<Response>(&mut self.read_buffer)
                .map_err(|e| SocketError::Codec(e.to_string()))?
            {
                return Ok(response);
            }

            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(SocketError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "gateway closed the connection",
                )));
            }
            self.read_buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Command a set of relays on or off.
    pub async fn set_zones(&mut self, zones: Vec<Zone>) -> SocketResult<Response> {
        self.send(&Request::set(zones)).await
    }

    /// Ask for the pin count of the given I/O type.
    pub async fn count(&mut self, io_type: &str) -> SocketResult<Response> {
        self.send(&Request::count(io_type)).await
    }
}
