//! Wire codec for the control socket.
//!
//! The wire format is a u32 little-endian length prefix (4 bytes) followed
//! by a JSON payload. Both directions use the same framing.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Length of the frame header (4 bytes, little-endian u32).
const FRAME_HEADER_LEN: usize = 4;

/// Maximum payload size (64 KB). Control frames are tiny; anything bigger
/// is a corrupt or hostile stream.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Errors that can occur during encoding/decoding.
#[derive(Debug)]
pub enum ProtocolError {
    /// Payload exceeds the frame size limit.
    MessageTooLarge { size: usize, max: usize },
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MessageTooLarge { size, max } => {
                write!(f, "message too large: {} bytes (max {})", size, max)
            }
            ProtocolError::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Json(e)
    }
}

/// Encode a message with its length prefix.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes, ProtocolError> {
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_u32_le(payload.len() as u32);
    buf.extend_from_slice(&payload);
    Ok(buf.freeze())
}

/// Try to decode one message from a buffer, consuming it on success.
///
/// Returns `Ok(Some(message))` when a complete frame was decoded,
/// `Ok(None)` when more bytes are needed, or `Err` on a protocol error.
pub fn try_decode<T: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<T>, ProtocolError> {
    if buf.len() < FRAME_HEADER_LEN {
        return Ok(None);
    }

    let len = (&buf[..FRAME_HEADER_LEN]).get_u32_le() as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    if buf.len() < FRAME_HEADER_LEN + len {
        return Ok(None);
    }

    buf.advance(FRAME_HEADER_LEN);
    let payload = buf.split_to(len);
    let message = serde_json::from_slice(&payload)?;
    Ok(Some(message))
}
