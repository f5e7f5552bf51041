//! Error types for relayd-core.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from underlying system calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure to reach the module.
    #[error("connect failed: {message}")]
    Connect { message: String },

    /// Login handshake failed at a specific step.
    #[error("login failed at {step}: {message}")]
    Login {
        step: &'static str,
        message: String,
    },

    /// Writeall command or the post-write prompt wait failed.
    #[error("write failed: {message}")]
    Write { message: String },

    /// Malformed or unsupported incoming request.
    #[error("bad request: {message}")]
    Request { message: String },

    /// Operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// Connection was closed by the peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// Invalid session state for the attempted operation.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Protocol violation on the control socket.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl Error {
    /// Returns true if this error taints the module session.
    ///
    /// The session slot must be dropped on these so the next request
    /// reconnects from a clean slate.
    pub fn drops_session(&self) -> bool {
        matches!(
            self,
            Error::Connect { .. }
                | Error::Login { .. }
                | Error::Write { .. }
                | Error::Timeout
                | Error::ConnectionClosed
                | Error::Io(_)
        )
    }

    /// Returns true if this error is the client's fault.
    ///
    /// Request faults never touch the device and leave the belief unchanged.
    pub fn is_request_fault(&self) -> bool {
        matches!(self, Error::Request { .. })
    }
}

/// Convenience result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_login() {
        let err = Error::Login {
            step: "password prompt",
            message: "operation timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "login failed at password prompt: operation timed out"
        );
    }

    #[test]
    fn error_display_invalid_state() {
        let err = Error::InvalidState {
            expected: "Ready".into(),
            actual: "Disconnected".into(),
        };
        assert_eq!(err.to_string(), "invalid state: expected Ready, got Disconnected");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn session_dropping_errors() {
        assert!(Error::Write {
            message: "prompt wait failed".into()
        }
        .drops_session());
        assert!(Error::Timeout.drops_session());
        assert!(Error::ConnectionClosed.drops_session());
        assert!(Error::Login {
            step: "login banner",
            message: "connection closed".into()
        }
        .drops_session());

        // Request faults never touch the session
        assert!(!Error::Request {
            message: "unknown method".into()
        }
        .drops_session());
    }

    #[test]
    fn request_faults() {
        assert!(Error::Request {
            message: "unknown method: toggle".into()
        }
        .is_request_fault());
        assert!(!Error::Timeout.is_request_fault());
    }
}
