//! Unix socket path handling for the control interface.
//!
//! Socket path strategy:
//! - $XDG_RUNTIME_DIR/relayd/relayd.sock when a runtime dir is available
//! - /tmp/relayd-<uid>.sock as the fallback

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

/// Errors that can occur during socket setup.
#[derive(Debug)]
pub enum SocketError {
    /// I/O error.
    Io(std::io::Error),
    /// Protocol/codec error on an established connection.
    Codec(String),
    /// Path exists but is not a socket.
    NotASocket(PathBuf),
}

impl std::fmt::Display for SocketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketError::Io(e) => write!(f, "I/O error: {}", e),
            SocketError::Codec(message) => write!(f, "codec error: {}", message),
            SocketError::NotASocket(path) => {
                write!(f, "path exists but is not a socket: {}", path.display())
            }
        }
    }
}

impl std::error::Error for SocketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SocketError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SocketError {
    fn from(e: std::io::Error) -> Self {
        SocketError::Io(e)
    }
}

/// Result type for socket operations.
pub type SocketResult<T> = std::result::Result<T, SocketError>;

/// Resolve the default control socket path.
///
/// Prefers $XDG_RUNTIME_DIR/relayd/relayd.sock for per-user isolation and
/// falls back to /tmp/relayd-<uid>.sock.
pub fn default_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        let dir = PathBuf::from(runtime_dir).join("relayd");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir.join("relayd.sock");
        }
    }

    let uid = unsafe { libc::geteuid() };
    PathBuf::from(format!("/tmp/relayd-{}.sock", uid))
}

/// Clear the way for binding a listener at `path`.
///
/// A stale socket left by a previous run is removed; anything else at the
/// path is refused rather than clobbered.
pub fn prepare_socket_path(path: &Path) -> SocketResult<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            std::fs::remove_file(path)?;
            Ok(())
        }
        Ok(_) => Err(SocketError::NotASocket(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("relayd-socket-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn missing_path_is_fine() {
        let path = scratch_path("missing");
        prepare_socket_path(&path).unwrap();
    }

    #[test]
    fn regular_file_is_refused() {
        let path = scratch_path("regular");
        std::fs::write(&path, b"not a socket").unwrap();

        let result = prepare_socket_path(&path);
        assert!(matches!(result, Err(SocketError::NotASocket(_))));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn stale_socket_is_removed() {
        let path = scratch_path("stale");
        let _ = std::fs::remove_file(&path);
        let listener = tokio::net::UnixListener::bind(&path).unwrap();
        drop(listener);

        prepare_socket_path(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn default_path_is_absolute() {
        assert!(default_socket_path().is_absolute());
    }
}
