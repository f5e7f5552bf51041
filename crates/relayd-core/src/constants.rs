//! Protocol and configuration constants for relayd.

use std::time::Duration;

// =============================================================================
// Module Protocol Constants
// =============================================================================

/// Number of relay outputs on the module.
///
/// The writeall command encodes the full state as one two-digit hex byte,
/// which caps the addressable relay count at 8.
pub const NUM_RELAYS: usize = 8;

/// Default telnet port on the module.
pub const DEFAULT_MODULE_PORT: u16 = 23;

/// Prompt emitted by the module when it wants the login name.
pub const USER_PROMPT: &str = "User Name: ";

/// Prompt emitted by the module when it wants the password.
pub const PASSWORD_PROMPT: &str = "Password: ";

/// Prompt emitted by the module when it is ready for a command.
pub const COMMAND_PROMPT: &str = ">";

/// Line prefix the module prints on successful authentication.
pub const LOGIN_BANNER: &str = "Logged in successfully";

// =============================================================================
// Timing Constants
// =============================================================================

/// Deadline for each read while waiting on a prompt or banner line.
pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for the TCP connect to the module.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default inactivity window before the module session is closed.
pub const DEFAULT_IDLE_DISCONNECT: Duration = Duration::from_secs(20);

/// Default interval after which a non-zero state is re-asserted to guard
/// against the module losing it (e.g. power cycle).
pub const DEFAULT_DRIFT_INTERVAL: Duration = Duration::from_secs(120);

/// Pause before the serving cycle is restarted after a listener failure.
pub const RESTART_BACKOFF: Duration = Duration::from_millis(500);
