//! Test utilities for relayd.
//!
//! Provides a scripted fake relay module that speaks the device's telnet
//! dialogue over in-memory streams, so protocol and reconciliation logic
//! can be tested without hardware.

pub mod fake_module;

pub use fake_module::{FailureMode, FakeConnector, FakeModule};
