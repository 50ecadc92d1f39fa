//! Error types and result alias for the mac-hotkey crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A Carbon event-manager call returned a non-zero `OSStatus`.
    #[error("{op} failed with OSStatus {status}")]
    OsStatus {
        /// Name of the failing call.
        op: &'static str,
        /// Raw status code.
        status: i32,
    },
    /// The handle does not refer to a live registration or handler.
    #[error("Invalid registration handle")]
    UnknownHandle,
    /// Global hot-keys are not available on this platform.
    #[error("Global hot-keys are not supported on this platform")]
    Unsupported,
}
