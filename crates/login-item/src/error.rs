//! Error types for login-item registration.
use std::result::Result as StdResult;

use thiserror::Error;

/// Result alias for this crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors raised when changing the login-item registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The OS refused to register or unregister the app.
    #[error("login item registration failed: {0}")]
    Registration(String),
    /// Login items are not available on this platform.
    #[error("login items are not supported on this platform")]
    Unsupported,
}
