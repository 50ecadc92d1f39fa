use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Errors from application operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No application bundle exists at the path.
    #[error("no application at {}", .0.display())]
    NotFound(PathBuf),

    /// The OS failed to open the application.
    #[error("launch failed: {0}")]
    Launch(String),

    /// Application control is not available on this platform.
    #[error("application control is not supported on this platform")]
    Unsupported,
}

/// Result alias for application operations.
pub type Result<T> = StdResult<T, Error>;
