//! Error types for settings persistence.

use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while reading or writing settings.
pub enum Error {
    #[error("I/O error at {}: {source}", path.display())]
    /// Filesystem failure while persisting the defaults file.
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    #[error("failed to decode settings: {0}")]
    /// Persisted data could not be decoded.
    Decode(#[source] serde_json::Error),
    #[error("failed to encode settings: {0}")]
    /// A value could not be serialized.
    Encode(#[source] serde_json::Error),
    #[error("unknown launch behavior: {0}")]
    /// A launch behavior name did not parse.
    UnknownBehavior(String),
    #[error("failed to watch settings: {0}")]
    /// The settings file could not be watched for changes.
    Watch(#[from] notify::Error),
    #[error(transparent)]
    /// The OS rejected a login-item change.
    LoginItem(#[from] login_item::Error),
}

impl Error {
    /// Wrap an I/O error with the path it concerns.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for settings operations.
pub type Result<T> = StdResult<T, Error>;
