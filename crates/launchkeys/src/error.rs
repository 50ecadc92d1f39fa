//! Error handling for the launchkeys binary.

use std::{io, path::PathBuf, result};

use keyslot::KeySlot;
use thiserror::Error;

/// Convenient result type for launchkeys commands.
pub type Result<T> = result::Result<T, Error>;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be read or written.
    #[error("Settings error: {0}")]
    Config(#[from] config::Error),
    /// The engine could not start.
    #[error("Engine error: {0}")]
    Engine(#[from] launchkeys_engine::Error),
    /// The interrupt handler could not be installed.
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    /// A path could not be made absolute.
    #[error("Invalid path {}: {source}", path.display())]
    Path {
        /// The offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Only application bundles can be bound.
    #[error("{} is not an application bundle (.app)", .0.display())]
    NotAnApplication(PathBuf),
    /// The slot has no binding.
    #[error("{0} is not assigned")]
    NotAssigned(KeySlot),
    /// The launch failed.
    #[error("Launch failed: {0}")]
    Launch(String),
}
