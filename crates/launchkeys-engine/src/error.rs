use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the launchkeys engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors originating from the mac-hotkey layer.
    #[error("Hotkey error: {0}")]
    Hotkey(#[from] mac_hotkey::Error),
}
