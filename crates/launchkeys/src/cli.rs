//! Command-line interface definitions for launchkeys.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use config::LaunchBehavior;
use keyslot::KeySlot;
use logging::LogArgs;

/// Command-line interface for the `launchkeys` binary.
#[derive(Parser, Debug)]
#[command(
    name = "launchkeys",
    about = "Launch or focus applications from the function keys",
    version
)]
pub struct Cli {
    /// Logging controls shared across launchkeys binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Settings file (defaults to $LAUNCHKEYS_SETTINGS or ~/.launchkeys/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// What to do; `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Register the function-key hot-keys and handle presses until interrupted.
    Run,
    /// Show every slot and its application.
    List,
    /// Bind a function key to an application.
    Assign {
        /// Function key: F1..F12 or 1..12.
        slot: KeySlot,
        /// Path to the application bundle.
        path: PathBuf,
    },
    /// Remove the binding for a function key.
    Clear {
        /// Function key: F1..F12 or 1..12.
        slot: KeySlot,
    },
    /// Focus or start a slot's application once, as a key press would.
    Launch {
        /// Function key: F1..F12 or 1..12.
        slot: KeySlot,
    },
    /// Show or set what happens when the application is already running.
    Behavior {
        /// New behavior (focus-existing or launch-new-instance); prints the
        /// current one when omitted.
        value: Option<LaunchBehavior>,
    },
    /// Show or set whether launchkeys starts at login.
    Login {
        /// New setting; prints the current one when omitted.
        value: Option<Toggle>,
    },
}

/// On/off switch.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Enable.
    On,
    /// Disable.
    Off,
}

impl Toggle {
    /// Whether this is [`Toggle::On`].
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}
