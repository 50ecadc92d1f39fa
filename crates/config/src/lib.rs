//! Persisted launcher settings.
//!
//! Everything the launcher remembers lives in one JSON object file, the
//! defaults file, wrapped by [`Defaults`]. Two typed stores sit on top:
//! [`BindingStore`] for the function-key table and [`LaunchPolicyStore`] for
//! the focus/launch preference and the start-at-login flag. A
//! [`SettingsWatcher`] signals when another process rewrites the file.
#![allow(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

mod bindings;
mod defaults;
mod error;
mod policy;
mod watch;

#[cfg(test)]
mod test_bindings;

pub use bindings::{
    Binding, BindingStore, BindingTable, BindingsChanged, MAPPINGS_KEY, Subscription,
};
pub use defaults::Defaults;
pub use error::{Error, Result};
pub use policy::{LAUNCH_BEHAVIOR_KEY, LaunchBehavior, LaunchPolicyStore, START_AT_LOGIN_KEY};
pub use watch::SettingsWatcher;

/// Environment variable naming an alternate defaults file.
pub const SETTINGS_ENV: &str = "LAUNCHKEYS_SETTINGS";

/// Determine the preferred settings path (`~/.launchkeys/settings.json`).
pub fn default_settings_path() -> PathBuf {
    settings_under(env::var_os("HOME"))
}

fn settings_under(home: Option<OsString>) -> PathBuf {
    let mut p = PathBuf::from(home.unwrap_or_default());
    p.push(".launchkeys");
    p.push("settings.json");
    p
}

/// Resolve the effective settings path.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `$LAUNCHKEYS_SETTINGS` when set and non-empty.
/// 3) Else `~/.launchkeys/settings.json`.
pub fn resolve_settings_path(explicit: Option<&Path>) -> PathBuf {
    pick_settings_path(explicit, env::var_os(SETTINGS_ENV), env::var_os("HOME"))
}

fn pick_settings_path(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    home: Option<OsString>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match from_env {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => settings_under(home),
    }
}
