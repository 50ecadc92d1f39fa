//! Change signals for the defaults file.
//!
//! Edits arrive from other processes (`launchkeys assign` and friends) as an
//! atomic rename into place, so the watch is on the parent directory and
//! events are filtered down to the file's own name.

use std::{
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
};

use crossbeam_channel::{Receiver, TryRecvError, unbounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, trace};

use crate::{Error, Result};

/// Signals whenever the watched defaults file may have changed.
pub struct SettingsWatcher {
    /// Keeps the OS watch alive.
    _watcher: RecommendedWatcher,
    /// One message per relevant file event.
    rx: Receiver<()>,
}

impl SettingsWatcher {
    /// Start watching `path`. Its parent directory is created if needed.
    pub fn new(path: &Path) -> Result<Self> {
        let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(d) => d.to_path_buf(),
            None => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        let name: OsString = path.file_name().map(OsString::from).unwrap_or_default();

        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if touches(&event, &name) {
                    trace!(kind = ?event.kind, "settings_file_event");
                    tx.send(()).ok();
                }
            }
            Err(e) => error!(error = %e, "settings_watch_error"),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(dir = %dir.display(), "settings_watch_started");
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Consume every pending signal. Returns whether there was any.
    pub fn changed(&self) -> bool {
        let mut any = false;
        loop {
            match self.rx.try_recv() {
                Ok(()) => any = true,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return any,
            }
        }
    }
}

/// Whether `event` is a content change to the file called `name`.
///
/// Access events are dropped: reloading reads the file, and those reads
/// must not signal another reload.
fn touches(event: &Event, name: &OsStr) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(name))
}
