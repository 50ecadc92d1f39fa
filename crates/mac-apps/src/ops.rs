use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI32, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{ActivateOptions, Error, OpenOptions, Result, RunningApp};

/// Completion for [`AppOps::open_application`]: the launched instance when
/// the OS handed one back, or the launch error.
pub type Completion = Box<dyn FnOnce(Result<Option<RunningApp>>) + Send>;

/// Trait abstraction over the OS process facility to improve testability.
pub trait AppOps: Send + Sync {
    /// Bundle identifier of the app at `path`, if it is a bundle.
    fn bundle_identifier(&self, path: &Path) -> Option<String>;
    /// Running instances with the given bundle identifier.
    fn running_apps(&self, bundle_id: &str) -> Vec<RunningApp>;
    /// Unhide `app`. Returns whether the OS accepted the request.
    fn unhide(&self, app: &RunningApp) -> bool;
    /// Activate `app`. Returns whether the OS accepted the request.
    fn activate(&self, app: &RunningApp, options: ActivateOptions) -> bool;
    /// Open a new instance of the app at `path`. Returns immediately; `done`
    /// runs once the launch finishes, possibly on another thread.
    fn open_application(&self, path: &Path, options: OpenOptions, done: Completion);
}

/// Process facility for platforms without one.
#[derive(Debug, Default)]
pub struct UnsupportedAppOps;

impl AppOps for UnsupportedAppOps {
    fn bundle_identifier(&self, _path: &Path) -> Option<String> {
        None
    }
    fn running_apps(&self, _bundle_id: &str) -> Vec<RunningApp> {
        Vec::new()
    }
    fn unhide(&self, _app: &RunningApp) -> bool {
        false
    }
    fn activate(&self, _app: &RunningApp, _options: ActivateOptions) -> bool {
        false
    }
    fn open_application(&self, _path: &Path, _options: OpenOptions, done: Completion) {
        done(Err(Error::Unsupported));
    }
}

/// Simple mock implementation for tests.
///
/// Apps are installed with [`MockAppOps::install_app`]; every call is noted in
/// a call log that tests can inspect. Launch completions run synchronously.
#[derive(Clone, Default)]
pub struct MockAppOps {
    calls: Arc<Mutex<Vec<String>>>,
    bundles: Arc<Mutex<HashMap<PathBuf, String>>>,
    running: Arc<Mutex<HashMap<String, Vec<RunningApp>>>>,
    next_pid: Arc<AtomicI32>,
    fail_activate: Arc<AtomicBool>,
    fail_open: Arc<AtomicBool>,
}

impl MockAppOps {
    pub fn new() -> Self {
        Self {
            next_pid: Arc::new(AtomicI32::new(1000)),
            ..Self::default()
        }
    }
    /// Make `path` a bundle with identifier `bundle_id`.
    pub fn install_app(&self, path: impl Into<PathBuf>, bundle_id: &str) {
        self.bundles.lock().insert(path.into(), bundle_id.to_string());
    }
    /// Start a (fake) instance of `bundle_id` and return it.
    pub fn spawn_running(&self, bundle_id: &str, hidden: bool) -> RunningApp {
        let app = RunningApp {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            bundle_id: Some(bundle_id.to_string()),
            hidden,
        };
        self.running
            .lock()
            .entry(bundle_id.to_string())
            .or_default()
            .push(app.clone());
        app
    }
    /// Snapshot of running instances for `bundle_id`.
    pub fn instances(&self, bundle_id: &str) -> Vec<RunningApp> {
        self.running.lock().get(bundle_id).cloned().unwrap_or_default()
    }
    pub fn set_fail_activate(&self, v: bool) {
        self.fail_activate.store(v, Ordering::SeqCst);
    }
    pub fn set_fail_open(&self, v: bool) {
        self.fail_open.store(v, Ordering::SeqCst);
    }
    /// Full call log, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
    pub fn calls_contains(&self, s: &str) -> bool {
        self.calls.lock().iter().any(|x| x == s)
    }
    /// Number of logged calls whose entry starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|x| x.starts_with(prefix))
            .count()
    }
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
    fn note(&self, s: String) {
        self.calls.lock().push(s);
    }
}

impl AppOps for MockAppOps {
    fn bundle_identifier(&self, path: &Path) -> Option<String> {
        self.note(format!("bundle_identifier:{}", path.display()));
        self.bundles.lock().get(path).cloned()
    }

    fn running_apps(&self, bundle_id: &str) -> Vec<RunningApp> {
        self.note(format!("running_apps:{bundle_id}"));
        self.instances(bundle_id)
    }

    fn unhide(&self, app: &RunningApp) -> bool {
        self.note(format!("unhide:{}", app.pid));
        let mut running = self.running.lock();
        for inst in running.values_mut().flatten() {
            if inst.pid == app.pid {
                inst.hidden = false;
                return true;
            }
        }
        false
    }

    fn activate(&self, app: &RunningApp, _options: ActivateOptions) -> bool {
        self.note(format!("activate:{}", app.pid));
        !self.fail_activate.load(Ordering::SeqCst)
    }

    fn open_application(&self, path: &Path, _options: OpenOptions, done: Completion) {
        self.note(format!("open:{}", path.display()));
        if self.fail_open.load(Ordering::SeqCst) {
            done(Err(Error::Launch("launch refused".to_string())));
            return;
        }
        let bundle = self.bundles.lock().get(path).cloned();
        match bundle {
            Some(id) => {
                let app = self.spawn_running(&id, false);
                done(Ok(Some(app)));
            }
            None => done(Err(Error::NotFound(path.to_path_buf()))),
        }
    }
}
