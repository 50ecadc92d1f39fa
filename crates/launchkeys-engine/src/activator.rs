//! Focus a running instance of an application, or start a new one.

use std::{path::Path, sync::Arc, time::Duration};

use config::{LaunchBehavior, LaunchPolicyStore};
use crossbeam_channel::{Sender, bounded};
use mac_apps::{ActivateOptions, AppOps, OpenOptions};
use tracing::{debug, info, warn};

/// Something that can bring an application forward.
///
/// The registrar hands bound paths to this trait; tests substitute a recorder.
pub trait Launch: Send + Sync {
    /// Fire-and-forget: focus or start the app at `app_path`.
    fn launch_or_focus(&self, app_path: &Path);
}

/// How a single [`ProcessActivator`] request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// An existing instance with this pid was activated.
    Focused(i32),
    /// A new instance was started; the pid when the OS reported one.
    Launched(Option<i32>),
    /// The launch failed.
    Failed(String),
}

/// Applies the focus-vs-new-instance policy through the OS process facility.
pub struct ProcessActivator {
    ops: Arc<dyn AppOps>,
    policy: Arc<LaunchPolicyStore>,
}

impl ProcessActivator {
    pub fn new(ops: Arc<dyn AppOps>, policy: Arc<LaunchPolicyStore>) -> Self {
        Self { ops, policy }
    }

    /// Like [`Launch::launch_or_focus`], but wait up to `timeout` for the
    /// outcome. Returns `None` if the OS did not report back in time.
    pub fn launch_or_focus_wait(&self, app_path: &Path, timeout: Duration) -> Option<LaunchOutcome> {
        let (tx, rx) = bounded(1);
        self.dispatch(app_path, Some(tx));
        rx.recv_timeout(timeout).ok()
    }

    fn dispatch(&self, app_path: &Path, report: Option<Sender<LaunchOutcome>>) {
        let behavior = self.policy.launch_behavior();
        debug!(path = %app_path.display(), %behavior, "launch_or_focus");
        let focused = match behavior {
            LaunchBehavior::FocusExisting => self.focus_existing(app_path),
            LaunchBehavior::LaunchNewInstance => None,
        };
        match focused {
            Some(pid) => send(report.as_ref(), LaunchOutcome::Focused(pid)),
            None => self.open_new(app_path, report),
        }
    }

    /// Activate the first running instance of the app. Returns its pid when
    /// the OS accepted the activation.
    fn focus_existing(&self, app_path: &Path) -> Option<i32> {
        let Some(bundle_id) = self.ops.bundle_identifier(app_path) else {
            debug!(path = %app_path.display(), "no_bundle_identifier");
            return None;
        };
        let app = self.ops.running_apps(&bundle_id).into_iter().next()?;
        if app.hidden && !self.ops.unhide(&app) {
            debug!(pid = app.pid, "unhide_refused");
        }
        if self.ops.activate(&app, ActivateOptions::FOREGROUND) {
            info!(%bundle_id, pid = app.pid, "focused_existing");
            Some(app.pid)
        } else {
            debug!(%bundle_id, pid = app.pid, "activation_refused");
            None
        }
    }

    fn open_new(&self, app_path: &Path, report: Option<Sender<LaunchOutcome>>) {
        let ops = self.ops.clone();
        let shown = app_path.display().to_string();
        self.ops.open_application(
            app_path,
            OpenOptions { activates: true },
            Box::new(move |res| {
                let outcome = match res {
                    Ok(Some(app)) => {
                        if !ops.activate(&app, ActivateOptions::FOREGROUND) {
                            debug!(pid = app.pid, "post_launch_activation_refused");
                        }
                        info!(path = %shown, pid = app.pid, "launched");
                        LaunchOutcome::Launched(Some(app.pid))
                    }
                    Ok(None) => {
                        info!(path = %shown, "launched");
                        LaunchOutcome::Launched(None)
                    }
                    Err(e) => {
                        warn!(path = %shown, error = %e, "launch_failed");
                        LaunchOutcome::Failed(e.to_string())
                    }
                };
                send(report.as_ref(), outcome);
            }),
        );
    }
}

fn send(report: Option<&Sender<LaunchOutcome>>, outcome: LaunchOutcome) {
    if let Some(tx) = report {
        tx.try_send(outcome).ok();
    }
}

impl Launch for ProcessActivator {
    fn launch_or_focus(&self, app_path: &Path) {
        self.dispatch(app_path, None);
    }
}
