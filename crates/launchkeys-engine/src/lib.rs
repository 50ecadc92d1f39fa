//! launchkeys engine: turns function-key presses into app launches.
//!
//! [`Registrar`] keeps one OS hot-key registration per bound slot and
//! re-synchronizes whenever the binding table changes. Presses are routed to a
//! [`Launch`] implementation, normally [`ProcessActivator`], which applies the
//! focus-vs-new-instance policy. [`Engine`] ties both to a single coordination
//! thread and reloads the settings whenever another process rewrites them.
#![allow(missing_docs)]

use std::sync::Arc;

use config::{BindingStore, LaunchPolicyStore, SettingsWatcher};
use crossbeam_channel::{Receiver, TryRecvError};
use mac_apps::AppOps;
use mac_hotkey::HotkeyApi;
use tracing::{debug, info, warn};

mod activator;
mod error;
mod registrar;

pub use activator::{Launch, LaunchOutcome, ProcessActivator};
pub use error::{Error, Result};
pub use registrar::{Registrar, SIGNATURE, hotkey_id};

/// Everything the engine needs from the outside world.
pub struct Services {
    pub hotkeys: Arc<dyn HotkeyApi>,
    pub apps: Arc<dyn AppOps>,
    pub bindings: Arc<BindingStore>,
    pub policy: Arc<LaunchPolicyStore>,
}

/// The coordination loop. Owns the registrar; dropping the engine releases
/// every OS registration.
pub struct Engine {
    registrar: Registrar,
    bindings: Arc<BindingStore>,
    watcher: Option<SettingsWatcher>,
}

impl Engine {
    /// Reconcile the login item with the saved preference, then install the
    /// hot-key handler and register every bound slot.
    ///
    /// The settings file is watched for edits made by other processes. If the
    /// watch cannot be set up, presses still read the file fresh, but
    /// registrations only follow edits made through this process.
    pub fn new(services: Services) -> Result<Self> {
        let Services {
            hotkeys,
            apps,
            bindings,
            policy,
        } = services;
        policy.apply_start_at_login_setting();
        let watcher = match bindings.watch() {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, "settings_watch_unavailable");
                None
            }
        };
        let activator = Arc::new(ProcessActivator::new(apps, policy));
        let registrar = Registrar::new(hotkeys, bindings.clone(), activator)?;
        info!(slots = ?registrar.registered_slots(), "engine_ready");
        Ok(Self {
            registrar,
            bindings,
            watcher,
        })
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Run until `stop` receives a message or its sender is dropped.
    ///
    /// Each iteration calls `wait`, which blocks briefly while the platform
    /// delivers events, then reloads the settings if the file changed and
    /// drains pending binding changes and presses.
    pub fn run<W>(&mut self, stop: &Receiver<()>, mut wait: W)
    where
        W: FnMut(),
    {
        info!("engine_running");
        loop {
            wait();
            if self.watcher.as_ref().is_some_and(SettingsWatcher::changed) {
                self.bindings.refresh();
            }
            let handled = self.registrar.pump();
            if handled > 0 {
                debug!(handled, "presses_handled");
            }
            match stop.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }
        }
        info!("engine_stopped");
    }
}
