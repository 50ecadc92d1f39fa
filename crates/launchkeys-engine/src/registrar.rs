use std::{collections::BTreeMap, mem, sync::Arc, time::Instant};

use config::{BindingStore, Subscription};
use crossbeam_channel::{Receiver, unbounded};
use keyslot::KeySlot;
use mac_hotkey::{HandlerRef, HotKeyId, HotKeyRef, HotkeyApi, fourcc};
use tracing::{debug, info, trace, warn};

use crate::{Launch, Result};

/// Signature stamped on every hot-key this process registers.
pub const SIGNATURE: u32 = fourcc(b"LMFK");

/// The hot-key id used for `slot`.
pub fn hotkey_id(slot: KeySlot) -> HotKeyId {
    HotKeyId::new(SIGNATURE, slot.ordinal())
}

/// Owns the OS hot-key registrations for every bound slot.
///
/// One event handler is installed for the registrar's lifetime. Its callback
/// only forwards the pressed [`HotKeyId`] into a channel; [`Registrar::pump`]
/// drains that channel and the binding-change subscription on the
/// coordination thread.
pub struct Registrar {
    api: Arc<dyn HotkeyApi>,
    store: Arc<BindingStore>,
    launcher: Arc<dyn Launch>,
    handler: Option<HandlerRef>,
    registered: BTreeMap<KeySlot, HotKeyRef>,
    presses: Receiver<HotKeyId>,
    changes: Option<Subscription>,
}

impl Registrar {
    /// Install the event handler, subscribe to binding changes, and register
    /// every currently bound slot.
    pub fn new(
        api: Arc<dyn HotkeyApi>,
        store: Arc<BindingStore>,
        launcher: Arc<dyn Launch>,
    ) -> Result<Self> {
        let (tx, presses) = unbounded();
        let handler = api.install(Box::new(move |id| {
            if tx.send(id).is_err() {
                trace!(?id, "press_after_registrar_dropped");
            }
        }))?;
        debug!(?handler, "hotkey_handler_installed");
        let changes = store.subscribe();
        let mut registrar = Self {
            api,
            store,
            launcher,
            handler: Some(handler),
            registered: BTreeMap::new(),
            presses,
            changes: Some(changes),
        };
        registrar.synchronize();
        Ok(registrar)
    }

    /// Drop every registration, then register each bound slot afresh.
    ///
    /// A slot whose registration fails is logged and left unregistered; the
    /// remaining slots still register.
    pub fn synchronize(&mut self) {
        let start = Instant::now();
        self.unregister_all();
        let table = self.store.load();
        for slot in table.keys().copied() {
            match self.api.register(hotkey_id(slot), u32::from(slot.scancode())) {
                Ok(h) => {
                    trace!(%slot, "hotkey_registered");
                    self.registered.insert(slot, h);
                }
                Err(e) => warn!(%slot, error = %e, "hotkey_register_failed"),
            }
        }
        debug!(
            bound = table.len(),
            registered = self.registered.len(),
            elapsed = ?start.elapsed(),
            "hotkeys_synchronized"
        );
    }

    fn unregister_all(&mut self) {
        for (slot, h) in mem::take(&mut self.registered) {
            if let Err(e) = self.api.unregister(h) {
                warn!(%slot, error = %e, "hotkey_unregister_failed");
            }
        }
    }

    /// Route one delivered press. Returns whether a launch was requested.
    ///
    /// Foreign signatures and unknown ids are ignored. The settings file is
    /// re-read before the lookup, so a press after a clear from any process
    /// finds nothing and is dropped.
    pub fn handle_press(&self, id: HotKeyId) -> bool {
        if id.signature != SIGNATURE {
            trace!(?id, "foreign_hotkey_ignored");
            return false;
        }
        let Some(slot) = KeySlot::from_ordinal(id.id) else {
            trace!(?id, "unknown_hotkey_ignored");
            return false;
        };
        self.store.refresh();
        match self.store.binding(slot) {
            Some(path) => {
                info!(%slot, path = %path.display(), "hotkey_pressed");
                self.launcher.launch_or_focus(&path);
                true
            }
            None => {
                debug!(%slot, "press_for_unbound_slot");
                false
            }
        }
    }

    /// Apply pending binding changes, then handle queued presses. Returns the
    /// number of presses handled.
    pub fn pump(&mut self) -> usize {
        let changed = self.changes.as_ref().is_some_and(Subscription::drain);
        if changed {
            self.synchronize();
        }
        let mut handled = 0;
        while let Ok(id) = self.presses.try_recv() {
            self.handle_press(id);
            handled += 1;
        }
        handled
    }

    /// Slots with a live OS registration.
    pub fn registered_slots(&self) -> Vec<KeySlot> {
        self.registered.keys().copied().collect()
    }
}

impl Drop for Registrar {
    fn drop(&mut self) {
        self.unregister_all();
        let removed = self.handler.take().map(|h| self.api.remove(h));
        if let Some(Err(e)) = removed {
            warn!(error = %e, "hotkey_handler_remove_failed");
        }
        self.changes = None;
        debug!("registrar_torn_down");
    }
}
