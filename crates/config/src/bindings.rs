//! Function-key bindings and change notification.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use keyslot::KeySlot;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{Defaults, Error, Result, SettingsWatcher};

/// Storage key of the persisted binding list.
pub const MAPPINGS_KEY: &str = "appMappings";

/// Persisted form of one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub function_key: KeySlot,
    pub app_path: PathBuf,
}

/// Slot to target application path. One entry per slot at most.
pub type BindingTable = BTreeMap<KeySlot, PathBuf>;

/// Emitted after every successful save, and when a reload finds the table
/// changed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingsChanged;

type Subscribers = Mutex<Vec<(u64, Sender<BindingsChanged>)>>;

/// Persists the binding table in the defaults file and tells subscribers
/// when it changes.
pub struct BindingStore {
    defaults: Arc<Defaults>,
    subscribers: Arc<Subscribers>,
    next_id: AtomicU64,
}

impl BindingStore {
    pub fn new(defaults: Arc<Defaults>) -> Self {
        Self {
            defaults,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current table. Missing or undecodable data yields an empty table.
    pub fn load(&self) -> BindingTable {
        let Some(value) = self.defaults.get(MAPPINGS_KEY) else {
            return BindingTable::new();
        };
        match serde_json::from_value::<Vec<Binding>>(value) {
            Ok(list) => table_from_list(list),
            Err(e) => {
                warn!(error = %e, "bindings_decode_failed");
                BindingTable::new()
            }
        }
    }

    /// Persist the full table, then notify subscribers.
    ///
    /// Failures are logged, returned, and suppress the notification.
    pub fn save(&self, table: &BindingTable) -> Result<()> {
        let list: Vec<Binding> = table
            .iter()
            .map(|(slot, path)| Binding {
                function_key: *slot,
                app_path: path.clone(),
            })
            .collect();
        let value = match serde_json::to_value(&list) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "bindings_encode_failed");
                return Err(Error::Encode(e));
            }
        };
        if let Err(e) = self.defaults.set(MAPPINGS_KEY, value) {
            error!(error = %e, "bindings_save_failed");
            return Err(e);
        }
        debug!(count = list.len(), "bindings_saved");
        self.notify();
        Ok(())
    }

    /// Pick up writes made by other processes.
    ///
    /// Re-reads the defaults file and notifies subscribers if the persisted
    /// binding list differs from what this process last saw. Returns whether
    /// it did.
    pub fn refresh(&self) -> bool {
        let before = self.defaults.get(MAPPINGS_KEY);
        if !self.defaults.reload() {
            return false;
        }
        if self.defaults.get(MAPPINGS_KEY) == before {
            return false;
        }
        info!("bindings_changed_on_disk");
        self.notify();
        true
    }

    /// Watch the backing file for writes by other processes. In-memory
    /// stores have nothing to watch.
    pub fn watch(&self) -> Result<Option<SettingsWatcher>> {
        self.defaults.path().map(SettingsWatcher::new).transpose()
    }

    /// Bind `slot` to `app_path`, replacing any existing binding.
    pub fn assign(&self, slot: KeySlot, app_path: impl Into<PathBuf>) -> Result<()> {
        let mut table = self.load();
        table.insert(slot, app_path.into());
        self.save(&table)
    }

    /// Remove the binding for `slot`. The table is saved even if nothing was bound.
    pub fn clear(&self, slot: KeySlot) -> Result<()> {
        let mut table = self.load();
        table.remove(&slot);
        self.save(&table)
    }

    /// Fresh read of one slot.
    pub fn binding(&self, slot: KeySlot) -> Option<PathBuf> {
        self.load().remove(&slot)
    }

    /// Display name for an application path: the file name without `.app`.
    pub fn resolved_display_name(&self, path: &Path) -> String {
        display_name(path)
    }

    /// Receive a [`BindingsChanged`] after every successful save.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = unbounded();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, tx));
        Subscription {
            id,
            rx,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    fn notify(&self) {
        self.subscribers
            .lock()
            .retain(|(_, tx)| tx.send(BindingsChanged).is_ok());
    }
}

pub(crate) fn table_from_list(list: Vec<Binding>) -> BindingTable {
    let mut table = BindingTable::new();
    for b in list {
        if table.contains_key(&b.function_key) {
            warn!(slot = %b.function_key, path = %b.app_path.display(), "duplicate_binding_ignored");
            continue;
        }
        table.insert(b.function_key, b.app_path);
    }
    table
}

fn display_name(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return path.display().to_string();
    };
    let name = name.to_string_lossy();
    name.strip_suffix(".app").unwrap_or(&name).to_string()
}

/// Live subscription to binding changes. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    rx: Receiver<BindingsChanged>,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    pub fn receiver(&self) -> &Receiver<BindingsChanged> {
        &self.rx
    }

    /// Consume every pending notification. Returns whether there was any.
    pub fn drain(&self) -> bool {
        let mut any = false;
        loop {
            match self.rx.try_recv() {
                Ok(BindingsChanged) => any = true,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return any,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subs) = self.subscribers.upgrade() {
            subs.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
