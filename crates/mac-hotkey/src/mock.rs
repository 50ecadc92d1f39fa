use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{Error, HandlerRef, HotKeyId, HotKeyRef, HotkeyApi, HotkeyCallback, Result};

/// In-memory hot-key facility for tests.
///
/// Mirrors the Carbon contract closely enough to exercise registrar logic:
/// handles are unique, key codes may be claimed only once, and presses are
/// delivered synchronously to every installed handler.
#[derive(Clone, Default)]
pub struct MockHotkeyApi {
    /// Shared state so clones observe the same registrations.
    inner: Arc<MockInner>,
}

/// State behind [`MockHotkeyApi`].
#[derive(Default)]
struct MockInner {
    /// Monotonic handle source.
    next: AtomicU64,
    /// Installed handlers by handle.
    handlers: Mutex<HashMap<u64, Arc<HotkeyCallback>>>,
    /// Live registrations: handle -> (id, key code).
    hotkeys: Mutex<BTreeMap<u64, (HotKeyId, u32)>>,
    /// Key codes whose registration should fail.
    fail_codes: Mutex<HashSet<u32>>,
    /// Key codes whose unregistration should fail, leaving them claimed.
    fail_unregister_codes: Mutex<HashSet<u32>>,
    /// When set, `install` fails.
    fail_install: Mutex<bool>,
    /// When set, `remove` fails and the handler stays installed.
    fail_remove: Mutex<bool>,
    /// Successful `register` calls.
    register_calls: AtomicUsize,
    /// Successful `unregister` calls.
    unregister_calls: AtomicUsize,
}

impl MockHotkeyApi {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `register` for `key_code` fail.
    pub fn fail_key_code(&self, key_code: u32) {
        self.inner.fail_codes.lock().insert(key_code);
    }

    /// Make every future `unregister` of `key_code` fail. The key stays
    /// claimed, as it would if the OS refused.
    pub fn fail_unregister_key_code(&self, key_code: u32) {
        self.inner.fail_unregister_codes.lock().insert(key_code);
    }

    /// Make future `remove` calls fail.
    pub fn set_fail_remove(&self, v: bool) {
        *self.inner.fail_remove.lock() = v;
    }

    /// Make future `install` calls fail.
    pub fn set_fail_install(&self, v: bool) {
        *self.inner.fail_install.lock() = v;
    }

    /// Number of handlers currently installed.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    /// Snapshot of live registrations as `(id, key_code)`, in handle order.
    pub fn registrations(&self) -> Vec<(HotKeyId, u32)> {
        self.inner.hotkeys.lock().values().copied().collect()
    }

    /// Total successful `register` calls.
    pub fn register_calls(&self) -> usize {
        self.inner.register_calls.load(Ordering::SeqCst)
    }

    /// Total successful `unregister` calls.
    pub fn unregister_calls(&self) -> usize {
        self.inner.unregister_calls.load(Ordering::SeqCst)
    }

    /// Deliver `id` to every installed handler, as the OS would on a press.
    ///
    /// Delivery does not require `id` to be registered, so tests can simulate
    /// stale or foreign events.
    pub fn fire(&self, id: HotKeyId) {
        let handlers: Vec<Arc<HotkeyCallback>> =
            self.inner.handlers.lock().values().cloned().collect();
        for h in handlers {
            (**h)(id);
        }
    }

    /// Press the key registered for `key_code`, if any. Returns whether a
    /// registration matched.
    pub fn press_key_code(&self, key_code: u32) -> bool {
        let id = self
            .inner
            .hotkeys
            .lock()
            .values()
            .find(|(_, code)| *code == key_code)
            .map(|(id, _)| *id);
        match id {
            Some(id) => {
                self.fire(id);
                true
            }
            None => false,
        }
    }

    /// Allocate a fresh handle value.
    fn next_handle(&self) -> u64 {
        self.inner.next.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl HotkeyApi for MockHotkeyApi {
    fn install(&self, callback: HotkeyCallback) -> Result<HandlerRef> {
        if *self.inner.fail_install.lock() {
            return Err(Error::OsStatus {
                op: "InstallEventHandler",
                status: -50,
            });
        }
        let h = self.next_handle();
        self.inner.handlers.lock().insert(h, Arc::new(callback));
        Ok(HandlerRef(h))
    }

    fn register(&self, id: HotKeyId, key_code: u32) -> Result<HotKeyRef> {
        if self.inner.fail_codes.lock().contains(&key_code) {
            return Err(Error::OsStatus {
                op: "RegisterEventHotKey",
                status: -9878,
            });
        }
        let mut hotkeys = self.inner.hotkeys.lock();
        // Carbon refuses a second claim on the same key and modifiers.
        if hotkeys.values().any(|(_, code)| *code == key_code) {
            return Err(Error::OsStatus {
                op: "RegisterEventHotKey",
                status: -9878,
            });
        }
        let h = self.next_handle();
        hotkeys.insert(h, (id, key_code));
        self.inner.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(HotKeyRef(h))
    }

    fn unregister(&self, hotkey: HotKeyRef) -> Result<()> {
        let mut hotkeys = self.inner.hotkeys.lock();
        let Some((_, code)) = hotkeys.get(&hotkey.0).copied() else {
            return Err(Error::UnknownHandle);
        };
        if self.inner.fail_unregister_codes.lock().contains(&code) {
            return Err(Error::OsStatus {
                op: "UnregisterEventHotKey",
                status: -9876,
            });
        }
        hotkeys.remove(&hotkey.0);
        self.inner.unregister_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, handler: HandlerRef) -> Result<()> {
        if *self.inner.fail_remove.lock() {
            return Err(Error::OsStatus {
                op: "RemoveEventHandler",
                status: -50,
            });
        }
        self.inner
            .handlers
            .lock()
            .remove(&handler.0)
            .map(|_| ())
            .ok_or(Error::UnknownHandle)
    }
}
