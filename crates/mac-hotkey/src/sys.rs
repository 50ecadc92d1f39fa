//! Carbon event-manager integration for global hot-keys.
//!
//! `RegisterEventHotKey` is still the only public macOS API that claims a
//! key system-wide without Input Monitoring permission. Registrations and the
//! press handler both target the event dispatcher, so presses arrive on the
//! thread running the application event loop.
//!
//! The handler's user-data pointer is a leaked `Box<HotkeyCallback>`. It is
//! reclaimed only after `RemoveEventHandler` returns, so a late event can
//! never observe a freed closure.

use std::{
    collections::HashMap,
    ffi::c_void,
    ptr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{Error, HandlerRef, HotKeyId, HotKeyRef, HotkeyApi, HotkeyCallback, Result, fourcc};

type OsStatus = i32;
type EventTargetRef = *mut c_void;
type EventHandlerRef = *mut c_void;
type EventHandlerCallRef = *mut c_void;
type EventRef = *mut c_void;
type EventHotKeyRef = *mut c_void;
type EventHandlerUpp =
    unsafe extern "C" fn(EventHandlerCallRef, EventRef, *mut c_void) -> OsStatus;

#[repr(C)]
struct EventTypeSpec {
    event_class: u32,
    event_kind: u32,
}

#[repr(C)]
#[derive(Default)]
struct EventHotKeyId {
    signature: u32,
    id: u32,
}

const NO_ERR: OsStatus = 0;
const EVENT_NOT_HANDLED_ERR: OsStatus = -9874;
const K_EVENT_CLASS_KEYBOARD: u32 = fourcc(b"keyb");
const K_EVENT_HOT_KEY_PRESSED: u32 = 5;
const K_EVENT_PARAM_DIRECT_OBJECT: u32 = fourcc(b"----");
const TYPE_EVENT_HOT_KEY_ID: u32 = fourcc(b"hkid");

#[link(name = "Carbon", kind = "framework")]
unsafe extern "C" {
    fn GetEventDispatcherTarget() -> EventTargetRef;
    fn InstallEventHandler(
        target: EventTargetRef,
        handler: EventHandlerUpp,
        num_types: usize,
        list: *const EventTypeSpec,
        user_data: *mut c_void,
        out_ref: *mut EventHandlerRef,
    ) -> OsStatus;
    fn RemoveEventHandler(handler: EventHandlerRef) -> OsStatus;
    fn RegisterEventHotKey(
        key_code: u32,
        modifiers: u32,
        id: EventHotKeyId,
        target: EventTargetRef,
        options: u32,
        out_ref: *mut EventHotKeyRef,
    ) -> OsStatus;
    fn UnregisterEventHotKey(hotkey: EventHotKeyRef) -> OsStatus;
    fn GetEventParameter(
        event: EventRef,
        name: u32,
        desired_type: u32,
        actual_type: *mut u32,
        buffer_size: usize,
        actual_size: *mut usize,
        data: *mut c_void,
    ) -> OsStatus;
    fn RunCurrentEventLoop(timeout_secs: f64) -> OsStatus;
}

/// Raw Carbon handler plus the boxed closure it points at.
struct InstalledHandler {
    raw: EventHandlerRef,
    callback: *mut HotkeyCallback,
}

/// Raw Carbon hot-key reference.
struct RegisteredHotKey {
    raw: EventHotKeyRef,
}

// SAFETY: Carbon refs are opaque tokens; we only pass them back to Carbon.
// The callback pointer targets a `Send + Sync` closure.
unsafe impl Send for InstalledHandler {}
// SAFETY: see above.
unsafe impl Send for RegisteredHotKey {}

/// Hot-key facility backed by the Carbon event manager.
pub struct CarbonHotkeys {
    /// Monotonic handle source.
    next: AtomicU64,
    /// Installed handlers keyed by public handle.
    handlers: Mutex<HashMap<u64, InstalledHandler>>,
    /// Registered hot-keys keyed by public handle.
    hotkeys: Mutex<HashMap<u64, RegisteredHotKey>>,
}

impl CarbonHotkeys {
    /// Create an empty facility. Nothing is claimed until `register`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            handlers: Mutex::new(HashMap::new()),
            hotkeys: Mutex::new(HashMap::new()),
        }
    }

    fn next_handle(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for CarbonHotkeys {
    fn default() -> Self {
        Self::new()
    }
}

/// C entry point for `kEventHotKeyPressed`.
unsafe extern "C" fn hotkey_pressed(
    _call: EventHandlerCallRef,
    event: EventRef,
    user_data: *mut c_void,
) -> OsStatus {
    if event.is_null() || user_data.is_null() {
        return EVENT_NOT_HANDLED_ERR;
    }
    let mut hk = EventHotKeyId::default();
    // SAFETY: `event` is a live Carbon event for the duration of this call and
    // `hk` is a correctly sized out buffer.
    let status = unsafe {
        GetEventParameter(
            event,
            K_EVENT_PARAM_DIRECT_OBJECT,
            TYPE_EVENT_HOT_KEY_ID,
            ptr::null_mut(),
            size_of::<EventHotKeyId>(),
            ptr::null_mut(),
            (&raw mut hk).cast(),
        )
    };
    if status != NO_ERR {
        warn!(status, "hotkey_event_parameter_failed");
        return status;
    }
    // SAFETY: `user_data` is the `Box<HotkeyCallback>` leaked by `install`,
    // which stays alive until after `RemoveEventHandler` returns.
    let callback = unsafe { &*(user_data as *const HotkeyCallback) };
    let id = HotKeyId::new(hk.signature, hk.id);
    trace!(?id, "hotkey_pressed");
    callback(id);
    NO_ERR
}

impl HotkeyApi for CarbonHotkeys {
    fn install(&self, callback: HotkeyCallback) -> Result<HandlerRef> {
        let spec = EventTypeSpec {
            event_class: K_EVENT_CLASS_KEYBOARD,
            event_kind: K_EVENT_HOT_KEY_PRESSED,
        };
        let user_data: *mut HotkeyCallback = Box::into_raw(Box::new(callback));
        let mut raw: EventHandlerRef = ptr::null_mut();
        // SAFETY: all pointers are valid for the duration of the call; Carbon
        // copies the type list.
        let status = unsafe {
            InstallEventHandler(
                GetEventDispatcherTarget(),
                hotkey_pressed,
                1,
                &spec,
                user_data.cast(),
                &mut raw,
            )
        };
        if status != NO_ERR || raw.is_null() {
            // SAFETY: Carbon did not retain the pointer; reclaim it.
            drop(unsafe { Box::from_raw(user_data) });
            warn!(status, "install_event_handler_failed");
            return Err(Error::OsStatus {
                op: "InstallEventHandler",
                status,
            });
        }
        let h = self.next_handle();
        self.handlers.lock().insert(
            h,
            InstalledHandler {
                raw,
                callback: user_data,
            },
        );
        debug!(handle = h, "hotkey_handler_installed");
        Ok(HandlerRef(h))
    }

    fn register(&self, id: HotKeyId, key_code: u32) -> Result<HotKeyRef> {
        let mut raw: EventHotKeyRef = ptr::null_mut();
        // SAFETY: `raw` is a valid out pointer.
        let status = unsafe {
            RegisterEventHotKey(
                key_code,
                0,
                EventHotKeyId {
                    signature: id.signature,
                    id: id.id,
                },
                GetEventDispatcherTarget(),
                0,
                &mut raw,
            )
        };
        if status != NO_ERR || raw.is_null() {
            return Err(Error::OsStatus {
                op: "RegisterEventHotKey",
                status,
            });
        }
        let h = self.next_handle();
        self.hotkeys.lock().insert(h, RegisteredHotKey { raw });
        trace!(?id, key_code, handle = h, "hotkey_registered");
        Ok(HotKeyRef(h))
    }

    fn unregister(&self, hotkey: HotKeyRef) -> Result<()> {
        let entry = self
            .hotkeys
            .lock()
            .remove(&hotkey.0)
            .ok_or(Error::UnknownHandle)?;
        // SAFETY: `entry.raw` came from a successful `RegisterEventHotKey`
        // and is released exactly once.
        let status = unsafe { UnregisterEventHotKey(entry.raw) };
        if status != NO_ERR {
            return Err(Error::OsStatus {
                op: "UnregisterEventHotKey",
                status,
            });
        }
        Ok(())
    }

    fn remove(&self, handler: HandlerRef) -> Result<()> {
        let entry = self
            .handlers
            .lock()
            .remove(&handler.0)
            .ok_or(Error::UnknownHandle)?;
        // SAFETY: `entry.raw` came from a successful `InstallEventHandler`.
        let status = unsafe { RemoveEventHandler(entry.raw) };
        if status != NO_ERR {
            // The handler may still fire; keep the closure alive.
            warn!(status, "remove_event_handler_failed_leaking_callback");
            return Err(Error::OsStatus {
                op: "RemoveEventHandler",
                status,
            });
        }
        // SAFETY: the handler is gone, so nothing else can reach the closure.
        drop(unsafe { Box::from_raw(entry.callback) });
        debug!(handle = handler.0, "hotkey_handler_removed");
        Ok(())
    }
}

impl Drop for CarbonHotkeys {
    fn drop(&mut self) {
        let hotkeys: Vec<u64> = self.hotkeys.lock().keys().copied().collect();
        for h in hotkeys {
            self.unregister(HotKeyRef(h)).ok();
        }
        let handlers: Vec<u64> = self.handlers.lock().keys().copied().collect();
        for h in handlers {
            self.remove(HandlerRef(h)).ok();
        }
    }
}

/// Pump the Carbon event loop on the current thread for up to `timeout`.
pub(crate) fn run_current_event_loop(timeout: Duration) {
    // SAFETY: plain Carbon call; returns when the timeout elapses or the loop
    // is quit.
    let status = unsafe { RunCurrentEventLoop(timeout.as_secs_f64()) };
    trace!(status, "event_loop_tick");
}
