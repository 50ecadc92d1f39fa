//! Global hot-key registration for macOS.
//!
//! This crate wraps the Carbon event manager's hot-key facility behind the
//! small [`HotkeyApi`] trait:
//!
//! - [`HotkeyApi::install`] installs one press handler. The handler is a Rust
//!   closure; whatever it captures is the only route from the OS callback back
//!   into the caller, so no process-global state is involved.
//! - [`HotkeyApi::register`] claims a key code (no modifiers) under a
//!   [`HotKeyId`], a four-character signature plus a numeric id. Presses of a
//!   registered key are delivered to installed handlers as that `HotKeyId`.
//! - [`HotkeyApi::unregister`] and [`HotkeyApi::remove`] release registrations
//!   and handlers.
//!
//! Carbon delivers hot-key events on the thread that runs the application
//! event loop. Hosts without an AppKit run loop call [`run_event_loop_once`]
//! periodically from that thread.
//!
//! [`MockHotkeyApi`] is an in-memory implementation used by tests: it records
//! registrations, can be told to fail specific key codes, and can "press"
//! a registered key.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

mod error;
mod mock;
#[cfg(target_os = "macos")]
mod sys;

pub use error::{Error, Result};
pub use mock::MockHotkeyApi;

/// Identifies a registered hot-key in delivered events.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HotKeyId {
    /// Four-character code naming the registrant.
    pub signature: u32,
    /// Registrant-chosen id, unique per signature.
    pub id: u32,
}

impl HotKeyId {
    /// Construct an id from a signature and a numeric id.
    pub const fn new(signature: u32, id: u32) -> Self {
        Self { signature, id }
    }
}

impl Debug for HotKeyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "HotKeyId({}:{})", fourcc_str(self.signature), self.id)
    }
}

/// Pack four ASCII bytes into a big-endian `OSType`.
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Render an `OSType` as its four characters (non-printables become `.`).
pub fn fourcc_str(code: u32) -> String {
    code.to_be_bytes()
        .iter()
        .map(|b| {
            if b.is_ascii_graphic() || *b == b' ' {
                *b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Opaque handle for an installed press handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerRef(pub(crate) u64);

/// Opaque handle for one registered hot-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HotKeyRef(pub(crate) u64);

/// Callback invoked for every hot-key press the OS delivers.
pub type HotkeyCallback = Box<dyn Fn(HotKeyId) + Send + Sync>;

/// Minimal hot-key facility used by the launcher's registrar.
pub trait HotkeyApi: Send + Sync {
    /// Install a press handler. The handler lives until [`HotkeyApi::remove`].
    fn install(&self, callback: HotkeyCallback) -> Result<HandlerRef>;
    /// Claim `key_code` with no modifiers, tagging presses with `id`.
    fn register(&self, id: HotKeyId, key_code: u32) -> Result<HotKeyRef>;
    /// Release a claim made by [`HotkeyApi::register`].
    fn unregister(&self, hotkey: HotKeyRef) -> Result<()>;
    /// Uninstall a handler and drop its closure.
    fn remove(&self, handler: HandlerRef) -> Result<()>;
}

/// Hot-key facility for platforms without one; every call fails.
#[derive(Debug, Default)]
pub struct UnsupportedHotkeys;

impl HotkeyApi for UnsupportedHotkeys {
    fn install(&self, _callback: HotkeyCallback) -> Result<HandlerRef> {
        Err(Error::Unsupported)
    }
    fn register(&self, _id: HotKeyId, _key_code: u32) -> Result<HotKeyRef> {
        Err(Error::Unsupported)
    }
    fn unregister(&self, _hotkey: HotKeyRef) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn remove(&self, _handler: HandlerRef) -> Result<()> {
        Err(Error::Unsupported)
    }
}

#[cfg(target_os = "macos")]
pub use sys::CarbonHotkeys;

/// The native hot-key facility for the current platform.
#[cfg(target_os = "macos")]
pub fn system_api() -> Arc<dyn HotkeyApi> {
    Arc::new(CarbonHotkeys::new())
}

/// The native hot-key facility for the current platform.
#[cfg(not(target_os = "macos"))]
pub fn system_api() -> Arc<dyn HotkeyApi> {
    Arc::new(UnsupportedHotkeys)
}

/// Run the current thread's event loop for up to `timeout`, dispatching any
/// pending hot-key events to installed handlers.
#[cfg(target_os = "macos")]
pub fn run_event_loop_once(timeout: Duration) {
    sys::run_current_event_loop(timeout);
}

/// Run the current thread's event loop for up to `timeout`.
///
/// There is no OS event source on this platform, so this only waits.
#[cfg(not(target_os = "macos"))]
pub fn run_event_loop_once(timeout: Duration) {
    use std::thread;
    thread::sleep(timeout);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_packs_big_endian() {
        assert_eq!(fourcc(b"LMFK"), 0x4C4D_464B);
        assert_eq!(fourcc_str(0x4C4D_464B), "LMFK");
        assert_eq!(fourcc_str(0x0000_0041), "...A");
    }

    #[test]
    fn unsupported_backend_refuses_everything() {
        let api = UnsupportedHotkeys;
        assert_eq!(
            api.register(HotKeyId::new(1, 1), 0x60),
            Err(Error::Unsupported)
        );
        assert!(api.install(Box::new(|_| {})).is_err());
    }

    #[test]
    fn debug_shows_signature_chars() {
        let id = HotKeyId::new(fourcc(b"LMFK"), 5);
        assert_eq!(format!("{id:?}"), "HotKeyId(LMFK:5)");
    }
}
