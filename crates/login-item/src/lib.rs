//! Login-item registration for the launcher.
//!
//! This crate exposes a minimal API to query and change whether the running
//! app starts automatically at login. On macOS it drives
//! `SMAppService.mainAppService`; elsewhere every mutation fails with
//! [`Error::Unsupported`].
//!
//! Notes
//! - [`LoginItemService::status`] is fast and side-effect free.
//! - `register`/`unregister` may block briefly on the OS service. There is no
//!   prompting logic here: approval in System Settings is up to the user.
//! - [`MockLoginItem`] records calls for tests.
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

mod error;
#[cfg(target_os = "macos")]
mod sys;

pub use error::{Error, Result};
#[cfg(target_os = "macos")]
pub use sys::MainAppService;

/// Registration state reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoginItemStatus {
    /// Not registered.
    NotRegistered,
    /// Registered and allowed to run.
    Enabled,
    /// Registered, waiting for the user to approve it in System Settings.
    RequiresApproval,
    /// The OS could not find the service (e.g. unbundled binary).
    NotFound,
}

impl LoginItemStatus {
    /// Whether the OS considers the app registered, approved or not.
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Enabled | Self::RequiresApproval)
    }
}

impl Display for LoginItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::NotRegistered => "not registered",
            Self::Enabled => "enabled",
            Self::RequiresApproval => "requires approval",
            Self::NotFound => "not found",
        })
    }
}

/// OS login-item facility.
pub trait LoginItemService: Send + Sync {
    /// Current registration state.
    fn status(&self) -> LoginItemStatus;
    /// Register the app to start at login.
    fn register(&self) -> Result<()>;
    /// Remove the app from the login items.
    fn unregister(&self) -> Result<()>;
}

/// Login-item facility for platforms without one.
#[derive(Debug, Default)]
pub struct UnsupportedLoginItem;

impl LoginItemService for UnsupportedLoginItem {
    fn status(&self) -> LoginItemStatus {
        LoginItemStatus::NotFound
    }
    fn register(&self) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn unregister(&self) -> Result<()> {
        Err(Error::Unsupported)
    }
}

/// The native login-item facility for the current platform.
#[cfg(target_os = "macos")]
pub fn system_service() -> Arc<dyn LoginItemService> {
    Arc::new(MainAppService)
}

/// The native login-item facility for the current platform.
#[cfg(not(target_os = "macos"))]
pub fn system_service() -> Arc<dyn LoginItemService> {
    Arc::new(UnsupportedLoginItem)
}

/// In-memory login-item facility for tests.
#[derive(Clone)]
pub struct MockLoginItem {
    status: Arc<Mutex<LoginItemStatus>>,
    fail: Arc<AtomicBool>,
    register_calls: Arc<AtomicUsize>,
    unregister_calls: Arc<AtomicUsize>,
    status_after_register: Arc<Mutex<LoginItemStatus>>,
}

impl MockLoginItem {
    /// Create a mock reporting `status`.
    pub fn new(status: LoginItemStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
            fail: Arc::new(AtomicBool::new(false)),
            register_calls: Arc::new(AtomicUsize::new(0)),
            unregister_calls: Arc::new(AtomicUsize::new(0)),
            status_after_register: Arc::new(Mutex::new(LoginItemStatus::Enabled)),
        }
    }
    /// Overwrite the reported status, as if changed outside the app.
    pub fn set_status(&self, status: LoginItemStatus) {
        *self.status.lock() = status;
    }
    /// Status a successful `register` moves to (default `Enabled`).
    pub fn set_status_after_register(&self, status: LoginItemStatus) {
        *self.status_after_register.lock() = status;
    }
    /// Make mutations fail.
    pub fn set_fail(&self, v: bool) {
        self.fail.store(v, Ordering::SeqCst);
    }
    /// Number of `register` calls, successful or not.
    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }
    /// Number of `unregister` calls, successful or not.
    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }
    fn check_fail(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Registration("Operation not permitted".to_string()));
        }
        Ok(())
    }
}

impl LoginItemService for MockLoginItem {
    fn status(&self) -> LoginItemStatus {
        *self.status.lock()
    }
    fn register(&self) -> Result<()> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let next = *self.status_after_register.lock();
        self.set_status(next);
        Ok(())
    }
    fn unregister(&self) -> Result<()> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        self.set_status(LoginItemStatus::NotRegistered);
        Ok(())
    }
}
