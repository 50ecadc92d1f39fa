//! mac-apps: macOS application operations for the launcher.
//!
//! Provides the process facility the launcher needs: resolve an app bundle's
//! identity, find its running instances, unhide and activate one, or open a
//! new instance. All of it sits behind the [`AppOps`] trait so the launch
//! policy can be tested against [`MockAppOps`].
//!
//! On macOS [`RealAppOps`] uses `NSBundle`, `NSRunningApplication` and
//! `NSWorkspace`. On other platforms [`system_ops`] returns a facility where
//! lookups find nothing and launches fail with [`Error::Unsupported`].

use std::sync::Arc;

use bitflags::bitflags;

mod error;
mod ops;
#[cfg(target_os = "macos")]
mod sys;

pub use error::{Error, Result};
pub use ops::{AppOps, Completion, MockAppOps, UnsupportedAppOps};
#[cfg(target_os = "macos")]
pub use sys::RealAppOps;

/// A running application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApp {
    /// Process id.
    pub pid: i32,
    /// Bundle identifier, when the app has one.
    pub bundle_id: Option<String>,
    /// Whether the app is currently hidden.
    pub hidden: bool,
}

bitflags! {
    /// Options for [`AppOps::activate`], mirroring
    /// `NSApplicationActivationOptions`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActivateOptions: u32 {
        /// Bring all of the app's windows forward, not just the key window.
        const ALL_WINDOWS = 1 << 0;
        /// Take focus even if another app is active.
        const IGNORING_OTHER_APPS = 1 << 1;
    }
}

impl ActivateOptions {
    /// Options used when the launcher brings an app forward.
    pub const FOREGROUND: Self = Self::ALL_WINDOWS.union(Self::IGNORING_OTHER_APPS);
}

/// Options for [`AppOps::open_application`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Activate the app once it has launched.
    pub activates: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { activates: true }
    }
}

/// The native application facility for the current platform.
#[cfg(target_os = "macos")]
pub fn system_ops() -> Arc<dyn AppOps> {
    Arc::new(RealAppOps)
}

/// The native application facility for the current platform.
#[cfg(not(target_os = "macos"))]
pub fn system_ops() -> Arc<dyn AppOps> {
    Arc::new(UnsupportedAppOps)
}
