//! AppKit backend for [`AppOps`].
use std::path::Path;

use block2::RcBlock;
use objc2_app_kit::{
    NSApplicationActivationOptions, NSRunningApplication, NSWorkspace,
    NSWorkspaceOpenConfiguration,
};
use objc2_foundation::{NSBundle, NSError, NSString, NSURL};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{ActivateOptions, AppOps, Completion, Error, OpenOptions, RunningApp};

/// Production implementation delegating to AppKit.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealAppOps;

fn file_url(path: &Path) -> objc2::rc::Retained<NSURL> {
    let s = NSString::from_str(&path.to_string_lossy());
    NSURL::fileURLWithPath(&s)
}

fn describe(app: &NSRunningApplication) -> RunningApp {
    // SAFETY: property reads on a live NSRunningApplication.
    unsafe {
        RunningApp {
            pid: app.processIdentifier(),
            bundle_id: app.bundleIdentifier().map(|s| s.to_string()),
            hidden: app.isHidden(),
        }
    }
}

fn lookup(pid: i32) -> Option<objc2::rc::Retained<NSRunningApplication>> {
    // SAFETY: class method lookup by pid; returns None for dead processes.
    unsafe { NSRunningApplication::runningApplicationWithProcessIdentifier(pid as libc::pid_t) }
}

fn ns_options(options: ActivateOptions) -> NSApplicationActivationOptions {
    let mut o = NSApplicationActivationOptions::empty();
    if options.contains(ActivateOptions::ALL_WINDOWS) {
        o |= NSApplicationActivationOptions::ActivateAllWindows;
    }
    if options.contains(ActivateOptions::IGNORING_OTHER_APPS) {
        #[allow(deprecated)]
        {
            o |= NSApplicationActivationOptions::ActivateIgnoringOtherApps;
        }
    }
    o
}

impl AppOps for RealAppOps {
    fn bundle_identifier(&self, path: &Path) -> Option<String> {
        let url = file_url(path);
        // SAFETY: NSBundle lookup on a file URL.
        let bundle = unsafe { NSBundle::bundleWithURL(&url) }?;
        // SAFETY: property read on a live bundle.
        unsafe { bundle.bundleIdentifier() }.map(|s| s.to_string())
    }

    fn running_apps(&self, bundle_id: &str) -> Vec<RunningApp> {
        let id = NSString::from_str(bundle_id);
        // SAFETY: class method returning an autoreleased array.
        let apps = unsafe { NSRunningApplication::runningApplicationsWithBundleIdentifier(&id) };
        apps.iter().map(|a| describe(&a)).collect()
    }

    fn unhide(&self, app: &RunningApp) -> bool {
        match lookup(app.pid) {
            // SAFETY: method call on a live NSRunningApplication.
            Some(a) => unsafe { a.unhide() },
            None => false,
        }
    }

    fn activate(&self, app: &RunningApp, options: ActivateOptions) -> bool {
        let Some(a) = lookup(app.pid) else {
            warn!(pid = app.pid, "NSRunningApplication not found");
            return false;
        };
        // SAFETY: method call on a live NSRunningApplication.
        let ok = unsafe { a.activateWithOptions(ns_options(options)) };
        if ok {
            debug!(pid = app.pid, "activated app via NSRunningApplication");
        } else {
            warn!(pid = app.pid, "NSRunningApplication.activateWithOptions returned false");
        }
        ok
    }

    fn open_application(&self, path: &Path, options: OpenOptions, done: Completion) {
        let url = file_url(path);
        // SAFETY: configuration objects are plain value holders.
        let config = unsafe { NSWorkspaceOpenConfiguration::configuration() };
        // SAFETY: setter on the configuration we just created and still own.
        unsafe { config.setActivates(options.activates) };

        let slot: Mutex<Option<Completion>> = Mutex::new(Some(done));
        let shown = path.display().to_string();
        let block = RcBlock::new(move |app: *mut NSRunningApplication, err: *mut NSError| {
            let Some(done) = slot.lock().take() else {
                return;
            };
            // SAFETY: AppKit passes either null or a live object for each.
            let (app, err) = unsafe { (app.as_ref(), err.as_ref()) };
            match (app, err) {
                (_, Some(e)) => {
                    let msg = e.localizedDescription().to_string();
                    debug!(path = %shown, error = %msg, "open_application_failed");
                    done(Err(Error::Launch(msg)));
                }
                (Some(a), None) => done(Ok(Some(describe(a)))),
                (None, None) => done(Ok(None)),
            }
        });
        // SAFETY: the block is retained by AppKit until it has run.
        unsafe {
            NSWorkspace::sharedWorkspace().openApplicationAtURL_configuration_completionHandler(
                &url,
                &config,
                Some(&*block),
            );
        }
    }
}
