//! `SMAppService` backend (macOS 13+).
use objc2_service_management::{SMAppService, SMAppServiceStatus};
use tracing::debug;

use crate::{Error, LoginItemService, LoginItemStatus, Result};

/// The main app bundle's login-item service.
#[derive(Debug, Default, Clone, Copy)]
pub struct MainAppService;

impl LoginItemService for MainAppService {
    fn status(&self) -> LoginItemStatus {
        // SAFETY: plain property reads on the shared main-app service.
        let status = unsafe { SMAppService::mainAppService().status() };
        if status == SMAppServiceStatus::Enabled {
            LoginItemStatus::Enabled
        } else if status == SMAppServiceStatus::RequiresApproval {
            LoginItemStatus::RequiresApproval
        } else if status == SMAppServiceStatus::NotFound {
            LoginItemStatus::NotFound
        } else {
            LoginItemStatus::NotRegistered
        }
    }

    fn register(&self) -> Result<()> {
        debug!("login_item_register");
        // SAFETY: synchronous call on the shared main-app service.
        unsafe { SMAppService::mainAppService().registerAndReturnError() }
            .map_err(|e| Error::Registration(e.localizedDescription().to_string()))
    }

    fn unregister(&self) -> Result<()> {
        debug!("login_item_unregister");
        // SAFETY: synchronous call on the shared main-app service.
        unsafe { SMAppService::mainAppService().unregisterAndReturnError() }
            .map_err(|e| Error::Registration(e.localizedDescription().to_string()))
    }
}
