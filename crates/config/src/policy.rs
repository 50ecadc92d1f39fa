//! Launch policy: focus-vs-new-instance and start-at-login.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use login_item::{LoginItemService, LoginItemStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Defaults, Error, Result};

pub const LAUNCH_BEHAVIOR_KEY: &str = "launchBehavior";
pub const START_AT_LOGIN_KEY: &str = "startAtLogin";

/// What to do when the target app is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchBehavior {
    /// Bring the running instance forward.
    #[default]
    FocusExisting,
    /// Always start another instance.
    LaunchNewInstance,
}

impl LaunchBehavior {
    /// Persisted name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FocusExisting => "focusExisting",
            Self::LaunchNewInstance => "launchNewInstance",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Self::FocusExisting => "Focus existing window",
            Self::LaunchNewInstance => "Launch new instance",
        }
    }
}

impl Display for LaunchBehavior {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchBehavior {
    type Err = Error;

    /// Accepts the persisted names and their kebab-case forms.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "focusExisting" | "focus-existing" => Ok(Self::FocusExisting),
            "launchNewInstance" | "launch-new-instance" => Ok(Self::LaunchNewInstance),
            other => Err(Error::UnknownBehavior(other.to_string())),
        }
    }
}

/// The two launch preferences, with start-at-login mirrored into the OS.
pub struct LaunchPolicyStore {
    defaults: Arc<Defaults>,
    login: Arc<dyn LoginItemService>,
}

impl LaunchPolicyStore {
    /// Create the store. On first run `startAtLogin` is seeded from the OS
    /// registration state.
    pub fn new(defaults: Arc<Defaults>, login: Arc<dyn LoginItemService>) -> Self {
        if !defaults.contains(START_AT_LOGIN_KEY) {
            let status = login.status();
            let seeded = status.is_registered();
            debug!(%status, seeded, "start_at_login_seeded");
            if let Err(e) = defaults.set(START_AT_LOGIN_KEY, Value::Bool(seeded)) {
                warn!(error = %e, "start_at_login_seed_failed");
            }
        }
        Self { defaults, login }
    }

    /// Persisted behavior; [`LaunchBehavior::FocusExisting`] if unset or unparsable.
    pub fn launch_behavior(&self) -> LaunchBehavior {
        self.defaults
            .get(LAUNCH_BEHAVIOR_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn set_launch_behavior(&self, behavior: LaunchBehavior) -> Result<()> {
        let value = serde_json::to_value(behavior).map_err(Error::Encode)?;
        self.defaults.set(LAUNCH_BEHAVIOR_KEY, value)?;
        info!(behavior = %behavior, "launch_behavior_set");
        Ok(())
    }

    /// Persisted start-at-login preference.
    pub fn start_at_login(&self) -> bool {
        match self.defaults.get(START_AT_LOGIN_KEY) {
            Some(Value::Bool(b)) => b,
            _ => self.login.status().is_registered(),
        }
    }

    /// Live OS registration state.
    pub fn login_status(&self) -> LoginItemStatus {
        self.login.status()
    }

    /// Change start-at-login. The OS is only touched when its live state
    /// disagrees with `enabled`; the preference is persisted only on success.
    pub fn set_start_at_login(&self, enabled: bool) -> Result<()> {
        let status = self.login.status();
        if enabled {
            if status != LoginItemStatus::Enabled {
                self.login.register()?;
                info!(%status, "login_item_registered");
            }
        } else if status.is_registered() {
            self.login.unregister()?;
            info!(%status, "login_item_unregistered");
        }
        self.defaults
            .set(START_AT_LOGIN_KEY, Value::Bool(enabled))
    }

    /// Reapply the persisted preference at startup. Failures are logged.
    pub fn apply_start_at_login_setting(&self) {
        let wanted = self.start_at_login();
        if let Err(e) = self.set_start_at_login(wanted) {
            warn!(wanted, error = %e, "apply_start_at_login_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use login_item::MockLoginItem;
    use serde_json::json;

    use super::*;

    fn store(status: LoginItemStatus) -> (LaunchPolicyStore, MockLoginItem, Arc<Defaults>) {
        let defaults = Arc::new(Defaults::in_memory());
        let mock = MockLoginItem::new(status);
        let s = LaunchPolicyStore::new(defaults.clone(), Arc::new(mock.clone()));
        (s, mock, defaults)
    }

    #[test]
    fn behavior_defaults_to_focus_existing() {
        let (s, _, defaults) = store(LoginItemStatus::NotRegistered);
        assert_eq!(s.launch_behavior(), LaunchBehavior::FocusExisting);
        defaults.set(LAUNCH_BEHAVIOR_KEY, json!("sideways")).unwrap();
        assert_eq!(s.launch_behavior(), LaunchBehavior::FocusExisting);
        s.set_launch_behavior(LaunchBehavior::LaunchNewInstance).unwrap();
        assert_eq!(defaults.get(LAUNCH_BEHAVIOR_KEY), Some(json!("launchNewInstance")));
        assert_eq!(s.launch_behavior(), LaunchBehavior::LaunchNewInstance);
    }

    #[test]
    fn behavior_parses_both_spellings() {
        assert_eq!(
            "launch-new-instance".parse::<LaunchBehavior>().unwrap(),
            LaunchBehavior::LaunchNewInstance
        );
        assert_eq!(
            "focusExisting".parse::<LaunchBehavior>().unwrap(),
            LaunchBehavior::FocusExisting
        );
        assert!("nope".parse::<LaunchBehavior>().is_err());
    }

    #[test]
    fn enabling_may_leave_approval_pending() {
        let (s, mock, _) = store(LoginItemStatus::NotRegistered);
        mock.set_status_after_register(LoginItemStatus::RequiresApproval);
        s.set_start_at_login(true).unwrap();
        assert!(s.start_at_login());
        assert_eq!(s.login_status(), LoginItemStatus::RequiresApproval);
        assert_eq!(mock.register_calls(), 1);
    }

    #[test]
    fn first_run_seeds_from_pending_approval() {
        let (s, mock, _) = store(LoginItemStatus::RequiresApproval);
        assert!(s.start_at_login());
        mock.set_status(LoginItemStatus::NotRegistered);
        // Seeded once; later OS changes do not rewrite the preference.
        assert!(s.start_at_login());
    }

    #[test]
    fn existing_preference_is_not_reseeded() {
        let defaults = Arc::new(Defaults::in_memory());
        defaults.set(START_AT_LOGIN_KEY, json!(false)).unwrap();
        let mock = MockLoginItem::new(LoginItemStatus::Enabled);
        let s = LaunchPolicyStore::new(defaults, Arc::new(mock));
        assert!(!s.start_at_login());
    }

    #[test]
    fn enabling_when_already_enabled_is_a_no_op() {
        let (s, mock, _) = store(LoginItemStatus::Enabled);
        assert!(s.start_at_login());
        s.set_start_at_login(true).unwrap();
        assert_eq!(mock.register_calls(), 0);
        assert_eq!(mock.unregister_calls(), 0);
        assert!(s.start_at_login());
    }

    #[test]
    fn enabling_while_pending_approval_registers_again() {
        let (s, mock, _) = store(LoginItemStatus::RequiresApproval);
        s.set_start_at_login(true).unwrap();
        assert_eq!(mock.register_calls(), 1);
    }

    #[test]
    fn disabling_pending_approval_unregisters() {
        let (s, mock, _) = store(LoginItemStatus::RequiresApproval);
        s.set_start_at_login(false).unwrap();
        assert_eq!(mock.unregister_calls(), 1);
        assert!(!s.start_at_login());
    }

    #[test]
    fn disabling_when_not_registered_skips_os() {
        let (s, mock, _) = store(LoginItemStatus::NotRegistered);
        s.set_start_at_login(false).unwrap();
        assert_eq!(mock.unregister_calls(), 0);
    }

    #[test]
    fn failure_is_returned_and_not_persisted() {
        let (s, mock, _) = store(LoginItemStatus::NotRegistered);
        mock.set_fail(true);
        let err = s.set_start_at_login(true).unwrap_err();
        assert!(matches!(err, Error::LoginItem(_)));
        assert!(!s.start_at_login());
        assert_eq!(mock.register_calls(), 1);
    }

    #[test]
    fn apply_swallows_failures() {
        let defaults = Arc::new(Defaults::in_memory());
        defaults.set(START_AT_LOGIN_KEY, json!(true)).unwrap();
        let mock = MockLoginItem::new(LoginItemStatus::NotRegistered);
        mock.set_fail(true);
        let s = LaunchPolicyStore::new(defaults, Arc::new(mock.clone()));
        s.apply_start_at_login_setting();
        assert_eq!(mock.register_calls(), 1);
        assert!(s.start_at_login());
    }
}
