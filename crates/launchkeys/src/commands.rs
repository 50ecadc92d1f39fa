//! Implementations of the CLI commands.
//!
//! Each command returns the text to print so `main` owns all output.

use std::{
    path::{self, Path},
    sync::Arc,
    time::Duration,
};

use config::{BindingStore, Defaults, LaunchBehavior, LaunchPolicyStore};
use crossbeam_channel::bounded;
use keyslot::KeySlot;
use launchkeys_engine::{Engine, LaunchOutcome, ProcessActivator, Services};
use login_item::LoginItemService;
use mac_apps::AppOps;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// How long the platform wait step blocks per loop iteration.
const TICK: Duration = Duration::from_millis(100);

/// How long `launch` waits for the OS to report back.
const LAUNCH_WAIT: Duration = Duration::from_secs(10);

/// The opened defaults file and the stores built on it.
pub struct Settings {
    defaults: Arc<Defaults>,
}

impl Settings {
    pub fn open(path: &Path) -> Self {
        Self {
            defaults: Arc::new(Defaults::open(path)),
        }
    }

    #[cfg(test)]
    fn in_memory() -> Self {
        Self {
            defaults: Arc::new(Defaults::in_memory()),
        }
    }

    pub fn bindings(&self) -> Arc<BindingStore> {
        Arc::new(BindingStore::new(self.defaults.clone()))
    }

    pub fn policy(&self, login: Arc<dyn LoginItemService>) -> Arc<LaunchPolicyStore> {
        Arc::new(LaunchPolicyStore::new(self.defaults.clone(), login))
    }
}

/// Run the hot-key daemon until Ctrl-C or SIGTERM.
pub fn run(settings: &Settings) -> Result<()> {
    let (stop_tx, stop_rx) = bounded(1);
    ctrlc::set_handler(move || {
        stop_tx.try_send(()).ok();
    })?;
    let mut engine = Engine::new(Services {
        hotkeys: mac_hotkey::system_api(),
        apps: mac_apps::system_ops(),
        bindings: settings.bindings(),
        policy: settings.policy(login_item::system_service()),
    })?;
    info!("launchkeys running; Ctrl+C to quit");
    engine.run(&stop_rx, || mac_hotkey::run_event_loop_once(TICK));
    Ok(())
}

/// One line per slot: label, display name and path, or "Not assigned".
pub fn list(bindings: &BindingStore) -> String {
    let table = bindings.load();
    KeySlot::ALL
        .iter()
        .map(|slot| match table.get(slot) {
            Some(path) => format!(
                "{:<4}{}  ({})",
                slot.label(),
                bindings.resolved_display_name(path),
                path.display()
            ),
            None => format!("{:<4}Not assigned", slot.label()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bind `slot` to the application bundle at `target`, stored as an absolute
/// path. A bundle that does not exist yet is accepted with a warning.
pub fn assign(bindings: &BindingStore, slot: KeySlot, target: &Path) -> Result<String> {
    if !is_app_bundle(target) {
        return Err(Error::NotAnApplication(target.to_path_buf()));
    }
    let abs = path::absolute(target).map_err(|source| Error::Path {
        path: target.to_path_buf(),
        source,
    })?;
    if !abs.exists() {
        warn!(path = %abs.display(), "assigning a path that does not exist");
    }
    bindings.assign(slot, abs.clone())?;
    Ok(format!(
        "{slot} -> {} ({})",
        bindings.resolved_display_name(&abs),
        abs.display()
    ))
}

fn is_app_bundle(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("app"))
}

pub fn clear(bindings: &BindingStore, slot: KeySlot) -> Result<String> {
    bindings.clear(slot)?;
    Ok(format!("{slot} cleared"))
}

/// Focus or start the slot's application once and report how it went.
pub fn launch(
    bindings: &BindingStore,
    ops: Arc<dyn AppOps>,
    policy: Arc<LaunchPolicyStore>,
    slot: KeySlot,
) -> Result<String> {
    let path = bindings.binding(slot).ok_or(Error::NotAssigned(slot))?;
    let name = bindings.resolved_display_name(&path);
    let activator = ProcessActivator::new(ops, policy);
    match activator.launch_or_focus_wait(&path, LAUNCH_WAIT) {
        Some(LaunchOutcome::Focused(pid)) => Ok(format!("Focused {name} (pid {pid})")),
        Some(LaunchOutcome::Launched(Some(pid))) => Ok(format!("Launched {name} (pid {pid})")),
        Some(LaunchOutcome::Launched(None)) => Ok(format!("Launched {name}")),
        Some(LaunchOutcome::Failed(msg)) => Err(Error::Launch(msg)),
        None => Ok(format!("Launch of {name} requested")),
    }
}

pub fn behavior(policy: &LaunchPolicyStore, value: Option<LaunchBehavior>) -> Result<String> {
    if let Some(v) = value {
        policy.set_launch_behavior(v)?;
    }
    let current = policy.launch_behavior();
    Ok(format!("{} ({current})", current.title()))
}

pub fn login(policy: &LaunchPolicyStore, value: Option<bool>) -> Result<String> {
    if let Some(enabled) = value {
        policy.set_start_at_login(enabled)?;
    }
    let state = if policy.start_at_login() { "on" } else { "off" };
    Ok(format!("{state} (login item: {})", policy.login_status()))
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        path::PathBuf,
        process,
        time::{SystemTime, UNIX_EPOCH},
    };

    use login_item::{LoginItemStatus, MockLoginItem};
    use mac_apps::MockAppOps;

    use super::*;

    fn unique_tmp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let mut dir = env::temp_dir();
        dir.push(format!("launchkeys-{name}-{}-{nanos}", process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn list_shows_every_slot() {
        let settings = Settings::in_memory();
        let b = settings.bindings();
        b.assign(KeySlot::F2, "/Applications/Safari.app").unwrap();
        let out = list(&b);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "F1  Not assigned");
        assert_eq!(lines[1], "F2  Safari  (/Applications/Safari.app)");
        assert_eq!(lines[11], "F12 Not assigned");
    }

    #[test]
    fn assign_persists_absolute_path() {
        let dir = unique_tmp_dir("cli-assign");
        let settings = Settings::open(&dir.join("settings.json"));
        let msg = assign(&settings.bindings(), KeySlot::F5, Path::new("Foo.app")).unwrap();
        assert!(msg.starts_with("F5 -> Foo ("));

        let reopened = Settings::open(&dir.join("settings.json"));
        let stored = reopened.bindings().binding(KeySlot::F5).unwrap();
        assert!(stored.is_absolute());
        assert!(stored.ends_with("Foo.app"));

        clear(&reopened.bindings(), KeySlot::F5).unwrap();
        let again = Settings::open(&dir.join("settings.json"));
        assert_eq!(again.bindings().binding(KeySlot::F5), None);
    }

    #[test]
    fn assign_only_accepts_app_bundles() {
        let settings = Settings::in_memory();
        let b = settings.bindings();
        assert!(matches!(
            assign(&b, KeySlot::F4, Path::new("/usr/bin/true")),
            Err(Error::NotAnApplication(_))
        ));
        assert!(matches!(
            assign(&b, KeySlot::F4, Path::new("/Users/me/notes.txt")),
            Err(Error::NotAnApplication(_))
        ));
        assert_eq!(b.binding(KeySlot::F4), None);
        assign(&b, KeySlot::F4, Path::new("/Applications/Mixed.APP")).unwrap();
        assert!(b.binding(KeySlot::F4).is_some());
    }

    #[test]
    fn launch_unassigned_slot_fails() {
        let settings = Settings::in_memory();
        let policy = settings.policy(Arc::new(MockLoginItem::new(LoginItemStatus::NotFound)));
        let err = launch(
            &settings.bindings(),
            Arc::new(MockAppOps::new()),
            policy,
            KeySlot::F3,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotAssigned(KeySlot::F3)));
    }

    #[test]
    fn launch_reports_outcome() {
        let settings = Settings::in_memory();
        let b = settings.bindings();
        b.assign(KeySlot::F1, "/Applications/Foo.app").unwrap();
        let ops = MockAppOps::new();
        ops.install_app("/Applications/Foo.app", "com.example.foo");
        let policy = settings.policy(Arc::new(MockLoginItem::new(LoginItemStatus::NotFound)));

        let msg = launch(&b, Arc::new(ops.clone()), policy.clone(), KeySlot::F1).unwrap();
        assert_eq!(msg, "Launched Foo (pid 1000)");
        let msg = launch(&b, Arc::new(ops.clone()), policy, KeySlot::F1).unwrap();
        assert_eq!(msg, "Focused Foo (pid 1000)");

        ops.set_fail_open(true);
        b.assign(KeySlot::F2, "/Applications/Bar.app").unwrap();
        let policy = settings.policy(Arc::new(MockLoginItem::new(LoginItemStatus::NotFound)));
        assert!(matches!(
            launch(&b, Arc::new(ops), policy, KeySlot::F2),
            Err(Error::Launch(_))
        ));
    }

    #[test]
    fn behavior_reads_and_writes() {
        let settings = Settings::in_memory();
        let policy = settings.policy(Arc::new(MockLoginItem::new(LoginItemStatus::NotFound)));
        assert_eq!(
            behavior(&policy, None).unwrap(),
            "Focus existing window (focusExisting)"
        );
        assert_eq!(
            behavior(&policy, Some(LaunchBehavior::LaunchNewInstance)).unwrap(),
            "Launch new instance (launchNewInstance)"
        );
    }

    #[test]
    fn login_failure_is_an_error() {
        let settings = Settings::in_memory();
        let mock = MockLoginItem::new(LoginItemStatus::NotRegistered);
        mock.set_fail(true);
        let policy = settings.policy(Arc::new(mock));
        assert_eq!(login(&policy, None).unwrap(), "off (login item: not registered)");
        assert!(matches!(login(&policy, Some(true)), Err(Error::Config(_))));
        assert_eq!(login(&policy, None).unwrap(), "off (login item: not registered)");
    }
}
