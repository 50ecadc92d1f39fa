#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        env, fs,
        path::{Path, PathBuf},
        process,
        sync::Arc,
        time::{SystemTime, UNIX_EPOCH},
    };

    use keyslot::KeySlot;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    use crate::{Binding, BindingStore, BindingTable, Defaults, Error, MAPPINGS_KEY};

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

    fn file_store(path: &Path) -> BindingStore {
        BindingStore::new(Arc::new(Defaults::open(path)))
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let dir = unique_tmp_dir("bindings-roundtrip");
        let path = dir.join("settings.json");

        let mut table = BindingTable::new();
        table.insert(KeySlot::F5, PathBuf::from("/Applications/Foo.app"));
        table.insert(KeySlot::F12, PathBuf::from("/Applications/Utilities/Terminal.app"));
        file_store(&path).save(&table).unwrap();
        assert_eq!(file_store(&path).load(), table);

        file_store(&path).save(&BindingTable::new()).unwrap();
        let reopened = Defaults::open(&path);
        assert_eq!(reopened.get(MAPPINGS_KEY), Some(json!([])));
        assert!(file_store(&path).load().is_empty());
    }

    #[test]
    fn refresh_picks_up_other_writers() {
        let dir = unique_tmp_dir("bindings-refresh");
        let path = dir.join("settings.json");
        let daemon = file_store(&path);
        let changes = daemon.subscribe();

        BindingStore::new(Arc::new(Defaults::open(&path)))
            .assign(KeySlot::F5, "/Applications/Foo.app")
            .unwrap();
        assert_eq!(daemon.binding(KeySlot::F5), None);
        assert!(daemon.refresh());
        assert!(changes.drain());
        assert_eq!(
            daemon.binding(KeySlot::F5),
            Some(PathBuf::from("/Applications/Foo.app"))
        );

        // Unrelated keys change the file but not the table.
        Defaults::open(&path)
            .set("launchBehavior", json!("launchNewInstance"))
            .unwrap();
        assert!(!daemon.refresh());
        assert!(!changes.drain());

        file_store(&path).clear(KeySlot::F5).unwrap();
        assert!(daemon.refresh());
        assert!(changes.drain());
        assert_eq!(daemon.binding(KeySlot::F5), None);
        assert!(!daemon.refresh());
    }

    #[test]
    fn in_memory_store_has_nothing_to_watch() {
        let store = BindingStore::new(Arc::new(Defaults::in_memory()));
        assert!(store.watch().unwrap().is_none());
        assert!(!store.refresh());
    }

    #[test]
    fn persisted_shape_uses_ordinals_and_camel_case() {
        let defaults = Arc::new(Defaults::in_memory());
        let store = BindingStore::new(defaults.clone());
        store.assign(KeySlot::F3, "/Applications/Mail.app").unwrap();
        assert_eq!(
            defaults.get(MAPPINGS_KEY),
            Some(json!([{ "functionKey": 3, "appPath": "/Applications/Mail.app" }]))
        );
    }

    #[test]
    fn corrupt_mappings_load_as_empty() {
        let defaults = Arc::new(Defaults::in_memory());
        defaults.set(MAPPINGS_KEY, json!("garbage")).unwrap();
        let store = BindingStore::new(defaults.clone());
        assert!(store.load().is_empty());

        defaults
            .set(MAPPINGS_KEY, json!([{ "functionKey": 13, "appPath": "/x.app" }]))
            .unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn write_failure_suppresses_notification() {
        let dir = unique_tmp_dir("bindings-blocked");
        let blocker = dir.join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let store = file_store(&blocker.join("settings.json"));
        let sub = store.subscribe();

        let err = store.assign(KeySlot::F1, "/Applications/A.app").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!sub.drain());
        assert!(store.load().is_empty());
    }

    #[test]
    fn every_save_notifies_in_order() {
        let store = BindingStore::new(Arc::new(Defaults::in_memory()));
        let sub = store.subscribe();
        store.assign(KeySlot::F1, "/Applications/A.app").unwrap();
        store.clear(KeySlot::F1).unwrap();
        // Clearing an unbound slot still saves.
        store.clear(KeySlot::F9).unwrap();
        assert_eq!(sub.receiver().try_iter().count(), 3);
    }

    #[test]
    fn assign_is_idempotent_upsert() {
        let store = BindingStore::new(Arc::new(Defaults::in_memory()));
        store.assign(KeySlot::F4, "/Applications/A.app").unwrap();
        store.assign(KeySlot::F4, "/Applications/A.app").unwrap();
        store.assign(KeySlot::F4, "/Applications/B.app").unwrap();
        assert_eq!(store.load().len(), 1);
        assert_eq!(
            store.binding(KeySlot::F4),
            Some(PathBuf::from("/Applications/B.app"))
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Assign(u32, u8),
        Clear(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u32..=12, 0u8..4).prop_map(|(s, a)| Op::Assign(s, a)),
            (1u32..=12).prop_map(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn slots_stay_unique(ops in prop::collection::vec(op(), 0..40)) {
            let defaults = Arc::new(Defaults::in_memory());
            let store = BindingStore::new(defaults.clone());
            let mut model = BTreeMap::new();
            for op in ops {
                match op {
                    Op::Assign(s, a) => {
                        let slot = KeySlot::from_ordinal(s).unwrap();
                        let path = PathBuf::from(format!("/Applications/App{a}.app"));
                        store.assign(slot, path.clone()).unwrap();
                        model.insert(slot, path);
                    }
                    Op::Clear(s) => {
                        let slot = KeySlot::from_ordinal(s).unwrap();
                        store.clear(slot).unwrap();
                        model.remove(&slot);
                    }
                }
                let raw: Vec<Binding> =
                    serde_json::from_value(defaults.get(MAPPINGS_KEY).unwrap_or(Value::Null))
                        .unwrap_or_default();
                let mut seen: Vec<KeySlot> = raw.iter().map(|b| b.function_key).collect();
                let total = seen.len();
                seen.sort();
                seen.dedup();
                prop_assert_eq!(seen.len(), total);
            }
            prop_assert_eq!(store.load(), model);
        }
    }
}
