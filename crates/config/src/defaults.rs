//! The defaults file: a flat JSON object persisted atomically.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process,
};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Key/value preferences backed by a single JSON object file.
///
/// Reads are served from memory; [`Defaults::reload`] picks up writes made by
/// other processes. Every mutation rewrites the whole file via a sibling temp
/// file and a rename, and only lands in memory once the write succeeded.
pub struct Defaults {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
}

impl Defaults {
    /// Open the defaults file at `path`.
    ///
    /// A missing file yields empty defaults. An unreadable or corrupt file is
    /// logged and also treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_object(&path) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "defaults_unreadable");
                Map::new()
            }
        };
        debug!(path = %path.display(), keys = values.len(), "defaults_opened");
        Self {
            path: Some(path),
            values: Mutex::new(values),
        }
    }

    /// Defaults that are never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(Map::new()),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }

    /// Store `value` under `key` and persist.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    /// Re-read the backing file. Returns whether any value changed.
    ///
    /// A missing file reads as empty. An unreadable or corrupt file leaves the
    /// current values in place.
    pub fn reload(&self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let fresh = match read_object(path) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "defaults_reload_failed");
                return false;
            }
        };
        let mut values = self.values.lock();
        if *values == fresh {
            return false;
        }
        *values = fresh;
        debug!(path = %path.display(), "defaults_reloaded");
        true
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let body = serde_json::to_vec_pretty(values).map_err(Error::Encode)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let tmp = temp_sibling(path);
        fs::write(&tmp, body).map_err(|e| Error::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, path) {
            fs::remove_file(&tmp).ok();
            return Err(Error::io(path, e));
        }
        debug!(path = %path.display(), "defaults_saved");
        Ok(())
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(Error::io(path, e)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    serde_json::from_slice(&bytes).map_err(Error::Decode)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings".to_string());
    path.with_file_name(format!(".{name}.tmp-{}", process::id()))
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        path::PathBuf,
        process,
        time::{SystemTime, UNIX_EPOCH},
    };

    use serde_json::json;

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
    fn missing_file_is_empty() {
        let dir = unique_tmp_dir("defaults-missing");
        let d = Defaults::open(dir.join("settings.json"));
        assert!(!d.contains("anything"));
    }

    #[test]
    fn set_persists_and_reopens() {
        let dir = unique_tmp_dir("defaults-reopen");
        let path = dir.join("nested").join("settings.json");
        let d = Defaults::open(&path);
        d.set("startAtLogin", json!(true)).unwrap();
        d.set("launchBehavior", json!("launchNewInstance")).unwrap();

        let again = Defaults::open(&path);
        assert_eq!(again.get("startAtLogin"), Some(json!(true)));
        assert_eq!(again.get("launchBehavior"), Some(json!("launchNewInstance")));
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = unique_tmp_dir("defaults-corrupt");
        let path = dir.join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let d = Defaults::open(&path);
        assert!(d.get("appMappings").is_none());
        d.set("startAtLogin", json!(false)).unwrap();
        assert_eq!(Defaults::open(&path).get("startAtLogin"), Some(json!(false)));
    }

    #[test]
    fn failed_write_keeps_memory_unchanged() {
        let dir = unique_tmp_dir("defaults-blocked");
        let blocker = dir.join("file");
        fs::write(&blocker, "x").unwrap();
        let d = Defaults::open(blocker.join("settings.json"));
        assert!(matches!(d.set("k", json!(1)), Err(Error::Io { .. })));
        assert!(!d.contains("k"));
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() {
        let dir = unique_tmp_dir("defaults-rename");
        // A non-empty directory where the file should go makes the rename fail.
        let path = dir.join("settings.json");
        fs::create_dir_all(path.join("occupied")).unwrap();
        let d = Defaults::open(&path);
        assert!(matches!(d.set("k", json!(1)), Err(Error::Io { .. })));
        assert!(!d.contains("k"));
        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn reload_sees_other_writers() {
        let dir = unique_tmp_dir("defaults-reload");
        let path = dir.join("settings.json");
        let ours = Defaults::open(&path);
        let theirs = Defaults::open(&path);
        ours.set("k", json!(1)).unwrap();
        assert!(!ours.reload());

        theirs.set("k", json!(2)).unwrap();
        assert_eq!(ours.get("k"), Some(json!(1)));
        assert!(ours.reload());
        assert_eq!(ours.get("k"), Some(json!(2)));
        assert!(!ours.reload());

        fs::write(&path, "{ torn").unwrap();
        assert!(!ours.reload());
        assert_eq!(ours.get("k"), Some(json!(2)));
    }

    #[test]
    fn in_memory_never_reloads() {
        let d = Defaults::in_memory();
        d.set("k", json!(1)).unwrap();
        assert!(!d.reload());
        assert!(d.path().is_none());
        assert_eq!(d.get("k"), Some(json!(1)));
    }
}
