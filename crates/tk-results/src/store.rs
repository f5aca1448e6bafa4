//! Key/value persistence for the history payload.

use crate::{ResultsError, ResultsResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Whole-value storage addressed by a well-known key.
///
/// Values are replaced wholesale on `put`; there is no partial update.
pub trait HistoryStore: Send {
    /// Read the payload stored under `key`, `None` if absent.
    fn get(&self, key: &str) -> ResultsResult<Option<String>>;

    /// Replace the payload stored under `key`.
    fn put(&mut self, key: &str, payload: &str) -> ResultsResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> ResultsResult<()>;
}

fn check_key(key: &str) -> ResultsResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && key != "."
        && key != "..";
    if valid {
        Ok(())
    } else {
        Err(ResultsError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root_dir: PathBuf,
}

impl FileStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn path_for(&self, key: &str) -> ResultsResult<PathBuf> {
        check_key(key)?;
        Ok(self.root_dir.join(format!("{key}.json")))
    }
}

impl HistoryStore for FileStore {
    fn get(&self, key: &str) -> ResultsResult<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn put(&mut self, key: &str, payload: &str) -> ResultsResult<()> {
        let path = self.path_for(key)?;
        if !self.root_dir.exists() {
            fs::create_dir_all(&self.root_dir)?;
        }
        fs::write(path, payload)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> ResultsResult<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-process store. Clones share the same entries, so a caller can keep a
/// handle to inspect what the recorder wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `put`/`remove` calls fail with `Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Store a payload directly, bypassing failure injection.
    pub fn insert_raw(&self, key: &str, payload: &str) {
        self.lock().insert(key.to_string(), payload.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> ResultsResult<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            Err(ResultsError::Unavailable {
                message: "memory store is read-only".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl HistoryStore for MemoryStore {
    fn get(&self, key: &str) -> ResultsResult<Option<String>> {
        check_key(key)?;
        Ok(self.raw(key))
    }

    fn put(&mut self, key: &str, payload: &str) -> ResultsResult<()> {
        check_key(key)?;
        self.check_writable()?;
        self.insert_raw(key, payload);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> ResultsResult<()> {
        check_key(key)?;
        self.check_writable()?;
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_restricted() {
        assert!(check_key("process_history").is_ok());
        assert!(check_key("tank-1.v2").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("..").is_err());
        assert!(check_key("../escape").is_err());
        assert!(check_key("a/b").is_err());
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.put("k", "[]").unwrap();
        assert_eq!(store.raw("k").as_deref(), Some("[]"));

        writer.remove("k").unwrap();
        assert!(!store.contains("k"));
    }

    #[test]
    fn memory_store_failure_injection() {
        let mut store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.put("k", "[]"),
            Err(ResultsError::Unavailable { .. })
        ));
        store.set_fail_writes(false);
        assert!(store.put("k", "[]").is_ok());
    }
}
