//! File-backed preferences store, the durable default

use super::{BookmarkStore, PersistedGrant};
use crate::error::{Error, PersistError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Grant records in a single JSON preferences file.
///
/// The process-wide analog of the host's user-preferences store: one map,
/// read once on open, written through on every mutation. Storage failures
/// after open are logged and swallowed per the `BookmarkStore` contract.
pub struct PreferencesStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, PersistedGrant>>,
}

impl PreferencesStore {
    /// Open (or create) the store for `app_id` under the user preferences
    /// directory
    pub fn new(app_id: &str) -> Result<Self> {
        let dir = dirs::preference_dir()
            .or_else(dirs::config_dir)
            .ok_or_else(|| {
                Error::Persist(PersistError::StoreUnavailable(
                    "no user preferences directory".to_string(),
                ))
            })?
            .join(app_id);

        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Persist(PersistError::StoreUnavailable(format!(
                "failed to create preferences directory {:?}: {}",
                dir, e
            )))
        })?;

        let path = dir.join("sandpass-grants.json");
        info!("Grant store path: {:?}", path);

        Self::from_path(path)
    }

    /// Open a store at a specific file path (useful for testing)
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(raw) => match serde_json::from_slice(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Grant store at {:?} is corrupt, starting empty: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, PersistedGrant>) {
        let json = match serde_json::to_vec_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode grant store: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!("Failed to write grant store {:?}: {}", self.path, e);
        }
    }
}

impl BookmarkStore for PreferencesStore {
    fn get(&self, key: &str) -> Option<PersistedGrant> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, grant: PersistedGrant) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), grant);
        self.flush(&entries);
        debug!("Persisted grant under key {}", key);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn entries_survive_reopening() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("grants.json");

        let store = PreferencesStore::from_path(&file).unwrap();
        store.set("bd_/vault", PersistedGrant::new(b"mark".to_vec()));
        drop(store);

        let reopened = PreferencesStore::from_path(&file).unwrap();
        let grant = reopened.get("bd_/vault").unwrap();
        assert_eq!(grant.bookmark, b"mark");
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = PreferencesStore::from_path(dir.path().join("absent.json")).unwrap();
        assert!(store.get("bd_/anything").is_none());
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("grants.json");
        std::fs::write(&file, b"not json at all {{{").unwrap();

        let store = PreferencesStore::from_path(&file).unwrap();
        assert!(store.get("bd_/vault").is_none());

        // Still usable: a new grant replaces the corrupt content on disk
        store.set("bd_/vault", PersistedGrant::new(b"fresh".to_vec()));
        let reopened = PreferencesStore::from_path(&file).unwrap();
        assert_eq!(reopened.get("bd_/vault").unwrap().bookmark, b"fresh");
    }

    #[test]
    fn remove_is_written_through() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("grants.json");

        let store = PreferencesStore::from_path(&file).unwrap();
        store.set("bd_/vault", PersistedGrant::new(b"mark".to_vec()));
        store.remove("bd_/vault");
        drop(store);

        let reopened = PreferencesStore::from_path(&file).unwrap();
        assert!(reopened.get("bd_/vault").is_none());
    }
}
