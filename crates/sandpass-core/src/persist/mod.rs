//! Durable grant persistence
//!
//! Grants are opaque bookmark bytes keyed by the canonical path string they
//! cover. The store itself is a pluggable key/value seam; hosts that keep
//! settings elsewhere (a database, their own preferences plumbing) implement
//! `BookmarkStore` and hand it to the broker.

mod preferences;

pub use preferences::PreferencesStore;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A stored security-scoped bookmark for one granted path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedGrant {
    #[serde(with = "bookmark_bytes")]
    pub bookmark: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl PersistedGrant {
    pub fn new(bookmark: Vec<u8>) -> Self {
        Self {
            bookmark,
            created_at: Utc::now(),
        }
    }
}

/// Bookmark bytes travel base64-encoded inside JSON records
mod bookmark_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Key/value persistence for grant records.
///
/// Signatures are infallible: implementations log and degrade on storage
/// failure rather than surfacing errors, since a lost write only means the
/// user is prompted again on a later launch.
pub trait BookmarkStore {
    fn get(&self, key: &str) -> Option<PersistedGrant>;
    fn set(&self, key: &str, grant: PersistedGrant);
    fn remove(&self, key: &str);
}

/// Path-keyed view over a `BookmarkStore`
pub struct GrantLedger {
    store: std::sync::Arc<dyn BookmarkStore>,
}

impl GrantLedger {
    pub fn new(store: std::sync::Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    /// Find a grant covering `path`: the path's own entry or the nearest
    /// ancestor's, walking upward and stopping before the filesystem root.
    pub fn find(&self, path: &Path) -> Option<(PathBuf, PersistedGrant)> {
        for ancestor in path.ancestors() {
            if ancestor.parent().is_none() {
                break;
            }
            if let Some(grant) = self.store.get(&Self::key_for(ancestor)) {
                return Some((ancestor.to_path_buf(), grant));
            }
        }
        None
    }

    /// Store `bookmark` under `path`, overwriting any prior entry
    pub fn insert(&self, path: &Path, bookmark: Vec<u8>) {
        debug!("Storing grant for {:?}", path);
        self.store
            .set(&Self::key_for(path), PersistedGrant::new(bookmark));
    }

    /// Forget the entry stored for exactly `path`, if any
    pub fn clear(&self, path: &Path) {
        self.store.remove(&Self::key_for(path));
    }

    fn key_for(path: &Path) -> String {
        format!("bd_{}", path.display())
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, PersistedGrant>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl BookmarkStore for MemoryStore {
    fn get(&self, key: &str) -> Option<PersistedGrant> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, grant: PersistedGrant) {
        self.entries.lock().insert(key.to_string(), grant);
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
