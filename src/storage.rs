//! Session-scoped key/value storage with an always-warm in-memory fallback.
//!
//! A [`SessionStore`] is best effort: it may refuse writes from the start
//! (the probe fails and the adapter never touches it again) or start failing
//! mid-session (writes are swallowed). Every `put` lands in the in-memory map
//! regardless, so data stays available for the life of the process.

use crate::cache::CacheEntry;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const PROBE_KEY: &str = "__storage_test__";

/// A string key/value store scoped to one session.
pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Session store backed by a directory, one JSON file per key.
///
/// File names are the hex encoding of the key so arbitrary keys
/// (`S&P 500-1mo`) round-trip through [`SessionStore::keys`].
#[derive(Debug, Clone)]
pub struct DirSessionStore {
    dir: PathBuf,
}

impl DirSessionStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }
}

impl SessionStore for DirSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read session item {key}")),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)
            .with_context(|| format!("Failed to write session item {key}"))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove session item {key}")),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Foreign files in the directory are skipped, not an error.
            if let Some(key) = hex::decode(stem)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Returns true when `store` accepts a write and a remove.
pub fn probe(store: &dyn SessionStore) -> bool {
    store
        .set_item(PROBE_KEY, PROBE_KEY)
        .and_then(|_| store.remove_item(PROBE_KEY))
        .is_ok()
}

/// Storage front for the cache layer.
///
/// Whether the session store is usable is decided once, in [`StorageAdapter::new`].
pub struct StorageAdapter {
    store: Option<Box<dyn SessionStore>>,
    memory: Mutex<HashMap<String, CacheEntry>>,
}

impl StorageAdapter {
    pub fn new(store: Option<Box<dyn SessionStore>>) -> Self {
        let store = match store {
            Some(store) if probe(store.as_ref()) => Some(store),
            Some(_) => {
                info!("session store blocked, using in-memory cache");
                None
            }
            None => None,
        };

        Self {
            store,
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Whether the probe at construction accepted the session store.
    pub fn session_store_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let Some(store) = &self.store else {
            return self.memory().get(key).cloned();
        };

        let raw = match store.get_item(key) {
            Ok(Some(raw)) => raw,
            // A store that rejected the write still has the memory copy.
            Ok(None) => return self.memory().get(key).cloned(),
            Err(e) => {
                debug!("session store read failed for {key}: {e:#}");
                return self.memory().get(key).cloned();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("undecodable session entry {key}: {e}");
                self.memory().get(key).cloned()
            }
        }
    }

    pub fn put(&self, key: &str, entry: CacheEntry) {
        let encoded = self
            .store
            .as_ref()
            .map(|_| serde_json::to_string(&entry));

        self.memory().insert(key.to_string(), entry);

        let (Some(store), Some(encoded)) = (&self.store, encoded) else {
            return;
        };
        let written = encoded
            .map_err(anyhow::Error::from)
            .and_then(|json| store.set_item(key, &json));
        if let Err(e) = written {
            debug!("session store write failed for {key}, memory copy kept: {e:#}");
        }
    }

    pub(crate) fn session_store(&self) -> Option<&dyn SessionStore> {
        self.store.as_deref()
    }

    pub(crate) fn memory_entries(&self) -> Vec<(String, CacheEntry)> {
        let mut entries: Vec<_> = self
            .memory()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub(crate) fn memory_len(&self) -> usize {
        self.memory().len()
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
