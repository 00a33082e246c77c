use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub mod repositories;

pub use repositories::cache::{CacheNamespace, CacheRepository, Clock, SystemClock};

/// Process-local string key-value store.
///
/// Reads and writes are synchronous. Concurrent writers to the same key race
/// and the last completed write wins.
pub trait KeyValueStore: Send + Sync {
    /// Raw value for `key`, `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replaces the value for `key` unconditionally.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One document per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        info!("Cache store opened at {}", dir.display());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache file {}", path.display());
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write cache file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", path.display()))?;

        Ok(())
    }
}

/// Volatile store for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("cinelist-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn file_store_round_trip_and_overwrite() {
        let dir = temp_dir();
        let store = FileStore::open(&dir).unwrap();

        assert_eq!(store.get("movie_cache_v1"), None);
        store.set("movie_cache_v1", "first").unwrap();
        store.set("movie_cache_v1", "second").unwrap();
        assert_eq!(store.get("movie_cache_v1").as_deref(), Some("second"));
        assert_eq!(store.dir(), dir.as_path());
        assert!(store.dir().join("movie_cache_v1.json").is_file());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn file_store_keys_are_isolated() {
        let dir = temp_dir();
        let store = FileStore::open(&dir).unwrap();

        store.set("movie_cache_v1", "movies").unwrap();
        store.set("genre_cache_v1", "genres").unwrap();
        assert_eq!(store.get("movie_cache_v1").as_deref(), Some("movies"));
        assert_eq!(store.get("genre_cache_v1").as_deref(), Some("genres"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn file_store_sanitizes_key_into_file_name() {
        let store = FileStore {
            dir: PathBuf::from("/tmp/x"),
        };
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/tmp/x/___etc_passwd.json")
        );
    }

    #[test]
    fn memory_store_shares_state_between_clones() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").as_deref(), Some("v"));
        assert_eq!(other.len(), 1);
    }
}
