//! Single-record weather cache on top of a small key-value store.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::model::{CacheEntry, WeatherRecord};

/// Fixed key of the persisted weather record.
pub const CACHE_KEY: &str = "weatherIslandCache";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent string store keyed by name.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(path: &Path, source: io::Error) -> CacheError {
    CacheError::Io { path: path.to_path_buf(), source }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|e| io_error(&path, e))
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_error(&path, e)),
            _ => Ok(()),
        }
    }
}

/// Process-local store, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// The one cached [`CacheEntry`], valid for `max_age` after it was written.
#[derive(Debug, Clone)]
pub struct WeatherCache {
    store: Arc<dyn KeyValueStore>,
    max_age: Duration,
}

impl WeatherCache {
    pub fn new(store: Arc<dyn KeyValueStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    /// Stored entry regardless of age. Unreadable entries count as absent.
    pub fn read(&self) -> Option<CacheEntry> {
        match self.try_read() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable weather cache: {e}");
                None
            }
        }
    }

    fn try_read(&self) -> Result<Option<CacheEntry>, CacheError> {
        let Some(raw) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Entry still younger than `max_age` at `now` (epoch millis). A stale
    /// entry stays stored; it is only skipped.
    pub fn fresh(&self, now: i64) -> Option<CacheEntry> {
        let entry = self.read()?;
        let age = now.saturating_sub(entry.last_updated);
        if age < self.max_age_millis() {
            Some(entry)
        } else {
            tracing::debug!(age_ms = age, "Weather cache is stale");
            None
        }
    }

    pub fn write(&self, record: &WeatherRecord, timestamp: i64) -> Result<(), CacheError> {
        let entry = CacheEntry { data: record.clone(), last_updated: timestamp };
        let json = serde_json::to_string(&entry)?;
        self.store.set(CACHE_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.store.remove(CACHE_KEY)
    }

    fn max_age_millis(&self) -> i64 {
        i64::try_from(self.max_age.as_millis()).unwrap_or(i64::MAX)
    }
}
