//! Key/value cache for reference data that rarely changes.
//!
//! The instrument universe is fetched once and stored here; it stays valid
//! until someone deletes the entry by hand. There is no locking: runs that
//! share a cache directory must not overlap.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::error::CacheError;

/// Minimal cache interface.
pub trait CacheRepository {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

impl<C: CacheRepository + ?Sized> CacheRepository for Box<C> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).put(key, value)
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is allowed.
fn check_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CacheRepository for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }
}

/// In-process cache, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheRepository for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        check_key(key)?;
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        check_key(key)?;
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
