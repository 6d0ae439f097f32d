//! Key-value preference storage.
//!
//! Values are opaque strings; callers own their encoding. The file store keeps
//! every key in one JSON object and rewrites it on each `set`. The in-memory
//! map only changes once the new file is in place.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors from a preference store.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Reading or writing the backing file failed.
    #[error("Preference file error at {path}: {source}")]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Backing file is not a JSON object of strings.
    #[error("Preference file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Store lock was poisoned by a panicking writer.
    #[error("Preference store lock poisoned")]
    Poisoned,
}

/// String key-value store for user preferences.
pub trait PreferenceStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;

    /// Delete a value. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError` if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

/// In-process store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .write()
            .map_err(|_| PreferenceError::Poisoned)?
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.values
            .write()
            .map_err(|_| PreferenceError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

/// Store backed by a JSON file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PreferenceError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Opened preference file");

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        let io_err = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(io_err)?;

        // Write beside the target and rename over it.
        let text = serde_json::to_string_pretty(values)?;
        let mut file = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        file.write_all(text.as_bytes()).map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.write().map_err(|_| PreferenceError::Poisoned)?;
        let mut next = values.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.write().map_err(|_| PreferenceError::Poisoned)?;
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        (**self).remove(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = FilePreferenceStore::open(&path).unwrap();
        store.set("commerce.admin.orderFields.v2", "{}").unwrap();
        drop(store);

        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("commerce.admin.orderFields.v2").as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_shared_store_sees_writes() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let other = Arc::clone(&store);
        other.set("k", "v").unwrap();
        assert_eq!(PreferenceStore::get(&store, "k").as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("prefs");
        let path = parent.join("prefs.json");

        let store = FilePreferenceStore::open(&path).unwrap();
        store.set("kept", "1").unwrap();

        // A plain file where the directory was makes every write fail.
        fs::remove_dir_all(&parent).unwrap();
        fs::write(&parent, "not a directory").unwrap();

        assert!(matches!(store.set("k", "v"), Err(PreferenceError::Io { .. })));
        assert_eq!(store.get("k"), None);
        assert!(store.remove("kept").is_err());
        assert_eq!(store.get("kept").as_deref(), Some("1"));
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = FilePreferenceStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get("a"), None);
        assert_eq!(reopened.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            FilePreferenceStore::open(&path),
            Err(PreferenceError::Corrupt(_))
        ));
    }
}
