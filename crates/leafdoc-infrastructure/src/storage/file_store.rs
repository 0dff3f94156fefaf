//! File-backed key-value store: one JSON document per key.

use async_trait::async_trait;
use leafdoc_core::error::{LeafdocError, Result};
use leafdoc_core::storage::KeyValueStore;
use std::path::{Path, PathBuf};

use crate::storage::atomic_file::AtomicFile;

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go through [`AtomicFile`] on the blocking pool, so an awaited
/// `set` or `remove` has reached disk when it returns `Ok`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<AtomicFile> {
        validate_key(key)?;
        Ok(AtomicFile::new(self.dir.join(format!("{key}.json"))))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(LeafdocError::persistence(format!("Invalid storage key '{key}'")))
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| LeafdocError::persistence(format!("Failed to join storage task: {}", e)))?
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file = self.file_for(key)?;
        run_blocking(move || {
            file.load().map_err(|e| {
                LeafdocError::persistence(format!("Failed to read {}: {}", file.path().display(), e))
            })
        })
        .await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let file = self.file_for(key)?;
        run_blocking(move || {
            file.save(&value).map_err(|e| {
                LeafdocError::persistence(format!("Failed to write {}: {}", file.path().display(), e))
            })
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let file = self.file_for(key)?;
        run_blocking(move || {
            file.remove().map_err(|e| {
                LeafdocError::persistence(format!("Failed to remove {}: {}", file.path().display(), e))
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        assert!(store.get("scan_history").await.unwrap().is_none());

        store.set("scan_history", "[]".to_string()).await.unwrap();
        assert_eq!(store.get("scan_history").await.unwrap().as_deref(), Some("[]"));
        assert!(temp_dir.path().join("scan_history.json").exists());

        store.remove("scan_history").await.unwrap();
        assert!(store.get("scan_history").await.unwrap().is_none());
        store.remove("scan_history").await.unwrap();
    }

    #[tokio::test]
    async fn test_values_survive_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        FileKeyValueStore::new(temp_dir.path())
            .set("scan_history", "[{}]".to_string())
            .await
            .unwrap();

        let reopened = FileKeyValueStore::new(temp_dir.path());
        assert_eq!(reopened.get("scan_history").await.unwrap().as_deref(), Some("[{}]"));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = store.set(key, "x".to_string()).await.unwrap_err();
            assert!(err.is_persistence(), "key {key:?} should be rejected");
        }
    }
}
