//! In-process key-value store.

use async_trait::async_trait;
use leafdoc_core::error::{LeafdocError, Result};
use leafdoc_core::storage::KeyValueStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Non-durable store for tests and ephemeral sessions.
///
/// Clones share the same map, which lets a test "restart" an engine against
/// the same contents. Writes can be made to fail with [`Self::set_fail_writes`].
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, `set` and `remove` return a persistence error and leave
    /// the contents untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(LeafdocError::persistence("Simulated write failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryKeyValueStore::new();
        let other = store.clone();

        store.set("k", "v".to_string()).await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemoryKeyValueStore::new();
        store.set("k", "v".to_string()).await.unwrap();

        store.set_fail_writes(true);
        assert!(store.set("k", "w".to_string()).await.unwrap_err().is_persistence());
        assert!(store.remove("k").await.unwrap_err().is_persistence());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
