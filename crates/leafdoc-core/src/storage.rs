//! Key-value persistence boundary.

use async_trait::async_trait;

use crate::error::Result;

/// Fixed key holding the serialized scan history.
pub const HISTORY_KEY: &str = "scan_history";

/// Key owned by the theming collaborator. The engine never reads or writes it.
pub const THEME_KEY: &str = "isDarkMode";

/// A durable store addressed by fixed string keys.
///
/// `set` and `remove` must not return until the write is durable or has failed.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes the key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
