//! Durable, newest-first scan history.

use leafdoc_core::error::{LeafdocError, Result};
use leafdoc_core::history::{HistoryFilter, HistorySnapshot, HistoryStats};
use leafdoc_core::scan::ScanRecord;
use leafdoc_core::storage::{HISTORY_KEY, KeyValueStore};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// The engine's only long-lived mutable state.
///
/// Reads hand out immutable [`HistorySnapshot`]s. Mutations are serialized,
/// update memory first, then persist the whole collection under
/// [`HISTORY_KEY`] before returning. A failed write is reported to the
/// caller even though the in-memory history has already changed.
pub struct HistoryStore {
    records: RwLock<HistorySnapshot>,
    write_lock: Mutex<()>,
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    /// Creates an empty history without reading persisted state.
    pub fn empty(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            records: RwLock::new(HistorySnapshot::empty()),
            write_lock: Mutex::new(()),
            store,
        }
    }

    /// Loads persisted history. Missing or corrupt data yields an empty
    /// history; the problem is logged, never returned.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let snapshot = match store.get(HISTORY_KEY).await {
            Ok(Some(content)) => decode(&content).unwrap_or_else(|e| {
                tracing::warn!("[History] Discarding corrupt scan history: {}", e);
                HistorySnapshot::empty()
            }),
            Ok(None) => HistorySnapshot::empty(),
            Err(e) => {
                tracing::warn!("[History] Failed to read scan history, starting empty: {}", e);
                HistorySnapshot::empty()
            }
        };

        tracing::info!("[History] Loaded {} scan record(s)", snapshot.len());
        Self {
            records: RwLock::new(snapshot),
            write_lock: Mutex::new(()),
            store,
        }
    }

    /// The current history, newest first.
    pub fn snapshot(&self) -> HistorySnapshot {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Filters the current snapshot. Never touches the store.
    pub fn query(&self, filter: &HistoryFilter) -> Vec<ScanRecord> {
        self.snapshot().query(filter)
    }

    /// Home screen summary of the current snapshot.
    pub fn stats(&self) -> HistoryStats {
        self.snapshot().stats()
    }

    /// Inserts `record` at the head and persists the full collection.
    pub async fn append(&self, record: ScanRecord) -> Result<()> {
        let _write = self.write_lock.lock().await;

        let record_id = record.id.clone();
        let updated = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            *records = records.prepend(record);
            records.clone()
        };

        let content = serde_json::to_string(updated.as_slice())?;
        self.store
            .set(HISTORY_KEY, content)
            .await
            .map_err(|e| {
                tracing::error!("[History] Failed to persist scan {}: {}", record_id, e);
                LeafdocError::persistence(format!("Failed to persist scan history: {e}"))
            })?;

        tracing::debug!(
            "[History] Appended scan {} ({} total)",
            record_id,
            updated.len()
        );
        Ok(())
    }

    /// Empties the history and removes the persisted copy. Irreversible.
    pub async fn clear(&self) -> Result<()> {
        let _write = self.write_lock.lock().await;

        {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            *records = HistorySnapshot::empty();
        }

        self.store.remove(HISTORY_KEY).await.map_err(|e| {
            tracing::error!("[History] Failed to remove persisted history: {}", e);
            LeafdocError::persistence(format!("Failed to clear scan history: {e}"))
        })?;

        tracing::info!("[History] Cleared scan history");
        Ok(())
    }
}

/// Parses persisted history. The stored array is already in insertion
/// order, newest first; timestamps are never used to reorder it.
fn decode(content: &str) -> Result<HistorySnapshot> {
    let records: Vec<ScanRecord> = serde_json::from_str(content)?;
    Ok(HistorySnapshot::from_newest_first(records))
}
