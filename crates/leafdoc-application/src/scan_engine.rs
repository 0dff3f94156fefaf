//! Scan engine: the presentation boundary of the scan lifecycle.
//!
//! A scan flow runs two independent tasks, the progress driver and the
//! analyzer call, and commits exactly one record once both have settled.
//! Whichever finishes later gates the commit.
//!
//! The engine's single flow slot is released as soon as a flow is cancelled
//! or its handle dropped, so a new scan can begin while the abandoned task
//! is still winding down.

use leafdoc_core::analyzer::PlantAnalyzer;
use leafdoc_core::config::ProgressSettings;
use leafdoc_core::error::Result;
use leafdoc_core::history::{HistoryFilter, HistorySnapshot, HistoryStats};
use leafdoc_core::progress::{ProgressObserver, ProgressUpdate};
use leafdoc_core::scan::{CaptureMetadata, ScanRecord, ScanRecordBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{ScanError, ScanResult};
use crate::history_store::HistoryStore;
use crate::progress_driver::{ObserverHandle, ProgressDriver};

/// Owns the history store and runs at most one scan flow at a time.
///
/// Cloning is cheap; clones share the same history and progress channel.
#[derive(Clone)]
pub struct ScanEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    analyzer: Arc<dyn PlantAnalyzer>,
    history: Arc<HistoryStore>,
    driver: ProgressDriver,
    /// Id of the flow holding the slot, `0` when idle.
    active_flow: AtomicU64,
    next_flow: AtomicU64,
}

impl ScanEngine {
    pub fn new(
        analyzer: Arc<dyn PlantAnalyzer>,
        history: Arc<HistoryStore>,
        progress: ProgressSettings,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                analyzer,
                history,
                driver: ProgressDriver::new(progress),
                active_flow: AtomicU64::new(0),
                next_flow: AtomicU64::new(0),
            }),
        }
    }

    /// Live progress of the current (or last) flow.
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressUpdate> {
        self.inner.driver.subscribe()
    }

    /// Registers a `(percent, stage_index)` callback for every progress tick.
    ///
    /// The callback is unregistered when the returned handle is dropped.
    #[must_use = "dropping the handle unregisters the observer"]
    pub fn add_progress_observer(&self, observer: Arc<dyn ProgressObserver>) -> ObserverHandle {
        self.inner.driver.add_observer(observer)
    }

    /// Starts a scan flow in the background.
    ///
    /// Dropping the returned [`ScanFlow`] without joining it cancels the
    /// flow; nothing is appended in that case.
    pub fn begin_scan(&self, image_reference: impl Into<String>) -> ScanResult<ScanFlow> {
        let flow_id = self.inner.next_flow.fetch_add(1, Ordering::AcqRel) + 1;
        if self
            .inner
            .active_flow
            .compare_exchange(0, flow_id, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("[Scan] Rejected scan: another flow is active");
            return Err(ScanError::FlowAlreadyActive);
        }

        let cancel = CancellationToken::new();
        let flow_cancel = cancel.clone();
        let task_slot = FlowSlot {
            inner: self.inner.clone(),
            flow_id,
        };
        let image_reference = image_reference.into();

        let task = tokio::spawn(async move {
            let result = task_slot.inner.run_flow(image_reference, flow_cancel).await;
            drop(task_slot);
            result
        });

        Ok(ScanFlow {
            cancel: cancel.clone(),
            guard: cancel.drop_guard(),
            slot: FlowSlot {
                inner: self.inner.clone(),
                flow_id,
            },
            task,
        })
    }

    /// Runs a full scan and returns the committed record.
    pub async fn start_scan(&self, image_reference: impl Into<String>) -> ScanResult<ScanRecord> {
        self.begin_scan(image_reference)?.join().await
    }

    pub fn is_scan_active(&self) -> bool {
        self.inner.active_flow.load(Ordering::Acquire) != 0
    }

    /// Read-only history, newest first.
    pub fn get_history(&self) -> HistorySnapshot {
        self.inner.history.snapshot()
    }

    /// Totals, health rate and the most recent scans for the home screen.
    pub fn history_stats(&self) -> HistoryStats {
        self.inner.history.stats()
    }

    pub fn query_history(&self, filter: &HistoryFilter) -> Vec<ScanRecord> {
        self.inner.history.query(filter)
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.inner.history.clear().await
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.inner.history
    }
}

impl EngineInner {
    async fn run_flow(&self, image_reference: String, cancel: CancellationToken) -> ScanResult<ScanRecord> {
        let capture = CaptureMetadata::now(image_reference);
        let scan_id = capture.id.clone();
        tracing::info!(
            "[Scan] Starting scan {} for {}",
            scan_id,
            capture.image_reference
        );

        // A flow abandoned before its task first ran must not claim the
        // progress channel from the flow that replaced it.
        if cancel.is_cancelled() {
            tracing::info!("[Scan] Scan {} cancelled before it started", scan_id);
            return Err(ScanError::Cancelled);
        }
        let progress = self.driver.start(cancel.child_token());
        let reference = capture.image_reference.clone();
        let analysis = self.analyzer.analyze(&reference);

        let settled = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            joined = async { tokio::join!(progress.wait(), analysis) } => Some(joined),
        };

        let outcome = match settled {
            _ if cancel.is_cancelled() => {
                tracing::info!("[Scan] Scan {} cancelled, discarding result", scan_id);
                return Err(ScanError::Cancelled);
            }
            Some((true, outcome)) => outcome,
            _ => {
                tracing::error!("[Scan] Progress for scan {} stopped before 100%", scan_id);
                return Err(ScanError::Aborted(
                    "progress ticker stopped before completion".to_string(),
                ));
            }
        };

        if let Err(err) = &outcome {
            tracing::warn!("[Scan] Analysis failed for {}: {}", scan_id, err);
        }
        let record = ScanRecordBuilder::new(capture).build(outcome);

        match self.history.append(record.clone()).await {
            Ok(()) => {
                tracing::info!(
                    "[Scan] Committed scan {}: {} ({})",
                    scan_id,
                    record.diagnosis,
                    record.confidence_percent
                );
                Ok(record)
            }
            Err(source) => Err(ScanError::PersistenceOutOfSync {
                record: Box::new(record),
                source,
            }),
        }
    }

    /// Frees the slot if `flow_id` still holds it.
    fn release(&self, flow_id: u64) -> bool {
        self.active_flow
            .compare_exchange(flow_id, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Claim on the engine's flow slot. Dropping it releases the slot unless a
/// newer flow has already taken it.
struct FlowSlot {
    inner: Arc<EngineInner>,
    flow_id: u64,
}

impl FlowSlot {
    fn release(&self) {
        if self.inner.release(self.flow_id) {
            tracing::debug!("[Scan] Released flow slot {}", self.flow_id);
        }
    }
}

impl Drop for FlowSlot {
    fn drop(&mut self) {
        self.release();
    }
}

/// Handle to a running scan flow.
pub struct ScanFlow {
    cancel: CancellationToken,
    guard: DropGuard,
    slot: FlowSlot,
    task: JoinHandle<ScanResult<ScanRecord>>,
}

impl ScanFlow {
    /// Abandons the flow. The progress driver stops and any analyzer result
    /// arriving later is discarded. The engine accepts a new scan right away.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.slot.release();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the flow to commit its record.
    ///
    /// Dropping this future before it resolves cancels the flow.
    pub async fn join(self) -> ScanResult<ScanRecord> {
        let Self { guard, slot, task, .. } = self;
        let joined = task.await;
        let _ = guard.disarm();
        drop(slot);
        joined.map_err(|e| ScanError::Aborted(e.to_string()))?
    }
}
