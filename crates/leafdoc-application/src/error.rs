//! Errors a scan flow can end with.

use leafdoc_core::error::LeafdocError;
use leafdoc_core::scan::ScanRecord;
use thiserror::Error;

pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Why `start_scan` did not produce a durably committed record.
///
/// Analyzer failures never show up here: they become fallback records.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The flow was torn down before finalization. Nothing was appended.
    #[error("Scan was cancelled before it completed")]
    Cancelled,

    #[error("Another scan is already in progress")]
    FlowAlreadyActive,

    /// The record is in the in-memory history but the durable write failed.
    #[error("Scan {} was recorded but could not be persisted: {source}", .record.id)]
    PersistenceOutOfSync {
        record: Box<ScanRecord>,
        #[source]
        source: LeafdocError,
    },

    /// The flow task panicked, its progress ticker died before 100%, or the
    /// runtime aborted it. Nothing was appended.
    #[error("Scan task aborted: {0}")]
    Aborted(String),
}

impl ScanError {
    /// The record that was built, if the flow got that far.
    pub fn record(&self) -> Option<&ScanRecord> {
        match self {
            Self::PersistenceOutOfSync { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
