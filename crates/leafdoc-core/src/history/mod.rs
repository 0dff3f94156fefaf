//! Scan history snapshots, the query layer and the home screen summary.

pub mod query;
pub mod snapshot;
pub mod stats;

pub use query::{HealthCategory, HistoryFilter, filter_records};
pub use snapshot::HistorySnapshot;
pub use stats::{HistoryStats, RECENT_SCAN_LIMIT};
