//! Read-only history views.

use std::ops::Deref;
use std::sync::Arc;

use crate::history::query::{HistoryFilter, filter_records};
use crate::scan::ScanRecord;

/// An immutable, newest-first view of the scan history.
///
/// Cloning is cheap; every clone shares the same records. A snapshot never
/// changes after it is taken, even if the store appends or clears later.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    records: Arc<[ScanRecord]>,
}

impl HistorySnapshot {
    /// Wraps records that are already ordered newest-first.
    pub fn from_newest_first(records: Vec<ScanRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::from_newest_first(Vec::new())
    }

    /// A new snapshot with `record` at the head.
    pub fn prepend(&self, record: ScanRecord) -> Self {
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(record);
        records.extend(self.records.iter().cloned());
        Self::from_newest_first(records)
    }

    pub fn as_slice(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn to_vec(&self) -> Vec<ScanRecord> {
        self.records.to_vec()
    }

    /// Evaluates `filter`, preserving newest-first order.
    pub fn query(&self, filter: &HistoryFilter) -> Vec<ScanRecord> {
        filter_records(&self.records, filter)
            .into_iter()
            .cloned()
            .collect()
    }
}

impl Default for HistorySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for HistorySnapshot {
    type Target = [ScanRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl<'a> IntoIterator for &'a HistorySnapshot {
    type Item = &'a ScanRecord;
    type IntoIter = std::slice::Iter<'a, ScanRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
