//! Home screen summary of the scan history.

use serde::{Deserialize, Serialize};

use crate::history::HistorySnapshot;
use crate::scan::ScanRecord;

/// How many of the newest scans the summary carries.
pub const RECENT_SCAN_LIMIT: usize = 5;

/// Totals shown on the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_scans: usize,
    /// Rounded percentage of scans whose diagnosis mentions "healthy".
    /// `100` for an empty history.
    pub health_rate: u8,
    /// Newest first, at most [`RECENT_SCAN_LIMIT`] entries.
    pub recent: Vec<ScanRecord>,
}

impl HistoryStats {
    /// Summarizes records ordered newest-first.
    ///
    /// Counts a scan as healthy with the same case-insensitive substring rule
    /// as [`crate::scan::StatusColor::for_diagnosis`], not the exact match of
    /// [`crate::history::HealthCategory::Healthy`]. "Mostly healthy" raises
    /// the rate here while the category filter still lists it as diseased.
    pub fn from_records(records: &[ScanRecord]) -> Self {
        let total_scans = records.len();
        let healthy = records
            .iter()
            .filter(|record| mentions_healthy(&record.diagnosis))
            .count();

        Self {
            total_scans,
            health_rate: health_rate(healthy, total_scans),
            recent: records.iter().take(RECENT_SCAN_LIMIT).cloned().collect(),
        }
    }
}

impl HistorySnapshot {
    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_records(self.as_slice())
    }
}

fn mentions_healthy(diagnosis: &str) -> bool {
    diagnosis.to_lowercase().contains("healthy")
}

/// Half-up rounding of `healthy / total * 100`.
fn health_rate(healthy: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((healthy * 200 + total) / (total * 2)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::scan::{
        CaptureMetadata, ContributingFactors, HEALTHY_DIAGNOSIS, PlantAnalysis, ScanRecordBuilder,
        StatusColor,
    };

    fn record(disease: &str) -> ScanRecord {
        ScanRecordBuilder::new(CaptureMetadata::now("leaf.jpg")).build(Ok(PlantAnalysis {
            disease: disease.to_string(),
            confidence: "88%".to_string(),
            description: "Leaf inspected".to_string(),
            treatment: "None".to_string(),
            severity: 1,
            factors: ContributingFactors::new("Low", "High", "Good"),
            color: StatusColor::for_diagnosis(disease),
        }))
    }

    #[test]
    fn test_empty_history_reports_full_health() {
        let stats = HistorySnapshot::empty().stats();
        assert_eq!(stats.total_scans, 0);
        assert_eq!(stats.health_rate, 100);
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn test_health_rate_rounds_to_nearest() {
        let two_of_three = vec![
            record(HEALTHY_DIAGNOSIS),
            record("Leaf Rust"),
            record(HEALTHY_DIAGNOSIS),
        ];
        assert_eq!(HistoryStats::from_records(&two_of_three).health_rate, 67);

        let one_of_three = vec![record("Leaf Rust"), record(HEALTHY_DIAGNOSIS), record("Blight")];
        assert_eq!(HistoryStats::from_records(&one_of_three).health_rate, 33);

        let one_of_eight: Vec<_> = std::iter::once(record(HEALTHY_DIAGNOSIS))
            .chain((0..7).map(|_| record("Blight")))
            .collect();
        // 12.5 rounds up.
        assert_eq!(HistoryStats::from_records(&one_of_eight).health_rate, 13);
    }

    #[test]
    fn test_partial_healthy_diagnosis_counts_as_healthy() {
        let records = vec![
            record("Mostly healthy"),
            record("Powdery Mildew"),
            ScanRecordBuilder::new(CaptureMetadata::now("blurry.jpg"))
                .build(Err(AnalysisError::network("offline", None))),
            record("unhealthy looking"),
        ];
        let stats = HistoryStats::from_records(&records);
        assert_eq!(stats.total_scans, 4);
        assert_eq!(stats.health_rate, 50);
    }

    #[test]
    fn test_recent_keeps_newest_five() {
        let records: Vec<_> = (0..7).map(|i| record(&format!("Disease {i}"))).collect();
        let stats = HistorySnapshot::from_newest_first(records.clone()).stats();

        assert_eq!(stats.total_scans, 7);
        assert_eq!(stats.recent.len(), RECENT_SCAN_LIMIT);
        assert_eq!(stats.recent, records[..RECENT_SCAN_LIMIT].to_vec());
        assert_eq!(stats.recent[0].diagnosis, "Disease 0");
    }
}
