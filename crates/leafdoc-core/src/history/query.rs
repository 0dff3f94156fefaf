//! History query layer: text search and category filtering.
//!
//! Pure and stateless. The same records and filter always produce the same
//! ordered subsequence.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::scan::ScanRecord;

/// Category chips shown above the history list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum HealthCategory {
    #[default]
    All,
    /// Diagnosis is exactly "Healthy Plant".
    Healthy,
    /// Everything that is not exactly "Healthy Plant", fallback records included.
    Diseased,
}

impl HealthCategory {
    pub fn matches(&self, record: &ScanRecord) -> bool {
        match self {
            Self::All => true,
            Self::Healthy => record.is_healthy(),
            Self::Diseased => !record.is_healthy(),
        }
    }
}

/// Search text plus category. A record is included iff it passes both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub category: HealthCategory,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_category(mut self, category: HealthCategory) -> Self {
        self.category = category;
        self
    }

    /// Case-insensitive substring match on diagnosis or description.
    /// Empty search text matches everything.
    pub fn matches_text(&self, record: &ScanRecord) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        record.diagnosis.to_lowercase().contains(&needle)
            || record.description.to_lowercase().contains(&needle)
    }

    pub fn matches(&self, record: &ScanRecord) -> bool {
        self.matches_text(record) && self.category.matches(record)
    }
}

/// Returns the records passing `filter`, in their original order.
pub fn filter_records<'a>(records: &'a [ScanRecord], filter: &HistoryFilter) -> Vec<&'a ScanRecord> {
    records.iter().filter(|record| filter.matches(record)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::scan::{
        CaptureMetadata, ContributingFactors, HEALTHY_DIAGNOSIS, PlantAnalysis, ScanRecordBuilder,
        StatusColor,
    };
    use std::str::FromStr;

    fn record(disease: &str, description: &str) -> ScanRecord {
        ScanRecordBuilder::new(CaptureMetadata::now("leaf.jpg")).build(Ok(PlantAnalysis {
            disease: disease.to_string(),
            confidence: "90%".to_string(),
            description: description.to_string(),
            treatment: "Prune affected leaves".to_string(),
            severity: 2,
            factors: ContributingFactors::new("High", "Low", "Medium"),
            color: StatusColor::for_diagnosis(disease),
        }))
    }

    fn sample_history() -> Vec<ScanRecord> {
        vec![
            record("Powdery Mildew", "White fungal growth on leaf surface"),
            record(HEALTHY_DIAGNOSIS, "No visible issues"),
            record("Mostly healthy", "Minor discoloration"),
            ScanRecordBuilder::new(CaptureMetadata::now("blurry.jpg"))
                .build(Err(AnalysisError::network("timed out", None))),
            record("Leaf Rust", "Orange pustules, likely fungal"),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all_in_order() {
        let history = sample_history();
        let result = filter_records(&history, &HistoryFilter::new());
        assert_eq!(result.len(), history.len());
        for (kept, original) in result.iter().zip(history.iter()) {
            assert_eq!(kept.id, original.id);
        }
    }

    #[test]
    fn test_text_matches_diagnosis_or_description() {
        let history = sample_history();

        let by_diagnosis = filter_records(&history, &HistoryFilter::new().with_search("MILDEW"));
        assert_eq!(by_diagnosis.len(), 1);
        assert_eq!(by_diagnosis[0].diagnosis, "Powdery Mildew");

        let by_description = filter_records(&history, &HistoryFilter::new().with_search("fungal"));
        let names: Vec<_> = by_description.iter().map(|r| r.diagnosis.as_str()).collect();
        assert_eq!(names, vec!["Powdery Mildew", "Leaf Rust"]);
    }

    #[test]
    fn test_healthy_uses_exact_equality() {
        let history = sample_history();
        let healthy = filter_records(
            &history,
            &HistoryFilter::new().with_category(HealthCategory::Healthy),
        );
        assert_eq!(healthy.len(), 1);
        assert_eq!(healthy[0].diagnosis, HEALTHY_DIAGNOSIS);
    }

    #[test]
    fn test_categories_partition_history() {
        let history = sample_history();
        let healthy = filter_records(
            &history,
            &HistoryFilter::new().with_category(HealthCategory::Healthy),
        );
        let diseased = filter_records(
            &history,
            &HistoryFilter::new().with_category(HealthCategory::Diseased),
        );

        assert_eq!(healthy.len() + diseased.len(), history.len());
        for record in &healthy {
            assert!(!diseased.iter().any(|d| d.id == record.id));
        }
        // "Mostly healthy" is green but not in the Healthy chip.
        assert!(diseased.iter().any(|r| r.diagnosis == "Mostly healthy"));
        assert!(diseased.iter().any(|r| r.is_analysis_error()));
    }

    #[test]
    fn test_text_and_category_combine_with_and() {
        let history = sample_history();
        let filter = HistoryFilter::new()
            .with_search("healthy")
            .with_category(HealthCategory::Diseased);
        let result = filter_records(&history, &filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].diagnosis, "Mostly healthy");
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(HealthCategory::from_str("Healthy").unwrap(), HealthCategory::Healthy);
        assert_eq!(HealthCategory::from_str("diseased").unwrap(), HealthCategory::Diseased);
        assert_eq!(HealthCategory::All.to_string(), "All");
        assert!(HealthCategory::from_str("Wilting").is_err());
    }
}
