//! Scan record construction.
//!
//! The builder is the terminal normalization point of a scan flow: whatever
//! the analyzer returned, it yields exactly one fully populated [`ScanRecord`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::scan::model::{
    ANALYSIS_ERROR_DIAGNOSIS, ContributingFactors, PlantAnalysis, ScanRecord, StatusColor,
};

const FALLBACK_CONFIDENCE: &str = "0%";
const FALLBACK_SEVERITY: u8 = 1;
const FALLBACK_DESCRIPTION: &str = "Failed to analyze the image. Please try again.";
const FALLBACK_TREATMENT: &str = "Ensure you have a stable internet connection and try again.";

const UNKNOWN_DIAGNOSIS: &str = "Unknown";
const MISSING_DESCRIPTION: &str = "No description available";
const MISSING_TREATMENT: &str = "Please try again";

/// Metadata captured when a scan begins, independent of the analysis result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetadata {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    pub image_reference: String,
}

impl CaptureMetadata {
    /// Stamps a new capture with the current time.
    ///
    /// Ids start with the capture time in milliseconds so they sort roughly by
    /// creation, with a random suffix for uniqueness within a session.
    pub fn now(image_reference: impl Into<String>) -> Self {
        let captured_at = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{}-{}", captured_at.timestamp_millis(), &suffix[..8]),
            captured_at,
            image_reference: image_reference.into(),
        }
    }
}

/// Merges an analyzer outcome with capture metadata.
pub struct ScanRecordBuilder {
    capture: CaptureMetadata,
}

impl ScanRecordBuilder {
    pub fn new(capture: CaptureMetadata) -> Self {
        Self { capture }
    }

    /// Builds the record for either outcome. Never fails.
    pub fn build(self, outcome: Result<PlantAnalysis, AnalysisError>) -> ScanRecord {
        match outcome {
            Ok(analysis) => self.success(analysis),
            Err(err) => self.fallback(&err),
        }
    }

    /// Copies the analysis verbatim. Blank strings are replaced so that no
    /// field of the record is ever empty.
    pub fn success(self, analysis: PlantAnalysis) -> ScanRecord {
        ScanRecord {
            id: self.capture.id,
            captured_at: self.capture.captured_at,
            image_reference: self.capture.image_reference,
            diagnosis: non_blank(analysis.disease, UNKNOWN_DIAGNOSIS),
            confidence_percent: non_blank(analysis.confidence, FALLBACK_CONFIDENCE),
            description: non_blank(analysis.description, MISSING_DESCRIPTION),
            treatment: non_blank(analysis.treatment, MISSING_TREATMENT),
            severity: analysis.severity,
            contributing_factors: analysis.factors,
            status_color: analysis.color,
        }
    }

    /// Fallback record for any analyzer failure kind.
    pub fn fallback(self, err: &AnalysisError) -> ScanRecord {
        ScanRecord {
            id: self.capture.id,
            captured_at: self.capture.captured_at,
            image_reference: self.capture.image_reference,
            diagnosis: ANALYSIS_ERROR_DIAGNOSIS.to_string(),
            confidence_percent: FALLBACK_CONFIDENCE.to_string(),
            description: non_blank(err.message().to_string(), FALLBACK_DESCRIPTION),
            treatment: FALLBACK_TREATMENT.to_string(),
            severity: FALLBACK_SEVERITY,
            contributing_factors: ContributingFactors::unknown(),
            status_color: StatusColor::Amber,
        }
    }
}

fn non_blank(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
