//! Scan domain models.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Diagnosis label the analyzer uses for a leaf with no disease.
pub const HEALTHY_DIAGNOSIS: &str = "Healthy Plant";

/// Diagnosis label of a fallback record.
pub const ANALYSIS_ERROR_DIAGNOSIS: &str = "Analysis Error";

/// Rating used for every contributing factor when analysis failed.
pub const UNKNOWN_FACTOR: &str = "Unknown";

/// Highest severity an analysis can report.
pub const MAX_SEVERITY: u8 = 5;

/// Display hint derived from a diagnosis. Never set by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Red,
    Amber,
}

impl StatusColor {
    /// Color for a successful analysis.
    ///
    /// Uses a case-insensitive substring match on "healthy". The history
    /// category filter uses exact equality against [`HEALTHY_DIAGNOSIS`]
    /// instead, so "Mostly healthy" is green here but still `Diseased` there.
    pub fn for_diagnosis(diagnosis: &str) -> Self {
        if diagnosis.to_lowercase().contains("healthy") {
            Self::Green
        } else {
            Self::Red
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            Self::Green => "#4CAF50",
            Self::Red => "#FF5252",
            Self::Amber => "#FF9800",
        }
    }
}

/// Environmental ratings the analyzer reports alongside a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingFactors {
    pub humidity: String,
    pub sunlight: String,
    pub airflow: String,
}

impl ContributingFactors {
    pub fn new(
        humidity: impl Into<String>,
        sunlight: impl Into<String>,
        airflow: impl Into<String>,
    ) -> Self {
        Self {
            humidity: humidity.into(),
            sunlight: sunlight.into(),
            airflow: airflow.into(),
        }
    }

    /// All three factors rated [`UNKNOWN_FACTOR`].
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FACTOR, UNKNOWN_FACTOR, UNKNOWN_FACTOR)
    }
}

impl Default for ContributingFactors {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Validated output of a successful analyzer call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantAnalysis {
    pub disease: String,
    /// Already formatted as a percentage string, e.g. `"92%"`.
    pub confidence: String,
    pub description: String,
    pub treatment: String,
    /// 0 (healthy) to [`MAX_SEVERITY`].
    pub severity: u8,
    pub factors: ContributingFactors,
    pub color: StatusColor,
}

/// The canonical, immutable diagnosis outcome for one captured image.
///
/// Records are never edited once built; a correction is a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: String,
    /// Sortable creation timestamp. Use [`ScanRecord::display_date`] for UI text.
    pub captured_at: DateTime<Utc>,
    /// Opaque locator of the source image (path or URI).
    pub image_reference: String,
    pub diagnosis: String,
    pub confidence_percent: String,
    pub description: String,
    pub treatment: String,
    pub severity: u8,
    pub contributing_factors: ContributingFactors,
    pub status_color: StatusColor,
}

impl ScanRecord {
    /// Capture date in the local timezone, formatted like `3/14/2025`.
    pub fn display_date(&self) -> String {
        self.captured_at
            .with_timezone(&Local)
            .format("%-m/%-d/%Y")
            .to_string()
    }

    /// Exact-match healthy check used by the history category filter.
    pub fn is_healthy(&self) -> bool {
        self.diagnosis == HEALTHY_DIAGNOSIS
    }

    /// Whether this is a fallback record produced by a failed analysis.
    pub fn is_analysis_error(&self) -> bool {
        self.status_color == StatusColor::Amber && self.diagnosis == ANALYSIS_ERROR_DIAGNOSIS
    }
}
