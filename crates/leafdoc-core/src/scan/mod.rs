//! Scan records and their construction.

pub mod builder;
pub mod model;

pub use builder::{CaptureMetadata, ScanRecordBuilder};
pub use model::{
    ANALYSIS_ERROR_DIAGNOSIS, ContributingFactors, HEALTHY_DIAGNOSIS, MAX_SEVERITY,
    PlantAnalysis, ScanRecord, StatusColor, UNKNOWN_FACTOR,
};
