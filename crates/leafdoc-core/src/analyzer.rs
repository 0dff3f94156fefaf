//! Analyzer capability boundary.

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::scan::PlantAnalysis;

/// An opaque image-diagnosis capability.
///
/// Implementations validate the reference before any I/O, make a single
/// attempt per call, and return either a validated analysis or one of the
/// five [`AnalysisError`] kinds. Retry policy belongs to the caller.
#[async_trait]
pub trait PlantAnalyzer: Send + Sync {
    async fn analyze(&self, image_reference: &str) -> Result<PlantAnalysis, AnalysisError>;
}
