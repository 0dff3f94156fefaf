pub mod analyzer;
pub mod config;
pub mod error;
pub mod history;
pub mod progress;
pub mod scan;
pub mod storage;

// Re-export common error types
pub use error::{AnalysisError, LeafdocError};
