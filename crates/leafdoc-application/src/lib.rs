//! Application layer for leafdoc.
//!
//! Coordinates the analyzer, the progress driver and the history store into
//! the scan lifecycle exposed to presentation code.

pub mod bootstrap;
pub mod error;
pub mod history_store;
pub mod logging;
pub mod progress_driver;
pub mod scan_engine;

pub use bootstrap::bootstrap;
pub use error::{ScanError, ScanResult};
pub use history_store::HistoryStore;
pub use progress_driver::{ObserverHandle, ProgressDriver, ProgressRun};
pub use scan_engine::{ScanEngine, ScanFlow};
