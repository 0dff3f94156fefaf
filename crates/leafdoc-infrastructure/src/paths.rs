//! Path management for leafdoc configuration and storage.
//!
//! ```text
//! ~/.config/leafdoc/          # Config directory
//! ├── config.toml             # Engine configuration
//! ├── secret.json             # API keys
//! └── store/                  # Key-value documents
//!     └── scan_history.json
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "leafdoc";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

/// Resolves every leafdoc path from one root.
///
/// With a base path (tests, portable installs) everything lives under it;
/// otherwise the platform config directory is used.
#[derive(Debug, Clone, Default)]
pub struct LeafdocPaths {
    base_path: Option<PathBuf>,
}

impl LeafdocPaths {
    pub fn new(base_path: Option<&Path>) -> Self {
        Self {
            base_path: base_path.map(Path::to_path_buf),
        }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_path {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Ensure this file has appropriate permissions (e.g., 600).
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    /// Directory backing the file key-value store.
    pub fn store_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("store"))
    }
}
