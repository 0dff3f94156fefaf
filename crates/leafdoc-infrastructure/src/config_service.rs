//! Loads `config.toml` and `secret.json`.

use leafdoc_core::config::{EngineConfig, GEMINI_API_KEY_ENV, SecretConfig};
use leafdoc_core::error::{LeafdocError, Result};
use std::path::Path;

use crate::paths::LeafdocPaths;

/// Reads engine configuration and credentials from the leafdoc config directory.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    paths: LeafdocPaths,
}

impl ConfigService {
    pub fn new(paths: LeafdocPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &LeafdocPaths {
        &self.paths
    }

    /// Loads config.toml. A missing file yields defaults; a malformed one is
    /// a `Config` error.
    pub async fn load_engine_config(&self) -> Result<EngineConfig> {
        let path = self
            .paths
            .config_file()
            .map_err(|e| LeafdocError::config(e.to_string()))?;

        match read_optional(&path).await? {
            Some(content) => {
                tracing::debug!("[Config] Loaded {}", path.display());
                EngineConfig::from_toml_str(&content)
            }
            None => {
                tracing::debug!("[Config] {} not found, using defaults", path.display());
                Ok(EngineConfig::default())
            }
        }
    }

    /// Loads secret.json. Missing file yields an empty config.
    pub async fn load_secrets(&self) -> Result<SecretConfig> {
        let path = self
            .paths
            .secret_file()
            .map_err(|e| LeafdocError::config(e.to_string()))?;

        match read_optional(&path).await? {
            Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
                .map_err(|e| LeafdocError::config(format!("Invalid secret.json: {e}"))),
            _ => Ok(SecretConfig::default()),
        }
    }

    /// The Gemini key from `GEMINI_API_KEY`, falling back to secret.json.
    ///
    /// Never fails: an unreadable secret file is logged and treated as "no
    /// key", which the analyzer reports as an unavailable capability.
    pub async fn resolve_api_key(&self) -> Option<String> {
        let secrets = match self.load_secrets().await {
            Ok(secrets) => secrets,
            Err(e) => {
                tracing::warn!("[Config] Ignoring secret.json: {}", e);
                SecretConfig::default()
            }
        };
        pick_api_key(std::env::var(GEMINI_API_KEY_ENV).ok(), &secrets)
    }
}

fn pick_api_key(env_value: Option<String>, secrets: &SecretConfig) -> Option<String> {
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| secrets.gemini_api_key().map(str::to_string))
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
