//! Engine configuration model.
//!
//! `config.toml` holds [`EngineConfig`]; the API key lives separately in
//! `secret.json` as [`SecretConfig`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LeafdocError, Result};

/// Environment variable that overrides the Gemini API key from secret.json.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub analyzer: AnalyzerSettings,
    pub progress: ProgressSettings,
}

impl EngineConfig {
    /// Parses a `config.toml` document. Missing sections take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LeafdocError::config(format!("Invalid config.toml: {e}")))
    }
}

/// Settings for the external analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub model: String,
    pub base_url: String,
    /// Whole-request timeout. The analyzer never retries on expiry.
    pub timeout_secs: u64,
    /// Declared when the image reference has no recognisable image extension.
    pub mime_type: String,
}

impl AnalyzerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: 30,
            mime_type: DEFAULT_IMAGE_MIME_TYPE.to_string(),
        }
    }
}

/// Pacing of the progress driver. One run is always 100 ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    pub tick_interval_ms: u64,
}

impl ProgressSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Nominal time from 0% to 100%.
    pub fn nominal_duration(&self) -> Duration {
        self.tick_interval() * 100
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 40,
        }
    }
}

/// Contents of secret.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
}

impl SecretConfig {
    /// The configured Gemini key, if present and not blank.
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .as_ref()
            .map(|gemini| gemini.api_key.trim())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.analyzer.model, "gemini-1.5-flash");
        assert_eq!(config.analyzer.timeout(), Duration::from_secs(30));
        assert_eq!(config.progress.tick_interval(), Duration::from_millis(40));
        assert_eq!(config.progress.nominal_duration(), Duration::from_secs(4));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [analyzer]
            timeout_secs = 10

            [progress]
            tick_interval_ms = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.analyzer.timeout_secs, 10);
        assert_eq!(config.analyzer.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.progress.tick_interval_ms, 5);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("[analyzer\ntimeout_secs = ").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let secret = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "   ".to_string(),
            }),
        };
        assert!(secret.gemini_api_key().is_none());
        assert!(SecretConfig::default().gemini_api_key().is_none());
    }
}
