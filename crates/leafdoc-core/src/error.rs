//! Error types for the Leafdoc scan engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds surfaced by an analyzer.
///
/// Every variant is distinct from a successful analysis, including one that
/// reports a "Healthy Plant". The scan record builder turns any of these into
/// a fallback record, so they never reach presentation as raw errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    /// The image reference was empty or missing. Raised before any I/O.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The referenced image could not be read or encoded.
    #[error("Image encoding failed: {message}")]
    Encoding { message: String },

    /// Transport failure, timeout, or a non-success HTTP status.
    #[error("Network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
    },

    /// The capability answered, but not with the expected JSON shape.
    #[error("Failed to parse analysis: {message}")]
    Parse { message: String },

    /// No credential or capability is configured.
    #[error("Analysis capability unavailable: {message}")]
    CapabilityUnavailable { message: String },
}

impl AnalysisError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Network {
            message: message.into(),
            status,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn capability_unavailable(message: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            message: message.into(),
        }
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { message }
            | Self::Encoding { message }
            | Self::Network { message, .. }
            | Self::Parse { message }
            | Self::CapabilityUnavailable { message } => message,
        }
    }

    /// Whether a caller-driven retry could plausibly succeed.
    ///
    /// Informational only: analyzers make a single attempt per invocation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { status: None, .. } => true,
            Self::Network {
                status: Some(code), ..
            } => *code == 429 || (500..=504).contains(code),
            _ => false,
        }
    }
}

/// A shared error type for the Leafdoc crates.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum LeafdocError {
    /// Durable write/read failed; in-memory state may already differ.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl LeafdocError {
    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for LeafdocError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for LeafdocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, LeafdocError>`.
pub type Result<T> = std::result::Result<T, LeafdocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_strips_kind_prefix() {
        let err = AnalysisError::network("connection reset", None);
        assert_eq!(err.message(), "connection reset");
        assert_eq!(err.to_string(), "Network error: connection reset");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AnalysisError::network("timeout", None).is_retryable());
        assert!(AnalysisError::network("busy", Some(503)).is_retryable());
        assert!(AnalysisError::network("slow down", Some(429)).is_retryable());
        assert!(!AnalysisError::network("bad request", Some(400)).is_retryable());
        assert!(!AnalysisError::parse("not json").is_retryable());
        assert!(!AnalysisError::capability_unavailable("no key").is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LeafdocError = io.into();
        assert!(matches!(err, LeafdocError::Io { .. }));
        assert!(err.to_string().contains("PermissionDenied"));
    }
}
