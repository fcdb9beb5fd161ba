//! Error types for the Codewise application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for configuration and file-loading failures.
///
/// Stage-level failures (parse, upstream, unauthorized) are not modelled here;
/// they travel as [`crate::stage::StageFailure`] inside a
/// [`crate::stage::StageOutcome`] so callers must branch on them explicitly.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CodewiseError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CodewiseError {
    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CodewiseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for CodewiseError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CodewiseError>`.
pub type Result<T> = std::result::Result<T, CodewiseError>;
