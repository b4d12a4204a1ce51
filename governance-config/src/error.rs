//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Source [`std::io::Error`].
        #[source]
        source: std::io::Error,
    },
    /// The configuration document was not valid JSON for the expected schema.
    #[error("malformed configuration: {source}")]
    Parse {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
    /// A value parsed but violates a documented constraint.
    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl ConfigError {
    /// Helper to construct validation errors.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
