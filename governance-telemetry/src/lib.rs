//! Observability setup for the governance core.
//!
//! Library crates only emit `tracing` events; binaries call [`init_tracing`]
//! once at startup to install a formatted subscriber.

#![warn(missing_docs, clippy::pedantic)]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directives used when `RUST_LOG` is unset or ignored.
    pub default_filter: String,
    /// Whether `RUST_LOG` overrides `default_filter`.
    pub respect_env: bool,
    /// Print event targets.
    pub with_target: bool,
    /// Emit ANSI colour codes.
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_owned(),
            respect_env: true,
            with_target: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Replaces the default filter directives.
    #[must_use]
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Ignores `RUST_LOG`.
    #[must_use]
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }

    /// Builds the filter: `RUST_LOG` when allowed and valid, else `default_filter`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] when `default_filter` is
    /// blank or cannot be parsed.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if self.respect_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        let directives = self.default_filter.trim();
        if directives.is_empty() {
            return Err(TelemetryError::invalid_filter(directives, "no directives"));
        }
        EnvFilter::try_new(directives)
            .map_err(|err| TelemetryError::invalid_filter(directives, err.to_string()))
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Filter directives could not be parsed.
    #[error("invalid filter `{filter}`: {reason}")]
    InvalidFilter {
        /// Offending directives.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {reason}")]
    Install {
        /// Underlying error message.
        reason: String,
    },
}

impl TelemetryError {
    fn invalid_filter(filter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            filter: filter.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs the global `fmt` subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for bad directives and
/// [`TelemetryError::Install`] when a global subscriber already exists.
pub fn init_tracing(config: &TelemetryConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.with_target)
                .with_ansi(config.ansi),
        )
        .try_init()
        .map_err(|err| TelemetryError::Install {
            reason: err.to_string(),
        })?;
    debug!(filter = %config.default_filter, "tracing initialised");
    Ok(())
}
