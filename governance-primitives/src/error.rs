//! Shared error definitions for governance primitives.

use thiserror::Error;

/// Result alias used throughout the governance workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive governance types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The provided decision identifier failed validation.
    #[error("invalid decision id `{id}`: {reason}")]
    InvalidDecisionId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: &'static str,
    },

    /// A severity label could not be parsed.
    #[error("unknown severity `{value}`")]
    InvalidSeverity {
        /// The label that failed to parse.
        value: String,
    },
}
