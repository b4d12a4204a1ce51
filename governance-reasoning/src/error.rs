//! Errors reported by reasoning collaborators.

use std::time::Duration;

use thiserror::Error;

/// Failure of the external reasoning path. Never surfaced by
/// [`crate::GraphReasoner`], which falls back to deterministic analysis.
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// Collaborator could not be reached or refused the request.
    #[error("reasoning collaborator unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason.
        reason: String,
    },
    /// Collaborator did not answer within the budget.
    #[error("reasoning collaborator timed out after {elapsed:?}")]
    Timeout {
        /// Budget that elapsed.
        elapsed: Duration,
    },
    /// Collaborator answered with something unusable.
    #[error("reasoning collaborator returned an invalid response: {reason}")]
    InvalidResponse {
        /// Human-readable reason.
        reason: String,
    },
    /// External reasoning was requested but no collaborator is configured.
    #[error("no reasoning collaborator configured")]
    NotConfigured,
}

impl ReasoningError {
    /// Helper to construct availability errors from string-like values.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Helper to construct invalid-response errors from string-like values.
    #[must_use]
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// Result alias for collaborator calls.
pub type ClientResult<T> = Result<T, ReasoningError>;
