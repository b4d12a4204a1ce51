//! Core shared types for decision governance.

#![warn(missing_docs, clippy::pedantic)]

mod decision;
mod error;
mod ids;
mod severity;

/// Structured decision record supplied by the extraction collaborator.
pub use decision::{Assumption, Decision, DecisionBuilder, Goal, Kpi, Owner, Risk};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifier of a decision and of its Action node in the governance graph.
pub use ids::DecisionId;
/// Four-level severity scale used by risks, flags, and consequences.
pub use severity::Severity;
