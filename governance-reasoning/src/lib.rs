//! Graph reasoning over governance contexts.
//!
//! [`GraphReasoner`] runs fixed structural checks (orphaned nodes, missing
//! ownership, risk-coverage gaps, owner authority, policy conflicts) and can
//! hand a [`SubgraphSummary`] to an external [`ReasoningClient`] first. The
//! external path is bounded by a timeout and any failure silently falls back
//! to the deterministic result.

#![warn(missing_docs, clippy::pedantic)]

pub mod client;
mod error;
pub mod findings;
pub mod reasoner;
pub mod summary;

pub use client::ReasoningClient;
pub use error::{ClientResult, ReasoningError};
pub use findings::{AnalysisMethod, Finding, FindingCategory, ReasoningResult, Recommendation};
pub use reasoner::{GraphReasoner, ReasoningMode};
pub use summary::{
    ActorKind, ActorSummary, DecisionSummary, PolicySummary, RelationshipSummary, RiskSummary,
    SubgraphSummary,
};
