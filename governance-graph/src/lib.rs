//! Governance graph: ontology, decision-to-graph mapping, and repositories.
//!
//! A decision and its [`governance_policy::GovernanceResult`] map to a
//! [`DecisionGraph`] of Actor, Action, Policy, Risk, and Resource nodes.
//! [`GraphRepository`] stores those graphs with replace-on-upsert semantics
//! and serves bounded-depth [`GovernanceContext`] reads.

#![warn(missing_docs, clippy::pedantic)]

pub mod context;
mod error;
pub mod ontology;
pub mod repository;

#[cfg(test)]
mod test_support;

pub use context::GovernanceContext;
pub use error::{GraphError, GraphResult};
pub use ontology::{
    DecisionGraph, Edge, EdgeKey, EdgePredicate, GraphOntology, GraphSummary, Node, NodeType,
};
pub use repository::{GraphRepository, GraphSnapshot, InMemoryGraphRepository};
