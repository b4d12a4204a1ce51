//! Decision governance core facade.
//!
//! Bundles the governance crates behind feature flags. A typical caller
//! builds a [`policy::GovernanceEvaluator`] from configuration, pairs it with
//! a [`graph::GraphRepository`], and runs decisions through
//! [`kernel::DecisionPipeline`].

#![warn(missing_docs, clippy::pedantic)]

/// Decision data model, identifiers, and severities.
pub use governance_primitives as primitives;

/// Configuration schema and loaders (enabled by `config` feature).
#[cfg(feature = "config")]
pub use governance_config as config;

/// Rules, risk scoring, flags, and approval chains (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use governance_policy as policy;

/// Governance graph ontology and repositories (enabled by `graph` feature).
#[cfg(feature = "graph")]
pub use governance_graph as graph;

/// Graph reasoning with deterministic fallback (enabled by `reasoning` feature).
#[cfg(feature = "reasoning")]
pub use governance_reasoning as reasoning;

/// Decision pack assembly (enabled by `pack` feature).
#[cfg(feature = "pack")]
pub use governance_pack as pack;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use governance_telemetry as telemetry;

/// End-to-end pipeline and batch scheduler (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use governance_kernel as kernel;
