//! Configuration management for the governance core.
//!
//! Configuration is plain data: callers build it (or load it with
//! [`loader`]) once and hand immutable copies to the evaluator, repository,
//! and reasoner constructors.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{
    CompanyContext, DerivationConfig, FlagThresholds, GovernanceConfig, GraphSettings, Person,
    ReasoningSettings, RiskScoringConfig, RiskThresholds, SeverityWeights,
};
