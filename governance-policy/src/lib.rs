//! Deterministic governance evaluation for structured decisions.
//!
//! [`GovernanceEvaluator`] runs the whole pass: derived attributes, risk
//! scoring, flag detection, rule evaluation, and approval-chain construction.
//! The individual stages are public so they can be tested and reused alone.

#![warn(missing_docs, clippy::pedantic)]

pub mod approval;
pub mod condition;
pub mod contracts;
pub mod decision;
pub mod derived;
pub mod engine;
mod error;
pub mod evaluator;
pub mod flags;
pub mod risk;

pub use approval::{ApprovalChainBuilder, ApprovalStep, ApproverIdentity};
pub use condition::{Condition, ConditionEvaluator, EvaluationRecord, FieldPath, Operator};
pub use contracts::{
    ApproverRef, Consequence, ConsequenceAction, RejectedRule, Rule, RuleCategory,
    RuleDefinition, RuleSet,
};
pub use decision::{CompletenessIssue, GovernanceResult, GovernanceStatus};
pub use derived::DerivedAttributes;
pub use engine::{RuleEngine, TriggeredRule};
pub use error::{PolicyError, PolicyResult};
pub use evaluator::{GovernanceEvaluator, headline_severity};
pub use flags::{FlagDetector, GovernanceFlag};
pub use risk::{RiskAssessment, RiskScorer};
