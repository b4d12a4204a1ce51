use thiserror::Error;

/// Errors raised while loading governance rules.
///
/// Evaluation itself never fails; these only surface from rule-set construction.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Rule has no identifier.
    #[error("rule at index {index} has no rule_id")]
    MissingRuleId {
        /// Position in the source document.
        index: usize,
    },
    /// Another rule already uses the identifier.
    #[error("duplicate rule id `{rule_id}`")]
    DuplicateRule {
        /// Offending identifier.
        rule_id: String,
    },
    /// Condition does not match any supported shape or operator.
    #[error("rule `{rule_id}` has an invalid condition: {source}")]
    InvalidCondition {
        /// Offending rule.
        rule_id: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// Consequence action is not one of the supported kinds.
    #[error("rule `{rule_id}` has unsupported consequence action `{action}`")]
    UnsupportedAction {
        /// Offending rule.
        rule_id: String,
        /// Action as written.
        action: String,
    },
    /// Approval or review consequence names nobody.
    #[error("rule `{rule_id}` requires approval but names no approver")]
    MissingApprover {
        /// Offending rule.
        rule_id: String,
    },
    /// Consequence severity is not a known level.
    #[error("rule `{rule_id}` has invalid severity `{value}`")]
    InvalidSeverity {
        /// Offending rule.
        rule_id: String,
        /// Severity as written.
        value: String,
    },
    /// Rule entry or document is not valid JSON of the expected shape.
    #[error("invalid rule document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
