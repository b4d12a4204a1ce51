//! Governance result types returned by the evaluator.

use std::fmt::{self, Display, Formatter};

use governance_primitives::Severity;
use serde::{Deserialize, Serialize};

use crate::approval::ApprovalStep;
use crate::derived::DerivedAttributes;
use crate::engine::TriggeredRule;
use crate::flags::GovernanceFlag;

/// Overall outcome of a governance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceStatus {
    /// Nothing stands in the way.
    Approved,
    /// Approvals are required or serious flags were raised.
    NeedsApproval,
    /// Statement or owner is missing.
    Blocked,
}

impl GovernanceStatus {
    /// Returns the SCREAMING_SNAKE_CASE label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::NeedsApproval => "NEEDS_APPROVAL",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl Display for GovernanceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required decision field that is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletenessIssue {
    /// Empty statement.
    MissingDecisionStatement,
    /// No owner.
    MissingOwner,
    /// No KPI.
    MissingKpi,
    /// No risk.
    MissingRisk,
    /// No goal.
    MissingGoals,
}

impl CompletenessIssue {
    /// Returns `true` for issues that block the decision outright.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::MissingDecisionStatement | Self::MissingOwner)
    }
}

/// Result of evaluating one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceResult {
    /// Risk score.
    pub risk_score: f64,
    /// Risk level bucket.
    pub risk_level: Severity,
    /// Raised flags in declaration order.
    pub flags: Vec<GovernanceFlag>,
    /// Triggered rules by priority.
    pub triggered_rules: Vec<TriggeredRule>,
    /// Deduplicated approval chain.
    pub approval_chain: Vec<ApprovalStep>,
    /// Overall status.
    pub status: GovernanceStatus,
    /// Extraction confidence carried through.
    pub confidence: f64,
    /// Missing required fields.
    pub completeness_issues: Vec<CompletenessIssue>,
    /// Attributes the rules were evaluated against.
    pub derived: DerivedAttributes,
    /// Whether a person should look at the result before acting on it.
    pub requires_human_review: bool,
}

impl GovernanceResult {
    /// Highest severity among raised flags.
    #[must_use]
    pub fn highest_flag_severity(&self) -> Option<Severity> {
        self.flags.iter().map(|flag| flag.severity()).max()
    }

    /// Severity the decision is governed at: the risk level or the most severe
    /// triggered consequence, whichever is higher.
    #[must_use]
    pub fn governance_severity(&self) -> Severity {
        self.triggered_rules
            .iter()
            .map(TriggeredRule::severity)
            .fold(self.risk_level, Severity::max)
    }

    /// Ids of the triggered rules in order.
    pub fn triggered_rule_ids(&self) -> impl Iterator<Item = &str> {
        self.triggered_rules.iter().map(TriggeredRule::rule_id)
    }

    /// Returns `true` when the status is [`GovernanceStatus::Blocked`].
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == GovernanceStatus::Blocked
    }
}
