//! Decision pack records.

use std::fmt::{self, Display, Formatter};

use governance_policy::{CompletenessIssue, GovernanceFlag, GovernanceStatus};
use governance_primitives::{Assumption, Goal, Kpi, Owner, Risk, Severity};
use governance_reasoning::ReasoningResult;
use serde::{Deserialize, Serialize};

/// Gap in a decision that drives the recommended next actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingItem {
    /// No owner.
    NoOwner,
    /// No KPI.
    NoKpis,
    /// No risk.
    NoRisks,
    /// At least one critical risk has no mitigation.
    NoCriticalMitigations,
    /// No goal.
    NoGoals,
}

impl MissingItem {
    /// Returns the human-readable label, e.g. `no KPIs`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoOwner => "no owner",
            Self::NoKpis => "no KPIs",
            Self::NoRisks => "no risks",
            Self::NoCriticalMitigations => "no mitigations on critical risks",
            Self::NoGoals => "no goals",
        }
    }
}

impl Display for MissingItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Headline section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackSummary {
    /// Decision statement as extracted.
    pub decision_statement: String,
    /// One-line status line.
    pub headline: String,
    /// Governance status.
    pub status: GovernanceStatus,
    /// Risk level.
    pub risk_level: Severity,
    /// Extraction confidence.
    pub confidence: f64,
    /// Strategic impact label, `not_specified` when absent.
    pub strategic_impact: String,
    /// Whether a person must sign off before execution.
    pub human_approval_required: bool,
}

/// Goals and KPIs section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalsAndKpis {
    /// Goals.
    pub goals: Vec<Goal>,
    /// KPIs.
    pub kpis: Vec<Kpi>,
}

/// One approver in the pack's approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackApproval {
    /// Position in the chain, starting at 1.
    pub order: usize,
    /// Approver display name.
    pub approver: String,
    /// Approver role.
    pub role: String,
    /// Authority level.
    pub authority_level: u32,
    /// `false` when only a review was requested.
    pub required: bool,
    /// Reasons joined into one sentence.
    pub rationale: String,
    /// Rules behind the step.
    pub rule_ids: Vec<String>,
}

/// Triggered rule as recorded in the audit section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRule {
    /// Rule id.
    pub rule_id: String,
    /// Rule name.
    pub name: String,
    /// Rule description.
    pub description: String,
    /// Consequence severity.
    pub severity: Severity,
    /// Why the condition matched.
    pub reasons: Vec<String>,
}

/// Audit section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackAudit {
    /// Raised flags.
    pub flags: Vec<GovernanceFlag>,
    /// Triggered rules in priority order.
    pub triggered_rules: Vec<AuditRule>,
    /// Rationales from rules, then approval reasons.
    pub rationales: Vec<String>,
    /// Computed risk score.
    pub risk_score: f64,
    /// Missing required fields reported by the evaluator.
    pub completeness_issues: Vec<CompletenessIssue>,
}

/// Final report for one decision. Built on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPack {
    /// Title, prefixed for high-impact decisions.
    pub title: String,
    /// Headline section.
    pub summary: PackSummary,
    /// Goals and KPIs.
    pub goals_kpis: GoalsAndKpis,
    /// Risks.
    pub risks: Vec<Risk>,
    /// Owners.
    pub owners: Vec<Owner>,
    /// Assumptions.
    pub assumptions: Vec<Assumption>,
    /// Gaps found in the decision.
    pub missing_items: Vec<MissingItem>,
    /// Approval chain, highest authority first.
    pub approval_chain: Vec<PackApproval>,
    /// Deduplicated next actions.
    pub recommended_next_actions: Vec<String>,
    /// Audit trail.
    pub audit: PackAudit,
    /// Graph reasoning, when it was run.
    pub graph_reasoning: Option<ReasoningResult>,
}

impl DecisionPack {
    /// Labels of the missing items.
    pub fn missing_item_labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.missing_items.iter().map(|item| item.label())
    }
}
