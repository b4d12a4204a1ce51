//! Governance flags raised from decision content and derived attributes.

use std::fmt::{self, Display, Formatter};

use governance_config::FlagThresholds;
use governance_primitives::{Decision, Severity};
use serde::{Deserialize, Serialize};

use crate::derived::DerivedAttributes;
use crate::risk::RiskScorer;

/// Flag codes in declaration order, which is also their reporting order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceFlag {
    /// Statement is empty.
    MissingDecisionStatement,
    /// No owner is listed.
    MissingOwner,
    /// No KPI is listed.
    MissingKpi,
    /// No risk is listed.
    MissingRiskAssessment,
    /// No goal is listed.
    MissingGoals,
    /// Budget reaches the financial threshold.
    FinancialThresholdExceeded,
    /// Budget reaches the major-investment threshold.
    MajorInvestment,
    /// EU market or regime in scope.
    EuScope,
    /// Personal data involved.
    PiiDetected,
    /// EU scope and personal data together.
    PrivacyReviewRequired,
    /// A critical risk has no mitigation.
    UnmitigatedCriticalRisk,
    /// A high risk has no mitigation.
    UnmitigatedHighRisk,
    /// Overall risk level is high or critical.
    HighRisk,
    /// Reads as a strategic initiative.
    StrategicInitiative,
    /// Extraction confidence is below the floor.
    LowConfidence,
    /// A triggered rule blocks the decision.
    PolicyBlock,
}

impl GovernanceFlag {
    /// Returns the SCREAMING_SNAKE_CASE code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingDecisionStatement => "MISSING_DECISION_STATEMENT",
            Self::MissingOwner => "MISSING_OWNER",
            Self::MissingKpi => "MISSING_KPI",
            Self::MissingRiskAssessment => "MISSING_RISK_ASSESSMENT",
            Self::MissingGoals => "MISSING_GOALS",
            Self::FinancialThresholdExceeded => "FINANCIAL_THRESHOLD_EXCEEDED",
            Self::MajorInvestment => "MAJOR_INVESTMENT",
            Self::EuScope => "EU_SCOPE",
            Self::PiiDetected => "PII_DETECTED",
            Self::PrivacyReviewRequired => "PRIVACY_REVIEW_REQUIRED",
            Self::UnmitigatedCriticalRisk => "UNMITIGATED_CRITICAL_RISK",
            Self::UnmitigatedHighRisk => "UNMITIGATED_HIGH_RISK",
            Self::HighRisk => "HIGH_RISK",
            Self::StrategicInitiative => "STRATEGIC_INITIATIVE",
            Self::LowConfidence => "LOW_CONFIDENCE",
            Self::PolicyBlock => "POLICY_BLOCK",
        }
    }

    /// Returns the flag's fixed severity.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::MissingGoals => Severity::Low,
            Self::MissingKpi
            | Self::MissingRiskAssessment
            | Self::EuScope
            | Self::StrategicInitiative
            | Self::LowConfidence => Severity::Medium,
            Self::FinancialThresholdExceeded
            | Self::PiiDetected
            | Self::PrivacyReviewRequired
            | Self::UnmitigatedHighRisk
            | Self::HighRisk => Severity::High,
            Self::MissingDecisionStatement
            | Self::MissingOwner
            | Self::MajorInvestment
            | Self::UnmitigatedCriticalRisk
            | Self::PolicyBlock => Severity::Critical,
        }
    }
}

impl Display for GovernanceFlag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Raises [`GovernanceFlag`]s deterministically.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagDetector {
    thresholds: FlagThresholds,
    scorer: RiskScorer,
}

impl FlagDetector {
    /// Creates a detector; `scorer` supplies the risk level behind `HIGH_RISK`.
    #[must_use]
    pub const fn new(thresholds: FlagThresholds, scorer: RiskScorer) -> Self {
        Self { thresholds, scorer }
    }

    /// Returns the flags raised for `decision`, in declaration order without duplicates.
    ///
    /// [`GovernanceFlag::PolicyBlock`] is never raised here; it depends on rule outcomes.
    #[must_use]
    pub fn detect(&self, decision: &Decision, derived: &DerivedAttributes) -> Vec<GovernanceFlag> {
        let budget = derived.normalized_budget;
        let risk_level = self.scorer.assess(decision.risks()).level;
        let strategic_impact = decision
            .strategic_impact()
            .is_some_and(Severity::is_elevated);

        [
            (!decision.has_statement(), GovernanceFlag::MissingDecisionStatement),
            (decision.owners().is_empty(), GovernanceFlag::MissingOwner),
            (decision.kpis().is_empty(), GovernanceFlag::MissingKpi),
            (decision.risks().is_empty(), GovernanceFlag::MissingRiskAssessment),
            (decision.goals().is_empty(), GovernanceFlag::MissingGoals),
            (
                budget >= self.thresholds.financial_threshold,
                GovernanceFlag::FinancialThresholdExceeded,
            ),
            (
                budget >= self.thresholds.major_investment_threshold,
                GovernanceFlag::MajorInvestment,
            ),
            (derived.has_eu_scope, GovernanceFlag::EuScope),
            (derived.has_pii_usage, GovernanceFlag::PiiDetected),
            (
                derived.has_eu_scope && derived.has_pii_usage,
                GovernanceFlag::PrivacyReviewRequired,
            ),
            (
                decision.unmitigated(Severity::Critical).next().is_some(),
                GovernanceFlag::UnmitigatedCriticalRisk,
            ),
            (
                decision.unmitigated(Severity::High).next().is_some(),
                GovernanceFlag::UnmitigatedHighRisk,
            ),
            (risk_level.is_elevated(), GovernanceFlag::HighRisk),
            (
                derived.is_strategic || strategic_impact,
                GovernanceFlag::StrategicInitiative,
            ),
            (
                decision.confidence() < self.thresholds.low_confidence_floor,
                GovernanceFlag::LowConfidence,
            ),
        ]
        .into_iter()
        .filter_map(|(raised, flag)| raised.then_some(flag))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governance_config::DerivationConfig;
    use governance_primitives::{Goal, Kpi, Owner, Risk};

    fn detect(decision: &Decision) -> Vec<GovernanceFlag> {
        let derived = DerivedAttributes::derive(decision, &DerivationConfig::default());
        FlagDetector::default().detect(decision, &derived)
    }

    #[test]
    fn empty_decision_raises_completeness_flags_in_order() {
        assert_eq!(
            detect(&Decision::default()),
            [
                GovernanceFlag::MissingDecisionStatement,
                GovernanceFlag::MissingOwner,
                GovernanceFlag::MissingKpi,
                GovernanceFlag::MissingRiskAssessment,
                GovernanceFlag::MissingGoals,
                GovernanceFlag::LowConfidence,
            ]
        );
    }

    #[test]
    fn budget_privacy_and_risk_flags() {
        let decision = Decision::builder("Launch a $1.5m personal data platform in Germany")
            .goal(Goal::new("Grow revenue"))
            .kpi(Kpi::new("ARR", "+10%"))
            .owner(Owner::new("Lee", "CPO"))
            .risk(Risk::new("regulator fine", Severity::Critical))
            .build();

        assert_eq!(
            detect(&decision),
            [
                GovernanceFlag::FinancialThresholdExceeded,
                GovernanceFlag::MajorInvestment,
                GovernanceFlag::EuScope,
                GovernanceFlag::PiiDetected,
                GovernanceFlag::PrivacyReviewRequired,
                GovernanceFlag::UnmitigatedCriticalRisk,
                GovernanceFlag::HighRisk,
            ]
        );
    }

    #[test]
    fn codes_and_severities() {
        assert_eq!(GovernanceFlag::MissingKpi.to_string(), "MISSING_KPI");
        assert_eq!(
            serde_json::to_value(GovernanceFlag::PrivacyReviewRequired).unwrap(),
            "PRIVACY_REVIEW_REQUIRED"
        );
        assert_eq!(GovernanceFlag::MissingGoals.severity(), Severity::Low);
        assert_eq!(GovernanceFlag::MajorInvestment.severity(), Severity::Critical);
    }
}
