//! End-to-end governance evaluation of a single decision.

use governance_config::{CompanyContext, GovernanceConfig};
use governance_primitives::{Decision, Severity};
use tracing::debug;

use crate::approval::ApprovalChainBuilder;
use crate::contracts::{ConsequenceAction, RuleSet};
use crate::decision::{CompletenessIssue, GovernanceResult, GovernanceStatus};
use crate::derived::DerivedAttributes;
use crate::engine::RuleEngine;
use crate::flags::{FlagDetector, GovernanceFlag};
use crate::risk::RiskScorer;

/// Evaluates decisions against an immutable configuration, rule set, and company context.
#[derive(Debug, Clone)]
pub struct GovernanceEvaluator {
    config: GovernanceConfig,
    rules: RuleSet,
    company: CompanyContext,
    scorer: RiskScorer,
    flags: FlagDetector,
    engine: RuleEngine,
}

impl GovernanceEvaluator {
    /// Creates an evaluator. `config` is expected to be validated already.
    #[must_use]
    pub fn new(config: GovernanceConfig, rules: RuleSet, company: CompanyContext) -> Self {
        let scorer = RiskScorer::new(config.risk);
        Self {
            config,
            rules,
            company,
            scorer,
            flags: FlagDetector::new(config.flags, scorer),
            engine: RuleEngine::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Returns the rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the company context.
    #[must_use]
    pub fn company(&self) -> &CompanyContext {
        &self.company
    }

    /// Evaluates `decision`. Incomplete input is reported in the result, never as an error.
    #[must_use]
    pub fn evaluate(&self, decision: &Decision) -> GovernanceResult {
        let derived = DerivedAttributes::derive(decision, &self.config.derivation);
        let risk = self.scorer.assess(decision.risks());
        let mut flags = self.flags.detect(decision, &derived);
        let triggered_rules = self.engine.evaluate(decision, &derived, &self.rules);
        let approval_chain = ApprovalChainBuilder::new(&self.company).build(&triggered_rules);

        let blocked_by_rule = triggered_rules.iter().any(|triggered| {
            triggered.rule.consequence.as_ref().is_some_and(|consequence| {
                matches!(consequence.action, ConsequenceAction::Block { .. })
            })
        });
        if blocked_by_rule {
            flags.push(GovernanceFlag::PolicyBlock);
        }

        let completeness_issues = completeness_issues(decision);
        let status = if completeness_issues.iter().any(|issue| issue.is_blocking()) {
            GovernanceStatus::Blocked
        } else if !approval_chain.is_empty()
            || flags.iter().any(|flag| flag.severity().is_elevated())
        {
            GovernanceStatus::NeedsApproval
        } else {
            GovernanceStatus::Approved
        };

        let confidence = decision.confidence();
        let thresholds = &self.config.flags;
        let requires_human_review = status != GovernanceStatus::Approved
            || confidence < thresholds.human_review_confidence
            || flags.len() > thresholds.human_review_flag_count;

        debug!(
            status = %status,
            risk_score = risk.score,
            risk_level = %risk.level,
            flags = flags.len(),
            triggered = triggered_rules.len(),
            approvers = approval_chain.len(),
            "governance evaluated"
        );

        GovernanceResult {
            risk_score: risk.score,
            risk_level: risk.level,
            flags,
            triggered_rules,
            approval_chain,
            status,
            confidence,
            completeness_issues,
            derived,
            requires_human_review,
        }
    }
}

fn completeness_issues(decision: &Decision) -> Vec<CompletenessIssue> {
    [
        (!decision.has_statement(), CompletenessIssue::MissingDecisionStatement),
        (decision.owners().is_empty(), CompletenessIssue::MissingOwner),
        (decision.kpis().is_empty(), CompletenessIssue::MissingKpi),
        (decision.risks().is_empty(), CompletenessIssue::MissingRisk),
        (decision.goals().is_empty(), CompletenessIssue::MissingGoals),
    ]
    .into_iter()
    .filter_map(|(missing, issue)| missing.then_some(issue))
    .collect()
}

/// Severity of the most serious blocking or approval signal, used by callers
/// that only need a single headline level.
#[must_use]
pub fn headline_severity(result: &GovernanceResult) -> Severity {
    result
        .highest_flag_severity()
        .map_or(result.governance_severity(), |flag| {
            flag.max(result.governance_severity())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::contracts::{Consequence, Rule};
    use governance_config::Person;
    use governance_primitives::{Goal, Kpi, Owner, Risk};

    fn evaluator(rules: Vec<Rule>) -> GovernanceEvaluator {
        GovernanceEvaluator::new(
            GovernanceConfig::default(),
            RuleSet::new(rules),
            CompanyContext::new(vec![
                Person::new("P001", "Avery", "CEO", 5),
                Person::new("P003", "Jordan", "CFO", 4),
            ]),
        )
    }

    fn complete(statement: &str) -> Decision {
        Decision::builder(statement)
            .goal(Goal::new("Improve onboarding"))
            .kpi(Kpi::new("Activation", "40%"))
            .risk(Risk::new("Scope creep", Severity::Low))
            .owner(Owner::new("Sam", "Head of Product"))
            .build()
    }

    #[test]
    fn clean_decision_is_approved() {
        let result = evaluator(Vec::new()).evaluate(&complete("Refresh the onboarding copy"));
        assert_eq!(result.status, GovernanceStatus::Approved);
        assert!(result.flags.is_empty());
        assert!(result.completeness_issues.is_empty());
        assert!(!result.requires_human_review);
    }

    #[test]
    fn missing_owner_blocks_regardless_of_rules() {
        let decision = Decision::builder("").build();
        let rules = vec![Rule::new("R1", "Always", Condition::predicate("confidence", Operator::Ge, 0))
            .with_consequence(Consequence::require_approval(["CFO"], Severity::Low))];
        let result = evaluator(rules).evaluate(&decision);

        assert_eq!(result.status, GovernanceStatus::Blocked);
        assert_eq!(result.approval_chain.len(), 1);
        assert_eq!(
            result.completeness_issues,
            [
                CompletenessIssue::MissingDecisionStatement,
                CompletenessIssue::MissingOwner,
                CompletenessIssue::MissingKpi,
                CompletenessIssue::MissingRisk,
                CompletenessIssue::MissingGoals,
            ]
        );
        assert!(result.requires_human_review);
    }

    #[test]
    fn elevated_flags_need_approval_without_rules() {
        let result = evaluator(Vec::new()).evaluate(&complete("Collect personal data for onboarding"));
        assert_eq!(result.flags, [GovernanceFlag::PiiDetected]);
        assert_eq!(result.status, GovernanceStatus::NeedsApproval);
    }

    #[test]
    fn blocking_rules_raise_a_policy_block() {
        let rules = vec![Rule::new("B1", "No EU launch", Condition::predicate("eu_scope", Operator::Eq, true))
            .with_consequence(Consequence::block("EU launch frozen", Severity::Critical))];
        let result = evaluator(rules).evaluate(&complete("Ship onboarding to France"));

        assert_eq!(result.flags.last(), Some(&GovernanceFlag::PolicyBlock));
        assert_eq!(result.status, GovernanceStatus::NeedsApproval);
        assert_eq!(headline_severity(&result), Severity::Critical);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let rules = vec![Rule::new("R1", "Budget", Condition::predicate("cost", Operator::Gt, 100_000))
            .with_consequence(Consequence::require_approval(["CFO", "CEO"], Severity::High))];
        let evaluator = evaluator(rules);
        let decision = complete("Spend $400k on onboarding");
        assert_eq!(evaluator.evaluate(&decision), evaluator.evaluate(&decision));
    }
}
