//! Rule engine: evaluates every active rule against one decision.

use governance_primitives::{Decision, Severity};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::condition::{ConditionEvaluator, EvaluationRecord};
use crate::contracts::{Rule, RuleSet};
use crate::derived::DerivedAttributes;

/// Rule whose condition held, with the predicates that made it fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredRule {
    /// The rule.
    pub rule: Rule,
    /// Satisfied predicates, human readable.
    pub reasons: Vec<String>,
}

impl TriggeredRule {
    /// Returns the rule id.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule.id
    }

    /// Returns the consequence severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.rule.severity()
    }
}

/// Stateless, deterministic rule engine.
///
/// Rules never short-circuit one another. Output is ordered by ascending
/// priority, ties kept in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    evaluator: ConditionEvaluator,
}

impl RuleEngine {
    /// Creates an engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            evaluator: ConditionEvaluator,
        }
    }

    /// Evaluates the active rules of `rules` against `decision`.
    #[must_use]
    pub fn evaluate(
        &self,
        decision: &Decision,
        derived: &DerivedAttributes,
        rules: &RuleSet,
    ) -> Vec<TriggeredRule> {
        let record = EvaluationRecord::new(decision, derived);
        let mut ordered: Vec<&Rule> = rules.active().collect();
        ordered.sort_by_key(|rule| rule.priority);

        ordered
            .into_iter()
            .filter_map(|rule| {
                if !self.evaluator.evaluate(&rule.condition, &record) {
                    trace!(rule = %rule.id, "governance rule not satisfied");
                    return None;
                }
                let reasons = self.evaluator.reasons(&rule.condition, &record);
                debug!(
                    rule = %rule.id,
                    priority = rule.priority,
                    severity = %rule.severity(),
                    "governance rule triggered"
                );
                Some(TriggeredRule {
                    rule: rule.clone(),
                    reasons,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::contracts::Consequence;
    use governance_config::DerivationConfig;

    fn budget_rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::new("R5", "Large budget", Condition::predicate("cost", Operator::Gt, 500_000))
                .with_priority(2)
                .with_consequence(Consequence::require_approval(["CFO", "CEO"], Severity::High)),
            Rule::new("R9", "Disabled", Condition::predicate("cost", Operator::Gt, 0))
                .with_priority(0)
                .inactive(),
            Rule::new("R1", "Budget", Condition::predicate("cost", Operator::Gt, 100_000))
                .with_priority(1)
                .with_consequence(Consequence::require_approval(["CFO"], Severity::Medium)),
            Rule::new("R6", "Tie", Condition::predicate("cost", Operator::Gt, 1))
                .with_priority(2),
            Rule::new("R7", "Never", Condition::predicate("cost", Operator::Lt, 1))
                .with_priority(0),
        ])
    }

    fn triggered_ids(statement: &str) -> Vec<String> {
        let decision = Decision::builder(statement).build();
        let derived = DerivedAttributes::derive(&decision, &DerivationConfig::default());
        RuleEngine::new()
            .evaluate(&decision, &derived, &budget_rules())
            .into_iter()
            .map(|triggered| triggered.rule.id)
            .collect()
    }

    #[test]
    fn orders_by_priority_then_declaration() {
        assert_eq!(triggered_ids("Hire with $600k"), ["R1", "R5", "R6"]);
    }

    #[test]
    fn unsatisfied_and_inactive_rules_are_omitted() {
        assert_eq!(triggered_ids("Hire with $200k"), ["R1", "R6"]);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let decision = Decision::builder("Hire with $600k").build();
        let derived = DerivedAttributes::derive(&decision, &DerivationConfig::default());
        let engine = RuleEngine::new();
        let rules = budget_rules();
        assert_eq!(
            engine.evaluate(&decision, &derived, &rules),
            engine.evaluate(&decision, &derived, &rules)
        );
    }
}
