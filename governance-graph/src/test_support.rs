use governance_config::{CompanyContext, GovernanceConfig, Person};
use governance_policy::{Condition, Consequence, GovernanceEvaluator, Operator, Rule, RuleSet};
use governance_primitives::Severity;

pub(crate) fn evaluator() -> GovernanceEvaluator {
    GovernanceEvaluator::new(
        GovernanceConfig::default(),
        RuleSet::new(vec![
            Rule::new("R1", "Budget", Condition::predicate("cost", Operator::Gt, 100_000))
                .with_priority(1)
                .with_consequence(Consequence::require_approval(["CFO"], Severity::Medium)),
            Rule::new("R5", "Large budget", Condition::predicate("cost", Operator::Gt, 500_000))
                .with_priority(2)
                .with_consequence(Consequence::require_approval(["CFO", "CEO"], Severity::High)),
        ]),
        CompanyContext::new(vec![
            Person::new("P001", "Avery", "CEO", 5),
            Person::new("P003", "Jordan", "CFO", 4),
        ]),
    )
}
