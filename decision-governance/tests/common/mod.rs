#![allow(dead_code)]

use decision_governance::config::{GovernanceConfig, loader};
use decision_governance::policy::{GovernanceEvaluator, RejectedRule, RuleSet};

pub const RULES: &str = r#"{
  "rules": [
    {
      "rule_id": "R1",
      "name": "Budget approval",
      "description": "Budgets above $100k need CFO sign-off",
      "type": "financial",
      "priority": 1,
      "condition": {"field": "cost", "operator": ">", "value": 100000},
      "consequence": {"action": "require_approval", "approver_role": "CFO", "severity": "medium"}
    },
    {
      "rule_id": "R5",
      "name": "Major investment",
      "description": "Budgets above $500k need executive sign-off",
      "type": "financial",
      "priority": 2,
      "condition": {"field": "cost", "operator": ">", "value": 500000},
      "consequence": {"action": "require_approval", "approver_roles": ["CFO", "CEO"], "severity": "high"}
    },
    {
      "rule_id": "R9",
      "name": "Broken",
      "condition": {"field": "cost", "operator": "roughly", "value": 1}
    }
  ]
}"#;

pub const COMPANY: &str = r#"{
  "company": {"name": "Northwind"},
  "approval_hierarchy": {
    "personnel": [
      {"id": "P001", "name": "Avery Chen", "role": "CEO", "level": 5},
      {"id": "P003", "name": "Jordan Patel", "role": "CFO", "level": 4},
      {"id": "P007", "name": "Riley Moss", "role": "CTO", "level": 4}
    ]
  }
}"#;

pub fn rules() -> (RuleSet, Vec<RejectedRule>) {
    RuleSet::from_json_str(RULES).unwrap()
}

pub fn evaluator() -> GovernanceEvaluator {
    let config = GovernanceConfig::default();
    config.validate().unwrap();
    let company = loader::company_context_from_json_str(COMPANY).unwrap();
    GovernanceEvaluator::new(config, rules().0, company)
}
