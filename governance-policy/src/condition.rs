//! Rule conditions and their evaluation against a decision record.

use std::fmt::{self, Display, Formatter};

use governance_primitives::{Decision, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::derived::DerivedAttributes;

/// Field of the decision/derived-attributes record a predicate can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// Parsed or inferred budget.
    NormalizedBudget,
    /// Lower-cased statement plus goal descriptions.
    Text,
    /// Raw decision statement.
    Statement,
    /// EU-scope flag.
    HasEuScope,
    /// PII-usage flag.
    HasPiiUsage,
    /// Deployment flag.
    HasDeployment,
    /// Strategic flag.
    IsStrategic,
    /// Average risk severity.
    EstimatedRiskLevel,
    /// Completeness fraction.
    CompletenessScore,
    /// Extraction confidence.
    Confidence,
    /// Declared strategic impact.
    StrategicImpact,
    /// Number of goals.
    GoalCount,
    /// Number of KPIs.
    KpiCount,
    /// Number of risks.
    RiskCount,
    /// Number of owners.
    OwnerCount,
    /// Required-approval role names.
    RequiredApprovals,
    /// Owner roles.
    OwnerRoles,
    /// Severities of listed risks.
    RiskSeverities,
}

impl FieldPath {
    /// Resolves a field name used in rule files, including legacy aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let path = match name.trim().to_ascii_lowercase().as_str() {
            "cost" | "budget" | "normalized_budget" => Self::NormalizedBudget,
            "target_market" | "text" | "decision_text" => Self::Text,
            "statement" | "decision_statement" => Self::Statement,
            "eu_scope" | "has_eu_scope" => Self::HasEuScope,
            "uses_pii" | "has_pii_usage" => Self::HasPiiUsage,
            "launch_date" | "has_deployment" => Self::HasDeployment,
            "strategic" | "is_strategic" => Self::IsStrategic,
            "risk_level" | "estimated_risk_level" => Self::EstimatedRiskLevel,
            "completeness" | "completeness_score" => Self::CompletenessScore,
            "confidence" => Self::Confidence,
            "strategic_impact" => Self::StrategicImpact,
            "goal_count" => Self::GoalCount,
            "kpi_count" => Self::KpiCount,
            "risk_count" => Self::RiskCount,
            "owner_count" => Self::OwnerCount,
            "required_approvals" => Self::RequiredApprovals,
            "owner_roles" => Self::OwnerRoles,
            "risk_severities" => Self::RiskSeverities,
            _ => return None,
        };
        Some(path)
    }

    /// Returns the canonical field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NormalizedBudget => "normalized_budget",
            Self::Text => "text",
            Self::Statement => "statement",
            Self::HasEuScope => "has_eu_scope",
            Self::HasPiiUsage => "has_pii_usage",
            Self::HasDeployment => "has_deployment",
            Self::IsStrategic => "is_strategic",
            Self::EstimatedRiskLevel => "estimated_risk_level",
            Self::CompletenessScore => "completeness_score",
            Self::Confidence => "confidence",
            Self::StrategicImpact => "strategic_impact",
            Self::GoalCount => "goal_count",
            Self::KpiCount => "kpi_count",
            Self::RiskCount => "risk_count",
            Self::OwnerCount => "owner_count",
            Self::RequiredApprovals => "required_approvals",
            Self::OwnerRoles => "owner_roles",
            Self::RiskSeverities => "risk_severities",
        }
    }
}

/// Field reference as written in a rule; unknown names are kept so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldRef {
    /// Recognised field.
    Known(FieldPath),
    /// Unrecognised field name; never satisfied.
    Unknown(String),
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        FieldPath::from_name(&name).map_or(Self::Unknown(name), Self::Known)
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<FieldPath> for FieldRef {
    fn from(path: FieldPath) -> Self {
        Self::Known(path)
    }
}

impl From<FieldRef> for String {
    fn from(field: FieldRef) -> Self {
        field.to_string()
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(path) => f.write_str(path.as_str()),
            Self::Unknown(name) => f.write_str(name),
        }
    }
}

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equality.
    #[serde(rename = "==", alias = "eq", alias = "equals")]
    Eq,
    /// Inequality.
    #[serde(rename = "!=", alias = "ne")]
    Ne,
    /// Greater than.
    #[serde(rename = ">", alias = "gt")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=", alias = "gte")]
    Ge,
    /// Less than.
    #[serde(rename = "<", alias = "lt")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=", alias = "lte")]
    Le,
    /// Field value is a member of the comparison list.
    #[serde(rename = "in")]
    In,
    /// Case-insensitive substring (text) or element (list) containment.
    #[serde(rename = "contains")]
    Contains,
    /// Field contains any keyword of the comparison list.
    #[serde(rename = "contains_any")]
    ContainsAny,
    /// Field is present and truthy.
    #[serde(rename = "overlaps_with")]
    OverlapsWith,
}

impl Operator {
    /// Returns the operator symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::In => "in",
            Self::Contains => "contains",
            Self::ContainsAny => "contains_any",
            Self::OverlapsWith => "overlaps_with",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single `field operator value` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field to read.
    pub field: FieldRef,
    /// Operator.
    pub operator: Operator,
    /// Comparison value.
    #[serde(default)]
    pub value: Value,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(field: impl Into<FieldRef>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Marker for the logical OR combinator in rule files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOr {
    /// `"OR"`.
    #[serde(rename = "OR", alias = "or")]
    Or,
}

/// Rule condition: a predicate, or a logical OR over sub-conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Satisfied when any child is satisfied.
    Any {
        /// Always [`LogicalOr::Or`].
        operator: LogicalOr,
        /// Children.
        conditions: Vec<Condition>,
    },
    /// Plain predicate.
    Predicate(Predicate),
}

impl Condition {
    /// Builds a predicate condition.
    #[must_use]
    pub fn predicate(
        field: impl Into<FieldRef>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self::Predicate(Predicate::new(field, operator, value))
    }

    /// Builds an OR over `conditions`.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any {
            operator: LogicalOr::Or,
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Iterates every predicate in the condition tree, depth first.
    pub fn predicates(&self) -> Box<dyn Iterator<Item = &Predicate> + '_> {
        match self {
            Self::Predicate(predicate) => Box::new(std::iter::once(predicate)),
            Self::Any { conditions, .. } => {
                Box::new(conditions.iter().flat_map(Condition::predicates))
            }
        }
    }
}

/// Value of a resolved field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Numeric field.
    Number(f64),
    /// Boolean field.
    Bool(bool),
    /// Text field.
    Text(String),
    /// List of strings.
    List(Vec<String>),
    /// Field has no value for this decision.
    Absent,
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::List(items) => write!(f, "{items:?}"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// Decision plus its derived attributes, the record conditions are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRecord<'a> {
    /// Decision under evaluation.
    pub decision: &'a Decision,
    /// Attributes derived from it.
    pub derived: &'a DerivedAttributes,
}

impl<'a> EvaluationRecord<'a> {
    /// Pairs a decision with its derived attributes.
    #[must_use]
    pub const fn new(decision: &'a Decision, derived: &'a DerivedAttributes) -> Self {
        Self { decision, derived }
    }

    /// Reads the value at `path`.
    #[must_use]
    pub fn resolve(&self, path: FieldPath) -> FieldValue {
        let decision = self.decision;
        let derived = self.derived;
        match path {
            FieldPath::NormalizedBudget => FieldValue::Number(derived.normalized_budget),
            FieldPath::Text => FieldValue::Text(decision.searchable_text()),
            FieldPath::Statement => FieldValue::Text(decision.statement().to_owned()),
            FieldPath::HasEuScope => FieldValue::Bool(derived.has_eu_scope),
            FieldPath::HasPiiUsage => FieldValue::Bool(derived.has_pii_usage),
            FieldPath::HasDeployment => FieldValue::Bool(derived.has_deployment),
            FieldPath::IsStrategic => FieldValue::Bool(derived.is_strategic),
            FieldPath::EstimatedRiskLevel => severity_value(derived.estimated_risk_level),
            FieldPath::CompletenessScore => FieldValue::Number(derived.completeness_score),
            FieldPath::Confidence => FieldValue::Number(decision.confidence()),
            FieldPath::StrategicImpact => severity_value(decision.strategic_impact()),
            FieldPath::GoalCount => count(decision.goals().len()),
            FieldPath::KpiCount => count(decision.kpis().len()),
            FieldPath::RiskCount => count(decision.risks().len()),
            FieldPath::OwnerCount => count(decision.owners().len()),
            FieldPath::RequiredApprovals => {
                FieldValue::List(decision.required_approvals().to_vec())
            }
            FieldPath::OwnerRoles => FieldValue::List(
                decision
                    .owners()
                    .iter()
                    .filter_map(|owner| owner.role.clone())
                    .collect(),
            ),
            FieldPath::RiskSeverities => FieldValue::List(
                decision
                    .risks()
                    .iter()
                    .map(|risk| risk.severity.as_str().to_owned())
                    .collect(),
            ),
        }
    }
}

fn severity_value(severity: Option<Severity>) -> FieldValue {
    severity.map_or(FieldValue::Absent, |severity| {
        FieldValue::Text(severity.as_str().to_owned())
    })
}

#[allow(clippy::cast_precision_loss)]
fn count(len: usize) -> FieldValue {
    FieldValue::Number(len as f64)
}

/// Evaluates conditions. Never panics; anything malformed is simply not satisfied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Returns `true` when `condition` holds for `record`.
    #[must_use]
    pub fn evaluate(&self, condition: &Condition, record: &EvaluationRecord<'_>) -> bool {
        match condition {
            Condition::Any { conditions, .. } => conditions
                .iter()
                .any(|child| self.evaluate(child, record)),
            Condition::Predicate(predicate) => self.test(predicate, record).is_some(),
        }
    }

    /// Human-readable descriptions of the satisfied predicates of `condition`.
    ///
    /// Empty when the condition does not hold.
    #[must_use]
    pub fn reasons(&self, condition: &Condition, record: &EvaluationRecord<'_>) -> Vec<String> {
        match condition {
            Condition::Any { conditions, .. } => conditions
                .iter()
                .flat_map(|child| self.reasons(child, record))
                .collect(),
            Condition::Predicate(predicate) => self.test(predicate, record).into_iter().collect(),
        }
    }

    fn test(&self, predicate: &Predicate, record: &EvaluationRecord<'_>) -> Option<String> {
        let FieldRef::Known(path) = &predicate.field else {
            return None;
        };
        let actual = record.resolve(*path);
        if !apply(predicate.operator, &actual, &predicate.value) {
            return None;
        }
        Some(format!(
            "{} {} {} (actual {actual})",
            predicate.field,
            predicate.operator,
            render_value(&predicate.value)
        ))
    }
}

fn apply(operator: Operator, actual: &FieldValue, expected: &Value) -> bool {
    if matches!(actual, FieldValue::Absent) {
        return false;
    }
    match operator {
        Operator::Eq => equals(actual, expected) == Some(true),
        Operator::Ne => equals(actual, expected) == Some(false),
        Operator::Gt => ordering(actual, expected).is_some_and(std::cmp::Ordering::is_gt),
        Operator::Ge => ordering(actual, expected).is_some_and(std::cmp::Ordering::is_ge),
        Operator::Lt => ordering(actual, expected).is_some_and(std::cmp::Ordering::is_lt),
        Operator::Le => ordering(actual, expected).is_some_and(std::cmp::Ordering::is_le),
        Operator::In => match (actual, expected) {
            (FieldValue::List(items), Value::Array(options)) => items.iter().any(|item| {
                options
                    .iter()
                    .any(|option| text_equals(item, option) == Some(true))
            }),
            (_, Value::Array(options)) => options
                .iter()
                .any(|option| equals(actual, option) == Some(true)),
            _ => false,
        },
        Operator::Contains => expected
            .as_str()
            .is_some_and(|needle| contains(actual, needle)),
        Operator::ContainsAny => match expected {
            Value::Array(keywords) => keywords
                .iter()
                .filter_map(Value::as_str)
                .any(|needle| contains(actual, needle)),
            Value::String(needle) => contains(actual, needle),
            _ => false,
        },
        Operator::OverlapsWith => match actual {
            FieldValue::Bool(flag) => *flag,
            FieldValue::Number(number) => *number != 0.0,
            FieldValue::Text(text) => !text.trim().is_empty(),
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Absent => false,
        },
    }
}

/// `None` when the two sides are not comparable.
fn equals(actual: &FieldValue, expected: &Value) -> Option<bool> {
    match actual {
        FieldValue::Number(number) => {
            coerce_number(expected).map(|other| (number - other).abs() < f64::EPSILON)
        }
        FieldValue::Bool(flag) => match expected {
            Value::Bool(other) => Some(flag == other),
            Value::String(text) => text.trim().parse::<bool>().ok().map(|other| *flag == other),
            _ => None,
        },
        FieldValue::Text(text) => text_equals(text, expected),
        FieldValue::List(_) | FieldValue::Absent => None,
    }
}

fn text_equals(text: &str, expected: &Value) -> Option<bool> {
    expected
        .as_str()
        .map(|other| text.trim().eq_ignore_ascii_case(other.trim()))
}

fn ordering(actual: &FieldValue, expected: &Value) -> Option<std::cmp::Ordering> {
    match actual {
        FieldValue::Number(number) => number.partial_cmp(&coerce_number(expected)?),
        FieldValue::Text(text) => {
            if let (Ok(left), Some(right)) = (text.trim().parse::<f64>(), coerce_number(expected)) {
                return left.partial_cmp(&right);
            }
            let left = text.parse::<Severity>().ok()?;
            let right = expected.as_str()?.parse::<Severity>().ok()?;
            Some(left.cmp(&right))
        }
        FieldValue::Bool(_) | FieldValue::List(_) | FieldValue::Absent => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn contains(actual: &FieldValue, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    match actual {
        FieldValue::Text(text) => text.to_lowercase().contains(&needle),
        FieldValue::List(items) => items
            .iter()
            .any(|item| item.to_lowercase().contains(&needle)),
        FieldValue::Number(_) | FieldValue::Bool(_) | FieldValue::Absent => false,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Number(number) => number
            .as_f64()
            .map_or_else(|| number.to_string(), format_number),
        other => other.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governance_config::DerivationConfig;
    use governance_primitives::{Owner, Risk};
    use serde_json::json;

    fn check(condition: &Condition, decision: &Decision) -> bool {
        let derived = DerivedAttributes::derive(decision, &DerivationConfig::default());
        ConditionEvaluator.evaluate(condition, &EvaluationRecord::new(decision, &derived))
    }

    #[test]
    fn numeric_comparisons_coerce_strings() {
        let decision = Decision::builder("Hire a team with $600k").build();
        assert!(check(&Condition::predicate("cost", Operator::Gt, 100_000), &decision));
        assert!(check(&Condition::predicate("budget", Operator::Ge, "600000"), &decision));
        assert!(!check(&Condition::predicate("cost", Operator::Lt, 500_000), &decision));
        assert!(!check(&Condition::predicate("cost", Operator::Gt, "lots"), &decision));
    }

    #[test]
    fn unknown_fields_are_never_satisfied() {
        let decision = Decision::builder("anything").build();
        let condition = Condition::predicate("headcount", Operator::Ne, 0);
        assert!(!check(&condition, &decision));
        assert_eq!(
            condition.predicates().next().map(|p| p.field.to_string()),
            Some("headcount".to_owned())
        );
    }

    #[test]
    fn text_operators_ignore_case() {
        let decision = Decision::builder("Expand into the EU Market").build();
        assert!(check(&Condition::predicate("target_market", Operator::Contains, "eu"), &decision));
        assert!(check(
            &Condition::predicate("text", Operator::ContainsAny, json!(["apac", "MARKET"])),
            &decision
        ));
        assert!(!check(&Condition::predicate("text", Operator::ContainsAny, json!([])), &decision));
    }

    #[test]
    fn membership_and_severity_ordering() {
        let decision = Decision::builder("Rebuild billing")
            .owner(Owner::new("Kim", "CTO"))
            .risk(Risk::new("outage", Severity::High))
            .build();
        assert!(check(
            &Condition::predicate("owner_roles", Operator::In, json!(["cfo", "cto"])),
            &decision
        ));
        assert!(check(&Condition::predicate("risk_level", Operator::Ge, "medium"), &decision));
        assert!(!check(&Condition::predicate("risk_level", Operator::Ge, "critical"), &decision));
        assert!(!check(&Condition::predicate("strategic_impact", Operator::Ne, "low"), &decision));
    }

    #[test]
    fn or_requires_one_satisfied_child() {
        let decision = Decision::builder("Launch the app").build();
        let condition = Condition::any([
            Condition::predicate("uses_pii", Operator::Eq, true),
            Condition::predicate("launch_date", Operator::OverlapsWith, Value::Null),
        ]);
        assert!(check(&condition, &decision));
        assert!(!check(&Condition::any([]), &decision));
    }

    #[test]
    fn reasons_describe_satisfied_predicates() {
        let decision = Decision::builder("Spend $250,000 on tooling").build();
        let derived = DerivedAttributes::derive(&decision, &DerivationConfig::default());
        let record = EvaluationRecord::new(&decision, &derived);
        let condition = Condition::any([
            Condition::predicate("cost", Operator::Gt, 100_000),
            Condition::predicate("cost", Operator::Gt, 500_000),
        ]);
        assert_eq!(
            ConditionEvaluator.reasons(&condition, &record),
            vec!["normalized_budget > 100000 (actual 250000)".to_owned()]
        );
    }

    #[test]
    fn deserializes_rule_file_shapes() {
        let condition: Condition = serde_json::from_value(json!({
            "operator": "OR",
            "conditions": [
                {"field": "cost", "operator": ">", "value": 100000},
                {"field": "target_market", "operator": "contains", "value": "EU"}
            ]
        }))
        .unwrap();
        assert_eq!(condition.predicates().count(), 2);

        let err = serde_json::from_value::<Condition>(json!({
            "field": "cost", "operator": "roughly", "value": 1
        }));
        assert!(err.is_err());
    }
}
