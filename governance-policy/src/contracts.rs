//! Governance rule contracts: the raw rule-file shape and the typed rules evaluated by the engine.

use std::collections::HashSet;

use governance_primitives::Severity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::condition::Condition;
use crate::error::{PolicyError, PolicyResult};

/// Rule family, used for grouping in reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Budget and spend controls.
    Financial,
    /// Regulatory compliance.
    Compliance,
    /// Personal data handling.
    Privacy,
    /// Strategic alignment.
    Strategic,
    /// Operational readiness.
    Operational,
    /// Anything else.
    #[default]
    #[serde(other)]
    General,
}

impl RuleCategory {
    /// Parses a rule-file `type` label; unknown labels map to [`RuleCategory::General`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "financial" | "finance" | "budget" => Self::Financial,
            "compliance" | "regulatory" | "legal" => Self::Compliance,
            "privacy" | "data_protection" => Self::Privacy,
            "strategic" | "strategy" => Self::Strategic,
            "operational" | "operations" => Self::Operational,
            _ => Self::General,
        }
    }

    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Compliance => "compliance",
            Self::Privacy => "privacy",
            Self::Strategic => "strategic",
            Self::Operational => "operational",
            Self::General => "general",
        }
    }
}

/// Approver named by a consequence, resolved against the company context later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverRef {
    /// Role title; may be empty when only an id is given.
    pub role: String,
    /// Personnel id, when the rule pins a person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Explicit authority level, overriding the personnel record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl ApproverRef {
    /// Approver identified by role only.
    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            id: None,
            level: None,
        }
    }

    /// Pins a personnel id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets an explicit authority level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }
}

/// What happens when a rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsequenceAction {
    /// Named approvers must sign off.
    RequireApproval {
        /// Approvers, in rule order.
        approvers: Vec<ApproverRef>,
    },
    /// Named reviewers must look at the decision.
    RequireReview {
        /// Reviewers, in rule order.
        approvers: Vec<ApproverRef>,
    },
    /// Decision must not proceed as stated.
    Block {
        /// Explanation recorded with the finding.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Role that can lift the block.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        approver_role: Option<String>,
    },
}

impl ConsequenceAction {
    /// Returns the snake_case action label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RequireApproval { .. } => "require_approval",
            Self::RequireReview { .. } => "require_review",
            Self::Block { .. } => "block",
        }
    }

    /// Approvers or reviewers named by the action; empty for blocks.
    #[must_use]
    pub fn approvers(&self) -> &[ApproverRef] {
        match self {
            Self::RequireApproval { approvers } | Self::RequireReview { approvers } => approvers,
            Self::Block { .. } => &[],
        }
    }

    /// Roles the action targets, including the role able to lift a block.
    pub fn target_roles(&self) -> impl Iterator<Item = &str> {
        let block_role = match self {
            Self::Block { approver_role, .. } => approver_role.as_deref(),
            _ => None,
        };
        self.approvers()
            .iter()
            .map(|approver| approver.role.as_str())
            .chain(block_role)
            .filter(|role| !role.trim().is_empty())
    }
}

/// Consequence of a rule: an action plus its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consequence {
    /// Action to take.
    pub action: ConsequenceAction,
    /// Severity; defaults to `medium`.
    #[serde(default)]
    pub severity: Severity,
}

impl Consequence {
    /// Approval by each named role.
    #[must_use]
    pub fn require_approval<I, S>(roles: I, severity: Severity) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: ConsequenceAction::RequireApproval {
                approvers: roles.into_iter().map(ApproverRef::role).collect(),
            },
            severity,
        }
    }

    /// Review by each named role.
    #[must_use]
    pub fn require_review<I, S>(roles: I, severity: Severity) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: ConsequenceAction::RequireReview {
                approvers: roles.into_iter().map(ApproverRef::role).collect(),
            },
            severity,
        }
    }

    /// Block with a reason.
    #[must_use]
    pub fn block(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            action: ConsequenceAction::Block {
                reason: Some(reason.into()),
                approver_role: None,
            },
            severity,
        }
    }
}

/// Typed governance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: String,
    /// Short name.
    pub name: String,
    /// Longer description, reused as the approval reason.
    #[serde(default)]
    pub description: String,
    /// Rule family.
    #[serde(default)]
    pub category: RuleCategory,
    /// Trigger condition.
    pub condition: Condition,
    /// Consequence when triggered; a rule without one is informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<Consequence>,
    /// Lower runs first.
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Inactive rules are never evaluated.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_priority() -> i64 {
    100
}

const fn default_active() -> bool {
    true
}

impl Rule {
    /// Creates an active, informational rule with default priority.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: RuleCategory::General,
            condition,
            consequence: None,
            priority: default_priority(),
            active: true,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the consequence.
    #[must_use]
    pub fn with_consequence(mut self, consequence: Consequence) -> Self {
        self.consequence = Some(consequence);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the rule inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Text used as the approval reason: description, else name, else id.
    #[must_use]
    pub fn reason(&self) -> &str {
        [&self.description, &self.name, &self.id]
            .into_iter()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// Consequence severity, `medium` for informational rules.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.consequence
            .as_ref()
            .map_or(Severity::Medium, |consequence| consequence.severity)
    }
}

/// Consequence block exactly as written in rule files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsequenceDefinition {
    /// `require_approval`, `require_review`, `require_goal_mapping`, or `block`.
    #[serde(default)]
    pub action: String,
    /// Single approver role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_role: Option<String>,
    /// Several approver roles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_roles: Vec<String>,
    /// Single approver id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_id: Option<String>,
    /// Several approver ids, paired with `approver_roles` by position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_ids: Vec<String>,
    /// Severity label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Explicit authority level for every named approver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Block reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Rule exactly as written in rule files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Identifier.
    #[serde(default, alias = "id")]
    pub rule_id: String,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category label.
    #[serde(default, rename = "type", alias = "category")]
    pub rule_type: Option<String>,
    /// Untyped condition.
    #[serde(default)]
    pub condition: Value,
    /// Untyped consequence.
    #[serde(default)]
    pub consequence: Option<ConsequenceDefinition>,
    /// Priority.
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Active flag.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl RuleDefinition {
    fn into_rule(self, index: usize) -> PolicyResult<Rule> {
        let id = self.rule_id.trim().to_owned();
        if id.is_empty() {
            return Err(PolicyError::MissingRuleId { index });
        }
        let condition = serde_json::from_value::<Condition>(self.condition).map_err(|source| {
            PolicyError::InvalidCondition {
                rule_id: id.clone(),
                source,
            }
        })?;
        let consequence = self
            .consequence
            .map(|definition| definition.into_consequence(&id))
            .transpose()?;

        Ok(Rule {
            name: if self.name.trim().is_empty() {
                id.clone()
            } else {
                self.name
            },
            id,
            description: self.description,
            category: self
                .rule_type
                .as_deref()
                .map_or(RuleCategory::General, RuleCategory::from_label),
            condition,
            consequence,
            priority: self.priority,
            active: self.active,
        })
    }
}

impl ConsequenceDefinition {
    fn into_consequence(self, rule_id: &str) -> PolicyResult<Consequence> {
        let severity = match self.severity.as_deref().map(str::trim) {
            None | Some("") => Severity::Medium,
            Some(label) => label
                .parse::<Severity>()
                .map_err(|_| PolicyError::InvalidSeverity {
                    rule_id: rule_id.to_owned(),
                    value: label.to_owned(),
                })?,
        };

        let action = match self.action.trim().to_ascii_lowercase().as_str() {
            "require_approval" => ConsequenceAction::RequireApproval {
                approvers: self.approvers(rule_id)?,
            },
            "require_review" => ConsequenceAction::RequireReview {
                approvers: self.approvers(rule_id)?,
            },
            "require_goal_mapping" => ConsequenceAction::RequireApproval {
                approvers: vec![ApproverRef {
                    role: "CEO".to_owned(),
                    id: None,
                    level: self.level,
                }],
            },
            "block" => ConsequenceAction::Block {
                reason: self.reason.clone(),
                approver_role: self
                    .approver_role
                    .clone()
                    .or_else(|| self.approver_roles.first().cloned()),
            },
            other => {
                return Err(PolicyError::UnsupportedAction {
                    rule_id: rule_id.to_owned(),
                    action: other.to_owned(),
                });
            }
        };

        Ok(Consequence { action, severity })
    }

    fn approvers(&self, rule_id: &str) -> PolicyResult<Vec<ApproverRef>> {
        let roles: Vec<&str> = if self.approver_roles.is_empty() {
            self.approver_role.as_deref().into_iter().collect()
        } else {
            self.approver_roles.iter().map(String::as_str).collect()
        };
        let ids: Vec<&str> = if self.approver_ids.is_empty() {
            self.approver_id.as_deref().into_iter().collect()
        } else {
            self.approver_ids.iter().map(String::as_str).collect()
        };

        let approvers: Vec<ApproverRef> = (0..roles.len().max(ids.len()))
            .filter_map(|position| {
                let role = roles.get(position).map_or("", |role| role.trim());
                let id = ids
                    .get(position)
                    .map(|id| id.trim())
                    .filter(|id| !id.is_empty());
                (!role.is_empty() || id.is_some()).then(|| ApproverRef {
                    role: role.to_owned(),
                    id: id.map(str::to_owned),
                    level: self.level,
                })
            })
            .collect();

        if approvers.is_empty() {
            return Err(PolicyError::MissingApprover {
                rule_id: rule_id.to_owned(),
            });
        }
        Ok(approvers)
    }
}

/// Rule entry that could not be loaded.
#[derive(Debug)]
pub struct RejectedRule {
    /// Position in the source document.
    pub index: usize,
    /// Rule id, when one was readable.
    pub rule_id: Option<String>,
    /// Why the rule was rejected.
    pub error: PolicyError,
}

/// Immutable, validated set of rules in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Wraps already-typed rules.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Converts raw definitions, skipping each invalid or duplicate entry.
    ///
    /// Skipped entries are logged at `warn` and returned alongside the set.
    #[must_use]
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = RuleDefinition>,
    ) -> (Self, Vec<RejectedRule>) {
        let mut rules = Vec::new();
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for (index, definition) in definitions.into_iter().enumerate() {
            let rule_id = Some(definition.rule_id.trim().to_owned()).filter(|id| !id.is_empty());
            let outcome = definition.into_rule(index).and_then(|rule| {
                if seen.insert(rule.id.clone()) {
                    Ok(rule)
                } else {
                    Err(PolicyError::DuplicateRule { rule_id: rule.id })
                }
            });
            match outcome {
                Ok(rule) => rules.push(rule),
                Err(error) => {
                    warn!(index, rule_id = ?rule_id, %error, "skipping governance rule");
                    rejected.push(RejectedRule {
                        index,
                        rule_id,
                        error,
                    });
                }
            }
        }

        debug!(loaded = rules.len(), rejected = rejected.len(), "governance rules loaded");
        (Self { rules }, rejected)
    }

    /// Parses a JSON array of rule definitions, or an object with a `rules` array.
    ///
    /// Entries whose shape cannot be read are rejected individually.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Document`] when the document itself is not JSON
    /// or holds no rule list.
    pub fn from_json_str(json: &str) -> PolicyResult<(Self, Vec<RejectedRule>)> {
        let document: Value = serde_json::from_str(json)?;
        let entries = match document {
            Value::Array(entries) => entries,
            Value::Object(mut object) => match object.remove("rules") {
                Some(Value::Array(entries)) => entries,
                _ => {
                    return Err(PolicyError::Document(serde::de::Error::custom(
                        "expected a `rules` array",
                    )));
                }
            },
            _ => {
                return Err(PolicyError::Document(serde::de::Error::custom(
                    "expected an array of rules",
                )));
            }
        };

        let mut unreadable = Vec::new();
        let mut definitions = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let rule_id = entry
                .get("rule_id")
                .or_else(|| entry.get("id"))
                .and_then(Value::as_str)
                .map(str::to_owned);
            match serde_json::from_value::<RuleDefinition>(entry) {
                Ok(definition) => definitions.push((index, definition)),
                Err(error) => {
                    warn!(index, rule_id = ?rule_id, %error, "skipping unreadable governance rule");
                    unreadable.push(RejectedRule {
                        index,
                        rule_id,
                        error: PolicyError::Document(error),
                    });
                }
            }
        }

        let positions: Vec<usize> = definitions.iter().map(|(index, _)| *index).collect();
        let (set, mut rejected) =
            Self::from_definitions(definitions.into_iter().map(|(_, definition)| definition));
        for entry in &mut rejected {
            entry.index = positions[entry.index];
        }
        rejected.extend(unreadable);
        rejected.sort_by_key(|entry| entry.index);
        Ok((set, rejected))
    }

    /// Returns all rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterates active rules in declaration order.
    pub fn active(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.active)
    }

    /// Finds a rule by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
