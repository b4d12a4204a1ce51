//! Approval chain construction from triggered rules.

use std::cmp::Reverse;
use std::collections::HashMap;

use governance_config::{CompanyContext, Person};
use governance_primitives::Severity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contracts::{ApproverRef, ConsequenceAction};
use crate::engine::TriggeredRule;

/// Resolved approver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApproverIdentity {
    /// Personnel id, or the role name when no personnel entry matched.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role title.
    pub role: String,
}

impl ApproverIdentity {
    fn from_person(person: &Person, fallback_role: &str) -> Self {
        let role = if person.role.trim().is_empty() {
            fallback_role.trim().to_owned()
        } else {
            person.role.clone()
        };
        Self {
            id: person.id.clone(),
            name: if person.name.trim().is_empty() {
                role.clone()
            } else {
                person.name.clone()
            },
            role,
        }
    }

    fn role_only(role: &str) -> Self {
        let role = role.trim().to_owned();
        Self {
            id: role.clone(),
            name: role.clone(),
            role,
        }
    }
}

/// One approver's step in the approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Who approves.
    pub approver: ApproverIdentity,
    /// Authority level; higher approves first.
    pub authority_level: u32,
    /// Why the approval is needed, one entry per distinct reason.
    pub reasons: Vec<String>,
    /// Rules that required this approver, in trigger order.
    pub rule_ids: Vec<String>,
    /// Highest consequence severity seen for this approver.
    pub severity: Severity,
    /// `true` when every requiring rule only asked for a review.
    pub review_only: bool,
}

impl ApprovalStep {
    fn absorb(&mut self, requirement: Requirement, level_source: &mut String) {
        push_unique(&mut self.reasons, requirement.reason);
        if requirement.level != self.authority_level {
            let (kept_level, kept_rule, other_level, other_rule) =
                if requirement.level > self.authority_level {
                    (requirement.level, &requirement.rule_id, self.authority_level, &*level_source)
                } else {
                    (self.authority_level, &*level_source, requirement.level, &requirement.rule_id)
                };
            push_unique(
                &mut self.reasons,
                format!(
                    "authority level {kept_level} from rule {kept_rule} overrides level {other_level} from rule {other_rule}"
                ),
            );
            if requirement.level > self.authority_level {
                self.authority_level = requirement.level;
                level_source.clone_from(&requirement.rule_id);
            }
        }
        push_unique(&mut self.rule_ids, requirement.rule_id);
        self.severity = self.severity.max(requirement.severity);
        self.review_only &= requirement.review_only;
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

struct Requirement {
    identity: ApproverIdentity,
    level: u32,
    reason: String,
    rule_id: String,
    severity: Severity,
    review_only: bool,
}

/// Builds approval chains, resolving approvers against a company context.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalChainBuilder<'a> {
    company: &'a CompanyContext,
}

impl<'a> ApprovalChainBuilder<'a> {
    /// Creates a builder over `company`.
    #[must_use]
    pub const fn new(company: &'a CompanyContext) -> Self {
        Self { company }
    }

    /// Builds the chain for `triggered` rules.
    ///
    /// One step per approver identity: reasons and rule ids are unioned and the
    /// highest authority level wins, with a reason naming both rules when levels
    /// disagree. Steps are ordered by level descending, ties in first-seen order.
    #[must_use]
    pub fn build(&self, triggered: &[TriggeredRule]) -> Vec<ApprovalStep> {
        let mut steps: Vec<(ApprovalStep, String)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for requirement in triggered.iter().flat_map(|rule| self.requirements(rule)) {
            let key = requirement.identity.id.to_lowercase();
            if let Some(&position) = index.get(&key) {
                let (step, level_source) = &mut steps[position];
                debug!(
                    approver = %step.approver.id,
                    rule = %requirement.rule_id,
                    "merging approval requirement"
                );
                step.absorb(requirement, level_source);
                continue;
            }

            index.insert(key, steps.len());
            let level_source = requirement.rule_id.clone();
            steps.push((
                ApprovalStep {
                    approver: requirement.identity,
                    authority_level: requirement.level,
                    reasons: vec![requirement.reason],
                    rule_ids: vec![requirement.rule_id],
                    severity: requirement.severity,
                    review_only: requirement.review_only,
                },
                level_source,
            ));
        }

        let mut chain: Vec<ApprovalStep> = steps.into_iter().map(|(step, _)| step).collect();
        chain.sort_by_key(|step| Reverse(step.authority_level));
        chain
    }

    fn requirements<'r>(&'r self, triggered: &'r TriggeredRule) -> impl Iterator<Item = Requirement> + 'r {
        let consequence = triggered.rule.consequence.as_ref();
        let review_only = consequence
            .is_some_and(|consequence| matches!(consequence.action, ConsequenceAction::RequireReview { .. }));
        consequence
            .into_iter()
            .flat_map(|consequence| consequence.action.approvers())
            .map(move |approver| {
                let (identity, person_level) = self.resolve(approver);
                Requirement {
                    identity,
                    level: approver.level.or(person_level).unwrap_or(1),
                    reason: triggered.rule.reason().to_owned(),
                    rule_id: triggered.rule.id.clone(),
                    severity: triggered.severity(),
                    review_only,
                }
            })
    }

    fn resolve(&self, approver: &ApproverRef) -> (ApproverIdentity, Option<u32>) {
        let by_id = approver
            .id
            .as_deref()
            .and_then(|id| self.company.find_by_id(id.trim()));
        let person = by_id.or_else(|| {
            Some(approver.role.trim())
                .filter(|role| !role.is_empty())
                .and_then(|role| self.company.find_by_role(role))
        });

        match person {
            Some(person) => (
                ApproverIdentity::from_person(person, &approver.role),
                Some(person.level),
            ),
            None if approver.role.trim().is_empty() => {
                let id = approver.id.as_deref().unwrap_or_default();
                (ApproverIdentity::role_only(id), None)
            }
            None => (ApproverIdentity::role_only(&approver.role), None),
        }
    }
}
