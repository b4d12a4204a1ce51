//! Deterministic decision pack assembly.

use governance_policy::{ApprovalStep, GovernanceFlag, GovernanceResult, GovernanceStatus};
use governance_primitives::{Decision, Severity};
use governance_reasoning::ReasoningResult;
use tracing::{debug, warn};

use crate::pack::{
    AuditRule, DecisionPack, GoalsAndKpis, MissingItem, PackApproval, PackAudit, PackSummary,
};
use crate::template::PackTemplate;

/// Longest statement kept in a title before it is cut with `...`.
pub const TITLE_MAX_CHARS: usize = 80;

const UNTITLED: &str = "Untitled decision";

const TITLE_PREFIXED: PackTemplate = PackTemplate::new("[{{impact}}] {{statement}}");
const HEADLINE: PackTemplate =
    PackTemplate::new("{{status}}: {{risk_level}} risk (score {{risk_score}}), confidence {{confidence}}");
const RULE_RATIONALE: PackTemplate = PackTemplate::new("{{name}}: {{description}}");
const APPROVAL_RATIONALE: PackTemplate = PackTemplate::new("{{role}} - {{reason}}");
const UNMITIGATED_CRITICAL: PackTemplate =
    PackTemplate::new("Add mitigation plans for critical risks: {{risks}}");
const REQUEST_APPROVALS: PackTemplate = PackTemplate::new("Request approvals: {{approvers}}");
const REQUEST_REVIEWS: PackTemplate = PackTemplate::new("Request reviews: {{reviewers}}");
const RESOLVE_BLOCKS: PackTemplate = PackTemplate::new("Resolve policy blocks raised by {{rules}}");

/// Assembles [`DecisionPack`]s from fixed templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionPackBuilder;

impl DecisionPackBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the pack. Pure and deterministic; every section is present even
    /// for an empty decision.
    #[must_use]
    pub fn build(
        &self,
        decision: &Decision,
        governance: &GovernanceResult,
        reasoning: Option<&ReasoningResult>,
    ) -> DecisionPack {
        let missing_items = missing_items(decision);
        let approval_chain = approval_chain(governance);
        let recommended_next_actions =
            next_actions(decision, governance, &missing_items, reasoning);

        let pack = DecisionPack {
            title: title(decision),
            summary: PackSummary {
                decision_statement: decision.statement().to_owned(),
                headline: fill(
                    &HEADLINE,
                    &[
                        ("status", governance.status.as_str()),
                        ("risk_level", governance.risk_level.as_str()),
                        ("risk_score", &format!("{:.1}", governance.risk_score)),
                        ("confidence", &format!("{:.2}", governance.confidence)),
                    ],
                ),
                status: governance.status,
                risk_level: governance.risk_level,
                confidence: governance.confidence,
                strategic_impact: decision
                    .strategic_impact()
                    .map_or("not_specified", Severity::as_str)
                    .to_owned(),
                human_approval_required: governance.requires_human_review,
            },
            goals_kpis: GoalsAndKpis {
                goals: decision.goals().to_vec(),
                kpis: decision.kpis().to_vec(),
            },
            risks: decision.risks().to_vec(),
            owners: decision.owners().to_vec(),
            assumptions: decision.assumptions().to_vec(),
            missing_items,
            approval_chain,
            recommended_next_actions,
            audit: audit(governance),
            graph_reasoning: reasoning.cloned(),
        };
        debug!(
            title = %pack.title,
            missing = pack.missing_items.len(),
            actions = pack.recommended_next_actions.len(),
            "decision pack built"
        );
        pack
    }
}

/// Renders a built-in template; a failure leaves the raw template text.
fn fill(template: &PackTemplate, vars: &[(&str, &str)]) -> String {
    template.render(vars).unwrap_or_else(|err| {
        warn!(template = template.source(), error = %err, "pack template failed to render");
        template.source().to_owned()
    })
}

fn title(decision: &Decision) -> String {
    let statement = decision.statement().trim();
    if statement.is_empty() {
        return UNTITLED.to_owned();
    }
    let mut truncated: String = statement.chars().take(TITLE_MAX_CHARS).collect();
    if statement.chars().count() > TITLE_MAX_CHARS {
        truncated.push_str("...");
    }
    match decision.strategic_impact() {
        Some(impact) if impact.is_elevated() => fill(
            &TITLE_PREFIXED,
            &[
                ("impact", &impact.as_str().to_uppercase()),
                ("statement", &truncated),
            ],
        ),
        _ => truncated,
    }
}

fn missing_items(decision: &Decision) -> Vec<MissingItem> {
    [
        (decision.owners().is_empty(), MissingItem::NoOwner),
        (decision.kpis().is_empty(), MissingItem::NoKpis),
        (decision.risks().is_empty(), MissingItem::NoRisks),
        (
            decision.unmitigated(Severity::Critical).next().is_some(),
            MissingItem::NoCriticalMitigations,
        ),
        (decision.goals().is_empty(), MissingItem::NoGoals),
    ]
    .into_iter()
    .filter_map(|(missing, item)| missing.then_some(item))
    .collect()
}

fn approval_chain(governance: &GovernanceResult) -> Vec<PackApproval> {
    governance
        .approval_chain
        .iter()
        .enumerate()
        .map(|(index, step)| PackApproval {
            order: index + 1,
            approver: step.approver.name.clone(),
            role: step.approver.role.clone(),
            authority_level: step.authority_level,
            required: !step.review_only,
            rationale: step.reasons.join("; "),
            rule_ids: step.rule_ids.clone(),
        })
        .collect()
}

fn audit(governance: &GovernanceResult) -> PackAudit {
    let mut rationales = Vec::new();
    for triggered in &governance.triggered_rules {
        let rule = &triggered.rule;
        let rationale = if rule.description.trim().is_empty() {
            rule.name.clone()
        } else {
            fill(
                &RULE_RATIONALE,
                &[("name", &rule.name), ("description", &rule.description)],
            )
        };
        push_unique(&mut rationales, rationale);
    }
    for step in &governance.approval_chain {
        for reason in &step.reasons {
            push_unique(
                &mut rationales,
                fill(
                    &APPROVAL_RATIONALE,
                    &[("role", &step.approver.role), ("reason", reason)],
                ),
            );
        }
    }

    PackAudit {
        flags: governance.flags.clone(),
        triggered_rules: governance
            .triggered_rules
            .iter()
            .map(|triggered| AuditRule {
                rule_id: triggered.rule.id.clone(),
                name: triggered.rule.name.clone(),
                description: triggered.rule.description.clone(),
                severity: triggered.severity(),
                reasons: triggered.reasons.clone(),
            })
            .collect(),
        rationales,
        risk_score: governance.risk_score,
        completeness_issues: governance.completeness_issues.clone(),
    }
}

fn next_actions(
    decision: &Decision,
    governance: &GovernanceResult,
    missing_items: &[MissingItem],
    reasoning: Option<&ReasoningResult>,
) -> Vec<String> {
    let mut actions = Vec::new();
    if governance.status == GovernanceStatus::Blocked {
        push_unique(&mut actions, "Resolve blocking issues before proceeding".to_owned());
    }
    if !decision.has_statement() {
        push_unique(&mut actions, "State the decision explicitly".to_owned());
    }

    for item in missing_items {
        let action = match item {
            MissingItem::NoOwner => "Assign an accountable owner".to_owned(),
            MissingItem::NoKpis => "Define a measurable KPI and target".to_owned(),
            MissingItem::NoRisks => "Add a risk assessment with mitigations".to_owned(),
            MissingItem::NoCriticalMitigations => {
                let risks: Vec<&str> = decision
                    .unmitigated(Severity::Critical)
                    .map(|risk| risk.description.as_str())
                    .collect();
                fill(&UNMITIGATED_CRITICAL, &[("risks", &risks.join(", "))])
            }
            MissingItem::NoGoals => "Define the goals this decision serves".to_owned(),
        };
        push_unique(&mut actions, action);
    }

    let (reviews, approvals): (Vec<_>, Vec<_>) = governance
        .approval_chain
        .iter()
        .partition(|step| step.review_only);
    let describe = |steps: &[&ApprovalStep]| {
        steps
            .iter()
            .map(|step| format!("{} ({})", step.approver.name, step.approver.role))
            .collect::<Vec<_>>()
            .join(", ")
    };
    if !approvals.is_empty() {
        push_unique(
            &mut actions,
            fill(&REQUEST_APPROVALS, &[("approvers", &describe(approvals.as_slice()))]),
        );
    }
    if !reviews.is_empty() {
        push_unique(
            &mut actions,
            fill(&REQUEST_REVIEWS, &[("reviewers", &describe(reviews.as_slice()))]),
        );
    }

    for flag in &governance.flags {
        let action = match flag {
            GovernanceFlag::PrivacyReviewRequired => "Initiate a privacy and data-protection review".to_owned(),
            GovernanceFlag::FinancialThresholdExceeded => {
                "Confirm budget justification with finance".to_owned()
            }
            GovernanceFlag::MajorInvestment => "Prepare a financial impact analysis".to_owned(),
            GovernanceFlag::LowConfidence => "Verify the extracted decision details".to_owned(),
            GovernanceFlag::PolicyBlock => {
                let rules: Vec<&str> = governance.triggered_rule_ids().collect();
                fill(&RESOLVE_BLOCKS, &[("rules", &rules.join(", "))])
            }
            _ => continue,
        };
        push_unique(&mut actions, action);
    }

    for recommendation in reasoning.into_iter().flat_map(|result| &result.recommendations) {
        push_unique(&mut actions, recommendation.action.clone());
    }

    if actions.is_empty() && governance.status == GovernanceStatus::Approved {
        actions.push("Proceed with execution after final review".to_owned());
    }
    actions
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governance_config::{CompanyContext, GovernanceConfig, Person};
    use governance_policy::{Condition, Consequence, GovernanceEvaluator, Operator, Rule, RuleSet};
    use governance_primitives::{Goal, Kpi, Owner, Risk};
    use governance_reasoning::{AnalysisMethod, Finding, FindingCategory};

    fn evaluator() -> GovernanceEvaluator {
        GovernanceEvaluator::new(
            GovernanceConfig::default(),
            RuleSet::new(vec![
                Rule::new("R1", "Budget", Condition::predicate("cost", Operator::Gt, 100_000))
                    .with_description("Budget over $100k")
                    .with_priority(1)
                    .with_consequence(Consequence::require_approval(["CFO"], Severity::Medium)),
                Rule::new("R5", "Large budget", Condition::predicate("cost", Operator::Gt, 500_000))
                    .with_description("Budget over $500k")
                    .with_priority(2)
                    .with_consequence(Consequence::require_approval(["CFO", "CEO"], Severity::High)),
            ]),
            CompanyContext::new(vec![
                Person::new("P001", "Avery", "CEO", 5),
                Person::new("P003", "Jordan", "CFO", 4),
            ]),
        )
    }

    #[test]
    fn budget_decision_lists_gaps_and_approvals() {
        let decision = Decision::builder("Hire a data team for $600k")
            .owner(Owner::new("Sam", "CTO"))
            .build();
        let governance = evaluator().evaluate(&decision);
        let pack = DecisionPackBuilder::new().build(&decision, &governance, None);

        let labels: Vec<&str> = pack.missing_item_labels().collect();
        assert_eq!(labels, ["no KPIs", "no risks", "no goals"]);
        assert_eq!(pack.approval_chain.len(), 2);
        assert_eq!(pack.approval_chain[0].role, "CEO");
        assert_eq!(pack.approval_chain[1].rationale, "Budget over $100k; Budget over $500k");
        assert!(pack
            .recommended_next_actions
            .contains(&"Request approvals: Avery (CEO), Jordan (CFO)".to_owned()));
        assert_eq!(
            pack.audit.rationales[..2],
            ["Budget: Budget over $100k", "Large budget: Budget over $500k"]
        );
        assert!(pack.audit.rationales.contains(&"CFO - Budget over $500k".to_owned()));
        assert!(pack.summary.headline.starts_with("NEEDS_APPROVAL: "));
    }

    #[test]
    fn empty_decision_still_yields_a_complete_pack() {
        let decision = Decision::default();
        let governance = evaluator().evaluate(&decision);
        let pack = DecisionPackBuilder::new().build(&decision, &governance, None);

        assert_eq!(pack.title, "Untitled decision");
        assert_eq!(pack.summary.status, GovernanceStatus::Blocked);
        assert_eq!(pack.summary.strategic_impact, "not_specified");
        assert_eq!(pack.missing_items.len(), 4);
        assert!(pack.approval_chain.is_empty());
        assert_eq!(
            pack.recommended_next_actions[..3],
            [
                "Resolve blocking issues before proceeding",
                "State the decision explicitly",
                "Assign an accountable owner"
            ]
        );
        assert_eq!(pack.audit.completeness_issues.len(), 5);
        let value = serde_json::to_value(&pack).unwrap();
        assert!(value["graph_reasoning"].is_null());
    }

    #[test]
    fn titles_are_prefixed_and_truncated() {
        let long = "Consolidate every regional warehouse into two automated hubs across the northern territories";
        let decision = Decision::builder(long)
            .strategic_impact(Severity::Critical)
            .build();
        let title = title(&decision);

        assert!(title.starts_with("[CRITICAL] Consolidate"));
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), "[CRITICAL] ".len() + TITLE_MAX_CHARS + 3);

        let modest = Decision::builder("Tidy the wiki")
            .strategic_impact(Severity::Medium)
            .build();
        assert_eq!(super::title(&modest), "Tidy the wiki");
    }

    #[test]
    fn approved_decision_gets_default_action_and_reasoning_is_embedded() {
        let decision = Decision::builder("Refresh the onboarding copy")
            .goal(Goal::new("Improve activation"))
            .kpi(Kpi::new("Activation", "40%"))
            .risk(Risk::new("Tone mismatch", Severity::Low).with_mitigation("Copy review"))
            .owner(Owner::new("Sam", "Head of Product"))
            .build();
        let governance = evaluator().evaluate(&decision);
        let builder = DecisionPackBuilder::new();

        let pack = builder.build(&decision, &governance, None);
        assert!(pack.missing_items.is_empty());
        assert_eq!(
            pack.recommended_next_actions,
            ["Proceed with execution after final review"]
        );

        let reasoning = ReasoningResult::from_findings(
            AnalysisMethod::Deterministic,
            vec![Finding::new(
                FindingCategory::RiskCoverage,
                "missing_mitigation",
                Severity::Low,
                "Risk has no plan",
                "Add specific mitigation actions",
            )],
            0.6,
        );
        let pack = builder.build(&decision, &governance, Some(&reasoning));
        assert_eq!(pack.recommended_next_actions, ["Add specific mitigation actions"]);
        assert_eq!(pack.graph_reasoning, Some(reasoning));
    }

    #[test]
    fn unmitigated_critical_risks_are_named() {
        let decision = Decision::builder("Switch payment processor")
            .owner(Owner::new("Sam", "CFO"))
            .risk(Risk::new("Settlement outage", Severity::Critical))
            .build();
        let governance = evaluator().evaluate(&decision);
        let pack = DecisionPackBuilder::new().build(&decision, &governance, None);

        assert!(pack.missing_items.contains(&MissingItem::NoCriticalMitigations));
        assert!(pack
            .recommended_next_actions
            .contains(&"Add mitigation plans for critical risks: Settlement outage".to_owned()));
    }

    #[test]
    fn built_in_templates_render() {
        for template in [
            TITLE_PREFIXED,
            HEADLINE,
            RULE_RATIONALE,
            APPROVAL_RATIONALE,
            UNMITIGATED_CRITICAL,
            REQUEST_APPROVALS,
            REQUEST_REVIEWS,
            RESOLVE_BLOCKS,
        ] {
            let vars: Vec<(&str, &str)> = template.variables().into_iter().map(|name| (name, "x")).collect();
            assert!(template.render(&vars).is_ok(), "{template}");
        }
    }
}
