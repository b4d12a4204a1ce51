//! Graph reasoner: deterministic structural checks with an optional external path.

use std::sync::Arc;
use std::time::Duration;

use governance_config::ReasoningSettings;
use governance_graph::{EdgePredicate, GovernanceContext, Node};
use governance_primitives::Severity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::client::ReasoningClient;
use crate::error::{ClientResult, ReasoningError};
use crate::findings::{AnalysisMethod, Finding, FindingCategory, ReasoningResult};
use crate::summary::SubgraphSummary;

/// Risk score from which fewer than two recorded risks is a contradiction.
const UNSUPPORTED_RISK_SCORE: f64 = 7.0;

/// Which analysis path the caller asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    /// Structural checks only.
    #[default]
    Deterministic,
    /// Try the external collaborator first.
    Enhanced,
}

/// Inspects governance subgraphs for contradictions and gaps.
#[derive(Clone)]
pub struct GraphReasoner {
    settings: ReasoningSettings,
    client: Option<Arc<dyn ReasoningClient>>,
    timeout: Duration,
}

impl std::fmt::Debug for GraphReasoner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphReasoner")
            .field("settings", &self.settings)
            .field("has_client", &self.client.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GraphReasoner {
    /// Creates a reasoner without an external collaborator.
    #[must_use]
    pub fn new(settings: ReasoningSettings) -> Self {
        Self {
            settings,
            client: None,
            timeout: settings.external_timeout(),
        }
    }

    /// Attaches an external collaborator used in [`ReasoningMode::Enhanced`].
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn ReasoningClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the budget for one external call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &ReasoningSettings {
        &self.settings
    }

    /// Analyses `context`.
    ///
    /// In [`ReasoningMode::Enhanced`] the collaborator is tried first; a
    /// missing collaborator, an error, or a timeout all fall back to
    /// [`GraphReasoner::deterministic`], so this never fails.
    pub async fn analyze(&self, context: &GovernanceContext, mode: ReasoningMode) -> ReasoningResult {
        if mode == ReasoningMode::Enhanced {
            match self.external(context).await {
                Ok(result) => return result,
                Err(ReasoningError::NotConfigured) => {
                    debug!(decision_id = %context.decision_id, "no reasoning collaborator; using deterministic analysis");
                }
                Err(err) => {
                    warn!(
                        decision_id = %context.decision_id,
                        error = %err,
                        "external reasoning failed; using deterministic analysis"
                    );
                }
            }
        }
        self.deterministic(context)
    }

    async fn external(&self, context: &GovernanceContext) -> ClientResult<ReasoningResult> {
        let client = self.client.as_ref().ok_or(ReasoningError::NotConfigured)?;
        let summary = SubgraphSummary::from_context(context);
        let mut result = timeout(self.timeout, client.analyze(&summary))
            .await
            .map_err(|_| ReasoningError::Timeout {
                elapsed: self.timeout,
            })??;

        if !result.confidence.is_finite() {
            return Err(ReasoningError::invalid_response("confidence is not a number"));
        }
        result.analysis_method = AnalysisMethod::External;
        result.confidence = result
            .confidence
            .clamp(self.settings.external_confidence_floor(), 1.0);
        result.nodes_analyzed = context.node_count();
        result.edges_analyzed = context.edges.len();
        if result.recommendations.is_empty() {
            let findings: Vec<Finding> = result.findings().cloned().collect();
            result.recommendations =
                ReasoningResult::from_findings(AnalysisMethod::External, findings, 0.0).recommendations;
        }
        debug!(
            decision_id = %context.decision_id,
            findings = result.findings().count(),
            confidence = result.confidence,
            "external reasoning completed"
        );
        Ok(result)
    }

    /// Runs the fixed structural checks.
    ///
    /// Checks need relationships, so a depth-0 or empty context yields no findings.
    #[must_use]
    pub fn deterministic(&self, context: &GovernanceContext) -> ReasoningResult {
        let mut findings = Vec::new();
        match &context.action {
            Some(action) if context.depth > 0 => {
                orphaned_nodes(context, &mut findings);
                missing_ownership(context, action, &mut findings);
                risk_coverage(context, action, &mut findings);
                owner_authority(context, action, &self.settings, &mut findings);
                policy_conflicts(context, &mut findings);
                unsupported_risk_score(context, action, &mut findings);
            }
            _ => debug!(decision_id = %context.decision_id, depth = context.depth, "nothing to analyse"),
        }

        let mut result = ReasoningResult::from_findings(
            AnalysisMethod::Deterministic,
            findings,
            self.settings.deterministic_confidence,
        );
        result.nodes_analyzed = context.node_count();
        result.edges_analyzed = context.edges.len();
        debug!(
            decision_id = %context.decision_id,
            findings = result.findings().count(),
            "deterministic reasoning completed"
        );
        result
    }
}

fn severity_property(node: &Node, key: &str) -> Option<Severity> {
    node.str_property(key).and_then(|value| value.parse().ok())
}

fn orphaned_nodes(context: &GovernanceContext, findings: &mut Vec<Finding>) {
    for node in context.nodes().filter(|node| context.degree(&node.id) == 0) {
        findings.push(
            Finding::new(
                FindingCategory::Ownership,
                "orphaned_node",
                Severity::Medium,
                format!("{} '{}' has no relationships", node.node_type, node.label),
                "Connect or remove disconnected governance entities",
            )
            .with_nodes([node.id.as_str()]),
        );
    }
}

fn missing_ownership(context: &GovernanceContext, action: &Node, findings: &mut Vec<Finding>) {
    if context.owners.is_empty() {
        findings.push(
            Finding::new(
                FindingCategory::Ownership,
                "ownership_missing",
                Severity::Critical,
                "No owners identified for this decision",
                "Assign at least one accountable owner",
            )
            .with_nodes([action.id.as_str()]),
        );
    }
}

fn risk_coverage(context: &GovernanceContext, action: &Node, findings: &mut Vec<Finding>) {
    for risk in &context.risks {
        let mitigated = risk.property("mitigation").is_some()
            || context.has_edge(&action.id, EdgePredicate::Mitigates, &risk.id);
        if mitigated {
            continue;
        }
        let severity = severity_property(risk, "severity").unwrap_or_default();
        let finding = if severity.is_elevated() {
            Finding::new(
                FindingCategory::RiskCoverage,
                "unmitigated_risk",
                severity,
                format!("{severity} risk '{}' has no mitigation plan", risk.label),
                format!("Add a mitigation plan for '{}'", risk.label),
            )
        } else {
            Finding::new(
                FindingCategory::RiskCoverage,
                "missing_mitigation",
                Severity::Low,
                format!("Risk '{}' has no mitigation plan", risk.label),
                "Add specific mitigation actions",
            )
        };
        findings.push(finding.with_nodes([risk.id.as_str()]));
    }
}

fn owner_authority(
    context: &GovernanceContext,
    action: &Node,
    settings: &ReasoningSettings,
    findings: &mut Vec<Finding>,
) {
    if context.approvers.is_empty() || context.owners.is_empty() {
        return;
    }
    let severity = severity_property(action, "governance_severity").unwrap_or(Severity::Low);
    let required = u64::from(settings.required_owner_authority(severity));
    let highest = context
        .owners
        .iter()
        .filter_map(|owner| owner.property("authority_level").and_then(Value::as_u64))
        .max()
        .unwrap_or_default();
    if highest < required {
        findings.push(
            Finding::new(
                FindingCategory::Ownership,
                "insufficient_owner_authority",
                Severity::High,
                format!(
                    "Highest owner authority is {highest} but {severity} governance requires {required}"
                ),
                format!("Assign an owner with authority level {required} or higher"),
            )
            .with_nodes(context.owners.iter().map(|owner| owner.id.as_str())),
        );
    }
}

fn policy_conflicts(context: &GovernanceContext, findings: &mut Vec<Finding>) {
    // role (lowercased) -> (display role, [(policy id, action)])
    let mut by_role: Vec<(String, String, Vec<(&str, &str)>)> = Vec::new();
    for policy in &context.policies {
        let Some(action) = policy.str_property("action") else {
            continue;
        };
        let roles = policy
            .property("approver_roles")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str);
        for role in roles {
            let key = role.trim().to_lowercase();
            match by_role.iter_mut().find(|(existing, _, _)| *existing == key) {
                Some((_, _, entries)) => entries.push((policy.id.as_str(), action)),
                None => by_role.push((key, role.trim().to_owned(), vec![(policy.id.as_str(), action)])),
            }
        }
    }

    for (_, role, entries) in by_role {
        let Some((_, first_action)) = entries.first() else {
            continue;
        };
        if entries.iter().all(|(_, action)| action == first_action) {
            continue;
        }
        let blocks = entries.iter().any(|(_, action)| *action == "block");
        let actions: Vec<String> = entries
            .iter()
            .map(|(id, action)| format!("{id} ({action})"))
            .collect();
        findings.push(
            Finding::new(
                FindingCategory::PolicyConflict,
                "contradictory_policy_actions",
                if blocks { Severity::High } else { Severity::Medium },
                format!("Policies disagree on what {role} must do: {}", actions.join(", ")),
                format!("Reconcile the policies that target {role}"),
            )
            .with_nodes(entries.iter().map(|(id, _)| *id)),
        );
    }
}

fn unsupported_risk_score(context: &GovernanceContext, action: &Node, findings: &mut Vec<Finding>) {
    let score = action
        .property("risk_score")
        .and_then(Value::as_f64)
        .unwrap_or_default();
    if score >= UNSUPPORTED_RISK_SCORE && context.risks.len() < 2 {
        findings.push(
            Finding::new(
                FindingCategory::Contradiction,
                "risk_score_unsupported",
                Severity::High,
                format!(
                    "Risk score is {score} but only {} risks identified",
                    context.risks.len()
                ),
                "Conduct a thorough risk assessment",
            )
            .with_nodes([action.id.as_str()]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use governance_config::{CompanyContext, GovernanceConfig, Person};
    use governance_graph::{Edge, GraphRepository, InMemoryGraphRepository, NodeType};
    use governance_policy::{Condition, Consequence, GovernanceEvaluator, Operator, Rule, RuleSet};
    use governance_primitives::{Decision, DecisionId, Kpi, Owner, Risk};

    fn evaluator() -> GovernanceEvaluator {
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

    async fn context_for(decision: &Decision) -> GovernanceContext {
        let repo = InMemoryGraphRepository::new();
        let id = DecisionId::new("decision_r").unwrap();
        let governance = evaluator().evaluate(decision);
        repo.upsert_decision_graph(decision, &governance, &id)
            .await
            .unwrap();
        repo.get_governance_context(&id, 2).await.unwrap()
    }

    fn codes(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|finding| finding.code.as_str()).collect()
    }

    #[tokio::test]
    async fn detects_orphaned_action_without_owner() {
        let context = context_for(&Decision::builder("Refresh the logo").build()).await;
        let result = GraphReasoner::new(ReasoningSettings::default()).deterministic(&context);

        assert_eq!(codes(&result.ownership_issues), ["orphaned_node", "ownership_missing"]);
        let missing = &result.ownership_issues[1];
        assert!(missing.severity >= Severity::High);
        assert_eq!(result.analysis_method, AnalysisMethod::Deterministic);
        assert!((result.confidence - 0.6).abs() < f64::EPSILON);
        assert_eq!(
            result.recommendations[0].action,
            "Assign at least one accountable owner"
        );
    }

    #[tokio::test]
    async fn flags_weak_owner_and_unmitigated_risks() {
        let decision = Decision::builder("Replatform billing with $600k")
            .owner(Owner::new("Sam", "Engineering Manager"))
            .kpi(Kpi::new("Invoice errors", "< 0.1%"))
            .risk(Risk::new("Data migration loss", Severity::Critical))
            .risk(Risk::new("Training gaps", Severity::Low))
            .build();
        let result = GraphReasoner::new(ReasoningSettings::default())
            .deterministic(&context_for(&decision).await);

        assert_eq!(codes(&result.ownership_issues), ["insufficient_owner_authority"]);
        assert_eq!(codes(&result.risk_gaps), ["unmitigated_risk", "missing_mitigation"]);
        assert_eq!(result.risk_gaps[0].severity, Severity::Critical);
        assert!(result.policy_conflicts.is_empty());
        assert_eq!(result.recommendations[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn reports_contradictory_policy_actions() {
        let repo = InMemoryGraphRepository::new();
        let id = DecisionId::new("decision_p").unwrap();
        let nodes = [
            Node::new(id.as_str(), NodeType::Action, "Launch in France"),
            Node::new("owner", NodeType::Actor, "Sam").with_property("authority_level", 5),
            Node::new("freeze", NodeType::Policy, "EU freeze")
                .with_property("action", "block")
                .with_property("approver_roles", vec!["CFO"]),
            Node::new("budget", NodeType::Policy, "Budget")
                .with_property("action", "require_approval")
                .with_property("approver_roles", vec!["cfo", "CEO"]),
        ];
        for node in nodes {
            repo.add_node(node).await.unwrap();
        }
        for edge in [
            Edge::new("owner", EdgePredicate::Owns, id.as_str()),
            Edge::new(id.as_str(), EdgePredicate::GovernedBy, "freeze"),
            Edge::new(id.as_str(), EdgePredicate::GovernedBy, "budget"),
        ] {
            repo.add_edge(edge).await.unwrap();
        }

        let context = repo.get_governance_context(&id, 1).await.unwrap();
        let result = GraphReasoner::new(ReasoningSettings::default()).deterministic(&context);

        assert_eq!(result.policy_conflicts.len(), 1);
        let conflict = &result.policy_conflicts[0];
        assert_eq!(conflict.severity, Severity::High);
        assert_eq!(conflict.node_ids, ["budget", "freeze"]);
        assert!(result.ownership_issues.is_empty());
    }

    #[tokio::test]
    async fn high_score_with_thin_risk_register_is_a_contradiction() {
        let decision = Decision::builder("Enter a new market")
            .owner(Owner::new("Sam", "COO"))
            .risk(Risk::new("Regulatory exposure", Severity::Critical).with_mitigation("Local counsel"))
            .build();
        let result = GraphReasoner::new(ReasoningSettings::default())
            .deterministic(&context_for(&decision).await);
        assert_eq!(codes(&result.contradictions), ["risk_score_unsupported"]);
        assert!(result.risk_gaps.is_empty());
    }

    struct Failing;

    #[async_trait]
    impl ReasoningClient for Failing {
        async fn analyze(&self, _summary: &SubgraphSummary) -> ClientResult<ReasoningResult> {
            Err(ReasoningError::unavailable("connection refused"))
        }
    }

    struct Slow;

    #[async_trait]
    impl ReasoningClient for Slow {
        async fn analyze(&self, _summary: &SubgraphSummary) -> ClientResult<ReasoningResult> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(ReasoningError::unavailable("unreachable"))
        }
    }

    struct Insightful;

    #[async_trait]
    impl ReasoningClient for Insightful {
        async fn analyze(&self, summary: &SubgraphSummary) -> ClientResult<ReasoningResult> {
            let id = summary.decision.as_ref().map(|decision| decision.id.clone());
            let finding = Finding::new(
                FindingCategory::Contradiction,
                "goal_kpi_mismatch",
                Severity::Medium,
                "KPI does not measure the stated goal",
                "Align the KPI with the goal",
            )
            .with_nodes(id);
            Ok(ReasoningResult::from_findings(AnalysisMethod::Deterministic, vec![finding], 1.4))
        }
    }

    #[tokio::test]
    async fn failures_fall_back_transparently() {
        let context = context_for(&Decision::builder("Refresh the logo").build()).await;
        let baseline = GraphReasoner::new(ReasoningSettings::default()).deterministic(&context);

        let reasoners = [
            GraphReasoner::new(ReasoningSettings::default()),
            GraphReasoner::new(ReasoningSettings::default()).with_client(Arc::new(Failing)),
            GraphReasoner::new(ReasoningSettings::default())
                .with_client(Arc::new(Slow))
                .with_timeout(Duration::from_millis(20)),
        ];
        for reasoner in reasoners {
            let result = reasoner.analyze(&context, ReasoningMode::Enhanced).await;
            assert_eq!(result, baseline);
        }
    }

    #[tokio::test]
    async fn external_results_are_tagged_and_clamped() {
        let context = context_for(&Decision::builder("Refresh the logo").build()).await;
        let reasoner = GraphReasoner::new(ReasoningSettings::default()).with_client(Arc::new(Insightful));

        let result = reasoner.analyze(&context, ReasoningMode::Enhanced).await;
        assert_eq!(result.analysis_method, AnalysisMethod::External);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.nodes_analyzed, 1);
        assert_eq!(codes(&result.contradictions), ["goal_kpi_mismatch"]);

        let deterministic = reasoner.analyze(&context, ReasoningMode::Deterministic).await;
        assert_eq!(deterministic.analysis_method, AnalysisMethod::Deterministic);
    }

    struct Hesitant;

    #[async_trait]
    impl ReasoningClient for Hesitant {
        async fn analyze(&self, _summary: &SubgraphSummary) -> ClientResult<ReasoningResult> {
            Ok(ReasoningResult::from_findings(AnalysisMethod::External, Vec::new(), 0.2))
        }
    }

    #[tokio::test]
    async fn fallback_confidence_stays_below_external() {
        let context = context_for(&Decision::builder("Refresh the logo").build()).await;
        let settings = ReasoningSettings::default();
        let reasoner = GraphReasoner::new(settings).with_client(Arc::new(Hesitant));

        let external = reasoner.analyze(&context, ReasoningMode::Enhanced).await;
        let fallback = reasoner.analyze(&context, ReasoningMode::Deterministic).await;
        assert_eq!(external.analysis_method, AnalysisMethod::External);
        assert!((external.confidence - settings.external_confidence_floor()).abs() < f64::EPSILON);
        assert!(fallback.confidence < external.confidence);
    }

    #[tokio::test]
    async fn depth_zero_context_yields_no_findings() {
        let repo = InMemoryGraphRepository::new();
        let id = DecisionId::new("decision_z").unwrap();
        let decision = Decision::builder("Refresh the logo").build();
        repo.upsert_decision_graph(&decision, &evaluator().evaluate(&decision), &id)
            .await
            .unwrap();

        let context = repo.get_governance_context(&id, 0).await.unwrap();
        let result = GraphReasoner::new(ReasoningSettings::default()).deterministic(&context);
        assert_eq!(result.findings().count(), 0);
        assert_eq!(result.nodes_analyzed, 1);
    }

    #[tokio::test]
    async fn summary_renders_sections() {
        let decision = Decision::builder("Replatform billing with $600k")
            .owner(Owner::new("Sam", "CTO"))
            .risk(Risk::new("Data loss", Severity::High).with_mitigation("Dual writes"))
            .build();
        let summary = SubgraphSummary::from_context(&context_for(&decision).await);
        let text = summary.render();

        assert!(text.starts_with("DECISION: Replatform billing with $600k\n"));
        assert!(text.contains("  - Sam (CTO)\n"));
        assert!(text.contains("  - [high] Data loss\n    Mitigation: Dual writes\n"));
        assert!(text.contains("--[OWNS]--> decision_r"));
        assert_eq!(summary.actors.len(), 3);
    }
}
