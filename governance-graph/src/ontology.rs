//! Governance graph ontology and the deterministic decision-to-graph mapping.

use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Display, Formatter};

use governance_policy::GovernanceResult;
use governance_primitives::{Decision, DecisionId, Owner};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// Person or role.
    Actor,
    /// Decision.
    Action,
    /// Governance rule.
    Policy,
    /// Failure vector.
    Risk,
    /// Budget or other asset.
    Resource,
}

impl NodeType {
    /// Returns the type label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Actor => "Actor",
            Self::Action => "Action",
            Self::Policy => "Policy",
            Self::Risk => "Risk",
            Self::Resource => "Resource",
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgePredicate {
    /// Actor owns an Action or Resource.
    Owns,
    /// Action needs sign-off from an Actor.
    RequiresApprovalBy,
    /// Action falls under a Policy.
    GovernedBy,
    /// Action triggers a Risk or Policy.
    Triggers,
    /// Action affects a Resource or Actor.
    Impacts,
    /// Action carries a mitigation for a Risk.
    Mitigates,
}

impl EdgePredicate {
    /// Returns the predicate label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owns => "OWNS",
            Self::RequiresApprovalBy => "REQUIRES_APPROVAL_BY",
            Self::GovernedBy => "GOVERNED_BY",
            Self::Triggers => "TRIGGERS",
            Self::Impacts => "IMPACTS",
            Self::Mitigates => "MITIGATES",
        }
    }

    /// Returns `true` when the ontology allows `source -[self]-> target`.
    #[must_use]
    pub const fn permits(self, source: NodeType, target: NodeType) -> bool {
        use NodeType::{Action, Actor, Policy, Resource, Risk};
        matches!(
            (self, source, target),
            (Self::Owns, Actor, Action | Resource)
                | (Self::RequiresApprovalBy, Action, Actor)
                | (Self::GovernedBy, Action, Policy)
                | (Self::Triggers, Action, Policy | Risk)
                | (Self::Impacts, Action, Resource | Actor)
                | (Self::Mitigates, Action, Risk)
        )
    }
}

impl Display for EdgePredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph node keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier.
    pub id: String,
    /// Node kind.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Human-readable label.
    pub label: String,
    /// JSON-compatible properties.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Node {
    /// Creates a node without properties.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            properties: Map::new(),
        }
    }

    /// Sets a property; `null` values are skipped.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.properties.insert(key.into(), value);
        }
        self
    }

    /// Reads a property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Reads a string property.
    #[must_use]
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }
}

/// Identity of an edge: at most one edge per `(source, predicate, target)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Source node id.
    pub source: String,
    /// Predicate.
    pub predicate: EdgePredicate,
    /// Target node id.
    pub target: String,
}

/// Directed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id.
    #[serde(rename = "from")]
    pub source: String,
    /// Relationship.
    pub predicate: EdgePredicate,
    /// Target node id.
    #[serde(rename = "to")]
    pub target: String,
    /// Optional properties.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Edge {
    /// Creates an edge without properties.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        predicate: EdgePredicate,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            predicate,
            target: target.into(),
            properties: Map::new(),
        }
    }

    /// Sets a property; `null` values are skipped.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.properties.insert(key.into(), value);
        }
        self
    }

    /// Returns the deduplication key.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            predicate: self.predicate,
            target: self.target.clone(),
        }
    }

    /// Returns `true` when `node_id` is either endpoint.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Returns the endpoint opposite `node_id`, if the edge touches it.
    #[must_use]
    pub fn opposite(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Node and edge counts of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Total nodes.
    pub total_nodes: usize,
    /// Total edges.
    pub total_edges: usize,
    /// Nodes per type.
    pub node_counts: BTreeMap<NodeType, usize>,
    /// Edges per predicate.
    pub edge_counts: BTreeMap<EdgePredicate, usize>,
}

impl GraphSummary {
    /// Counts `nodes` and `edges`.
    #[must_use]
    pub fn of<'a>(
        nodes: impl IntoIterator<Item = &'a Node>,
        edges: impl IntoIterator<Item = &'a Edge>,
    ) -> Self {
        let mut summary = Self::default();
        for node in nodes {
            summary.total_nodes += 1;
            *summary.node_counts.entry(node.node_type).or_default() += 1;
        }
        for edge in edges {
            summary.total_edges += 1;
            *summary.edge_counts.entry(edge.predicate).or_default() += 1;
        }
        summary
    }
}

/// Nodes and edges belonging to one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionGraph {
    /// Decision id, also the Action node id.
    pub decision_id: DecisionId,
    /// Nodes, Action first.
    pub nodes: Vec<Node>,
    /// Edges.
    pub edges: Vec<Edge>,
}

impl DecisionGraph {
    /// Returns the Action node.
    #[must_use]
    pub fn action(&self) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.id == self.decision_id.as_str())
    }

    /// Counts nodes and edges.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        GraphSummary::of(&self.nodes, &self.edges)
    }
}

/// Deterministic mapping from a decision and its governance result to graph form.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOntology;

impl GraphOntology {
    /// Derives the full node/edge set for one decision.
    ///
    /// Ids are scoped by the decision id: `{id}` for the Action node,
    /// `{id}_owner_{n}` per distinct owner, `{id}_approver_{level}_{n}` per
    /// approval step, `{id}_risk_{n}` per risk, `{id}_policy_{rule_id}` per
    /// triggered rule, and `{id}_budget` when a budget was detected.
    #[must_use]
    pub fn decision_graph(
        &self,
        decision: &Decision,
        governance: &GovernanceResult,
        decision_id: &DecisionId,
    ) -> DecisionGraph {
        let action_id = decision_id.as_str();
        let mut nodes = vec![action_node(decision, governance, decision_id)];
        let mut edges = Vec::new();

        for (index, owner) in distinct_owners(decision.owners()).enumerate() {
            let id = decision_id.scoped(format_args!("owner_{index}"));
            let label = if owner.name.trim().is_empty() {
                owner.role.clone().unwrap_or_default()
            } else {
                owner.name.clone()
            };
            nodes.push(
                Node::new(&id, NodeType::Actor, label)
                    .with_property("name", owner.name.as_str())
                    .with_property("role", owner.role.clone())
                    .with_property("authority_level", owner.authority_level)
                    .with_property("responsibility", owner.responsibility.clone())
                    .with_property("actor_type", "owner"),
            );
            edges.push(
                Edge::new(id, EdgePredicate::Owns, action_id)
                    .with_property("responsibility", owner.responsibility.clone()),
            );
        }

        for (index, step) in governance.approval_chain.iter().enumerate() {
            let id = decision_id.scoped(format_args!(
                "approver_{}_{index}",
                step.authority_level
            ));
            nodes.push(
                Node::new(&id, NodeType::Actor, step.approver.name.as_str())
                    .with_property("approver_id", step.approver.id.as_str())
                    .with_property("role", step.approver.role.as_str())
                    .with_property("authority_level", step.authority_level)
                    .with_property("actor_type", "approver"),
            );
            edges.push(
                Edge::new(action_id, EdgePredicate::RequiresApprovalBy, id)
                    .with_property("severity", step.severity.as_str())
                    .with_property("reasons", step.reasons.clone())
                    .with_property("rule_ids", step.rule_ids.clone())
                    .with_property("review_only", step.review_only),
            );
        }

        for (index, risk) in decision.risks().iter().enumerate() {
            let id = decision_id.scoped(format_args!("risk_{index}"));
            let mitigation = risk.mitigation();
            nodes.push(
                Node::new(&id, NodeType::Risk, risk.description.as_str())
                    .with_property("description", risk.description.as_str())
                    .with_property("severity", risk.severity.as_str())
                    .with_property("mitigation", mitigation),
            );
            edges.push(
                Edge::new(action_id, EdgePredicate::Triggers, &id)
                    .with_property("severity", risk.severity.as_str())
                    .with_property("has_mitigation", mitigation.is_some()),
            );
            if let Some(mitigation) = mitigation {
                edges.push(
                    Edge::new(action_id, EdgePredicate::Mitigates, id)
                        .with_property("mitigation", mitigation),
                );
            }
        }

        let mut seen_rules = HashSet::new();
        for triggered in &governance.triggered_rules {
            let rule = &triggered.rule;
            if !seen_rules.insert(rule.id.as_str()) {
                continue;
            }
            let id = decision_id.scoped(format_args!("policy_{}", rule.id));
            let (action, roles): (&str, Vec<String>) = rule.consequence.as_ref().map_or_else(
                || ("none", Vec::new()),
                |consequence| {
                    (
                        consequence.action.label(),
                        consequence
                            .action
                            .target_roles()
                            .map(str::to_owned)
                            .collect(),
                    )
                },
            );
            nodes.push(
                Node::new(&id, NodeType::Policy, rule.name.as_str())
                    .with_property("rule_id", rule.id.as_str())
                    .with_property("name", rule.name.as_str())
                    .with_property("description", rule.description.as_str())
                    .with_property("category", rule.category.as_str())
                    .with_property("action", action)
                    .with_property("approver_roles", roles)
                    .with_property("severity", rule.severity().as_str())
                    .with_property("priority", rule.priority)
                    .with_property("reasons", triggered.reasons.clone()),
            );
            edges.push(
                Edge::new(action_id, EdgePredicate::GovernedBy, id)
                    .with_property("rule_name", rule.name.as_str()),
            );
        }

        let budget = governance.derived.normalized_budget;
        if budget > 0.0 {
            let id = decision_id.scoped("budget");
            nodes.push(
                Node::new(&id, NodeType::Resource, "Budget")
                    .with_property("resource_type", "budget")
                    .with_property("amount", budget),
            );
            edges.push(
                Edge::new(action_id, EdgePredicate::Impacts, id).with_property("amount", budget),
            );
        }

        DecisionGraph {
            decision_id: decision_id.clone(),
            nodes,
            edges,
        }
    }
}

fn action_node(decision: &Decision, governance: &GovernanceResult, id: &DecisionId) -> Node {
    Node::new(id.as_str(), NodeType::Action, decision.statement())
        .with_property("statement", decision.statement())
        .with_property("risk_score", governance.risk_score)
        .with_property("risk_level", governance.risk_level.as_str())
        .with_property("status", governance.status.as_str())
        .with_property("confidence", governance.confidence)
        .with_property(
            "strategic_impact",
            decision.strategic_impact().map(|impact| impact.as_str()),
        )
        .with_property("governance_severity", governance.governance_severity().as_str())
        .with_property("requires_human_review", governance.requires_human_review)
        .with_property(
            "counts",
            json!({
                "goals": decision.goals().len(),
                "kpis": decision.kpis().len(),
                "risks": decision.risks().len(),
                "owners": decision.owners().len(),
            }),
        )
}

/// Owners deduplicated by normalised `(name, role)`, first occurrence kept.
fn distinct_owners(owners: &[Owner]) -> impl Iterator<Item = &Owner> {
    let mut seen = HashSet::new();
    owners.iter().filter(move |owner| {
        let name = owner.name.trim().to_lowercase();
        let role = owner
            .role
            .as_deref()
            .map(|role| role.trim().to_lowercase())
            .unwrap_or_default();
        (!name.is_empty() || !role.is_empty()) && seen.insert((name, role))
    })
}
