//! Flattened view of a governance context handed to reasoning collaborators.

use std::fmt::Write as _;

use governance_graph::{GovernanceContext, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decision facts carried on the Action node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    /// Action node id.
    pub id: String,
    /// Decision statement.
    pub statement: String,
    /// Risk score.
    pub risk_score: f64,
    /// Governance severity label.
    pub governance_severity: Option<String>,
    /// Strategic impact label.
    pub strategic_impact: Option<String>,
    /// Governance status label.
    pub status: Option<String>,
}

/// Role an actor plays relative to the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// Owns the decision.
    Owner,
    /// Must approve the decision.
    Approver,
    /// Reached through other decisions.
    Related,
}

/// Actor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    /// Node id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role title.
    pub role: Option<String>,
    /// Relation to the decision.
    pub kind: ActorKind,
    /// Authority level, when recorded.
    pub authority_level: Option<u64>,
}

/// Policy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    /// Node id.
    pub id: String,
    /// Rule name.
    pub name: String,
    /// Rule description.
    pub description: Option<String>,
    /// Consequence action label.
    pub action: Option<String>,
}

/// Risk entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Node id.
    pub id: String,
    /// Risk description.
    pub description: String,
    /// Severity label.
    pub severity: Option<String>,
    /// Mitigation plan.
    pub mitigation: Option<String>,
}

/// Relationship entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSummary {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Predicate label.
    pub predicate: String,
}

/// Serialisable summary of a [`GovernanceContext`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphSummary {
    /// Decision facts; absent when the context is empty.
    pub decision: Option<DecisionSummary>,
    /// Owners, approvers, then related actors.
    pub actors: Vec<ActorSummary>,
    /// Policies.
    pub policies: Vec<PolicySummary>,
    /// Risks.
    pub risks: Vec<RiskSummary>,
    /// Relationships.
    pub relationships: Vec<RelationshipSummary>,
    /// Hop budget of the traversal.
    pub depth: usize,
}

impl SubgraphSummary {
    /// Summarises `context`.
    #[must_use]
    pub fn from_context(context: &GovernanceContext) -> Self {
        let decision = context.action.as_ref().map(|action| DecisionSummary {
            id: action.id.clone(),
            statement: action
                .str_property("statement")
                .unwrap_or(action.label.as_str())
                .to_owned(),
            risk_score: action
                .property("risk_score")
                .and_then(Value::as_f64)
                .unwrap_or_default(),
            governance_severity: owned_str(action, "governance_severity"),
            strategic_impact: owned_str(action, "strategic_impact"),
            status: owned_str(action, "status"),
        });

        let actors = [
            (ActorKind::Owner, &context.owners),
            (ActorKind::Approver, &context.approvers),
            (ActorKind::Related, &context.actors),
        ]
        .into_iter()
        .flat_map(|(kind, nodes)| {
            nodes.iter().map(move |node| ActorSummary {
                id: node.id.clone(),
                name: node.label.clone(),
                role: owned_str(node, "role"),
                kind,
                authority_level: node.property("authority_level").and_then(Value::as_u64),
            })
        })
        .collect();

        Self {
            decision,
            actors,
            policies: context
                .policies
                .iter()
                .map(|node| PolicySummary {
                    id: node.id.clone(),
                    name: node.label.clone(),
                    description: owned_str(node, "description").filter(|text| !text.is_empty()),
                    action: owned_str(node, "action"),
                })
                .collect(),
            risks: context
                .risks
                .iter()
                .map(|node| RiskSummary {
                    id: node.id.clone(),
                    description: node.label.clone(),
                    severity: owned_str(node, "severity"),
                    mitigation: owned_str(node, "mitigation"),
                })
                .collect(),
            relationships: context
                .edges
                .iter()
                .map(|edge| RelationshipSummary {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    predicate: edge.predicate.as_str().to_owned(),
                })
                .collect(),
            depth: context.depth,
        }
    }

    /// Renders the summary as plain text sections.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.decision {
            Some(decision) => {
                let _ = writeln!(out, "DECISION: {}", decision.statement);
                let _ = writeln!(out, "  Risk Score: {}", decision.risk_score);
                let _ = writeln!(
                    out,
                    "  Strategic Impact: {}",
                    decision.strategic_impact.as_deref().unwrap_or("N/A")
                );
            }
            None => {
                let _ = writeln!(out, "DECISION: N/A");
            }
        }

        if !self.actors.is_empty() {
            let _ = writeln!(out, "\nACTORS (Owners & Approvers):");
            for actor in &self.actors {
                let _ = writeln!(
                    out,
                    "  - {} ({})",
                    actor.name,
                    actor.role.as_deref().unwrap_or("N/A")
                );
            }
        }
        if !self.policies.is_empty() {
            let _ = writeln!(out, "\nPOLICIES (Governance Rules Triggered):");
            for policy in &self.policies {
                let _ = writeln!(
                    out,
                    "  - {}: {}",
                    policy.name,
                    policy.description.as_deref().unwrap_or("N/A")
                );
            }
        }
        if !self.risks.is_empty() {
            let _ = writeln!(out, "\nRISKS:");
            for risk in &self.risks {
                let _ = writeln!(
                    out,
                    "  - [{}] {}",
                    risk.severity.as_deref().unwrap_or("N/A"),
                    risk.description
                );
                if let Some(mitigation) = &risk.mitigation {
                    let _ = writeln!(out, "    Mitigation: {mitigation}");
                }
            }
        }
        if !self.relationships.is_empty() {
            let _ = writeln!(out, "\nRELATIONSHIPS:");
            for relationship in &self.relationships {
                let _ = writeln!(
                    out,
                    "  - {} --[{}]--> {}",
                    relationship.from, relationship.predicate, relationship.to
                );
            }
        }
        out
    }
}

fn owned_str(node: &Node, key: &str) -> Option<String> {
    node.str_property(key).map(str::to_owned)
}
