//! Bounded-depth governance context around a decision's Action node.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use governance_primitives::DecisionId;
use serde::{Deserialize, Serialize};

use crate::ontology::{Edge, EdgePredicate, GraphSummary, Node, NodeType};

/// Subgraph reachable from an Action node within a hop budget, grouped by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceContext {
    /// Decision the traversal started from.
    pub decision_id: DecisionId,
    /// Hop budget used.
    pub depth: usize,
    /// The Action node; absent for unknown decisions.
    pub action: Option<Node>,
    /// Actors with an OWNS edge into the Action node.
    pub owners: Vec<Node>,
    /// Actors the Action node requires approval from.
    pub approvers: Vec<Node>,
    /// Any other reachable actors.
    pub actors: Vec<Node>,
    /// Reachable risks.
    pub risks: Vec<Node>,
    /// Reachable policies.
    pub policies: Vec<Node>,
    /// Reachable resources.
    pub resources: Vec<Node>,
    /// Edges whose endpoints were both reached.
    pub edges: Vec<Edge>,
    /// Hop distance of every reached node.
    pub node_depths: BTreeMap<String, usize>,
}

impl GovernanceContext {
    /// Context for a decision the repository does not know.
    #[must_use]
    pub fn empty(decision_id: DecisionId, depth: usize) -> Self {
        Self {
            decision_id,
            depth,
            action: None,
            owners: Vec::new(),
            approvers: Vec::new(),
            actors: Vec::new(),
            risks: Vec::new(),
            policies: Vec::new(),
            resources: Vec::new(),
            edges: Vec::new(),
            node_depths: BTreeMap::new(),
        }
    }

    /// Runs a breadth-first traversal that ignores edge direction.
    ///
    /// `nodes` and `edges` are the full store; every node is visited at most
    /// once so cycles terminate, and no node farther than `depth` hops is kept.
    pub(crate) fn traverse<'a>(
        decision_id: &DecisionId,
        depth: usize,
        nodes: &'a BTreeMap<String, Node>,
        edges: impl IntoIterator<Item = &'a Edge>,
    ) -> Self {
        let Some(action) = nodes.get(decision_id.as_str()) else {
            return Self::empty(decision_id.clone(), depth);
        };

        let mut adjacency: HashMap<&str, Vec<&Edge>> = HashMap::new();
        for edge in edges {
            adjacency.entry(edge.source.as_str()).or_default().push(edge);
            if edge.target != edge.source {
                adjacency.entry(edge.target.as_str()).or_default().push(edge);
            }
        }

        let mut depths: HashMap<&str, usize> = HashMap::from([(action.id.as_str(), 0)]);
        let mut order: Vec<&str> = vec![action.id.as_str()];
        let mut queue = VecDeque::from([(action.id.as_str(), 0_usize)]);
        while let Some((current, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }
            for edge in adjacency.get(current).into_iter().flatten() {
                let Some(next) = edge.opposite(current) else {
                    continue;
                };
                if depths.contains_key(next) || !nodes.contains_key(next) {
                    continue;
                }
                depths.insert(next, hops + 1);
                order.push(next);
                queue.push_back((next, hops + 1));
            }
        }

        let action_id = action.id.as_str();
        let mut seen_edges: Vec<&Edge> = Vec::new();
        let mut seen_keys: HashSet<(&str, EdgePredicate, &str)> = HashSet::new();
        let mut owners: HashSet<&str> = HashSet::new();
        let mut approvers: HashSet<&str> = HashSet::new();
        for id in &order {
            for edge in adjacency.get(id).into_iter().flatten() {
                let (source, target) = (edge.source.as_str(), edge.target.as_str());
                if !depths.contains_key(source)
                    || !depths.contains_key(target)
                    || !seen_keys.insert((source, edge.predicate, target))
                {
                    continue;
                }
                match edge.predicate {
                    EdgePredicate::Owns if target == action_id => {
                        owners.insert(source);
                    }
                    EdgePredicate::RequiresApprovalBy if source == action_id => {
                        approvers.insert(target);
                    }
                    _ => {}
                }
                seen_edges.push(*edge);
            }
        }

        let mut context = Self::empty(decision_id.clone(), depth);
        context.action = Some(action.clone());
        for id in order.iter().skip(1) {
            let Some(node) = nodes.get(*id) else {
                continue;
            };
            let bucket = match node.node_type {
                NodeType::Actor if owners.contains(id) => &mut context.owners,
                NodeType::Actor if approvers.contains(id) => &mut context.approvers,
                NodeType::Actor | NodeType::Action => &mut context.actors,
                NodeType::Risk => &mut context.risks,
                NodeType::Policy => &mut context.policies,
                NodeType::Resource => &mut context.resources,
            };
            bucket.push(node.clone());
        }
        context.edges = seen_edges.into_iter().cloned().collect();
        context.node_depths = depths
            .into_iter()
            .map(|(id, hops)| (id.to_owned(), hops))
            .collect();
        context
    }

    /// Returns `true` when the decision was not found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.action.is_none()
    }

    /// Iterates every reached node, Action node first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.action.iter().chain(
            self.owners
                .iter()
                .chain(&self.approvers)
                .chain(&self.actors)
                .chain(&self.risks)
                .chain(&self.policies)
                .chain(&self.resources),
        )
    }

    /// Number of reached nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_depths.len()
    }

    /// Finds a reached node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes().find(|node| node.id == id)
    }

    /// Number of context edges touching `id`.
    #[must_use]
    pub fn degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.touches(id)).count()
    }

    /// Returns `true` when an edge `source -[predicate]-> target` was reached.
    #[must_use]
    pub fn has_edge(&self, source: &str, predicate: EdgePredicate, target: &str) -> bool {
        self.edges.iter().any(|edge| {
            edge.predicate == predicate && edge.source == source && edge.target == target
        })
    }

    /// Counts reached nodes and edges.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        GraphSummary::of(self.nodes(), &self.edges)
    }
}
