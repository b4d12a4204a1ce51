//! Graph repository trait and the in-memory implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use governance_policy::GovernanceResult;
use governance_primitives::{Decision, DecisionId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::context::GovernanceContext;
use crate::error::{GraphError, GraphResult};
use crate::ontology::{DecisionGraph, Edge, EdgeKey, GraphOntology, GraphSummary, Node, NodeType};

/// Content-sorted copy of a repository, comparable with `==`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes sorted by id.
    pub nodes: Vec<Node>,
    /// Edges sorted by `(source, predicate, target)`.
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Counts nodes and edges.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        GraphSummary::of(&self.nodes, &self.edges)
    }
}

/// Storage seam for the governance graph.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Inserts or replaces a node by id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EmptyNodeId`] for blank ids, or a backend failure.
    async fn add_node(&self, node: Node) -> GraphResult<Node>;

    /// Inserts or replaces an edge keyed by `(source, predicate, target)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingEndpoint`] when an endpoint is unknown and
    /// [`GraphError::InvalidEdge`] when the ontology forbids the connection.
    async fn add_edge(&self, edge: Edge) -> GraphResult<Edge>;

    /// Writes the graph of `decision`, replacing whatever a previous upsert of
    /// the same id produced.
    ///
    /// # Errors
    ///
    /// Returns a backend failure; the in-memory repository never fails here.
    async fn upsert_decision_graph(
        &self,
        decision: &Decision,
        governance: &GovernanceResult,
        decision_id: &DecisionId,
    ) -> GraphResult<DecisionGraph>;

    /// Returns the subgraph within `depth` hops of the decision's Action node.
    /// Unknown decisions yield an empty context.
    ///
    /// # Errors
    ///
    /// Returns a backend failure; the in-memory repository never fails here.
    async fn get_governance_context(
        &self,
        decision_id: &DecisionId,
        depth: usize,
    ) -> GraphResult<GovernanceContext>;

    /// Looks a node up by id.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn get_node(&self, id: &str) -> GraphResult<Option<Node>>;

    /// Returns up to `limit` nodes of `node_type`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn find_nodes_by_type(&self, node_type: NodeType, limit: usize) -> GraphResult<Vec<Node>>;

    /// Returns the outgoing edges of `source`.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn edges_from(&self, source: &str) -> GraphResult<Vec<Edge>>;

    /// Returns every node and edge in content order.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn snapshot(&self) -> GraphResult<GraphSnapshot>;

    /// Removes everything.
    ///
    /// # Errors
    ///
    /// Returns a backend failure.
    async fn clear(&self) -> GraphResult<()>;
}

#[derive(Debug, Default)]
struct Owned {
    node_ids: BTreeSet<String>,
    edge_keys: BTreeSet<EdgeKey>,
}

#[derive(Debug, Default)]
struct GraphStore {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<EdgeKey, Edge>,
    owned: HashMap<String, Owned>,
}

impl GraphStore {
    fn validate_edge(&self, edge: &Edge) -> GraphResult<()> {
        let endpoint = |id: &str| {
            self.nodes.get(id).ok_or_else(|| GraphError::MissingEndpoint {
                node_id: id.to_owned(),
            })
        };
        let source = endpoint(&edge.source)?;
        let target = endpoint(&edge.target)?;
        if edge.predicate.permits(source.node_type, target.node_type) {
            Ok(())
        } else {
            Err(GraphError::InvalidEdge {
                predicate: edge.predicate,
                source_type: source.node_type,
                target_type: target.node_type,
            })
        }
    }

    fn remove_node(&mut self, id: &str) {
        if self.nodes.remove(id).is_some() {
            self.edges.retain(|_, edge| !edge.touches(id));
        }
    }

    fn replace(&mut self, graph: &DecisionGraph) {
        let key = graph.decision_id.as_str().to_owned();
        let next = Owned {
            node_ids: graph.nodes.iter().map(|node| node.id.clone()).collect(),
            edge_keys: graph.edges.iter().map(Edge::key).collect(),
        };

        if let Some(previous) = self.owned.remove(&key) {
            for edge_key in &previous.edge_keys {
                self.edges.remove(edge_key);
            }
            let stale: Vec<&String> = previous.node_ids.difference(&next.node_ids).collect();
            trace!(decision_id = %key, stale = stale.len(), "replacing decision graph");
            for id in stale {
                self.remove_node(id);
            }
        }

        for node in &graph.nodes {
            self.nodes.insert(node.id.clone(), node.clone());
        }
        for edge in &graph.edges {
            self.edges.insert(edge.key(), edge.clone());
        }
        self.owned.insert(key, next);
    }
}

/// Repository keeping the whole graph in memory behind one lock.
///
/// Writers apply a decision's replace under a single write guard and readers
/// traverse under a single read guard, so a context never mixes two versions
/// of the same decision.
#[derive(Debug, Default)]
pub struct InMemoryGraphRepository {
    ontology: GraphOntology,
    inner: RwLock<GraphStore>,
}

impl InMemoryGraphRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    async fn add_node(&self, node: Node) -> GraphResult<Node> {
        if node.id.trim().is_empty() {
            return Err(GraphError::EmptyNodeId);
        }
        let mut guard = self.inner.write().await;
        guard.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn add_edge(&self, edge: Edge) -> GraphResult<Edge> {
        let mut guard = self.inner.write().await;
        guard.validate_edge(&edge)?;
        guard.edges.insert(edge.key(), edge.clone());
        Ok(edge)
    }

    async fn upsert_decision_graph(
        &self,
        decision: &Decision,
        governance: &GovernanceResult,
        decision_id: &DecisionId,
    ) -> GraphResult<DecisionGraph> {
        let graph = self.ontology.decision_graph(decision, governance, decision_id);
        {
            let mut guard = self.inner.write().await;
            guard.replace(&graph);
        }
        debug!(
            decision_id = %decision_id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "decision graph upserted"
        );
        Ok(graph)
    }

    async fn get_governance_context(
        &self,
        decision_id: &DecisionId,
        depth: usize,
    ) -> GraphResult<GovernanceContext> {
        let guard = self.inner.read().await;
        let context = GovernanceContext::traverse(decision_id, depth, &guard.nodes, guard.edges.values());
        if context.is_empty() {
            debug!(decision_id = %decision_id, "no graph stored for decision");
        }
        Ok(context)
    }

    async fn get_node(&self, id: &str) -> GraphResult<Option<Node>> {
        Ok(self.inner.read().await.nodes.get(id).cloned())
    }

    async fn find_nodes_by_type(&self, node_type: NodeType, limit: usize) -> GraphResult<Vec<Node>> {
        let guard = self.inner.read().await;
        Ok(guard
            .nodes
            .values()
            .filter(|node| node.node_type == node_type)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn edges_from(&self, source: &str) -> GraphResult<Vec<Edge>> {
        let guard = self.inner.read().await;
        Ok(guard
            .edges
            .values()
            .filter(|edge| edge.source == source)
            .cloned()
            .collect())
    }

    async fn snapshot(&self) -> GraphResult<GraphSnapshot> {
        let guard = self.inner.read().await;
        Ok(GraphSnapshot {
            nodes: guard.nodes.values().cloned().collect(),
            edges: guard.edges.values().cloned().collect(),
        })
    }

    async fn clear(&self) -> GraphResult<()> {
        let mut guard = self.inner.write().await;
        *guard = GraphStore::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ontology::EdgePredicate;
    use crate::test_support::evaluator;
    use governance_primitives::{Kpi, Owner, Risk, Severity};

    fn decision(statement: &str) -> Decision {
        Decision::builder(statement)
            .owner(Owner::new("Sam", "CTO"))
            .kpi(Kpi::new("Latency", "p99 < 200ms"))
            .risk(Risk::new("Vendor lock-in", Severity::High))
            .build()
    }

    async fn upsert(repo: &InMemoryGraphRepository, id: &DecisionId, decision: &Decision) -> DecisionGraph {
        let governance = evaluator().evaluate(decision);
        repo.upsert_decision_graph(decision, &governance, id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let repo = InMemoryGraphRepository::new();
        let id = DecisionId::new("decision_a").unwrap();
        let decision = decision("Migrate search with $700k");

        upsert(&repo, &id, &decision).await;
        let first = repo.snapshot().await.unwrap();
        upsert(&repo, &id, &decision).await;
        let second = repo.snapshot().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.summary().node_counts[&NodeType::Policy], 2);
    }

    #[tokio::test]
    async fn upsert_replaces_stale_nodes_and_incident_edges() {
        let repo = InMemoryGraphRepository::new();
        let id = DecisionId::new("decision_b").unwrap();
        upsert(&repo, &id, &decision("Migrate search with $700k")).await;
        repo.add_node(Node::new("auditor", NodeType::Actor, "Auditor"))
            .await
            .unwrap();
        repo.add_edge(Edge::new(id.as_str(), EdgePredicate::Impacts, "auditor"))
            .await
            .unwrap();
        repo.add_edge(Edge::new(id.as_str(), EdgePredicate::Impacts, "decision_b_budget"))
            .await
            .unwrap();

        upsert(&repo, &id, &decision("Tune search relevance")).await;

        assert!(repo.get_node("decision_b_budget").await.unwrap().is_none());
        assert!(repo.get_node("decision_b_policy_R5").await.unwrap().is_none());
        let outgoing = repo.edges_from(id.as_str()).await.unwrap();
        assert!(outgoing.iter().all(|edge| edge.target != "decision_b_budget"));
        assert!(outgoing.iter().any(|edge| edge.target == "auditor"));
        assert_eq!(
            repo.get_node(id.as_str()).await.unwrap().map(|node| node.label),
            Some("Tune search relevance".to_owned())
        );
    }

    #[tokio::test]
    async fn context_respects_depth_and_terminates_on_cycles() {
        let repo = InMemoryGraphRepository::new();
        let first = DecisionId::new("decision_c").unwrap();
        let second = DecisionId::new("decision_d").unwrap();
        upsert(&repo, &first, &decision("Open a Berlin office")).await;
        upsert(&repo, &second, &decision("Hire in Berlin")).await;
        // Two actions impacting each other's owners close a cycle.
        repo.add_edge(Edge::new(first.as_str(), EdgePredicate::Impacts, "decision_d_owner_0"))
            .await
            .unwrap();
        repo.add_edge(Edge::new(second.as_str(), EdgePredicate::Impacts, "decision_c_owner_0"))
            .await
            .unwrap();

        let shallow = repo.get_governance_context(&first, 1).await.unwrap();
        assert!(shallow.node_depths.values().all(|&hops| hops <= 1));
        assert!(shallow.node("decision_d").is_none());
        assert_eq!(shallow.owners.len(), 1);

        let deep = repo.get_governance_context(&first, 10).await.unwrap();
        assert_eq!(deep.node_depths.get("decision_d"), Some(&2));
        assert_eq!(deep.node_count(), repo.snapshot().await.unwrap().nodes.len());
        assert_eq!(deep.edges.len(), repo.snapshot().await.unwrap().edges.len());
    }

    #[tokio::test]
    async fn groups_context_nodes_by_role() {
        let repo = InMemoryGraphRepository::new();
        let id = DecisionId::new("decision_e").unwrap();
        upsert(&repo, &id, &decision("Acquire a startup for $2M")).await;

        let context = repo.get_governance_context(&id, 2).await.unwrap();
        assert_eq!(context.owners.len(), 1);
        assert_eq!(context.approvers.len(), 2);
        assert_eq!(context.risks.len(), 1);
        assert_eq!(context.policies.len(), 2);
        assert_eq!(context.resources.len(), 1);
        assert!(context.has_edge("decision_e_owner_0", EdgePredicate::Owns, "decision_e"));
        assert_eq!(context.degree("decision_e"), context.edges.len());
    }

    #[tokio::test]
    async fn unknown_decision_yields_empty_context() {
        let repo = InMemoryGraphRepository::new();
        let context = repo
            .get_governance_context(&DecisionId::new("missing").unwrap(), 3)
            .await
            .unwrap();
        assert!(context.is_empty());
        assert_eq!(context.node_count(), 0);
    }

    #[tokio::test]
    async fn add_edge_validates_endpoints_and_ontology() {
        let repo = InMemoryGraphRepository::new();
        repo.add_node(Node::new("act", NodeType::Action, "Act")).await.unwrap();
        repo.add_node(Node::new("risk", NodeType::Risk, "Risk")).await.unwrap();

        let missing = repo
            .add_edge(Edge::new("act", EdgePredicate::Triggers, "ghost"))
            .await;
        assert!(matches!(missing, Err(GraphError::MissingEndpoint { node_id }) if node_id == "ghost"));

        let invalid = repo
            .add_edge(Edge::new("risk", EdgePredicate::Owns, "act"))
            .await;
        assert!(matches!(invalid, Err(GraphError::InvalidEdge { .. })));

        let blank = repo.add_node(Node::new(" ", NodeType::Actor, "nobody")).await;
        assert!(matches!(blank, Err(GraphError::EmptyNodeId)));

        repo.add_edge(Edge::new("act", EdgePredicate::Triggers, "risk"))
            .await
            .unwrap();
        repo.add_edge(Edge::new("act", EdgePredicate::Triggers, "risk").with_property("weight", 2))
            .await
            .unwrap();
        let edges = repo.edges_from("act").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].properties["weight"], 2);

        assert_eq!(repo.find_nodes_by_type(NodeType::Risk, 5).await.unwrap().len(), 1);
        repo.clear().await.unwrap();
        assert_eq!(repo.snapshot().await.unwrap(), GraphSnapshot::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_observe_a_partial_replace() {
        let id = DecisionId::new("decision_swap").unwrap();
        let large = decision("Migrate search with $700k");
        let small = decision("Tune search relevance");

        let mut expected = Vec::new();
        for version in [&large, &small] {
            let isolated = InMemoryGraphRepository::new();
            upsert(&isolated, &id, version).await;
            expected.push(isolated.get_governance_context(&id, 2).await.unwrap());
        }
        assert_ne!(expected[0], expected[1]);

        let repo = Arc::new(InMemoryGraphRepository::new());
        upsert(&repo, &id, &large).await;

        let writer = {
            let repo = Arc::clone(&repo);
            let id = id.clone();
            tokio::spawn(async move {
                for round in 0..200 {
                    let version = if round % 2 == 0 { &small } else { &large };
                    upsert(&repo, &id, version).await;
                    tokio::task::yield_now().await;
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let id = id.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    for _ in 0..200 {
                        seen.push(repo.get_governance_context(&id, 2).await.unwrap());
                        tokio::task::yield_now().await;
                    }
                    seen
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            for context in reader.await.unwrap() {
                assert!(context == expected[0] || context == expected[1]);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_for_different_ids_stay_isolated() {
        let statements = [
            "Migrate search with $700k",
            "Tune search relevance",
            "Open a Lisbon office for $1.2M",
            "Renew the CRM licence",
        ];
        let repo = Arc::new(InMemoryGraphRepository::new());
        let tasks: Vec<_> = statements
            .iter()
            .enumerate()
            .map(|(index, statement)| {
                let repo = Arc::clone(&repo);
                let id = DecisionId::new(format!("decision_iso{index}")).unwrap();
                let version = decision(statement);
                tokio::spawn(async move {
                    upsert(&repo, &id, &version).await;
                    repo.get_governance_context(&id, 2).await.unwrap()
                })
            })
            .collect();

        for (index, task) in tasks.into_iter().enumerate() {
            let shared = task.await.unwrap();
            let id = DecisionId::new(format!("decision_iso{index}")).unwrap();
            let isolated = InMemoryGraphRepository::new();
            upsert(&isolated, &id, &decision(statements[index])).await;
            assert_eq!(shared, isolated.get_governance_context(&id, 2).await.unwrap());
        }
    }
}
