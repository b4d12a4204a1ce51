//! Error types for graph repositories.

use thiserror::Error;

use crate::ontology::{EdgePredicate, NodeType};

/// Errors emitted by graph repositories.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Edge endpoint does not exist.
    #[error("edge endpoint `{node_id}` does not exist")]
    MissingEndpoint {
        /// Missing node id.
        node_id: String,
    },
    /// Edge connects node types the ontology does not relate with this predicate.
    #[error("{predicate} cannot connect {source_type} to {target_type}")]
    InvalidEdge {
        /// Predicate of the rejected edge.
        predicate: EdgePredicate,
        /// Source node type.
        source_type: NodeType,
        /// Target node type.
        target_type: NodeType,
    },
    /// Node with an empty id.
    #[error("node id cannot be empty")]
    EmptyNodeId,
    /// Backend failure of a non-local repository.
    #[error("graph backend failure: {reason}")]
    Backend {
        /// Human-readable reason.
        reason: String,
    },
}

impl GraphError {
    /// Helper to construct backend errors from string-like values.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
