//! Seam for an external reasoning collaborator.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::findings::ReasoningResult;
use crate::summary::SubgraphSummary;

/// External service that reasons about a governance subgraph.
///
/// Implementations may fail freely: [`crate::GraphReasoner`] bounds every
/// call with a timeout and replaces any failure with deterministic analysis.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Analyses `summary`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ReasoningError`] when the collaborator cannot produce a result.
    async fn analyze(&self, summary: &SubgraphSummary) -> ClientResult<ReasoningResult>;
}
