//! End-to-end processing of decisions.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use governance_graph::{DecisionGraph, GovernanceContext, GraphError, GraphRepository};
use governance_pack::{DecisionPack, DecisionPackBuilder};
use governance_policy::{GovernanceEvaluator, GovernanceResult};
use governance_primitives::{Decision, DecisionId};
use governance_reasoning::{GraphReasoner, ReasoningMode, ReasoningResult};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::observer::{GovernanceObserver, TracingGovernanceObserver};
use crate::scheduler::{SchedulerError, SchedulerResult, TaskScheduler};

/// Errors raised while processing a decision.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The graph repository failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The batch scheduler refused or dropped the task.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// A batch task panicked or was cancelled.
    #[error("pipeline task failed: {reason}")]
    Join {
        /// Join error message.
        reason: String,
    },
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything produced for one decision.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Id the decision was stored under.
    pub decision_id: DecisionId,
    /// Governance evaluation.
    pub governance: GovernanceResult,
    /// Graph written for the decision.
    pub graph: DecisionGraph,
    /// Context read back for reasoning.
    pub context: GovernanceContext,
    /// Reasoning result.
    pub reasoning: ReasoningResult,
    /// Decision pack.
    pub pack: DecisionPack,
}

/// Runs evaluate, upsert, context retrieval, reasoning, and pack assembly.
///
/// The pipeline is cheap to clone; clones share the repository, the
/// observer, and the scheduler's permits.
#[derive(Clone)]
pub struct DecisionPipeline {
    evaluator: Arc<GovernanceEvaluator>,
    repository: Arc<dyn GraphRepository>,
    reasoner: Arc<GraphReasoner>,
    packs: DecisionPackBuilder,
    observer: Arc<dyn GovernanceObserver>,
    scheduler: TaskScheduler,
    mode: ReasoningMode,
    context_depth: usize,
}

impl fmt::Debug for DecisionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionPipeline")
            .field("reasoner", &self.reasoner)
            .field("scheduler", &self.scheduler)
            .field("mode", &self.mode)
            .field("context_depth", &self.context_depth)
            .finish_non_exhaustive()
    }
}

impl DecisionPipeline {
    /// Creates a pipeline. Reasoner settings and context depth come from the
    /// evaluator's configuration; outcomes are logged through
    /// [`TracingGovernanceObserver`].
    #[must_use]
    pub fn new(evaluator: GovernanceEvaluator, repository: Arc<dyn GraphRepository>) -> Self {
        let config = *evaluator.config();
        Self {
            evaluator: Arc::new(evaluator),
            repository,
            reasoner: Arc::new(GraphReasoner::new(config.reasoning)),
            packs: DecisionPackBuilder::new(),
            observer: Arc::new(TracingGovernanceObserver),
            scheduler: TaskScheduler::default(),
            mode: ReasoningMode::default(),
            context_depth: config.graph.context_depth,
        }
    }

    /// Replaces the reasoner, e.g. with one that carries an external client.
    #[must_use]
    pub fn with_reasoner(mut self, reasoner: GraphReasoner) -> Self {
        self.reasoner = Arc::new(reasoner);
        self
    }

    /// Selects the reasoning mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ReasoningMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn GovernanceObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the batch scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: TaskScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Overrides the context traversal depth.
    #[must_use]
    pub fn with_context_depth(mut self, depth: usize) -> Self {
        self.context_depth = depth;
        self
    }

    /// Returns the evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &GovernanceEvaluator {
        &self.evaluator
    }

    /// Returns the repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn GraphRepository> {
        &self.repository
    }

    /// Returns the scheduler used by [`process_batch`](Self::process_batch).
    #[must_use]
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Processes `decision` under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Graph`] when the repository fails.
    pub async fn process(&self, decision: &Decision) -> PipelineResult<PipelineOutcome> {
        self.process_with_id(decision, DecisionId::generate()).await
    }

    /// Processes `decision` under `decision_id`, replacing any graph a
    /// previous run stored under the same id.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Graph`] when the repository fails.
    pub async fn process_with_id(
        &self,
        decision: &Decision,
        decision_id: DecisionId,
    ) -> PipelineResult<PipelineOutcome> {
        let governance = self.evaluator.evaluate(decision);
        debug!(decision_id = %decision_id, status = %governance.status, "decision evaluated");

        let graph = self
            .repository
            .upsert_decision_graph(decision, &governance, &decision_id)
            .await?;
        let context = self
            .repository
            .get_governance_context(&decision_id, self.context_depth)
            .await?;
        let reasoning = self.reasoner.analyze(&context, self.mode).await;
        let pack = self.packs.build(decision, &governance, Some(&reasoning));

        info!(
            decision_id = %decision_id,
            status = %governance.status,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            method = %reasoning.analysis_method,
            next_actions = pack.recommended_next_actions.len(),
            "decision processed"
        );

        let outcome = PipelineOutcome {
            decision_id,
            governance,
            graph,
            context,
            reasoning,
            pack,
        };
        self.observer.on_outcome(&outcome);
        Ok(outcome)
    }

    /// Processes `decisions` concurrently, bounded by the scheduler. Results
    /// keep the input order; one failure does not affect the others.
    pub async fn process_batch<I>(&self, decisions: I) -> Vec<PipelineResult<PipelineOutcome>>
    where
        I: IntoIterator<Item = Decision>,
    {
        let tasks: Vec<_> = decisions
            .into_iter()
            .map(|decision| {
                let pipeline = self.clone();
                self.scheduler
                    .spawn(async move { pipeline.process(&decision).await })
            })
            .collect();
        debug!(decisions = tasks.len(), "batch scheduled");

        let results = join_all(tasks.into_iter().map(settle)).await;

        let failed = results.iter().filter(|result| result.is_err()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "batch finished with failures");
        }
        results
    }
}

async fn settle(
    task: SchedulerResult<JoinHandle<SchedulerResult<PipelineResult<PipelineOutcome>>>>,
) -> PipelineResult<PipelineOutcome> {
    match task?.await {
        Ok(scheduled) => scheduled?,
        Err(err) => Err(PipelineError::Join {
            reason: err.to_string(),
        }),
    }
}
