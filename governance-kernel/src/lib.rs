//! Decision governance pipeline.
//!
//! [`DecisionPipeline`] wires the governance evaluator, the graph repository,
//! the graph reasoner, and the pack builder into one call per decision, and
//! runs batches on a semaphore-bounded [`TaskScheduler`]. Each processed
//! decision is reported to a [`GovernanceObserver`].

#![warn(missing_docs, clippy::pedantic)]

pub mod observer;
pub mod pipeline;
mod scheduler;

pub use observer::{
    CollectingObserver, CompositeGovernanceObserver, GovernanceObserver,
    TracingGovernanceObserver,
};
pub use pipeline::{DecisionPipeline, PipelineError, PipelineOutcome, PipelineResult};
pub use scheduler::{SchedulerConfig, SchedulerError, SchedulerResult, TaskScheduler};
