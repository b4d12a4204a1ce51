//! Hooks notified after every pipeline run.

use std::sync::{Arc, Mutex, PoisonError};

use governance_policy::{GovernanceStatus, headline_severity};
use governance_primitives::DecisionId;
use tracing::{info, warn};

use crate::pipeline::PipelineOutcome;

/// Observer invoked with the outcome of each processed decision.
pub trait GovernanceObserver: Send + Sync {
    /// Records `outcome`.
    fn on_outcome(&self, outcome: &PipelineOutcome);
}

/// Observer that logs outcomes through `tracing`.
#[derive(Debug, Default)]
pub struct TracingGovernanceObserver;

impl GovernanceObserver for TracingGovernanceObserver {
    fn on_outcome(&self, outcome: &PipelineOutcome) {
        let governance = &outcome.governance;
        let severity = headline_severity(governance);
        match governance.status {
            GovernanceStatus::Approved => {
                info!(
                    decision_id = %outcome.decision_id,
                    severity = %severity,
                    "decision approved"
                );
            }
            GovernanceStatus::NeedsApproval => {
                let approvers: Vec<&str> = governance
                    .approval_chain
                    .iter()
                    .map(|step| step.approver.role.as_str())
                    .collect();
                info!(
                    decision_id = %outcome.decision_id,
                    severity = %severity,
                    approvers = ?approvers,
                    findings = outcome.reasoning.findings().count(),
                    "decision needs approval"
                );
            }
            GovernanceStatus::Blocked => {
                warn!(
                    decision_id = %outcome.decision_id,
                    severity = %severity,
                    issues = ?governance.completeness_issues,
                    "decision blocked"
                );
            }
        }
    }
}

/// Forwards outcomes to a list of observers.
#[derive(Default)]
pub struct CompositeGovernanceObserver {
    observers: Vec<Arc<dyn GovernanceObserver>>,
}

impl CompositeGovernanceObserver {
    /// Creates a composite from `observers`.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn GovernanceObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer.
    pub fn push(&mut self, observer: Arc<dyn GovernanceObserver>) {
        self.observers.push(observer);
    }

    /// Number of wrapped observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` when no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl GovernanceObserver for CompositeGovernanceObserver {
    fn on_outcome(&self, outcome: &PipelineOutcome) {
        for observer in &self.observers {
            observer.on_outcome(outcome);
        }
    }
}

/// Observer that keeps `(decision id, status)` pairs, mostly for tests and demos.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    seen: Mutex<Vec<(DecisionId, GovernanceStatus)>>,
}

impl CollectingObserver {
    /// Creates a shared collecting observer.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Takes the recorded pairs.
    #[must_use]
    pub fn drain(&self) -> Vec<(DecisionId, GovernanceStatus)> {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.drain(..).collect()
    }
}

impl GovernanceObserver for CollectingObserver {
    fn on_outcome(&self, outcome: &PipelineOutcome) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((outcome.decision_id.clone(), outcome.governance.status));
    }
}
