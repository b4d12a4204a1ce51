//! Bounded worker pool for decision batches.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

const DEFAULT_MAX_IN_FLIGHT: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// How many decisions a batch may run through the pipeline at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    max_in_flight: NonZeroUsize,
}

impl SchedulerConfig {
    /// Allows at most `max_in_flight` decisions to run together.
    #[must_use]
    pub const fn new(max_in_flight: NonZeroUsize) -> Self {
        Self { max_in_flight }
    }

    /// Decisions allowed in flight.
    #[must_use]
    pub const fn max_in_flight(self) -> NonZeroUsize {
        self.max_in_flight
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_FLIGHT)
    }
}

/// Runs pipeline work on the tokio runtime, one permit per decision.
///
/// Clones share the same permits, so one scheduler bounds every batch that
/// runs through it.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    semaphore: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    config: SchedulerConfig,
}

impl TaskScheduler {
    /// Scheduler with `config.max_in_flight()` permits.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_in_flight().get())),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Limits this scheduler was built with.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Whether batches are still accepted.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Rejects further decisions. Decisions still waiting for a permit resolve
    /// to [`SchedulerError::Closed`]; those already running finish normally.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.semaphore.close();
    }

    /// Spawns `work`, which starts once a permit is free.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] when the scheduler is already
    /// closed. The handle resolves to the same error if the scheduler closes
    /// before `work` gets a permit.
    pub fn spawn<F, T>(&self, work: F) -> SchedulerResult<JoinHandle<SchedulerResult<T>>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }

        let semaphore = Arc::clone(&self.semaphore);
        Ok(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::Closed)?;
            Ok(work.await)
        }))
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Why a decision could not be scheduled.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// [`TaskScheduler::close`] was called.
    #[error("batch scheduler closed")]
    Closed,
}

/// Result of scheduling a decision.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
