//! Fan-out orchestrator: concurrent dispatch, isolated failures, ordered
//! collection.
//!
//! Each task is spawned as its own tokio task and runs through the resilient
//! call executor. Every spawned unit converts its own failure into a failed
//! [`TaskOutcome`] and records the capability's health before finishing. An
//! adapter panic is caught inside the attempt and becomes an ordinary
//! provider error. Cancellation is not a verdict on the provider, so it
//! leaves health untouched. The run joins on all handles and returns the
//! outcomes in submission order, whatever order they completed in.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::tasks::{build_tasks, SearchFuture, SearchTask};
use crate::config::FanoutConfig;
use crate::error::{ErrorKind, FanoutError, ProviderError};
use crate::health::HealthTracker;
use crate::observability::{EVENT_BATCH_COMPLETED, SPAN_FANOUT_RUN, SPAN_FANOUT_TASK};
use crate::provider::ProviderRegistry;
use crate::resilience::execute_with_resilience;
use crate::types::{ProviderCapability, TaskOutcome};

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanoutReport {
    /// Identifier attached to every log line of the run.
    pub run_id: Uuid,
    /// One outcome per task, in submission order.
    pub outcomes: Vec<TaskOutcome>,
    /// Wall-clock time from dispatch until the last task finished.
    pub total_duration_ms: u64,
    /// Outcomes with `success == true`.
    pub successes: usize,
    /// Outcomes with `success == false`.
    pub failures: usize,
}

/// Runs search tasks concurrently and tracks per-capability health.
///
/// Construct one per process and share it (for example behind an [`Arc`])
/// with every request handler. Concurrent runs are fully independent apart
/// from the shared [`HealthTracker`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> omnisearch_fanout::Result<()> {
/// use omnisearch_fanout::{FanoutConfig, FanoutOrchestrator, ProviderRegistry};
///
/// let orchestrator = FanoutOrchestrator::new(FanoutConfig::default())?;
/// let outcomes = orchestrator
///     .execute_all(&ProviderRegistry::new(), "quarterly report")
///     .await;
/// assert!(outcomes.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FanoutOrchestrator {
    config: Arc<FanoutConfig>,
    health: Arc<HealthTracker>,
    shutdown: CancellationToken,
}

impl FanoutOrchestrator {
    /// Create an orchestrator with its own health tracker.
    ///
    /// # Errors
    ///
    /// Returns [`FanoutError::Config`] if `config` fails validation.
    pub fn new(config: FanoutConfig) -> Result<Self, FanoutError> {
        Self::with_health_tracker(config, Arc::new(HealthTracker::new()))
    }

    /// Create an orchestrator that records into an existing tracker.
    ///
    /// # Errors
    ///
    /// Returns [`FanoutError::Config`] if `config` fails validation.
    pub fn with_health_tracker(
        config: FanoutConfig,
        health: Arc<HealthTracker>,
    ) -> Result<Self, FanoutError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            health,
            shutdown: CancellationToken::new(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// The shared health tracker.
    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    /// Cancel every in-flight and future provider call.
    ///
    /// Runs started after shutdown still return one (cancelled) outcome per
    /// task, with zero attempts and no provider call.
    pub fn shutdown(&self) {
        tracing::info!("fan-out orchestrator shutting down");
        self.shutdown.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Search every connected capability in `registry` for `query`.
    ///
    /// Returns exactly one outcome per connected capability, in registry
    /// order. Provider failures become outcomes with `success == false`;
    /// this method never fails because of them. An empty list means no
    /// capability was connected.
    pub async fn execute_all(&self, registry: &ProviderRegistry, query: &str) -> Vec<TaskOutcome> {
        self.execute_with_report(registry, query).await.outcomes
    }

    /// Like [`execute_all`](Self::execute_all), with run id and aggregate
    /// counts.
    pub async fn execute_with_report(
        &self,
        registry: &ProviderRegistry,
        query: &str,
    ) -> FanoutReport {
        tracing::trace!(query, connected = registry.connected_count(), "building search tasks");
        let tasks = build_tasks(registry, query);
        self.execute_tasks(tasks).await
    }

    /// Run pre-built tasks concurrently and collect their outcomes.
    pub async fn execute_tasks(&self, tasks: Vec<SearchTask>) -> FanoutReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(SPAN_FANOUT_RUN, %run_id, tasks = tasks.len());
        self.run(run_id, tasks).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, tasks: Vec<SearchTask>) -> FanoutReport {
        let start = Instant::now();
        let run_token = self.shutdown.child_token();
        // Dropping the run (caller gave up) cancels every attempt it started.
        let _run_guard = run_token.clone().drop_guard();

        let capabilities: Vec<ProviderCapability> =
            tasks.iter().map(|t| t.capability.clone()).collect();

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let task_span = tracing::info_span!(
                    SPAN_FANOUT_TASK,
                    capability = %task.capability
                );
                tokio::spawn(
                    run_task(
                        task,
                        Arc::clone(&self.config),
                        Arc::clone(&self.health),
                        run_token.clone(),
                    )
                    .instrument(task_span),
                )
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let mut outcomes = Vec::with_capacity(joined.len());
        for (capability, result) in capabilities.into_iter().zip(joined) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_err) if join_err.is_panic() => {
                    let message = "search task panicked";
                    tracing::error!(capability = %capability, error = %join_err, "{message}");
                    self.health.record_failure(&capability, message);
                    TaskOutcome::failed(capability, message, elapsed_ms(start), 0)
                }
                Err(join_err) => {
                    tracing::warn!(capability = %capability, error = %join_err, "search task was aborted");
                    let err = ProviderError::cancelled("search task was aborted");
                    TaskOutcome::failed(capability, err.to_string(), elapsed_ms(start), 0)
                }
            };
            outcomes.push(outcome);
        }

        let successes = outcomes.iter().filter(|o| o.success).count();
        let failures = outcomes.len() - successes;
        let total_duration_ms = elapsed_ms(start);

        tracing::info!(
            event = EVENT_BATCH_COMPLETED,
            total = outcomes.len(),
            successes,
            failures,
            total_duration_ms,
            "fan-out batch completed"
        );

        FanoutReport {
            run_id,
            outcomes,
            total_duration_ms,
            successes,
            failures,
        }
    }
}

/// One spawned unit: resilient call, outcome conversion, health update.
async fn run_task(
    task: SearchTask,
    config: Arc<FanoutConfig>,
    health: Arc<HealthTracker>,
    cancel: CancellationToken,
) -> TaskOutcome {
    let capability = task.capability.clone();
    let call = execute_with_resilience(
        |token| invoke_catching_panics(&task, token),
        &capability.integration,
        &capability.service,
        &config,
        &cancel,
    )
    .await;

    let duration_ms = call.duration_ms();
    let attempts = call.attempts;
    match call.result {
        Ok(data) => {
            health.record_success(&capability);
            TaskOutcome::succeeded(capability, data, duration_ms, attempts)
        }
        Err(err) if err.kind == ErrorKind::Cancelled => {
            tracing::debug!(attempts, error = %err, "search cancelled; health unchanged");
            TaskOutcome::failed(capability, err.to_string(), duration_ms, attempts)
        }
        Err(err) => {
            let message = err.to_string();
            health.record_failure(&capability, message.clone());
            TaskOutcome::failed(capability, message, duration_ms, attempts)
        }
    }
}

/// Invoke one attempt, turning a panic in the adapter into a provider error.
///
/// Covers both a panic while building the future and one while polling it.
fn invoke_catching_panics(task: &SearchTask, token: CancellationToken) -> SearchFuture {
    match std::panic::catch_unwind(AssertUnwindSafe(|| task.invoke(token))) {
        Ok(future) => AssertUnwindSafe(future)
            .catch_unwind()
            .map(|caught| caught.unwrap_or_else(|payload| Err(panic_error(&*payload))))
            .boxed(),
        Err(payload) => {
            let err = panic_error(&*payload);
            async move { Err(err) }.boxed()
        }
    }
}

fn panic_error(payload: &(dyn Any + Send)) -> ProviderError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    tracing::error!(panic = %detail, "search adapter panicked");
    ProviderError::other(format!("adapter panicked: {detail}"))
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
