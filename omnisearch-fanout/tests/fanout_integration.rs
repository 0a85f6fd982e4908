//! Integration tests for the fan-out orchestrator.
//!
//! These tests drive [`FanoutOrchestrator::execute_all`] through scripted
//! in-process providers (no network calls) and check the guarantees callers
//! rely on: one outcome per task, bounded retries, timeouts that cancel
//! in-flight work, failure isolation, stable ordering and health tracking.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use omnisearch_fanout::{
    CancellationToken, ErrorKind, FanoutConfig, FanoutOrchestrator, HealthStatus,
    NetworkFailure, ProviderCapability, ProviderError, ProviderPayload, ProviderRegistry,
    RetryPolicy, SearchProvider,
};
use serde_json::json;

/// What a scripted provider does on a given call.
#[derive(Clone)]
enum Step {
    Succeed(ProviderPayload),
    SucceedAfter(Duration, ProviderPayload),
    Fail(ProviderError),
    Hang,
    Panic,
}

/// A provider whose behaviour per call number (1-indexed) is scripted.
struct ScriptedProvider {
    calls: AtomicU32,
    saw_cancel: Arc<AtomicBool>,
    script: Box<dyn Fn(u32) -> Step + Send + Sync>,
}

impl ScriptedProvider {
    fn new(script: impl Fn(u32) -> Step + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            saw_cancel: Arc::new(AtomicBool::new(false)),
            script: Box::new(script),
        })
    }

    fn always(step: Step) -> Arc<Self> {
        Self::new(move |_| step.clone())
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<ProviderPayload, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match (self.script)(call) {
            Step::Succeed(payload) => Ok(json!({ "query": query, "limit": limit, "items": payload })),
            Step::SucceedAfter(delay, payload) => {
                tokio::time::sleep(delay).await;
                Ok(json!({ "query": query, "limit": limit, "items": payload }))
            }
            Step::Fail(err) => Err(err),
            Step::Hang => {
                let watcher = cancel.clone();
                let flag = Arc::clone(&self.saw_cancel);
                tokio::spawn(async move {
                    watcher.cancelled().await;
                    flag.store(true, Ordering::SeqCst);
                });
                std::future::pending().await
            }
            Step::Panic => panic!("adapter invariant violated"),
        }
    }
}

fn cap(integration: &str, service: &str) -> ProviderCapability {
    ProviderCapability::new(integration, service)
}

fn config(timeout_ms: u64, max_attempts: u32) -> FanoutConfig {
    FanoutConfig::default()
        .with_timeout_ms(timeout_ms)
        .with_retry(
            RetryPolicy::default()
                .with_max_attempts(max_attempts)
                .with_base_delay_ms(20)
                .with_max_delay_ms(50),
        )
}

fn orchestrator(config: FanoutConfig) -> FanoutOrchestrator {
    FanoutOrchestrator::new(config).expect("test config is valid")
}

#[tokio::test]
async fn one_outcome_per_task_regardless_of_failures() {
    let registry = ProviderRegistry::new()
        .connect(cap("google", "gmail"), ScriptedProvider::always(Step::Succeed(json!([1, 2]))))
        .connect(
            cap("google", "drive"),
            ScriptedProvider::always(Step::Fail(ProviderError::from_status(404, "no drive"))),
        )
        .disconnected(cap("microsoft", "outlook"))
        .connect(
            cap("slack", "messages"),
            ScriptedProvider::always(Step::Fail(ProviderError::from_status(503, "down"))),
        )
        .connect(cap("quickbooks", "invoices"), ScriptedProvider::always(Step::Succeed(json!([]))));

    let outcomes = orchestrator(config(500, 2)).execute_all(&registry, "kickoff").await;

    assert_eq!(outcomes.len(), registry.connected_count());
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes.iter().filter(|o| o.success).count(), 2);
}

#[tokio::test]
async fn every_task_failing_still_returns_full_list() {
    let failing = || ScriptedProvider::always(Step::Fail(ProviderError::from_status(401, "expired")));
    let registry = ProviderRegistry::new()
        .connect(cap("google", "gmail"), failing())
        .connect(cap("dropbox", "files"), failing())
        .connect(cap("procore", "rfis"), failing());

    let outcomes = orchestrator(config(500, 2)).execute_all(&registry, "q").await;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| !o.success && o.data.is_none()));
}

#[tokio::test]
async fn non_retryable_error_uses_one_attempt() {
    let provider = ScriptedProvider::always(Step::Fail(ProviderError::from_status(403, "forbidden")));
    let registry = ProviderRegistry::new().connect(cap("microsoft", "onedrive"), provider.clone());

    let outcomes = orchestrator(config(500, 2)).execute_all(&registry, "q").await;

    assert_eq!(outcomes[0].attempts, 1);
    assert_eq!(provider.calls(), 1);
    assert!(outcomes[0].error.as_deref().is_some_and(|e| e.contains("FORBIDDEN")));
}

#[tokio::test]
async fn retries_never_exceed_budget() {
    // Fails twice with a retryable error, would succeed on the third call.
    let provider = ScriptedProvider::new(|call| {
        if call <= 2 {
            Step::Fail(ProviderError::network(NetworkFailure::ConnectionReset, "reset"))
        } else {
            Step::Succeed(json!(["late"]))
        }
    });
    let registry = ProviderRegistry::new().connect(cap("slack", "messages"), provider.clone());

    let outcomes = orchestrator(config(500, 2)).execute_all(&registry, "q").await;

    assert!(!outcomes[0].success);
    assert_eq!(outcomes[0].attempts, 2);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn transient_failure_recovers_on_retry() {
    let provider = ScriptedProvider::new(|call| {
        if call == 1 {
            Step::Fail(ProviderError::from_status(429, "slow down"))
        } else {
            Step::Succeed(json!(["ok"]))
        }
    });
    let registry = ProviderRegistry::new().connect(cap("google", "calendar"), provider);

    let outcomes = orchestrator(config(500, 2)).execute_all(&registry, "standup").await;

    let outcome = &outcomes[0];
    assert!(outcome.success);
    assert_eq!(outcome.attempts, 2);
    let data = outcome.data.as_ref().expect("payload on success");
    assert_eq!(data["query"], "standup");
    assert_eq!(data["limit"], 5);
}

#[tokio::test(start_paused = true)]
async fn hanging_provider_times_out_and_is_cancelled() {
    let provider = ScriptedProvider::always(Step::Hang);
    let registry = ProviderRegistry::new().connect(cap("procore", "projects"), provider.clone());

    let timeout_ms = 300;
    let report = orchestrator(config(timeout_ms, 1))
        .execute_with_report(&registry, "tower crane")
        .await;

    let outcome = &report.outcomes[0];
    assert!(!outcome.success);
    assert!(outcome.error.as_deref().is_some_and(|e| e.contains("TIMEOUT")));
    assert!(outcome.duration_ms >= timeout_ms);
    assert!(outcome.duration_ms < timeout_ms + 100, "took {}ms", outcome.duration_ms);

    // Give the watcher spawned by the provider a chance to observe the token.
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(provider.saw_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn panicking_adapter_does_not_hide_other_results() {
    let broken = ScriptedProvider::always(Step::Panic);
    let registry = ProviderRegistry::new()
        .connect(cap("broken", "adapter"), broken.clone())
        .connect(
            cap("google", "gmail"),
            ScriptedProvider::always(Step::SucceedAfter(
                Duration::from_millis(300),
                json!(["mail"]),
            )),
        );
    let orchestrator = orchestrator(config(2_000, 2));

    let outcomes = orchestrator.execute_all(&registry, "q").await;

    assert_eq!(outcomes.len(), 2);
    let failed = &outcomes[0];
    assert!(!failed.success);
    assert_eq!(failed.attempts, 1);
    assert_eq!(broken.calls(), 1);
    let error = failed.error.as_deref().expect("error text");
    assert!(error.contains("adapter panicked"), "{error}");
    assert!(error.contains("adapter invariant violated"), "{error}");
    // Timed by its own call, not by the slow neighbour.
    assert!(failed.duration_ms < 300, "took {}ms", failed.duration_ms);
    assert!(outcomes[1].success);
    assert_eq!(
        orchestrator.health().status(&cap("broken", "adapter")),
        Some(HealthStatus::Unhealthy)
    );
}

#[tokio::test]
async fn immediately_failing_adapter_does_not_hide_other_results() {
    let registry = ProviderRegistry::new()
        .connect(
            cap("quickbooks", "bills"),
            ScriptedProvider::always(Step::Fail(ProviderError::other("malformed response"))),
        )
        .connect(
            cap("dropbox", "files"),
            ScriptedProvider::always(Step::SucceedAfter(
                Duration::from_millis(30),
                json!(["contract.pdf"]),
            )),
        );

    let outcomes = orchestrator(config(500, 2)).execute_all(&registry, "q").await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].capability, cap("quickbooks", "bills"));
    assert!(!outcomes[0].success);
    assert_eq!(outcomes[1].capability, cap("dropbox", "files"));
    assert!(outcomes[1].success);
}

#[tokio::test]
async fn health_is_last_write_wins_across_runs() {
    let gmail = cap("google", "gmail");
    let provider = ScriptedProvider::new(|call| {
        if call == 1 {
            Step::Fail(ProviderError::from_status(500, "boom"))
        } else {
            Step::Succeed(json!([]))
        }
    });
    let registry = ProviderRegistry::new().connect(gmail.clone(), provider);
    let orchestrator = orchestrator(config(500, 2));

    orchestrator.execute_all(&registry, "first").await;
    assert_eq!(orchestrator.health().snapshot()[&gmail], HealthStatus::Unhealthy);
    assert_eq!(orchestrator.health().summary().overall, HealthStatus::Unhealthy);

    orchestrator.execute_all(&registry, "second").await;
    assert_eq!(orchestrator.health().snapshot()[&gmail], HealthStatus::Healthy);
    assert_eq!(orchestrator.health().summary().overall, HealthStatus::Healthy);
}

#[tokio::test]
async fn order_matches_submission_across_runs() {
    let delays = [40u64, 5, 25, 1, 15];
    let mut registry = ProviderRegistry::new();
    for (i, delay) in delays.iter().enumerate() {
        let provider: Arc<dyn SearchProvider> = ScriptedProvider::always(Step::SucceedAfter(
            Duration::from_millis(*delay),
            json!([i]),
        ));
        registry.push(cap("svc", &format!("n{i}")), 5, Some(provider));
    }

    let orchestrator = orchestrator(config(500, 1));
    let expected: Vec<String> = (0..delays.len()).map(|i| format!("svc.n{i}")).collect();
    for _ in 0..3 {
        let outcomes = orchestrator.execute_all(&registry, "q").await;
        let keys: Vec<String> = outcomes.iter().map(|o| o.capability.key()).collect();
        assert_eq!(keys, expected);
    }
}

#[tokio::test]
async fn empty_registry_returns_empty_list() {
    let outcomes = orchestrator(FanoutConfig::default())
        .execute_all(&ProviderRegistry::new(), "anything")
        .await;
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn concurrent_queries_are_independent() {
    let orchestrator = Arc::new(orchestrator(config(500, 1)));
    let registry = ProviderRegistry::new()
        .connect(
            cap("google", "gmail"),
            ScriptedProvider::always(Step::SucceedAfter(Duration::from_millis(10), json!([]))),
        )
        .connect(
            cap("slack", "messages"),
            ScriptedProvider::always(Step::Fail(ProviderError::timeout("slow"))),
        );

    let (a, b) = tokio::join!(
        orchestrator.execute_all(&registry, "alpha"),
        orchestrator.execute_all(&registry, "beta"),
    );

    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 2);
    assert_eq!(a[0].data.as_ref().map(|d| d["query"].clone()), Some(json!("alpha")));
    assert_eq!(b[0].data.as_ref().map(|d| d["query"].clone()), Some(json!("beta")));
    assert_eq!(orchestrator.health().summary().total, 2);
}

#[tokio::test]
async fn shutdown_turns_remaining_calls_into_cancellations() {
    let orchestrator = Arc::new(orchestrator(config(5_000, 2)));
    let provider = ScriptedProvider::always(Step::Hang);
    let registry = ProviderRegistry::new().connect(cap("microsoft", "calendar"), provider.clone());

    let runner = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.execute_all(&registry, "q").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    orchestrator.shutdown();

    let outcomes = runner.await.expect("run completes");
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].error.as_deref().is_some_and(|e| e.contains("CANCELLED")));
    assert_eq!(outcomes[0].attempts, 1);
    assert_eq!(provider.calls(), 1);
    assert_eq!(orchestrator.health().status(&cap("microsoft", "calendar")), None);
}

#[tokio::test]
async fn runs_after_shutdown_make_no_calls_and_keep_health() {
    let orchestrator = orchestrator(config(500, 2));
    let gmail = cap("google", "gmail");
    let provider = ScriptedProvider::always(Step::Succeed(json!(["mail"])));
    let registry = ProviderRegistry::new().connect(gmail.clone(), provider.clone());

    orchestrator.execute_all(&registry, "before").await;
    assert_eq!(orchestrator.health().status(&gmail), Some(HealthStatus::Healthy));

    orchestrator.shutdown();
    let outcomes = orchestrator.execute_all(&registry, "after").await;

    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].success);
    assert_eq!(outcomes[0].attempts, 0);
    assert!(outcomes[0].error.as_deref().is_some_and(|e| e.contains("CANCELLED")));
    assert_eq!(provider.calls(), 1);
    assert_eq!(orchestrator.health().status(&gmail), Some(HealthStatus::Healthy));
}

#[test]
fn timeout_errors_are_classified_retryable() {
    let err = ProviderError::timeout("8000ms");
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(omnisearch_fanout::is_retryable(&err));
}
