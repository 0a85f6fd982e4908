//! Resilient call executor: retry around timeout around one provider call.
//!
//! Every attempt is bounded by its own deadline, and a timed-out attempt is
//! itself subject to the retry policy. The executor brackets the whole call
//! with the `integration_call_started` and `integration_call_completed`
//! events.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::retry::with_retry;
use super::timeout::with_timeout;
use crate::config::FanoutConfig;
use crate::error::ProviderError;
use crate::observability::{EVENT_CALL_COMPLETED, EVENT_CALL_STARTED};

/// Final result of a resilient provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilientCall<T> {
    /// Payload on success, last error on failure.
    pub result: Result<T, ProviderError>,
    /// Attempts made, including the first. Zero when `cancel` had already
    /// fired.
    pub attempts: u32,
    /// Total wall-clock time including backoff sleeps.
    pub duration: Duration,
}

impl<T> ResilientCall<T> {
    /// Whether the call eventually succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Total duration in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Discard the bookkeeping and return the payload or the final error.
    ///
    /// # Errors
    ///
    /// Returns the last error seen when every attempt failed or the error
    /// was not retryable.
    pub fn into_result(self) -> Result<T, ProviderError> {
        self.result
    }
}

/// Run `operation` under the timeout and retry policy in `config`.
///
/// `operation` is invoked once per attempt with a fresh cancellation token
/// that fires on the attempt deadline or when `cancel` fires.
pub async fn execute_with_resilience<F, Fut, T>(
    operation: F,
    integration: &str,
    operation_name: &str,
    config: &FanoutConfig,
    cancel: &CancellationToken,
) -> ResilientCall<T>
where
    F: Fn(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    tracing::info!(
        event = EVENT_CALL_STARTED,
        integration,
        operation = operation_name,
        "integration call started"
    );

    let timeout = config.timeout();
    let outcome = with_retry(&config.retry, cancel, |_attempt| {
        with_timeout(timeout, cancel, &operation)
    })
    .await;

    let call = ResilientCall {
        result: outcome.result,
        attempts: outcome.attempts,
        duration: outcome.elapsed,
    };

    match &call.result {
        Ok(_) => tracing::info!(
            event = EVENT_CALL_COMPLETED,
            integration,
            operation = operation_name,
            success = true,
            attempts = call.attempts,
            duration_ms = call.duration_ms(),
            "integration call completed"
        ),
        Err(err) => tracing::warn!(
            event = EVENT_CALL_COMPLETED,
            integration,
            operation = operation_name,
            success = false,
            attempts = call.attempts,
            duration_ms = call.duration_ms(),
            error = %err,
            "integration call completed"
        ),
    }

    call
}
