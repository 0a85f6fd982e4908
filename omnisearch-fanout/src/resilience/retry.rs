//! Retry engine: capped exponential backoff driven by the retry classifier.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::error::{self, ProviderError};
use crate::observability::EVENT_RETRY_ATTEMPT;

/// What the retry engine observed across all attempts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RetryOutcome<T> {
    /// The successful value, or the last error seen.
    pub result: Result<T, ProviderError>,
    /// Attempts actually made.
    pub attempts: u32,
    /// Wall-clock time from the first attempt to the final outcome.
    pub elapsed: Duration,
}

/// Invoke `operation` until it succeeds, fails terminally, or the attempt
/// budget in `policy` runs out.
///
/// `operation` receives the 1-indexed attempt number. Between attempts the
/// engine sleeps for [`RetryPolicy::delay_for_attempt`]; that sleep ends
/// early with a cancellation error if `cancel` fires. An attempt that would
/// start on an already-cancelled token is never made and never counted.
pub(crate) async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return RetryOutcome {
                result: Err(ProviderError::cancelled("cancelled before attempt started")),
                attempts: attempt,
                elapsed: start.elapsed(),
            };
        }
        attempt = attempt.saturating_add(1);

        let err = match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                    elapsed: start.elapsed(),
                };
            }
            Err(err) => err,
        };

        if !error::is_retryable(&err) || attempt >= max_attempts {
            return RetryOutcome {
                result: Err(err),
                attempts: attempt,
                elapsed: start.elapsed(),
            };
        }

        let delay = policy.delay_for_attempt(attempt);
        tracing::warn!(
            event = EVENT_RETRY_ATTEMPT,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure; retrying after backoff"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return RetryOutcome {
                    result: Err(ProviderError::cancelled(format!(
                        "cancelled during retry backoff after: {err}"
                    ))),
                    attempts: attempt,
                    elapsed: start.elapsed(),
                };
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
}
