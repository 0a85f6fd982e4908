//! Per-attempt deadline with real cancellation.
//!
//! The attempt future is polled in place and dropped when the deadline
//! passes, and the child [`CancellationToken`] handed to the operation is
//! cancelled so any work it spawned elsewhere stops too.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;

/// Run `operation` with a deadline of `timeout`.
///
/// `operation` receives a child of `parent`. That child is cancelled when
/// the deadline passes or when `parent` is cancelled.
///
/// # Errors
///
/// Returns [`ErrorKind::Timeout`](crate::error::ErrorKind::Timeout) when the
/// deadline passes, [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled)
/// when `parent` fires first, or the operation's own error.
pub async fn with_timeout<F, Fut, T>(
    timeout: Duration,
    parent: &CancellationToken,
    operation: F,
) -> Result<T, ProviderError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    if parent.is_cancelled() {
        return Err(ProviderError::cancelled("cancelled before attempt started"));
    }

    let attempt_token = parent.child_token();
    let attempt = operation(attempt_token.clone());

    tokio::select! {
        biased;
        () = parent.cancelled() => {
            Err(ProviderError::cancelled("cancelled during attempt"))
        }
        result = tokio::time::timeout(timeout, attempt) => match result {
            Ok(result) => result,
            Err(_) => {
                attempt_token.cancel();
                Err(ProviderError::timeout(format!(
                    "operation timed out after {}ms",
                    timeout.as_millis()
                )))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let cancel = CancellationToken::new();
        let result = with_timeout(Duration::from_millis(100), &cancel, |_| async {
            Ok::<_, ProviderError>(7)
        })
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn operation_error_passes_through() {
        let cancel = CancellationToken::new();
        let result: Result<(), _> = with_timeout(Duration::from_millis(100), &cancel, |_| async {
            Err(ProviderError::from_status(404, "gone"))
        })
        .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out_and_is_cancelled() {
        let cancel = CancellationToken::new();
        let seen = CancellationToken::new();
        let seen_inner = seen.clone();

        let start = tokio::time::Instant::now();
        let result: Result<(), _> = with_timeout(Duration::from_millis(500), &cancel, |token| {
            // Mirror the attempt token so the test can observe cancellation
            // after the attempt future itself has been dropped.
            tokio::spawn(async move {
                token.cancelled().await;
                seen_inner.cancel();
            });
            std::future::pending()
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("500ms"));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(600));

        tokio::time::timeout(Duration::from_secs(1), seen.cancelled())
            .await
            .expect("attempt token should be cancelled on timeout");
        assert!(!cancel.is_cancelled(), "parent must not be cancelled by a timeout");
    }

    #[tokio::test]
    async fn parent_cancellation_wins() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<(), _> =
            with_timeout(Duration::from_secs(30), &cancel, |_| std::future::pending()).await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn already_cancelled_parent_skips_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut called = false;
        let result: Result<(), _> = with_timeout(Duration::from_secs(1), &cancel, |_| {
            called = true;
            async { Ok(()) }
        })
        .await;
        assert!(!called);
        assert_eq!(result.unwrap_err().kind, ErrorKind::Cancelled);
    }
}
