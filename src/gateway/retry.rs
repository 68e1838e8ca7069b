//! Gateway connect retry with exponential backoff.
//!
//! Transient network failures are common between a companion client and its
//! gateway; connection establishment retries with capped exponential backoff
//! instead of aborting. Protocol and store errors are not retried.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Maximum retry attempts before giving up.
const MAX_RETRIES: u32 = 6;

/// Maximum backoff duration (64 seconds).
const MAX_BACKOFF_SECS: u64 = 64;

/// Retry an async operation with exponential backoff.
///
/// Backoff is 2^n seconds (1, 2, 4, 8, 16, 32, 64) capped at
/// `MAX_BACKOFF_SECS`, for up to `MAX_RETRIES` retries. The last error is
/// returned once retries are exhausted or `is_retryable` rejects the error.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    is_retryable: fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !is_retryable(&err) || attempt >= MAX_RETRIES {
                    return Err(err);
                }

                let backoff_secs = 2u64.pow(attempt).min(MAX_BACKOFF_SECS);
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_secs,
                    "gateway operation failed, retrying: {}",
                    err
                );

                sleep(Duration::from_secs(backoff_secs)).await;
                attempt += 1;
            }
        }
    }
}

/// Determine whether a gateway error is transient and worth retrying.
pub fn is_gateway_error_retryable(err: &crate::gateway::traits::GatewayError) -> bool {
    matches!(err, crate::gateway::traits::GatewayError::Network(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::traits::GatewayError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately() {
        let result = retry_with_backoff(
            || async { Ok::<_, GatewayError>(42) },
            is_gateway_error_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempt = Arc::new(AtomicU32::new(0));
        let attempt_clone = attempt.clone();

        let result = retry_with_backoff(
            move || {
                let attempt = attempt_clone.clone();
                async move {
                    let count = attempt.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(GatewayError::Network("transient".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            is_gateway_error_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let attempt = Arc::new(AtomicU32::new(0));
        let attempt_clone = attempt.clone();

        let result = retry_with_backoff(
            move || {
                let attempt = attempt_clone.clone();
                async move {
                    attempt.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(GatewayError::Protocol("bad handshake".to_string()))
                }
            },
            is_gateway_error_retryable,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempt.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_max_retries() {
        let attempt = Arc::new(AtomicU32::new(0));
        let attempt_clone = attempt.clone();

        let result = retry_with_backoff(
            move || {
                let attempt = attempt_clone.clone();
                async move {
                    attempt.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(GatewayError::Network("down".to_string()))
                }
            },
            is_gateway_error_retryable,
        )
        .await;

        assert!(result.is_err());
        // initial attempt plus MAX_RETRIES retries
        assert_eq!(attempt.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(2u64.pow(0), 1);
        assert_eq!(2u64.pow(5), 32);
        assert_eq!(2u64.pow(7).min(MAX_BACKOFF_SECS), MAX_BACKOFF_SECS);
    }

    #[test]
    fn retryable_classification() {
        assert!(is_gateway_error_retryable(&GatewayError::Network(
            "timeout".to_string()
        )));
        assert!(!is_gateway_error_retryable(&GatewayError::Protocol(
            "bad frame".to_string()
        )));
        assert!(!is_gateway_error_retryable(&GatewayError::NotConnected));
        assert!(!is_gateway_error_retryable(&GatewayError::LinkFailed(
            "closed".to_string()
        )));
    }
}
