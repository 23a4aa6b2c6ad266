//! Bounded automatic retry for transient failures.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use super::backoff::backoff_delay;
use crate::errors::{ApiError, ErrorCode};

/// Total attempts including the first.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Initial backoff unit.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Backoff growth factor per attempt.
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Upper bound on any single delay.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Predicate deciding whether a failed attempt should be retried.
pub type RetryCondition = Box<dyn Fn(&ApiError) -> bool + Send + Sync>;

/// Observer invoked after a retryable failure and before the backoff delay.
///
/// Receives the 1-based number of the attempt that failed and the error that
/// triggered the retry. Intended for logging and metrics.
pub type RetryObserver = Box<dyn Fn(u32, &ApiError) + Send + Sync>;

/// Options for [`with_retry`].
///
/// All fields have defaults; partial configuration uses struct update syntax:
///
/// ```
/// use quizforge_resilience::retry::RetryOptions;
///
/// let options = RetryOptions {
///     max_attempts: 5,
///     ..Default::default()
/// };
/// ```
pub struct RetryOptions {
    /// Total attempts including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Initial backoff unit.
    pub base_delay: Duration,
    /// Backoff growth factor per attempt.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Overrides the default [`ApiError::is_retryable`] check when set.
    pub retry_condition: Option<RetryCondition>,
    /// Invoked once per retry, before the corresponding delay.
    pub on_retry: Option<RetryObserver>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
            retry_condition: None,
            on_retry: None,
        }
    }
}

/// Options for [`with_api_retry`].
pub struct ApiRetryOptions {
    /// Codes that trigger a retry.
    pub retry_on: Vec<ErrorCode>,
    /// Total attempts including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Initial backoff unit.
    pub base_delay: Duration,
    /// Backoff growth factor per attempt.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Invoked once per retry, before the corresponding delay.
    pub on_retry: Option<RetryObserver>,
}

impl Default for ApiRetryOptions {
    fn default() -> Self {
        Self {
            retry_on: vec![
                ErrorCode::RateLimit,
                ErrorCode::ServiceUnavailable,
                ErrorCode::NetworkError,
                ErrorCode::Timeout,
            ],
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
            on_retry: None,
        }
    }
}

/// Execute an operation with bounded retry for transient failures.
///
/// Attempt 1 runs immediately. On failure the error is classified (via
/// `options.retry_condition`, or [`ApiError::is_retryable`] when unset); if it
/// is not retryable, or attempts are exhausted, the original error is returned
/// unchanged with no further delay. Otherwise the observer fires, the task
/// suspends for the backoff delay, and the operation is re-invoked.
///
/// The delay before re-running attempt `n + 1` is
/// `min(base_delay * backoff_multiplier^(n-1), max_delay)`.
///
/// There is no cancellation: a sequence runs to success, exhaustion, or a
/// non-retryable failure. Callers needing a deadline should wrap the whole
/// call in a timeout.
pub async fn with_retry<T, F, Fut>(operation: F, options: RetryOptions) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let retryable = match &options.retry_condition {
                    Some(condition) => condition(&error),
                    None => error.is_retryable(),
                };

                if !retryable {
                    return Err(error);
                }

                if attempt >= max_attempts {
                    warn!("Giving up after {} attempts: {}", attempt, error);
                    return Err(error);
                }

                if let Some(on_retry) = &options.on_retry {
                    on_retry(attempt, &error);
                }

                let delay = backoff_delay(
                    attempt,
                    options.base_delay,
                    options.backoff_multiplier,
                    options.max_delay,
                );
                debug!(
                    "Attempt {}/{} failed ({}), retrying in {:?}",
                    attempt, max_attempts, error, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Execute an API call, retrying only on the codes in `options.retry_on`.
///
/// The default set is rate-limit, service-unavailable, network-error, and
/// timeout. Otherwise identical to [`with_retry`].
pub async fn with_api_retry<T, F, Fut>(
    operation: F,
    options: ApiRetryOptions,
) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let ApiRetryOptions {
        retry_on,
        max_attempts,
        base_delay,
        backoff_multiplier,
        max_delay,
        on_retry,
    } = options;

    let condition: RetryCondition = Box::new(move |error| retry_on.contains(&error.code()));

    with_retry(
        operation,
        RetryOptions {
            max_attempts,
            base_delay,
            backoff_multiplier,
            max_delay,
            retry_condition: Some(condition),
            on_retry,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn network_error() -> ApiError {
        ApiError::Network {
            message: "connection reset".to_string(),
        }
    }

    fn fast_options() -> RetryOptions {
        RetryOptions {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_always_failing_invoked_exactly_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(network_error())
            },
            RetryOptions {
                max_attempts: 4,
                ..fast_options()
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // The final error is the operation's own error, not a wrapper.
        assert!(matches!(result, Err(ApiError::Network { .. })));
    }

    #[tokio::test]
    async fn test_non_retryable_invoked_once() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::ValidationFailed {
                    message: "bad payload".to_string(),
                })
            },
            RetryOptions {
                max_attempts: 5,
                ..fast_options()
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ApiError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = with_retry(
            || async {
                let current = calls.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(network_error())
                } else {
                    Ok("ok")
                }
            },
            RetryOptions {
                max_attempts: 3,
                ..fast_options()
            },
        )
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_observer_fires_once_per_retry() {
        let seen: Arc<Mutex<Vec<(u32, ErrorCode)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_by_observer = Arc::clone(&seen);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::RateLimited {
                    dependency: "LLM".to_string(),
                })
            },
            RetryOptions {
                max_attempts: 3,
                on_retry: Some(Box::new(move |attempt, error| {
                    seen_by_observer
                        .lock()
                        .unwrap()
                        .push((attempt, error.code()));
                })),
                ..fast_options()
            },
        )
        .await;

        assert!(result.is_err());
        // 3 attempts -> 2 retries -> 2 observer calls, one per retry.
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(1, ErrorCode::RateLimit), (2, ErrorCode::RateLimit)]
        );
    }

    #[tokio::test]
    async fn test_max_attempts_below_one_behaves_as_one() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(network_error())
            },
            RetryOptions {
                max_attempts: 0,
                ..fast_options()
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_condition_overrides_classification() {
        let calls = AtomicU32::new(0);

        // ValidationFailed is non-retryable by default; the condition says
        // otherwise.
        let result = with_retry(
            || async {
                let current = calls.fetch_add(1, Ordering::SeqCst);
                if current == 0 {
                    Err(ApiError::ValidationFailed {
                        message: "flaky validator".to_string(),
                    })
                } else {
                    Ok(7)
                }
            },
            RetryOptions {
                max_attempts: 3,
                retry_condition: Some(Box::new(|error| {
                    matches!(error, ApiError::ValidationFailed { .. })
                })),
                ..fast_options()
            },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_api_retry_default_set_retries_rate_limit() {
        let calls = AtomicU32::new(0);

        let result = with_api_retry(
            || async {
                let current = calls.fetch_add(1, Ordering::SeqCst);
                if current == 0 {
                    Err(ApiError::RateLimited {
                        dependency: "LLM".to_string(),
                    })
                } else {
                    Ok("generated")
                }
            },
            ApiRetryOptions {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(result.unwrap(), "generated");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_api_retry_ignores_codes_outside_allowlist() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_api_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::RateLimited {
                    dependency: "LLM".to_string(),
                })
            },
            ApiRetryOptions {
                retry_on: vec![ErrorCode::Timeout],
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(ApiError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
