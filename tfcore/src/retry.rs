//! Bounded retry for eventual-consistency windows
//!
//! Remote control planes report specific error classes while a dependency
//! has not yet propagated. Adapters wrap the affected call in
//! [`retry_on`] with an explicit [`RetryPolicy`] instead of hand-rolling
//! retry closures per call site.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Explicit retry policy: a hard timeout ceiling plus an exponential
/// backoff schedule capped at `max_backoff`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }
}

/// Invoke `op`, retrying while `is_retryable` classifies the error as an
/// eventual-consistency failure and the policy timeout has not elapsed.
///
/// Once the timeout ceiling is reached, exactly one final unretried attempt
/// is made and its result is returned as-is, so the true last error (or a
/// late success) surfaces to the caller. Non-retryable errors propagate
/// immediately.
pub async fn retry_on<T, E, F, Fut, P>(policy: &RetryPolicy, is_retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let deadline = Instant::now() + policy.timeout;
    let mut backoff = policy.initial_backoff;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retryable(&err) => return Err(err),
            Err(err) => {
                if Instant::now() >= deadline {
                    tracing::debug!(error = %err, "retry timeout elapsed, making one final attempt");
                    return op().await;
                }
                tracing::debug!(
                    error = %err,
                    backoff_ms = backoff.as_millis() as u64,
                    "retryable error, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FakeError {
        retryable: bool,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake error (retryable: {})", self.retryable)
        }
    }

    fn policy_ms(timeout: u64) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(timeout))
            .with_backoff(Duration::from_millis(1), Duration::from_millis(4))
    }

    #[tokio::test]
    async fn success_passes_through_without_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<u32, FakeError> = retry_on(&policy_ms(50), |e: &FakeError| e.retryable, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_after_single_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<u32, FakeError> = retry_on(&policy_ms(50), |e: &FakeError| e.retryable, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FakeError { retryable: false })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persistent_retryable_error_exhausts_timeout_and_surfaces_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<u32, FakeError> = retry_on(&policy_ms(20), |e: &FakeError| e.retryable, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FakeError { retryable: true })
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.retryable);
        // At least one in-budget attempt plus the final unretried attempt.
        assert!(attempts.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn recovers_when_error_clears_within_timeout() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<u32, FakeError> = retry_on(&policy_ms(500), |e: &FakeError| e.retryable, move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FakeError { retryable: true })
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
