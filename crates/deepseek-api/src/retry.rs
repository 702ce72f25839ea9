use crate::error::{ApiError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Bounded exponential backoff for remote calls.
///
/// All attempts share one deadline (`now + timeout`). Only transient failures are retried
/// (see [`ApiError::is_retryable`]), and a retry is skipped when the backoff sleep would
/// outlast the remaining budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_max_retries(2)
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    pub fn no_retry() -> Self {
        Self::with_max_retries(0)
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds, fails permanently, runs out of attempts, or the
    /// deadline derived from `timeout` passes. Deadline expiry surfaces as
    /// [`ApiError::Timeout`] carrying the full `timeout`.
    pub async fn run<T, F, Fut>(&self, timeout: Duration, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let deadline = Instant::now() + timeout;
        let mut delay = self.base_delay;
        let mut attempt = 1u32;

        loop {
            let err = match timeout_at(deadline, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(_) => return Err(ApiError::Timeout(timeout)),
            };

            if attempt >= self.max_attempts || !err.is_retryable() {
                return Err(err);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining <= delay {
                log::warn!("Not retrying after attempt {attempt}: deadline too close ({err})");
                return Err(err);
            }

            log::warn!(
                "Remote call failed (attempt {attempt}/{}), retrying in {delay:?}: {err}",
                self.max_attempts
            );
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2).min(self.max_delay);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            message: "busy".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::with_max_retries(2);
        let value = policy
            .run(Duration::from_secs(60), move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::with_max_retries(1);
        let err = policy
            .run(Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(unavailable())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::with_max_retries(5);
        let err = policy
            .run(Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiError::Status {
                    status: 401,
                    message: "bad key".to_string(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_surfaces_as_timeout() {
        let policy = RetryPolicy::with_max_retries(3);
        let err = policy
            .run(Duration::from_secs(5), || async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_sleep_past_the_deadline() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::with_max_retries(10)
            .with_delays(Duration::from_secs(4), Duration::from_secs(4));
        let err = policy
            .run(Duration::from_secs(3), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(unavailable())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
