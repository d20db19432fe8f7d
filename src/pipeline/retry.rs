//! Bounded retry with exponential backoff for network-bound stages.
//!
//! Only transient errors ([`FetchError::is_transient`]) are retried; absence
//! (`NotFound`, `NoMatch`, `Unavailable`) and local failures return
//! immediately. With the default of one attempt nothing is retried.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::error::Result;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start_time = Instant::now();
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(result);
                }
                Err(err) if !err.is_transient() || attempt >= self.max_attempts => {
                    if attempt > 1 {
                        tracing::warn!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Giving up after retries"
                        );
                    }
                    return Err(err);
                }
                Err(err) => {
                    let delay = jittered(backoff.min(MAX_BACKOFF));
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, will retry after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }
}

/// Add up to 25% random jitter so concurrent retries spread out
fn jittered(delay: Duration) -> Duration {
    let max_jitter = delay.as_millis() as u64 / 4;
    if max_jitter == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::random_range(0..=max_jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = policy(3).run("test_op", || async { Ok::<i32, FetchError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let attempts = AtomicU32::new(0);

        let result = policy(3)
            .run("test_op", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(FetchError::upstream("503"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_immediately() {
        let attempts = AtomicU32::new(0);

        let result = policy(5)
            .run("test_op", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(FetchError::NotFound("abc".into())) }
            })
            .await;

        assert!(matches!(result, Err(FetchError::NotFound(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let attempts = AtomicU32::new(0);

        let result = policy(2)
            .run("test_op", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(FetchError::RateLimited("catalog".into())) }
            })
            .await;

        assert!(matches!(result, Err(FetchError::RateLimited(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_policy_does_not_retry() {
        let attempts = AtomicU32::new(0);

        let result = RetryPolicy::default()
            .run("test_op", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(FetchError::upstream("503")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_clamps_attempts() {
        let config = PipelineConfig {
            max_attempts: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_millis(400);
        for _ in 0..50 {
            let d = jittered(base);
            assert!(d >= base && d <= Duration::from_millis(500));
        }
    }
}
