use std::future::Future;
use std::time::Duration;

use crate::domain::service::DeliveryError;

/// RetryPolicy controls how a single delivery is re-attempted after a
/// transient channel error. `max_attempts = 1` disables retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff before retry number `attempt + 1` (attempt is zero-based).
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_millis() as f64);
        let delay_ms = if self.jitter {
            let jitter_range = capped * 0.1;
            capped - jitter_range + (rand::random::<f64>() * jitter_range * 2.0)
        } else {
            capped
        };
        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}

/// DeliveryAttempt is the final result of a retried send together with the
/// number of attempts made.
#[derive(Debug)]
pub struct DeliveryAttempt<T> {
    pub result: Result<T, DeliveryError>,
    pub attempts: u32,
}

/// Runs `operation` until it succeeds, fails with a permanent error, or the
/// policy's attempts are used up.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> DeliveryAttempt<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DeliveryError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                return DeliveryAttempt {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.compute_delay(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient delivery error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return DeliveryAttempt {
                    result: Err(e),
                    attempts: attempt,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let outcome = with_retry(&fast(3), || async { Ok::<_, DeliveryError>("ok") }).await;
        assert_eq!(outcome.result.unwrap(), "ok");
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let outcome = with_retry(&fast(3), move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DeliveryError::Timeout("slow".to_string()))
                } else {
                    Ok("sent")
                }
            }
        })
        .await;
        assert_eq!(outcome.result.unwrap(), "sent");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_returns_last_error() {
        let outcome: DeliveryAttempt<()> = with_retry(&fast(2), || async {
            Err(DeliveryError::ConnectionFailed("refused".to_string()))
        })
        .await;
        assert_eq!(
            outcome.result.unwrap_err(),
            DeliveryError::ConnectionFailed("refused".to_string())
        );
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let outcome: DeliveryAttempt<()> = with_retry(&fast(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err(DeliveryError::InvalidRecipient("+0".to_string())) }
        })
        .await;
        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_jitter(false);
        assert_eq!(policy.compute_delay(0), Duration::from_millis(100));
        assert_eq!(policy.compute_delay(1), Duration::from_millis(200));
        assert_eq!(policy.compute_delay(2), Duration::from_millis(300));
        assert_eq!(policy.compute_delay(10), Duration::from_millis(300));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }
}
