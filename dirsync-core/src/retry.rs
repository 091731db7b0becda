//! Consistency retrier.
//!
//! Right after a create, a replicated directory may answer `NotFound` for
//! the object it just acknowledged. Reads issued in that window are retried
//! with bounded exponential backoff; any other failure ends the loop at once.

use std::future::Future;
use std::time::Duration;

use crate::error::{DirectoryError, ReconcileError};

/// Default number of reads before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;
/// Delay before the second read.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    /// Uncapped unless the caller asks for a cap.
    max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one read.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: None,
        }
    }

    /// Cap every delay at `max_delay`, never below twice the initial delay
    /// so the second sleep is always double the first.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        let floor = self.initial_delay.saturating_mul(2);
        self.max_delay = Some(max_delay.max(floor));
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .unwrap_or(if self.initial_delay.is_zero() {
                Duration::ZERO
            } else {
                Duration::MAX
            });
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

/// Run `read` until it succeeds, fails with something other than
/// `NotFound`, or the attempt budget is spent.
///
/// Sleeps `initial, 2*initial, 4*initial, ...` between attempts and
/// never after the last one. Exhaustion is reported as
/// [`ReconcileError::TransientUnavailable`] carrying the last `NotFound`.
pub async fn retry_read<T, F, Fut>(policy: &RetryPolicy, mut read: F) -> Result<T, ReconcileError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DirectoryError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match read().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "read succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_not_found() => {
                if attempt >= policy.max_attempts {
                    tracing::warn!(
                        attempts = attempt,
                        error = %e,
                        "object still not visible, giving up"
                    );
                    return Err(ReconcileError::TransientUnavailable { attempts: attempt, last: e });
                }
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    "object not yet visible, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(ReconcileError::Conflict(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1000))
    }

    #[test]
    fn delays_double_and_cap() {
        let p = policy(10).with_max_delay(Duration::from_millis(5000));
        let delays: Vec<u64> = (1..=5).map(|n| p.delay_after(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000]);
    }

    #[test]
    fn huge_attempt_saturates() {
        let p = policy(u32::MAX);
        assert_eq!(p.delay_after(u32::MAX), Duration::MAX);
        let capped = p.with_max_delay(Duration::from_secs(60));
        assert_eq!(capped.delay_after(u32::MAX), Duration::from_secs(60));
        assert_eq!(RetryPolicy::new(5, Duration::ZERO).delay_after(40), Duration::ZERO);
    }

    #[test]
    fn long_initial_delay_keeps_doubling() {
        let p = RetryPolicy::new(4, Duration::from_secs(20));
        assert_eq!(p.max_delay(), None);
        assert_eq!(p.delay_after(1), Duration::from_secs(20));
        assert_eq!(p.delay_after(2), Duration::from_secs(40));
        assert_eq!(p.delay_after(3), Duration::from_secs(80));
    }

    #[test]
    fn cap_never_below_twice_initial() {
        let p = policy(5).with_max_delay(Duration::from_millis(1500));
        assert_eq!(p.max_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(p.delay_after(2), 2 * p.delay_after(1));
    }

    #[test]
    fn zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_time_without_sleeping() {
        let start = Instant::now();
        let value = retry_read(&policy(3), || async { Ok::<_, DirectoryError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_not_found_with_backoff() {
        let calls = AtomicU32::new(0);
        let seen = Mutex::new(Vec::new());
        let start = Instant::now();

        let value = retry_read(&policy(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            seen.lock().unwrap().push(start.elapsed().as_millis() as u64);
            async move {
                if n < 3 {
                    Err(DirectoryError::not_found("h1: host not found"))
                } else {
                    Ok("h1")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "h1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1000, 3000]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_sleep_doubles_with_long_initial_delay() {
        let calls = AtomicU32::new(0);
        let seen = Mutex::new(Vec::new());
        let start = Instant::now();

        retry_read(&RetryPolicy::new(3, Duration::from_secs(20)), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            seen.lock().unwrap().push(start.elapsed().as_millis() as u64);
            async move {
                if n < 3 {
                    Err(DirectoryError::not_found("h1: host not found"))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

        let seen = seen.lock().unwrap();
        let (first, second) = (seen[1] - seen[0], seen[2] - seen[1]);
        assert_eq!((first, second), (20_000, 40_000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_last_not_found() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let err = retry_read(&policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DirectoryError::not_found("h1: host not found")) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1000 + 2000, no sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        match err {
            ReconcileError::TransientUnavailable { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.is_not_found());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let err = retry_read(&policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DirectoryError::rejected(None, "Insufficient access")) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ReconcileError::Conflict(_)));
    }
}
