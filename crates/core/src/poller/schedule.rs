//! Bounded retry of an idempotent probe.

use std::future::Future;
use std::time::Duration;

use crate::config::{PollingConfig, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS};

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// Condition holds; stop with this value.
    Ready(T),
    /// Not yet; try again after the interval.
    Pending,
}

/// Why [`PollSchedule::run`] stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The probe failed; no further attempts were made.
    Failed(E),
    /// Every attempt came back pending.
    Exhausted { attempts: u32 },
}

/// Fixed-interval, fixed-budget polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl From<&PollingConfig> for PollSchedule {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }
}

impl PollSchedule {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Run `probe` until it is ready, fails, or the attempt budget is spent.
    ///
    /// Probes run strictly one after another, starting at attempt 1, with
    /// `interval` between consecutive probes. No wait follows the last one.
    pub async fn run<T, E, F, Fut>(&self, mut probe: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Attempt<T>, E>>,
    {
        for attempt in 1..=self.max_attempts {
            match probe(attempt).await.map_err(RetryError::Failed)? {
                Attempt::Ready(value) => return Ok(value),
                Attempt::Pending if attempt < self.max_attempts => {
                    tokio::time::sleep(self.interval).await;
                }
                Attempt::Pending => {}
            }
        }

        Err(RetryError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// Upper bound on the time spent waiting between probes.
    pub fn total_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_attempt_does_not_wait() {
        let schedule = PollSchedule::new(Duration::from_secs(2), 30);
        let start = Instant::now();

        let result: Result<u32, RetryError<()>> =
            schedule
                .run(|attempt| async move { Ok::<_, ()>(Attempt::Ready(attempt)) })
                .await;

        assert_eq!(result, Ok(1));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_budget() {
        let schedule = PollSchedule::new(Duration::from_secs(2), 5);
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), RetryError<()>> = schedule
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<Attempt<()>, ()>(Attempt::Pending) }
            })
            .await;

        assert_eq!(result, Err(RetryError::Exhausted { attempts: 5 }));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(8));
        assert_eq!(schedule.total_wait(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_immediately() {
        let schedule = PollSchedule::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), RetryError<&str>> = schedule
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 3 {
                        Err::<Attempt<()>, &str>("boom")
                    } else {
                        Ok(Attempt::Pending)
                    }
                }
            })
            .await;

        assert_eq!(result, Err(RetryError::Failed("boom")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_budget_never_probes() {
        let schedule = PollSchedule::new(Duration::from_millis(1), 0);
        let calls = AtomicU32::new(0);

        let result: Result<(), RetryError<()>> = schedule
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<Attempt<()>, ()>(Attempt::Pending) }
            })
            .await;

        assert_eq!(result, Err(RetryError::Exhausted { attempts: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let schedule = PollSchedule::from(&PollingConfig {
            interval_ms: 250,
            max_attempts: 4,
        });
        assert_eq!(schedule.interval, Duration::from_millis(250));
        assert_eq!(schedule.max_attempts, 4);
    }
}
