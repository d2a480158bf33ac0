//! Bounded retry with exponential backoff around one tier.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::{SoftFailure, TierError};
use super::stats::TierStats;
use crate::page_extractor::ProductRecord;
use crate::utils::constants::{DEFAULT_RETRY_INITIAL_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS};

/// Retry budget and backoff curve for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Growth factor applied per further retry
    pub backoff_multiplier: f64,
    /// Cap for a single delay
    pub max_delay: Duration,
    /// Add up to `initial_delay` of random delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_INITIAL_DELAY_MS),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay after the failed attempt with 0-based index `attempt`, without
    /// jitter: `initial_delay * multiplier^attempt`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.backoff_multiplier.powi(exponent);
        let delay_ms = self.initial_delay.as_millis() as f64 * multiplier;

        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(delay_ms as u64)
    }

    fn sleep_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        let jitter_cap = self.initial_delay.as_millis() as u64;
        if !self.jitter || jitter_cap == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_cap))
    }
}

/// Drive `attempt` until it succeeds, hits a block, or spends the budget.
///
/// The closure receives the 0-based attempt index. Counters on `stats`:
/// every attempt bumps `attempts`; the loop ends with exactly one of
/// `successes` or `failures`, and a block additionally bumps `blocked`.
/// A record that fails [`ProductRecord::is_valid`] is treated as a soft
/// failure.
pub async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    stats: &TierStats,
    mut attempt: F,
) -> Result<ProductRecord, TierError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ProductRecord, TierError>>,
{
    let tier = stats.tier();
    let max_attempts = policy.max_attempts.max(1);
    let mut index = 0;

    loop {
        stats.record_attempt();

        let outcome = match attempt(index).await {
            Ok(record) if record.is_valid() => Ok(record),
            Ok(record) => Err(TierError::Soft(SoftFailure::Incomplete(format!(
                "title={:?} price={}",
                record.title, record.price
            )))),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                stats.record_success();
                info!(%tier, attempt = index + 1, "Tier resolved listing");
                return Ok(record);
            }
            Err(err @ TierError::Blocked { .. }) => {
                stats.record_blocked();
                stats.record_failure();
                warn!(%tier, attempt = index + 1, error = %err, "Tier blocked, not retrying");
                return Err(err);
            }
            Err(err) => {
                if index + 1 >= max_attempts {
                    stats.record_failure();
                    warn!(
                        %tier,
                        attempts = index + 1,
                        error = %err,
                        "Tier failed after exhausting retries"
                    );
                    return Err(err);
                }

                let delay = policy.sleep_for_attempt(index);
                debug!(
                    %tier,
                    attempt = index + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Tier attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tier::TierKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_millis(1))
    }

    #[test]
    fn delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(500),
            jitter: false,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_millis(500));
    }

    #[test]
    fn jitter_stays_within_initial_delay() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.sleep_for_attempt(0);
            assert!(delay >= policy.initial_delay);
            assert!(delay <= policy.initial_delay * 2);
        }
    }

    #[tokio::test]
    async fn exhausts_budget_on_soft_failures() {
        let stats = TierStats::new(TierKind::PrimaryApi);
        let calls = AtomicU32::new(0);

        let result = run_with_retry(&fast_policy(3), &stats, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TierError::Soft(SoftFailure::Network("reset".into()))) }
        })
        .await;

        assert!(matches!(result, Err(TierError::Soft(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let snap = stats.snapshot();
        assert_eq!((snap.attempts, snap.successes, snap.failures, snap.blocked), (3, 0, 1, 0));
    }

    #[tokio::test]
    async fn block_aborts_immediately() {
        let stats = TierStats::new(TierKind::RelayApi);

        let result = run_with_retry(&fast_policy(3), &stats, |_| async {
            Err(TierError::blocked("captcha"))
        })
        .await;

        assert!(matches!(result, Err(TierError::Blocked { .. })));
        let snap = stats.snapshot();
        assert_eq!((snap.attempts, snap.successes, snap.failures, snap.blocked), (1, 0, 1, 1));
    }

    #[tokio::test]
    async fn recovers_after_soft_failure() {
        let stats = TierStats::new(TierKind::BrowserAutomation);

        let result = run_with_retry(&fast_policy(3), &stats, |index| async move {
            if index == 0 {
                Err(TierError::Soft(SoftFailure::Timeout("navigation".into())))
            } else {
                Ok(ProductRecord::new("Item", 12.5))
            }
        })
        .await;

        assert_eq!(result, Ok(ProductRecord::new("Item", 12.5)));
        let snap = stats.snapshot();
        assert_eq!((snap.attempts, snap.successes, snap.failures), (2, 1, 0));
        assert!(snap.last_success_at.is_some());
    }

    #[tokio::test]
    async fn incomplete_record_counts_as_soft_failure() {
        let stats = TierStats::new(TierKind::PrimaryApi);

        let result = run_with_retry(&fast_policy(2), &stats, |_| async {
            Ok(ProductRecord::new("", 10.0))
        })
        .await;

        assert!(matches!(
            result,
            Err(TierError::Soft(SoftFailure::Incomplete(_)))
        ));
        let snap = stats.snapshot();
        assert_eq!((snap.attempts, snap.failures), (2, 1));
    }
}
