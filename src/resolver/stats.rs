use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};

use super::tier::TierKind;

/// Usage counters for one tier.
///
/// Mutated only by that tier's retry loop; read through [`TierStats::snapshot`].
/// All counters use `Ordering::SeqCst` so a snapshot never shows a terminal
/// counter ahead of the attempt that produced it.
#[derive(Debug)]
pub struct TierStats {
    tier: TierKind,
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    blocked: AtomicU64,
    last_success_at: Mutex<Option<DateTime<Utc>>>,
}

impl TierStats {
    #[must_use]
    pub fn new(tier: TierKind) -> Self {
        Self {
            tier,
            attempts: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            last_success_at: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn tier(&self) -> TierKind {
        self.tier
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        *self.last_success_at.lock() = Some(Utc::now());
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> TierStatsSnapshot {
        TierStatsSnapshot {
            tier: self.tier,
            attempts: self.attempts.load(Ordering::SeqCst),
            successes: self.successes.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            blocked: self.blocked.load(Ordering::SeqCst),
            last_success_at: *self.last_success_at.lock(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStatsSnapshot {
    pub tier: TierKind,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub blocked: u64,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl TierStatsSnapshot {
    /// Completed retry loops (each ends in exactly one success or failure)
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.successes + self.failures
    }

    /// Share of completed loops that succeeded; 0.0 before any completed.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.completed();
        if total == 0 {
            return 0.0;
        }
        self.successes as f64 / total as f64
    }
}

// `successRate` is derived from the counters, so the impl is written out
impl Serialize for TierStatsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TierStatsSnapshot", 7)?;
        state.serialize_field("tier", &self.tier)?;
        state.serialize_field("attempts", &self.attempts)?;
        state.serialize_field("successes", &self.successes)?;
        state.serialize_field("failures", &self.failures)?;
        state.serialize_field("blocked", &self.blocked)?;
        state.serialize_field("successRate", &self.success_rate())?;
        state.serialize_field("lastSuccessAt", &self.last_success_at)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = TierStats::new(TierKind::RelayApi);
        stats.record_attempt();
        stats.record_attempt();
        stats.record_failure();
        stats.record_attempt();
        stats.record_success();

        let snap = stats.snapshot();
        assert_eq!(snap.tier, TierKind::RelayApi);
        assert_eq!(snap.attempts, 3);
        assert_eq!(snap.successes, 1);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.blocked, 0);
        assert!(snap.last_success_at.is_some());
        assert!((snap.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_is_zero_without_history() {
        let snap = TierStats::new(TierKind::PrimaryApi).snapshot();
        assert_eq!(snap.success_rate(), 0.0);
        assert_eq!(snap.last_success_at, None);
    }

    #[test]
    fn serialized_snapshot_carries_success_rate() {
        let stats = TierStats::new(TierKind::BrowserAutomation);
        stats.record_attempt();
        stats.record_success();
        stats.record_attempt();
        stats.record_blocked();
        stats.record_failure();

        let json = serde_json::to_value(stats.snapshot()).expect("serializes");
        assert_eq!(json["tier"], "browser_automation");
        assert_eq!(json["attempts"], 2);
        assert_eq!(json["blocked"], 1);
        assert_eq!(json["successRate"], 0.5);
        assert!(json["lastSuccessAt"].is_string());
    }
}
