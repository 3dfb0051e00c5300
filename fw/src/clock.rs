//! Time source for the refresh pipeline
//!
//! Everything time-dependent (cache staleness, the rate window, the pacing
//! delay) goes through a [`Clock`] so sessions can run against a manual clock
//! in tests instead of wall-clock timers.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);

    /// Current time in whole epoch seconds (the unit API timestamps use)
    fn epoch_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Time elapsed from `earlier` to `later`, clamped at zero
pub fn elapsed_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// Wall clock backed by tokio timers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when told to
///
/// `sleep` advances the clock by the requested duration and returns
/// immediately, so a session that would wait a minute for its rate window
/// completes instantly while observing the same timestamps.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
    slept_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        debug!(%start, "ManualClock::new: called");
        Self {
            now_ms: AtomicI64::new(start.timestamp_millis()),
            slept_ms: AtomicU64::new(0),
        }
    }

    /// Start at the given epoch second
    pub fn at_epoch(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn advance(&self, duration: Duration) {
        debug!(?duration, "ManualClock::advance: called");
        self.now_ms.fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }

    /// Total time spent in `sleep`
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.slept_ms.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_sleep_advances() {
        let clock = ManualClock::at_epoch(1_000);
        assert_eq!(clock.epoch_secs(), 1_000);

        clock.sleep(Duration::from_millis(1_500)).await;
        assert_eq!(clock.now().timestamp_millis(), 1_001_500);
        assert_eq!(clock.total_slept(), Duration::from_millis(1_500));

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.epoch_secs(), 1_011);
        // advance is not counted as sleeping
        assert_eq!(clock.total_slept(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_elapsed_between_clamps_negative() {
        let a = DateTime::from_timestamp(100, 0).unwrap();
        let b = DateTime::from_timestamp(160, 0).unwrap();
        assert_eq!(elapsed_between(a, b), Duration::from_secs(60));
        assert_eq!(elapsed_between(b, a), Duration::ZERO);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.epoch_secs() > 1_577_836_800);
    }
}
