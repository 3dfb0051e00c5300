//! Fixed-window rate limiter

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, elapsed_between};

use super::config::RefreshConfig;

/// Result of asking the limiter for a call slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleResult {
    /// Can call immediately
    Ready,

    /// Window ceiling reached, try again after the window resets
    RateLimited { retry_after: Duration },
}

/// Call counter for one fixed window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    pub window_start: DateTime<Utc>,
    pub calls_in_window: u32,
    pub ceiling: u32,
    pub reset_period: Duration,
}

impl RateWindow {
    pub fn new(window_start: DateTime<Utc>, ceiling: u32, reset_period: Duration) -> Self {
        Self {
            window_start,
            calls_in_window: 0,
            ceiling,
            reset_period,
        }
    }

    /// Start a fresh window if the current one has run its full period
    fn roll(&mut self, now: DateTime<Utc>) -> bool {
        if elapsed_between(self.window_start, now) < self.reset_period {
            return false;
        }
        debug!(calls = self.calls_in_window, "RateWindow::roll: window reset");
        self.calls_in_window = 0;
        self.window_start = now;
        true
    }

    pub fn should_proceed(&mut self, now: DateTime<Utc>) -> bool {
        self.roll(now);
        self.calls_in_window < self.ceiling
    }

    pub fn record_call(&mut self, now: DateTime<Utc>) {
        self.roll(now);
        self.calls_in_window += 1;
    }

    /// Time left until the window resets
    pub fn retry_after(&self, now: DateTime<Utc>) -> Duration {
        self.reset_period
            .saturating_sub(elapsed_between(self.window_start, now))
    }

    /// `retry_after` rounded up to whole seconds
    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> u64 {
        let remaining = self.retry_after(now);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }
}

/// Cooperative throttle in front of the API's flood protection
///
/// Owned by one refresh session. Callers ask [`should_proceed`] before a
/// poll and call [`record_call`] exactly once per request sent; [`acquire`]
/// does both, waiting out the window when the ceiling is hit.
///
/// [`should_proceed`]: RateLimiter::should_proceed
/// [`record_call`]: RateLimiter::record_call
/// [`acquire`]: RateLimiter::acquire
pub struct RateLimiter {
    window: RateWindow,
    clock: Arc<dyn Clock>,
    total_calls: u64,
    total_deferrals: u64,
}

impl RateLimiter {
    pub fn new(config: &RefreshConfig, clock: Arc<dyn Clock>) -> Self {
        debug!(?config, "RateLimiter::new: called");
        let ceiling = if config.max_requests_per_window == 0 {
            warn!("max-requests-per-window is 0, using 1");
            1
        } else {
            config.max_requests_per_window
        };
        Self {
            window: RateWindow::new(clock.now(), ceiling, config.rate_window()),
            clock,
            total_calls: 0,
            total_deferrals: 0,
        }
    }

    pub fn should_proceed(&mut self) -> bool {
        let now = self.clock.now();
        self.window.should_proceed(now)
    }

    pub fn record_call(&mut self) {
        let now = self.clock.now();
        self.window.record_call(now);
        self.total_calls += 1;
        debug!(
            calls_in_window = self.window.calls_in_window,
            ceiling = self.window.ceiling,
            "RateLimiter::record_call: recorded"
        );
    }

    pub fn retry_after(&self) -> Duration {
        self.window.retry_after(self.clock.now())
    }

    pub fn seconds_until_reset(&self) -> u64 {
        self.window.seconds_until_reset(self.clock.now())
    }

    /// Check for a slot without consuming it
    pub fn schedule(&mut self) -> ScheduleResult {
        if self.should_proceed() {
            return ScheduleResult::Ready;
        }
        self.total_deferrals += 1;
        let retry_after = self.retry_after();
        debug!(?retry_after, "RateLimiter::schedule: rate limited");
        ScheduleResult::RateLimited { retry_after }
    }

    /// Take a slot, sleeping on the clock until one is free
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&mut self) -> Duration {
        let mut waited = Duration::ZERO;
        loop {
            match self.schedule() {
                ScheduleResult::Ready => {
                    self.record_call();
                    return waited;
                }
                ScheduleResult::RateLimited { retry_after } => {
                    info!(
                        ceiling = self.window.ceiling,
                        wait_secs = self.seconds_until_reset(),
                        "Hit local API query limit, waiting for window reset"
                    );
                    self.clock.sleep(retry_after).await;
                    waited += retry_after;
                }
            }
        }
    }

    pub fn calls_in_window(&self) -> u32 {
        self.window.calls_in_window
    }

    pub fn ceiling(&self) -> u32 {
        self.window.ceiling
    }

    pub fn window(&self) -> &RateWindow {
        &self.window
    }

    /// Calls recorded over the limiter's lifetime
    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    /// Times `schedule` answered RateLimited
    pub fn total_deferrals(&self) -> u64 {
        self.total_deferrals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(ceiling: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch(1_000_000));
        let config = RefreshConfig {
            max_requests_per_window: ceiling,
            rate_window_secs: 60,
            ..Default::default()
        };
        (RateLimiter::new(&config, clock.clone()), clock)
    }

    #[test]
    fn test_ceiling_blocks_within_window() {
        let (mut limiter, clock) = limiter(60);

        for _ in 0..60 {
            assert!(limiter.should_proceed());
            limiter.record_call();
        }
        assert_eq!(limiter.calls_in_window(), 60);

        // 61st attempt in the same window
        assert!(!limiter.should_proceed());
        clock.advance(Duration::from_secs(30));
        assert!(!limiter.should_proceed());
    }

    #[test]
    fn test_over_ceiling_stays_blocked() {
        let (mut limiter, _clock) = limiter(3);
        for _ in 0..4 {
            limiter.record_call();
        }
        assert_eq!(limiter.calls_in_window(), 4);
        assert!(!limiter.should_proceed());
    }

    #[test]
    fn test_window_resets_after_period() {
        let (mut limiter, clock) = limiter(2);
        limiter.record_call();
        limiter.record_call();
        assert!(!limiter.should_proceed());

        clock.advance(Duration::from_secs(61));
        limiter.record_call();
        assert_eq!(limiter.calls_in_window(), 1);
        assert!(limiter.should_proceed());
    }

    #[test]
    fn test_window_resets_exactly_at_period() {
        let (mut limiter, clock) = limiter(1);
        limiter.record_call();
        assert!(!limiter.should_proceed());

        clock.advance(Duration::from_secs(60));
        assert!(limiter.should_proceed());
        assert_eq!(limiter.calls_in_window(), 0);
    }

    #[test]
    fn test_seconds_until_reset() {
        let (mut limiter, clock) = limiter(1);
        limiter.record_call();
        assert_eq!(limiter.seconds_until_reset(), 60);

        clock.advance(Duration::from_millis(10_500));
        assert_eq!(limiter.retry_after(), Duration::from_millis(49_500));
        assert_eq!(limiter.seconds_until_reset(), 50);
    }

    #[test]
    fn test_schedule_counts_deferrals() {
        let (mut limiter, _clock) = limiter(1);
        assert_eq!(limiter.schedule(), ScheduleResult::Ready);
        limiter.record_call();
        assert!(matches!(limiter.schedule(), ScheduleResult::RateLimited { .. }));
        assert_eq!(limiter.total_deferrals(), 1);
    }

    #[tokio::test]
    async fn test_acquire_waits_out_window() {
        let (mut limiter, clock) = limiter(2);
        assert_eq!(limiter.acquire().await, Duration::ZERO);
        assert_eq!(limiter.acquire().await, Duration::ZERO);

        let waited = limiter.acquire().await;
        assert_eq!(waited, Duration::from_secs(60));
        assert_eq!(clock.total_slept(), Duration::from_secs(60));
        assert_eq!(limiter.calls_in_window(), 1);
        assert_eq!(limiter.total_calls(), 3);
    }

    #[test]
    fn test_zero_ceiling_clamped() {
        let (limiter, _clock) = limiter(0);
        assert_eq!(limiter.ceiling(), 1);
    }
}
