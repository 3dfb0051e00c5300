//! Refresh pacing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate limit, pacing and cache freshness settings for a refresh session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Max API calls per rate window
    #[serde(rename = "max-requests-per-window")]
    pub max_requests_per_window: u32,

    /// Rate window duration in seconds
    #[serde(rename = "rate-window-secs")]
    pub rate_window_secs: u64,

    /// Pause after each resolved record, in milliseconds
    #[serde(rename = "query-delay-ms")]
    pub query_delay_ms: u64,

    /// Cached records older than this are refetched
    #[serde(rename = "stale-after-secs")]
    pub stale_after_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 60,
            rate_window_secs: 60,
            query_delay_ms: 300,
            stale_after_secs: 30,
        }
    }
}

impl RefreshConfig {
    /// Get the rate window as a Duration
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RefreshConfig::default();
        assert_eq!(config.max_requests_per_window, 60);
        assert_eq!(config.rate_window_secs, 60);
        assert_eq!(config.query_delay_ms, 300);
        assert_eq!(config.stale_after_secs, 30);
    }

    #[test]
    fn test_durations() {
        let config = RefreshConfig {
            rate_window_secs: 120,
            query_delay_ms: 50,
            ..Default::default()
        };
        assert_eq!(config.rate_window(), Duration::from_secs(120));
        assert_eq!(config.query_delay(), Duration::from_millis(50));
        assert_eq!(config.stale_after(), Duration::from_secs(30));
    }
}
