//! Scheduling for refresh sessions
//!
//! The round-robin player queue and the fixed-window rate limiter that
//! paces API calls.

mod config;
mod core;
mod queue;

pub use config::RefreshConfig;
pub use self::core::{RateLimiter, RateWindow, ScheduleResult};
pub use queue::RefreshQueue;
