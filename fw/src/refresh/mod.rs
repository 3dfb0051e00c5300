//! Player refresh sessions
//!
//! A [`RefreshLoop`] cycles through a [`RefreshQueue`](crate::scheduler::RefreshQueue)
//! of player ids, resolving each through the cache or the API and handing the
//! record to a [`UiReconciler`]. Everything a session shares with the rest of
//! the process travels in a [`RefreshContext`].

use std::sync::Arc;

use crate::api::TornApi;
use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::scheduler::{RateLimiter, RefreshConfig};
use crate::settings::SettingsStore;

mod controls;
mod engine;
pub mod reconciler;
mod resolver;

pub use controls::Controls;
pub use engine::{PollMode, RefreshLoop, RefreshState, SessionSummary, StopReason};
pub use reconciler::{ConsoleReconciler, RowLine, UiReconciler};
pub use resolver::{FactionScope, FetchResolver, RecordSource, Resolution, roster_member_ids};

/// Shared handles a refresh session works against
#[derive(Clone)]
pub struct RefreshContext {
    pub api: Arc<dyn TornApi>,
    pub cache: CacheStore,
    pub settings: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
    pub controls: Controls,
    pub config: RefreshConfig,
}

impl RefreshContext {
    /// A fresh rate limiter on this context's clock and config
    pub fn limiter(&self) -> RateLimiter {
        RateLimiter::new(&self.config, self.clock.clone())
    }
}
