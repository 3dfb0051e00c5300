//! factionwatch - rate-limited player status refresh for Torn factions
//!
//! Keeps a list of players current by cycling through them, serving records
//! from a short-lived cache and fetching from the Torn API only when an entry
//! is missing or stale, while staying under the API's per-minute ceiling.
//!
//! # Modules
//!
//! - [`api`] - Torn API trait and reqwest client
//! - [`cache`] - Player record cache with staleness
//! - [`scheduler`] - Refresh queue and fixed-window rate limiter
//! - [`refresh`] - Refresh loop state machine and fetch resolution
//! - [`settings`] - Persisted API key
//! - [`domain`] - Player ids, record views, row filters, page scanning
//! - [`clock`] - Injectable time source
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod domain;
pub mod refresh;
pub mod scheduler;
pub mod settings;

// Re-export commonly used types
pub use api::{ApiError, ApiRequest, EntityType, TornApi, TornClient, create_client};
pub use cache::{CacheEntry, CacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiConfig, Config};
pub use domain::{FilterMode, PlayerId, PlayerView, RowFilter, player_ids_from_page};
pub use refresh::{
    ConsoleReconciler, Controls, FactionScope, FetchResolver, PollMode, RefreshContext, RefreshLoop, RefreshState,
    SessionSummary, StopReason, UiReconciler,
};
pub use scheduler::{RateLimiter, RefreshConfig, RefreshQueue, ScheduleResult};
pub use settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsError, SettingsStore};
