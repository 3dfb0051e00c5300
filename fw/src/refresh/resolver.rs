//! Cache-or-remote record resolution

use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiError, ApiRequest};
use crate::domain::PlayerId;
use crate::scheduler::RateLimiter;

use super::RefreshContext;

/// Which faction roster to piggyback on cache misses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactionScope {
    /// The key owner's faction
    Own,
    Id(u64),
}

impl FactionScope {
    pub fn id(self) -> Option<u64> {
        match self {
            Self::Own => None,
            Self::Id(id) => Some(id),
        }
    }
}

impl From<Option<u64>> for FactionScope {
    fn from(id: Option<u64>) -> Self {
        match id {
            Some(id) => Self::Id(id),
            None => Self::Own,
        }
    }
}

/// Where a resolved record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Cache,
    Remote,
}

/// A resolved player record
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: Value,
    pub source: RecordSource,
}

/// Member ids of a roster body, in ascending order
pub fn roster_member_ids(roster: &Value) -> Vec<PlayerId> {
    let mut ids: Vec<PlayerId> = roster
        .get("members")
        .and_then(Value::as_object)
        .map(|members| members.keys().filter_map(|k| k.parse().ok()).collect())
        .unwrap_or_default();
    ids.sort();
    ids
}

/// Resolves player records from the cache, falling back to the API
pub struct FetchResolver {
    ctx: RefreshContext,
    faction: Option<FactionScope>,
}

impl FetchResolver {
    pub fn new(ctx: RefreshContext) -> Self {
        Self { ctx, faction: None }
    }

    /// Also refresh this faction's roster on every cache miss
    pub fn with_faction(mut self, scope: FactionScope) -> Self {
        self.faction = Some(scope);
        self
    }

    pub fn faction(&self) -> Option<FactionScope> {
        self.faction
    }

    /// Resolve the record for `player_id`
    ///
    /// Fresh cache entries are returned without touching the limiter. Missing
    /// or stale entries are fetched (each request gated by `limiter`) and
    /// written to the cache before being returned. Every resolution is
    /// followed by the configured query delay.
    pub async fn resolve(&self, player_id: PlayerId, limiter: &mut RateLimiter) -> Result<Resolution, ApiError> {
        debug!(%player_id, "resolve: called");
        let dev = self.ctx.controls.dev_mode();
        let now = self.ctx.clock.epoch_secs();

        let cached = match self.ctx.cache.get(player_id).await {
            Some(entry) if !entry.is_stale(now, self.ctx.config.stale_after()) => {
                if dev {
                    info!(%player_id, age_secs = entry.age_secs(now), "Cache hit");
                } else {
                    debug!(%player_id, age_secs = entry.age_secs(now), "resolve: cache hit");
                }
                Some(entry.record)
            }
            Some(entry) => {
                if dev {
                    info!(%player_id, age_secs = entry.age_secs(now), "Cache expired");
                } else {
                    debug!(%player_id, age_secs = entry.age_secs(now), "resolve: cache expired");
                }
                None
            }
            None => {
                if dev {
                    info!(%player_id, "Missed cache");
                } else {
                    debug!(%player_id, "resolve: cache miss");
                }
                None
            }
        };

        let resolution = match cached {
            Some(record) => Resolution {
                record,
                source: RecordSource::Cache,
            },
            None => Resolution {
                record: self.fetch_player(player_id, limiter).await?,
                source: RecordSource::Remote,
            },
        };

        self.ctx.clock.sleep(self.ctx.config.query_delay()).await;
        Ok(resolution)
    }

    /// Fetch a player (and the scoped roster) from the API and cache both
    async fn fetch_player(&self, player_id: PlayerId, limiter: &mut RateLimiter) -> Result<Value, ApiError> {
        debug!(%player_id, "fetch_player: called");
        let api_key = self.api_key()?;

        if let Some(scope) = self.faction {
            debug!(?scope, "fetch_player: refreshing faction roster first");
            self.fetch_roster_with_key(scope, &api_key, limiter).await?;
        }

        limiter.acquire().await;
        let body = self.ctx.api.fetch(&ApiRequest::user(player_id), &api_key).await?;
        self.ctx
            .cache
            .put_response(Some(player_id), &body, self.ctx.clock.epoch_secs())
            .await;
        Ok(body)
    }

    /// Fetch a faction roster and cache every member
    pub async fn fetch_roster(&self, scope: FactionScope, limiter: &mut RateLimiter) -> Result<Value, ApiError> {
        debug!(?scope, "fetch_roster: called");
        let api_key = self.api_key()?;
        self.fetch_roster_with_key(scope, &api_key, limiter).await
    }

    async fn fetch_roster_with_key(
        &self,
        scope: FactionScope,
        api_key: &str,
        limiter: &mut RateLimiter,
    ) -> Result<Value, ApiError> {
        limiter.acquire().await;
        let roster = self.ctx.api.fetch(&ApiRequest::faction(scope.id()), api_key).await?;
        let written = self
            .ctx
            .cache
            .put_response(None, &roster, self.ctx.clock.epoch_secs())
            .await;
        debug!(written, "fetch_roster_with_key: roster cached");
        Ok(roster)
    }

    /// Current API key, failing fast when none is set
    fn api_key(&self) -> Result<String, ApiError> {
        let settings = self.ctx.settings.load()?;
        if !settings.has_key() {
            debug!("api_key: no key configured");
            return Err(ApiError::MissingKey);
        }
        Ok(settings.api_key)
    }
}
