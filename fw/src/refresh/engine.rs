//! Refresh loop state machine

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::api::ApiError;
use crate::domain::PlayerId;
use crate::scheduler::{RateLimiter, RefreshQueue, ScheduleResult};

use super::reconciler::UiReconciler;
use super::resolver::{FactionScope, FetchResolver, RecordSource, roster_member_ids};
use super::RefreshContext;

/// Longest uninterrupted sleep while waiting for the rate window
const WAIT_SLICE: Duration = Duration::from_secs(1);

/// Why a session stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Auto-refresh was switched off
    Disabled,
    /// Every queued player was visited once (single pass only)
    Exhausted,
    /// A fetch failed; the session was torn down
    Failed { kind: &'static str, message: String },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "auto refresh disabled"),
            Self::Exhausted => write!(f, "all players refreshed"),
            Self::Failed { kind, message } => write!(f, "{} error: {}", kind, message),
        }
    }
}

/// Current phase of a refresh session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    /// No active session
    Idle,
    /// Deciding what to do next
    Running,
    /// Rate window exhausted, waiting for it to reset
    Waiting { retry_after: Duration },
    /// Resolving the head of the queue
    Fetching { player_id: PlayerId },
    Stopped(StopReason),
}

/// What happens to a player after it is refreshed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollMode {
    /// Requeue to the tail and keep cycling
    #[default]
    Continuous,
    /// Drop from the queue; stop once the queue is empty
    SinglePass,
}

/// Counters for a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub stop_reason: StopReason,
    pub reconciled: u64,
    pub remote_calls: u64,
    pub cache_hits: u64,
    pub deferrals: u64,
}

/// Drives one refresh session over a queue of player ids
///
/// Each [`step`](RefreshLoop::step) performs one state transition. One fetch
/// is in flight at a time. Disabling auto-refresh through the shared
/// [`Controls`](super::Controls) takes effect at the next transition out of
/// `Running` or after the in-flight fetch completes.
pub struct RefreshLoop {
    ctx: RefreshContext,
    resolver: FetchResolver,
    queue: RefreshQueue,
    limiter: RateLimiter,
    reconciler: Arc<dyn UiReconciler>,
    mode: PollMode,
    state: RefreshState,
    reconciled: u64,
    cache_hits: u64,
    calls_at_start: u64,
    deferrals_at_start: u64,
}

impl RefreshLoop {
    pub fn new(ctx: RefreshContext, queue: RefreshQueue, reconciler: Arc<dyn UiReconciler>) -> Self {
        debug!(queued = queue.len(), "RefreshLoop::new: called");
        Self {
            resolver: FetchResolver::new(ctx.clone()),
            limiter: ctx.limiter(),
            ctx,
            queue,
            reconciler,
            mode: PollMode::default(),
            state: RefreshState::Idle,
            reconciled: 0,
            cache_hits: 0,
            calls_at_start: 0,
            deferrals_at_start: 0,
        }
    }

    /// Refresh this faction's roster alongside every cache miss
    pub fn with_faction(mut self, scope: FactionScope) -> Self {
        self.resolver = FetchResolver::new(self.ctx.clone()).with_faction(scope);
        self
    }

    pub fn with_mode(mut self, mode: PollMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    pub fn queue(&self) -> &RefreshQueue {
        &self.queue
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut RateLimiter {
        &mut self.limiter
    }

    /// Queue every member of the session's faction roster
    ///
    /// Failure tears the session down exactly like a failed fetch.
    pub async fn seed_from_roster(&mut self) -> Result<usize, ApiError> {
        let Some(scope) = self.resolver.faction() else {
            debug!("seed_from_roster: no faction scope");
            return Ok(0);
        };
        debug!(?scope, "seed_from_roster: called");

        match self.resolver.fetch_roster(scope, &mut self.limiter).await {
            Ok(roster) => {
                let added = roster_member_ids(&roster)
                    .into_iter()
                    .filter(|id| self.queue.enqueue(*id))
                    .count();
                info!(added, queued = self.queue.len(), "Seeded queue from faction roster");
                Ok(added)
            }
            Err(e) => {
                self.state = self.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Perform one state transition and return the new state
    pub async fn step(&mut self) -> &RefreshState {
        let next = match self.state.clone() {
            RefreshState::Idle => {
                info!(queued = self.queue.len(), mode = ?self.mode, "Starting refresh session");
                RefreshState::Running
            }
            RefreshState::Running => self.decide().await,
            RefreshState::Waiting { retry_after } => {
                debug!(?retry_after, "step: waiting for rate window");
                self.wait(retry_after).await;
                RefreshState::Running
            }
            RefreshState::Fetching { player_id } => self.fetch(player_id).await,
            RefreshState::Stopped(reason) => {
                debug!(%reason, "step: already stopped");
                RefreshState::Stopped(reason)
            }
        };
        self.state = next;
        &self.state
    }

    /// Step until the session stops
    pub async fn run(&mut self) -> SessionSummary {
        debug!("run: called");
        loop {
            if let RefreshState::Stopped(reason) = self.step().await {
                let reason = reason.clone();
                info!(%reason, reconciled = self.reconciled, "Refresh session stopped");
                return self.summary(reason);
            }
        }
    }

    /// Return a stopped loop to `Idle` with a new queue
    ///
    /// Session counters start over. The limiter keeps its current window, so
    /// calls made by the previous session still count against the ceiling.
    pub fn reset(&mut self, queue: RefreshQueue) {
        debug!(queued = queue.len(), "reset: called");
        self.queue = queue;
        self.state = RefreshState::Idle;
        self.reconciled = 0;
        self.cache_hits = 0;
        self.calls_at_start = self.limiter.total_calls();
        self.deferrals_at_start = self.limiter.total_deferrals();
    }

    fn summary(&self, stop_reason: StopReason) -> SessionSummary {
        SessionSummary {
            stop_reason,
            reconciled: self.reconciled,
            remote_calls: self.limiter.total_calls() - self.calls_at_start,
            cache_hits: self.cache_hits,
            deferrals: self.limiter.total_deferrals() - self.deferrals_at_start,
        }
    }

    /// Sleep out `retry_after`, returning early once auto-refresh is disabled
    async fn wait(&self, retry_after: Duration) {
        let mut remaining = retry_after;
        while !remaining.is_zero() {
            if !self.ctx.controls.auto_refresh_enabled() {
                debug!(?remaining, "wait: auto refresh disabled, cutting wait short");
                return;
            }
            let slice = remaining.min(WAIT_SLICE);
            self.ctx.clock.sleep(slice).await;
            remaining -= slice;
        }
    }

    async fn decide(&mut self) -> RefreshState {
        if !self.ctx.controls.auto_refresh_enabled() {
            debug!("decide: auto refresh disabled");
            self.clear_queue().await;
            return RefreshState::Stopped(StopReason::Disabled);
        }

        let Some(player_id) = self.queue.peek() else {
            debug!("decide: queue empty");
            return RefreshState::Stopped(StopReason::Exhausted);
        };

        match self.limiter.schedule() {
            ScheduleResult::Ready => RefreshState::Fetching { player_id },
            ScheduleResult::RateLimited { retry_after } => {
                info!(
                    wait_secs = self.limiter.seconds_until_reset(),
                    "Hit local API query limit, deferring"
                );
                RefreshState::Waiting { retry_after }
            }
        }
    }

    async fn fetch(&mut self, player_id: PlayerId) -> RefreshState {
        debug!(%player_id, "fetch: called");
        let resolution = match self.resolver.resolve(player_id, &mut self.limiter).await {
            Ok(resolution) => resolution,
            Err(e) => return self.fail(&e).await,
        };

        if resolution.source == RecordSource::Cache {
            self.cache_hits += 1;
        }
        self.reconciler.reconcile(player_id, &resolution.record);
        self.reconciled += 1;

        if !self.ctx.controls.auto_refresh_enabled() {
            debug!(%player_id, "fetch: auto refresh disabled after fetch");
            self.clear_queue().await;
            return RefreshState::Stopped(StopReason::Disabled);
        }

        match self.mode {
            PollMode::Continuous => {
                self.queue.requeue();
            }
            PollMode::SinglePass => {
                self.queue.dequeue();
            }
        }
        RefreshState::Running
    }

    /// Session teardown after a fetch error
    async fn fail(&mut self, err: &ApiError) -> RefreshState {
        error!(kind = err.kind(), "Refresh failed: {}", err);
        self.clear_queue().await;
        self.ctx.controls.disable_auto_refresh();
        self.reconciler.report_failure(err);
        RefreshState::Stopped(StopReason::Failed {
            kind: err.kind(),
            message: err.to_string(),
        })
    }

    async fn clear_queue(&mut self) {
        debug!(queued = self.queue.len(), "clear_queue: called");
        self.queue.clear();
        if self.ctx.controls.dev_mode() {
            for entry in self.ctx.cache.snapshot().await {
                info!(
                    player_id = %entry.player_id,
                    fetched_at = entry.fetched_at,
                    record = %entry.record,
                    "Cache dump"
                );
            }
        }
    }
}
