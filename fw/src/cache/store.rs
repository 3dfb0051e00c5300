//! In-memory player record cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::PlayerId;

/// Most recent record for one player
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub player_id: PlayerId,
    pub record: Value,
    /// Epoch seconds the record describes
    pub fetched_at: i64,
}

impl CacheEntry {
    pub fn new(player_id: PlayerId, record: Value, fetched_at: i64) -> Self {
        Self {
            player_id,
            record,
            fetched_at,
        }
    }

    pub fn age_secs(&self, now: i64) -> i64 {
        now - self.fetched_at
    }

    /// Older than `max_age`; an entry exactly `max_age` old is still fresh
    pub fn is_stale(&self, now: i64, max_age: Duration) -> bool {
        self.age_secs(now) > max_age.as_secs() as i64
    }
}

/// Process-wide record cache shared by every refresh session
///
/// Cloning yields another handle to the same entries. There is no eviction;
/// the entry count is bounded by the players an operator watches.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<PlayerId, CacheEntry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, player_id: PlayerId) -> Option<CacheEntry> {
        debug!(%player_id, "CacheStore::get: called");
        self.entries.read().await.get(&player_id).cloned()
    }

    /// Insert or overwrite the entry for `entry.player_id`
    pub async fn put(&self, entry: CacheEntry) {
        debug!(player_id = %entry.player_id, fetched_at = entry.fetched_at, "CacheStore::put: called");
        self.entries.write().await.insert(entry.player_id, entry);
    }

    /// Write many records sharing one timestamp (a faction roster)
    pub async fn put_batch<I>(&self, records: I, timestamp: i64) -> usize
    where
        I: IntoIterator<Item = (PlayerId, Value)>,
    {
        let mut entries = self.entries.write().await;
        let mut written = 0;
        for (player_id, record) in records {
            entries.insert(player_id, CacheEntry::new(player_id, record, timestamp));
            written += 1;
        }
        debug!(written, timestamp, "CacheStore::put_batch: done");
        written
    }

    /// Cache an API response of either shape
    ///
    /// A body with a `members` map is a faction roster and every member is
    /// written with the roster `timestamp`. Anything else is the record of
    /// `requested`. Bodies without a `timestamp` are stamped with `now`.
    /// Returns the number of entries written.
    pub async fn put_response(&self, requested: Option<PlayerId>, response: &Value, now: i64) -> usize {
        let timestamp = response.get("timestamp").and_then(Value::as_i64).unwrap_or(now);

        if let Some(members) = response.get("members").and_then(Value::as_object) {
            debug!(count = members.len(), timestamp, "CacheStore::put_response: roster");
            let records = members.iter().filter_map(|(key, record)| match key.parse::<PlayerId>() {
                Ok(id) => Some((id, record.clone())),
                Err(_) => {
                    debug!(%key, "CacheStore::put_response: skipping non-numeric member key");
                    None
                }
            });
            return self.put_batch(records.collect::<Vec<_>>(), timestamp).await;
        }

        match requested {
            Some(player_id) => {
                debug!(%player_id, timestamp, "CacheStore::put_response: single player");
                self.put(CacheEntry::new(player_id, response.clone(), timestamp)).await;
                1
            }
            None => {
                debug!("CacheStore::put_response: no roster and no player id, nothing cached");
                0
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All entries ordered by player id
    pub async fn snapshot(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<_> = self.entries.read().await.values().cloned().collect();
        entries.sort_by_key(|e| e.player_id);
        entries
    }
}
