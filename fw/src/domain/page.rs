//! Player id extraction from saved list pages

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::player::PlayerId;

static XID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"XID=(\d+)").expect("XID pattern is valid"));

/// Collect player ids from every `XID=<digits>` profile link in `text`
///
/// Ids keep page order; repeats (a row usually links the player twice)
/// are dropped after the first occurrence.
pub fn player_ids_from_page(text: &str) -> Vec<PlayerId> {
    debug!(text_len = text.len(), "player_ids_from_page: called");
    let mut seen = HashSet::new();
    let ids: Vec<PlayerId> = XID_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u64>().ok())
        .map(PlayerId)
        .filter(|id| seen.insert(*id))
        .collect();
    debug!(count = ids.len(), "player_ids_from_page: extracted");
    ids
}
