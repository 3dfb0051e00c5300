//! Domain types for factionwatch
//!
//! Player identifiers, read-only views over API records, row filter
//! predicates and page scanning.

mod filter;
mod page;
mod player;

pub use filter::{FilterMode, HideReason, RowFilter};
pub use page::player_ids_from_page;
pub use player::{ActivityStatus, PlayerId, PlayerView, StatusColor};
