//! Player record cache with time-based staleness

mod store;

pub use store::{CacheEntry, CacheStore};
