//! Round-robin queue of players to poll

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::PlayerId;

/// Ordered working set of player ids
///
/// FIFO with a `requeue` that rotates the head to the tail, which is how a
/// session cycles through its players. An id is held at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshQueue {
    ids: VecDeque<PlayerId>,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `ids` in first-seen order, duplicates dropped
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = PlayerId>,
    {
        let mut queue = Self::new();
        for id in ids {
            queue.enqueue(id);
        }
        debug!(len = queue.len(), "RefreshQueue::from_ids: built");
        queue
    }

    /// Append `id`; returns false (and changes nothing) if already queued
    pub fn enqueue(&mut self, id: PlayerId) -> bool {
        if self.ids.contains(&id) {
            debug!(%id, "RefreshQueue::enqueue: already queued");
            return false;
        }
        self.ids.push_back(id);
        true
    }

    pub fn dequeue(&mut self) -> Option<PlayerId> {
        self.ids.pop_front()
    }

    pub fn peek(&self) -> Option<PlayerId> {
        self.ids.front().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.ids.contains(&id)
    }

    /// Move the head to the tail, returning it
    pub fn requeue(&mut self) -> Option<PlayerId> {
        let head = self.ids.pop_front()?;
        self.ids.push_back(head);
        Some(head)
    }

    pub fn clear(&mut self) {
        debug!(len = self.ids.len(), "RefreshQueue::clear: called");
        self.ids.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<PlayerId> for RefreshQueue {
    fn from_iter<T: IntoIterator<Item = PlayerId>>(iter: T) -> Self {
        Self::from_ids(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ids(values: &[u64]) -> Vec<PlayerId> {
        values.iter().copied().map(PlayerId).collect()
    }

    #[test]
    fn test_from_ids_dedups_keeping_first() {
        let queue = RefreshQueue::from_ids(ids(&[3, 1, 3, 2, 1]));
        assert_eq!(queue.iter().collect::<Vec<_>>(), ids(&[3, 1, 2]));
    }

    #[test]
    fn test_fifo() {
        let mut queue: RefreshQueue = ids(&[1, 2]).into_iter().collect();
        assert_eq!(queue.peek(), Some(PlayerId(1)));
        assert_eq!(queue.dequeue(), Some(PlayerId(1)));
        assert_eq!(queue.dequeue(), Some(PlayerId(2)));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enqueue_duplicate_is_noop() {
        let mut queue = RefreshQueue::from_ids(ids(&[1, 2]));
        assert!(!queue.enqueue(PlayerId(1)));
        assert!(queue.enqueue(PlayerId(3)));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_requeue_rotates_head() {
        let mut queue = RefreshQueue::from_ids(ids(&[1, 2, 3]));
        assert_eq!(queue.requeue(), Some(PlayerId(1)));
        assert_eq!(queue.iter().collect::<Vec<_>>(), ids(&[2, 3, 1]));
    }

    #[test]
    fn test_requeue_single_and_empty() {
        let mut single = RefreshQueue::from_ids(ids(&[101]));
        assert_eq!(single.requeue(), Some(PlayerId(101)));
        assert_eq!(single.len(), 1);

        let mut empty = RefreshQueue::new();
        assert_eq!(empty.requeue(), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = RefreshQueue::from_ids(ids(&[1, 2, 3]));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.peek(), None);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Enqueue(u64),
        Dequeue,
        Requeue,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u64..16).prop_map(Op::Enqueue), Just(Op::Dequeue), Just(Op::Requeue)]
    }

    proptest! {
        #[test]
        fn prop_never_holds_duplicates(initial in prop::collection::vec(0u64..16, 0..16), ops in prop::collection::vec(op(), 0..64)) {
            let mut queue = RefreshQueue::from_ids(initial.into_iter().map(PlayerId));
            for op in ops {
                match op {
                    Op::Enqueue(id) => { queue.enqueue(PlayerId(id)); }
                    Op::Dequeue => { queue.dequeue(); }
                    Op::Requeue => { queue.requeue(); }
                }
                let unique: HashSet<_> = queue.iter().collect();
                prop_assert_eq!(unique.len(), queue.len());
            }
        }

        #[test]
        fn prop_requeue_moves_only_head(initial in prop::collection::vec(0u64..64, 1..32)) {
            let mut queue = RefreshQueue::from_ids(initial.into_iter().map(PlayerId));
            let before: Vec<_> = queue.iter().collect();

            let moved = queue.requeue();

            let after: Vec<_> = queue.iter().collect();
            prop_assert_eq!(moved, Some(before[0]));
            prop_assert_eq!(after.len(), before.len());
            prop_assert_eq!(&after[..after.len() - 1], &before[1..]);
            prop_assert_eq!(after[after.len() - 1], before[0]);
        }
    }
}
