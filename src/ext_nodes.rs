//! Overflow tier with keep-alive eviction.
//!
//! Extra nodes are created on demand once the core tier is exhausted, up to
//! `max_size - core_size` of them. Each node remembers when it was last
//! released. There is no reaper: stale idle nodes are dropped as a side
//! effect of the next allocation scan that passes over them, or all at once
//! by [`ExtNodeSet::clear`].

use std::collections::VecDeque;

use tracing::trace;

use crate::loader::Loader;

/// One extra-tier node.
struct ExtSlot<T> {
    /// Stable identifier; survives requeueing, never reused.
    id: u64,

    /// `Some` while idle, `None` while leased.
    value: Option<T>,

    /// Clock reading at the most recent release.
    last_release_millis: u64,
}

/// Bounded queue of extra nodes, scanned front to back.
pub(crate) struct ExtNodeSet<T> {
    slots: VecDeque<ExtSlot<T>>,

    /// `max_size - core_size`.
    capacity: usize,

    keep_alive_millis: u64,

    next_id: u64,
}

impl<T> ExtNodeSet<T> {
    pub(crate) fn new(capacity: usize, keep_alive_millis: u64) -> Self {
        Self {
            slots: VecDeque::new(),
            capacity,
            keep_alive_millis,
            next_id: 0,
        }
    }

    /// Claims the first idle node and evicts stale idle nodes behind it.
    ///
    /// Makes exactly one pass over the nodes present when the call starts.
    /// Leased nodes are requeued untouched. The first idle node is claimed
    /// regardless of its age. Every later idle node idle for longer than the
    /// keep-alive is dropped; the rest are requeued.
    pub(crate) fn try_acquire_idle(&mut self, now: u64) -> Option<(u64, T)> {
        let mut chosen = None;
        for _ in 0..self.slots.len() {
            let Some(mut slot) = self.slots.pop_front() else {
                break;
            };

            if slot.value.is_none() {
                self.slots.push_back(slot);
            } else if chosen.is_none() {
                chosen = slot.value.take().map(|value| (slot.id, value));
                self.slots.push_back(slot);
            } else if now.saturating_sub(slot.last_release_millis) > self.keep_alive_millis {
                trace!(
                    id = slot.id,
                    idle_ms = now.saturating_sub(slot.last_release_millis),
                    "evicting stale extra node"
                );
            } else {
                self.slots.push_back(slot);
            }
        }
        chosen
    }

    /// Loads and leases a new node if the tier has room.
    ///
    /// Returns `Ok(None)` without calling the loader when the tier is full.
    pub(crate) fn create_if_room<L: Loader<T>>(
        &mut self,
        loader: &mut L,
    ) -> Result<Option<(u64, T)>, L::Error> {
        if self.slots.len() >= self.capacity {
            return Ok(None);
        }

        let value = loader.load()?;
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push_back(ExtSlot {
            id,
            value: None,
            last_release_millis: 0,
        });
        Ok(Some((id, value)))
    }

    /// Marks the node idle and stamps its release time.
    ///
    /// Returns `false` if the node is no longer tracked (it was cleared while
    /// leased); the value is dropped in that case.
    pub(crate) fn release(&mut self, id: u64, value: T, now: u64) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) else {
            trace!(id, "dropping value of untracked extra node");
            return false;
        };
        slot.value = Some(value);
        slot.last_release_millis = now;
        true
    }

    /// Forgets every node, idle or leased. Returns how many were removed.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.slots.len();
        self.slots.clear();
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_from(start: u32) -> impl FnMut() -> Result<u32, ()> + Send {
        let mut next = start;
        move || {
            let value = next;
            next += 1;
            Ok(value)
        }
    }

    #[test]
    fn test_create_respects_capacity() {
        let mut extra = ExtNodeSet::new(2, 1000);
        let mut loader = loader_from(10);

        assert_eq!(extra.create_if_room(&mut loader), Ok(Some((0, 10))));
        assert_eq!(extra.create_if_room(&mut loader), Ok(Some((1, 11))));
        assert_eq!(extra.create_if_room(&mut loader), Ok(None));
        assert_eq!(extra.len(), 2);
        assert_eq!(extra.idle_count(), 0);

        // The loader was not consulted for the refused request.
        assert_eq!(loader.load(), Ok(12));
    }

    #[test]
    fn test_zero_capacity_never_loads() {
        let mut extra = ExtNodeSet::<u32>::new(0, 0);
        let mut loader = || -> Result<u32, &'static str> { Err("must not be called") };
        assert_eq!(extra.create_if_room(&mut loader), Ok(None));
    }

    #[test]
    fn test_loader_error_leaves_tier_unchanged() {
        let mut extra = ExtNodeSet::<u32>::new(1, 0);
        let mut loader = || -> Result<u32, &'static str> { Err("no backend") };
        assert_eq!(extra.create_if_room(&mut loader), Err("no backend"));
        assert_eq!(extra.len(), 0);
    }

    #[test]
    fn test_release_then_reacquire() {
        let mut extra = ExtNodeSet::new(1, 1000);
        let (id, value) = extra.create_if_room(&mut loader_from(3)).unwrap().unwrap();
        assert!(extra.try_acquire_idle(0).is_none());

        assert!(extra.release(id, value, 5));
        assert_eq!(extra.idle_count(), 1);
        assert_eq!(extra.try_acquire_idle(10), Some((id, 3)));
    }

    #[test]
    fn test_first_idle_node_is_claimed_even_when_stale() {
        let mut extra = ExtNodeSet::new(1, 100);
        let (id, value) = extra.create_if_room(&mut loader_from(1)).unwrap().unwrap();
        extra.release(id, value, 0);

        assert_eq!(extra.try_acquire_idle(10_000), Some((id, 1)));
        assert_eq!(extra.len(), 1);
    }

    #[test]
    fn test_stale_nodes_behind_the_claim_are_evicted() {
        let mut extra = ExtNodeSet::new(3, 100);
        let mut loader = loader_from(1);
        let a = extra.create_if_room(&mut loader).unwrap().unwrap();
        let b = extra.create_if_room(&mut loader).unwrap().unwrap();
        let c = extra.create_if_room(&mut loader).unwrap().unwrap();

        extra.release(a.0, a.1, 0);
        extra.release(b.0, b.1, 0);
        extra.release(c.0, c.1, 950);

        // a is claimed, b is stale and dropped, c is fresh and kept.
        let claimed = extra.try_acquire_idle(1000).unwrap();
        assert_eq!(claimed, (a.0, 1));
        assert_eq!(extra.len(), 2);
        assert_eq!(extra.idle_count(), 1);

        assert_eq!(extra.try_acquire_idle(1000), Some((c.0, 3)));
    }

    #[test]
    fn test_age_equal_to_keep_alive_is_kept() {
        let mut extra = ExtNodeSet::new(2, 100);
        let mut loader = loader_from(1);
        let a = extra.create_if_room(&mut loader).unwrap().unwrap();
        let b = extra.create_if_room(&mut loader).unwrap().unwrap();
        extra.release(a.0, a.1, 0);
        extra.release(b.0, b.1, 0);

        assert!(extra.try_acquire_idle(100).is_some());
        assert_eq!(extra.len(), 2);
    }

    #[test]
    fn test_leased_nodes_are_never_evicted() {
        let mut extra = ExtNodeSet::new(2, 0);
        let mut loader = loader_from(1);
        let _held = extra.create_if_room(&mut loader).unwrap().unwrap();
        let b = extra.create_if_room(&mut loader).unwrap().unwrap();
        extra.release(b.0, b.1, 0);

        assert_eq!(extra.try_acquire_idle(u64::MAX), Some((b.0, 2)));
        assert!(extra.try_acquire_idle(u64::MAX).is_none());
        assert_eq!(extra.len(), 2);
    }

    #[test]
    fn test_clear_forgets_leased_nodes() {
        let mut extra = ExtNodeSet::new(2, 1000);
        let mut loader = loader_from(1);
        let a = extra.create_if_room(&mut loader).unwrap().unwrap();
        let b = extra.create_if_room(&mut loader).unwrap().unwrap();
        extra.release(b.0, b.1, 0);

        assert_eq!(extra.clear(), 2);
        assert_eq!(extra.len(), 0);

        // The old lease comes back to nothing.
        assert!(!extra.release(a.0, a.1, 10));

        // Room again, and ids are not reused.
        let (id, _) = extra.create_if_room(&mut loader).unwrap().unwrap();
        assert!(id > b.0);
    }
}
