//! Permanent core tier.
//!
//! The core tier holds a fixed number of values created eagerly when the
//! pool is built. Slots are never created or destroyed afterwards; a slot is
//! idle while it holds its value and in use while the value is leased out.

use crate::loader::Loader;

/// Fixed-size set of core slots served round robin.
pub(crate) struct CoreNodeSet<T> {
    /// `Some` while idle, `None` while leased.
    slots: Vec<Option<T>>,

    /// Next slot to try.
    cursor: usize,
}

impl<T> CoreNodeSet<T> {
    /// Loads `size` values, stopping at the first loader failure.
    pub(crate) fn populate<L: Loader<T>>(size: usize, loader: &mut L) -> Result<Self, L::Error> {
        let mut slots = Vec::with_capacity(size);
        for _ in 0..size {
            slots.push(Some(loader.load()?));
        }
        Ok(Self { slots, cursor: 0 })
    }

    /// Claims the first idle slot at or after the cursor.
    ///
    /// Scans every slot at most once and advances the cursor once per slot
    /// examined, whether or not the slot was idle.
    pub(crate) fn try_acquire_idle(&mut self) -> Option<(usize, T)> {
        let size = self.slots.len();
        for _ in 0..size {
            let index = self.cursor;
            self.cursor = (self.cursor + 1) % size;
            if let Some(value) = self.slots[index].take() {
                return Some((index, value));
            }
        }
        None
    }

    /// Puts a leased value back into its slot.
    pub(crate) fn release(&mut self, index: usize, value: T) {
        debug_assert!(self.slots[index].is_none(), "core slot {index} released twice");
        self.slots[index] = Some(value);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
