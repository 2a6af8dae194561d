//! Node type that hands a pooled value back on release.
//!
//! This module provides the [`Node`] type, which leases one value to the
//! caller. Core and extra nodes carry a return path to their pool; releasing
//! (or dropping) them sends the value back so the slot becomes idle again.
//! Transient nodes have no return path and simply drop their value.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::clock::Clock;

/// Which tier a [`Node`] was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A permanent slot created at construction.
    Core,
    /// A lazily created slot subject to keep-alive eviction.
    Extra,
    /// An unpooled value created because both tiers were saturated.
    Transient,
}

/// Slot a pooled value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Index into the core tier.
    Core(usize),
    /// Identifier of an extra-tier node.
    Extra(u64),
}

/// A value travelling back to its slot.
#[derive(Debug)]
pub(crate) enum Returned<T> {
    /// Core release: flip the slot back to idle.
    Core { index: usize, value: T },
    /// Extra release: flip to idle and stamp the release time.
    Extra { id: u64, value: T, released_at: u64 },
}

/// Shared by every pooled node of one pool.
pub(crate) struct ReturnPath<T> {
    tx: mpsc::UnboundedSender<Returned<T>>,
    clock: Arc<dyn Clock>,
}

impl<T> ReturnPath<T> {
    /// Creates the return path and the receiver the pool drains.
    pub(crate) fn new(
        clock: Arc<dyn Clock>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Returned<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx, clock }), rx)
    }

    fn send_back(&self, slot: Slot, value: T) {
        let returned = match slot {
            Slot::Core(index) => Returned::Core { index, value },
            Slot::Extra(id) => Returned::Extra {
                id,
                value,
                released_at: self.clock.now_millis(),
            },
        };
        // A closed channel means the pool is gone; the value is dropped here.
        let _ = self.tx.send(returned);
    }
}

enum Lease<T> {
    Pooled { slot: Slot, home: Arc<ReturnPath<T>> },
    Transient,
}

/// A value checked out of a [`Pool`](crate::Pool).
///
/// The node dereferences to the value. Call [`release`](Self::release) or
/// simply drop the node to return a pooled value; the pool picks it up on
/// its next operation. Releasing a transient node only drops its value.
///
/// # Example
///
/// ```rust
/// use ruapc_objpool::{NodeKind, Pool};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pool = Pool::new(1, 1, Duration::ZERO, || Ok::<_, std::io::Error>(String::new()))?;
///
/// let mut node = pool.get()?;
/// assert_eq!(node.kind(), NodeKind::Core);
/// node.push_str("warm");
/// node.release();
///
/// assert_eq!(pool.get()?.as_str(), "warm");
/// # Ok(())
/// # }
/// ```
pub struct Node<T> {
    /// Always `Some` until the node is dropped.
    value: Option<T>,

    /// Where the value goes on release.
    lease: Lease<T>,
}

impl<T> Node<T> {
    pub(crate) fn pooled(value: T, slot: Slot, home: Arc<ReturnPath<T>>) -> Self {
        Self {
            value: Some(value),
            lease: Lease::Pooled { slot, home },
        }
    }

    pub(crate) fn transient(value: T) -> Self {
        Self {
            value: Some(value),
            lease: Lease::Transient,
        }
    }

    /// Returns the tier this node was served from.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match &self.lease {
            Lease::Pooled {
                slot: Slot::Core(_),
                ..
            } => NodeKind::Core,
            Lease::Pooled {
                slot: Slot::Extra(_),
                ..
            } => NodeKind::Extra,
            Lease::Transient => NodeKind::Transient,
        }
    }

    /// Returns `true` if releasing this node gives capacity back to a pool.
    #[inline]
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        matches!(self.lease, Lease::Pooled { .. })
    }

    /// Returns a reference to the leased value.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn value(&self) -> &T {
        self.value.as_ref().expect("node value taken before drop")
    }

    /// Returns a mutable reference to the leased value.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn value_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("node value taken before drop")
    }

    /// Ends the lease.
    ///
    /// Core nodes become idle, extra nodes become idle and are stamped with
    /// the current time, transient nodes are dropped. Equivalent to dropping
    /// the node.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        if let Lease::Pooled { slot, home } = &self.lease {
            home.send_back(*slot, value);
        }
    }
}

impl<T> Deref for Node<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.value()
    }
}

impl<T> DerefMut for Node<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.value_mut()
    }
}

impl<T> AsRef<T> for Node<T> {
    #[inline]
    fn as_ref(&self) -> &T {
        self.value()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn return_path<T>() -> (
        Arc<ReturnPath<T>>,
        mpsc::UnboundedReceiver<Returned<T>>,
        Arc<ManualClock>,
    ) {
        let clock = Arc::new(ManualClock::new());
        let (home, rx) = ReturnPath::new(Arc::clone(&clock) as Arc<dyn Clock>);
        (home, rx, clock)
    }

    #[test]
    fn test_core_node_returns_value() {
        let (home, mut rx, _clock) = return_path();
        let node = Node::pooled(7, Slot::Core(3), home);
        assert_eq!(node.kind(), NodeKind::Core);
        assert!(node.is_pooled());
        assert_eq!(*node, 7);

        node.release();
        match rx.try_recv().unwrap() {
            Returned::Core { index, value } => {
                assert_eq!(index, 3);
                assert_eq!(value, 7);
            }
            Returned::Extra { .. } => panic!("expected a core return"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_extra_node_stamps_release_time() {
        let (home, mut rx, clock) = return_path();
        let mut node = Node::pooled(vec![1u8], Slot::Extra(9), home);
        node.push(2);

        clock.advance(std::time::Duration::from_millis(750));
        drop(node);

        match rx.try_recv().unwrap() {
            Returned::Extra {
                id,
                value,
                released_at,
            } => {
                assert_eq!(id, 9);
                assert_eq!(value, vec![1, 2]);
                assert_eq!(released_at, 750);
            }
            Returned::Core { .. } => panic!("expected an extra return"),
        }
    }

    #[test]
    fn test_transient_node_goes_nowhere() {
        let node = Node::transient(String::from("scratch"));
        assert_eq!(node.kind(), NodeKind::Transient);
        assert!(!node.is_pooled());
        assert_eq!(node.len(), 7);
        node.release();
    }

    #[test]
    fn test_release_after_pool_gone() {
        let (home, rx, _clock) = return_path();
        drop(rx);
        let node = Node::pooled(1, Slot::Core(0), home);
        node.release();
    }

    #[test]
    fn test_node_debug() {
        let node = Node::transient(5);
        let debug_str = format!("{node:?}");
        assert!(debug_str.contains("Node"));
        assert!(debug_str.contains("Transient"));
    }
}
