//! Bounded object pool.
//!
//! This module provides the [`Pool`] and [`PoolBuilder`] types. A pool holds
//! `core_size` permanent nodes, up to `max_size - core_size` extra nodes that
//! age out after `keep_alive`, and hands out unpooled transient nodes once
//! both tiers are saturated.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::core_nodes::CoreNodeSet;
use crate::error::{BuildError, ConfigError};
use crate::ext_nodes::ExtNodeSet;
use crate::loader::Loader;
use crate::node::{Node, ReturnPath, Returned, Slot};
use crate::shared::SharedPool;

/// Default number of permanent nodes.
const DEFAULT_CORE_SIZE: usize = 1;

/// Default ceiling on pooled nodes.
const DEFAULT_MAX_SIZE: usize = 8;

/// Default idle time after which an extra node may be evicted (60 s).
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Builder for creating a [`Pool`] with custom configuration.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ruapc_objpool::PoolBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PoolBuilder::new(|| Ok::<_, std::io::Error>(Vec::<u8>::with_capacity(4096)))
///     .core_size(2)
///     .max_size(6)
///     .keep_alive(Duration::from_secs(30))
///     .build()?;
/// assert_eq!(pool.max_size(), 6);
/// # Ok(())
/// # }
/// ```
pub struct PoolBuilder<L> {
    loader: L,
    core_size: usize,
    max_size: usize,
    keep_alive: Duration,
    clock: Arc<dyn Clock>,
}

impl<L> PoolBuilder<L> {
    /// Creates a new builder with default settings.
    ///
    /// Default settings:
    /// - Core size: 1
    /// - Max size: 8
    /// - Keep-alive: 60 seconds
    /// - Clock: [`SystemClock`]
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            core_size: DEFAULT_CORE_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            keep_alive: DEFAULT_KEEP_ALIVE,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Sets the number of permanent nodes, loaded eagerly by
    /// [`build`](Self::build). Must be at least 1.
    #[must_use]
    pub const fn core_size(mut self, core_size: usize) -> Self {
        self.core_size = core_size;
        self
    }

    /// Sets the ceiling on pooled nodes. Must be at least the core size.
    ///
    /// Transient nodes handed out past this ceiling do not count.
    #[must_use]
    pub const fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets how long an extra node may sit idle before a later scan may
    /// evict it. Resolution is one millisecond.
    #[must_use]
    pub const fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the time source used to stamp and age extra nodes.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates the bounds and loads the core nodes.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Config`] if `core_size` is 0 or `max_size` is
    /// below `core_size`; the loader is not called in that case. Returns
    /// [`BuildError::Loader`] with the loader's own error if any core value
    /// fails to load.
    pub fn build<T>(mut self) -> Result<Pool<T, L>, BuildError<L::Error>>
    where
        L: Loader<T>,
    {
        if self.core_size == 0 {
            return Err(ConfigError::ZeroCoreSize.into());
        }
        if self.max_size < self.core_size {
            return Err(ConfigError::MaxBelowCore {
                core_size: self.core_size,
                max_size: self.max_size,
            }
            .into());
        }

        let core =
            CoreNodeSet::populate(self.core_size, &mut self.loader).map_err(BuildError::Loader)?;
        let keep_alive_millis = u64::try_from(self.keep_alive.as_millis()).unwrap_or(u64::MAX);
        let extra = ExtNodeSet::new(self.max_size - self.core_size, keep_alive_millis);
        let (home, returns) = ReturnPath::new(Arc::clone(&self.clock));

        debug!(
            core_size = self.core_size,
            max_size = self.max_size,
            keep_alive_ms = keep_alive_millis,
            "object pool ready"
        );

        Ok(Pool {
            loader: self.loader,
            core,
            extra,
            keep_alive: self.keep_alive,
            clock: self.clock,
            home,
            returns,
        })
    }
}

/// Snapshot of a pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of permanent nodes. Constant for the pool's lifetime.
    pub core_size: usize,
    /// Core nodes currently idle.
    pub idle_core: usize,
    /// Extra nodes currently tracked, idle or leased.
    pub extra: usize,
    /// Extra nodes currently idle.
    pub idle_extra: usize,
    /// Ceiling on pooled nodes.
    pub max_size: usize,
}

/// A bounded pool of reusable values.
///
/// Values come from a [`Loader`]. `core_size` of them are created up front
/// and live as long as the pool. Demand beyond that is served by extra nodes,
/// created lazily up to `max_size` pooled nodes in total and evicted once they
/// have been idle for longer than the keep-alive. When every pooled node is
/// leased, [`get`](Self::get) still succeeds by loading a transient node that
/// the pool never tracks.
///
/// # Thread Safety
///
/// Every operation takes `&mut self`. Wrap the pool in a [`SharedPool`] (see
/// [`into_shared`](Self::into_shared)) to use it from several threads or
/// tasks. [`Node`]s may be released from any thread either way.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ruapc_objpool::{NodeKind, Pool};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut next = 0;
/// let mut pool = Pool::new(1, 2, Duration::from_secs(1), move || {
///     next += 1;
///     Ok::<_, std::io::Error>(next)
/// })?;
///
/// let a = pool.get()?;
/// let b = pool.get()?;
/// let c = pool.get()?;
/// assert_eq!((a.kind(), b.kind(), c.kind()), (NodeKind::Core, NodeKind::Extra, NodeKind::Transient));
/// assert_eq!((*a, *b, *c), (1, 2, 3));
/// # Ok(())
/// # }
/// ```
pub struct Pool<T, L> {
    /// Factory for every value the pool hands out.
    loader: L,

    /// Permanent nodes.
    core: CoreNodeSet<T>,

    /// Lazily created nodes subject to keep-alive.
    extra: ExtNodeSet<T>,

    /// Configured keep-alive, as given to the builder.
    keep_alive: Duration,

    /// Time source for eviction scans.
    clock: Arc<dyn Clock>,

    /// Cloned into every pooled node.
    home: Arc<ReturnPath<T>>,

    /// Released values waiting to be put back into their slots.
    returns: mpsc::UnboundedReceiver<Returned<T>>,
}

impl<T, L: Loader<T>> Pool<T, L> {
    /// Creates a pool with the given bounds and the system clock.
    ///
    /// This is equivalent to chaining the same settings on
    /// [`PoolBuilder::new`] and calling [`build`](PoolBuilder::build).
    ///
    /// # Errors
    ///
    /// See [`PoolBuilder::build`].
    pub fn new(
        core_size: usize,
        max_size: usize,
        keep_alive: Duration,
        loader: L,
    ) -> Result<Self, BuildError<L::Error>> {
        PoolBuilder::new(loader)
            .core_size(core_size)
            .max_size(max_size)
            .keep_alive(keep_alive)
            .build()
    }

    /// Returns a node, creating one if nothing is idle.
    ///
    /// Tries an idle core node, then an idle extra node. If neither exists
    /// and the extra tier has room, loads a new extra node. Otherwise loads a
    /// transient node that is not pooled. Saturation never fails the call.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, unchanged, if a new value was needed and
    /// could not be loaded.
    pub fn get(&mut self) -> Result<Node<T>, L::Error> {
        if let Some(node) = self.get_idle() {
            return Ok(node);
        }

        if let Some((id, value)) = self.extra.create_if_room(&mut self.loader)? {
            debug!(
                id,
                extra = self.extra.len(),
                capacity = self.extra.capacity(),
                "created extra node"
            );
            return Ok(Node::pooled(value, Slot::Extra(id), Arc::clone(&self.home)));
        }

        debug!("pool saturated, handing out transient node");
        let value = self.loader.load()?;
        Ok(Node::transient(value))
    }

    /// Loads a value into every empty slot the extra tier has room for,
    /// leaving them idle. Returns how many were added.
    ///
    /// Useful to pay the construction cost up front before a burst.
    ///
    /// # Errors
    ///
    /// Returns the loader's error; nodes loaded before the failure stay in
    /// the pool.
    pub fn prefill_extra(&mut self) -> Result<usize, L::Error> {
        self.process_returns();
        let now = self.clock.now_millis();
        let mut added = 0;
        while let Some((id, value)) = self.extra.create_if_room(&mut self.loader)? {
            self.extra.release(id, value, now);
            added += 1;
        }
        Ok(added)
    }
}

impl<T, L> Pool<T, L> {
    /// Returns an idle pooled node without ever creating one.
    ///
    /// The core tier is tried first. The extra-tier scan also evicts idle
    /// extra nodes that outlived the keep-alive.
    pub fn get_idle(&mut self) -> Option<Node<T>> {
        self.process_returns();

        if let Some((index, value)) = self.core.try_acquire_idle() {
            trace!(index, "reusing core node");
            return Some(Node::pooled(value, Slot::Core(index), Arc::clone(&self.home)));
        }

        let now = self.clock.now_millis();
        let (id, value) = self.extra.try_acquire_idle(now)?;
        trace!(id, "reusing extra node");
        Some(Node::pooled(value, Slot::Extra(id), Arc::clone(&self.home)))
    }

    /// Drops every extra node, idle or leased. Core nodes are untouched.
    ///
    /// Extra nodes leased at the time keep working; their release simply no
    /// longer returns anything to the pool.
    pub fn clean(&mut self) {
        self.process_returns();
        let removed = self.extra.clear();
        debug!(removed, "cleaned extra nodes");
    }

    /// Returns the current occupancy.
    pub fn stats(&mut self) -> PoolStats {
        self.process_returns();
        PoolStats {
            core_size: self.core.len(),
            idle_core: self.core.idle_count(),
            extra: self.extra.len(),
            idle_extra: self.extra.idle_count(),
            max_size: self.max_size(),
        }
    }

    /// Returns the number of permanent nodes.
    pub fn core_size(&self) -> usize {
        self.core.len()
    }

    /// Returns the ceiling on pooled nodes.
    pub fn max_size(&self) -> usize {
        self.core.len() + self.extra.capacity()
    }

    /// Returns the configured keep-alive.
    pub const fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Moves the pool behind a mutex so it can be shared across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedPool<T, L> {
        SharedPool::new(self)
    }

    /// Puts every released value back into its slot.
    fn process_returns(&mut self) {
        while let Ok(returned) = self.returns.try_recv() {
            match returned {
                Returned::Core { index, value } => self.core.release(index, value),
                Returned::Extra {
                    id,
                    value,
                    released_at,
                } => {
                    self.extra.release(id, value, released_at);
                }
            }
        }
    }
}

impl<T, L> std::fmt::Debug for Pool<T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("core_size", &self.core.len())
            .field("max_size", &self.max_size())
            .field("keep_alive", &self.keep_alive)
            .finish_non_exhaustive()
    }
}
