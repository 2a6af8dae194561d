//! Thread-safe wrapper around [`Pool`].
//!
//! [`SharedPool`] moves a pool behind a single `tokio::sync::Mutex`. Every
//! operation holds the lock for its whole body, so calls on one pool are
//! totally ordered. Node releases do not take the lock; they travel over the
//! pool's return channel and are applied by the next locked operation.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::loader::Loader;
use crate::node::Node;
use crate::pool::{Pool, PoolStats};

/// A [`Pool`] that can be cloned and shared across threads and tasks.
///
/// Clones share the same underlying pool.
///
/// The plain methods block the current thread while waiting for the lock and
/// must not be called from inside an async runtime; use the `async_*`
/// variants there.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ruapc_objpool::Pool;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = Pool::new(2, 4, Duration::from_secs(10), || Ok::<_, std::io::Error>(Vec::<u8>::new()))?
///     .into_shared();
///
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let pool = pool.clone();
///         std::thread::spawn(move || {
///             let mut node = pool.get().unwrap();
///             node.push(1);
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert!(pool.stats().max_size >= 4);
/// # Ok(())
/// # }
/// ```
pub struct SharedPool<T, L> {
    inner: Arc<Mutex<Pool<T, L>>>,
}

impl<T, L> Clone for SharedPool<T, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, L> From<Pool<T, L>> for SharedPool<T, L> {
    fn from(pool: Pool<T, L>) -> Self {
        Self::new(pool)
    }
}

impl<T, L> SharedPool<T, L> {
    /// Wraps `pool`.
    #[must_use]
    pub fn new(pool: Pool<T, L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// Returns an idle pooled node without ever creating one.
    ///
    /// Blocks the current thread while waiting for the lock. For async
    /// contexts, use [`async_get_idle`](Self::async_get_idle) instead.
    pub fn get_idle(&self) -> Option<Node<T>> {
        self.inner.blocking_lock().get_idle()
    }

    /// Drops every extra node; core nodes are untouched.
    ///
    /// Blocks the current thread while waiting for the lock.
    pub fn clean(&self) {
        self.inner.blocking_lock().clean();
    }

    /// Returns the current occupancy.
    ///
    /// Blocks the current thread while waiting for the lock.
    pub fn stats(&self) -> PoolStats {
        self.inner.blocking_lock().stats()
    }

    /// Async version of [`get_idle`](Self::get_idle).
    pub async fn async_get_idle(&self) -> Option<Node<T>> {
        self.inner.lock().await.get_idle()
    }

    /// Async version of [`clean`](Self::clean).
    pub async fn async_clean(&self) {
        self.inner.lock().await.clean();
    }

    /// Async version of [`stats`](Self::stats).
    pub async fn async_stats(&self) -> PoolStats {
        self.inner.lock().await.stats()
    }
}

impl<T, L: Loader<T>> SharedPool<T, L> {
    /// Returns a node, creating one if nothing is idle. Never fails because
    /// the pool is saturated.
    ///
    /// Blocks the current thread while waiting for the lock, and runs the
    /// loader with the lock held. For async contexts, use
    /// [`async_get`](Self::async_get) instead.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, unchanged.
    pub fn get(&self) -> Result<Node<T>, L::Error> {
        self.inner.blocking_lock().get()
    }

    /// Async version of [`get`](Self::get).
    ///
    /// The loader still runs synchronously while the lock is held.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, unchanged.
    pub async fn async_get(&self) -> Result<Node<T>, L::Error> {
        self.inner.lock().await.get()
    }
}

impl<T, L> std::fmt::Debug for SharedPool<T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPool").finish_non_exhaustive()
    }
}
