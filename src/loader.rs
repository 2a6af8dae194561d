//! Factory trait for pooled values.
//!
//! This module provides the [`Loader`] trait the pool calls whenever it needs
//! a fresh value: once per core node at construction, for each lazily created
//! extra node, and for every unpooled fallback node once the pool is
//! saturated.

/// Produces new values for the pool.
///
/// Every `FnMut() -> Result<T, E> + Send` closure is a loader, which covers
/// almost every use. Implement the trait by hand when the factory carries
/// state worth naming.
///
/// # Example
///
/// ```rust
/// use ruapc_objpool::Loader;
///
/// struct Counter(u32);
///
/// impl Loader<u32> for Counter {
///     type Error = std::convert::Infallible;
///
///     fn load(&mut self) -> Result<u32, Self::Error> {
///         self.0 += 1;
///         Ok(self.0)
///     }
/// }
///
/// let mut counter = Counter(0);
/// assert_eq!(counter.load(), Ok(1));
/// assert_eq!(counter.load(), Ok(2));
/// ```
pub trait Loader<T>: Send {
    /// Error produced when a value cannot be constructed.
    type Error;

    /// Constructs a new value.
    ///
    /// # Errors
    ///
    /// Returns the factory's own error. The pool never retries or wraps it
    /// on the `get` path.
    fn load(&mut self) -> Result<T, Self::Error>;
}

impl<T, E, F> Loader<T> for F
where
    F: FnMut() -> Result<T, E> + Send,
{
    type Error = E;

    #[inline]
    fn load(&mut self) -> Result<T, E> {
        self()
    }
}
