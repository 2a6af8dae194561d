//! Error types for pool construction.
//!
//! Running out of pooled capacity is never an error: [`Pool::get`] falls back
//! to an unpooled node instead. The only runtime failure is the loader's own
//! error, which is returned unchanged. These types cover what can go wrong
//! while building a pool.
//!
//! [`Pool::get`]: crate::Pool::get

use thiserror::Error;

/// Invalid pool bounds, detected before any value is loaded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The core tier must hold at least one node.
    #[error("core_size must be greater than 0")]
    ZeroCoreSize,

    /// The hard ceiling cannot be below the permanent node count.
    #[error("max_size ({max_size}) must not be less than core_size ({core_size})")]
    MaxBelowCore {
        /// Requested core size.
        core_size: usize,
        /// Requested maximum size.
        max_size: usize,
    },
}

/// Failure while building a pool.
#[derive(Error, Debug)]
pub enum BuildError<E> {
    /// The requested bounds are invalid; the loader was never called.
    #[error("invalid pool configuration: {0}")]
    Config(#[from] ConfigError),

    /// The loader failed while populating the core tier.
    #[error("loader failed while populating core nodes: {0}")]
    Loader(#[source] E),
}

impl<E> BuildError<E> {
    /// Returns the loader error, if that is what stopped construction.
    pub fn into_loader_error(self) -> Option<E> {
        match self {
            Self::Loader(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}
