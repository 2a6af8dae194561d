//! # ruapc-objpool
//!
//! A bounded object pool for values that are expensive to construct. This
//! crate is part of the [ruapc](https://github.com/SF-Zhou/ruapc) project.
//!
//! ## Features
//!
//! - **Permanent Core Nodes**: `core_size` values are loaded up front and live as long as the pool
//! - **Keep-Alive Extra Nodes**: Demand beyond the core is served by lazily created nodes, up to `max_size`
//! - **Eviction Without Threads**: Stale extra nodes are dropped during the next allocation scan
//! - **Fail-Open Saturation**: A saturated pool hands out unpooled transient values instead of blocking or failing
//! - **Automatic Release**: Nodes go back to the pool when released or dropped, from any thread
//! - **Both Sync and Async APIs**: [`SharedPool`] wraps a pool behind a `tokio` mutex
//! - **Injectable Clock**: Plug in a [`Clock`] to control eviction in tests
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use ruapc_objpool::{NodeKind, PoolBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pool = PoolBuilder::new(|| Ok::<_, std::io::Error>(Vec::<u8>::with_capacity(1 << 20)))
//!     .core_size(2)
//!     .max_size(4)
//!     .keep_alive(Duration::from_secs(30))
//!     .build()?;
//!
//! let mut node = pool.get()?;
//! assert_eq!(node.kind(), NodeKind::Core);
//! node.extend_from_slice(b"hello");
//!
//! // The value goes back to the pool on release (or drop).
//! node.release();
//! # Ok(())
//! # }
//! ```
//!
//! ## Async Example
//!
//! ```rust
//! use std::time::Duration;
//! use ruapc_objpool::Pool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Pool::new(1, 2, Duration::from_secs(30), || Ok::<_, std::io::Error>(String::new()))?
//!     .into_shared();
//!
//! let node = pool.async_get().await?;
//! drop(node);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod clock;
mod core_nodes;
mod error;
mod ext_nodes;
mod loader;
mod node;
mod pool;
mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BuildError, ConfigError};
pub use loader::Loader;
pub use node::{Node, NodeKind};
pub use pool::{Pool, PoolBuilder, PoolStats};
pub use shared::SharedPool;
