//! Time sources used to age idle extra nodes.
//!
//! This module provides the [`Clock`] trait that the pool consults whenever a
//! node is released or the extra tier is scanned, [`SystemClock`] which is
//! backed by a monotonic [`Instant`], and [`ManualClock`] which only moves
//! when told to and is meant for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of "now" timestamps in milliseconds.
///
/// Implementations must return monotonically non-decreasing values. The
/// absolute origin is irrelevant; the pool only ever subtracts two readings
/// from the same clock.
///
/// # Example
///
/// ```rust
/// use ruapc_objpool::Clock;
///
/// struct FrozenClock(u64);
///
/// impl Clock for FrozenClock {
///     fn now_millis(&self) -> u64 {
///         self.0
///     }
/// }
///
/// assert_eq!(FrozenClock(42).now_millis(), 42);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// Default clock measuring milliseconds elapsed since its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A clock that only advances when asked to.
///
/// Share it with the pool through an `Arc` and keep a handle in the test to
/// step time forward deterministically.
///
/// ```rust
/// use std::time::Duration;
/// use ruapc_objpool::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(1500));
/// assert_eq!(clock.now_millis(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    /// Moves the clock forward by `delta`, saturating at `u64::MAX` millis.
    pub fn advance(&self, delta: Duration) {
        let delta = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(delta))
            });
    }

    /// Sets the clock to `millis`. Values behind the current reading are
    /// ignored so the clock never goes backwards.
    pub fn set(&self, millis: u64) {
        self.now.fetch_max(millis, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_millis();
        std::thread::sleep(Duration::from_millis(5));
        let b = clock.now_millis();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_millis(), 0);

        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_millis(), 1250);
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.set(100);
        clock.set(40);
        assert_eq!(clock.now_millis(), 100);

        clock.advance(Duration::MAX);
        assert_eq!(clock.now_millis(), u64::MAX);
    }
}
