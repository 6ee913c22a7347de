//! Virtual time for the event loop.
//!
//! The loop never reads the wall clock while deciding what runs next; it keeps
//! its own `VirtualClock` and jumps it straight to the due time of the next
//! timer. Tests drive the loop through whole seconds of scheduled work in
//! microseconds of real time, and paced playback reuses the same schedule.

use std::{
    ops::{Add, Sub},
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// A point on the loop's virtual timeline, in nanoseconds since loop start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualInstant(u64);

impl VirtualInstant {
    /// The loop's start of time.
    pub const ZERO: Self = Self(0);

    /// Builds an instant from raw nanoseconds since loop start.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Raw nanoseconds since loop start.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time elapsed between `earlier` and this instant.
    ///
    /// Returns `Duration::ZERO` if `earlier` is not actually earlier.
    #[must_use]
    pub const fn since(self, earlier: Self) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for VirtualInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        let nanos = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(nanos))
    }
}

impl Sub<VirtualInstant> for VirtualInstant {
    type Output = Duration;

    fn sub(self, rhs: VirtualInstant) -> Duration {
        self.since(rhs)
    }
}

/// Forward-only clock shared between the loop driver and its handles.
///
/// Reads are lock-free; the driver is the only writer, and it only ever moves
/// time forward.
#[derive(Debug, Default)]
pub(crate) struct VirtualClock {
    now: AtomicU64,
}

impl VirtualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    /// Current virtual time.
    pub(crate) fn now(&self) -> VirtualInstant {
        VirtualInstant(self.now.load(Ordering::Relaxed))
    }

    /// Moves the clock forward to `target`.
    ///
    /// Moving to a time at or before the current one is a no-op; the clock
    /// never runs backwards.
    pub(crate) fn advance_to(&self, target: VirtualInstant) {
        self.now.fetch_max(target.0, Ordering::Relaxed);
    }
}
