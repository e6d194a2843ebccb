//! Clock and sleep seam shared by the host binding and the embedded app.
//!
//! The `Environment` trait decouples the protocol state machines from the
//! clock they run against:
//!
//! - Browser: `performance.now()` through the wasm surface
//! - Native: `std::time::Instant` for the CLI replay tool
//! - Simulation: a virtual clock advanced explicitly by tests
//!
//! # Invariants
//!
//! - `now()` is monotonic: a later call never returns an earlier instant
//! - Isolation: implementations must not share global state

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Abstract environment providing time.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Point in time used for timer deadlines.
    type Instant: Copy
        + Ord
        + Debug
        + Send
        + Add<Duration, Output = Self::Instant>
        + Sub<Output = Duration>;

    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Never earlier than an instant this environment returned before.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. State machines schedule timers and wait for
    /// the driver to come back with a tick.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Monotonic time expressed as a duration since an arbitrary origin.
///
/// Used where `std::time::Instant` is unavailable (`wasm32-unknown-unknown`)
/// or undesirable (simulation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonoTime(Duration);

impl MonoTime {
    /// The origin.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Time at `millis` milliseconds after the origin.
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Time at `elapsed` after the origin.
    pub const fn from_duration(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Elapsed time since the origin.
    pub const fn elapsed(self) -> Duration {
        self.0
    }

    /// Whole milliseconds since the origin, saturating.
    pub fn as_millis(self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Add<Duration> for MonoTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for MonoTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_time_arithmetic() {
        let start = MonoTime::from_millis(1_000);
        let later = start + Duration::from_millis(250);

        assert_eq!(later.as_millis(), 1_250);
        assert_eq!(later - start, Duration::from_millis(250));
    }

    #[test]
    fn mono_time_sub_saturates() {
        let earlier = MonoTime::from_millis(10);
        let later = MonoTime::from_millis(20);
        assert_eq!(earlier - later, Duration::ZERO);
    }

    #[test]
    fn mono_time_orders() {
        assert!(MonoTime::ZERO < MonoTime::from_millis(1));
    }
}
