//! Virtual clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use stayframe_core::{Environment, MonoTime};

/// Simulated environment with a manually advanced millisecond clock.
///
/// Clones share the clock, so the host binding and the embedded app see the
/// same time.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    now_ms: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Move the clock to `ms`. Never moves it backwards.
    pub fn advance_to(&self, ms: u64) {
        self.now_ms.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = MonoTime;

    fn now(&self) -> MonoTime {
        MonoTime::from_millis(self.now_ms())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        std::future::ready(())
    }
}
