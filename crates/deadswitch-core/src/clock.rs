//! Time source for succession timeouts.
//!
//! Time is an unsigned count of seconds. The wallet reads it once per
//! operation and never caches it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the current time in seconds.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Wall-clock time (unix seconds).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock for simulations and tests.
///
/// Clones share the same underlying time, so a test can keep a handle while
/// the wallet owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move time forward, saturating at `u64::MAX`
    pub fn advance(&self, secs: u64) {
        let current = self.now.load(Ordering::SeqCst);
        self.now.store(current.saturating_add(secs), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
