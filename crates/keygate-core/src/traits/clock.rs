//! Injectable time source.
//!
//! Every expiry comparison in the engine (OTP windows, token TTLs,
//! session expiry, inactivity thresholds, credential staleness) reads
//! time through this trait so that time-dependent tests are
//! deterministic instead of timing-sensitive.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// A source of the current instant.
pub trait Clock: Send + Sync + std::fmt::Debug + 'static {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The production implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock for tests.
///
/// Clones share the same underlying instant, so a test can hold one
/// handle while the service under test holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        self.now_millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }

    /// Advance the clock by a duration. Negative durations move it back.
    pub fn advance(&self, delta: Duration) {
        self.now_millis
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.now_millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
    }
}
