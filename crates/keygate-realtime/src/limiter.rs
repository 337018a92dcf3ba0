//! Per-connection inbound rate limiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use chrono::Duration;

use keygate_core::traits::Clock;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The event is within the window budget.
    Allowed,
    /// The budget is exhausted; the event should be dropped.
    Limited,
}

/// A fixed-window event counter.
///
/// Each connection owns one. Inbound frames are processed sequentially
/// per connection, so the atomics exist for shared-handle access rather
/// than contended counting; a frame or two of slop at a window boundary
/// is acceptable.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    clock: Arc<dyn Clock>,
    limit: u32,
    window_millis: i64,
    window_started_millis: AtomicI64,
    count: AtomicU32,
}

impl FixedWindowLimiter {
    /// Creates a limiter admitting `limit` events per `window`.
    pub fn new(clock: Arc<dyn Clock>, limit: u32, window: Duration) -> Self {
        let started = clock.now().timestamp_millis();
        Self {
            clock,
            limit,
            window_millis: window.num_milliseconds(),
            window_started_millis: AtomicI64::new(started),
            count: AtomicU32::new(0),
        }
    }

    /// Counts one event against the current window.
    pub fn admit(&self) -> RateDecision {
        let now = self.clock.now().timestamp_millis();
        let started = self.window_started_millis.load(Ordering::Acquire);

        if now - started >= self.window_millis {
            // One caller wins the rollover; the rest count against the
            // fresh window.
            if self
                .window_started_millis
                .compare_exchange(started, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.count.store(0, Ordering::Release);
            }
        }

        let seen = self.count.fetch_add(1, Ordering::AcqRel);
        if seen >= self.limit {
            RateDecision::Limited
        } else {
            RateDecision::Allowed
        }
    }
}
