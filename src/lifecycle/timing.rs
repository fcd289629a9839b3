//! Clock-driven debounce and throttle.
//!
//! Both take the current instant from the caller, so tests can drive them
//! with a simulated clock.

use std::time::{Duration, Instant};

/// Resize events settle this long before the target is resized.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// At most one pointer update per window.
pub const POINTER_THROTTLE: Duration = Duration::from_millis(16);

/// Fires once, `delay` after the last trigger.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restart the countdown.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Leading-edge throttle: the first call passes, then calls are dropped until
/// the window closes.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    open_until: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            open_until: None,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        if let Some(until) = self.open_until {
            if now < until {
                return false;
            }
        }
        self.open_until = Some(now + self.window);
        true
    }

    pub fn reset(&mut self) {
        self.open_until = None;
    }

    pub fn is_blocking(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }
}

/// Start of the frame-rate grid after drawing at `now`.
///
/// Keeps the sub-interval remainder so the long-run rate matches the target
/// instead of drifting down to the host refresh granularity.
pub fn next_frame_anchor(now: Instant, elapsed: Duration, interval: Duration) -> Instant {
    let interval_nanos = interval.as_nanos();
    if interval_nanos == 0 {
        return now;
    }
    let remainder = elapsed.as_nanos() % interval_nanos;
    now.checked_sub(Duration::from_nanos(remainder as u64))
        .unwrap_or(now)
}
