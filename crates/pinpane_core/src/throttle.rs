//! Leading-edge throttle
//!
//! Fires on the first call, then drops every call until `interval` has
//! elapsed since the last firing. There is no trailing call.

use std::time::{Duration, Instant};

/// Default interval for scroll-driven broadcasts
pub const DEFAULT_SCROLL_THROTTLE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` if the caller may run now, and records the firing.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }

    /// Forget the last firing so the next call goes through
    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THROTTLE)
    }
}
