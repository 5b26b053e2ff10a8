//! Bounded retry schedules for AMT polling.

use std::time::Duration;

/// Exponential backoff with a per-delay cap and a total budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
    /// Sum of all delays never exceeds this.
    pub budget: Duration,
}

impl Backoff {
    /// Polling after a successful `activate`: 500 ms doubling to 4 s. The
    /// budget is usually clipped further by the step deadline.
    pub const ACTIVATION_POLL: Self = Self {
        initial: Duration::from_millis(500),
        max_delay: Duration::from_secs(4),
        multiplier: 2,
        budget: Duration::from_secs(60),
    };

    /// Polling after `deactivate`: 1 s doubling to 8 s, 60 s in total.
    pub const DEACTIVATION_POLL: Self = Self {
        initial: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
        multiplier: 2,
        budget: Duration::from_secs(60),
    };

    /// Same schedule with the budget reduced to at most `limit`.
    #[must_use]
    pub fn clipped(self, limit: Duration) -> Self {
        Self {
            budget: self.budget.min(limit),
            ..self
        }
    }

    /// Delays to sleep before each successive attempt.
    #[must_use]
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial,
            max_delay: self.max_delay,
            multiplier: self.multiplier.max(1),
            remaining: self.budget,
        }
    }
}

/// Iterator over [`Backoff`] delays. The last delay is shortened so the
/// total lands exactly on the budget.
#[derive(Debug, Clone)]
pub struct Delays {
    next: Duration,
    max_delay: Duration,
    multiplier: u32,
    remaining: Duration,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining.is_zero() {
            return None;
        }
        let delay = self.next.min(self.max_delay).min(self.remaining);
        if delay.is_zero() {
            return None;
        }
        self.remaining -= delay;
        self.next = self.next.saturating_mul(self.multiplier).min(self.max_delay);
        Some(delay)
    }
}
