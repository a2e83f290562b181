//! Countdown that drains the level budget on a fixed tick.

use std::time::Duration;

/// Level countdown advanced in whole ticks of a fixed interval.
///
/// Time that does not complete a tick is carried over, so pausing between two
/// ticks and resuming later fires the next tick exactly when the remaining
/// part of the interval has elapsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionClock {
    interval: Duration,
    budget: Duration,
    remaining: Duration,
    carried: Duration,
}

impl SessionClock {
    pub(crate) const fn new(interval: Duration, budget: Duration) -> Self {
        Self {
            interval,
            budget,
            remaining: budget,
            carried: Duration::ZERO,
        }
    }

    /// Refills the countdown with a new budget and discards any partial tick.
    pub(crate) fn reset(&mut self, budget: Duration) {
        self.budget = budget;
        self.remaining = budget;
        self.carried = Duration::ZERO;
    }

    pub(crate) const fn budget(&self) -> Duration {
        self.budget
    }

    pub(crate) const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Time until the next tick fires.
    pub(crate) fn until_tick(&self) -> Duration {
        self.interval.saturating_sub(self.carried)
    }

    /// Removes `amount` from the countdown, stopping at zero.
    pub(crate) fn deduct(&mut self, amount: Duration) -> Duration {
        self.remaining = self.remaining.saturating_sub(amount);
        self.remaining
    }

    /// Advances by at most [`Self::until_tick`], reporting whether a tick fired.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.carried = self.carried.saturating_add(dt);
        if self.carried < self.interval {
            return false;
        }

        self.carried = Duration::ZERO;
        self.remaining = self.remaining.saturating_sub(self.interval);
        true
    }

    /// Reports whether the countdown has run dry.
    pub(crate) fn expired(&self) -> bool {
        self.remaining.is_zero()
    }
}
