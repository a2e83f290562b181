//! Timed gates around move resolution: the motion lock, wall hit markers, and stuns.

use std::{collections::VecDeque, time::Duration};

use vector_grid_core::{Direction, TileIndex};

/// Single-shot timer that is either idle or counting down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Countdown(Option<Duration>);

impl Countdown {
    pub(crate) const fn idle() -> Self {
        Self(None)
    }

    pub(crate) const fn start(duration: Duration) -> Self {
        Self(Some(duration))
    }

    pub(crate) const fn is_running(&self) -> bool {
        self.0.is_some()
    }

    pub(crate) const fn remaining(&self) -> Option<Duration> {
        self.0
    }

    /// Advances the timer, reporting whether it expired during this step.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        match self.0 {
            Some(left) if left <= dt => {
                self.0 = None;
                true
            }
            Some(left) => {
                self.0 = Some(left - dt);
                false
            }
            None => false,
        }
    }
}

/// Debounce that keeps one move in flight and queues a bounded number of followers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MotionLock {
    window: Duration,
    capacity: usize,
    timer: Countdown,
    buffer: VecDeque<Direction>,
}

impl MotionLock {
    pub(crate) fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity,
            timer: Countdown::idle(),
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub(crate) const fn is_engaged(&self) -> bool {
        self.timer.is_running()
    }

    pub(crate) fn engage(&mut self) {
        self.timer = Countdown::start(self.window);
    }

    /// Queues an intent behind the move in flight; returns `false` when the buffer is full.
    pub(crate) fn offer(&mut self, direction: Direction) -> bool {
        if self.buffer.len() >= self.capacity {
            return false;
        }
        self.buffer.push_back(direction);
        true
    }

    pub(crate) fn deadline(&self) -> Option<Duration> {
        self.timer.remaining()
    }

    /// Advances the window, reporting whether the lock opened.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.timer.advance(dt)
    }

    /// Removes the oldest queued intent.
    pub(crate) fn next_buffered(&mut self) -> Option<Direction> {
        self.buffer.pop_front()
    }

    pub(crate) fn buffered(&self) -> impl Iterator<Item = Direction> + '_ {
        self.buffer.iter().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.timer = Countdown::idle();
        self.buffer.clear();
    }
}

/// Transient markers on walls the player bumped into.
///
/// Bumping a marked wall again restarts its marker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct HitFlags {
    flags: Vec<(TileIndex, Duration)>,
}

impl HitFlags {
    pub(crate) fn mark(&mut self, tile: TileIndex, duration: Duration) {
        match self.flags.iter_mut().find(|(marked, _)| *marked == tile) {
            Some((_, left)) => *left = duration,
            None => self.flags.push((tile, duration)),
        }
    }

    pub(crate) fn deadline(&self) -> Option<Duration> {
        self.flags.iter().map(|(_, left)| *left).min()
    }

    /// Advances every marker and moves the expired ones into `cleared` in marking order.
    pub(crate) fn advance(&mut self, dt: Duration, cleared: &mut Vec<TileIndex>) {
        self.flags.retain_mut(|(tile, left)| {
            if *left <= dt {
                cleared.push(*tile);
                false
            } else {
                *left -= dt;
                true
            }
        });
    }

    pub(crate) fn tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.flags.iter().map(|(tile, _)| *tile)
    }

    pub(crate) fn clear(&mut self) {
        self.flags.clear();
    }
}
