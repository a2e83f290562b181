#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system translating raw key presses and swipes into session commands.

use vector_grid_core::{Command, Direction, Event, RunState};

/// Shortest swipe, measured along its dominant axis, that counts as a move.
pub const SWIPE_THRESHOLD: f32 = 30.0;

/// Raw input captured by an adapter for a single frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawInput<'a> {
    /// A key identified by its browser-style name, such as `ArrowUp` or `w`.
    Key(&'a str),
    /// A completed swipe gesture with its total displacement.
    Swipe {
        /// Horizontal displacement; positive values point right.
        dx: f32,
        /// Vertical displacement; positive values point down.
        dy: f32,
    },
}

/// Command requested by a key, before run-state filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyAction {
    Move(Direction),
    Restart,
    TogglePause,
}

/// Input system that tracks the run state and emits the matching commands.
///
/// Anything that does not map to an action is ignored without error.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    run_state: RunState,
}

impl InputMapper {
    /// Creates a mapper for a session that has not started yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            run_state: RunState::Idle,
        }
    }

    /// Run state the mapper believes the session is in.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Consumes session events and raw input to emit commands.
    pub fn handle(&mut self, events: &[Event], input: RawInput<'_>, out: &mut Vec<Command>) {
        self.observe(events);

        let action = match input {
            RawInput::Key(key) => key_action(key),
            RawInput::Swipe { dx, dy } => swipe_direction(dx, dy).map(KeyAction::Move),
        };

        match action {
            Some(KeyAction::Move(direction)) if self.run_state.is_active() => {
                out.push(Command::SubmitIntent { direction });
            }
            Some(KeyAction::Restart) => out.push(Command::Restart),
            Some(KeyAction::TogglePause) => match self.run_state {
                RunState::Active => out.push(Command::Pause),
                RunState::Paused => out.push(Command::Resume),
                RunState::Idle | RunState::Terminated(_) => {}
            },
            Some(KeyAction::Move(_)) | None => {}
        }
    }

    /// Updates the tracked run state from session events.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SessionStarted { .. } | Event::Resumed => {
                    self.run_state = RunState::Active;
                }
                Event::Paused => self.run_state = RunState::Paused,
                Event::Terminated { reason, .. } => {
                    self.run_state = RunState::Terminated(*reason);
                }
                _ => {}
            }
        }
    }
}

fn key_action(key: &str) -> Option<KeyAction> {
    let action = match key {
        "ArrowUp" | "w" | "W" => KeyAction::Move(Direction::North),
        "ArrowDown" | "s" | "S" => KeyAction::Move(Direction::South),
        "ArrowLeft" | "a" | "A" => KeyAction::Move(Direction::West),
        "ArrowRight" | "d" | "D" => KeyAction::Move(Direction::East),
        "r" | "R" => KeyAction::Restart,
        "p" | "P" | "Escape" => KeyAction::TogglePause,
        _ => return None,
    };
    Some(action)
}

/// Direction of a swipe along its dominant axis; vertical wins ties.
fn swipe_direction(dx: f32, dy: f32) -> Option<Direction> {
    let (abs_x, abs_y) = (dx.abs(), dy.abs());
    let dominant = abs_x.max(abs_y);
    if dominant.is_nan() || dominant <= SWIPE_THRESHOLD {
        return None;
    }

    if abs_x > abs_y {
        Some(if dx > 0.0 {
            Direction::East
        } else {
            Direction::West
        })
    } else {
        Some(if dy > 0.0 {
            Direction::South
        } else {
            Direction::North
        })
    }
}
