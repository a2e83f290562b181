//! Failure rules enforced by each mode.

use vector_grid_core::{CollisionPolicy, TerminationReason};

/// What a rule violation costs the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Violation {
    /// The session ends immediately.
    Terminate(TerminationReason),
    /// The session continues after the provided punishment.
    Penalize(CollisionPolicy),
}

/// Reactions of a mode to the situations move resolution can run into.
pub(crate) trait ModeRules {
    /// Move that would leave the grid.
    fn out_of_bounds(&self) -> Violation;

    /// Move onto a wall tile.
    fn wall_hit(&self) -> Violation;

    /// Move back onto a tile vacated earlier in the level.
    fn revisit(&self) -> Option<TerminationReason> {
        None
    }

    /// Whether vacated tiles are remembered for [`ModeRules::revisit`].
    fn leaves_trail(&self) -> bool {
        false
    }
}

pub(crate) struct Classic;

impl ModeRules for Classic {
    fn out_of_bounds(&self) -> Violation {
        Violation::Penalize(CollisionPolicy::TimePenalty)
    }

    fn wall_hit(&self) -> Violation {
        Violation::Penalize(CollisionPolicy::TimePenalty)
    }
}

pub(crate) struct Lava;

impl ModeRules for Lava {
    fn out_of_bounds(&self) -> Violation {
        Violation::Terminate(TerminationReason::SignalLost)
    }

    fn wall_hit(&self) -> Violation {
        Violation::Terminate(TerminationReason::CriticalFailure)
    }
}

pub(crate) struct Fragile {
    pub(crate) policy: CollisionPolicy,
}

impl ModeRules for Fragile {
    fn out_of_bounds(&self) -> Violation {
        Violation::Penalize(self.policy)
    }

    fn wall_hit(&self) -> Violation {
        Violation::Penalize(self.policy)
    }

    fn revisit(&self) -> Option<TerminationReason> {
        Some(TerminationReason::StructuralCollapse)
    }

    fn leaves_trail(&self) -> bool {
        true
    }
}
