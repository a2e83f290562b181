#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Difficulty curve mapping progression levels to generation and timing parameters.
//!
//! The curve is a table of [`Tier`] rows. Each row covers a contiguous band of
//! levels and fixes the grid size, the scatter wall range, and the corridor
//! probability for that band, while the countdown decays linearly inside the
//! band down to a per-tier floor. Grid growth at a tier boundary comes with a
//! fresh, larger countdown so the added distance stays reachable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vector_grid_core::{DifficultyParams, GridSize};

/// Tiles kept free of walls on every grid for the player, the target, and a minimal path.
pub const RESERVED_TILES: u32 = 6;

/// Derives the parameters for `level` from the default tier table.
#[must_use]
pub fn curve(level: u32) -> DifficultyParams {
    DifficultyCurve::default().params(level)
}

/// One band of levels sharing a grid size and wall density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Last level covered by the tier; `None` marks the open-ended final tier.
    #[serde(default)]
    pub through_level: Option<u32>,
    /// Side length of the grid; raising this adds distance between player and target.
    pub grid_size: u32,
    /// Fewest walls scattered per board before the safety clamp.
    pub wall_count_min: u32,
    /// Most walls scattered per board before the safety clamp.
    pub wall_count_max: u32,
    /// Countdown in milliseconds at `level_offset`; the decay starts from here.
    pub time_base_ms: u64,
    /// Milliseconds removed from the countdown per level past `level_offset`.
    pub time_step_ms: u64,
    /// Countdown never drops below this many milliseconds inside the tier.
    pub time_floor_ms: u64,
    /// Level at which the decay is anchored.
    #[serde(default)]
    pub level_offset: u32,
    /// Probability in `[0, 1]` of generating a corridor layout instead of scatter.
    #[serde(default)]
    pub complexity: f64,
}

impl Tier {
    fn covers(&self, level: u32) -> bool {
        self.through_level.map_or(true, |last| level <= last)
    }

    fn time_limit(&self, level: u32) -> Duration {
        let elapsed_levels = u64::from(level.saturating_sub(self.level_offset));
        let decay = elapsed_levels.saturating_mul(self.time_step_ms);
        let remaining = self.time_base_ms.saturating_sub(decay);
        Duration::from_millis(remaining.max(self.time_floor_ms))
    }

    fn params(&self, level: u32) -> DifficultyParams {
        let grid_size = GridSize::new(self.grid_size).unwrap_or(GridSize::MIN);
        let capacity = grid_size.cell_count().saturating_sub(RESERVED_TILES);
        let wall_count_max = self.wall_count_max.min(capacity);
        let wall_count_min = self.wall_count_min.min(wall_count_max);

        DifficultyParams::new(
            grid_size,
            self.time_limit(level),
            wall_count_min,
            wall_count_max,
            self.complexity.clamp(0.0, 1.0),
        )
    }
}

/// Reasons a tier table may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TuningError {
    /// The table contains no tiers at all.
    #[error("difficulty curve requires at least one tier")]
    Empty,
    /// A tier other than the last one has no upper level bound.
    #[error("tier {index} has no `through_level`; only the final tier may be open-ended")]
    MissingBound {
        /// Position of the offending tier.
        index: usize,
    },
    /// The last tier has an upper level bound.
    #[error("final tier must be open-ended but ends at level {level}")]
    ClosedFinalTier {
        /// Bound declared by the final tier.
        level: u32,
    },
    /// Tier bounds are not strictly increasing.
    #[error("tier {index} ends at level {level}, which does not follow level {previous}")]
    Unordered {
        /// Position of the offending tier.
        index: usize,
        /// Bound declared by the offending tier.
        level: u32,
        /// Bound declared by the tier before it.
        previous: u32,
    },
    /// A tier declares a grid too small to hold a player and a distinct target.
    #[error("tier {index} uses a grid of side {side}; grids must be at least 2 wide")]
    GridTooSmall {
        /// Position of the offending tier.
        index: usize,
        /// Side length declared by the tier.
        side: u32,
    },
    /// A tier declares a smaller grid than the tier before it.
    #[error("tier {index} shrinks the grid from {previous} to {side}")]
    ShrinkingGrid {
        /// Position of the offending tier.
        index: usize,
        /// Side length declared by the tier.
        side: u32,
        /// Side length declared by the tier before it.
        previous: u32,
    },
    /// A tier declares a wall range whose minimum exceeds its maximum.
    #[error("tier {index} wall range {min}..={max} is inverted")]
    InvertedWallRange {
        /// Position of the offending tier.
        index: usize,
        /// Declared minimum.
        min: u32,
        /// Declared maximum.
        max: u32,
    },
    /// A tier declares a corridor probability outside `[0, 1]`.
    #[error("tier {index} complexity {value} lies outside [0, 1]")]
    ComplexityOutOfRange {
        /// Position of the offending tier.
        index: usize,
        /// Declared probability.
        value: f64,
    },
}

/// Validated tier table answering parameter queries for any level.
#[derive(Clone, Debug, PartialEq)]
pub struct DifficultyCurve {
    bounded: Vec<Tier>,
    open: Tier,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self {
            bounded: default_bounded_tiers(),
            open: default_open_tier(),
        }
    }
}

impl DifficultyCurve {
    /// Validates a tier table and builds a curve from it.
    pub fn from_tiers(mut tiers: Vec<Tier>) -> Result<Self, TuningError> {
        validate(&tiers)?;
        let open = tiers.pop().ok_or(TuningError::Empty)?;
        Ok(Self {
            bounded: tiers,
            open,
        })
    }

    /// Derives the parameters for `level`; level zero is treated as level one.
    #[must_use]
    pub fn params(&self, level: u32) -> DifficultyParams {
        let level = level.max(1);
        self.tier(level).params(level)
    }

    /// Tier rows in ascending level order, ending with the open-ended tier.
    pub fn tiers(&self) -> impl Iterator<Item = &Tier> {
        self.bounded.iter().chain(std::iter::once(&self.open))
    }

    fn tier(&self, level: u32) -> &Tier {
        self.bounded
            .iter()
            .find(|tier| tier.covers(level))
            .unwrap_or(&self.open)
    }
}

fn validate(tiers: &[Tier]) -> Result<(), TuningError> {
    let Some((last, _)) = tiers.split_last() else {
        return Err(TuningError::Empty);
    };
    if let Some(level) = last.through_level {
        return Err(TuningError::ClosedFinalTier { level });
    }

    let mut previous_bound = 0;
    let mut previous_side = GridSize::MIN.side();
    for (index, tier) in tiers.iter().enumerate() {
        let is_last = index + 1 == tiers.len();
        match tier.through_level {
            Some(level) if level <= previous_bound => {
                return Err(TuningError::Unordered {
                    index,
                    level,
                    previous: previous_bound,
                });
            }
            Some(level) => previous_bound = level,
            None if !is_last => return Err(TuningError::MissingBound { index }),
            None => {}
        }

        if GridSize::new(tier.grid_size).is_none() {
            return Err(TuningError::GridTooSmall {
                index,
                side: tier.grid_size,
            });
        }
        if tier.grid_size < previous_side {
            return Err(TuningError::ShrinkingGrid {
                index,
                side: tier.grid_size,
                previous: previous_side,
            });
        }
        previous_side = tier.grid_size;

        if tier.wall_count_min > tier.wall_count_max {
            return Err(TuningError::InvertedWallRange {
                index,
                min: tier.wall_count_min,
                max: tier.wall_count_max,
            });
        }
        if !(0.0..=1.0).contains(&tier.complexity) {
            return Err(TuningError::ComplexityOutOfRange {
                index,
                value: tier.complexity,
            });
        }
    }

    Ok(())
}

fn default_bounded_tiers() -> Vec<Tier> {
    vec![
        // Onboarding: empty 3x3 boards while the controls are learned.
        Tier {
            through_level: Some(2),
            grid_size: 3,
            wall_count_min: 0,
            wall_count_max: 0,
            time_base_ms: 5_000,
            time_step_ms: 240,
            time_floor_ms: 3_800,
            level_offset: 0,
            complexity: 0.0,
        },
        Tier {
            through_level: Some(5),
            grid_size: 3,
            wall_count_min: 1,
            wall_count_max: 2,
            time_base_ms: 5_000,
            time_step_ms: 240,
            time_floor_ms: 3_800,
            level_offset: 0,
            complexity: 0.0,
        },
        // Expansion: 4x4 with consistent walls.
        Tier {
            through_level: Some(15),
            grid_size: 4,
            wall_count_min: 2,
            wall_count_max: 4,
            time_base_ms: 5_000,
            time_step_ms: 180,
            time_floor_ms: 3_200,
            level_offset: 5,
            complexity: 0.2,
        },
        // Compression: 4x4 fills up.
        Tier {
            through_level: Some(30),
            grid_size: 4,
            wall_count_min: 4,
            wall_count_max: 8,
            time_base_ms: 3_200,
            time_step_ms: 80,
            time_floor_ms: 2_000,
            level_offset: 15,
            complexity: 0.5,
        },
        // Scale: 5x5 with long-range navigation.
        Tier {
            through_level: Some(50),
            grid_size: 5,
            wall_count_min: 6,
            wall_count_max: 10,
            time_base_ms: 4_500,
            time_step_ms: 100,
            time_floor_ms: 2_500,
            level_offset: 30,
            complexity: 0.7,
        },
    ]
}

/// Velocity: dense 5x5 reflex test for every level past the bounded tiers.
fn default_open_tier() -> Tier {
    Tier {
        through_level: None,
        grid_size: 5,
        wall_count_min: 10,
        wall_count_max: 15,
        time_base_ms: 2_500,
        time_step_ms: 50,
        time_floor_ms: 1_200,
        level_offset: 50,
        complexity: 0.9,
    }
}
