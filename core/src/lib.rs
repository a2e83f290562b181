#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Vector Grid engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the session executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing every
//! outcome. Systems such as the level generator and the difficulty curve only
//! ever see the immutable descriptions defined here.

use std::{collections::BTreeSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tile the player occupies whenever a session starts or restarts.
pub const ORIGIN_TILE: TileIndex = TileIndex::new(0);

/// Failure-rule variant applied to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Collisions cost time but are never fatal.
    Classic,
    /// Any collision or step into the void ends the session immediately.
    Lava,
    /// Vacated tiles decay and can never be entered again during a level.
    Fragile,
}

impl Mode {
    /// Every mode in presentation order.
    pub const ALL: [Mode; 3] = [Mode::Classic, Mode::Lava, Mode::Fragile];

    /// Stable lowercase identifier of the mode.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Lava => "lava",
            Self::Fragile => "fragile",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts a fresh session at level one under the provided mode.
    Start {
        /// Failure rules the session should enforce.
        mode: Mode,
    },
    /// Requests that the player move one tile in the provided direction.
    SubmitIntent {
        /// Direction of travel for the attempted move.
        direction: Direction,
    },
    /// Advances every session timer by the provided elapsed time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Suspends intent acceptance and the countdown together.
    Pause,
    /// Resumes a paused session from its frozen timers.
    Resume,
    /// Discards all progress and starts again at level one in the same mode.
    Restart,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Announces that a session started or restarted at level one.
    SessionStarted {
        /// Mode the session enforces.
        mode: Mode,
        /// Level the session starts at.
        level: u32,
        /// Freshly generated board.
        board: Board,
        /// Tile the player occupies.
        player: TileIndex,
        /// Full countdown available for the first level.
        time_budget: Duration,
    },
    /// Reports that an intent arrived during a motion lock and was queued.
    IntentBuffered {
        /// Direction that will be replayed once the lock opens.
        direction: Direction,
    },
    /// Reports that an intent was discarded without being resolved.
    IntentDropped {
        /// Direction carried by the discarded intent.
        direction: Direction,
        /// Reason the intent could not be accepted.
        reason: DropReason,
    },
    /// Confirms that the player moved onto a free tile.
    PlayerAdvanced {
        /// Tile the player occupied before moving.
        from: TileIndex,
        /// Tile the player occupies after moving.
        to: TileIndex,
    },
    /// Reports that a collision cost the player time.
    PenaltyApplied {
        /// Tile that was hit, or the player's own tile for out-of-bounds moves.
        tile: TileIndex,
        /// What the player collided with.
        cause: PenaltyCause,
        /// Countdown left after the penalty was deducted.
        time_remaining: Duration,
    },
    /// Reports that a collision stunned the player instead of costing time.
    PlayerStunned {
        /// Tile that was hit, or the player's own tile for out-of-bounds moves.
        tile: TileIndex,
        /// What the player collided with.
        cause: PenaltyCause,
        /// How long further intents are refused.
        duration: Duration,
    },
    /// Announces that the transient hit marker on a wall tile expired.
    HitFlagCleared {
        /// Tile that carried the marker.
        tile: TileIndex,
    },
    /// Announces that the player reached the target and a new board was built.
    LevelCompleted {
        /// Level that is now active.
        level: u32,
        /// Board generated for the new level.
        board: Board,
        /// Tile the player occupies on the new board.
        player: TileIndex,
        /// Full countdown available for the new level.
        time_budget: Duration,
    },
    /// Reports the countdown after a tick was processed.
    ClockAdvanced {
        /// Time left before the session expires.
        time_remaining: Duration,
    },
    /// Confirms that the session paused.
    Paused,
    /// Confirms that the session resumed.
    Resumed,
    /// Announces that the session ended.
    Terminated {
        /// Rule that ended the session.
        reason: TerminationReason,
        /// Level the player had reached.
        final_level: u32,
    },
}

/// Reasons an intent may be discarded before resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// The intent buffer was already full.
    BufferFull,
    /// The player is recovering from a stun.
    Stunned,
}

/// Obstacle responsible for a non-fatal collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltyCause {
    /// The move would have left the grid.
    OutOfBounds,
    /// The destination tile is a wall.
    Wall,
}

/// How a non-fatal collision is punished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Deduct a fixed amount from the countdown.
    #[default]
    TimePenalty,
    /// Refuse further intents for a fixed duration.
    Stun,
}

/// Terminal outcomes of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The countdown reached zero.
    TimeLimitExceeded,
    /// The player walked into a wall in Lava mode.
    CriticalFailure,
    /// The player stepped off the grid in Lava mode.
    SignalLost,
    /// The player re-entered a decayed tile in Fragile mode.
    StructuralCollapse,
}

impl TerminationReason {
    /// Stable machine-readable identifier.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TimeLimitExceeded => "time_limit_exceeded",
            Self::CriticalFailure => "critical_failure",
            Self::SignalLost => "signal_lost",
            Self::StructuralCollapse => "structural_collapse",
        }
    }

    /// Headline shown by presentation layers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TimeLimitExceeded => "TERMINATED",
            Self::CriticalFailure => "CRITICAL FAILURE",
            Self::SignalLost => "SIGNAL LOST",
            Self::StructuralCollapse => "STRUCTURAL COLLAPSE",
        }
    }

    /// One-line explanation shown beneath the headline.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TimeLimitExceeded => "TIME LIMIT EXCEEDED",
            Self::CriticalFailure => "INCINERATED BY FIREWALL",
            Self::SignalLost => "UNIT FELL INTO VOID",
            Self::StructuralCollapse => "ATTEMPTED TO CROSS DECAYED PATH",
        }
    }
}

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Created but not yet started.
    #[default]
    Idle,
    /// Accepting intents and counting down.
    Active,
    /// Frozen; neither intents nor ticks are processed.
    Paused,
    /// Ended for the provided reason.
    Terminated(TerminationReason),
}

impl RunState {
    /// Reports whether intents and ticks are currently processed.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit offset of the direction as `(column, row)` deltas.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Linear index of a tile in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Creates a new tile index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Side length of the square grid.
///
/// Grids are at least two tiles wide so a target distinct from the player
/// always exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct GridSize(u32);

/// Grid side rejected because it is shorter than [`GridSize::MIN`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("grid side {side} is below the minimum of 2")]
pub struct InvalidGridSize {
    /// Side length that was rejected.
    pub side: u32,
}

impl TryFrom<u32> for GridSize {
    type Error = InvalidGridSize;

    fn try_from(side: u32) -> Result<Self, Self::Error> {
        Self::new(side).ok_or(InvalidGridSize { side })
    }
}

impl GridSize {
    /// Smallest supported grid.
    pub const MIN: GridSize = GridSize(2);

    /// Creates a grid size, rejecting sides shorter than [`GridSize::MIN`].
    #[must_use]
    pub const fn new(side: u32) -> Option<Self> {
        if side < Self::MIN.0 {
            None
        } else {
            Some(Self(side))
        }
    }

    /// Number of tiles along each edge.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.0
    }

    /// Total number of tiles on the grid.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.0.saturating_mul(self.0)
    }

    /// Reports whether the coordinate lies on the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.0 && cell.row() < self.0
    }

    /// Decomposes a linear index into its coordinate, if it lies on the grid.
    #[must_use]
    pub const fn coord(&self, tile: TileIndex) -> Option<CellCoord> {
        if tile.get() >= self.cell_count() {
            return None;
        }
        Some(CellCoord::new(tile.get() % self.0, tile.get() / self.0))
    }

    /// Linear index of the coordinate, if it lies on the grid.
    #[must_use]
    pub const fn index(&self, cell: CellCoord) -> Option<TileIndex> {
        if !self.contains(cell) {
            return None;
        }
        Some(TileIndex::new(cell.row() * self.0 + cell.column()))
    }

    /// Tile one step away in the provided direction, or `None` past the edge.
    #[must_use]
    pub fn step(&self, tile: TileIndex, direction: Direction) -> Option<TileIndex> {
        let cell = self.coord(tile)?;
        let (column_delta, row_delta) = direction.offset();
        let column = i64::from(cell.column()) + column_delta;
        let row = i64::from(cell.row()) + row_delta;
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        self.index(CellCoord::new(column, row))
    }

    /// Orthogonal neighbours of a tile that lie on the grid.
    pub fn neighbors(&self, tile: TileIndex) -> impl Iterator<Item = TileIndex> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.step(tile, direction))
    }

    /// Every tile index on the grid in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> {
        (0..self.cell_count()).map(TileIndex::new)
    }
}

/// Static layout of a single level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    size: GridSize,
    walls: BTreeSet<TileIndex>,
    target: TileIndex,
}

impl Board {
    /// Creates a board from its size, target tile, and wall set.
    #[must_use]
    pub fn new(size: GridSize, target: TileIndex, walls: BTreeSet<TileIndex>) -> Self {
        Self {
            size,
            walls,
            target,
        }
    }

    /// Side length of the board.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Tile that completes the level when reached.
    #[must_use]
    pub const fn target(&self) -> TileIndex {
        self.target
    }

    /// Impassable tiles placed for this level.
    #[must_use]
    pub fn walls(&self) -> &BTreeSet<TileIndex> {
        &self.walls
    }

    /// Reports whether the tile is a wall.
    #[must_use]
    pub fn is_wall(&self, tile: TileIndex) -> bool {
        self.walls.contains(&tile)
    }
}

/// Generation and timing parameters derived for a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyParams {
    grid_size: GridSize,
    time_limit: Duration,
    wall_count_min: u32,
    wall_count_max: u32,
    complexity: f64,
}

impl DifficultyParams {
    /// Bundles the parameters describing a single level.
    #[must_use]
    pub const fn new(
        grid_size: GridSize,
        time_limit: Duration,
        wall_count_min: u32,
        wall_count_max: u32,
        complexity: f64,
    ) -> Self {
        Self {
            grid_size,
            time_limit,
            wall_count_min,
            wall_count_max,
            complexity,
        }
    }

    /// Side length of the grid for the level.
    #[must_use]
    pub const fn grid_size(&self) -> GridSize {
        self.grid_size
    }

    /// Countdown granted when the level begins.
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Fewest walls the scatter strategy places.
    #[must_use]
    pub const fn wall_count_min(&self) -> u32 {
        self.wall_count_min
    }

    /// Most walls the scatter strategy places.
    #[must_use]
    pub const fn wall_count_max(&self) -> u32 {
        self.wall_count_max
    }

    /// Probability in `[0, 1]` of generating a corridor layout.
    #[must_use]
    pub const fn complexity(&self) -> f64 {
        self.complexity
    }
}
