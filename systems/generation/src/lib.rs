#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Solvability-guaranteed procedural level generation.
//!
//! [`generate`] is a pure function of its inputs and the supplied random
//! source: seeding a `rand_chacha` generator makes every board reproducible.
//! Each attempt picks a target, lays walls with either the scatter or the
//! corridor strategy, and keeps the board only if the [`reachable`] oracle
//! confirms a path. After [`MAX_ATTEMPTS`] failures the walls are dropped
//! entirely so the level stays playable.

mod oracle;

use std::collections::BTreeSet;

use log::{debug, warn};
use rand::{seq::SliceRandom, Rng};
use vector_grid_core::{Board, DifficultyParams, Direction, GridSize, TileIndex};

pub use oracle::{distance, reachable};

/// Attempts made before falling back to an empty wall set.
pub const MAX_ATTEMPTS: u32 = 50;

/// Lowest share of off-path tiles the corridor strategy turns into walls.
pub const FILL_FACTOR_MIN: f64 = 0.4;

/// Highest share of off-path tiles the corridor strategy turns into walls.
pub const FILL_FACTOR_MAX: f64 = 0.7;

/// Wall placement strategy used for a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// A uniformly drawn number of walls scattered over free tiles.
    Scatter,
    /// A random guaranteed path with the remaining tiles densely walled.
    Corridor,
}

/// How the generator arrived at a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationOutcome {
    /// The oracle accepted the board on the given attempt.
    Solved {
        /// Attempts consumed, including the accepted one.
        attempts: u32,
    },
    /// Every attempt failed validation and the walls were cleared.
    Exhausted,
}

/// Board produced by [`generate`] together with provenance details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    board: Board,
    strategy: Strategy,
    outcome: GenerationOutcome,
}

impl Generated {
    /// Board ready to be played.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Strategy used on the final attempt.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether the board was validated or is the empty-wall fallback.
    #[must_use]
    pub const fn outcome(&self) -> GenerationOutcome {
        self.outcome
    }

    /// Consumes the result, yielding the board.
    #[must_use]
    pub fn into_board(self) -> Board {
        self.board
    }
}

/// Generates a solvable board for a player standing on `player`.
///
/// The grid size, wall range, and corridor probability come from `params`.
/// The target always differs from the player tile and sits more than one
/// move away whenever the grid allows it.
pub fn generate<R>(player: TileIndex, params: &DifficultyParams, rng: &mut R) -> Generated
where
    R: Rng + ?Sized,
{
    let size = params.grid_size();
    let complexity = if params.complexity().is_finite() {
        params.complexity().clamp(0.0, 1.0)
    } else {
        0.0
    };
    let candidates = target_candidates(size, player);
    let mut last_attempt = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let Some(&target) = candidates.choose(rng) else {
            break;
        };

        let (strategy, walls) = if rng.gen_bool(complexity) {
            (Strategy::Corridor, corridor_walls(size, player, target, rng))
        } else {
            (Strategy::Scatter, scatter_walls(size, player, target, params, rng))
        };

        if reachable(size, player, target, &walls) {
            debug!(
                "generated {side}x{side} board after {attempt} attempt(s) using {strategy:?} with {} walls",
                walls.len(),
                side = size.side(),
            );
            return Generated {
                board: Board::new(size, target, walls),
                strategy,
                outcome: GenerationOutcome::Solved { attempts: attempt },
            };
        }

        last_attempt = Some((target, strategy));
    }

    warn!(
        "no solvable {side}x{side} board after {MAX_ATTEMPTS} attempts; clearing walls",
        side = size.side(),
    );
    let (target, strategy) =
        last_attempt.unwrap_or_else(|| (fallback_target(player), Strategy::Scatter));
    Generated {
        board: Board::new(size, target, BTreeSet::new()),
        strategy,
        outcome: GenerationOutcome::Exhausted,
    }
}

/// Tiles eligible as targets: more than one move away, or any other tile when none are.
fn target_candidates(size: GridSize, player: TileIndex) -> Vec<TileIndex> {
    let origin = size.coord(player);
    let distant: Vec<TileIndex> = size
        .tiles()
        .filter(|tile| *tile != player)
        .filter(|tile| match (origin, size.coord(*tile)) {
            (Some(origin), Some(cell)) => origin.manhattan_distance(cell) > 1,
            _ => true,
        })
        .collect();

    if !distant.is_empty() {
        return distant;
    }

    size.tiles().filter(|tile| *tile != player).collect()
}

fn fallback_target(player: TileIndex) -> TileIndex {
    if player.get() == 0 {
        TileIndex::new(1)
    } else {
        TileIndex::new(0)
    }
}

fn scatter_walls<R>(
    size: GridSize,
    player: TileIndex,
    target: TileIndex,
    params: &DifficultyParams,
    rng: &mut R,
) -> BTreeSet<TileIndex>
where
    R: Rng + ?Sized,
{
    let mut free: Vec<TileIndex> = size
        .tiles()
        .filter(|tile| *tile != player && *tile != target)
        .collect();
    free.shuffle(rng);

    let high = params.wall_count_max();
    let low = params.wall_count_min().min(high);
    let count = rng.gen_range(low..=high);
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    free.into_iter().take(count).collect()
}

fn corridor_walls<R>(
    size: GridSize,
    player: TileIndex,
    target: TileIndex,
    rng: &mut R,
) -> BTreeSet<TileIndex>
where
    R: Rng + ?Sized,
{
    let path = random_path(size, player, target, rng);
    let fill_factor = rng.gen_range(FILL_FACTOR_MIN..=FILL_FACTOR_MAX);

    let mut walls = BTreeSet::new();
    for tile in size.tiles() {
        if path.contains(&tile) {
            continue;
        }
        if rng.gen_bool(fill_factor) {
            let _ = walls.insert(tile);
        }
    }
    walls
}

/// Random simple path between two tiles found by backtracking depth-first search.
///
/// Returns an empty set when either endpoint lies off the grid.
fn random_path<R>(
    size: GridSize,
    start: TileIndex,
    end: TileIndex,
    rng: &mut R,
) -> BTreeSet<TileIndex>
where
    R: Rng + ?Sized,
{
    let cell_count = usize::try_from(size.cell_count()).unwrap_or(0);
    let mut visited = vec![false; cell_count];
    if !mark(&mut visited, start) || size.coord(end).is_none() {
        return BTreeSet::new();
    }

    let mut stack = vec![start];
    while let Some(&current) = stack.last() {
        if current == end {
            return stack.into_iter().collect();
        }

        let mut directions = Direction::ALL;
        directions.shuffle(rng);
        let next = directions
            .into_iter()
            .filter_map(|direction| size.step(current, direction))
            .find(|tile| mark(&mut visited, *tile));

        match next {
            Some(tile) => stack.push(tile),
            None => {
                let _ = stack.pop();
            }
        }
    }

    BTreeSet::new()
}

/// Marks a tile as visited, reporting whether it was fresh.
fn mark(visited: &mut [bool], tile: TileIndex) -> bool {
    match oracle::slot(tile).and_then(|index| visited.get_mut(index)) {
        Some(seen) if !*seen => {
            *seen = true;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grid(side: u32) -> GridSize {
        GridSize::new(side).expect("valid grid size")
    }

    #[test]
    fn candidates_exclude_player_and_adjacent_tiles() {
        let candidates = target_candidates(grid(3), TileIndex::new(0));
        let expected: Vec<TileIndex> = [2, 4, 5, 6, 7, 8].into_iter().map(TileIndex::new).collect();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn two_by_two_grid_offers_only_the_diagonal() {
        let candidates = target_candidates(grid(2), TileIndex::new(0));
        assert_eq!(candidates, vec![TileIndex::new(3)]);
    }

    #[test]
    fn random_path_is_a_connected_simple_path() {
        let size = grid(5);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let path = random_path(size, TileIndex::new(0), TileIndex::new(24), &mut rng);
            assert!(path.contains(&TileIndex::new(0)));
            assert!(path.contains(&TileIndex::new(24)));

            let walls: BTreeSet<TileIndex> = size.tiles().filter(|t| !path.contains(t)).collect();
            assert!(reachable(size, TileIndex::new(0), TileIndex::new(24), &walls));
        }
    }

    #[test]
    fn random_path_rejects_off_grid_endpoints() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let path = random_path(grid(3), TileIndex::new(0), TileIndex::new(40), &mut rng);
        assert!(path.is_empty());
    }

    #[test]
    fn scatter_draws_within_the_wall_range() {
        let size = grid(5);
        let params = DifficultyParams::new(size, std::time::Duration::ZERO, 6, 10, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let walls = scatter_walls(size, TileIndex::new(0), TileIndex::new(12), &params, &mut rng);
            assert!((6..=10).contains(&walls.len()));
            assert!(!walls.contains(&TileIndex::new(0)));
            assert!(!walls.contains(&TileIndex::new(12)));
        }
    }

    #[test]
    fn corridor_never_walls_the_endpoints() {
        let size = grid(5);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            let walls = corridor_walls(size, TileIndex::new(6), TileIndex::new(18), &mut rng);
            assert!(!walls.contains(&TileIndex::new(6)));
            assert!(!walls.contains(&TileIndex::new(18)));
            assert!(reachable(size, TileIndex::new(6), TileIndex::new(18), &walls));
        }
    }

    #[test]
    fn fallback_target_differs_from_player() {
        assert_eq!(fallback_target(TileIndex::new(0)), TileIndex::new(1));
        assert_eq!(fallback_target(TileIndex::new(5)), TileIndex::new(0));
    }
}
