//! Generator survey: builds many boards per level and checks their guarantees.

use std::io::Write;

use anyhow::{bail, ensure, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vector_grid_core::{DifficultyParams, TileIndex};
use vector_grid_system_difficulty::RESERVED_TILES;
use vector_grid_system_generation::{distance, generate, GenerationOutcome, Generated, Strategy};

use crate::config::Tuning;

/// Aggregates gathered for a single level.
#[derive(Clone, Debug, Default, PartialEq)]
struct LevelStats {
    boards: usize,
    walls: usize,
    corridors: usize,
    fallbacks: usize,
    path_moves: u64,
}

impl LevelStats {
    fn record(&mut self, generated: &Generated, moves: u32) {
        self.boards += 1;
        self.walls += generated.board().walls().len();
        self.path_moves += u64::from(moves);
        if generated.strategy() == Strategy::Corridor {
            self.corridors += 1;
        }
        if generated.outcome() == GenerationOutcome::Exhausted {
            self.fallbacks += 1;
        }
    }

    fn mean(total: f64, count: usize) -> f64 {
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }
}

/// Surveys `levels` levels with `boards` boards each and prints one row per level.
pub(crate) fn run(
    tuning: &Tuning,
    levels: u32,
    boards: usize,
    out: &mut impl Write,
) -> Result<()> {
    ensure!(boards > 0, "survey needs at least one board per level");

    let mut rng = ChaCha8Rng::seed_from_u64(tuning.session.seed);
    writeln!(
        out,
        "level  grid  time_ms  walls  mean_walls  corridor%  fallbacks  mean_path"
    )
    .context("failed to write survey header")?;

    for level in 1..=levels {
        let params = tuning.curve.params(level);
        check_params(level, &params)?;

        let cells = params.grid_size().cell_count();
        let mut stats = LevelStats::default();
        for _ in 0..boards {
            let player = TileIndex::new(rng.gen_range(0..cells));
            let generated = generate(player, &params, &mut rng);
            let moves = check_board(level, player, &generated)?;
            stats.record(&generated, moves);
        }

        let side = params.grid_size().side();
        writeln!(
            out,
            "{level:>5}  {:>4}  {:>7}  {:>5}  {:>10.2}  {:>9.1}  {:>9}  {:>9.2}",
            format!("{side}x{side}"),
            params.time_limit().as_millis(),
            format!("{}-{}", params.wall_count_min(), params.wall_count_max()),
            LevelStats::mean(stats.walls as f64, stats.boards),
            LevelStats::mean(stats.corridors as f64 * 100.0, stats.boards),
            stats.fallbacks,
            LevelStats::mean(stats.path_moves as f64, stats.boards),
        )
        .with_context(|| format!("failed to write survey row for level {level}"))?;
    }

    Ok(())
}

fn check_params(level: u32, params: &DifficultyParams) -> Result<()> {
    let capacity = params
        .grid_size()
        .cell_count()
        .saturating_sub(RESERVED_TILES);
    ensure!(
        params.wall_count_max() <= capacity,
        "level {level} allows {} walls but only {capacity} tiles are spare",
        params.wall_count_max()
    );
    ensure!(
        params.wall_count_min() <= params.wall_count_max(),
        "level {level} has an inverted wall range {}..={}",
        params.wall_count_min(),
        params.wall_count_max()
    );
    Ok(())
}

/// Verifies one generated board, returning the length of its shortest solution.
fn check_board(level: u32, player: TileIndex, generated: &Generated) -> Result<u32> {
    let board = generated.board();
    ensure!(
        board.target() != player,
        "level {level}: target sits on the player tile {player}"
    );
    ensure!(
        !board.is_wall(player) && !board.is_wall(board.target()),
        "level {level}: wall placed on the player or target tile"
    );

    match distance(board.size(), player, board.target(), board.walls()) {
        Some(moves) => Ok(moves),
        None => bail!(
            "level {level}: target {} unreachable from {player} through {} walls",
            board.target(),
            board.walls().len()
        ),
    }
}
