#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives Vector Grid sessions and surveys the level generator.

mod config;
mod play;
mod survey;

use std::{
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use vector_grid_core::Mode;

use crate::config::Tuning;

#[derive(Debug, Parser)]
#[command(name = "vector-grid", version)]
#[command(about = "Grid navigation puzzle: scripted play sessions and generator surveys")]
struct Cli {
    /// Optional TOML file with `[session]` overrides and a `[[tiers]]` table
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the level generator; overrides the tuning file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play one session from a token script
    Play(PlayArgs),
    /// Generate boards across levels and verify their guarantees
    Survey(SurveyArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Failure rules enforced by the session
    #[arg(long, value_enum, default_value_t = ModeArg::Classic)]
    mode: ModeArg,

    /// Whitespace-separated tokens; read from stdin when omitted.
    /// Key names such as `ArrowUp`, `d`, `p`, `r` are pressed, `+<ms>` advances
    /// the clock, and `swipe:<dx>,<dy>` performs a swipe.
    #[arg(long)]
    script: Option<String>,

    /// Print the board after every change
    #[arg(long)]
    show_board: bool,
}

#[derive(Debug, Args)]
struct SurveyArgs {
    /// Number of levels to survey, starting at level one
    #[arg(long, default_value_t = 60)]
    levels: u32,

    /// Boards generated per level
    #[arg(long, default_value_t = 200)]
    boards: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Collisions cost time
    Classic,
    /// Collisions and steps off the grid are fatal
    Lava,
    /// Vacated tiles may not be entered again
    Fragile,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Classic => Mode::Classic,
            ModeArg::Lava => Mode::Lava,
            ModeArg::Fragile => Mode::Fragile,
        }
    }
}

/// Entry point for the Vector Grid command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut tuning = Tuning::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        tuning.session.seed = seed;
    }
    debug!("generator seed {:#x}", tuning.session.seed);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Play(args) => {
            let script = match args.script {
                Some(script) => script,
                None => {
                    let mut buffer = String::new();
                    let _ = io::stdin()
                        .read_to_string(&mut buffer)
                        .context("failed to read play script from stdin")?;
                    buffer
                }
            };
            let options = play::PlayOptions {
                mode: args.mode.into(),
                show_board: args.show_board,
            };
            play::run(tuning, options, &script, &mut out)?;
        }
        Commands::Survey(args) => {
            survey::run(&tuning, args.levels, args.boards, &mut out)?;
        }
    }

    out.flush().context("failed to flush output")
}
