//! Scripted play sessions.

use std::{io::Write, time::Duration};

use anyhow::{bail, Context, Result};
use vector_grid_core::{Board, Command, Event, Mode, RunState, TileIndex};
use vector_grid_system_input::{InputMapper, RawInput};
use vector_grid_world::{self as world, query, Session};

use crate::config::Tuning;

/// Presentation switches for a scripted session.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlayOptions {
    pub(crate) mode: Mode,
    pub(crate) show_board: bool,
}

/// One step of a play script.
#[derive(Clone, Debug, PartialEq)]
enum Token<'a> {
    Key(&'a str),
    Swipe { dx: f32, dy: f32 },
    Advance(Duration),
}

fn parse_script(script: &str) -> Result<Vec<Token<'_>>> {
    script.split_whitespace().map(parse_token).collect()
}

fn parse_token(token: &str) -> Result<Token<'_>> {
    if let Some(millis) = token.strip_prefix('+') {
        let millis: u64 = millis
            .parse()
            .with_context(|| format!("`{token}` is not a whole number of milliseconds"))?;
        return Ok(Token::Advance(Duration::from_millis(millis)));
    }

    if let Some(delta) = token.strip_prefix("swipe:") {
        let Some((dx, dy)) = delta.split_once(',') else {
            bail!("`{token}` must look like swipe:<dx>,<dy>");
        };
        let dx = dx
            .parse()
            .with_context(|| format!("invalid horizontal swipe in `{token}`"))?;
        let dy = dy
            .parse()
            .with_context(|| format!("invalid vertical swipe in `{token}`"))?;
        return Ok(Token::Swipe { dx, dy });
    }

    Ok(Token::Key(token))
}

/// Plays one session, printing every event, until the script ends or the session terminates.
pub(crate) fn run(
    tuning: Tuning,
    options: PlayOptions,
    script: &str,
    out: &mut impl Write,
) -> Result<()> {
    let tokens = parse_script(script)?;
    let mut session =
        Session::new(tuning.session, tuning.curve).context("failed to create session")?;
    let mut mapper = InputMapper::new();
    let mut unseen = Vec::new();

    dispatch(
        &mut session,
        Command::Start { mode: options.mode },
        &mut unseen,
        options,
        out,
    )?;

    for token in tokens {
        if matches!(query::run_state(&session), RunState::Terminated(_)) {
            break;
        }

        let mut commands = Vec::new();
        match token {
            Token::Key(key) => mapper.handle(&unseen, RawInput::Key(key), &mut commands),
            Token::Swipe { dx, dy } => {
                mapper.handle(&unseen, RawInput::Swipe { dx, dy }, &mut commands)
            }
            Token::Advance(dt) => {
                mapper.observe(&unseen);
                commands.push(Command::Tick { dt });
            }
        }
        unseen.clear();

        for command in commands {
            dispatch(&mut session, command, &mut unseen, options, out)?;
        }
    }

    let summary = match query::run_state(&session) {
        RunState::Terminated(reason) => writeln!(
            out,
            "{}: {} (final level {})",
            reason.label(),
            reason.description(),
            query::level(&session)
        ),
        _ => writeln!(
            out,
            "script ended at level {} with {}ms left",
            query::level(&session),
            query::time_remaining(&session).as_millis()
        ),
    };
    summary.context("failed to write session summary")
}

fn dispatch(
    session: &mut Session,
    command: Command,
    unseen: &mut Vec<Event>,
    options: PlayOptions,
    out: &mut impl Write,
) -> Result<()> {
    let mut events = Vec::new();
    world::apply(session, command, &mut events);

    for event in &events {
        writeln!(out, "{}", describe(event)).context("failed to write event")?;
        let board_changed = matches!(
            event,
            Event::SessionStarted { .. } | Event::LevelCompleted { .. } | Event::PlayerAdvanced { .. }
        );
        if options.show_board && board_changed {
            write!(
                out,
                "{}",
                render_board(
                    query::board(session),
                    query::player(session),
                    query::visited(session).iter().copied(),
                )
            )
            .context("failed to write board")?;
        }
    }

    unseen.extend(events);
    Ok(())
}

fn describe(event: &Event) -> String {
    match event {
        Event::SessionStarted {
            mode,
            level,
            board,
            time_budget,
            ..
        } => format!(
            "started {mode} at level {level}: {}, {}ms",
            summarize(board),
            time_budget.as_millis()
        ),
        Event::IntentBuffered { direction } => format!("buffered {direction:?}"),
        Event::IntentDropped { direction, reason } => {
            format!("dropped {direction:?} ({reason:?})")
        }
        Event::PlayerAdvanced { from, to } => format!("moved {from} -> {to}"),
        Event::PenaltyApplied {
            tile,
            cause,
            time_remaining,
        } => format!(
            "penalty at {tile} ({cause:?}), {}ms left",
            time_remaining.as_millis()
        ),
        Event::PlayerStunned {
            tile,
            cause,
            duration,
        } => format!(
            "stunned at {tile} ({cause:?}) for {}ms",
            duration.as_millis()
        ),
        Event::HitFlagCleared { tile } => format!("hit marker cleared at {tile}"),
        Event::LevelCompleted {
            level,
            board,
            time_budget,
            ..
        } => format!(
            "level {level}: {}, {}ms",
            summarize(board),
            time_budget.as_millis()
        ),
        Event::ClockAdvanced { time_remaining } => {
            format!("clock {}ms", time_remaining.as_millis())
        }
        Event::Paused => "paused".to_owned(),
        Event::Resumed => "resumed".to_owned(),
        Event::Terminated {
            reason,
            final_level,
        } => format!("terminated: {} at level {final_level}", reason.code()),
    }
}

fn summarize(board: &Board) -> String {
    let side = board.size().side();
    format!(
        "{side}x{side} grid, target {}, {} walls",
        board.target(),
        board.walls().len()
    )
}

/// Draws the board one row per line: `@` player, `X` target, `#` wall, `~` decayed, `.` open.
fn render_board(
    board: &Board,
    player: TileIndex,
    visited: impl IntoIterator<Item = TileIndex>,
) -> String {
    let visited: Vec<TileIndex> = visited.into_iter().collect();
    let side = board.size().side();
    let mut rendered = String::new();

    for tile in board.size().tiles() {
        let glyph = if tile == player {
            '@'
        } else if tile == board.target() {
            'X'
        } else if board.is_wall(tile) {
            '#'
        } else if visited.contains(&tile) {
            '~'
        } else {
            '.'
        };
        rendered.push(glyph);
        if (tile.get() + 1) % side == 0 {
            rendered.push('\n');
        }
    }
    rendered
}
