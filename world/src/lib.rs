#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Vector Grid.
//!
//! A [`Session`] owns everything a run needs: the board, the player, the
//! countdown, the motion lock, and the random source feeding the level
//! generator. It only changes through [`apply`], which executes one
//! [`Command`] and reports every outcome as [`Event`] values. Read access goes
//! through the [`query`] module.

mod clock;
mod motion;
mod rules;

use std::{collections::BTreeSet, time::Duration};

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use vector_grid_core::{
    Board, CellCoord, CollisionPolicy, Command, Direction, DropReason, Event, GridSize, Mode,
    PenaltyCause, RunState, TerminationReason, TileIndex, ORIGIN_TILE,
};
use vector_grid_system_difficulty::DifficultyCurve;
use vector_grid_system_generation::generate;

use crate::{
    clock::SessionClock,
    motion::{Countdown, HitFlags, MotionLock},
    rules::{Classic, Fragile, Lava, ModeRules, Violation},
};

/// Time a resolved move keeps the motion lock engaged.
pub const DEFAULT_LOCK_WINDOW: Duration = Duration::from_millis(100);

/// Intents that may wait behind the move in flight.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2;

/// Countdown removed by a non-fatal collision.
pub const DEFAULT_TIME_PENALTY: Duration = Duration::from_millis(500);

/// Lifetime of the marker left on a wall the player bumped into.
pub const DEFAULT_HIT_FLAG_DURATION: Duration = Duration::from_millis(200);

/// Time intents are refused after a collision under [`CollisionPolicy::Stun`].
pub const DEFAULT_STUN_DURATION: Duration = Duration::from_millis(400);

/// Granularity of the countdown.
pub const DEFAULT_CLOCK_INTERVAL: Duration = Duration::from_millis(10);

const DEFAULT_SEED: u64 = 0x5ec7_0a11_9e1d_0001;

/// Tunable rules of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time a resolved move keeps the motion lock engaged.
    pub lock_window: Duration,
    /// Intents that may wait behind the move in flight; extra intents are dropped.
    pub buffer_capacity: usize,
    /// Countdown removed by a non-fatal collision.
    pub time_penalty: Duration,
    /// Lifetime of the marker left on a wall the player bumped into.
    pub hit_flag_duration: Duration,
    /// Time intents are refused after a stunning collision.
    pub stun_duration: Duration,
    /// Granularity of the countdown.
    pub clock_interval: Duration,
    /// How Fragile sessions punish collisions.
    pub fragile_policy: CollisionPolicy,
    /// Seed of the random source feeding the level generator.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lock_window: DEFAULT_LOCK_WINDOW,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            time_penalty: DEFAULT_TIME_PENALTY,
            hit_flag_duration: DEFAULT_HIT_FLAG_DURATION,
            stun_duration: DEFAULT_STUN_DURATION,
            clock_interval: DEFAULT_CLOCK_INTERVAL,
            fragile_policy: CollisionPolicy::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl SessionConfig {
    /// Checks that every timer in the configuration can elapse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timers = [
            ("lock_window", self.lock_window),
            ("hit_flag_duration", self.hit_flag_duration),
            ("stun_duration", self.stun_duration),
            ("clock_interval", self.clock_interval),
        ];
        match timers.into_iter().find(|(_, duration)| duration.is_zero()) {
            Some((field, _)) => Err(ConfigError::ZeroDuration { field }),
            None => Ok(()),
        }
    }
}

/// Reasons a session configuration may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A timer was configured to last no time at all.
    #[error("`{field}` must be longer than zero")]
    ZeroDuration {
        /// Name of the offending setting.
        field: &'static str,
    },
}

/// Represents one authoritative play session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    curve: DifficultyCurve,
    rng: ChaCha8Rng,
    mode: Mode,
    run_state: RunState,
    level: u32,
    player: TileIndex,
    board: Board,
    visited: BTreeSet<TileIndex>,
    clock: SessionClock,
    lock: MotionLock,
    hits: HitFlags,
    stun: Countdown,
}

impl Session {
    /// Creates an idle session previewing its first level-one board.
    ///
    /// Starting from idle plays the previewed board. Starting or restarting a
    /// session that has already begun draws a fresh one. The session accepts
    /// intents only after [`Command::Start`].
    pub fn new(config: SessionConfig, curve: DifficultyCurve) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let params = curve.params(1);
        let board = generate(ORIGIN_TILE, &params, &mut rng).into_board();

        Ok(Self {
            clock: SessionClock::new(config.clock_interval, params.time_limit()),
            lock: MotionLock::new(config.lock_window, config.buffer_capacity),
            config,
            curve,
            rng,
            mode: Mode::Classic,
            run_state: RunState::Idle,
            level: 1,
            player: ORIGIN_TILE,
            board,
            visited: BTreeSet::new(),
            hits: HitFlags::default(),
            stun: Countdown::idle(),
        })
    }

    fn begin(&mut self, out_events: &mut Vec<Event>) {
        self.level = 1;
        self.player = ORIGIN_TILE;
        let params = self.curve.params(self.level);
        if self.run_state != RunState::Idle {
            self.board = generate(self.player, &params, &mut self.rng).into_board();
        }
        self.visited.clear();
        self.lock.clear();
        self.hits.clear();
        self.stun = Countdown::idle();
        self.clock.reset(params.time_limit());
        self.run_state = RunState::Active;

        info!(
            "{} session started on a {side}x{side} grid with {:?} on the clock",
            self.mode,
            params.time_limit(),
            side = params.grid_size().side(),
        );
        out_events.push(Event::SessionStarted {
            mode: self.mode,
            level: self.level,
            board: self.board.clone(),
            player: self.player,
            time_budget: self.clock.budget(),
        });
    }

    fn submit(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.stun.is_running() {
            out_events.push(Event::IntentDropped {
                direction,
                reason: DropReason::Stunned,
            });
            return;
        }

        if self.lock.is_engaged() {
            if self.lock.offer(direction) {
                out_events.push(Event::IntentBuffered { direction });
            } else {
                out_events.push(Event::IntentDropped {
                    direction,
                    reason: DropReason::BufferFull,
                });
            }
            return;
        }

        self.lock.engage();
        match self.mode {
            Mode::Classic => self.resolve(&Classic, direction, out_events),
            Mode::Lava => self.resolve(&Lava, direction, out_events),
            Mode::Fragile => {
                let rules = Fragile {
                    policy: self.config.fragile_policy,
                };
                self.resolve(&rules, direction, out_events);
            }
        }
    }

    fn resolve<R: ModeRules>(
        &mut self,
        rules: &R,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(destination) = self.board.size().step(self.player, direction) else {
            let origin = self.player;
            self.violate(
                rules.out_of_bounds(),
                origin,
                PenaltyCause::OutOfBounds,
                out_events,
            );
            return;
        };

        if self.board.is_wall(destination) {
            self.violate(rules.wall_hit(), destination, PenaltyCause::Wall, out_events);
            return;
        }

        if self.visited.contains(&destination) {
            if let Some(reason) = rules.revisit() {
                self.terminate(reason, out_events);
                return;
            }
        }

        if destination == self.board.target() {
            self.complete_level(destination, out_events);
            return;
        }

        let from = self.player;
        self.player = destination;
        if rules.leaves_trail() {
            let _ = self.visited.insert(from);
        }
        out_events.push(Event::PlayerAdvanced {
            from,
            to: destination,
        });
    }

    fn violate(
        &mut self,
        violation: Violation,
        tile: TileIndex,
        cause: PenaltyCause,
        out_events: &mut Vec<Event>,
    ) {
        let policy = match violation {
            Violation::Terminate(reason) => {
                self.terminate(reason, out_events);
                return;
            }
            Violation::Penalize(policy) => policy,
        };

        if cause == PenaltyCause::Wall {
            self.hits.mark(tile, self.config.hit_flag_duration);
        }

        match policy {
            CollisionPolicy::TimePenalty => {
                let time_remaining = self.clock.deduct(self.config.time_penalty);
                out_events.push(Event::PenaltyApplied {
                    tile,
                    cause,
                    time_remaining,
                });
            }
            CollisionPolicy::Stun => {
                self.stun = Countdown::start(self.config.stun_duration);
                out_events.push(Event::PlayerStunned {
                    tile,
                    cause,
                    duration: self.config.stun_duration,
                });
            }
        }
    }

    fn complete_level(&mut self, destination: TileIndex, out_events: &mut Vec<Event>) {
        let previous = self.board.size();
        self.level = self.level.saturating_add(1);
        let params = self.curve.params(self.level);
        self.player = remap(previous, destination, params.grid_size());
        self.board = generate(self.player, &params, &mut self.rng).into_board();
        self.visited.clear();
        self.hits.clear();
        self.clock.reset(params.time_limit());

        info!(
            "level {} reached; {side}x{side} grid with {} walls",
            self.level,
            self.board.walls().len(),
            side = params.grid_size().side(),
        );
        out_events.push(Event::LevelCompleted {
            level: self.level,
            board: self.board.clone(),
            player: self.player,
            time_budget: self.clock.budget(),
        });
    }

    fn terminate(&mut self, reason: TerminationReason, out_events: &mut Vec<Event>) {
        self.run_state = RunState::Terminated(reason);
        self.lock.clear();
        self.hits.clear();
        self.stun = Countdown::idle();

        info!(
            "session terminated at level {}: {}",
            self.level,
            reason.code()
        );
        out_events.push(Event::Terminated {
            reason,
            final_level: self.level,
        });
    }

    /// Advances every timer through `dt`, firing them in chronological order.
    ///
    /// Timers due at the same instant fire in the order clock, hit markers,
    /// stun, motion lock.
    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut left = dt;
        let mut cleared = Vec::new();

        loop {
            let step = [
                Some(self.clock.until_tick()),
                self.hits.deadline(),
                self.stun.remaining(),
                self.lock.deadline(),
            ]
            .into_iter()
            .flatten()
            .fold(left, Duration::min);
            left -= step;

            if self.clock.advance(step) && self.clock.expired() {
                self.terminate(TerminationReason::TimeLimitExceeded, out_events);
                return;
            }

            self.hits.advance(step, &mut cleared);
            out_events.extend(cleared.drain(..).map(|tile| Event::HitFlagCleared { tile }));

            let _ = self.stun.advance(step);

            if self.lock.advance(step) {
                if let Some(direction) = self.lock.next_buffered() {
                    self.submit(direction, out_events);
                    if !self.run_state.is_active() {
                        return;
                    }
                }
            }

            if left.is_zero() {
                break;
            }
        }

        out_events.push(Event::ClockAdvanced {
            time_remaining: self.clock.remaining(),
        });
    }
}

/// Places a tile at the same row and column of a grid of another size.
fn remap(from: GridSize, tile: TileIndex, to: GridSize) -> TileIndex {
    let last = to.side().saturating_sub(1);
    from.coord(tile)
        .map(|cell| CellCoord::new(cell.column().min(last), cell.row().min(last)))
        .and_then(|cell| to.index(cell))
        .unwrap_or(ORIGIN_TILE)
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start { mode } => {
            session.mode = mode;
            session.begin(out_events);
        }
        Command::Restart => {
            info!("restarting {} session from level {}", session.mode, session.level);
            session.begin(out_events);
        }
        Command::SubmitIntent { direction } => {
            if session.run_state.is_active() {
                session.submit(direction, out_events);
            } else {
                debug!("ignoring {direction:?} intent while {:?}", session.run_state);
            }
        }
        Command::Tick { dt } => {
            if session.run_state.is_active() {
                session.advance(dt, out_events);
            } else {
                debug!("ignoring {dt:?} tick while {:?}", session.run_state);
            }
        }
        Command::Pause => {
            if session.run_state.is_active() {
                session.run_state = RunState::Paused;
                out_events.push(Event::Paused);
            } else {
                debug!("ignoring pause while {:?}", session.run_state);
            }
        }
        Command::Resume => {
            if session.run_state == RunState::Paused {
                session.run_state = RunState::Active;
                out_events.push(Event::Resumed);
            } else {
                debug!("ignoring resume while {:?}", session.run_state);
            }
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::{collections::BTreeSet, time::Duration};

    use vector_grid_core::{Board, Direction, Mode, RunState, TileIndex};
    use vector_grid_system_difficulty::DifficultyCurve;

    use super::{Session, SessionConfig};

    /// Lifecycle state of the session.
    #[must_use]
    pub fn run_state(session: &Session) -> RunState {
        session.run_state
    }

    /// Mode the session enforces.
    #[must_use]
    pub fn mode(session: &Session) -> Mode {
        session.mode
    }

    /// Level currently being played.
    #[must_use]
    pub fn level(session: &Session) -> u32 {
        session.level
    }

    /// Tile the player occupies.
    #[must_use]
    pub fn player(session: &Session) -> TileIndex {
        session.player
    }

    /// Board of the current level, or the level-one preview while idle.
    #[must_use]
    pub fn board(session: &Session) -> &Board {
        &session.board
    }

    /// Tiles vacated during the current level; always empty outside Fragile mode.
    #[must_use]
    pub fn visited(session: &Session) -> &BTreeSet<TileIndex> {
        &session.visited
    }

    /// Countdown left for the current level.
    #[must_use]
    pub fn time_remaining(session: &Session) -> Duration {
        session.clock.remaining()
    }

    /// Full countdown granted for the current level.
    #[must_use]
    pub fn time_budget(session: &Session) -> Duration {
        session.clock.budget()
    }

    /// Reports whether a move is still in flight.
    #[must_use]
    pub fn motion_locked(session: &Session) -> bool {
        session.lock.is_engaged()
    }

    /// Intents waiting for the motion lock, oldest first.
    #[must_use]
    pub fn buffered_intents(session: &Session) -> Vec<Direction> {
        session.lock.buffered().collect()
    }

    /// Walls currently carrying a hit marker, in marking order.
    #[must_use]
    pub fn hit_tiles(session: &Session) -> Vec<TileIndex> {
        session.hits.tiles().collect()
    }

    /// Reports whether intents are currently refused because of a stun.
    #[must_use]
    pub fn stunned(session: &Session) -> bool {
        session.stun.is_running()
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(session: &Session) -> &SessionConfig {
        &session.config
    }

    /// Difficulty curve driving level progression.
    #[must_use]
    pub fn curve(session: &Session) -> &DifficultyCurve {
        &session.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_grid_system_difficulty::Tier;

    fn grid(side: u32) -> GridSize {
        GridSize::new(side).expect("valid grid size")
    }

    fn started(mode: Mode, config: SessionConfig) -> Session {
        let mut session =
            Session::new(config, DifficultyCurve::default()).expect("valid configuration");
        let mut events = Vec::new();
        apply(&mut session, Command::Start { mode }, &mut events);
        session
    }

    fn place(session: &mut Session, side: u32, target: u32, walls: &[u32], player: u32) {
        session.board = Board::new(
            grid(side),
            TileIndex::new(target),
            walls.iter().copied().map(TileIndex::new).collect(),
        );
        session.player = TileIndex::new(player);
    }

    fn send(session: &mut Session, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(session, command, &mut events);
        events
    }

    fn intent(direction: Direction) -> Command {
        Command::SubmitIntent { direction }
    }

    fn tick(millis: u64) -> Command {
        Command::Tick {
            dt: Duration::from_millis(millis),
        }
    }

    #[test]
    fn right_then_down_reaches_the_centre_target() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 4, &[], 0);

        let events = send(&mut session, intent(Direction::East));
        assert_eq!(
            events,
            vec![Event::PlayerAdvanced {
                from: TileIndex::new(0),
                to: TileIndex::new(1),
            }]
        );

        let events = send(&mut session, intent(Direction::South));
        assert_eq!(
            events,
            vec![Event::IntentBuffered {
                direction: Direction::South,
            }]
        );

        let events = send(&mut session, tick(100));
        assert!(
            matches!(events.first(), Some(Event::LevelCompleted { level: 2, .. })),
            "buffered move should complete the level: {events:?}",
        );
        assert_eq!(query::level(&session), 2);
        assert_eq!(
            query::player(&session),
            TileIndex::new(4),
            "player keeps its row and column on the next board",
        );
        assert_eq!(query::time_remaining(&session), query::time_budget(&session));
    }

    #[test]
    fn lava_step_into_the_void_loses_the_signal() {
        let mut session = started(Mode::Lava, SessionConfig::default());
        place(&mut session, 3, 8, &[], 0);

        let events = send(&mut session, intent(Direction::North));
        assert_eq!(
            events,
            vec![Event::Terminated {
                reason: TerminationReason::SignalLost,
                final_level: 1,
            }]
        );
        assert_eq!(
            query::run_state(&session),
            RunState::Terminated(TerminationReason::SignalLost)
        );
    }

    #[test]
    fn lava_wall_is_fatal_without_a_penalty() {
        let mut session = started(Mode::Lava, SessionConfig::default());
        place(&mut session, 3, 8, &[1], 0);
        let before = query::time_remaining(&session);

        let events = send(&mut session, intent(Direction::East));
        assert_eq!(
            events,
            vec![Event::Terminated {
                reason: TerminationReason::CriticalFailure,
                final_level: 1,
            }]
        );
        assert_eq!(query::time_remaining(&session), before);
        assert!(query::hit_tiles(&session).is_empty());
    }

    #[test]
    fn classic_wall_costs_time_and_marks_the_wall() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 8, &[3], 0);
        let before = query::time_remaining(&session);

        let events = send(&mut session, intent(Direction::South));
        assert_eq!(
            events,
            vec![Event::PenaltyApplied {
                tile: TileIndex::new(3),
                cause: PenaltyCause::Wall,
                time_remaining: before - DEFAULT_TIME_PENALTY,
            }]
        );
        assert_eq!(query::player(&session), TileIndex::new(0));
        assert_eq!(query::hit_tiles(&session), vec![TileIndex::new(3)]);

        let events = send(&mut session, tick(200));
        assert!(events.contains(&Event::HitFlagCleared {
            tile: TileIndex::new(3),
        }));
        assert!(query::hit_tiles(&session).is_empty());
    }

    #[test]
    fn fragile_collisions_cost_time_by_default() {
        let mut session = started(Mode::Fragile, SessionConfig::default());
        place(&mut session, 3, 8, &[3], 0);
        assert_eq!(
            query::config(&session).fragile_policy,
            CollisionPolicy::TimePenalty
        );

        let events = send(&mut session, intent(Direction::North));
        assert_eq!(
            events,
            vec![Event::PenaltyApplied {
                tile: TileIndex::new(0),
                cause: PenaltyCause::OutOfBounds,
                time_remaining: Duration::from_millis(4_260),
            }]
        );

        let _ = send(&mut session, tick(100));
        let before = query::time_remaining(&session);
        let events = send(&mut session, intent(Direction::South));
        assert_eq!(
            events,
            vec![Event::PenaltyApplied {
                tile: TileIndex::new(3),
                cause: PenaltyCause::Wall,
                time_remaining: before - DEFAULT_TIME_PENALTY,
            }]
        );
        assert_eq!(query::hit_tiles(&session), vec![TileIndex::new(3)]);
        assert!(!query::stunned(&session));
        assert_eq!(query::player(&session), TileIndex::new(0));
        assert!(query::visited(&session).is_empty());
    }

    #[test]
    fn termination_clears_hit_markers() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 8, &[3], 0);
        session.clock.reset(Duration::from_millis(520));

        let _ = send(&mut session, intent(Direction::South));
        assert_eq!(query::hit_tiles(&session), vec![TileIndex::new(3)]);

        let events = send(&mut session, tick(50));
        assert_eq!(
            events,
            vec![Event::Terminated {
                reason: TerminationReason::TimeLimitExceeded,
                final_level: 1,
            }]
        );
        assert!(query::hit_tiles(&session).is_empty());
    }

    #[test]
    fn out_of_bounds_penalty_reports_the_player_tile() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 8, &[], 2);

        let events = send(&mut session, intent(Direction::East));
        assert!(matches!(
            events.as_slice(),
            [Event::PenaltyApplied {
                tile,
                cause: PenaltyCause::OutOfBounds,
                ..
            }] if *tile == TileIndex::new(2)
        ));
        assert!(query::hit_tiles(&session).is_empty());
    }

    #[test]
    fn penalties_floor_at_zero_and_the_next_tick_expires() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 8, &[], 0);
        session.clock.reset(Duration::from_millis(300));

        let events = send(&mut session, intent(Direction::West));
        assert!(matches!(
            events.as_slice(),
            [Event::PenaltyApplied { time_remaining, .. }] if time_remaining.is_zero()
        ));
        assert!(query::run_state(&session).is_active());

        let events = send(&mut session, tick(10));
        assert_eq!(
            events,
            vec![Event::Terminated {
                reason: TerminationReason::TimeLimitExceeded,
                final_level: 1,
            }]
        );
    }

    #[test]
    fn fragile_return_to_a_vacated_tile_collapses() {
        let mut session = started(Mode::Fragile, SessionConfig::default());
        place(&mut session, 3, 8, &[], 0);

        let _ = send(&mut session, intent(Direction::East));
        assert_eq!(
            query::visited(&session).iter().copied().collect::<Vec<_>>(),
            vec![TileIndex::new(0)]
        );

        let _ = send(&mut session, tick(100));
        let events = send(&mut session, intent(Direction::West));
        assert_eq!(
            events,
            vec![Event::Terminated {
                reason: TerminationReason::StructuralCollapse,
                final_level: 1,
            }]
        );
    }

    #[test]
    fn visited_tiles_stay_empty_outside_fragile() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 8, &[], 0);

        let _ = send(&mut session, intent(Direction::East));
        let _ = send(&mut session, tick(100));
        let _ = send(&mut session, intent(Direction::West));

        assert!(query::visited(&session).is_empty());
        assert_eq!(query::player(&session), TileIndex::new(0));
    }

    #[test]
    fn stun_policy_refuses_intents_until_it_wears_off() {
        let config = SessionConfig {
            fragile_policy: CollisionPolicy::Stun,
            ..SessionConfig::default()
        };
        let mut session = started(Mode::Fragile, config);
        place(&mut session, 3, 8, &[1], 0);
        let before = query::time_remaining(&session);

        let events = send(&mut session, intent(Direction::East));
        assert_eq!(
            events,
            vec![Event::PlayerStunned {
                tile: TileIndex::new(1),
                cause: PenaltyCause::Wall,
                duration: DEFAULT_STUN_DURATION,
            }]
        );
        assert_eq!(query::time_remaining(&session), before);

        let _ = send(&mut session, tick(100));
        let events = send(&mut session, intent(Direction::South));
        assert_eq!(
            events,
            vec![Event::IntentDropped {
                direction: Direction::South,
                reason: DropReason::Stunned,
            }]
        );

        let _ = send(&mut session, tick(300));
        assert!(!query::stunned(&session));
        let events = send(&mut session, intent(Direction::South));
        assert_eq!(
            events,
            vec![Event::PlayerAdvanced {
                from: TileIndex::new(0),
                to: TileIndex::new(3),
            }]
        );
    }

    #[test]
    fn third_intent_in_a_window_is_dropped() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 4, 15, &[], 5);

        let _ = send(&mut session, intent(Direction::East));
        let _ = send(&mut session, intent(Direction::South));
        let _ = send(&mut session, intent(Direction::West));
        let events = send(&mut session, intent(Direction::North));
        assert_eq!(
            events,
            vec![Event::IntentDropped {
                direction: Direction::North,
                reason: DropReason::BufferFull,
            }]
        );
        assert_eq!(
            query::buffered_intents(&session),
            vec![Direction::South, Direction::West]
        );

        let events = send(&mut session, tick(100));
        assert_eq!(
            events.first(),
            Some(&Event::PlayerAdvanced {
                from: TileIndex::new(6),
                to: TileIndex::new(10),
            })
        );
        let events = send(&mut session, tick(100));
        assert_eq!(
            events.first(),
            Some(&Event::PlayerAdvanced {
                from: TileIndex::new(10),
                to: TileIndex::new(9),
            })
        );
        assert!(query::buffered_intents(&session).is_empty());
    }

    #[test]
    fn one_long_tick_matches_many_short_ones() {
        let mut long = started(Mode::Classic, SessionConfig::default());
        let mut short = started(Mode::Classic, SessionConfig::default());
        for session in [&mut long, &mut short] {
            place(session, 4, 15, &[], 0);
            let _ = send(session, intent(Direction::East));
            let _ = send(session, intent(Direction::South));
            let _ = send(session, intent(Direction::South));
        }

        let _ = send(&mut long, tick(250));
        for _ in 0..25 {
            let _ = send(&mut short, tick(10));
        }

        assert_eq!(query::player(&long), query::player(&short));
        assert_eq!(query::player(&long), TileIndex::new(9));
        assert_eq!(query::time_remaining(&long), query::time_remaining(&short));
        assert_eq!(query::motion_locked(&long), query::motion_locked(&short));
    }

    #[test]
    fn pause_freezes_every_timer() {
        let mut session = started(Mode::Classic, SessionConfig::default());
        place(&mut session, 3, 8, &[], 0);
        let _ = send(&mut session, intent(Direction::East));
        let _ = send(&mut session, intent(Direction::South));
        let _ = send(&mut session, tick(15));
        let frozen = query::time_remaining(&session);

        assert_eq!(send(&mut session, Command::Pause), vec![Event::Paused]);
        assert!(send(&mut session, tick(5_000)).is_empty());
        assert!(send(&mut session, intent(Direction::South)).is_empty());
        assert_eq!(query::time_remaining(&session), frozen);
        assert_eq!(query::buffered_intents(&session), vec![Direction::South]);

        assert_eq!(send(&mut session, Command::Resume), vec![Event::Resumed]);
        let events = send(&mut session, tick(5));
        assert_eq!(
            events,
            vec![Event::ClockAdvanced {
                time_remaining: frozen - DEFAULT_CLOCK_INTERVAL,
            }],
            "the partial tick carried across the pause",
        );
    }

    #[test]
    fn resume_and_pause_require_the_matching_state() {
        let mut session =
            Session::new(SessionConfig::default(), DifficultyCurve::default()).expect("valid");
        assert!(send(&mut session, Command::Pause).is_empty());
        assert!(send(&mut session, Command::Resume).is_empty());
        assert!(send(&mut session, intent(Direction::East)).is_empty());

        let _ = send(&mut session, Command::Start { mode: Mode::Lava });
        assert!(send(&mut session, Command::Resume).is_empty());
    }

    #[test]
    fn level_completion_remaps_onto_a_larger_grid() {
        let tiers = vec![
            Tier {
                through_level: Some(1),
                grid_size: 3,
                wall_count_min: 0,
                wall_count_max: 0,
                time_base_ms: 5_000,
                time_step_ms: 0,
                time_floor_ms: 5_000,
                level_offset: 0,
                complexity: 0.0,
            },
            Tier {
                through_level: None,
                grid_size: 5,
                wall_count_min: 0,
                wall_count_max: 4,
                time_base_ms: 7_000,
                time_step_ms: 0,
                time_floor_ms: 7_000,
                level_offset: 0,
                complexity: 0.0,
            },
        ];
        let curve = DifficultyCurve::from_tiers(tiers).expect("valid tiers");
        let mut session = Session::new(SessionConfig::default(), curve).expect("valid");
        let _ = send(&mut session, Command::Start { mode: Mode::Fragile });
        place(&mut session, 3, 5, &[], 2);
        let _ = session.visited.insert(TileIndex::new(1));

        let events = send(&mut session, intent(Direction::South));
        assert!(matches!(
            events.as_slice(),
            [Event::LevelCompleted { level: 2, player, time_budget, .. }]
                if *player == TileIndex::new(7) && *time_budget == Duration::from_millis(7_000)
        ));
        assert_eq!(query::board(&session).size(), grid(5));
        assert!(query::visited(&session).is_empty());
        assert_ne!(query::board(&session).target(), query::player(&session));
    }

    #[test]
    fn zero_timers_are_rejected() {
        let config = SessionConfig {
            clock_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert_eq!(
            Session::new(config, DifficultyCurve::default()).err(),
            Some(ConfigError::ZeroDuration {
                field: "clock_interval",
            })
        );
    }

    #[test]
    fn remap_clamps_to_the_new_edge() {
        assert_eq!(remap(grid(3), TileIndex::new(8), grid(5)), TileIndex::new(12));
        assert_eq!(remap(grid(5), TileIndex::new(24), grid(3)), TileIndex::new(8));
    }
}
