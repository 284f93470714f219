use rand::Rng;
use tracing::{debug, info, trace};

use crate::config::Timings;
use crate::error::GenerationError;
use crate::grid::{Dir, Grid, Tile};
use crate::maze;
use crate::scheduler::Scheduler;
use crate::sim::{self, Pickup, PlayerMove};
use crate::spawn;

pub const START_LIVES: i32 = 3;
pub const MAX_ENEMIES: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub lives: i32,
    pub level: u32,
    pub invincible: bool,
    pub boosted: bool,
    /// Milliseconds between player moves.
    pub player_speed: u64,
    /// Milliseconds between enemy moves.
    pub enemy_speed: u64,
}

impl GameState {
    pub fn new(timings: &Timings) -> Self {
        Self {
            score: 0,
            lives: START_LIVES,
            level: 1,
            invincible: false,
            boosted: false,
            player_speed: timings.player_ms,
            enemy_speed: timings.enemy_interval(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Playing,
    GameOver,
}

/// Work handed to the scheduler. Reverts carry the session and level stage
/// that armed them and do nothing once those have been replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    PlayerMove,
    EnemyMove,
    BoostEnd { session: u64, stage: u64 },
    InvincibilityEnd { session: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    LivesChanged(i32),
    PowerUp,
    LevelUp(u32),
    GameOver { score: u32 },
}

pub struct Game {
    rows: usize,
    cols: usize,
    timings: Timings,
    grid: Grid,
    state: GameState,
    phase: Phase,
    direction: Option<Dir>,
    facing: Dir,
    scheduler: Scheduler<Timer>,
    session: u64,
    stage: u64,
}

impl Game {
    pub fn new(rows: usize, cols: usize, timings: Timings) -> Self {
        Self {
            rows,
            cols,
            grid: Grid::filled(rows, cols, Tile::Wall),
            state: GameState::new(&timings),
            timings,
            phase: Phase::NotStarted,
            direction: None,
            facing: Dir::Right,
            scheduler: Scheduler::new(),
            session: 0,
            stage: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn direction(&self) -> Option<Dir> {
        self.direction
    }

    /// Last direction the player tried to move in.
    pub fn facing(&self) -> Dir {
        self.facing
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn invincible_until(&self) -> Option<u64> {
        self.scheduler.due_at(&Timer::InvincibilityEnd {
            session: self.session,
        })
    }

    pub fn boost_until(&self) -> Option<u64> {
        self.scheduler.due_at(&Timer::BoostEnd {
            session: self.session,
            stage: self.stage,
        })
    }

    /// Resets score, lives and level and builds level 1.
    pub fn start(&mut self, rng: &mut impl Rng) -> Result<(), GenerationError> {
        self.scheduler.cancel_all();
        self.phase = Phase::NotStarted;
        self.session += 1;
        self.state = GameState::new(&self.timings);
        self.direction = None;
        self.facing = Dir::Right;
        self.setup_level(rng)?;
        self.phase = Phase::Playing;
        info!(session = self.session, rows = self.rows, cols = self.cols, "game started");
        Ok(())
    }

    fn setup_level(&mut self, rng: &mut impl Rng) -> Result<(), GenerationError> {
        let level = self.state.level;
        let mut grid = maze::generate(rng, self.rows, self.cols, level + 2)?;
        let enemies = spawn::spawn_enemies(&mut grid, rng, level.min(MAX_ENEMIES) as usize);
        let power_up = spawn::spawn_power_up(&mut grid, rng);

        self.grid = grid;
        self.stage += 1;
        self.state.boosted = false;
        self.state.player_speed = self.timings.player_ms;
        self.state.enemy_speed = self.timings.enemy_interval(level);
        self.scheduler.every(Timer::PlayerMove, self.state.player_speed);
        self.scheduler.every(Timer::EnemyMove, self.state.enemy_speed);

        debug!(
            level,
            enemies = enemies.len(),
            power_up = ?power_up,
            points = self.grid.count(Tile::Point),
            enemy_ms = self.state.enemy_speed,
            "level ready"
        );
        Ok(())
    }

    /// Last input wins; the player keeps moving this way every tick.
    pub fn set_direction(&mut self, dir: Dir) {
        self.direction = Some(dir);
    }

    /// Moves the clock forward by `ms`, running every tick and deferred
    /// effect that falls due, in order.
    pub fn advance(
        &mut self,
        ms: u64,
        rng: &mut impl Rng,
    ) -> Result<Vec<GameEvent>, GenerationError> {
        let until = self.scheduler.now() + ms;
        let mut events = Vec::new();
        while let Some(timer) = self.scheduler.pop_due(until) {
            match timer {
                Timer::PlayerMove => events.extend(self.player_tick(rng)?),
                Timer::EnemyMove => events.extend(self.enemy_tick(rng)),
                Timer::BoostEnd { session, stage } => self.end_boost(session, stage),
                Timer::InvincibilityEnd { session } => self.end_invincibility(session),
            }
        }
        self.scheduler.finish(until);
        Ok(events)
    }

    pub fn player_tick(&mut self, rng: &mut impl Rng) -> Result<Vec<GameEvent>, GenerationError> {
        let mut events = Vec::new();
        if !self.is_active() {
            return Ok(events);
        }
        let Some(dir) = self.direction else {
            return Ok(events);
        };
        self.facing = dir;

        match sim::move_player(&mut self.grid, &mut self.state, dir) {
            PlayerMove::Blocked => {}
            PlayerMove::HitEnemy => self.lose_life(&mut events),
            PlayerMove::Moved { pickup, .. } => {
                if pickup == Some(Pickup::PowerUp) {
                    self.start_boost();
                    events.push(GameEvent::PowerUp);
                }
                self.check_win(rng, &mut events)?;
            }
        }
        Ok(events)
    }

    pub fn enemy_tick(&mut self, rng: &mut impl Rng) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.is_active() {
            return events;
        }
        let moves = sim::move_enemies(&mut self.grid, rng);
        trace!(moved = moves.moved, hits = moves.player_hits, "enemies moved");
        if moves.player_hits > 0 {
            self.lose_life(&mut events);
        }
        events
    }

    fn start_boost(&mut self) {
        let revert = Timer::BoostEnd {
            session: self.session,
            stage: self.stage,
        };
        self.scheduler.cancel(&revert);
        self.state.boosted = true;
        self.state.player_speed = self.timings.boosted_player_ms;
        self.scheduler
            .set_interval(&Timer::PlayerMove, self.state.player_speed);
        self.scheduler.after(self.timings.boost_ms, revert);
        info!(score = self.state.score, "power-up collected");
    }

    fn end_boost(&mut self, session: u64, stage: u64) {
        if session != self.session || stage != self.stage {
            trace!(session, stage, "stale boost revert ignored");
            return;
        }
        self.state.boosted = false;
        self.state.player_speed = self.timings.player_ms;
        self.scheduler
            .set_interval(&Timer::PlayerMove, self.state.player_speed);
        debug!("speed boost over");
    }

    fn end_invincibility(&mut self, session: u64) {
        if session != self.session {
            trace!(session, "stale invincibility revert ignored");
            return;
        }
        self.state.invincible = false;
    }

    fn lose_life(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.invincible || !self.is_active() {
            return;
        }
        self.state.lives -= 1;
        self.state.invincible = true;
        self.scheduler.after(
            self.timings.invincibility_ms,
            Timer::InvincibilityEnd {
                session: self.session,
            },
        );
        info!(lives = self.state.lives, level = self.state.level, "life lost");
        events.push(GameEvent::LivesChanged(self.state.lives));

        if self.state.lives <= 0 {
            self.end_game(events);
        }
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        self.phase = Phase::GameOver;
        self.scheduler.cancel_all();
        self.direction = None;
        self.state.invincible = false;
        self.state.boosted = false;
        info!(score = self.state.score, level = self.state.level, "game over");
        events.push(GameEvent::GameOver {
            score: self.state.score,
        });
    }

    fn check_win(
        &mut self,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GenerationError> {
        if self.grid.has_points() {
            return Ok(());
        }
        self.state.level += 1;
        info!(level = self.state.level, score = self.state.score, "level cleared");
        events.push(GameEvent::LevelUp(self.state.level));
        self.setup_level(rng)
    }
}
