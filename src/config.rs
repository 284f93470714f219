use std::path::PathBuf;

use clap::Parser;

const DEFAULT_ROWS: usize = 10;
const DEFAULT_COLS: usize = 10;
const DEFAULT_RENDER_FPS: u64 = 60;
const DEFAULT_PLAYER_MS: u64 = 180;
const BOOSTED_PLAYER_MS: u64 = 80;
const BOOST_MS: u64 = 5000;
const INVINCIBILITY_MS: u64 = 1500;
const DEFAULT_ENEMY_MS: u64 = 500;
const ENEMY_LEVEL_STEP_MS: u64 = 30;
const ENEMY_MIN_MS: u64 = 100;
const LEVEL_BANNER_MS: u64 = 1200;

/// Command-line settings. Every flag can also come from a `MAZE_*` variable.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", version, about = "Chase points through a random maze in the terminal")]
pub struct Settings {
    /// Maze height in tiles, border included.
    #[arg(long, env = "MAZE_ROWS", default_value_t = DEFAULT_ROWS, value_parser = parse_dimension)]
    pub rows: usize,
    /// Maze width in tiles, border included.
    #[arg(long, env = "MAZE_COLS", default_value_t = DEFAULT_COLS, value_parser = parse_dimension)]
    pub cols: usize,
    /// Seed for maze generation and enemy movement. Random when omitted.
    #[arg(long, env = "MAZE_SEED")]
    pub seed: Option<u64>,
    /// Where the top-5 leaderboard is kept.
    #[arg(long, env = "MAZE_SCORES", default_value = "scores.json")]
    pub scores: PathBuf,
    /// Log file; the terminal itself is used by the game.
    #[arg(long, env = "MAZE_LOG", default_value = "maze-chase.log")]
    pub log_file: PathBuf,
    /// Render frames per second.
    #[arg(
        long,
        env = "MAZE_FPS",
        default_value_t = DEFAULT_RENDER_FPS,
        value_parser = clap::value_parser!(u64).range(1..=240)
    )]
    pub fps: u64,
    /// Milliseconds between player moves.
    #[arg(
        long = "player-ms",
        env = "MAZE_PLAYER_MS",
        default_value_t = DEFAULT_PLAYER_MS,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    pub player_ms: u64,
    /// Milliseconds between enemy moves on level 0; shortened every level.
    #[arg(
        long = "enemy-ms",
        env = "MAZE_ENEMY_MS",
        default_value_t = DEFAULT_ENEMY_MS,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    pub enemy_ms: u64,
}

impl Settings {
    pub fn timings(&self) -> Timings {
        Timings {
            player_ms: self.player_ms,
            enemy_ms: self.enemy_ms,
            ..Timings::default()
        }
    }
}

fn parse_dimension(value: &str) -> Result<usize, String> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("`{value}` is not a whole number"))?;
    if !(3..=200).contains(&n) {
        return Err(format!("dimension must be between 3 and 200, got {n}"));
    }
    Ok(n)
}

/// Durations in milliseconds, the scheduler's time unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    pub player_ms: u64,
    pub boosted_player_ms: u64,
    pub boost_ms: u64,
    pub invincibility_ms: u64,
    pub enemy_ms: u64,
    pub enemy_level_step_ms: u64,
    pub enemy_min_ms: u64,
    pub banner_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            player_ms: DEFAULT_PLAYER_MS,
            boosted_player_ms: BOOSTED_PLAYER_MS,
            boost_ms: BOOST_MS,
            invincibility_ms: INVINCIBILITY_MS,
            enemy_ms: DEFAULT_ENEMY_MS,
            enemy_level_step_ms: ENEMY_LEVEL_STEP_MS,
            enemy_min_ms: ENEMY_MIN_MS,
            banner_ms: LEVEL_BANNER_MS,
        }
    }
}

impl Timings {
    /// Enemy tick interval for `level`, never below `enemy_min_ms`.
    pub fn enemy_interval(&self, level: u32) -> u64 {
        self.enemy_ms
            .saturating_sub(u64::from(level) * self.enemy_level_step_ms)
            .max(self.enemy_min_ms)
    }
}
