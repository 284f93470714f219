mod config;
mod error;
mod game;
mod grid;
mod leaderboard;
mod maze;
mod reach;
mod scheduler;
mod sim;
mod spawn;
mod ui;

use std::fs::File;
use std::io::{self, Stdout};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::game::{Game, GameEvent, Phase};
use crate::grid::Dir;
use crate::leaderboard::{JsonFileStore, ScoreStore};
use crate::ui::{PlayerColor, Renderer, View};

fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    init_logging(&settings)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode().context("enabling raw mode")?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &settings);

    if let Err(err) = restore_terminal(&mut stdout) {
        error!(%err, "could not restore terminal");
    }
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}

fn init_logging(settings: &Settings) -> anyhow::Result<()> {
    let file = File::create(&settings.log_file)
        .with_context(|| format!("creating log file {}", settings.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    Ok(())
}

fn restore_terminal(stdout: &mut Stdout) -> io::Result<()> {
    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()
}

enum Next {
    Again,
    Quit,
}

fn run(stdout: &mut Stdout, settings: &Settings) -> anyhow::Result<()> {
    let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, rows = settings.rows, cols = settings.cols, "maze-chase starting");
    let mut rng = StdRng::seed_from_u64(seed);

    let store = JsonFileStore::new(&settings.scores);
    let mut leaderboard = leaderboard::load_or_default(&store);
    info!(path = %store.path().display(), entries = leaderboard.entries().len(), "leaderboard loaded");

    loop {
        ui::render_start_screen(stdout, &leaderboard)?;
        if !wait_for_start()? {
            return Ok(());
        }
        let color = ui::prompt_color(stdout)?;
        info!(?color, "player color chosen");

        let mut game = Game::new(settings.rows, settings.cols, settings.timings());
        game.start(&mut rng).context("building the first level")?;

        match play(stdout, settings, &mut game, &mut rng, color)? {
            Next::Quit => return Ok(()),
            Next::Again => {}
        }

        let score = game.state().score;
        if let Some(name) = ui::prompt_name(stdout, score)? {
            match leaderboard.record(name.as_str(), score) {
                Some(rank) => {
                    info!(%name, score, rank = rank + 1, "new leaderboard entry");
                    if let Err(err) = store.save(leaderboard.entries()) {
                        warn!(%err, "could not save leaderboard");
                    }
                }
                None => info!(%name, score, "score did not make the leaderboard"),
            }
        }
    }
}

/// Blocks until the player starts (`true`) or quits (`false`).
fn wait_for_start() -> io::Result<bool> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(true),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }
}

fn play(
    stdout: &mut Stdout,
    settings: &Settings,
    game: &mut Game,
    rng: &mut StdRng,
    color: PlayerColor,
) -> anyhow::Result<Next> {
    let mut renderer = Renderer::new(settings.cols, settings.rows);
    let frame_time = Duration::from_micros(1_000_000 / settings.fps.max(1));
    let banner_ms = settings.timings().banner_ms;
    let mut view = View {
        player_color: color,
        banner: Some("LEVEL 1".to_string()),
    };
    let mut banner_until = Some(game.now() + banner_ms);
    let mut last = Instant::now();
    let mut carry = Duration::ZERO;

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        info!(score = game.state().score, "quit mid-game");
                        return Ok(Next::Quit);
                    }
                    code => {
                        if let Some(dir) = dir_for_key(code) {
                            game.set_direction(dir);
                        }
                    }
                }
            }
        }

        carry += last.elapsed();
        last = Instant::now();
        let ms = carry.as_millis() as u64;
        carry -= Duration::from_millis(ms);

        for event in game.advance(ms, rng).context("building the next level")? {
            if let GameEvent::LevelUp(_) = event {
                renderer.invalidate();
            }
            view.banner = Some(banner_for(&event));
            banner_until = Some(game.now() + banner_ms);
        }
        let over = game.phase() == Phase::GameOver;
        if !over && banner_until.is_some_and(|t| game.now() >= t) {
            view.banner = None;
            banner_until = None;
        }

        ui::render(stdout, game, &view, &mut renderer)?;
        if over {
            return Ok(Next::Again);
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

/// Text shown under the maze after a game event.
fn banner_for(event: &GameEvent) -> String {
    match event {
        GameEvent::LevelUp(level) => format!("LEVEL {level}"),
        GameEvent::PowerUp => "SPEED BOOST!".to_string(),
        GameEvent::LivesChanged(lives) => {
            let noun = if *lives == 1 { "life" } else { "lives" };
            format!("OUCH! {lives} {noun} left")
        }
        GameEvent::GameOver { score } => format!("GAME OVER  Score: {score}"),
    }
}

fn dir_for_key(code: KeyCode) -> Option<Dir> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(Dir::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Dir::Down),
        KeyCode::Left | KeyCode::Char('h') => Some(Dir::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(Dir::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_vim_keys_steer() {
        assert_eq!(dir_for_key(KeyCode::Up), Some(Dir::Up));
        assert_eq!(dir_for_key(KeyCode::Char('j')), Some(Dir::Down));
        assert_eq!(dir_for_key(KeyCode::Char('h')), Some(Dir::Left));
        assert_eq!(dir_for_key(KeyCode::Right), Some(Dir::Right));
        assert_eq!(dir_for_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn every_event_gets_a_banner() {
        assert_eq!(banner_for(&GameEvent::LevelUp(3)), "LEVEL 3");
        assert_eq!(banner_for(&GameEvent::PowerUp), "SPEED BOOST!");
        assert_eq!(banner_for(&GameEvent::LivesChanged(2)), "OUCH! 2 lives left");
        assert_eq!(banner_for(&GameEvent::LivesChanged(1)), "OUCH! 1 life left");
        assert_eq!(
            banner_for(&GameEvent::GameOver { score: 140 }),
            "GAME OVER  Score: 140"
        );
    }
}
