use std::io::{self, Stdout, Write};
use std::str::FromStr;
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use crate::game::Game;
use crate::grid::{Dir, Pos, Tile};
use crate::leaderboard::Leaderboard;

const CELL_W: usize = 2;
const MAX_NAME_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerColor {
    Yellow,
    Red,
    Blue,
    Green,
    Cyan,
    Magenta,
}

impl PlayerColor {
    pub fn color(self) -> Color {
        match self {
            PlayerColor::Yellow => Color::Yellow,
            PlayerColor::Red => Color::Red,
            PlayerColor::Blue => Color::Blue,
            PlayerColor::Green => Color::Green,
            PlayerColor::Cyan => Color::Cyan,
            PlayerColor::Magenta => Color::Magenta,
        }
    }
}

impl FromStr for PlayerColor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(PlayerColor::Yellow),
            "red" => Ok(PlayerColor::Red),
            "blue" => Ok(PlayerColor::Blue),
            "green" => Ok(PlayerColor::Green),
            "cyan" => Ok(PlayerColor::Cyan),
            "magenta" => Ok(PlayerColor::Magenta),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player(Dir),
    Enemy,
    Wall,
    Empty,
    Point,
    PowerUp,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

/// What the frame loop overlays on top of the game state.
pub struct View {
    pub player_color: PlayerColor,
    pub banner: Option<String>,
}

pub struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    last_banner: Option<String>,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            last_banner: None,
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    /// Forces the next frame to redraw every cell.
    pub fn invalidate(&mut self) {
        self.needs_full = true;
    }
}

pub fn render(stdout: &mut Stdout, game: &Game, view: &View, renderer: &mut Renderer) -> io::Result<()> {
    let grid = game.grid();
    let needed_h = (grid.rows() + 3) as u16;
    let needed_w = (grid.cols() * CELL_W).max(40) as u16;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(MoveTo(0, 0))?;
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - (grid.cols() * CELL_W) as u16) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let hud = hud_line(game);
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(0, renderer.origin_y - 1))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for pos in grid.positions() {
        let cell = cell_for(game, view, pos);
        let idx = pos.y * grid.cols() + pos.x;
        if renderer.needs_full || cell != renderer.last[idx] {
            renderer.last[idx] = cell;
            draw_cell(stdout, renderer, pos.x, pos.y, cell)?;
        }
    }

    if renderer.needs_full || view.banner != renderer.last_banner {
        let y = renderer.origin_y + grid.rows() as u16;
        stdout.queue(MoveTo(0, y))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        if let Some(banner) = &view.banner {
            stdout.queue(MoveTo(renderer.origin_x, y))?;
            stdout.queue(SetForegroundColor(Color::Green))?;
            stdout.queue(Print(banner))?;
            stdout.queue(ResetColor)?;
        }
        renderer.last_banner = view.banner.clone();
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn hud_line(game: &Game) -> String {
    let state = game.state();
    let mut hud = format!(
        "Score: {}  Lives: {}  Level: {}  Points: {}",
        state.score,
        "♥".repeat(state.lives.max(0) as usize),
        state.level,
        game.grid().count(Tile::Point),
    );
    if let Some(until) = game.boost_until().filter(|_| state.boosted) {
        hud.push_str(&format!("  BOOST {}s", seconds_left(game.now(), until)));
    }
    if let Some(until) = game.invincible_until().filter(|_| state.invincible) {
        hud.push_str(&format!("  SHIELD {}s", seconds_left(game.now(), until)));
    }
    hud
}

fn seconds_left(now: u64, until: u64) -> u64 {
    until.saturating_sub(now).div_ceil(1000)
}

fn cell_for(game: &Game, view: &View, pos: Pos) -> Cell {
    match game.grid().get(pos) {
        Some(Tile::Player) => Cell {
            glyph: Glyph::Player(game.facing()),
            color: if game.state().invincible {
                Color::White
            } else {
                view.player_color.color()
            },
        },
        Some(Tile::Enemy) => Cell {
            glyph: Glyph::Enemy,
            color: Color::Red,
        },
        Some(Tile::Wall) => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Some(Tile::Point) => Cell {
            glyph: Glyph::Point,
            color: Color::White,
        },
        Some(Tile::PowerUp) => Cell {
            glyph: Glyph::PowerUp,
            color: Color::Yellow,
        },
        Some(Tile::Empty) | None => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
    }
}

fn glyph_text(glyph: Glyph) -> &'static str {
    match glyph {
        Glyph::Player(Dir::Up) => "▲",
        Glyph::Player(Dir::Down) => "▼",
        Glyph::Player(Dir::Left) => "◀",
        Glyph::Player(Dir::Right) => "▶",
        Glyph::Enemy => "👻",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
        Glyph::Point => "· ",
        Glyph::PowerUp => "● ",
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = glyph_text(cell.glyph);
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

pub fn render_start_screen(stdout: &mut Stdout, leaderboard: &Leaderboard) -> io::Result<()> {
    stdout.queue(Clear(ClearType::All))?;
    let mut lines = vec![
        "M A Z E   C H A S E".to_string(),
        String::new(),
        "Arrows or h/j/k/l to steer, q to quit".to_string(),
        "Press Enter to start".to_string(),
        String::new(),
        "Leaderboard".to_string(),
    ];
    if leaderboard.entries().is_empty() {
        lines.push("(no scores yet)".to_string());
    }
    for (i, entry) in leaderboard.entries().iter().enumerate() {
        lines.push(format!("{}. {} .... {}", i + 1, entry.name, entry.score));
    }

    let (term_w, term_h) = terminal::size()?;
    let top = term_h.saturating_sub(lines.len() as u16) / 2;
    for (i, line) in lines.iter().enumerate() {
        let w = UnicodeWidthStr::width(line.as_str()) as u16;
        stdout.queue(MoveTo(term_w.saturating_sub(w) / 2, top + i as u16))?;
        stdout.queue(SetForegroundColor(if i == 0 { Color::Yellow } else { Color::White }))?;
        stdout.queue(Print(line))?;
    }
    stdout.queue(ResetColor)?;
    stdout.flush()
}

/// One-line text prompt at the bottom of the screen. `Enter` confirms, `Esc`
/// cancels; blank answers count as cancelled.
pub fn prompt_line(stdout: &mut Stdout, question: &str, initial: &str) -> io::Result<Option<String>> {
    let mut input = initial.to_string();
    loop {
        let (_, term_h) = terminal::size()?;
        let row = term_h.saturating_sub(1);
        stdout.queue(MoveTo(0, row))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Print(format!("{question} {input}_")))?;
        stdout.queue(ResetColor)?;
        stdout.flush()?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => {
                let answer = input.trim().to_string();
                return Ok((!answer.is_empty()).then_some(answer));
            }
            KeyCode::Esc => return Ok(None),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if !c.is_control() && input.chars().count() < MAX_NAME_LEN => {
                input.push(c);
            }
            _ => {}
        }
    }
}

pub fn prompt_color(stdout: &mut Stdout) -> io::Result<PlayerColor> {
    let answer = prompt_line(stdout, "Choose player color (yellow/red/blue/green/cyan/magenta):", "yellow")?;
    Ok(answer
        .and_then(|a| a.parse().ok())
        .unwrap_or(PlayerColor::Yellow))
}

pub fn prompt_name(stdout: &mut Stdout, score: u32) -> io::Result<Option<String>> {
    prompt_line(stdout, &format!("Game Over! Score {score}. Enter name:"), "")
}
