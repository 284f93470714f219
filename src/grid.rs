use std::fmt;
use std::str::FromStr;

use crate::error::GridParseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    Point,
    Wall,
    Player,
    Enemy,
    Empty,
    PowerUp,
}

impl Tile {
    pub fn glyph(self) -> char {
        match self {
            Tile::Point => '.',
            Tile::Wall => '#',
            Tile::Player => '@',
            Tile::Enemy => 'E',
            Tile::Empty => ' ',
            Tile::PowerUp => '*',
        }
    }

    pub fn from_glyph(c: char) -> Option<Tile> {
        match c {
            '.' => Some(Tile::Point),
            '#' => Some(Tile::Wall),
            '@' => Some(Tile::Player),
            'E' => Some(Tile::Enemy),
            ' ' => Some(Tile::Empty),
            '*' => Some(Tile::PowerUp),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

/// Rectangular tile grid, stored row-major as `tiles[y][x]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    pub fn filled(rows: usize, cols: usize, tile: Tile) -> Self {
        Self {
            rows,
            cols,
            tiles: vec![vec![tile; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    pub fn is_border(&self, pos: Pos) -> bool {
        pos.x == 0 || pos.y == 0 || pos.x + 1 == self.cols || pos.y + 1 == self.rows
    }

    pub fn get(&self, pos: Pos) -> Option<Tile> {
        self.tiles.get(pos.y).and_then(|row| row.get(pos.x)).copied()
    }

    /// Writes `tile` at `pos`. Out-of-bounds writes are ignored and return false.
    pub fn set(&mut self, pos: Pos, tile: Tile) -> bool {
        match self.tiles.get_mut(pos.y).and_then(|row| row.get_mut(pos.x)) {
            Some(cell) => {
                *cell = tile;
                true
            }
            None => false,
        }
    }

    /// Neighbor of `pos` in `dir`, or `None` when it would leave the grid.
    pub fn step(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = pos.x.checked_add_signed(dx)?;
        let ny = pos.y.checked_add_signed(dy)?;
        let next = Pos::new(nx, ny);
        self.contains(next).then_some(next)
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| Pos::new(x, y)))
    }

    pub fn interior(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions().filter(move |p| !self.is_border(*p))
    }

    /// Every position holding `tile`, in row-major order.
    pub fn find_all(&self, tile: Tile) -> Vec<Pos> {
        self.positions()
            .filter(|p| self.get(*p) == Some(tile))
            .collect()
    }

    pub fn find_player(&self) -> Option<Pos> {
        self.positions().find(|p| self.get(*p) == Some(Tile::Player))
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&t| t == tile)
            .count()
    }

    pub fn has_points(&self) -> bool {
        self.tiles.iter().any(|row| row.contains(&Tile::Point))
    }
}

impl FromStr for Grid {
    type Err = GridParseError;

    /// Parses ASCII art using the glyphs of [`Tile::glyph`]. Leading and
    /// trailing blank lines are skipped so raw string literals read cleanly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .skip_while(|l| l.trim().is_empty())
            .collect();
        let end = lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .ok_or(GridParseError::Empty)?;

        let mut tiles = Vec::with_capacity(end + 1);
        for (y, line) in lines[..=end].iter().enumerate() {
            let row = line
                .chars()
                .enumerate()
                .map(|(x, c)| Tile::from_glyph(c).ok_or(GridParseError::UnknownGlyph { glyph: c, x, y }))
                .collect::<Result<Vec<_>, _>>()?;
            tiles.push(row);
        }

        let cols = tiles[0].len();
        if let Some((row, found)) = tiles
            .iter()
            .enumerate()
            .map(|(y, r)| (y, r.len()))
            .find(|(_, len)| *len != cols)
        {
            return Err(GridParseError::Ragged {
                row,
                expected: cols,
                found,
            });
        }

        Ok(Grid {
            rows: tiles.len(),
            cols,
            tiles,
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.tiles.iter().enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            for tile in row {
                write!(f, "{}", tile.glyph())?;
            }
        }
        Ok(())
    }
}
