use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::error::GenerationError;
use crate::grid::{Grid, Pos, Tile};
use crate::reach::reachable_points;

pub const WALL_DENSITY: f64 = 0.15;
pub const MIN_POINTS: usize = 10;
pub const MAX_ATTEMPTS: usize = 64;

/// Builds a walled `rows x cols` maze with one player tile and at least
/// [`MIN_POINTS`] points, every one of them reachable from the player.
///
/// `difficulty` is recorded but does not change the wall density.
pub fn generate(
    rng: &mut impl Rng,
    rows: usize,
    cols: usize,
    difficulty: u32,
) -> Result<Grid, GenerationError> {
    generate_with(rng, rows, cols, difficulty, WALL_DENSITY, MAX_ATTEMPTS)
}

fn generate_with(
    rng: &mut impl Rng,
    rows: usize,
    cols: usize,
    difficulty: u32,
    density: f64,
    attempts: usize,
) -> Result<Grid, GenerationError> {
    if rows < 3 || cols < 3 || (rows - 2) * (cols - 2) < MIN_POINTS + 1 {
        return Err(GenerationError::TooSmall { rows, cols });
    }

    for attempt in 1..=attempts {
        match try_generate(rng, rows, cols, density) {
            Some(grid) => {
                debug!(
                    rows,
                    cols,
                    difficulty,
                    attempt,
                    points = grid.count(Tile::Point),
                    "maze generated"
                );
                return Ok(grid);
            }
            None => trace!(attempt, "maze rejected, rolling again"),
        }
    }

    warn!(rows, cols, attempts, "maze generation gave up");
    Err(GenerationError::Exhausted { attempts })
}

fn try_generate(rng: &mut impl Rng, rows: usize, cols: usize, density: f64) -> Option<Grid> {
    let mut grid = Grid::filled(rows, cols, Tile::Wall);
    for y in 1..rows - 1 {
        for x in 1..cols - 1 {
            let tile = if rng.gen::<f64>() < density {
                Tile::Wall
            } else {
                Tile::Point
            };
            grid.set(Pos::new(x, y), tile);
        }
    }

    let open: Vec<Pos> = grid
        .interior()
        .filter(|p| grid.get(*p) != Some(Tile::Wall))
        .collect();
    let player = *open.choose(rng)?;
    grid.set(player, Tile::Player);

    top_up_points(&mut grid, rng);

    let reachable = reachable_points(&grid, player);
    for pos in grid.find_all(Tile::Point) {
        if !reachable.contains(&pos) {
            grid.set(pos, Tile::Empty);
        }
    }

    (reachable.len() >= MIN_POINTS).then_some(grid)
}

/// Opens random interior walls into points until the minimum is met. Bounded
/// by the number of interior walls.
fn top_up_points(grid: &mut Grid, rng: &mut impl Rng) {
    let points = grid.count(Tile::Point);
    if points >= MIN_POINTS {
        return;
    }
    let mut walls: Vec<Pos> = grid
        .interior()
        .filter(|p| grid.get(*p) == Some(Tile::Wall))
        .collect();
    walls.shuffle(rng);
    for pos in walls.into_iter().take(MIN_POINTS - points) {
        grid.set(pos, Tile::Point);
    }
}
