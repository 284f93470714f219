use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Grid, Pos, Tile};

/// Turns up to `count` distinct point tiles into enemies, sampled uniformly
/// without replacement. Returns where they were placed.
pub fn spawn_enemies(grid: &mut Grid, rng: &mut impl Rng, count: usize) -> Vec<Pos> {
    let mut free = grid.find_all(Tile::Point);
    let mut placed = Vec::with_capacity(count.min(free.len()));
    for _ in 0..count {
        if free.is_empty() {
            break;
        }
        let pos = free.swap_remove(rng.gen_range(0..free.len()));
        grid.set(pos, Tile::Enemy);
        placed.push(pos);
    }
    placed
}

/// Places a single power-up on a random point tile, if any remain.
pub fn spawn_power_up(grid: &mut Grid, rng: &mut impl Rng) -> Option<Pos> {
    let free = grid.find_all(Tile::Point);
    let pos = *free.choose(rng)?;
    grid.set(pos, Tile::PowerUp);
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    #[test]
    fn enemies_replace_distinct_points() {
        let mut g = grid(
            r#"
#######
#@....#
#.....#
#######
"#,
        );
        let mut rng = StdRng::seed_from_u64(5);
        let placed = spawn_enemies(&mut g, &mut rng, 4);
        assert_eq!(placed.len(), 4);
        assert_eq!(g.count(Tile::Enemy), 4);
        assert_eq!(g.count(Tile::Point), 5);
        assert_eq!(g.find_player(), Some(Pos::new(1, 1)));
    }

    #[test]
    fn enemy_count_is_capped_by_free_tiles() {
        let mut g = grid("#@..#");
        let mut rng = StdRng::seed_from_u64(5);
        let placed = spawn_enemies(&mut g, &mut rng, 10);
        assert_eq!(placed.len(), 2);
        assert_eq!(g.to_string(), "#@EE#");
    }

    #[test]
    fn power_up_needs_a_point() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut empty = grid("#@ E#");
        assert_eq!(spawn_power_up(&mut empty, &mut rng), None);

        let mut g = grid("#@ .#");
        assert_eq!(spawn_power_up(&mut g, &mut rng), Some(Pos::new(3, 0)));
        assert_eq!(g.to_string(), "#@ *#");
    }
}
