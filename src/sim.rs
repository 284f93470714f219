use std::collections::HashSet;

use rand::Rng;

use crate::game::GameState;
use crate::grid::{Dir, Grid, Pos, Tile};

pub const POINT_REWARD: u32 = 10;
pub const POWER_UP_REWARD: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pickup {
    Point,
    PowerUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerMove {
    /// Wall, grid edge, or no player on the grid.
    Blocked,
    /// Walked into an enemy; the grid is untouched.
    HitEnemy,
    Moved {
        from: Pos,
        to: Pos,
        pickup: Option<Pickup>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnemyMoves {
    pub moved: usize,
    pub player_hits: usize,
}

/// Moves the player one tile in `dir`, collecting whatever is there.
pub fn move_player(grid: &mut Grid, state: &mut GameState, dir: Dir) -> PlayerMove {
    let Some(from) = grid.find_player() else {
        return PlayerMove::Blocked;
    };
    let Some(to) = grid.step(from, dir) else {
        return PlayerMove::Blocked;
    };

    let pickup = match grid.get(to) {
        None | Some(Tile::Wall) => return PlayerMove::Blocked,
        Some(Tile::Enemy) => return PlayerMove::HitEnemy,
        Some(Tile::Point) => {
            state.score += POINT_REWARD;
            Some(Pickup::Point)
        }
        Some(Tile::PowerUp) => {
            state.score += POWER_UP_REWARD;
            Some(Pickup::PowerUp)
        }
        Some(Tile::Empty) | Some(Tile::Player) => None,
    };

    grid.set(from, Tile::Empty);
    grid.set(to, Tile::Player);
    PlayerMove::Moved { from, to, pickup }
}

/// Moves every enemy one random step. Targets are resolved against the
/// positions enemies held before the tick: a cell vacated this tick stays
/// closed to the others until the next one.
pub fn move_enemies(grid: &mut Grid, rng: &mut impl Rng) -> EnemyMoves {
    let snapshot = grid.find_all(Tile::Enemy);
    let held: HashSet<Pos> = snapshot.iter().copied().collect();
    let mut moves = EnemyMoves::default();

    for from in snapshot {
        let dir = Dir::ALL[rng.gen_range(0..Dir::ALL.len())];
        let Some(to) = grid.step(from, dir) else {
            continue;
        };
        match grid.get(to) {
            Some(Tile::Player) => moves.player_hits += 1,
            None | Some(Tile::Wall) | Some(Tile::Enemy) => {}
            Some(_) if held.contains(&to) => {}
            Some(_) => {
                grid.set(from, Tile::Empty);
                grid.set(to, Tile::Enemy);
                moves.moved += 1;
            }
        }
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    fn state() -> GameState {
        GameState::new(&Timings::default())
    }

    #[test]
    fn wall_blocks_player() {
        let mut g = grid(
            r#"
####
#@.#
####
"#,
        );
        let before = g.clone();
        let mut s = state();
        assert_eq!(move_player(&mut g, &mut s, Dir::Up), PlayerMove::Blocked);
        assert_eq!(move_player(&mut g, &mut s, Dir::Left), PlayerMove::Blocked);
        assert_eq!(g, before);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn grid_edge_blocks_player() {
        let mut g = grid(".@.");
        let before = g.clone();
        let mut s = state();
        assert_eq!(move_player(&mut g, &mut s, Dir::Down), PlayerMove::Blocked);
        assert_eq!(move_player(&mut g, &mut s, Dir::Up), PlayerMove::Blocked);
        assert_eq!(g, before);
    }

    #[test]
    fn point_scores_and_moves() {
        let mut g = grid("#@.#");
        let mut s = state();
        let outcome = move_player(&mut g, &mut s, Dir::Right);
        assert_eq!(
            outcome,
            PlayerMove::Moved {
                from: Pos::new(1, 0),
                to: Pos::new(2, 0),
                pickup: Some(Pickup::Point)
            }
        );
        assert_eq!(s.score, POINT_REWARD);
        assert_eq!(g.to_string(), "# @#");
    }

    #[test]
    fn empty_floor_moves_without_score() {
        let mut g = grid("#. @#");
        let mut s = state();
        assert!(matches!(
            move_player(&mut g, &mut s, Dir::Left),
            PlayerMove::Moved { pickup: None, .. }
        ));
        assert_eq!(s.score, 0);
        assert_eq!(g.to_string(), "#.@ #");
    }

    #[test]
    fn power_up_scores_more() {
        let mut g = grid("#*@#");
        let mut s = state();
        assert!(matches!(
            move_player(&mut g, &mut s, Dir::Left),
            PlayerMove::Moved {
                pickup: Some(Pickup::PowerUp),
                ..
            }
        ));
        assert_eq!(s.score, POWER_UP_REWARD);
        assert_eq!(g.to_string(), "#@ #");
    }

    #[test]
    fn enemy_contact_leaves_grid_alone() {
        let mut g = grid("#@E#");
        let before = g.clone();
        let mut s = state();
        assert_eq!(move_player(&mut g, &mut s, Dir::Right), PlayerMove::HitEnemy);
        assert_eq!(g, before);
    }

    #[test]
    fn missing_player_is_a_no_op() {
        let mut g = grid("#..#");
        let mut s = state();
        assert_eq!(move_player(&mut g, &mut s, Dir::Right), PlayerMove::Blocked);
    }

    #[test]
    fn boxed_enemy_never_moves() {
        let mut g = grid(
            r#"
###
#E#
###
"#,
        );
        let before = g.clone();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(move_enemies(&mut g, &mut rng), EnemyMoves::default());
        }
        assert_eq!(g, before);
    }

    #[test]
    fn enemy_at_grid_edge_wastes_its_turn() {
        let mut g = grid("E");
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_eq!(move_enemies(&mut g, &mut rng).moved, 0);
        }
        assert_eq!(g.to_string(), "E");
    }

    #[test]
    fn enemy_next_to_player_hits_instead_of_moving() {
        let mut g = grid(
            r#"
###
#E#
#@#
###
"#,
        );
        let mut rng = StdRng::seed_from_u64(1);
        let mut hits = 0;
        for _ in 0..40 {
            let moves = move_enemies(&mut g, &mut rng);
            assert_eq!(moves.moved, 0);
            hits += moves.player_hits;
        }
        assert!(hits > 0);
        assert_eq!(g.find_all(Tile::Enemy), vec![Pos::new(1, 1)]);
        assert_eq!(g.find_player(), Some(Pos::new(1, 2)));
    }

    #[test]
    fn enemies_eat_what_they_walk_over() {
        let mut g = grid(
            r#"
#####
#.E.#
#####
"#,
        );
        let mut rng = StdRng::seed_from_u64(2);
        while move_enemies(&mut g, &mut rng).moved == 0 {}
        assert_eq!(g.count(Tile::Enemy), 1);
        assert_eq!(g.count(Tile::Point), 1);
        assert_eq!(g.get(Pos::new(2, 1)), Some(Tile::Empty));
    }

    #[test]
    fn facing_enemies_cannot_swap() {
        let mut g = grid("#EE#");
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert_eq!(move_enemies(&mut g, &mut rng).moved, 0);
        }
        assert_eq!(g.to_string(), "#EE#");
    }

    #[test]
    fn vacated_cell_stays_closed_within_a_tick() {
        // The left enemy moves first; the right one may not follow into the
        // cell it just left.
        let mut rng = StdRng::seed_from_u64(0);
        let mut seen_move = false;
        for _ in 0..300 {
            let mut g = grid(
                r#"
######
# EE##
######
"#,
            );
            let moves = move_enemies(&mut g, &mut rng);
            assert!(moves.moved <= 1);
            if moves.moved == 1 {
                seen_move = true;
                assert_eq!(g.to_string().lines().nth(1), Some("#E E##"));
            }
        }
        assert!(seen_move);
    }
}
