use std::collections::{HashSet, VecDeque};

use crate::grid::{Dir, Grid, Pos, Tile};

/// Breadth-first flood from `start` over every non-wall tile. Returns the
/// positions visited that currently hold a [`Tile::Point`]; the start cell and
/// entity tiles are walked through but never reported.
pub fn reachable_points(grid: &Grid, start: Pos) -> HashSet<Pos> {
    let mut points = HashSet::new();
    if !grid.contains(start) {
        return points;
    }

    let mut seen = vec![vec![false; grid.cols()]; grid.rows()];
    let mut q = VecDeque::new();
    seen[start.y][start.x] = true;
    q.push_back(start);

    while let Some(pos) = q.pop_front() {
        if grid.get(pos) == Some(Tile::Point) {
            points.insert(pos);
        }
        for dir in Dir::ALL {
            let Some(next) = grid.step(pos, dir) else {
                continue;
            };
            if seen[next.y][next.x] || grid.get(next) == Some(Tile::Wall) {
                continue;
            }
            seen[next.y][next.x] = true;
            q.push_back(next);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    #[test]
    fn walls_cut_off_points() {
        let g = grid(
            r#"
#######
#@.#..#
#..#..#
#######
"#,
        );
        let reach = reachable_points(&g, Pos::new(1, 1));
        assert_eq!(reach.len(), 3);
        assert!(reach.contains(&Pos::new(2, 1)));
        assert!(!reach.contains(&Pos::new(4, 1)));
        assert!(!reach.contains(&Pos::new(1, 1)));
    }

    #[test]
    fn entities_are_passable_but_not_reported() {
        let g = grid(
            r#"
######
#@E*.#
######
"#,
        );
        let reach = reachable_points(&g, Pos::new(1, 1));
        assert_eq!(reach.into_iter().collect::<Vec<_>>(), vec![Pos::new(4, 1)]);
    }

    #[test]
    fn diagonal_gaps_do_not_connect() {
        let g = grid(
            r#"
#####
#@#.#
##..#
#####
"#,
        );
        assert!(reachable_points(&g, Pos::new(1, 1)).is_empty());
    }

    #[test]
    fn repeated_runs_agree() {
        let g = grid(
            r#"
########
#@...#.#
#.##.#.#
#....#.#
########
"#,
        );
        let first = reachable_points(&g, Pos::new(1, 1));
        let second = reachable_points(&g, Pos::new(1, 1));
        assert_eq!(first, second);
        assert_eq!(first.len(), 9);
    }

    #[test]
    fn start_outside_grid_reaches_nothing() {
        let g = grid("#.#");
        assert!(reachable_points(&g, Pos::new(7, 7)).is_empty());
    }
}
