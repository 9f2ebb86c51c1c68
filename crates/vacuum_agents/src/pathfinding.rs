//! Breadth-first path search over a [`GridMap`].
//!
//! The search expands 4-connected neighbours in [`Direction::ALL`] order and
//! returns the first target reached at minimum hop count. When several
//! targets are equally close the winner is whichever BFS dequeues first, which
//! is stable for a given grid but says nothing about target priority.

use crate::grid::GridMap;
use crate::types::{Cell, Direction};
use std::collections::{HashMap, HashSet, VecDeque};

/// The outcome of a path search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResult {
    /// The start cell is itself a target; zero moves are needed.
    AlreadyThere,
    /// A shortest route. The start cell is excluded, the target included.
    Found(Vec<Cell>),
    /// No target can be reached, or there were no targets.
    Unreachable,
}

impl PathResult {
    /// Returns `true` unless the result is [`PathResult::Unreachable`].
    pub fn is_reachable(&self) -> bool {
        !matches!(self, PathResult::Unreachable)
    }

    /// Number of moves needed, if reachable.
    pub fn hops(&self) -> Option<usize> {
        match self {
            PathResult::AlreadyThere => Some(0),
            PathResult::Found(path) => Some(path.len()),
            PathResult::Unreachable => None,
        }
    }

    /// The cells to walk, empty when already there or unreachable.
    pub fn into_steps(self) -> Vec<Cell> {
        match self {
            PathResult::Found(path) => path,
            PathResult::AlreadyThere | PathResult::Unreachable => Vec::new(),
        }
    }
}

/// Finds a shortest walkable route from `start` to the nearest of `targets`.
///
/// Obstacle tiles are never entered. The start cell itself is not checked,
/// so an agent standing on an obstacle can still walk off it.
pub fn find_path(grid: &GridMap, start: Cell, targets: &[Cell]) -> PathResult {
    if targets.is_empty() {
        return PathResult::Unreachable;
    }

    let targets: HashSet<Cell> = targets.iter().copied().collect();
    if targets.contains(&start) {
        return PathResult::AlreadyThere;
    }

    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut visited: HashSet<Cell> = HashSet::new();
    let mut frontier: VecDeque<Cell> = VecDeque::new();

    visited.insert(start);
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        if targets.contains(&current) {
            return PathResult::Found(reconstruct(&came_from, start, current));
        }

        for direction in Direction::ALL {
            let Some(next) = current.step(direction) else {
                continue;
            };
            if !grid.is_walkable(next) || !visited.insert(next) {
                continue;
            }
            came_from.insert(next, current);
            frontier.push_back(next);
        }
    }

    PathResult::Unreachable
}

/// Walks the predecessor map back from `goal` to `start`.
fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Tile;

    fn is_contiguous(start: Cell, path: &[Cell]) -> bool {
        let mut prev = start;
        for cell in path {
            if prev.manhattan(*cell) != 1 {
                return false;
            }
            prev = *cell;
        }
        true
    }

    #[test]
    fn test_already_there() {
        let grid = GridMap::new(5, 5);
        let result = find_path(&grid, Cell::new(2, 2), &[Cell::new(2, 2)]);
        assert_eq!(result, PathResult::AlreadyThere);
        assert_eq!(result.hops(), Some(0));
        assert!(result.into_steps().is_empty());
    }

    #[test]
    fn test_open_grid_manhattan_length() {
        let grid = GridMap::new(5, 5);
        let start = Cell::new(0, 0);
        let result = find_path(&grid, start, &[Cell::new(4, 4)]);
        let PathResult::Found(path) = result else {
            panic!("expected a path");
        };
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&Cell::new(4, 4)));
        assert!(is_contiguous(start, &path));
    }

    #[test]
    fn test_no_targets_is_unreachable() {
        let grid = GridMap::new(5, 5);
        assert_eq!(
            find_path(&grid, Cell::new(0, 0), &[]),
            PathResult::Unreachable
        );
    }

    #[test]
    fn test_walled_off_target_is_unreachable() {
        let grid = GridMap::parse(
            "
            .....
            .###.
            .#.#.
            .###.
            .....
            ",
        )
        .unwrap();
        let result = find_path(&grid, Cell::new(0, 0), &[Cell::new(2, 2)]);
        assert_eq!(result, PathResult::Unreachable);
        assert!(!result.is_reachable());
        assert_eq!(result.hops(), None);
    }

    #[test]
    fn test_routes_around_furniture() {
        let grid = GridMap::parse(
            "
            .....
            .sct.
            .....
            ",
        )
        .unwrap();
        let start = Cell::new(0, 2);
        let PathResult::Found(path) = find_path(&grid, start, &[Cell::new(2, 2)]) else {
            panic!("expected a path");
        };
        // Straight down is blocked by the chair; go round one side.
        assert_eq!(path.len(), 6);
        assert!(is_contiguous(start, &path));
        assert!(path.iter().all(|c| !grid.tile(*c).is_obstacle()));
    }

    #[test]
    fn test_nearest_target_wins() {
        let grid = GridMap::new(1, 10);
        let result = find_path(
            &grid,
            Cell::new(0, 5),
            &[Cell::new(0, 0), Cell::new(0, 7), Cell::new(0, 9)],
        );
        assert_eq!(result, PathResult::Found(vec![Cell::new(0, 6), Cell::new(0, 7)]));
    }

    #[test]
    fn test_tie_break_follows_expansion_order() {
        let grid = GridMap::new(3, 3);
        // Up is expanded before Down, so the northern target wins.
        let result = find_path(&grid, Cell::new(1, 1), &[Cell::new(2, 1), Cell::new(0, 1)]);
        assert_eq!(result, PathResult::Found(vec![Cell::new(0, 1)]));

        // Same for tied routes to one target: the path that goes up first.
        let result = find_path(&grid, Cell::new(1, 0), &[Cell::new(0, 1)]);
        assert_eq!(
            result,
            PathResult::Found(vec![Cell::new(0, 0), Cell::new(0, 1)])
        );
    }

    #[test]
    fn test_obstacle_targets_are_never_reached() {
        let mut grid = GridMap::new(3, 3);
        grid.set_tile(Cell::new(2, 2), Tile::Bed);
        let result = find_path(&grid, Cell::new(0, 0), &[Cell::new(2, 2)]);
        assert_eq!(result, PathResult::Unreachable);
    }
}
