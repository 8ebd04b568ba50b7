//! Route finding on the defense map.
//!
//! Two searches over the same passable cells: a canonical shortest path
//! (map validation and fallback), and a per-enemy randomized depth-first
//! walk so simultaneous attackers fan out over branching corridors.

use bevy::math::Vec2;
use pathfinding::prelude::bfs;
use rand::seq::SliceRandom;

use super::map::DefenseMap;
use crate::sim_rng::SimRng;

type Cell = (usize, usize);

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn passable_neighbors(map: &DefenseMap, (x, y): Cell) -> Vec<Cell> {
    DIRECTIONS
        .iter()
        .filter_map(|&(dx, dy)| {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 {
                return None;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            (map.in_bounds(nx, ny) && map.passable(nx, ny)).then_some((nx, ny))
        })
        .collect()
}

/// Canonical shortest path from spawn to goal, spawn and goal inclusive.
pub fn find_path(map: &DefenseMap) -> Option<Vec<Cell>> {
    let start = map.spawn?;
    let goal = map.goal?;
    bfs(&start, |&cell| passable_neighbors(map, cell), |&cell| cell == goal)
}

/// Randomized depth-first route: neighbor order is reshuffled at every
/// expansion, so on maps with parallel corridors repeated calls spread
/// enemies over different routes. The visited set is scoped to the current
/// walk and released on backtrack, which keeps every reachable route
/// reachable. Bounded by an iteration cap; `None` past the cap or when no
/// route exists.
pub fn find_random_path(map: &DefenseMap, rng: &mut SimRng) -> Option<Vec<Cell>> {
    let start = map.spawn?;
    let goal = map.goal?;
    if start == goal {
        return Some(vec![start]);
    }

    // Explicit stack instead of recursion so a pathological map cannot
    // overflow; each frame owns its shuffled, not-yet-tried directions.
    let mut stack: Vec<(Cell, Vec<Cell>)> = Vec::new();
    let mut visited = vec![false; map.size * map.size];
    let index = |(x, y): Cell| y * map.size + x;

    let shuffled = |cell: Cell, rng: &mut SimRng| {
        let mut neighbors = passable_neighbors(map, cell);
        neighbors.shuffle(&mut rng.0);
        neighbors
    };

    visited[index(start)] = true;
    stack.push((start, shuffled(start, rng)));

    let cap = map.passable_count() * 8;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        if iterations > cap {
            return None;
        }
        let candidate = match stack.last_mut() {
            None => return None,
            Some((_, candidates)) => candidates.pop(),
        };
        let Some(next) = candidate else {
            // Dead end: release the cell so other walks may pass through.
            let (cell, _) = stack.pop().expect("stack checked non-empty above");
            visited[index(cell)] = false;
            continue;
        };
        if next == goal {
            let mut path: Vec<Cell> = stack.iter().map(|(c, _)| *c).collect();
            path.push(goal);
            return Some(path);
        }
        if visited[index(next)] {
            continue;
        }
        visited[index(next)] = true;
        let frame = shuffled(next, rng);
        stack.push((next, frame));
    }
}

/// Per-enemy route: randomized walk first, canonical path as the fallback.
/// `None` only when the map itself is unroutable.
pub fn enemy_route(map: &DefenseMap, rng: &mut SimRng) -> Option<Vec<Cell>> {
    find_random_path(map, rng).or_else(|| find_path(map))
}

/// Convert a cell path into world-space waypoints at cell centers.
pub fn to_waypoints(map: &DefenseMap, path: &[Cell]) -> Vec<Vec2> {
    path.iter().map(|&(x, y)| map.cell_to_world(x, y)).collect()
}
