//! The outer-city defense map: a square cell grid with one spawn, one
//! goal, a road corridor between them, and scenery cells that block tower
//! placement.

use bevy::math::Vec2;
use bevy::prelude::*;

use crate::config::CELL_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefCell {
    /// Buildable ground.
    Open,
    Path,
    Spawn,
    Goal,
    /// Decorative blocks: neither passable nor buildable.
    Scenery,
}

impl DefCell {
    fn from_digit(d: u8) -> DefCell {
        match d {
            1 => DefCell::Path,
            2 => DefCell::Spawn,
            3 => DefCell::Goal,
            4 => DefCell::Scenery,
            _ => DefCell::Open,
        }
    }
}

/// Row-major layout digits for the standard map: an S-shaped corridor from
/// the north-west spawn to the south-east goal, with scenery sprinkled
/// alongside the road.
const STANDARD_LAYOUT: [[u8; 16]; 16] = [
    [2, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 4, 0, 1, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 4, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 4, 0, 0, 0, 0, 4, 0, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 0, 0],
    [0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 1, 0, 0],
    [0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1],
    [0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [0, 4, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3],
];

/// Coordinates are `(x, y)` with `x` the column and `y` the row, matching
/// the city grid convention; [`DefenseMap::cell_to_world`] is the single
/// grid↔world mapping (cell `(13, 7)` centers at world `(13.5, 7.5)`).
#[derive(Resource, Debug, Clone)]
pub struct DefenseMap {
    pub size: usize,
    cells: Vec<DefCell>,
    pub spawn: Option<(usize, usize)>,
    pub goal: Option<(usize, usize)>,
    /// False when the map has no spawn/goal pair or no route between them;
    /// wave starts are rejected while false.
    pub route_ok: bool,
}

impl Default for DefenseMap {
    fn default() -> Self {
        Self::standard()
    }
}

impl DefenseMap {
    pub fn standard() -> Self {
        let rows: Vec<&[u8]> = STANDARD_LAYOUT.iter().map(|r| r.as_slice()).collect();
        Self::from_rows(&rows)
    }

    /// Build from row-major digit rows; all rows must match the row count.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        let mut spawn = None;
        let mut goal = None;
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size, "defense map must be square");
            for (x, &digit) in row.iter().enumerate() {
                let cell = DefCell::from_digit(digit);
                match cell {
                    DefCell::Spawn => spawn = Some((x, y)),
                    DefCell::Goal => goal = Some((x, y)),
                    _ => {}
                }
                cells.push(cell);
            }
        }
        let mut map = Self {
            size,
            cells,
            spawn,
            goal,
            route_ok: false,
        };
        map.route_ok = match (map.spawn, map.goal) {
            (Some(_), Some(_)) => super::path::find_path(&map).is_some(),
            _ => false,
        };
        if !map.route_ok {
            warn!("defense map has no spawn-to-goal route; waves disabled");
        }
        map
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> DefCell {
        self.cells[y * self.size + x]
    }

    /// Enemies may traverse the corridor plus its two endpoints.
    pub fn passable(&self, x: usize, y: usize) -> bool {
        matches!(
            self.cell(x, y),
            DefCell::Path | DefCell::Spawn | DefCell::Goal
        )
    }

    /// Towers only fit on open ground.
    pub fn buildable(&self, x: usize, y: usize) -> bool {
        self.cell(x, y) == DefCell::Open
    }

    pub fn passable_count(&self) -> usize {
        (0..self.size * self.size)
            .filter(|i| {
                matches!(
                    self.cells[*i],
                    DefCell::Path | DefCell::Spawn | DefCell::Goal
                )
            })
            .count()
    }

    pub fn cell_to_world(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            x as f32 * CELL_SIZE + CELL_SIZE * 0.5,
            y as f32 * CELL_SIZE + CELL_SIZE * 0.5,
        )
    }
}
