use bevy::math::Vec2;
use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingType, StatBlock};
use crate::config::{CELL_SIZE, DEFAULT_GRID_SIZE};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode, Default,
)]
pub enum Terrain {
    #[default]
    Grass,
    /// Terrain under a placed building.
    Ground,
}

/// One city map cell. At most one building per tile; `stats` holds the
/// snapshot of the building's level-table entry (tech effects mutate the
/// snapshot, never the table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub building: Option<BuildingType>,
    pub level: u8,
    /// Facing in quarter turns (0..=3).
    pub direction: u8,
    pub stats: Option<StatBlock>,
    /// Multiplicative accumulator fed by efficiency techs.
    pub output_factor: f32,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            terrain: Terrain::Grass,
            building: None,
            level: 0,
            direction: 0,
            stats: None,
            output_factor: 1.0,
        }
    }
}

impl Tile {
    /// Clear back to empty grass.
    pub fn clear(&mut self) {
        *self = Tile::default();
    }

    pub fn is_occupied(&self) -> bool {
        self.building.is_some()
    }

    /// True when the building has no further level to upgrade into.
    pub fn at_max_level(&self) -> bool {
        self.stats.is_some_and(|s| s.next_level.is_none())
    }
}

/// The city's square tile grid.
///
/// Coordinates are `(x, y)` with `x` the column and `y` the row, both
/// zero-based; storage is row-major (`index = y * size + x`). There is
/// exactly one grid↔world mapping, [`CityGrid::grid_to_world`]:
/// tile `(x, y)` occupies the world square whose center is
/// `(x + 0.5, y + 0.5) * CELL_SIZE` on the ground plane — e.g. tile
/// `(3, 1)` maps to world `(3.5, 1.5)` at the default cell size of 1.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct CityGrid {
    pub size: usize,
    pub tiles: Vec<Tile>,
}

impl Default for CityGrid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl CityGrid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            tiles: vec![Tile::default(); size * size],
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &Tile {
        &self.tiles[self.index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Tile {
        let idx = self.index(x, y);
        &mut self.tiles[idx]
    }

    pub fn grid_to_world(x: usize, y: usize) -> Vec2 {
        Vec2::new(
            x as f32 * CELL_SIZE + CELL_SIZE * 0.5,
            y as f32 * CELL_SIZE + CELL_SIZE * 0.5,
        )
    }

    pub fn world_to_grid(pos: Vec2) -> (i32, i32) {
        (
            (pos.x / CELL_SIZE).floor() as i32,
            (pos.y / CELL_SIZE).floor() as i32,
        )
    }

    /// Up to 4 cardinal neighbors; iterate `&result[..count]`.
    pub fn neighbors4(&self, x: usize, y: usize) -> ([(usize, usize); 4], usize) {
        let mut result = [(0, 0); 4];
        let mut count = 0;
        if x > 0 {
            result[count] = (x - 1, y);
            count += 1;
        }
        if x + 1 < self.size {
            result[count] = (x + 1, y);
            count += 1;
        }
        if y > 0 {
            result[count] = (x, y - 1);
            count += 1;
        }
        if y + 1 < self.size {
            result[count] = (x, y + 1);
            count += 1;
        }
        (result, count)
    }

    /// Iterate `(x, y, tile)` over every tile holding a building.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &Tile)> {
        self.tiles.iter().enumerate().filter_map(move |(i, tile)| {
            tile.building
                .map(|_| (i % self.size, i / self.size, tile))
        })
    }

    /// True when any 4-adjacent tile carries a road.
    pub fn has_road_neighbor(&self, x: usize, y: usize) -> bool {
        let (neighbors, count) = self.neighbors4(x, y);
        neighbors[..count]
            .iter()
            .any(|&(nx, ny)| self.get(nx, ny).building == Some(BuildingType::Road))
    }

    /// Grow the map to `new_size`, keeping every in-bounds tile (territory
    /// expansion). Shrinking is not supported; callers use [`CityGrid::reset`]
    /// for that.
    pub fn expand(&mut self, new_size: usize) {
        if new_size <= self.size {
            return;
        }
        let mut next = CityGrid::new(new_size);
        for y in 0..self.size {
            for x in 0..self.size {
                *next.get_mut(x, y) = self.get(x, y).clone();
            }
        }
        *self = next;
    }

    /// Discard everything and start over at `new_size` (level switch).
    pub fn reset(&mut self, new_size: usize) {
        *self = CityGrid::new(new_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_roundtrip() {
        for &(x, y) in &[(0usize, 0usize), (3, 1), (15, 15)] {
            let world = CityGrid::grid_to_world(x, y);
            let (rx, ry) = CityGrid::world_to_grid(world);
            assert_eq!((rx as usize, ry as usize), (x, y));
        }
        assert_eq!(CityGrid::grid_to_world(3, 1), Vec2::new(3.5, 1.5));
    }

    #[test]
    fn neighbor_counts_at_corners_and_center() {
        let grid = CityGrid::new(16);
        assert_eq!(grid.neighbors4(0, 0).1, 2);
        assert_eq!(grid.neighbors4(8, 8).1, 4);
        assert_eq!(grid.neighbors4(15, 15).1, 2);
    }

    #[test]
    fn expand_preserves_tiles() {
        let mut grid = CityGrid::new(4);
        grid.get_mut(2, 3).building = Some(BuildingType::Park);
        grid.get_mut(2, 3).level = 1;
        grid.expand(8);
        assert_eq!(grid.size, 8);
        assert_eq!(grid.get(2, 3).building, Some(BuildingType::Park));
        assert!(grid.get(6, 6).building.is_none());
    }

    #[test]
    fn reset_discards_tiles() {
        let mut grid = CityGrid::new(4);
        grid.get_mut(1, 1).building = Some(BuildingType::Road);
        grid.reset(6);
        assert_eq!(grid.size, 6);
        assert!(grid.tiles.iter().all(|t| t.building.is_none()));
    }

    #[test]
    fn road_neighbor_detection() {
        let mut grid = CityGrid::new(8);
        grid.get_mut(4, 4).building = Some(BuildingType::Road);
        assert!(grid.has_road_neighbor(3, 4));
        assert!(grid.has_road_neighbor(4, 5));
        assert!(!grid.has_road_neighbor(6, 6));
        // Diagonal does not count as road access.
        assert!(!grid.has_road_neighbor(3, 3));
    }
}
