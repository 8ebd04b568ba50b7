//! City subsystem health tiers.
//!
//! Four subsystems (power, transport, security, environment) are bucketed
//! into five discrete tiers from ratio thresholds; the unweighted mean of
//! the tier multipliers scales daily income.

use std::collections::VecDeque;

use crate::buildings::BuildingType;
use crate::grid::CityGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusTier {
    Excellent,
    Good,
    Moderate,
    Limited,
    Critical,
}

impl StatusTier {
    pub fn income_multiplier(self) -> f32 {
        match self {
            StatusTier::Excellent => 1.10,
            StatusTier::Good => 1.00,
            StatusTier::Moderate => 0.90,
            StatusTier::Limited => 0.75,
            StatusTier::Critical => 0.50,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusTier::Excellent => "Excellent",
            StatusTier::Good => "Good",
            StatusTier::Moderate => "Moderate",
            StatusTier::Limited => "Limited",
            StatusTier::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    pub power: StatusTier,
    pub transport: StatusTier,
    pub security: StatusTier,
    pub environment: StatusTier,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            power: StatusTier::Critical,
            transport: StatusTier::Critical,
            security: StatusTier::Excellent,
            environment: StatusTier::Excellent,
        }
    }
}

pub fn income_multiplier(status: &SystemStatus) -> f32 {
    (status.power.income_multiplier()
        + status.transport.income_multiplier()
        + status.security.income_multiplier()
        + status.environment.income_multiplier())
        / 4.0
}

/// Power tier from usage/capacity. No capacity at all is Critical.
pub fn power_status(usage: f32, capacity: f32) -> StatusTier {
    if capacity <= 0.0 {
        return StatusTier::Critical;
    }
    let ratio = usage / capacity;
    if ratio <= 0.5 {
        StatusTier::Excellent
    } else if ratio <= 0.7 {
        StatusTier::Good
    } else if ratio <= 0.9 {
        StatusTier::Moderate
    } else if ratio <= 1.0 {
        StatusTier::Limited
    } else {
        StatusTier::Critical
    }
}

/// Security tier tracks city stability directly.
pub fn security_status(stability: f32) -> StatusTier {
    if stability >= 90.0 {
        StatusTier::Excellent
    } else if stability >= 75.0 {
        StatusTier::Good
    } else if stability >= 60.0 {
        StatusTier::Moderate
    } else if stability >= 40.0 {
        StatusTier::Limited
    } else {
        StatusTier::Critical
    }
}

/// Environment tier from total pollution against a map-size-scaled budget
/// of two pollution units per tile.
pub fn environment_status(pollution: f32, map_size: usize) -> StatusTier {
    let threshold = (map_size * map_size) as f32 * 2.0;
    let ratio = pollution / threshold;
    if ratio <= 0.2 {
        StatusTier::Excellent
    } else if ratio <= 0.4 {
        StatusTier::Good
    } else if ratio <= 0.6 {
        StatusTier::Moderate
    } else if ratio <= 0.8 {
        StatusTier::Limited
    } else {
        StatusTier::Critical
    }
}

/// Transport tier: size of the largest 4-connected road component relative
/// to all road tiles. A fragmented network rates poorly even when large.
pub fn transport_status(grid: &CityGrid) -> StatusTier {
    let roads: Vec<(usize, usize)> = grid
        .occupied()
        .filter(|(_, _, t)| t.building == Some(BuildingType::Road))
        .map(|(x, y, _)| (x, y))
        .collect();
    if roads.is_empty() {
        return StatusTier::Critical;
    }

    let mut visited = vec![false; grid.size * grid.size];
    let mut largest = 0usize;
    for &(x, y) in &roads {
        if visited[grid.index(x, y)] {
            continue;
        }
        largest = largest.max(flood_fill_roads(grid, x, y, &mut visited));
    }

    let ratio = largest as f32 / roads.len() as f32;
    if ratio >= 0.9 {
        StatusTier::Excellent
    } else if ratio >= 0.7 {
        StatusTier::Good
    } else if ratio >= 0.5 {
        StatusTier::Moderate
    } else if ratio >= 0.3 {
        StatusTier::Limited
    } else {
        StatusTier::Critical
    }
}

fn flood_fill_roads(grid: &CityGrid, x: usize, y: usize, visited: &mut [bool]) -> usize {
    let mut queue = VecDeque::from([(x, y)]);
    let mut count = 0;
    while let Some((cx, cy)) = queue.pop_front() {
        let idx = grid.index(cx, cy);
        if visited[idx] || grid.get(cx, cy).building != Some(BuildingType::Road) {
            continue;
        }
        visited[idx] = true;
        count += 1;
        let (neighbors, n) = grid.neighbors4(cx, cy);
        for &(nx, ny) in &neighbors[..n] {
            if !visited[grid.index(nx, ny)] {
                queue.push_back((nx, ny));
            }
        }
    }
    count
}
