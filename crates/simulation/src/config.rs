/// Default city map edge length in tiles.
pub const DEFAULT_GRID_SIZE: usize = 16;

/// World-space edge length of one grid cell.
pub const CELL_SIZE: f32 = 1.0;

/// Credits a new game starts with.
pub const STARTING_CREDITS: i64 = 3000;

/// Simulated seconds between day settlements (income + stability update).
pub const DAY_INTERVAL_SECS: f32 = 5.0;

/// Fixed simulation timestep in seconds (10 Hz).
pub const SIM_TICK_SECS: f32 = 0.1;

/// Starting base health for a tower-defense run.
pub const BASE_HEALTH: i32 = 10;
