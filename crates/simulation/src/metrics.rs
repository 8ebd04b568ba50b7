//! City-wide derived metrics, recomputed from the grid on a slow cadence
//! and again at every day settlement.

use bevy::prelude::*;

use crate::grid::CityGrid;
use crate::interactions::{effective_value, StatKind};
use crate::stability::Stability;
use crate::system_status::{
    self, income_multiplier, SystemStatus,
};
use crate::SlowTickTimer;

#[derive(Resource, Debug, Clone, Default)]
pub struct CityMetrics {
    pub power_capacity: f32,
    pub power_used: f32,
    pub pollution_total: f32,
    /// Housing capacity summed over residential tiles only.
    pub housing_capacity: f32,
    pub total_jobs: f32,
    /// Residents: jobs-capped, with 1.5x overcrowding tolerance on housing.
    pub population: f32,
    pub daily_income: i64,
    pub income_multiplier: f32,
    pub status: SystemStatus,
    /// Occupied tiles excluding roads.
    pub building_count: u32,
    /// Hospitals, police and fire stations (stability services).
    pub service_buildings: u32,
}

/// One full aggregation pass over the grid.
pub fn compute_metrics(grid: &CityGrid, stability: f32) -> CityMetrics {
    let mut m = CityMetrics::default();
    let mut coin_total = 0.0f32;

    for (x, y, tile) in grid.occupied() {
        let building = tile.building.expect("occupied() yields buildings");
        m.power_capacity += effective_value(grid, x, y, StatKind::PowerOutput);
        m.power_used += effective_value(grid, x, y, StatKind::PowerUsage);
        m.pollution_total += effective_value(grid, x, y, StatKind::Pollution);
        coin_total += effective_value(grid, x, y, StatKind::CoinOutput);
        if building.is_residential() {
            m.housing_capacity += effective_value(grid, x, y, StatKind::MaxPopulation);
        }
        if let Some(stats) = tile.stats {
            m.total_jobs += stats.jobs;
        }
        if building != crate::buildings::BuildingType::Road {
            m.building_count += 1;
        }
        if building.is_service() {
            m.service_buildings += 1;
        }
    }

    m.population = (m.housing_capacity * 1.5).min(m.total_jobs).max(0.0);

    m.status = SystemStatus {
        power: system_status::power_status(m.power_used, m.power_capacity),
        transport: system_status::transport_status(grid),
        security: system_status::security_status(stability),
        environment: system_status::environment_status(m.pollution_total, grid.size),
    };
    m.income_multiplier = income_multiplier(&m.status);
    m.daily_income = (coin_total * m.income_multiplier).floor() as i64;
    m
}

/// Throttled refresh so UI reads stay warm between settlements.
pub fn refresh_city_metrics(
    slow_tick: Res<SlowTickTimer>,
    grid: Res<CityGrid>,
    stability: Res<Stability>,
    mut metrics: ResMut<CityMetrics>,
) {
    if !slow_tick.should_run() {
        return;
    }
    *metrics = compute_metrics(&grid, stability.value);
}

pub struct MetricsPlugin;

impl Plugin for MetricsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CityMetrics>().add_systems(
            FixedUpdate,
            refresh_city_metrics.in_set(crate::SimulationSet::PostSim),
        );
    }
}
