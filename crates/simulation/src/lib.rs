//! Headless city/tower-defense simulation.
//!
//! Everything runs inside a Bevy `FixedUpdate` schedule at 10 Hz: player
//! intent arrives through the command queue, feature plugins mutate their
//! own resources, and typed events carry outcomes to whatever adapter
//! (UI, renderer, persistence) sits on top. No rendering, no windowing,
//! no wall-clock dependence.

use bevy::prelude::*;

pub mod achievements;
pub mod buildings;
pub mod clock;
pub mod commands;
pub mod config;
pub mod defense;
pub mod economy;
pub mod grid;
pub mod interactions;
pub mod levels;
pub mod merit;
pub mod metrics;
pub mod quests;
pub mod sim_rng;
pub mod snapshot;
pub mod stability;
pub mod system_status;
pub mod tech;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod test_harness;

/// Ordered phases for `FixedUpdate` systems, configured as a chain:
/// `PreSim` → `Simulation` → `PostSim`.
///
/// * **PreSim** — clocks tick, command queues drain.
/// * **Simulation** — settlement, movement, combat, wave scheduling.
/// * **PostSim** — metrics aggregation and progression checks; read-only
///   with respect to the grid.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    PreSim,
    Simulation,
    PostSim,
}

/// Global tick counter, also the timestamp for queued commands.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Shared throttle for aggregation systems that don't need to run every
/// tick (metrics refresh, progression checks): every 10 ticks, one second
/// of simulated time.
#[derive(Resource, Default)]
pub struct SlowTickTimer {
    counter: u32,
}

impl SlowTickTimer {
    pub const INTERVAL: u32 = 10;

    pub fn tick(&mut self) {
        self.counter += 1;
    }

    pub fn should_run(&self) -> bool {
        self.counter.is_multiple_of(Self::INTERVAL)
    }
}

pub fn tick_counters(mut timer: ResMut<SlowTickTimer>, mut ticks: ResMut<TickCounter>) {
    timer.tick();
    ticks.0 = ticks.0.wrapping_add(1);
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::PreSim,
                SimulationSet::Simulation,
                SimulationSet::PostSim,
            )
                .chain(),
        );

        app.init_resource::<TickCounter>()
            .init_resource::<SlowTickTimer>()
            .init_resource::<grid::CityGrid>()
            .init_resource::<sim_rng::SimRng>()
            .add_systems(
                FixedUpdate,
                tick_counters.in_set(SimulationSet::PreSim),
            );

        app.add_plugins((
            clock::ClockPlugin,
            commands::CommandsPlugin,
            economy::EconomyPlugin,
            metrics::MetricsPlugin,
            tech::TechPlugin,
            merit::MeritPlugin,
            quests::QuestsPlugin,
            achievements::AchievementsPlugin,
            levels::LevelsPlugin,
            defense::DefensePlugin,
        ));
    }
}
