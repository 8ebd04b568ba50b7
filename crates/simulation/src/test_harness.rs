//! `TestGame` — a headless `App` + `SimulationPlugin` wrapper for
//! integration tests: build state through the real command queue, advance
//! virtual time tick by tick, and assert on resources.

use bevy::prelude::*;

use crate::clock::GameClock;
use crate::commands::{CommandLog, CommandQueue, CommandResult, GameCommand};
use crate::config::SIM_TICK_SECS;
use crate::defense::enemy::Enemy;
use crate::defense::waves::{BaseDamaged, WaveCompleted, WaveState};
use crate::economy::PlayerCredits;
use crate::grid::CityGrid;
use crate::levels::LevelUnlocked;
use crate::metrics::CityMetrics;
use crate::quests::QuestCompleted;
use crate::stability::Stability;
use crate::{SimulationPlugin, SimulationSet, TickCounter};

/// Tallies of one-shot domain events, since `Events<T>` buffers only
/// survive two updates.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct EventCounters {
    pub waves_completed: u32,
    pub quests_completed: u32,
    pub base_damage_events: u32,
    pub levels_unlocked: u32,
}

fn count_events(
    mut counters: ResMut<EventCounters>,
    mut waves: EventReader<WaveCompleted>,
    mut quests: EventReader<QuestCompleted>,
    mut base: EventReader<BaseDamaged>,
    mut levels: EventReader<LevelUnlocked>,
) {
    counters.waves_completed += waves.read().count() as u32;
    counters.quests_completed += quests.read().count() as u32;
    counters.base_damage_events += base.read().count() as u32;
    counters.levels_unlocked += levels.read().count() as u32;
}

pub struct TestGame {
    pub app: App,
}

impl TestGame {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);
        app.init_resource::<EventCounters>();
        app.add_systems(FixedUpdate, count_events.in_set(SimulationSet::PostSim));
        // One update so Startup runs; no fixed ticks elapse yet.
        app.update();
        Self { app }
    }

    /// Advance `n` fixed ticks (100 ms of simulated time each at 1x).
    pub fn tick(&mut self, n: u32) {
        let dt = std::time::Duration::from_millis(100);
        for _ in 0..n {
            self.app
                .world_mut()
                .resource_mut::<Time<Virtual>>()
                .advance_by(dt);
            self.app.update();
        }
    }

    /// Advance roughly `secs` of simulated time at 1x speed.
    pub fn tick_secs(&mut self, secs: f32) {
        self.tick((secs / SIM_TICK_SECS).round() as u32);
    }

    pub fn queue(&mut self, command: GameCommand) {
        let tick = self.app.world().resource::<TickCounter>().0;
        self.app
            .world_mut()
            .resource_mut::<CommandQueue>()
            .push(tick, command);
    }

    /// Queue a command, run one tick, and return its logged result.
    pub fn run(&mut self, command: GameCommand) -> CommandResult {
        self.queue(command);
        self.tick(1);
        self.app
            .world()
            .resource::<CommandLog>()
            .last()
            .expect("command was executed")
            .1
            .clone()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn grid(&self) -> &CityGrid {
        self.resource::<CityGrid>()
    }

    pub fn metrics(&self) -> &CityMetrics {
        self.resource::<CityMetrics>()
    }

    pub fn stability(&self) -> f32 {
        self.resource::<Stability>().value
    }

    pub fn clock(&self) -> &GameClock {
        self.resource::<GameClock>()
    }

    pub fn wave_state(&self) -> &WaveState {
        self.resource::<WaveState>()
    }

    pub fn counters(&self) -> EventCounters {
        *self.resource::<EventCounters>()
    }

    pub fn credits(&self) -> i64 {
        self.resource::<PlayerCredits>().balance
    }

    pub fn set_credits(&mut self, balance: i64) {
        self.app
            .world_mut()
            .resource_mut::<PlayerCredits>()
            .balance = balance;
    }

    pub fn enemy_count(&mut self) -> usize {
        let world = self.app.world_mut();
        let mut query = world.query::<&Enemy>();
        query.iter(world).count()
    }

    /// Flatline every live enemy; deaths resolve on the next tick.
    pub fn kill_all_enemies(&mut self) {
        let world = self.app.world_mut();
        let mut query = world.query::<&mut Enemy>();
        for mut enemy in query.iter_mut(world) {
            enemy.health = 0.0;
        }
    }
}
