//! District (level) ladder: each level grants a bigger map, gated on city
//! metrics and completed quests.

use bevy::prelude::*;

use crate::economy::PlayerCredits;
use crate::metrics::CityMetrics;
use crate::quests::QuestLog;
use crate::stability::Stability;
use crate::SlowTickTimer;

#[derive(Debug, Clone, Copy)]
pub struct LevelDef {
    pub level: u32,
    pub name: &'static str,
    pub map_size: usize,
    pub min_population: f32,
    pub min_daily_income: i64,
    pub min_stability: f32,
    pub min_building_count: u32,
    pub required_quests: &'static [&'static str],
    pub reward_credits: i64,
}

pub const LEVELS: &[LevelDef] = &[
    LevelDef {
        level: 1,
        name: "Starter Village",
        map_size: 16,
        min_population: 0.0,
        min_daily_income: 0,
        min_stability: 0.0,
        min_building_count: 0,
        required_quests: &[],
        reward_credits: 0,
    },
    LevelDef {
        level: 2,
        name: "Prosperous Town",
        map_size: 24,
        min_population: 50.0,
        min_daily_income: 100,
        min_stability: 60.0,
        min_building_count: 10,
        required_quests: &["first_homes", "road_network"],
        reward_credits: 2_000,
    },
    LevelDef {
        level: 3,
        name: "Midsize City",
        map_size: 32,
        min_population: 200.0,
        min_daily_income: 500,
        min_stability: 70.0,
        min_building_count: 25,
        required_quests: &["growing_town", "civic_duty"],
        reward_credits: 5_000,
    },
    LevelDef {
        level: 4,
        name: "Regional Hub",
        map_size: 40,
        min_population: 500.0,
        min_daily_income: 1_200,
        min_stability: 75.0,
        min_building_count: 45,
        required_quests: &["steady_hand", "green_city"],
        reward_credits: 10_000,
    },
    LevelDef {
        level: 5,
        name: "Metropolis",
        map_size: 48,
        min_population: 1_000.0,
        min_daily_income: 2_500,
        min_stability: 80.0,
        min_building_count: 70,
        required_quests: &["industrial_boom"],
        reward_credits: 20_000,
    },
];

pub fn level_def(level: u32) -> Option<&'static LevelDef> {
    LEVELS.iter().find(|l| l.level == level)
}

#[derive(Resource, Debug, Clone)]
pub struct LevelState {
    pub current: u32,
    pub unlocked: Vec<u32>,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            current: 1,
            unlocked: vec![1],
        }
    }
}

impl LevelState {
    pub fn is_unlocked(&self, level: u32) -> bool {
        self.unlocked.contains(&level)
    }

    pub fn unlock(&mut self, level: u32) {
        if !self.is_unlocked(level) {
            self.unlocked.push(level);
            self.unlocked.sort_unstable();
        }
    }

    pub fn highest_unlocked(&self) -> u32 {
        self.unlocked.last().copied().unwrap_or(1)
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct LevelUnlocked {
    pub level: u32,
}

fn requirements_met(
    def: &LevelDef,
    metrics: &CityMetrics,
    stability: &Stability,
    quests: &QuestLog,
) -> bool {
    metrics.population >= def.min_population
        && metrics.daily_income >= def.min_daily_income
        && stability.value >= def.min_stability
        && metrics.building_count >= def.min_building_count
        && def.required_quests.iter().all(|q| quests.is_completed(q))
}

/// Unlock the next level as soon as its requirements hold.
pub fn check_level_unlocks(
    slow_tick: Res<SlowTickTimer>,
    mut state: ResMut<LevelState>,
    metrics: Res<CityMetrics>,
    stability: Res<Stability>,
    quests: Res<QuestLog>,
    mut credits: ResMut<PlayerCredits>,
    mut unlocked: EventWriter<LevelUnlocked>,
) {
    if !slow_tick.should_run() {
        return;
    }
    let next = state.highest_unlocked() + 1;
    let Some(def) = level_def(next) else {
        return;
    };
    if requirements_met(def, &metrics, &stability, &quests) {
        state.unlock(next);
        credits.deposit(def.reward_credits);
        unlocked.send(LevelUnlocked { level: next });
        info!("level unlocked: {} ({})", def.level, def.name);
    }
}

pub struct LevelsPlugin;

impl Plugin for LevelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelState>()
            .add_event::<LevelUnlocked>()
            .add_systems(
                FixedUpdate,
                check_level_unlocks.in_set(crate::SimulationSet::PostSim),
            );
    }
}
