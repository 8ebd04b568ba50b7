//! Data-driven quest system. Conditions are plain data evaluated against
//! the metrics snapshot and build counters; completing a quest is a
//! one-shot event with credit and merit rewards.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::buildings::BuildingType;
use crate::clock::DayElapsed;
use crate::commands::{BuildingPlaced, BuildingUpgraded};
use crate::economy::PlayerCredits;
use crate::merit::MeritState;
use crate::metrics::CityMetrics;
use crate::stability::Stability;
use crate::SlowTickTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Population,
    DailyIncome,
    Stability,
    BuildingCount,
}

#[derive(Debug, Clone, Copy)]
pub enum Condition {
    /// Lifetime placements of the given type reach the count.
    BuildCount(BuildingType, u32),
    /// Every listed (type, count) pair satisfied at once.
    BuildMultiple(&'static [(BuildingType, u32)]),
    /// At least one of each listed type placed.
    BuildAllTypes(&'static [BuildingType]),
    /// Upgrades performed to the given level, `count` times.
    UpgradeCount { level: u8, count: u32 },
    /// Lifetime earnings threshold.
    TotalEarned(i64),
    /// Metric at or above the target right now.
    MetricReach(Metric, f32),
    /// Metric held at or above the target for `days` consecutive
    /// settlements.
    MetricSustain { metric: Metric, target: f32, days: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct QuestDef {
    pub id: &'static str,
    pub name: &'static str,
    pub condition: Condition,
    pub reward_credits: i64,
    pub reward_merit: i64,
}

pub const QUEST_CATALOG: &[QuestDef] = &[
    QuestDef {
        id: "first_homes",
        name: "A Place to Live",
        condition: Condition::BuildCount(BuildingType::House, 3),
        reward_credits: 500,
        reward_merit: 10,
    },
    QuestDef {
        id: "road_network",
        name: "Paving the Way",
        condition: Condition::BuildCount(BuildingType::Road, 10),
        reward_credits: 300,
        reward_merit: 10,
    },
    QuestDef {
        id: "first_factory",
        name: "Smoke on the Horizon",
        condition: Condition::BuildCount(BuildingType::Factory, 1),
        reward_credits: 400,
        reward_merit: 10,
    },
    QuestDef {
        id: "civic_duty",
        name: "Civic Duty",
        condition: Condition::BuildMultiple(&[
            (BuildingType::Hospital, 1),
            (BuildingType::Police, 1),
        ]),
        reward_credits: 800,
        reward_merit: 20,
    },
    QuestDef {
        id: "first_savings",
        name: "First Savings",
        condition: Condition::TotalEarned(5_000),
        reward_credits: 600,
        reward_merit: 15,
    },
    QuestDef {
        id: "growing_town",
        name: "Growing Town",
        condition: Condition::MetricReach(Metric::Population, 50.0),
        reward_credits: 800,
        reward_merit: 20,
    },
    QuestDef {
        id: "steady_hand",
        name: "Steady Hand",
        condition: Condition::MetricSustain {
            metric: Metric::Stability,
            target: 70.0,
            days: 3,
        },
        reward_credits: 1_000,
        reward_merit: 25,
    },
    QuestDef {
        id: "upgrader",
        name: "Renovation Fever",
        condition: Condition::UpgradeCount { level: 2, count: 3 },
        reward_credits: 700,
        reward_merit: 15,
    },
    QuestDef {
        id: "green_city",
        name: "Green City",
        condition: Condition::BuildAllTypes(&[
            BuildingType::Park,
            BuildingType::GarbageStation,
            BuildingType::SunPower,
            BuildingType::WindPower,
        ]),
        reward_credits: 1_200,
        reward_merit: 30,
    },
    QuestDef {
        id: "industrial_boom",
        name: "Industrial Boom",
        condition: Condition::MetricReach(Metric::DailyIncome, 500.0),
        reward_credits: 1_500,
        reward_merit: 30,
    },
];

pub fn quest_by_id(id: &str) -> Option<&'static QuestDef> {
    QUEST_CATALOG.iter().find(|q| q.id == id)
}

/// Lifetime build/upgrade tallies, fed from placement events.
#[derive(Resource, Debug, Clone, Default)]
pub struct ProgressCounters {
    pub placements: HashMap<BuildingType, u32>,
    pub upgrades_to_level: HashMap<u8, u32>,
}

impl ProgressCounters {
    pub fn placed(&self, building: BuildingType) -> u32 {
        self.placements.get(&building).copied().unwrap_or(0)
    }

    pub fn upgrades_to(&self, level: u8) -> u32 {
        self.upgrades_to_level.get(&level).copied().unwrap_or(0)
    }
}

pub fn track_progress_counters(
    mut counters: ResMut<ProgressCounters>,
    mut placed: EventReader<BuildingPlaced>,
    mut upgraded: EventReader<BuildingUpgraded>,
) {
    for event in placed.read() {
        *counters.placements.entry(event.building).or_default() += 1;
    }
    for event in upgraded.read() {
        *counters.upgrades_to_level.entry(event.level).or_default() += 1;
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct QuestLog {
    pub completed: Vec<String>,
    sustain_days: HashMap<&'static str, u32>,
}

impl QuestLog {
    /// Rebuild from persisted state; sustain streaks restart.
    pub fn restored(completed: Vec<String>) -> Self {
        Self {
            completed,
            sustain_days: HashMap::new(),
        }
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.iter().any(|q| q == id)
    }
}

#[derive(Event, Debug, Clone)]
pub struct QuestCompleted {
    pub id: &'static str,
}

fn metric_value(metric: Metric, metrics: &CityMetrics, stability: &Stability) -> f32 {
    match metric {
        Metric::Population => metrics.population,
        Metric::DailyIncome => metrics.daily_income as f32,
        Metric::Stability => stability.value,
        Metric::BuildingCount => metrics.building_count as f32,
    }
}

fn condition_met(
    quest: &QuestDef,
    log: &QuestLog,
    counters: &ProgressCounters,
    metrics: &CityMetrics,
    stability: &Stability,
    credits: &PlayerCredits,
) -> bool {
    match quest.condition {
        Condition::BuildCount(building, count) => counters.placed(building) >= count,
        Condition::BuildMultiple(pairs) => pairs
            .iter()
            .all(|&(building, count)| counters.placed(building) >= count),
        Condition::BuildAllTypes(types) => types.iter().all(|&b| counters.placed(b) >= 1),
        Condition::UpgradeCount { level, count } => counters.upgrades_to(level) >= count,
        Condition::TotalEarned(target) => credits.total_earned >= target,
        Condition::MetricReach(metric, target) => {
            metric_value(metric, metrics, stability) >= target
        }
        // Advanced by the settlement tracker, not the instant check.
        Condition::MetricSustain { days, .. } => {
            log.sustain_days.get(quest.id).copied().unwrap_or(0) >= days
        }
    }
}

/// Advance sustain counters once per settlement.
pub fn track_sustain_conditions(
    mut days: EventReader<DayElapsed>,
    mut log: ResMut<QuestLog>,
    metrics: Res<CityMetrics>,
    stability: Res<Stability>,
) {
    for _ in days.read() {
        for quest in QUEST_CATALOG {
            let Condition::MetricSustain { metric, target, .. } = quest.condition else {
                continue;
            };
            if log.is_completed(quest.id) {
                continue;
            }
            if metric_value(metric, &metrics, &stability) >= target {
                *log.sustain_days.entry(quest.id).or_default() += 1;
            } else {
                log.sustain_days.insert(quest.id, 0);
            }
        }
    }
}

pub fn check_quests(
    slow_tick: Res<SlowTickTimer>,
    mut log: ResMut<QuestLog>,
    counters: Res<ProgressCounters>,
    metrics: Res<CityMetrics>,
    stability: Res<Stability>,
    mut credits: ResMut<PlayerCredits>,
    mut merit: ResMut<MeritState>,
    mut completed: EventWriter<QuestCompleted>,
) {
    if !slow_tick.should_run() {
        return;
    }
    for quest in QUEST_CATALOG {
        if log.is_completed(quest.id) {
            continue;
        }
        if condition_met(quest, &log, &counters, &metrics, &stability, &credits) {
            log.completed.push(quest.id.to_string());
            credits.deposit(quest.reward_credits);
            merit.add(quest.reward_merit);
            completed.send(QuestCompleted { id: quest.id });
            info!("quest completed: {}", quest.id);
        }
    }
}

pub struct QuestsPlugin;

impl Plugin for QuestsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProgressCounters>()
            .init_resource::<QuestLog>()
            .add_event::<QuestCompleted>()
            .add_systems(
                FixedUpdate,
                (track_progress_counters, track_sustain_conditions, check_quests)
                    .chain()
                    .in_set(crate::SimulationSet::PostSim),
            );
    }
}
