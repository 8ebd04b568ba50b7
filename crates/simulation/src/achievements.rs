//! Lifetime achievements, checked against the metrics snapshot and build
//! counters on the slow cadence. Each unlocks once and pays out merit.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::defense::waves::WaveState;
use crate::economy::PlayerCredits;
use crate::merit::MeritState;
use crate::metrics::CityMetrics;
use crate::quests::ProgressCounters;
use crate::tech::TechState;
use crate::SlowTickTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum Achievement {
    // Population milestones
    Hamlet50,
    Town200,
    City500,

    // Economy
    Tycoon10K,
    Magnate50K,

    // Infrastructure & environment
    PowerSurplus,
    CleanAir,
    FullService,
    MasterBuilder50,

    // Technology
    TechPioneer,

    // Tower defense
    Defender5,
    Defender10,
}

impl Achievement {
    pub const ALL: &'static [Achievement] = &[
        Achievement::Hamlet50,
        Achievement::Town200,
        Achievement::City500,
        Achievement::Tycoon10K,
        Achievement::Magnate50K,
        Achievement::PowerSurplus,
        Achievement::CleanAir,
        Achievement::FullService,
        Achievement::MasterBuilder50,
        Achievement::TechPioneer,
        Achievement::Defender5,
        Achievement::Defender10,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Achievement::Hamlet50 => "Hamlet",
            Achievement::Town200 => "Thriving Town",
            Achievement::City500 => "Proper City",
            Achievement::Tycoon10K => "Tycoon",
            Achievement::Magnate50K => "Magnate",
            Achievement::PowerSurplus => "Grid to Spare",
            Achievement::CleanAir => "Clean Air Act",
            Achievement::FullService => "Full Service",
            Achievement::MasterBuilder50 => "Master Builder",
            Achievement::TechPioneer => "Tech Pioneer",
            Achievement::Defender5 => "Gatekeeper",
            Achievement::Defender10 => "Bulwark",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::Hamlet50 => "Reach 50 residents",
            Achievement::Town200 => "Reach 200 residents",
            Achievement::City500 => "Reach 500 residents",
            Achievement::Tycoon10K => "Earn 10,000 credits in total",
            Achievement::Magnate50K => "Earn 50,000 credits in total",
            Achievement::PowerSurplus => "Generate twice the power you consume",
            Achievement::CleanAir => "Run 10+ buildings at zero net pollution",
            Achievement::FullService => "Operate a hospital, police and fire station",
            Achievement::MasterBuilder50 => "Have 50 buildings standing at once",
            Achievement::TechPioneer => "Research your first technology",
            Achievement::Defender5 => "Reach wave 5 in the outer city",
            Achievement::Defender10 => "Reach wave 10 in the outer city",
        }
    }

    pub fn merit_reward(self) -> i64 {
        match self {
            Achievement::Hamlet50 => 20,
            Achievement::Town200 => 50,
            Achievement::City500 => 120,
            Achievement::Tycoon10K => 40,
            Achievement::Magnate50K => 100,
            Achievement::PowerSurplus => 30,
            Achievement::CleanAir => 60,
            Achievement::FullService => 40,
            Achievement::MasterBuilder50 => 80,
            Achievement::TechPioneer => 30,
            Achievement::Defender5 => 40,
            Achievement::Defender10 => 100,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct AchievementTracker {
    pub unlocked: Vec<Achievement>,
}

impl AchievementTracker {
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct AchievementUnlocked {
    pub achievement: Achievement,
}

fn condition_met(
    achievement: Achievement,
    metrics: &CityMetrics,
    counters: &ProgressCounters,
    credits: &PlayerCredits,
    techs: &TechState,
    waves: &WaveState,
) -> bool {
    use crate::buildings::BuildingType as B;
    match achievement {
        Achievement::Hamlet50 => metrics.population >= 50.0,
        Achievement::Town200 => metrics.population >= 200.0,
        Achievement::City500 => metrics.population >= 500.0,
        Achievement::Tycoon10K => credits.total_earned >= 10_000,
        Achievement::Magnate50K => credits.total_earned >= 50_000,
        Achievement::PowerSurplus => {
            metrics.power_used > 0.0 && metrics.power_capacity >= metrics.power_used * 2.0
        }
        Achievement::CleanAir => {
            metrics.building_count >= 10 && metrics.pollution_total <= 0.0
        }
        Achievement::FullService => {
            counters.placed(B::Hospital) >= 1
                && counters.placed(B::Police) >= 1
                && counters.placed(B::FireStation) >= 1
        }
        Achievement::MasterBuilder50 => metrics.building_count >= 50,
        Achievement::TechPioneer => techs.researched.values().any(|list| !list.is_empty()),
        Achievement::Defender5 => waves.wave >= 5,
        Achievement::Defender10 => waves.wave >= 10,
    }
}

pub fn check_achievements(
    slow_tick: Res<SlowTickTimer>,
    mut tracker: ResMut<AchievementTracker>,
    metrics: Res<CityMetrics>,
    counters: Res<ProgressCounters>,
    credits: Res<PlayerCredits>,
    techs: Res<TechState>,
    waves: Res<WaveState>,
    mut merit: ResMut<MeritState>,
    mut unlocked: EventWriter<AchievementUnlocked>,
) {
    if !slow_tick.should_run() {
        return;
    }
    for &achievement in Achievement::ALL {
        if tracker.is_unlocked(achievement) {
            continue;
        }
        if condition_met(achievement, &metrics, &counters, &credits, &techs, &waves) {
            tracker.unlocked.push(achievement);
            merit.add(achievement.merit_reward());
            unlocked.send(AchievementUnlocked { achievement });
            info!("achievement unlocked: {}", achievement.name());
        }
    }
}

pub struct AchievementsPlugin;

impl Plugin for AchievementsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AchievementTracker>()
            .add_event::<AchievementUnlocked>()
            .add_systems(
                FixedUpdate,
                check_achievements.in_set(crate::SimulationSet::PostSim),
            );
    }
}
