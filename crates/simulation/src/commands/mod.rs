//! Player intent enters the simulation through here: a single typed
//! [`GameCommand`] enum, a FIFO queue drained inside the fixed tick, and a
//! result log. Successful commands emit the typed domain events below;
//! rejected ones record a [`CommandError`] and touch nothing.

pub mod executor;
pub mod queue;
pub mod results;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::BuildingType;
use crate::defense::skills::SkillKind;
use crate::defense::tower::TowerKind;

pub use executor::execute_city_commands;
pub use queue::{CommandLog, CommandQueue, QueuedCommand};
pub use results::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameCommand {
    PlaceBuilding { x: u32, y: u32, building: BuildingType },
    UpgradeBuilding { x: u32, y: u32 },
    DemolishBuilding { x: u32, y: u32 },
    RelocateBuilding { src_x: u32, src_y: u32, dst_x: u32, dst_y: u32 },
    RotateBuilding { x: u32, y: u32 },
    ResearchTech { x: u32, y: u32, tech: String },
    SetSpeed { speed: f32 },
    SetPaused { paused: bool },
    ExpandMap { size: u32 },
    SwitchLevel { level: u32 },
    // Tower-defense side; forwarded to the defense executor.
    PlaceTower { x: u32, y: u32, tower: TowerKind },
    UpgradeTower { x: u32, y: u32 },
    SellTower { x: u32, y: u32 },
    StartWave,
    UseSkill { skill: SkillKind, target_x: f32, target_y: f32 },
}

impl GameCommand {
    pub fn is_defense(&self) -> bool {
        matches!(
            self,
            GameCommand::PlaceTower { .. }
                | GameCommand::UpgradeTower { .. }
                | GameCommand::SellTower { .. }
                | GameCommand::StartWave
                | GameCommand::UseSkill { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Domain events
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone, Copy)]
pub struct BuildingPlaced {
    pub x: u32,
    pub y: u32,
    pub building: BuildingType,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BuildingUpgraded {
    pub x: u32,
    pub y: u32,
    pub building: BuildingType,
    pub level: u8,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BuildingDemolished {
    pub x: u32,
    pub y: u32,
    pub building: BuildingType,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BuildingRelocated {
    pub from: (u32, u32),
    pub to: (u32, u32),
    pub building: BuildingType,
}

#[derive(Event, Debug, Clone)]
pub struct TechResearched {
    pub x: u32,
    pub y: u32,
    pub tech: &'static str,
}

pub struct CommandsPlugin;

impl Plugin for CommandsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandQueue>()
            .init_resource::<CommandLog>()
            .add_event::<BuildingPlaced>()
            .add_event::<BuildingUpgraded>()
            .add_event::<BuildingDemolished>()
            .add_event::<BuildingRelocated>()
            .add_event::<TechResearched>()
            .add_systems(
                FixedUpdate,
                execute_city_commands.in_set(crate::SimulationSet::PreSim),
            );
    }
}
