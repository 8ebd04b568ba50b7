//! Per-building technology tree.
//!
//! Techs are researched on a specific max-level building; their effects
//! permanently rewrite that tile's stat snapshot (and, for efficiency
//! techs, its output factor). The researched set is keyed by grid position
//! so a snapshot restore can rebuild every modified stat block from the
//! pristine level table.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::buildings::BuildingType;
use crate::grid::{CityGrid, Tile};
use crate::stability::Stability;

/// The original balance applies an `output`-style reduction to
/// `power_output` whenever a `power` (consumption) tech is researched —
/// counterintuitive for producer buildings, but shipped behavior. Flip this
/// to stop mirroring the reduction onto output.
pub const POWER_TECH_MIRRORS_OUTPUT: bool = true;

/// Signed fractional effects; 0.0 means the kind is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TechEffects {
    pub output: f32,
    pub pollution: f32,
    pub stability: f32,
    pub population: f32,
    pub power: f32,
    pub efficiency: f32,
    pub capacity: f32,
}

impl TechEffects {
    pub const NONE: TechEffects = TechEffects {
        output: 0.0,
        pollution: 0.0,
        stability: 0.0,
        population: 0.0,
        power: 0.0,
        efficiency: 0.0,
        capacity: 0.0,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct TechDef {
    pub id: &'static str,
    pub building: BuildingType,
    pub cost: i64,
    pub prerequisites: &'static [&'static str],
    pub effects: TechEffects,
}

macro_rules! effects {
    ($($field:ident : $value:expr),* $(,)?) => {
        TechEffects { $($field: $value,)* ..TechEffects::NONE }
    };
}

pub const TECH_CATALOG: &[TechDef] = &[
    TechDef {
        id: "factory_automation",
        building: BuildingType::Factory,
        cost: 2000,
        prerequisites: &[],
        effects: effects!(output: 0.3, stability: 0.05),
    },
    TechDef {
        id: "factory_eco_retrofit",
        building: BuildingType::Factory,
        cost: 2500,
        prerequisites: &[],
        effects: effects!(pollution: -0.4, stability: 0.08),
    },
    TechDef {
        id: "factory_smart_lines",
        building: BuildingType::Factory,
        cost: 4000,
        prerequisites: &["factory_automation"],
        effects: effects!(output: 0.5, efficiency: 0.2, power: -0.15),
    },
    TechDef {
        id: "factory_zero_emission",
        building: BuildingType::Factory,
        cost: 5000,
        prerequisites: &["factory_eco_retrofit"],
        effects: effects!(pollution: -1.0, stability: 0.15, output: 0.1),
    },
    TechDef {
        id: "chemistry_safety_systems",
        building: BuildingType::ChemistryFactory,
        cost: 3000,
        prerequisites: &[],
        effects: effects!(stability: 0.1, pollution: -0.2),
    },
    TechDef {
        id: "chemistry_catalysis",
        building: BuildingType::ChemistryFactory,
        cost: 4500,
        prerequisites: &["chemistry_safety_systems"],
        effects: effects!(output: 0.4, efficiency: 0.15),
    },
    TechDef {
        id: "house_community_planning",
        building: BuildingType::House,
        cost: 1500,
        prerequisites: &[],
        effects: effects!(population: 0.2, stability: 0.05),
    },
    TechDef {
        id: "house_smart_grid",
        building: BuildingType::House,
        cost: 2500,
        prerequisites: &["house_community_planning"],
        effects: effects!(power: -0.2, efficiency: 0.1),
    },
    TechDef {
        id: "shop_logistics",
        building: BuildingType::Shop,
        cost: 1800,
        prerequisites: &[],
        effects: effects!(output: 0.25),
    },
    TechDef {
        id: "shop_franchise",
        building: BuildingType::Shop,
        cost: 3500,
        prerequisites: &["shop_logistics"],
        effects: effects!(output: 0.5, stability: 0.03),
    },
    TechDef {
        id: "garbage_compactors",
        building: BuildingType::GarbageStation,
        cost: 2200,
        prerequisites: &[],
        effects: effects!(capacity: 0.5),
    },
    TechDef {
        id: "solar_tracking",
        building: BuildingType::SunPower,
        cost: 2000,
        prerequisites: &[],
        effects: effects!(output: 0.3),
    },
];

pub fn tech_by_id(id: &str) -> Option<&'static TechDef> {
    TECH_CATALOG.iter().find(|t| t.id == id)
}

pub fn techs_for(building: BuildingType) -> impl Iterator<Item = &'static TechDef> {
    TECH_CATALOG.iter().filter(move |t| t.building == building)
}

/// All prerequisites already present in `researched`?
pub fn prerequisites_met(def: &TechDef, researched: &[String]) -> bool {
    def.prerequisites
        .iter()
        .all(|p| researched.iter().any(|r| r == p))
}

/// Researched tech ids keyed by grid position, in research order. Order is
/// preserved because the `capacity` effect is the one kind that composes
/// non-commutatively with `pollution`.
#[derive(Resource, Debug, Clone, Default)]
pub struct TechState {
    pub researched: HashMap<(u32, u32), Vec<String>>,
}

impl TechState {
    pub fn at(&self, x: u32, y: u32) -> &[String] {
        self.researched
            .get(&(x, y))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn record(&mut self, x: u32, y: u32, id: &str) {
        let list = self.researched.entry((x, y)).or_default();
        if !list.iter().any(|r| r == id) {
            list.push(id.to_string());
        }
    }

    pub fn clear_at(&mut self, x: u32, y: u32) {
        self.researched.remove(&(x, y));
    }

    /// Relocation carries the researched set with the building.
    pub fn move_record(&mut self, from: (u32, u32), to: (u32, u32)) {
        if let Some(list) = self.researched.remove(&from) {
            self.researched.insert(to, list);
        }
    }
}

/// Apply one tech's effects to a tile's stat snapshot. Pass `stability`
/// only on first research: the global bump is a one-time grant and must not
/// repeat when effects are replayed after a load.
pub fn apply_tech_effects(tile: &mut Tile, effects: &TechEffects, stability: Option<&mut Stability>) {
    let Some(stats) = tile.stats.as_mut() else {
        return;
    };

    if effects.output != 0.0 {
        let mult = 1.0 + effects.output;
        stats.coin_output = (stats.coin_output * mult).floor();
        stats.power_output = (stats.power_output * mult).floor();
    }

    if effects.pollution != 0.0 {
        stats.pollution = (stats.pollution * (1.0 + effects.pollution)).floor();
    }

    if effects.stability != 0.0 {
        if let Some(stability) = stability {
            stability.bump(effects.stability * 100.0);
        }
    }

    if effects.population != 0.0 {
        stats.max_population = (stats.max_population * (1.0 + effects.population)).floor();
    }

    if effects.power != 0.0 {
        stats.power_usage = (stats.power_usage * (1.0 + effects.power)).floor();
        if POWER_TECH_MIRRORS_OUTPUT {
            stats.power_output = (stats.power_output * (1.0 - effects.power)).floor();
        }
    }

    if effects.efficiency != 0.0 {
        tile.output_factor *= 1.0 + effects.efficiency;
    }

    // Capacity scales the throughput of net reducers (negative pollution).
    if effects.capacity != 0.0 && stats.pollution < 0.0 {
        stats.pollution = (stats.pollution * (1.0 + effects.capacity)).floor();
    }
}

/// Replay the researched list for one tile from a pristine stat block.
/// The tile must already hold its level-table snapshot.
pub fn replay_at(tile: &mut Tile, researched: &[String]) {
    for id in researched {
        if let Some(def) = tech_by_id(id) {
            apply_tech_effects(tile, &def.effects, None);
        } else {
            warn!("unknown tech id '{}' in researched set, skipping", id);
        }
    }
}

/// Rebuild every max-level building's stat snapshot from the level table
/// and replay its researched techs in order. Restoring from the pristine
/// block first is what prevents double application on every load.
pub fn refresh_tech_effects(grid: &mut CityGrid, techs: &TechState) {
    for (&(x, y), researched) in &techs.researched {
        let (x, y) = (x as usize, y as usize);
        if !grid.in_bounds(x, y) {
            continue;
        }
        let tile = grid.get_mut(x, y);
        let Some(building) = tile.building else {
            continue;
        };
        if !tile.at_max_level() {
            continue;
        }
        tile.stats = building.stats(tile.level);
        tile.output_factor = 1.0;
        replay_at(tile, researched);
    }
}

pub struct TechPlugin;

impl Plugin for TechPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TechState>();
    }
}
