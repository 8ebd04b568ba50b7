//! Drains the [`CommandQueue`] each fixed tick and applies city-side
//! commands. Defense-side commands are handed to the defense executor's
//! queue untouched so both run inside the same PreSim phase.

use bevy::prelude::*;

use crate::buildings::BuildingType;
use crate::clock::GameClock;
use crate::defense::DefenseCommandQueue;
use crate::economy::PlayerCredits;
use crate::grid::{CityGrid, Terrain, Tile};
use crate::levels::{level_def, LevelState};
use crate::stability::Stability;
use crate::tech::{self, TechState};

use super::{
    BuildingDemolished, BuildingPlaced, BuildingRelocated, BuildingUpgraded, CommandError,
    CommandLog, CommandQueue, CommandResult, GameCommand, TechResearched,
};

#[allow(clippy::too_many_arguments)]
pub fn execute_city_commands(
    mut queue: ResMut<CommandQueue>,
    mut log: ResMut<CommandLog>,
    mut defense_queue: ResMut<DefenseCommandQueue>,
    mut grid: ResMut<CityGrid>,
    mut credits: ResMut<PlayerCredits>,
    mut techs: ResMut<TechState>,
    mut stability: ResMut<Stability>,
    mut clock: ResMut<GameClock>,
    mut levels: ResMut<LevelState>,
    mut placed: EventWriter<BuildingPlaced>,
    mut upgraded: EventWriter<BuildingUpgraded>,
    mut demolished: EventWriter<BuildingDemolished>,
    mut relocated: EventWriter<BuildingRelocated>,
    mut researched: EventWriter<TechResearched>,
) {
    for queued in queue.drain() {
        if queued.command.is_defense() {
            defense_queue.push(queued.command);
            continue;
        }
        let result: CommandResult = match &queued.command {
            GameCommand::PlaceBuilding { x, y, building } => {
                place_building(*x, *y, *building, &mut grid, &mut credits, &mut placed).into()
            }
            GameCommand::UpgradeBuilding { x, y } => {
                upgrade_building(*x, *y, &mut grid, &mut credits, &techs, &mut upgraded).into()
            }
            GameCommand::DemolishBuilding { x, y } => {
                demolish_building(*x, *y, &mut grid, &mut techs, &mut demolished).into()
            }
            GameCommand::RelocateBuilding {
                src_x,
                src_y,
                dst_x,
                dst_y,
            } => relocate_building(
                (*src_x, *src_y),
                (*dst_x, *dst_y),
                &mut grid,
                &mut techs,
                &mut relocated,
            )
            .into(),
            GameCommand::RotateBuilding { x, y } => rotate_building(*x, *y, &mut grid).into(),
            GameCommand::ResearchTech { x, y, tech } => research_tech(
                *x,
                *y,
                tech,
                &mut grid,
                &mut credits,
                &mut techs,
                &mut stability,
                &mut researched,
            )
            .into(),
            GameCommand::SetSpeed { speed } => {
                clock.set_speed(*speed);
                CommandResult::Success
            }
            GameCommand::SetPaused { paused } => {
                clock.paused = *paused;
                CommandResult::Success
            }
            GameCommand::ExpandMap { size } => expand_map(*size, &mut grid).into(),
            GameCommand::SwitchLevel { level } => {
                switch_level(*level, &mut grid, &mut techs, &mut levels).into()
            }
            defense => unreachable!("defense command {:?} not forwarded", defense),
        };
        log.push(queued.command, result);
    }
}

fn bounds_check(grid: &CityGrid, x: u32, y: u32) -> Result<(usize, usize), CommandError> {
    let (x, y) = (x as usize, y as usize);
    if grid.in_bounds(x, y) {
        Ok((x, y))
    } else {
        Err(CommandError::OutOfBounds)
    }
}

fn placement_allowed(grid: &CityGrid, x: usize, y: usize, building: BuildingType) -> bool {
    building.exempt_from_road_rule() || grid.has_road_neighbor(x, y)
}

fn place_building(
    x: u32,
    y: u32,
    building: BuildingType,
    grid: &mut CityGrid,
    credits: &mut PlayerCredits,
    placed: &mut EventWriter<BuildingPlaced>,
) -> Result<(), CommandError> {
    let (tx, ty) = bounds_check(grid, x, y)?;
    if grid.get(tx, ty).is_occupied() {
        return Err(CommandError::Occupied);
    }
    if !placement_allowed(grid, tx, ty, building) {
        return Err(CommandError::NeedsRoadAccess);
    }
    let stats = building.stats(1).expect("every building defines level 1");
    if !credits.can_afford(stats.cost) {
        return Err(CommandError::InsufficientFunds);
    }

    credits.spend(stats.cost);
    *grid.get_mut(tx, ty) = Tile {
        terrain: Terrain::Ground,
        building: Some(building),
        level: 1,
        direction: 0,
        stats: Some(stats),
        output_factor: 1.0,
    };
    placed.send(BuildingPlaced { x, y, building });
    Ok(())
}

fn upgrade_building(
    x: u32,
    y: u32,
    grid: &mut CityGrid,
    credits: &mut PlayerCredits,
    techs: &TechState,
    upgraded: &mut EventWriter<BuildingUpgraded>,
) -> Result<(), CommandError> {
    let (tx, ty) = bounds_check(grid, x, y)?;
    let tile = grid.get(tx, ty);
    let building = tile.building.ok_or(CommandError::EmptyTile)?;
    let stats = tile.stats.ok_or(CommandError::EmptyTile)?;
    let next_level = stats.next_level.ok_or(CommandError::NotUpgradeable)?;
    let cost = stats.upgrade_cost.ok_or(CommandError::NotUpgradeable)?;
    if !credits.can_afford(cost) {
        return Err(CommandError::InsufficientFunds);
    }

    credits.spend(cost);
    let tile = grid.get_mut(tx, ty);
    tile.level = next_level;
    tile.stats = building.stats(next_level);
    // Tech adjustments were baked into the previous snapshot; the new level
    // starts pristine and only re-earns them back at max level.
    tile.output_factor = 1.0;
    if tile.at_max_level() {
        tech::replay_at(tile, techs.at(x, y));
    }
    upgraded.send(BuildingUpgraded {
        x,
        y,
        building,
        level: next_level,
    });
    Ok(())
}

fn demolish_building(
    x: u32,
    y: u32,
    grid: &mut CityGrid,
    techs: &mut TechState,
    demolished: &mut EventWriter<BuildingDemolished>,
) -> Result<(), CommandError> {
    let (tx, ty) = bounds_check(grid, x, y)?;
    let building = grid.get(tx, ty).building.ok_or(CommandError::EmptyTile)?;

    grid.get_mut(tx, ty).clear();
    techs.clear_at(x, y);
    demolished.send(BuildingDemolished { x, y, building });
    Ok(())
}

fn relocate_building(
    src: (u32, u32),
    dst: (u32, u32),
    grid: &mut CityGrid,
    techs: &mut TechState,
    relocated: &mut EventWriter<BuildingRelocated>,
) -> Result<(), CommandError> {
    let (sx, sy) = bounds_check(grid, src.0, src.1)?;
    let (dx, dy) = bounds_check(grid, dst.0, dst.1)?;
    let building = grid.get(sx, sy).building.ok_or(CommandError::EmptyTile)?;
    if grid.get(dx, dy).is_occupied() {
        return Err(CommandError::Occupied);
    }
    if !placement_allowed(grid, dx, dy, building) {
        return Err(CommandError::NeedsRoadAccess);
    }

    let moved = std::mem::take(grid.get_mut(sx, sy));
    *grid.get_mut(dx, dy) = moved;
    techs.move_record(src, dst);
    relocated.send(BuildingRelocated {
        from: src,
        to: dst,
        building,
    });
    Ok(())
}

fn rotate_building(x: u32, y: u32, grid: &mut CityGrid) -> Result<(), CommandError> {
    let (tx, ty) = bounds_check(grid, x, y)?;
    let tile = grid.get_mut(tx, ty);
    match tile.building {
        None => Err(CommandError::EmptyTile),
        Some(BuildingType::Road) => Err(CommandError::RoadsDontRotate),
        Some(_) => {
            tile.direction = (tile.direction + 1) % 4;
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn research_tech(
    x: u32,
    y: u32,
    tech_id: &str,
    grid: &mut CityGrid,
    credits: &mut PlayerCredits,
    techs: &mut TechState,
    stability: &mut Stability,
    researched: &mut EventWriter<TechResearched>,
) -> Result<(), CommandError> {
    let (tx, ty) = bounds_check(grid, x, y)?;
    let def = tech::tech_by_id(tech_id).ok_or(CommandError::UnknownTech)?;
    let tile = grid.get(tx, ty);
    let building = tile.building.ok_or(CommandError::EmptyTile)?;
    if building != def.building {
        return Err(CommandError::WrongBuildingForTech);
    }
    if !tile.at_max_level() {
        return Err(CommandError::NotAtMaxLevel);
    }
    if techs.at(x, y).iter().any(|r| r == def.id) {
        return Err(CommandError::AlreadyResearched);
    }
    if !tech::prerequisites_met(def, techs.at(x, y)) {
        return Err(CommandError::PrerequisiteMissing);
    }
    if !credits.can_afford(def.cost) {
        return Err(CommandError::InsufficientFunds);
    }

    credits.spend(def.cost);
    techs.record(x, y, def.id);
    tech::apply_tech_effects(grid.get_mut(tx, ty), &def.effects, Some(stability));
    researched.send(TechResearched {
        x,
        y,
        tech: def.id,
    });
    Ok(())
}

fn expand_map(size: u32, grid: &mut CityGrid) -> Result<(), CommandError> {
    let size = size as usize;
    if size <= grid.size {
        return Err(CommandError::CannotShrinkMap);
    }
    grid.expand(size);
    Ok(())
}

fn switch_level(
    level: u32,
    grid: &mut CityGrid,
    techs: &mut TechState,
    levels: &mut LevelState,
) -> Result<(), CommandError> {
    let def = level_def(level).ok_or(CommandError::UnknownLevel)?;
    if !levels.is_unlocked(level) {
        return Err(CommandError::LevelLocked);
    }
    levels.current = level;
    grid.reset(def.map_size);
    techs.researched.clear();
    Ok(())
}
