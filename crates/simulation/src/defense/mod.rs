//! The outer-city tower-defense mode: its own map, pathfinding, enemies,
//! towers, wave scheduling, and active skills. Shares the player's credit
//! pool and the deterministic RNG with the city side.

pub mod combat;
pub mod enemy;
pub mod map;
pub mod path;
pub mod skills;
pub mod tower;
pub mod waves;

use bevy::math::Vec2;
use bevy::prelude::*;

use crate::commands::{CommandError, CommandLog, CommandResult, GameCommand};
use crate::economy::PlayerCredits;
use crate::sim_rng::SimRng;
use crate::SimulationSet;

use combat::DefenseClock;
use enemy::{Enemy, PathFollower, StatusEffects};
use map::DefenseMap;
use skills::{SkillKind, SkillState};
use tower::{Tower, TowerKind};
use waves::{WaveStarted, WaveState};

/// Defense-side commands forwarded by the city executor; drained right
/// after it within the same PreSim phase.
#[derive(Resource, Debug, Clone, Default)]
pub struct DefenseCommandQueue {
    pending: Vec<GameCommand>,
}

impl DefenseCommandQueue {
    pub fn push(&mut self, command: GameCommand) {
        self.pending.push(command);
    }

    pub fn drain(&mut self) -> Vec<GameCommand> {
        self.pending.drain(..).collect()
    }
}

#[allow(clippy::too_many_arguments)]
pub fn execute_defense_commands(
    mut queue: ResMut<DefenseCommandQueue>,
    mut log: ResMut<CommandLog>,
    mut commands: Commands,
    map: Res<DefenseMap>,
    clock: Res<DefenseClock>,
    mut wave_state: ResMut<WaveState>,
    mut credits: ResMut<PlayerCredits>,
    mut rng: ResMut<SimRng>,
    mut skill_state: ResMut<SkillState>,
    mut towers: Query<(Entity, &mut Tower)>,
    mut enemies: Query<(Entity, &mut Enemy, &PathFollower, &mut StatusEffects)>,
    mut wave_started: EventWriter<WaveStarted>,
) {
    for command in queue.drain() {
        let result: CommandResult = match &command {
            GameCommand::PlaceTower { x, y, tower } => {
                place_tower(*x, *y, *tower, &map, &mut credits, &towers, &mut commands).into()
            }
            GameCommand::UpgradeTower { x, y } => {
                upgrade_tower(*x, *y, &mut credits, &mut towers).into()
            }
            GameCommand::SellTower { x, y } => {
                sell_tower(*x, *y, &mut credits, &towers, &mut commands).into()
            }
            GameCommand::StartWave => start_wave(
                &map,
                &mut wave_state,
                &mut rng,
                &mut wave_started,
            )
            .into(),
            GameCommand::UseSkill { skill, target_x, target_y } => use_skill(
                *skill,
                Vec2::new(*target_x, *target_y),
                &clock,
                &mut credits,
                &mut skill_state,
                &mut enemies,
            )
            .into(),
            city => unreachable!("city command {:?} reached defense executor", city),
        };
        log.push(command, result);
    }
}

fn tower_at(
    towers: &Query<(Entity, &mut Tower)>,
    cell: (usize, usize),
) -> Option<Entity> {
    towers
        .iter()
        .find(|(_, t)| t.cell == cell)
        .map(|(entity, _)| entity)
}

fn place_tower(
    x: u32,
    y: u32,
    kind: TowerKind,
    map: &DefenseMap,
    credits: &mut PlayerCredits,
    towers: &Query<(Entity, &mut Tower)>,
    commands: &mut Commands,
) -> Result<(), CommandError> {
    let (cx, cy) = (x as usize, y as usize);
    if !map.in_bounds(cx, cy) {
        return Err(CommandError::OutOfBounds);
    }
    if !map.buildable(cx, cy) {
        return Err(CommandError::CellNotBuildable);
    }
    if tower_at(towers, (cx, cy)).is_some() {
        return Err(CommandError::TowerAlreadyThere);
    }
    let cost = tower::build_cost(kind);
    if !credits.can_afford(cost) {
        return Err(CommandError::InsufficientFunds);
    }

    credits.spend(cost);
    commands.spawn(Tower {
        kind,
        level: 1,
        cell: (cx, cy),
        position: map.cell_to_world(cx, cy),
        last_fire: f32::MIN,
    });
    Ok(())
}

fn upgrade_tower(
    x: u32,
    y: u32,
    credits: &mut PlayerCredits,
    towers: &mut Query<(Entity, &mut Tower)>,
) -> Result<(), CommandError> {
    let cell = (x as usize, y as usize);
    for (_, mut tower) in towers.iter_mut() {
        if tower.cell != cell {
            continue;
        }
        let cost = tower::upgrade_cost(tower.kind, tower.level)
            .ok_or(CommandError::TowerAtMaxLevel)?;
        if !credits.can_afford(cost) {
            return Err(CommandError::InsufficientFunds);
        }
        credits.spend(cost);
        tower.level += 1;
        return Ok(());
    }
    Err(CommandError::NoTowerThere)
}

fn sell_tower(
    x: u32,
    y: u32,
    credits: &mut PlayerCredits,
    towers: &Query<(Entity, &mut Tower)>,
    commands: &mut Commands,
) -> Result<(), CommandError> {
    let cell = (x as usize, y as usize);
    for (entity, tower) in towers.iter() {
        if tower.cell != cell {
            continue;
        }
        credits.deposit(tower::sell_refund(tower.kind, tower.level));
        commands.entity(entity).despawn();
        return Ok(());
    }
    Err(CommandError::NoTowerThere)
}

fn start_wave(
    map: &DefenseMap,
    state: &mut WaveState,
    rng: &mut SimRng,
    started: &mut EventWriter<WaveStarted>,
) -> Result<(), CommandError> {
    if !map.route_ok {
        return Err(CommandError::RouteUnavailable);
    }
    if state.active {
        return Err(CommandError::WaveAlreadyActive);
    }
    state.arm(rng);
    state.initial_load = false;
    started.send(WaveStarted { wave: state.wave });
    Ok(())
}

fn use_skill(
    kind: SkillKind,
    target: Vec2,
    clock: &DefenseClock,
    credits: &mut PlayerCredits,
    state: &mut SkillState,
    enemies: &mut Query<(Entity, &mut Enemy, &PathFollower, &mut StatusEffects)>,
) -> Result<(), CommandError> {
    if !state.ready(kind, clock.elapsed) {
        return Err(CommandError::SkillOnCooldown);
    }
    let cost = skills::spec(kind).cost;
    if !credits.can_afford(cost) {
        return Err(CommandError::InsufficientFunds);
    }

    credits.spend(cost);
    state.mark_used(kind, clock.elapsed);
    skills::apply_skill(kind, target, enemies);
    Ok(())
}

pub struct DefensePlugin;

impl Plugin for DefensePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DefenseMap>()
            .init_resource::<DefenseClock>()
            .init_resource::<WaveState>()
            .init_resource::<SkillState>()
            .init_resource::<DefenseCommandQueue>()
            .add_event::<enemy::EnemyReachedEnd>()
            .add_event::<waves::WaveStarted>()
            .add_event::<waves::WaveCompleted>()
            .add_event::<waves::BaseDamaged>()
            .add_event::<waves::DefenseGameOver>()
            .add_systems(
                FixedUpdate,
                (combat::tick_defense_clock, execute_defense_commands)
                    .chain()
                    .after(crate::commands::execute_city_commands)
                    .in_set(SimulationSet::PreSim),
            )
            .add_systems(
                FixedUpdate,
                (
                    waves::spawn_wave_enemies,
                    enemy::tick_status_effects,
                    enemy::update_special_behaviors,
                    enemy::move_enemies,
                    combat::tower_fire,
                    combat::update_projectiles,
                    enemy::resolve_deaths,
                    waves::handle_base_damage,
                    waves::check_wave_completion,
                )
                    .chain()
                    .in_set(SimulationSet::Simulation),
            );
    }
}
