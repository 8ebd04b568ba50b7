//! Logical save state.
//!
//! [`GameSnapshot`] is the complete persisted shape of a game: the tile
//! grid, researched techs by position, economy/stability/clock state,
//! progression, and the tower-defense sub-state. Encoding is bitcode (and
//! serde for callers that want a structured form); actual file I/O lives
//! outside this crate.
//!
//! Restore rebuilds stat snapshots from the pristine level tables and
//! replays researched techs, so tech effects are never double-applied, and
//! arms the wave reload guard when a wave was active at capture time.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::achievements::{Achievement, AchievementTracker};
use crate::buildings::BuildingType;
use crate::clock::GameClock;
use crate::defense::combat::{DefenseClock, Projectile};
use crate::defense::enemy::Enemy;
use crate::defense::skills::{SkillKind, SkillState};
use crate::defense::tower::{Tower, TowerKind};
use crate::defense::waves::WaveState;
use crate::defense::map::DefenseMap;
use crate::economy::PlayerCredits;
use crate::grid::{CityGrid, Terrain, Tile};
use crate::levels::LevelState;
use crate::merit::MeritState;
use crate::quests::{ProgressCounters, QuestLog};
use crate::sim_rng::{RngState, SimRng};
use crate::stability::Stability;
use crate::tech::{self, TechState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct TileRecord {
    pub terrain: Terrain,
    pub building: Option<BuildingType>,
    pub level: u8,
    pub direction: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct TowerRecord {
    pub x: u32,
    pub y: u32,
    pub kind: TowerKind,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct GameSnapshot {
    pub grid_size: u32,
    pub tiles: Vec<TileRecord>,
    pub techs: Vec<(u32, u32, Vec<String>)>,

    pub day: u32,
    pub speed: f32,
    pub paused: bool,
    pub credits: i64,
    pub total_earned: i64,
    pub stability: f32,

    pub quests_completed: Vec<String>,
    pub achievements: Vec<Achievement>,
    pub level_current: u32,
    pub levels_unlocked: Vec<u32>,
    pub merit: i64,
    pub placements: Vec<(BuildingType, u32)>,
    pub upgrades_to_level: Vec<(u8, u32)>,

    pub wave: u32,
    pub base_health: i32,
    pub wave_active: bool,
    pub towers: Vec<TowerRecord>,
    pub skill_timestamps: Vec<(SkillKind, f32)>,
    pub defense_elapsed: f32,

    pub rng: RngState,
}

pub fn to_bytes(snapshot: &GameSnapshot) -> Vec<u8> {
    bitcode::encode(snapshot)
}

pub fn from_bytes(bytes: &[u8]) -> Option<GameSnapshot> {
    match bitcode::decode(bytes) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("snapshot decode failed: {}", e);
            None
        }
    }
}

/// Capture the full logical state of the running world.
pub fn capture(world: &mut World) -> GameSnapshot {
    let grid = world.resource::<CityGrid>();
    let tiles = grid
        .tiles
        .iter()
        .map(|t| TileRecord {
            terrain: t.terrain,
            building: t.building,
            level: t.level,
            direction: t.direction,
        })
        .collect();
    let grid_size = grid.size as u32;

    let techs = world
        .resource::<TechState>()
        .researched
        .iter()
        .map(|(&(x, y), list)| (x, y, list.clone()))
        .collect();

    let clock = world.resource::<GameClock>();
    let (day, speed, paused) = (clock.day, clock.speed, clock.paused);
    let credits = world.resource::<PlayerCredits>();
    let (balance, total_earned) = (credits.balance, credits.total_earned);
    let stability = world.resource::<Stability>().value;

    let quests_completed = world.resource::<QuestLog>().completed.clone();
    let achievements = world.resource::<AchievementTracker>().unlocked.clone();
    let levels = world.resource::<LevelState>();
    let (level_current, levels_unlocked) = (levels.current, levels.unlocked.clone());
    let merit = world.resource::<MeritState>().points;
    let counters = world.resource::<ProgressCounters>();
    let placements = counters.placements.iter().map(|(&b, &n)| (b, n)).collect();
    let upgrades_to_level = counters
        .upgrades_to_level
        .iter()
        .map(|(&l, &n)| (l, n))
        .collect();

    let waves = world.resource::<WaveState>();
    let (wave, base_health, wave_active) = (waves.wave, waves.base_health, waves.active);
    let skill_timestamps = world.resource::<SkillState>().last_used_snapshot();
    let defense_elapsed = world.resource::<DefenseClock>().elapsed;
    let rng = world.resource::<SimRng>().state();

    let mut tower_query = world.query::<&Tower>();
    let towers = tower_query
        .iter(world)
        .map(|t| TowerRecord {
            x: t.cell.0 as u32,
            y: t.cell.1 as u32,
            kind: t.kind,
            level: t.level,
        })
        .collect();

    GameSnapshot {
        grid_size,
        tiles,
        techs,
        day,
        speed,
        paused,
        credits: balance,
        total_earned,
        stability,
        quests_completed,
        achievements,
        level_current,
        levels_unlocked,
        merit,
        placements,
        upgrades_to_level,
        wave,
        base_health,
        wave_active,
        towers,
        skill_timestamps,
        defense_elapsed,
        rng,
    }
}

/// Restore a captured state into the world, replacing whatever is running.
pub fn restore(world: &mut World, snapshot: &GameSnapshot) {
    // Live combat entities are not part of the logical state.
    let mut stale_query =
        world.query_filtered::<Entity, Or<(With<Enemy>, With<Tower>, With<Projectile>)>>();
    let stale: Vec<Entity> = stale_query.iter(world).collect();
    for entity in stale {
        world.despawn(entity);
    }

    let size = snapshot.grid_size as usize;
    let mut grid = CityGrid::new(size);
    for (i, record) in snapshot.tiles.iter().enumerate().take(size * size) {
        let tile = &mut grid.tiles[i];
        *tile = Tile {
            terrain: record.terrain,
            building: record.building,
            level: record.level,
            direction: record.direction,
            stats: record.building.and_then(|b| b.stats(record.level)),
            output_factor: 1.0,
        };
    }

    let techs = TechState {
        researched: snapshot
            .techs
            .iter()
            .map(|(x, y, list)| ((*x, *y), list.clone()))
            .collect(),
    };
    // Pristine blocks first, then replay: never double-apply.
    tech::refresh_tech_effects(&mut grid, &techs);
    world.insert_resource(grid);
    world.insert_resource(techs);

    world.insert_resource(GameClock::restored(
        snapshot.day,
        snapshot.speed,
        snapshot.paused,
    ));
    world.insert_resource(PlayerCredits {
        balance: snapshot.credits,
        total_earned: snapshot.total_earned,
    });
    world.insert_resource(Stability {
        value: snapshot.stability.clamp(0.0, 100.0),
        change_rate: 0.0,
    });

    world.insert_resource(QuestLog::restored(snapshot.quests_completed.clone()));
    world.insert_resource(AchievementTracker {
        unlocked: snapshot.achievements.clone(),
    });
    world.insert_resource(LevelState {
        current: snapshot.level_current,
        unlocked: snapshot.levels_unlocked.clone(),
    });
    world.insert_resource(MeritState {
        points: snapshot.merit,
    });
    world.insert_resource(ProgressCounters {
        placements: snapshot.placements.iter().copied().collect(),
        upgrades_to_level: snapshot.upgrades_to_level.iter().copied().collect(),
    });

    world.insert_resource(WaveState {
        wave: snapshot.wave,
        base_health: snapshot.base_health,
        active: snapshot.wave_active,
        // A wave restored mid-flight must re-arm, not instantly complete.
        initial_load: snapshot.wave_active,
        ..Default::default()
    });
    world.insert_resource(SkillState::restore(&snapshot.skill_timestamps));
    world.insert_resource(DefenseClock {
        elapsed: snapshot.defense_elapsed,
    });
    world.insert_resource(SimRng::from_state(&snapshot.rng));

    let map = world.resource::<DefenseMap>();
    let tower_bundles: Vec<Tower> = snapshot
        .towers
        .iter()
        .map(|record| Tower {
            kind: record.kind,
            level: record.level.clamp(1, 3),
            cell: (record.x as usize, record.y as usize),
            position: map.cell_to_world(record.x as usize, record.y as usize),
            last_fire: f32::MIN,
        })
        .collect();
    for tower in tower_bundles {
        world.spawn(tower);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameSnapshot {
        GameSnapshot {
            grid_size: 2,
            tiles: vec![
                TileRecord {
                    terrain: Terrain::Ground,
                    building: Some(BuildingType::Factory),
                    level: 1,
                    direction: 2,
                },
                TileRecord {
                    terrain: Terrain::Grass,
                    building: None,
                    level: 0,
                    direction: 0,
                },
                TileRecord {
                    terrain: Terrain::Grass,
                    building: None,
                    level: 0,
                    direction: 0,
                },
                TileRecord {
                    terrain: Terrain::Ground,
                    building: Some(BuildingType::Road),
                    level: 1,
                    direction: 0,
                },
            ],
            techs: vec![(0, 0, vec!["factory_automation".into()])],
            day: 12,
            speed: 2.0,
            paused: false,
            credits: 4_200,
            total_earned: 9_000,
            stability: 87.5,
            quests_completed: vec!["first_homes".into()],
            achievements: vec![Achievement::Hamlet50],
            level_current: 1,
            levels_unlocked: vec![1, 2],
            merit: 45,
            placements: vec![(BuildingType::Factory, 1), (BuildingType::Road, 1)],
            upgrades_to_level: vec![(2, 1)],
            wave: 4,
            base_health: 7,
            wave_active: true,
            towers: vec![TowerRecord {
                x: 5,
                y: 2,
                kind: TowerKind::Sniper,
                level: 2,
            }],
            skill_timestamps: vec![(SkillKind::Freeze, 30.0)],
            defense_elapsed: 63.5,
            rng: SimRng::seeded(9).state(),
        }
    }

    #[test]
    fn bitcode_roundtrip() {
        let snapshot = sample();
        let bytes = to_bytes(&snapshot);
        let decoded = from_bytes(&bytes).expect("decodes");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn garbage_bytes_decode_to_none() {
        assert!(from_bytes(&[0xFF, 0x01, 0x02]).is_none());
    }

    #[test]
    fn serde_shape_is_stable() {
        let json = serde_json::to_value(sample()).expect("serializes");
        assert_eq!(json["day"], 12);
        assert_eq!(json["wave"], 4);
        assert!(json["tiles"].as_array().unwrap().len() == 4);
    }
}
