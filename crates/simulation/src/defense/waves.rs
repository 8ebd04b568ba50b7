//! Wave composition, spawn scheduling, and completion tracking.

use bevy::prelude::*;
use rand::seq::SliceRandom;

use crate::config::{BASE_HEALTH, SIM_TICK_SECS};
use crate::sim_rng::SimRng;

use super::enemy::{spawn_enemy, Enemy, EnemyKind, EnemyReachedEnd};
use super::map::DefenseMap;
use super::path;

/// Enemy mix for a wave: an explicit table for the first ten, a formula
/// beyond that.
pub fn wave_composition(wave: u32) -> Vec<(EnemyKind, u32)> {
    use EnemyKind::*;
    match wave {
        0 | 1 => vec![(Scout, 5)],
        2 => vec![(Scout, 7)],
        3 => vec![(Scout, 5), (Runner, 2), (Flying, 2)],
        4 => vec![(Scout, 4), (Tank, 2), (Flying, 2)],
        5 => vec![(Scout, 5), (Runner, 2), (Tank, 1), (Stealth, 2)],
        6 => vec![(Runner, 5), (Armored, 2), (Healer, 1)],
        7 => vec![(Scout, 6), (Tank, 3), (Splitter, 2)],
        8 => vec![(Runner, 4), (Armored, 3), (Elite, 1), (Flying, 3)],
        9 => vec![(Scout, 5), (Tank, 3), (Elite, 2), (Stealth, 2), (Healer, 1)],
        10 => vec![(Runner, 5), (Armored, 3), (Elite, 2), (Boss, 1), (Healer, 2)],
        w => {
            let base = (w as f32 * 1.5).floor() as u32;
            let elite = (w as f32 * 0.3).floor() as u32;
            let mut mix = vec![
                (Runner, (base as f32 * 0.4).floor() as u32),
                (Armored, (base as f32 * 0.3).floor() as u32),
                (Tank, (base as f32 * 0.3).floor() as u32),
                (Elite, elite),
            ];
            if w % 5 == 0 {
                mix.push((Boss, 1));
            }
            mix
        }
    }
}

/// Seconds between spawns, tightening with the wave number.
pub fn spawn_interval(wave: u32) -> f32 {
    (1.5 - 0.1 * wave as f32).max(0.5)
}

#[derive(Resource, Debug, Clone)]
pub struct WaveState {
    pub wave: u32,
    pub base_health: i32,
    pub active: bool,
    /// Flattened, shuffled; spawns pop from the back.
    pub spawn_queue: Vec<EnemyKind>,
    pub spawn_timer: f32,
    pub spawn_interval: f32,
    /// Set when a mid-wave snapshot was just restored: the transient
    /// empty-queue/no-enemies state right after a reload must re-arm the
    /// wave instead of counting as a completion.
    pub initial_load: bool,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            wave: 1,
            base_health: BASE_HEALTH,
            active: false,
            spawn_queue: Vec::new(),
            spawn_timer: 0.0,
            spawn_interval: spawn_interval(1),
            initial_load: false,
        }
    }
}

impl WaveState {
    /// Flatten the wave's composition into a shuffled spawn queue.
    pub fn arm(&mut self, rng: &mut SimRng) {
        let mut queue = Vec::new();
        for (kind, count) in wave_composition(self.wave) {
            for _ in 0..count {
                queue.push(kind);
            }
        }
        queue.shuffle(&mut rng.0);
        self.spawn_queue = queue;
        self.spawn_timer = 0.0;
        self.spawn_interval = spawn_interval(self.wave);
        self.active = true;
    }

    /// Back to a fresh run after the base falls.
    pub fn reset_run(&mut self) {
        *self = WaveState::default();
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct WaveStarted {
    pub wave: u32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct WaveCompleted {
    pub wave: u32,
    pub next_wave: u32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BaseDamaged {
    pub remaining: i32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct DefenseGameOver;

/// Pop one enemy off the queue per interval while the wave runs; every
/// spawn gets its own randomized route.
pub fn spawn_wave_enemies(
    mut commands: Commands,
    mut state: ResMut<WaveState>,
    map: Res<DefenseMap>,
    mut rng: ResMut<SimRng>,
) {
    if !state.active || state.spawn_queue.is_empty() {
        return;
    }
    state.spawn_timer += SIM_TICK_SECS;
    while state.spawn_timer >= state.spawn_interval {
        state.spawn_timer -= state.spawn_interval;
        let Some(kind) = state.spawn_queue.pop() else {
            break;
        };
        let Some(route) = path::enemy_route(&map, &mut rng) else {
            warn!("spawn skipped: defense map route vanished");
            break;
        };
        let waypoints = path::to_waypoints(&map, &route);
        spawn_enemy(&mut commands, kind, state.wave, waypoints);
        state.initial_load = false;
    }
}

/// Leakers damage the base; at zero health the run resets.
pub fn handle_base_damage(
    mut commands: Commands,
    mut reached: EventReader<EnemyReachedEnd>,
    mut state: ResMut<WaveState>,
    enemies: Query<Entity, With<Enemy>>,
    mut damaged: EventWriter<BaseDamaged>,
    mut game_over: EventWriter<DefenseGameOver>,
) {
    for event in reached.read() {
        if let Some(mut leaker) = commands.get_entity(event.entity) {
            leaker.despawn();
        }
        state.base_health -= 1;
        damaged.send(BaseDamaged {
            remaining: state.base_health,
        });
        if state.base_health <= 0 {
            game_over.send(DefenseGameOver);
            state.reset_run();
            for entity in &enemies {
                if let Some(mut enemy) = commands.get_entity(entity) {
                    enemy.despawn();
                }
            }
            info!("base destroyed; defense run reset");
            return;
        }
    }
}

/// A wave completes when the spawn queue has drained and no enemy is left
/// alive — unless this state was inherited from a snapshot restore, in
/// which case the wave re-arms and finishes properly first.
pub fn check_wave_completion(
    mut state: ResMut<WaveState>,
    enemies: Query<(), With<Enemy>>,
    mut rng: ResMut<SimRng>,
    mut completed: EventWriter<WaveCompleted>,
) {
    if !state.active || !state.spawn_queue.is_empty() {
        return;
    }
    if !enemies.is_empty() {
        state.initial_load = false;
        return;
    }
    if state.initial_load {
        // Interrupted wave: restart its spawns rather than declare victory.
        state.initial_load = false;
        state.arm(&mut rng);
        info!("re-arming interrupted wave {}", state.wave);
        return;
    }
    let finished = state.wave;
    state.active = false;
    state.wave += 1;
    state.spawn_interval = spawn_interval(state.wave);
    completed.send(WaveCompleted {
        wave: finished,
        next_wave: state.wave,
    });
    info!("wave {} cleared", finished);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_table_for_first_ten() {
        assert_eq!(wave_composition(1), vec![(EnemyKind::Scout, 5)]);
        assert_eq!(wave_composition(2), vec![(EnemyKind::Scout, 7)]);
        let ten = wave_composition(10);
        assert!(ten.contains(&(EnemyKind::Boss, 1)));
    }

    #[test]
    fn formula_for_wave_fifteen() {
        // base = floor(15 * 1.5) = 22 -> 8/6/6; elite = floor(15 * 0.3) = 4;
        // boss on every fifth wave.
        let mix = wave_composition(15);
        assert_eq!(
            mix,
            vec![
                (EnemyKind::Runner, 8),
                (EnemyKind::Armored, 6),
                (EnemyKind::Tank, 6),
                (EnemyKind::Elite, 4),
                (EnemyKind::Boss, 1),
            ]
        );
    }

    #[test]
    fn formula_skips_boss_off_cycle() {
        let mix = wave_composition(13);
        assert!(!mix.iter().any(|&(k, _)| k == EnemyKind::Boss));
    }

    #[test]
    fn spawn_interval_shrinks_and_floors() {
        assert!((spawn_interval(1) - 1.4).abs() < 1e-6);
        assert!((spawn_interval(5) - 1.0).abs() < 1e-6);
        assert_eq!(spawn_interval(30), 0.5);
    }

    #[test]
    fn arming_flattens_and_keeps_counts() {
        let mut state = WaveState {
            wave: 3,
            ..Default::default()
        };
        let mut rng = SimRng::seeded(1);
        state.arm(&mut rng);
        assert!(state.active);
        assert_eq!(state.spawn_queue.len(), 9); // 5 scouts + 2 runners + 2 flyers
        let scouts = state
            .spawn_queue
            .iter()
            .filter(|&&k| k == EnemyKind::Scout)
            .count();
        assert_eq!(scouts, 5);
    }
}
