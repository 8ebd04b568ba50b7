//! Enemy archetypes, wave scaling, status effects and path movement.

use bevy::math::Vec2;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SIM_TICK_SECS;
use crate::economy::PlayerCredits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Scout,
    Tank,
    Runner,
    Armored,
    Elite,
    Boss,
    Flying,
    Stealth,
    Healer,
    Splitter,
}

#[derive(Debug, Clone, Copy)]
pub struct Growth {
    pub health: f32,
    pub speed: f32,
    pub defense: f32,
    pub reward: f32,
}

#[derive(Debug, Clone, Copy)]
pub enum Special {
    Flying,
    Stealth { cycle: f32, duration: f32 },
    Healer { range: f32, amount: f32, interval: f32 },
    Splitter { count: u32, health_ratio: f32, speed_mult: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Archetype {
    pub name: &'static str,
    pub base_health: f32,
    pub base_speed: f32,
    pub base_defense: f32,
    pub base_reward: i64,
    pub growth: Growth,
    pub special: Option<Special>,
}

pub fn archetype(kind: EnemyKind) -> &'static Archetype {
    match kind {
        EnemyKind::Scout => &Archetype {
            name: "Scout",
            base_health: 60.0,
            base_speed: 3.5,
            base_defense: 0.0,
            base_reward: 8,
            growth: Growth { health: 0.15, speed: 0.05, defense: 0.01, reward: 0.1 },
            special: None,
        },
        EnemyKind::Tank => &Archetype {
            name: "Tank",
            base_health: 200.0,
            base_speed: 1.2,
            base_defense: 0.3,
            base_reward: 20,
            growth: Growth { health: 0.25, speed: 0.02, defense: 0.02, reward: 0.15 },
            special: None,
        },
        EnemyKind::Runner => &Archetype {
            name: "Runner",
            base_health: 80.0,
            base_speed: 4.5,
            base_defense: 0.05,
            base_reward: 12,
            growth: Growth { health: 0.12, speed: 0.08, defense: 0.005, reward: 0.12 },
            special: None,
        },
        EnemyKind::Armored => &Archetype {
            name: "Armored",
            base_health: 100.0,
            base_speed: 2.0,
            base_defense: 0.5,
            base_reward: 18,
            growth: Growth { health: 0.18, speed: 0.03, defense: 0.025, reward: 0.14 },
            special: None,
        },
        EnemyKind::Elite => &Archetype {
            name: "Elite",
            base_health: 150.0,
            base_speed: 2.5,
            base_defense: 0.2,
            base_reward: 25,
            growth: Growth { health: 0.2, speed: 0.05, defense: 0.015, reward: 0.18 },
            special: None,
        },
        EnemyKind::Boss => &Archetype {
            name: "Boss",
            base_health: 500.0,
            base_speed: 1.5,
            base_defense: 0.4,
            base_reward: 100,
            growth: Growth { health: 0.35, speed: 0.02, defense: 0.03, reward: 0.25 },
            special: None,
        },
        EnemyKind::Flying => &Archetype {
            name: "Flyer",
            base_health: 50.0,
            base_speed: 3.0,
            base_defense: 0.0,
            base_reward: 15,
            growth: Growth { health: 0.12, speed: 0.06, defense: 0.01, reward: 0.12 },
            special: Some(Special::Flying),
        },
        EnemyKind::Stealth => &Archetype {
            name: "Shade",
            base_health: 70.0,
            base_speed: 3.5,
            base_defense: 0.1,
            base_reward: 20,
            growth: Growth { health: 0.15, speed: 0.07, defense: 0.01, reward: 0.15 },
            special: Some(Special::Stealth { cycle: 5.0, duration: 2.0 }),
        },
        EnemyKind::Healer => &Archetype {
            name: "Mender",
            base_health: 100.0,
            base_speed: 2.0,
            base_defense: 0.2,
            base_reward: 30,
            growth: Growth { health: 0.18, speed: 0.04, defense: 0.015, reward: 0.2 },
            special: Some(Special::Healer { range: 2.5, amount: 10.0, interval: 2.0 }),
        },
        EnemyKind::Splitter => &Archetype {
            name: "Splitter",
            base_health: 80.0,
            base_speed: 2.5,
            base_defense: 0.15,
            base_reward: 25,
            growth: Growth { health: 0.16, speed: 0.05, defense: 0.01, reward: 0.15 },
            special: Some(Special::Splitter { count: 3, health_ratio: 0.3, speed_mult: 1.2 }),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledStats {
    pub health: f32,
    pub speed: f32,
    pub defense: f32,
    pub reward: i64,
}

/// Defense never exceeds this, so towers always land a nonzero fraction.
pub const DEFENSE_CAP: f32 = 0.8;

/// Wave-scaled stats: additive fractional growth per wave past the first,
/// health and reward floored, defense capped.
pub fn scaled_stats(kind: EnemyKind, wave: u32) -> ScaledStats {
    let arch = archetype(kind);
    let w = wave.saturating_sub(1) as f32;
    ScaledStats {
        health: (arch.base_health * (1.0 + arch.growth.health * w)).floor(),
        speed: arch.base_speed * (1.0 + arch.growth.speed * w),
        defense: (arch.base_defense + arch.growth.defense * w).min(DEFENSE_CAP),
        reward: (arch.base_reward as f32 * (1.0 + arch.growth.reward * w)).floor() as i64,
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub max_health: f32,
    pub health: f32,
    pub base_speed: f32,
    pub defense: f32,
    pub reward: i64,
    pub flying: bool,
}

impl Enemy {
    pub fn from_stats(kind: EnemyKind, stats: ScaledStats) -> Self {
        Self {
            kind,
            max_health: stats.health,
            health: stats.health,
            base_speed: stats.speed,
            defense: stats.defense,
            reward: stats.reward,
            flying: matches!(archetype(kind).special, Some(Special::Flying)),
        }
    }

    /// Defense-reduced damage; returns the amount actually dealt.
    pub fn take_damage(&mut self, raw: f32) -> f32 {
        let actual = raw * (1.0 - self.defense);
        self.health -= actual;
        actual
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Progress along this enemy's own waypoint list.
#[derive(Component, Debug, Clone)]
pub struct PathFollower {
    pub waypoints: Vec<Vec2>,
    pub segment: usize,
    /// 0..1 along the current segment.
    pub progress: f32,
    pub position: Vec2,
}

impl PathFollower {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        let position = waypoints.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            waypoints,
            segment: 0,
            progress: 0.0,
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Dot {
    pub dps: f32,
    pub remaining: f32,
}

/// Orthogonal status layers. Freeze wins over slow for speed; poison and
/// burn tick independently and can both kill.
#[derive(Component, Debug, Clone, Default)]
pub struct StatusEffects {
    pub slow_multiplier: f32,
    pub slow_remaining: f32,
    pub freeze_remaining: f32,
    pub poison: Dot,
    pub burn: Dot,
}

impl StatusEffects {
    /// Strongest multiplier and longest duration win, matching refreshes
    /// from weaker towers not overwriting a stronger slow.
    pub fn apply_slow(&mut self, multiplier: f32, duration: f32) {
        if self.slow_remaining > 0.0 {
            self.slow_multiplier = self.slow_multiplier.min(multiplier);
            self.slow_remaining = self.slow_remaining.max(duration);
        } else {
            self.slow_multiplier = multiplier;
            self.slow_remaining = duration;
        }
    }

    pub fn apply_freeze(&mut self, duration: f32) {
        self.freeze_remaining = self.freeze_remaining.max(duration);
    }

    pub fn apply_poison(&mut self, dps: f32, duration: f32) {
        self.poison = Dot { dps, remaining: duration };
    }

    pub fn apply_burn(&mut self, dps: f32, duration: f32) {
        self.burn = Dot { dps, remaining: duration };
    }

    pub fn is_slowed(&self) -> bool {
        self.slow_remaining > 0.0
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_remaining > 0.0
    }

    pub fn speed_for(&self, base: f32) -> f32 {
        if self.is_frozen() {
            return 0.0;
        }
        if self.is_slowed() {
            base * self.slow_multiplier
        } else {
            base
        }
    }
}

/// Timers for stealth cycling and heal pulses.
#[derive(Component, Debug, Clone, Default)]
pub struct SpecialBehavior {
    pub stealthed: bool,
    pub stealth_timer: f32,
    pub heal_timer: f32,
}

/// Spawn one enemy entity following its own waypoint route.
pub fn spawn_enemy(
    commands: &mut Commands,
    kind: EnemyKind,
    wave: u32,
    waypoints: Vec<Vec2>,
) -> Entity {
    let stats = scaled_stats(kind, wave);
    commands
        .spawn((
            Enemy::from_stats(kind, stats),
            PathFollower::new(waypoints),
            StatusEffects::default(),
            SpecialBehavior::default(),
        ))
        .id()
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An enemy walked off the final waypoint; the wave system damages the base.
#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyReachedEnd {
    pub entity: Entity,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Decrement status durations and apply damage-over-time.
pub fn tick_status_effects(mut enemies: Query<(&mut Enemy, &mut StatusEffects)>) {
    let dt = SIM_TICK_SECS;
    for (mut enemy, mut status) in &mut enemies {
        if status.slow_remaining > 0.0 {
            status.slow_remaining -= dt;
            if status.slow_remaining <= 0.0 {
                status.slow_multiplier = 1.0;
            }
        }
        if status.freeze_remaining > 0.0 {
            status.freeze_remaining -= dt;
        }
        if status.poison.remaining > 0.0 {
            let dps = status.poison.dps;
            enemy.take_damage(dps * dt);
            status.poison.remaining -= dt;
        }
        if status.burn.remaining > 0.0 {
            let dps = status.burn.dps;
            enemy.take_damage(dps * dt);
            status.burn.remaining -= dt;
        }
    }
}

/// Stealth cycling and healer pulses.
pub fn update_special_behaviors(
    mut set: ParamSet<(
        Query<(Entity, &Enemy, &PathFollower, &mut SpecialBehavior)>,
        Query<(Entity, &mut Enemy, &PathFollower)>,
    )>,
) {
    let dt = SIM_TICK_SECS;
    let mut pulses: Vec<(Entity, Vec2, f32, f32)> = Vec::new();

    for (entity, enemy, follower, mut behavior) in &mut set.p0() {
        match archetype(enemy.kind).special {
            Some(Special::Stealth { cycle, duration }) => {
                behavior.stealth_timer += dt;
                if behavior.stealth_timer >= cycle {
                    behavior.stealth_timer -= cycle;
                }
                behavior.stealthed = behavior.stealth_timer < duration;
            }
            Some(Special::Healer { range, amount, interval }) => {
                behavior.heal_timer += dt;
                if behavior.heal_timer >= interval {
                    behavior.heal_timer -= interval;
                    pulses.push((entity, follower.position, amount, range));
                }
            }
            _ => {}
        }
    }

    if pulses.is_empty() {
        return;
    }
    for (entity, mut enemy, follower) in &mut set.p1() {
        for &(source, origin, amount, range) in &pulses {
            if entity == source || enemy.is_dead() {
                continue;
            }
            if follower.position.distance(origin) <= range {
                enemy.heal(amount);
            }
        }
    }
}

/// Advance every living enemy along its route, carrying leftover travel
/// across waypoint boundaries so fast units cover several segments in one
/// tick proportionally instead of snapping.
pub fn move_enemies(
    mut enemies: Query<(Entity, &Enemy, &mut PathFollower, &StatusEffects)>,
    mut reached: EventWriter<EnemyReachedEnd>,
) {
    let dt = SIM_TICK_SECS;
    for (entity, enemy, mut follower, status) in &mut enemies {
        if enemy.is_dead() {
            continue;
        }
        let mut travel = status.speed_for(enemy.base_speed) * dt;
        while travel > 0.0 {
            let target = follower.segment + 1;
            if target >= follower.waypoints.len() {
                reached.send(EnemyReachedEnd { entity });
                break;
            }
            let from = follower.waypoints[follower.segment];
            let to = follower.waypoints[target];
            let seg_len = from.distance(to);
            if seg_len <= f32::EPSILON {
                follower.segment = target;
                follower.progress = 0.0;
                follower.position = to;
                continue;
            }
            let remaining = (1.0 - follower.progress) * seg_len;
            if travel >= remaining {
                travel -= remaining;
                follower.segment = target;
                follower.progress = 0.0;
                follower.position = to;
            } else {
                follower.progress += travel / seg_len;
                follower.position = from.lerp(to, follower.progress);
                travel = 0.0;
            }
        }
    }
}

/// Pay out rewards, split splitters, despawn the dead.
pub fn resolve_deaths(
    mut commands: Commands,
    dead: Query<(Entity, &Enemy, &PathFollower)>,
    mut credits: ResMut<PlayerCredits>,
) {
    for (entity, enemy, follower) in &dead {
        if !enemy.is_dead() {
            continue;
        }
        credits.deposit(enemy.reward);
        if let Some(Special::Splitter { count, health_ratio, speed_mult }) =
            archetype(enemy.kind).special
        {
            for _ in 0..count {
                let health = (enemy.max_health * health_ratio).floor().max(1.0);
                let shard = Enemy {
                    kind: EnemyKind::Scout,
                    max_health: health,
                    health,
                    base_speed: enemy.base_speed * speed_mult,
                    defense: 0.0,
                    reward: (enemy.reward as f32 * health_ratio).floor() as i64,
                    flying: false,
                };
                commands.spawn((
                    shard,
                    follower.clone(),
                    StatusEffects::default(),
                    SpecialBehavior::default(),
                ));
            }
        }
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_one_uses_base_stats() {
        let stats = scaled_stats(EnemyKind::Scout, 1);
        assert_eq!(stats.health, 60.0);
        assert_eq!(stats.speed, 3.5);
        assert_eq!(stats.reward, 8);
    }

    #[test]
    fn growth_is_additive_per_wave() {
        let stats = scaled_stats(EnemyKind::Scout, 5);
        // 60 * (1 + 0.15 * 4)
        assert_eq!(stats.health, 96.0);
    }

    #[test]
    fn defense_caps_at_eighty_percent() {
        let stats = scaled_stats(EnemyKind::Armored, 100);
        assert_eq!(stats.defense, DEFENSE_CAP);
    }

    #[test]
    fn damage_respects_defense() {
        let mut enemy = Enemy::from_stats(EnemyKind::Tank, scaled_stats(EnemyKind::Tank, 1));
        let dealt = enemy.take_damage(100.0);
        assert_eq!(dealt, 70.0);
        assert_eq!(enemy.health, 130.0);
    }

    #[test]
    fn freeze_overrides_slow() {
        let mut status = StatusEffects::default();
        status.apply_slow(0.5, 2.0);
        assert_eq!(status.speed_for(4.0), 2.0);
        status.apply_freeze(1.0);
        assert_eq!(status.speed_for(4.0), 0.0);
    }

    #[test]
    fn stronger_slow_wins_on_refresh() {
        let mut status = StatusEffects::default();
        status.apply_slow(0.3, 1.0);
        status.apply_slow(0.6, 3.0);
        assert_eq!(status.slow_multiplier, 0.3);
        assert_eq!(status.slow_remaining, 3.0);
    }

    #[test]
    fn damage_over_time_kills_without_tower_fire() {
        let mut app = App::new();
        app.add_systems(Update, tick_status_effects);

        let poisoned = {
            let mut status = StatusEffects::default();
            status.apply_poison(200.0, 2.0);
            app.world_mut()
                .spawn((
                    Enemy::from_stats(EnemyKind::Scout, scaled_stats(EnemyKind::Scout, 1)),
                    status,
                ))
                .id()
        };
        let burning = {
            let mut status = StatusEffects::default();
            status.apply_burn(200.0, 2.0);
            app.world_mut()
                .spawn((
                    Enemy::from_stats(EnemyKind::Tank, scaled_stats(EnemyKind::Tank, 1)),
                    status,
                ))
                .id()
        };

        // 200 dps for 1.5 simulated seconds outpaces both health pools
        // (the tank's 30% armor only stretches it out).
        for _ in 0..15 {
            app.update();
        }
        assert!(app.world().get::<Enemy>(poisoned).unwrap().is_dead());
        assert!(app.world().get::<Enemy>(burning).unwrap().is_dead());
    }

    #[test]
    fn follower_walks_segments_proportionally() {
        let waypoints = vec![Vec2::new(0.5, 0.5), Vec2::new(2.5, 0.5), Vec2::new(2.5, 3.5)];
        let mut follower = PathFollower::new(waypoints);
        // Hand-advance the way move_enemies does, with 2.5 units of travel:
        // crosses the 2-unit first segment and half a unit into the second.
        let mut travel = 2.5;
        while travel > 0.0 {
            let target = follower.segment + 1;
            let from = follower.waypoints[follower.segment];
            let to = follower.waypoints[target];
            let seg_len = from.distance(to);
            let remaining = (1.0 - follower.progress) * seg_len;
            if travel >= remaining {
                travel -= remaining;
                follower.segment = target;
                follower.progress = 0.0;
                follower.position = to;
            } else {
                follower.progress += travel / seg_len;
                follower.position = from.lerp(to, follower.progress);
                travel = 0.0;
            }
        }
        assert_eq!(follower.segment, 1);
        assert!((follower.position - Vec2::new(2.5, 1.0)).length() < 1e-5);
    }
}
