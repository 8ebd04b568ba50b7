//! Tower targeting, firing, and projectile resolution.

use bevy::math::Vec2;
use bevy::prelude::*;
use rand::Rng;

use crate::config::SIM_TICK_SECS;
use crate::sim_rng::SimRng;

use super::enemy::{Enemy, PathFollower, SpecialBehavior, StatusEffects};
use super::tower::{SlowEffect, TargetPriority, Tower};

/// Simulated combat time; cooldowns and skill timers compare against this,
/// never the wall clock, so tests can step it deterministically.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct DefenseClock {
    pub elapsed: f32,
}

pub fn tick_defense_clock(mut clock: ResMut<DefenseClock>) {
    clock.elapsed += SIM_TICK_SECS;
}

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    /// Re-validated every tick; the projectile dies with its target.
    pub target: Entity,
    pub position: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub slow: Option<SlowEffect>,
    pub aoe_radius: Option<f32>,
    pub crit: Option<(f32, f32)>,
}

/// Hit damage after armor, with the one-point floor that keeps capped
/// defense from zeroing a shot entirely.
pub fn hit_damage(raw: f32, defense: f32) -> f32 {
    (raw * (1.0 - defense)).max(1.0)
}

struct Candidate {
    entity: Entity,
    distance: f32,
    health: f32,
    speed: f32,
    flying: bool,
}

fn pick_target(candidates: &[Candidate], priority: TargetPriority) -> Option<Entity> {
    // Strictly-better comparisons keep the first-found candidate on ties.
    let best = |better: fn(&Candidate, &Candidate) -> bool| -> Option<Entity> {
        let mut iter = candidates.iter();
        let mut chosen = iter.next()?;
        for candidate in iter {
            if better(candidate, chosen) {
                chosen = candidate;
            }
        }
        Some(chosen.entity)
    };
    match priority {
        TargetPriority::Nearest => best(|a, b| a.distance < b.distance),
        TargetPriority::Farthest => best(|a, b| a.distance > b.distance),
        TargetPriority::Strongest => best(|a, b| a.health > b.health),
        TargetPriority::Weakest => best(|a, b| a.health < b.health),
        TargetPriority::Fastest => best(|a, b| a.speed > b.speed),
        TargetPriority::Flying => candidates.iter().find(|c| c.flying).map(|c| c.entity),
        TargetPriority::None => None,
    }
}

/// Fire every ready tower at its preferred target, spawning a homing
/// projectile. Support auras are folded into each tower's effective
/// damage/range/cooldown first.
pub fn tower_fire(
    clock: Res<DefenseClock>,
    mut commands: Commands,
    mut towers: Query<&mut Tower>,
    enemies: Query<(Entity, &Enemy, &PathFollower, &StatusEffects, &SpecialBehavior)>,
) {
    let auras: Vec<(Vec2, f32, super::tower::SupportBuff)> = towers
        .iter()
        .filter_map(|t| {
            let spec = t.spec();
            spec.buff.map(|b| (t.position, spec.range, b))
        })
        .collect();

    for mut tower in &mut towers {
        let spec = tower.spec();
        if spec.priority == TargetPriority::None {
            continue;
        }

        let mut damage = spec.damage;
        let mut range = spec.range;
        let mut cooldown = spec.cooldown;
        for &(aura_pos, aura_range, buff) in &auras {
            if aura_pos != tower.position && aura_pos.distance(tower.position) <= aura_range {
                damage *= 1.0 + buff.damage_bonus;
                range += spec.range * buff.range_bonus;
                cooldown *= 1.0 - buff.cooldown_reduction;
            }
        }

        if clock.elapsed - tower.last_fire < cooldown {
            continue;
        }

        let mut candidates = Vec::new();
        for (entity, enemy, follower, status, behavior) in &enemies {
            if enemy.is_dead() || behavior.stealthed {
                continue;
            }
            if spec.priority == TargetPriority::Flying && !enemy.flying {
                continue;
            }
            if !spec.can_target_ground && !enemy.flying {
                continue;
            }
            let distance = tower.position.distance(follower.position);
            if distance > range {
                continue;
            }
            candidates.push(Candidate {
                entity,
                distance,
                health: enemy.health,
                speed: status.speed_for(enemy.base_speed),
                flying: enemy.flying,
            });
        }

        if let Some(target) = pick_target(&candidates, spec.priority) {
            commands.spawn(Projectile {
                target,
                position: tower.position,
                speed: spec.projectile_speed,
                damage,
                slow: spec.slow,
                aoe_radius: spec.aoe_radius,
                crit: spec.crit,
            });
            tower.last_fire = clock.elapsed;
        }
    }
}

/// Home every projectile on its target; on arrival roll crit, apply slow,
/// and splash AOE damage around the impact point.
pub fn update_projectiles(
    mut commands: Commands,
    mut rng: ResMut<SimRng>,
    mut projectiles: Query<(Entity, &mut Projectile)>,
    mut enemies: Query<(Entity, &mut Enemy, &PathFollower, &mut StatusEffects)>,
) {
    for (proj_entity, mut proj) in &mut projectiles {
        let target_pos = match enemies.get(proj.target) {
            Ok((_, enemy, follower, _)) if !enemy.is_dead() => follower.position,
            _ => {
                commands.entity(proj_entity).despawn();
                continue;
            }
        };

        let distance = proj.position.distance(target_pos);
        let travel = proj.speed * SIM_TICK_SECS;
        if travel < distance {
            let direction = (target_pos - proj.position) / distance;
            proj.position += direction * travel;
            continue;
        }

        // Impact.
        let mut damage = proj.damage;
        if let Some((chance, multiplier)) = proj.crit {
            if rng.0.gen::<f32>() < chance {
                damage *= multiplier;
            }
        }

        if let Some(radius) = proj.aoe_radius {
            for (_, mut enemy, follower, _) in &mut enemies {
                if enemy.is_dead() {
                    continue;
                }
                if follower.position.distance(target_pos) <= radius {
                    let dealt = hit_damage(damage, enemy.defense);
                    enemy.health -= dealt;
                }
            }
        } else if let Ok((_, mut enemy, _, _)) = enemies.get_mut(proj.target) {
            let dealt = hit_damage(damage, enemy.defense);
            enemy.health -= dealt;
        }

        if let Some(slow) = proj.slow {
            if let Ok((_, _, _, mut status)) = enemies.get_mut(proj.target) {
                status.apply_slow(slow.multiplier, slow.duration);
            }
        }

        commands.entity(proj_entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u32, distance: f32, health: f32, speed: f32, flying: bool) -> Candidate {
        Candidate {
            entity: Entity::from_raw(id),
            distance,
            health,
            speed,
            flying,
        }
    }

    #[test]
    fn priorities_pick_the_right_enemy() {
        let candidates = vec![
            candidate(1, 3.0, 50.0, 2.0, false),
            candidate(2, 1.0, 150.0, 4.5, false),
            candidate(3, 2.0, 20.0, 1.0, true),
        ];
        assert_eq!(
            pick_target(&candidates, TargetPriority::Nearest),
            Some(Entity::from_raw(2))
        );
        assert_eq!(
            pick_target(&candidates, TargetPriority::Farthest),
            Some(Entity::from_raw(1))
        );
        assert_eq!(
            pick_target(&candidates, TargetPriority::Strongest),
            Some(Entity::from_raw(2))
        );
        assert_eq!(
            pick_target(&candidates, TargetPriority::Weakest),
            Some(Entity::from_raw(3))
        );
        assert_eq!(
            pick_target(&candidates, TargetPriority::Fastest),
            Some(Entity::from_raw(2))
        );
        assert_eq!(
            pick_target(&candidates, TargetPriority::Flying),
            Some(Entity::from_raw(3))
        );
        assert_eq!(pick_target(&candidates, TargetPriority::None), None);
    }

    #[test]
    fn flying_priority_without_flyers_holds_fire() {
        let candidates = vec![candidate(1, 1.0, 10.0, 1.0, false)];
        assert_eq!(pick_target(&candidates, TargetPriority::Flying), None);
    }

    #[test]
    fn ties_keep_first_found() {
        let candidates = vec![
            candidate(7, 2.0, 100.0, 3.0, false),
            candidate(8, 2.0, 100.0, 3.0, false),
        ];
        assert_eq!(
            pick_target(&candidates, TargetPriority::Nearest),
            Some(Entity::from_raw(7))
        );
    }

    #[test]
    fn hit_damage_floors_at_one() {
        assert_eq!(hit_damage(100.0, 0.3), 70.0);
        assert_eq!(hit_damage(2.0, 0.8), 1.0);
    }
}
