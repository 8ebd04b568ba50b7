//! Active skills: credit-priced area abilities gated by simulated-time
//! cooldowns.

use bevy::math::Vec2;
use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::combat::hit_damage;
use super::enemy::{Enemy, PathFollower, StatusEffects};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum SkillKind {
    Airstrike,
    Freeze,
    Lightning,
}

#[derive(Debug, Clone, Copy)]
pub enum SkillEffect {
    AreaDamage { damage: f32, radius: f32 },
    AreaFreeze { duration: f32, radius: f32 },
    ChainLightning { damage: f32, max_targets: u32, jump_range: f32, decay: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct SkillSpec {
    pub cost: i64,
    pub cooldown: f32,
    pub effect: SkillEffect,
}

pub fn spec(kind: SkillKind) -> &'static SkillSpec {
    match kind {
        SkillKind::Airstrike => &SkillSpec {
            cost: 100,
            cooldown: 60.0,
            effect: SkillEffect::AreaDamage { damage: 150.0, radius: 2.5 },
        },
        SkillKind::Freeze => &SkillSpec {
            cost: 80,
            cooldown: 45.0,
            effect: SkillEffect::AreaFreeze { duration: 3.0, radius: 3.0 },
        },
        SkillKind::Lightning => &SkillSpec {
            cost: 60,
            cooldown: 30.0,
            effect: SkillEffect::ChainLightning {
                damage: 80.0,
                max_targets: 5,
                jump_range: 1.5,
                decay: 0.8,
            },
        },
    }
}

/// Last-use timestamps against the defense clock.
#[derive(Resource, Debug, Clone, Default)]
pub struct SkillState {
    last_used: HashMap<SkillKind, f32>,
}

impl SkillState {
    pub fn ready(&self, kind: SkillKind, now: f32) -> bool {
        match self.last_used.get(&kind) {
            None => true,
            Some(&at) => now - at >= spec(kind).cooldown,
        }
    }

    pub fn remaining(&self, kind: SkillKind, now: f32) -> f32 {
        match self.last_used.get(&kind) {
            None => 0.0,
            Some(&at) => (spec(kind).cooldown - (now - at)).max(0.0),
        }
    }

    pub fn mark_used(&mut self, kind: SkillKind, now: f32) {
        self.last_used.insert(kind, now);
    }

    pub fn last_used_snapshot(&self) -> Vec<(SkillKind, f32)> {
        self.last_used.iter().map(|(&k, &v)| (k, v)).collect()
    }

    pub fn restore(entries: &[(SkillKind, f32)]) -> Self {
        Self {
            last_used: entries.iter().copied().collect(),
        }
    }
}

/// Apply a skill at the target point. Cooldown/cost gating happens in the
/// defense command executor; this is pure effect application.
pub fn apply_skill(
    kind: SkillKind,
    target: Vec2,
    enemies: &mut Query<(Entity, &mut Enemy, &PathFollower, &mut StatusEffects)>,
) -> u32 {
    let mut affected = 0;
    match spec(kind).effect {
        SkillEffect::AreaDamage { damage, radius } => {
            for (_, mut enemy, follower, _) in enemies.iter_mut() {
                if enemy.is_dead() || follower.position.distance(target) > radius {
                    continue;
                }
                let dealt = hit_damage(damage, enemy.defense);
                enemy.health -= dealt;
                affected += 1;
            }
        }
        SkillEffect::AreaFreeze { duration, radius } => {
            for (_, enemy, follower, mut status) in enemies.iter_mut() {
                if enemy.is_dead() || follower.position.distance(target) > radius {
                    continue;
                }
                status.apply_freeze(duration);
                affected += 1;
            }
        }
        SkillEffect::ChainLightning { damage, max_targets, jump_range, decay } => {
            let mut struck: Vec<Entity> = Vec::new();
            let mut arc_from = target;
            let mut arc_damage = damage;
            while (struck.len() as u32) < max_targets {
                let mut next: Option<(Entity, f32, Vec2)> = None;
                for (entity, enemy, follower, _) in enemies.iter() {
                    if enemy.is_dead() || struck.contains(&entity) {
                        continue;
                    }
                    let distance = arc_from.distance(follower.position);
                    if distance > jump_range {
                        continue;
                    }
                    if next.is_none_or(|(_, best, _)| distance < best) {
                        next = Some((entity, distance, follower.position));
                    }
                }
                let Some((entity, _, position)) = next else {
                    break;
                };
                if let Ok((_, mut enemy, _, _)) = enemies.get_mut(entity) {
                    let dealt = hit_damage(arc_damage, enemy.defense);
                    enemy.health -= dealt;
                }
                struck.push(entity);
                arc_from = position;
                arc_damage *= decay;
                affected += 1;
            }
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_gating_uses_simulated_time() {
        let mut state = SkillState::default();
        assert!(state.ready(SkillKind::Lightning, 0.0));
        state.mark_used(SkillKind::Lightning, 10.0);
        assert!(!state.ready(SkillKind::Lightning, 20.0));
        assert_eq!(state.remaining(SkillKind::Lightning, 20.0), 20.0);
        assert!(state.ready(SkillKind::Lightning, 40.0));
    }

    #[test]
    fn skills_cool_down_independently() {
        let mut state = SkillState::default();
        state.mark_used(SkillKind::Freeze, 5.0);
        assert!(!state.ready(SkillKind::Freeze, 6.0));
        assert!(state.ready(SkillKind::Airstrike, 6.0));
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut state = SkillState::default();
        state.mark_used(SkillKind::Airstrike, 12.0);
        state.mark_used(SkillKind::Freeze, 30.0);
        let restored = SkillState::restore(&state.last_used_snapshot());
        assert!(!restored.ready(SkillKind::Airstrike, 50.0));
        assert!(restored.ready(SkillKind::Airstrike, 80.0));
    }
}
