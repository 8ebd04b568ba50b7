//! Tower types, their three-level stat tables, and placement bookkeeping.

use bevy::math::Vec2;
use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum TowerKind {
    Basic,
    Slow,
    Aoe,
    Sniper,
    Support,
    AntiAir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPriority {
    Nearest,
    Farthest,
    Strongest,
    Weakest,
    Fastest,
    Flying,
    /// Support towers never fire.
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct SlowEffect {
    pub multiplier: f32,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct SupportBuff {
    pub damage_bonus: f32,
    pub range_bonus: f32,
    pub cooldown_reduction: f32,
}

/// One tower level's stats. `cost` is what this level costs to reach (the
/// build price at level 1, the upgrade price beyond).
#[derive(Debug, Clone, Copy)]
pub struct TowerLevel {
    pub cost: i64,
    pub damage: f32,
    pub range: f32,
    pub cooldown: f32,
    pub projectile_speed: f32,
    pub priority: TargetPriority,
    pub can_target_ground: bool,
    pub slow: Option<SlowEffect>,
    pub aoe_radius: Option<f32>,
    pub crit: Option<(f32, f32)>,
    pub buff: Option<SupportBuff>,
}

const fn level(
    cost: i64,
    damage: f32,
    range: f32,
    cooldown: f32,
    projectile_speed: f32,
    priority: TargetPriority,
) -> TowerLevel {
    TowerLevel {
        cost,
        damage,
        range,
        cooldown,
        projectile_speed,
        priority,
        can_target_ground: true,
        slow: None,
        aoe_radius: None,
        crit: None,
        buff: None,
    }
}

static BASIC: [TowerLevel; 3] = [
    level(100, 20.0, 3.5, 1.0, 8.0, TargetPriority::Nearest),
    level(150, 40.0, 4.0, 0.9, 8.0, TargetPriority::Nearest),
    level(250, 80.0, 4.5, 0.8, 8.0, TargetPriority::Nearest),
];

static SLOW: [TowerLevel; 3] = [
    TowerLevel {
        slow: Some(SlowEffect { multiplier: 0.5, duration: 2.0 }),
        ..level(120, 5.0, 3.0, 1.2, 6.0, TargetPriority::Fastest)
    },
    TowerLevel {
        slow: Some(SlowEffect { multiplier: 0.4, duration: 2.5 }),
        ..level(180, 10.0, 3.5, 1.0, 6.0, TargetPriority::Fastest)
    },
    TowerLevel {
        slow: Some(SlowEffect { multiplier: 0.3, duration: 3.0 }),
        ..level(300, 20.0, 4.0, 0.8, 6.0, TargetPriority::Fastest)
    },
];

static AOE: [TowerLevel; 3] = [
    TowerLevel {
        aoe_radius: Some(1.5),
        ..level(150, 30.0, 3.0, 2.0, 5.0, TargetPriority::Strongest)
    },
    TowerLevel {
        aoe_radius: Some(2.0),
        ..level(250, 60.0, 3.5, 1.8, 5.0, TargetPriority::Strongest)
    },
    TowerLevel {
        aoe_radius: Some(2.5),
        ..level(400, 120.0, 4.0, 1.5, 5.0, TargetPriority::Strongest)
    },
];

static SNIPER: [TowerLevel; 3] = [
    TowerLevel {
        crit: Some((0.2, 2.0)),
        ..level(200, 100.0, 6.0, 2.5, 15.0, TargetPriority::Strongest)
    },
    TowerLevel {
        crit: Some((0.25, 2.5)),
        ..level(350, 200.0, 7.0, 2.2, 15.0, TargetPriority::Strongest)
    },
    TowerLevel {
        crit: Some((0.3, 3.0)),
        ..level(600, 400.0, 8.0, 2.0, 15.0, TargetPriority::Strongest)
    },
];

static SUPPORT: [TowerLevel; 3] = [
    TowerLevel {
        buff: Some(SupportBuff {
            damage_bonus: 0.2,
            range_bonus: 0.1,
            cooldown_reduction: 0.1,
        }),
        ..level(100, 0.0, 3.0, 0.0, 0.0, TargetPriority::None)
    },
    TowerLevel {
        buff: Some(SupportBuff {
            damage_bonus: 0.3,
            range_bonus: 0.15,
            cooldown_reduction: 0.15,
        }),
        ..level(180, 0.0, 3.5, 0.0, 0.0, TargetPriority::None)
    },
    TowerLevel {
        buff: Some(SupportBuff {
            damage_bonus: 0.5,
            range_bonus: 0.2,
            cooldown_reduction: 0.2,
        }),
        ..level(300, 0.0, 4.0, 0.0, 0.0, TargetPriority::None)
    },
];

static ANTI_AIR: [TowerLevel; 3] = [
    TowerLevel {
        can_target_ground: false,
        ..level(130, 40.0, 4.5, 0.8, 12.0, TargetPriority::Flying)
    },
    TowerLevel {
        can_target_ground: false,
        ..level(200, 80.0, 5.0, 0.7, 12.0, TargetPriority::Flying)
    },
    TowerLevel {
        can_target_ground: false,
        ..level(350, 160.0, 5.5, 0.6, 12.0, TargetPriority::Flying)
    },
];

pub fn levels(kind: TowerKind) -> &'static [TowerLevel; 3] {
    match kind {
        TowerKind::Basic => &BASIC,
        TowerKind::Slow => &SLOW,
        TowerKind::Aoe => &AOE,
        TowerKind::Sniper => &SNIPER,
        TowerKind::Support => &SUPPORT,
        TowerKind::AntiAir => &ANTI_AIR,
    }
}

pub fn level_spec(kind: TowerKind, level: u8) -> Option<&'static TowerLevel> {
    levels(kind).get(level as usize - 1)
}

pub fn build_cost(kind: TowerKind) -> i64 {
    levels(kind)[0].cost
}

/// Cost of the next level, `None` at the cap.
pub fn upgrade_cost(kind: TowerKind, current_level: u8) -> Option<i64> {
    level_spec(kind, current_level + 1).map(|l| l.cost)
}

/// Half of everything invested so far.
pub fn sell_refund(kind: TowerKind, current_level: u8) -> i64 {
    let invested: i64 = levels(kind)
        .iter()
        .take(current_level as usize)
        .map(|l| l.cost)
        .sum();
    (invested as f64 * 0.5).floor() as i64
}

#[derive(Component, Debug, Clone)]
pub struct Tower {
    pub kind: TowerKind,
    pub level: u8,
    pub cell: (usize, usize),
    pub position: Vec2,
    /// Defense-clock timestamp of the last shot.
    pub last_fire: f32,
}

impl Tower {
    pub fn spec(&self) -> &'static TowerLevel {
        level_spec(self.kind, self.level).expect("tower level always in 1..=3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_levels_everywhere() {
        for kind in [
            TowerKind::Basic,
            TowerKind::Slow,
            TowerKind::Aoe,
            TowerKind::Sniper,
            TowerKind::Support,
            TowerKind::AntiAir,
        ] {
            assert_eq!(levels(kind).len(), 3);
            assert!(level_spec(kind, 4).is_none());
        }
    }

    #[test]
    fn upgrade_cost_walks_the_table() {
        assert_eq!(upgrade_cost(TowerKind::Basic, 1), Some(150));
        assert_eq!(upgrade_cost(TowerKind::Basic, 2), Some(250));
        assert_eq!(upgrade_cost(TowerKind::Basic, 3), None);
    }

    #[test]
    fn sell_refund_is_half_of_invested() {
        assert_eq!(sell_refund(TowerKind::Basic, 1), 50);
        // 100 + 150 + 250 invested at level 3.
        assert_eq!(sell_refund(TowerKind::Basic, 3), 250);
    }

    #[test]
    fn support_towers_never_fire() {
        let spec = level_spec(TowerKind::Support, 1).unwrap();
        assert_eq!(spec.priority, TargetPriority::None);
        assert_eq!(spec.damage, 0.0);
        assert!(spec.buff.is_some());
    }

    #[test]
    fn anti_air_skips_ground() {
        for spec in levels(TowerKind::AntiAir) {
            assert!(!spec.can_target_ground);
            assert_eq!(spec.priority, TargetPriority::Flying);
        }
    }
}
