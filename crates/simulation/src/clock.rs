use bevy::prelude::*;

use crate::config::{DAY_INTERVAL_SECS, SIM_TICK_SECS};

/// Simulated calendar. One "day" is one settlement interval; the game-speed
/// multiplier stretches or shrinks the fixed timestep rather than the
/// per-tick math, so every tick always covers the same simulated span.
#[derive(Resource, Debug, Clone)]
pub struct GameClock {
    pub day: u32,
    pub speed: f32,
    pub paused: bool,
    elapsed_in_day: f32,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            day: 1,
            speed: 1.0,
            paused: false,
            elapsed_in_day: 0.0,
        }
    }
}

impl GameClock {
    /// Rebuild from persisted state; the intra-day phase restarts at zero.
    pub fn restored(day: u32, speed: f32, paused: bool) -> Self {
        Self {
            day,
            speed: speed.clamp(0.1, 5.0),
            paused,
            elapsed_in_day: 0.0,
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(0.1, 5.0);
    }

    /// Advance by one fixed tick; true when a day boundary was crossed.
    pub fn advance_tick(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.elapsed_in_day += SIM_TICK_SECS;
        if self.elapsed_in_day >= DAY_INTERVAL_SECS {
            self.elapsed_in_day -= DAY_INTERVAL_SECS;
            self.day += 1;
            return true;
        }
        false
    }
}

/// Fired once per crossed day boundary, consumed by the settlement system.
#[derive(Event, Debug, Clone, Copy)]
pub struct DayElapsed {
    pub day: u32,
}

pub fn tick_game_clock(mut clock: ResMut<GameClock>, mut days: EventWriter<DayElapsed>) {
    if clock.advance_tick() {
        days.send(DayElapsed { day: clock.day });
    }
}

/// Scale the fixed timestep by game speed: 10 Hz at 1x, 20 Hz at 2x.
pub fn sync_fixed_timestep(clock: Res<GameClock>, mut time: ResMut<Time<Fixed>>) {
    let base = std::time::Duration::from_millis(100);
    let effective = if clock.paused || clock.speed <= 0.0 {
        base
    } else {
        base.div_f32(clock.speed)
    };
    time.set_timestep(effective);
}

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_duration(
            std::time::Duration::from_millis(100),
        ))
        .init_resource::<GameClock>()
            .add_event::<DayElapsed>()
            .add_systems(
                FixedUpdate,
                tick_game_clock.in_set(crate::SimulationSet::PreSim),
            )
            .add_systems(Update, sync_fixed_timestep);
    }
}
