use bevy::prelude::*;

use crate::clock::DayElapsed;
use crate::config::STARTING_CREDITS;
use crate::grid::CityGrid;
use crate::metrics::{compute_metrics, CityMetrics};
use crate::stability::{settle_stability, Stability};

#[derive(Resource, Debug, Clone)]
pub struct PlayerCredits {
    pub balance: i64,
    /// Lifetime income, used by progression conditions. Spending does not
    /// reduce it.
    pub total_earned: i64,
}

impl Default for PlayerCredits {
    fn default() -> Self {
        Self {
            balance: STARTING_CREDITS,
            total_earned: 0,
        }
    }
}

impl PlayerCredits {
    pub fn can_afford(&self, cost: i64) -> bool {
        self.balance >= cost
    }

    pub fn spend(&mut self, cost: i64) {
        self.balance -= cost;
    }

    pub fn deposit(&mut self, amount: i64) {
        self.balance += amount;
        if amount > 0 {
            self.total_earned += amount;
        }
    }
}

/// Day settlement: recompute metrics from the live grid, credit the day's
/// income, then drift stability. Runs once per [`DayElapsed`].
pub fn settle_day(
    mut days: EventReader<DayElapsed>,
    grid: Res<CityGrid>,
    mut metrics: ResMut<CityMetrics>,
    mut credits: ResMut<PlayerCredits>,
    mut stability: ResMut<Stability>,
) {
    for _ in days.read() {
        *metrics = compute_metrics(&grid, stability.value);
        credits.deposit(metrics.daily_income);
        settle_stability(&mut stability, &metrics);
    }
}

pub struct EconomyPlugin;

impl Plugin for EconomyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerCredits>()
            .init_resource::<Stability>()
            .add_systems(
                FixedUpdate,
                settle_day.in_set(crate::SimulationSet::Simulation),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_balance() {
        let credits = PlayerCredits::default();
        assert_eq!(credits.balance, STARTING_CREDITS);
        assert_eq!(credits.total_earned, 0);
    }

    #[test]
    fn total_earned_tracks_income_only() {
        let mut credits = PlayerCredits::default();
        credits.deposit(500);
        credits.spend(300);
        credits.deposit(200);
        assert_eq!(credits.balance, STARTING_CREDITS + 400);
        assert_eq!(credits.total_earned, 700);
    }
}
