//! City stability: a 0..=100 value nudged once per settlement by service
//! coverage, unemployment, pollution and power deficit.

use bevy::prelude::*;

use crate::config::DAY_INTERVAL_SECS;
use crate::metrics::CityMetrics;

/// Per-second base rates; each settlement applies them scaled by the
/// settlement interval.
pub mod rates {
    pub const DEFAULT_CHANGE: f32 = 0.1;
    pub const SERVICE_BONUS: f32 = 0.06;
    pub const UNEMPLOYMENT_PENALTY: f32 = 0.4;
    pub const POLLUTION_THRESHOLD: f32 = 60.0;
    pub const POLLUTION_PENALTY: f32 = 0.15;
    pub const POWER_DEFICIT_PENALTY: f32 = 0.6;
}

#[derive(Resource, Debug, Clone)]
pub struct Stability {
    pub value: f32,
    /// Last computed per-settlement delta, kept for UI readout.
    pub change_rate: f32,
}

impl Default for Stability {
    fn default() -> Self {
        Self {
            value: 100.0,
            change_rate: 0.0,
        }
    }
}

impl Stability {
    pub fn clamp(&mut self) {
        self.value = self.value.clamp(0.0, 100.0);
    }

    /// One-time additive bump (tech effects), clamped.
    pub fn bump(&mut self, amount: f32) {
        self.value += amount;
        self.clamp();
    }
}

fn interval_rate(per_second: f32) -> f32 {
    per_second * DAY_INTERVAL_SECS
}

/// The per-settlement stability delta for the given metrics snapshot.
pub fn stability_rate(metrics: &CityMetrics) -> f32 {
    let mut rate = rates::DEFAULT_CHANGE;

    rate += metrics.service_buildings as f32 * interval_rate(rates::SERVICE_BONUS);

    let job_surplus = metrics.total_jobs - metrics.housing_capacity;
    if job_surplus > 0.0 && metrics.housing_capacity > 0.0 {
        let unemployment_ratio = job_surplus / metrics.housing_capacity;
        rate -= unemployment_ratio * interval_rate(rates::UNEMPLOYMENT_PENALTY);
    }

    if metrics.pollution_total > rates::POLLUTION_THRESHOLD {
        let pollution_factor = metrics.pollution_total / rates::POLLUTION_THRESHOLD;
        rate -= pollution_factor * pollution_factor * interval_rate(rates::POLLUTION_PENALTY);
    }

    let power_deficit = metrics.power_used - metrics.power_capacity;
    if power_deficit > 0.0 && metrics.power_capacity > 0.0 {
        let deficit_ratio = power_deficit / metrics.power_capacity;
        rate -= deficit_ratio * interval_rate(rates::POWER_DEFICIT_PENALTY);
    }

    // A degenerate grid must never poison the value itself.
    if !rate.is_finite() {
        return 0.0;
    }
    rate
}

/// Compute and apply one settlement's worth of drift.
pub fn settle_stability(stability: &mut Stability, metrics: &CityMetrics) {
    stability.change_rate = stability_rate(metrics);
    stability.value += stability.change_rate;
    stability.clamp();
}
