//! Configuration constants and defaults for occupant needs and health.
//!
//! The [`NeedsConfig`] struct bundles every tunable so that the needs
//! tracker and tests can override defaults. It is deserialized from the
//! `needs` section of `outposts-config.yaml`.

use serde::Deserialize;

/// Ticks in one in-game day.
pub const TICKS_PER_DAY: u64 = 60_000;

/// Ticks in one in-game hour.
pub const TICKS_PER_HOUR: u64 = 2_500;

/// Tunables for the needs and health simulation of abstracted occupants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Fraction of normal rest gain while sleeping at an outpost (default: 0.75).
    pub rest_effectiveness: f32,

    /// Food level lost per tick (default: 0.000026, about 1.5 per day).
    pub food_fall_per_tick: f32,

    /// Rest level lost per waking tick (default: 0.000016).
    pub rest_fall_per_tick: f32,

    /// Rest level gained per sleeping tick before effectiveness (default: 0.000057).
    pub rest_gain_per_tick: f32,

    /// Malnutrition severity gained per tick at zero food (default: 0.000005).
    pub malnutrition_per_tick: f32,

    /// Local hour at which night rest begins (default: 23).
    pub night_start_hour: u32,

    /// Local hour at which night rest ends (default: 5).
    pub night_end_hour: u32,

    /// Ticks between meals (default: 300).
    pub eat_interval: u64,

    /// Ticks between tending and healing passes (default: 600).
    pub health_interval: u64,

    /// Injury hit points healed per healing pass (default: 1.0).
    pub heal_per_pass: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            rest_effectiveness: 0.75,
            food_fall_per_tick: 0.000_026,
            rest_fall_per_tick: 0.000_016,
            rest_gain_per_tick: 0.000_057,
            malnutrition_per_tick: 0.000_005,
            night_start_hour: 23,
            night_end_hour: 5,
            eat_interval: 300,
            health_interval: 600,
            heal_per_pass: 1.0,
        }
    }
}
