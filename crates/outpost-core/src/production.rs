//! Production tracker: the countdown between production cycles.
//!
//! The countdown only runs while the outpost is not packing. A new outpost
//! starts with a full countdown so it never produces on its first tick.

use serde::{Deserialize, Serialize};

use crate::settings::OutpostsSettings;

/// Countdown to the next production cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionTracker {
    ticks_until_production: u64,
}

impl ProductionTracker {
    /// A tracker with a full countdown for `period`.
    pub fn new(period: u64, settings: &OutpostsSettings) -> Self {
        let mut tracker = Self::default();
        tracker.reset(period, settings);
        tracker
    }

    /// Ticks left until the next cycle.
    pub const fn ticks_until_production(self) -> u64 {
        self.ticks_until_production
    }

    /// Restart the countdown at `period` scaled by the time multiplier.
    pub fn reset(&mut self, period: u64, settings: &OutpostsSettings) {
        self.ticks_until_production = settings.scale_ticks(period).max(1);
    }

    /// Set the countdown directly.
    pub const fn set(&mut self, ticks: u64) {
        self.ticks_until_production = ticks;
    }

    /// Advance one tick. Returns `true` when a cycle is due; the countdown
    /// has already been reset by then.
    pub fn advance(&mut self, period: u64, packing: bool, settings: &OutpostsSettings) -> bool {
        if packing || period == 0 {
            return false;
        }
        self.ticks_until_production = self.ticks_until_production.saturating_sub(1);
        if self.ticks_until_production > 0 {
            return false;
        }
        self.reset(period, settings);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_scaled_period() {
        let settings = OutpostsSettings {
            time_multiplier: 0.5,
            ..OutpostsSettings::default()
        };
        let mut tracker = ProductionTracker::new(200, &settings);
        let fired: Vec<u32> = (1..=300u32)
            .filter(|_| tracker.advance(200, false, &settings))
            .collect();
        assert_eq!(fired, vec![100, 200, 300]);
    }

    #[test]
    fn paused_while_packing() {
        let settings = OutpostsSettings::default();
        let mut tracker = ProductionTracker::new(10, &settings);
        for _ in 0..50 {
            assert!(!tracker.advance(10, true, &settings));
        }
        assert_eq!(tracker.ticks_until_production(), 10);
    }

    #[test]
    fn zero_period_never_fires() {
        let settings = OutpostsSettings::default();
        let mut tracker = ProductionTracker::default();
        assert!(!tracker.advance(0, false, &settings));
    }
}
