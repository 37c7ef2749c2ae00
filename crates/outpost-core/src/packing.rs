//! Packing tracker: the countdown that turns an outpost back into a caravan.

use serde::{Deserialize, Serialize};

use crate::error::OutpostError;
use crate::settings::OutpostsSettings;

/// Packing state of one outpost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PackingState {
    /// Not packing.
    #[default]
    Idle,
    /// Packing; the outpost converts when the countdown reaches zero.
    Packing {
        /// Ticks left.
        ticks_remaining: u64,
    },
}

/// Packing duration for `occupants` agents: `base / occupants`.
pub fn ticks_to_pack(base: u64, occupants: usize) -> u64 {
    let divisor = u64::try_from(occupants.max(1)).unwrap_or(u64::MAX);
    base.checked_div(divisor).unwrap_or(base)
}

impl PackingState {
    /// Whether a countdown is running.
    pub const fn is_packing(&self) -> bool {
        matches!(self, Self::Packing { .. })
    }

    /// Ticks left, when packing.
    pub const fn ticks_remaining(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Packing { ticks_remaining } => Some(*ticks_remaining),
        }
    }

    /// Start packing. Returns the scaled countdown.
    pub fn start(
        &mut self,
        base: u64,
        occupants: usize,
        settings: &OutpostsSettings,
    ) -> Result<u64, OutpostError> {
        if self.is_packing() {
            return Err(OutpostError::AlreadyPacking);
        }
        let ticks = settings.scale_ticks(ticks_to_pack(base, occupants)).max(1);
        *self = Self::Packing {
            ticks_remaining: ticks,
        };
        Ok(ticks)
    }

    /// Stop packing.
    pub fn cancel(&mut self) -> Result<(), OutpostError> {
        if !self.is_packing() {
            return Err(OutpostError::NotPacking);
        }
        *self = Self::Idle;
        Ok(())
    }

    /// Set the countdown directly, starting packing if idle.
    pub const fn force(&mut self, ticks: u64) {
        *self = Self::Packing {
            ticks_remaining: ticks,
        };
    }

    /// Advance one tick. Returns `true` when packing completes.
    pub const fn advance(&mut self) -> bool {
        match self {
            Self::Idle => false,
            Self::Packing { ticks_remaining } => {
                *ticks_remaining = ticks_remaining.saturating_sub(1);
                *ticks_remaining == 0
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn more_occupants_pack_faster() {
        assert_eq!(ticks_to_pack(420_000, 1), 420_000);
        assert_eq!(ticks_to_pack(420_000, 2), 210_000);
        assert!(ticks_to_pack(420_000, 3) < ticks_to_pack(420_000, 2));
        assert_eq!(ticks_to_pack(420_000, 0), 420_000);
    }

    #[test]
    fn start_cancel_and_complete() {
        let settings = OutpostsSettings::default();
        let mut state = PackingState::Idle;
        assert!(matches!(state.cancel(), Err(OutpostError::NotPacking)));
        assert_eq!(state.start(6, 2, &settings).unwrap(), 3);
        assert!(matches!(
            state.start(6, 2, &settings),
            Err(OutpostError::AlreadyPacking)
        ));
        assert!(!state.advance());
        assert!(!state.advance());
        assert!(state.advance());

        state.cancel().unwrap();
        assert_eq!(state, PackingState::Idle);
        assert!(!state.advance());
    }

    #[test]
    fn time_multiplier_scales_countdown() {
        let settings = OutpostsSettings {
            time_multiplier: 0.5,
            ..OutpostsSettings::default()
        };
        let mut state = PackingState::Idle;
        assert_eq!(state.start(420_000, 1, &settings).unwrap(), 210_000);
        assert_eq!(state.ticks_remaining(), Some(210_000));
    }
}
