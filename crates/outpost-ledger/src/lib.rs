//! Item transfer ledger for the outpost simulation.
//!
//! Every item movement the engine performs is recorded here: production,
//! loot, caravan exchanges, deliveries, meals, medicine, and creation costs.
//! Items enter only from [`Holder::World`] and leave only into
//! [`Holder::Void`]; everything else is a transfer between two real holders.
//!
//! # Modules
//!
//! - [`ledger`] -- The [`Ledger`] struct: append-only log with recording methods.
//! - [`conservation`] -- Per-tick conservation verification.
//!
//! # Entry kinds
//!
//! | Kind | From | To |
//! |------|------|----|
//! | Produce | World | holder |
//! | Loot | World | holder |
//! | Transfer | holder | holder |
//! | Deliver | holder | settlement |
//! | Consume | holder | Void |
//! | Cost | holder | Void |
//!
//! # Usage
//!
//! ```
//! use outpost_ledger::{ConservationResult, Ledger};
//! use outpost_types::{Holder, OutpostId, TransferKind};
//!
//! let mut ledger = Ledger::new();
//! let outpost = Holder::Outpost(OutpostId::new());
//!
//! ledger.record(1, TransferKind::Produce, "steel", 75, Holder::World, outpost).ok();
//! ledger.record(1, TransferKind::Consume, "steel", 5, outpost, Holder::Void).ok();
//!
//! assert_eq!(ledger.net_flow(outpost, "steel"), 70);
//! assert_eq!(ledger.verify_conservation(1), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod ledger;

pub use conservation::ConservationResult;
pub use ledger::Ledger;

use std::collections::BTreeMap;

use outpost_types::{Holder, TransferKind};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Count must be strictly positive.
    #[error("ledger entry count must be non-zero")]
    ZeroCount,

    /// The holders do not fit the entry kind.
    #[error("invalid holders for {kind:?}: {from:?} -> {to:?}")]
    InvalidHolders {
        /// The entry kind being validated.
        kind: TransferKind,
        /// Source holder.
        from: Holder,
        /// Destination holder.
        to: Holder,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected during tick verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The tick where the anomaly was detected.
    pub tick: u64,
    /// Per-definition imbalance: (expected net change, recorded net change).
    pub imbalances: BTreeMap<String, (i64, i64)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}
