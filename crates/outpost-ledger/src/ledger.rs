//! The ledger: an append-only log of item movements.

use chrono::Utc;

use outpost_types::{Holder, LedgerEntry, LedgerEntryId, TransferKind};

use crate::LedgerError;
use crate::conservation::{ConservationResult, verify_conservation};

/// Append-only record of every item movement in a simulation run.
#[derive(Debug, Default)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

/// Returns `true` if `from -> to` is a legal pairing for `kind`.
const fn holders_fit(kind: TransferKind, from: Holder, to: Holder) -> bool {
    match kind {
        TransferKind::Produce | TransferKind::Loot => {
            matches!(from, Holder::World) && !to.is_external()
        }
        TransferKind::Transfer => !from.is_external() && !to.is_external(),
        TransferKind::Deliver => !from.is_external() && matches!(to, Holder::Settlement(_)),
        TransferKind::Consume | TransferKind::Cost => {
            !from.is_external() && matches!(to, Holder::Void)
        }
    }
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a pre-built entry, e.g. one restored from a save.
    pub fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Record an item movement.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroCount`] for an empty movement and
    /// [`LedgerError::InvalidHolders`] when the holders do not fit `kind`.
    pub fn record(
        &mut self,
        tick: u64,
        kind: TransferKind,
        def: &str,
        count: u32,
        from: Holder,
        to: Holder,
    ) -> Result<LedgerEntryId, LedgerError> {
        if count == 0 {
            return Err(LedgerError::ZeroCount);
        }
        if from == to || !holders_fit(kind, from, to) {
            return Err(LedgerError::InvalidHolders { kind, from, to });
        }
        let id = LedgerEntryId::new();
        self.entries.push(LedgerEntry {
            id,
            tick,
            kind,
            def: def.to_owned(),
            count,
            from,
            to,
            recorded_at: Utc::now(),
        });
        Ok(id)
    }

    /// Return all entries for a given tick.
    pub fn entries_for_tick(&self, tick: u64) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return every entry, in insertion order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Net number of `def` items that have flowed into `holder` (negative
    /// when more left than arrived).
    pub fn net_flow(&self, holder: Holder, def: &str) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.def == def)
            .fold(0i64, |acc, e| {
                let count = i64::from(e.count);
                if e.to == holder {
                    acc.saturating_add(count)
                } else if e.from == holder {
                    acc.saturating_sub(count)
                } else {
                    acc
                }
            })
    }

    /// Total of `def` recorded under `kind`, across all ticks.
    pub fn total_of_kind(&self, kind: TransferKind, def: &str) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.def == def)
            .fold(0u64, |acc, e| acc.saturating_add(u64::from(e.count)))
    }

    /// Verify conservation for one tick.
    pub fn verify_conservation(&self, tick: u64) -> ConservationResult {
        verify_conservation(tick, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use outpost_types::{AgentId, CaravanId, OutpostId, SettlementId};

    use super::*;

    #[test]
    fn rejects_zero_counts() {
        let mut ledger = Ledger::new();
        let result = ledger.record(
            1,
            TransferKind::Produce,
            "steel",
            0,
            Holder::World,
            Holder::Outpost(OutpostId::new()),
        );
        assert!(matches!(result, Err(LedgerError::ZeroCount)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn rejects_mismatched_holders() {
        let mut ledger = Ledger::new();
        let outpost = Holder::Outpost(OutpostId::new());
        assert!(
            ledger
                .record(1, TransferKind::Transfer, "steel", 3, Holder::World, outpost)
                .is_err()
        );
        assert!(
            ledger
                .record(1, TransferKind::Consume, "steel", 3, outpost, outpost)
                .is_err()
        );
        assert!(
            ledger
                .record(1, TransferKind::Deliver, "steel", 3, outpost, Holder::Void)
                .is_err()
        );
        assert!(
            ledger
                .record(
                    1,
                    TransferKind::Deliver,
                    "steel",
                    3,
                    outpost,
                    Holder::Settlement(SettlementId::new())
                )
                .is_ok()
        );
    }

    #[test]
    fn net_flow_tracks_transfers() {
        let mut ledger = Ledger::new();
        let outpost = Holder::Outpost(OutpostId::new());
        let caravan = Holder::Caravan(CaravanId::new());
        let agent = Holder::Agent(AgentId::new());
        ledger
            .record(1, TransferKind::Transfer, "silver", 100, caravan, outpost)
            .ok();
        ledger
            .record(2, TransferKind::Transfer, "silver", 40, outpost, agent)
            .ok();
        assert_eq!(ledger.net_flow(outpost, "silver"), 60);
        assert_eq!(ledger.net_flow(caravan, "silver"), -100);
        assert_eq!(ledger.net_flow(agent, "silver"), 40);
        assert_eq!(ledger.net_flow(agent, "gold"), 0);
        assert_eq!(ledger.entries_for_tick(2).len(), 1);
        assert_eq!(ledger.total_of_kind(TransferKind::Transfer, "silver"), 140);
    }
}
