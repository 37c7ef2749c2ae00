//! Conservation verification for the transfer ledger.
//!
//! For every tick T and item definition D:
//!
//! ```text
//! net change across real holders == sources (World) - sinks (Void)
//! ```
//!
//! Each well-formed entry satisfies this by construction; the check guards
//! against entries appended from outside [`Ledger::record`](crate::Ledger::record).

use std::collections::BTreeMap;

use outpost_types::{Holder, LedgerEntry};

use crate::LedgerAnomaly;

/// The result of a conservation check for a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// The ledger is balanced for this tick.
    Balanced,
    /// One or more definitions have imbalanced flows.
    Anomaly(LedgerAnomaly),
}

/// Verify conservation for all entries in `tick`.
pub fn verify_conservation(tick: u64, entries: &[LedgerEntry]) -> ConservationResult {
    // (sources - sinks, credits - debits on real holders)
    let mut flows: BTreeMap<&str, (i64, i64)> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.tick == tick) {
        let count = i64::from(entry.count);
        let slot = flows.entry(entry.def.as_str()).or_insert((0, 0));

        match entry.from {
            Holder::World => slot.0 = slot.0.saturating_add(count),
            Holder::Void => slot.0 = slot.0.saturating_sub(count),
            _ => slot.1 = slot.1.saturating_sub(count),
        }
        match entry.to {
            Holder::Void => slot.0 = slot.0.saturating_sub(count),
            Holder::World => slot.0 = slot.0.saturating_add(count),
            _ => slot.1 = slot.1.saturating_add(count),
        }
    }

    let imbalances: BTreeMap<String, (i64, i64)> = flows
        .into_iter()
        .filter(|(_, (expected, recorded))| expected != recorded)
        .map(|(def, pair)| (def.to_owned(), pair))
        .collect();

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let message = format!(
            "conservation violated at tick {tick} for {} definition(s)",
            imbalances.len()
        );
        tracing::error!(tick, count = imbalances.len(), "ledger anomaly");
        ConservationResult::Anomaly(LedgerAnomaly {
            tick,
            imbalances,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use outpost_types::{LedgerEntryId, OutpostId, TransferKind};

    use super::*;

    fn entry(tick: u64, kind: TransferKind, count: u32, from: Holder, to: Holder) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            tick,
            kind,
            def: String::from("steel"),
            count,
            from,
            to,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn empty_tick_is_balanced() {
        assert_eq!(verify_conservation(7, &[]), ConservationResult::Balanced);
    }

    #[test]
    fn sources_and_sinks_balance() {
        let outpost = Holder::Outpost(OutpostId::new());
        let entries = vec![
            entry(1, TransferKind::Produce, 10, Holder::World, outpost),
            entry(1, TransferKind::Consume, 4, outpost, Holder::Void),
        ];
        assert_eq!(verify_conservation(1, &entries), ConservationResult::Balanced);
    }

    #[test]
    fn other_ticks_are_ignored() {
        let outpost = Holder::Outpost(OutpostId::new());
        let entries = vec![entry(2, TransferKind::Produce, 10, Holder::World, outpost)];
        assert_eq!(verify_conservation(1, &entries), ConservationResult::Balanced);
    }

    #[test]
    fn void_as_source_is_an_anomaly() {
        let outpost = Holder::Outpost(OutpostId::new());
        // Items appearing out of the sink break the law.
        let entries = vec![entry(1, TransferKind::Transfer, 5, Holder::Void, outpost)];
        let result = verify_conservation(1, &entries);
        assert!(matches!(result, ConservationResult::Anomaly(_)));
    }
}
