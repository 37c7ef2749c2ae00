//! Per-call context threaded through outpost operations.
//!
//! Trackers are plain data; everything they need from the outside world
//! (host, settings, catalog, randomness, ledger) arrives through a
//! [`TickContext`]. Events and newly spawned transports are collected on
//! the context and drained by the registry after the call.

use rand::rngs::SmallRng;
use rust_decimal::Decimal;
use tracing::warn;

use outpost_agents::{DeathCause, NeedsConfig};
use outpost_ledger::Ledger;
use outpost_types::{
    AgentId, CaravanId, DeliveryMethod, FactionId, Holder, ItemCatalog, ItemStack, OutpostId,
    SettlementId, TransferKind,
};
use outpost_world::HostWorld;

use crate::delivery::transport::TransportJob;
use crate::settings::OutpostsSettings;

/// Something notable that happened to an outpost during a call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutpostEvent {
    /// A production cycle completed.
    Produced {
        /// The producing outpost.
        outpost: OutpostId,
        /// Total items produced.
        items: u32,
    },
    /// Items left the outpost for a settlement, or were stored locally.
    Delivered {
        /// The delivering outpost.
        outpost: OutpostId,
        /// The method actually used.
        method: DeliveryMethod,
        /// Destination, `None` when stored locally.
        destination: Option<SettlementId>,
        /// Total items delivered.
        items: u32,
    },
    /// The outpost packed up into a caravan.
    Converted {
        /// The former outpost.
        outpost: OutpostId,
        /// The caravan formed, if any occupant was left to form one.
        caravan: Option<CaravanId>,
    },
    /// The last occupant died and the outpost was abandoned.
    Abandoned {
        /// The abandoned outpost.
        outpost: OutpostId,
    },
    /// Every player-aligned agent was lost during an incursion.
    Lost {
        /// The lost outpost.
        outpost: OutpostId,
    },
    /// An occupant died.
    AgentDied {
        /// The outpost the agent lived in.
        outpost: OutpostId,
        /// The dead agent.
        agent: AgentId,
        /// Cause, when the needs tracker detected it.
        cause: Option<DeathCause>,
    },
    /// A hostile incursion began.
    RaidStarted {
        /// The attacked outpost.
        outpost: OutpostId,
        /// The attacking faction.
        faction: FactionId,
        /// Resolved raid points.
        points: f32,
    },
    /// An incursion was repelled.
    RaidWon {
        /// The defended outpost.
        outpost: OutpostId,
        /// Market value of everything secured.
        loot_value: Decimal,
    },
}

/// Everything an outpost operation may touch outside the outpost itself.
pub struct TickContext<'a> {
    /// The host world.
    pub world: &'a mut dyn HostWorld,
    /// Global settings.
    pub settings: &'a OutpostsSettings,
    /// Needs tunables.
    pub needs: &'a NeedsConfig,
    /// Item definitions.
    pub catalog: &'a ItemCatalog,
    /// The single seeded generator for the run.
    pub rng: &'a mut SmallRng,
    /// The transfer ledger.
    pub ledger: &'a mut Ledger,
    /// Current tick.
    pub tick: u64,
    /// Events raised during the call.
    pub events: Vec<OutpostEvent>,
    /// Pack-animal transports spawned during the call.
    pub transports: Vec<TransportJob>,
}

impl<'a> TickContext<'a> {
    /// A context with no pending events or transports.
    pub const fn new(
        world: &'a mut dyn HostWorld,
        settings: &'a OutpostsSettings,
        needs: &'a NeedsConfig,
        catalog: &'a ItemCatalog,
        rng: &'a mut SmallRng,
        ledger: &'a mut Ledger,
        tick: u64,
    ) -> Self {
        Self {
            world,
            settings,
            needs,
            catalog,
            rng,
            ledger,
            tick,
            events: Vec::new(),
            transports: Vec::new(),
        }
    }

    /// Record one movement. Ledger rejections are logged, never raised.
    pub fn record(&mut self, kind: TransferKind, def: &str, count: u32, from: Holder, to: Holder) {
        if count == 0 {
            return;
        }
        if let Err(err) = self.ledger.record(self.tick, kind, def, count, from, to) {
            warn!(error = %err, def, count, "ledger rejected entry");
        }
    }

    /// Record the movement of every stack in `stacks`.
    pub fn record_stacks(
        &mut self,
        kind: TransferKind,
        stacks: &[ItemStack],
        from: Holder,
        to: Holder,
    ) {
        for stack in stacks {
            self.record(kind, &stack.def, stack.count, from, to);
        }
    }

    /// Queue an event.
    pub fn emit(&mut self, event: OutpostEvent) {
        self.events.push(event);
    }
}

/// Sum of stack counts.
pub fn total_count(stacks: &[ItemStack]) -> u32 {
    stacks.iter().fold(0u32, |acc, s| acc.saturating_add(s.count))
}
