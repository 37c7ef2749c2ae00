//! Pack-animal transports walking deliveries into a settlement.
//!
//! A transport is a small state machine driven once per tick:
//!
//! ```text
//! Travel --(arrived | harmed)--> Drop --(emptied)--> ExitMap --> Finished
//!                                 |  ^
//!                    (60 ticks)   v  | (arrived)
//!                              GotoDropLoc
//! ```
//!
//! Cargo is written to the ledger as delivered once the animal has dropped
//! all of it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use outpost_types::{AgentId, Cell, Holder, OutpostId, SettlementId, TransferKind, TransportId};
use outpost_world::{DeliveryMap, WorldError};

use crate::context::TickContext;

/// Ticks a transport spends trying to unload before moving to a new spot.
pub const DROP_BUDGET_TICKS: u32 = 60;

/// Where a transport is in its delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum TransportStage {
    /// Walking to the delivery cell.
    Travel,
    /// Unloading.
    Drop {
        /// Ticks spent unloading here.
        ticks: u32,
    },
    /// The drop area was full; walking to a roomier cell.
    GotoDropLoc {
        /// The new drop cell.
        target: Cell,
    },
    /// Walking back off the map.
    ExitMap,
    /// Gone.
    Finished,
}

/// One pack animal carrying a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportJob {
    /// Unique id.
    pub id: TransportId,
    /// The sending outpost.
    pub outpost: OutpostId,
    /// The receiving settlement.
    pub settlement: SettlementId,
    /// The pack animal.
    pub agent: AgentId,
    /// Where to unload.
    pub deliver_to: Cell,
    /// Where the animal entered and will leave.
    pub exit: Cell,
    /// Current stage.
    pub stage: TransportStage,
    /// Definitions and counts carried, for the ledger.
    pub cargo: Vec<(String, u32)>,
}

impl TransportJob {
    /// Whether the animal has left the map.
    pub const fn is_finished(&self) -> bool {
        matches!(self.stage, TransportStage::Finished)
    }

    /// Advance one tick. A host failure ends the job.
    pub fn advance(&mut self, ctx: &mut TickContext<'_>) {
        if let Err(err) = self.step(ctx) {
            warn!(transport = %self.id, error = %err, "transport aborted");
            self.stage = TransportStage::Finished;
        }
    }

    fn step(&mut self, ctx: &mut TickContext<'_>) -> Result<(), WorldError> {
        let (settlement, agent) = (self.settlement, self.agent);
        self.stage = match self.stage {
            TransportStage::Travel => {
                let arrived = ctx.world.agent_harmed(settlement, agent)
                    || ctx.world.step_agent_toward(settlement, agent, self.deliver_to)?
                        == self.deliver_to;
                if arrived {
                    TransportStage::Drop { ticks: 0 }
                } else {
                    TransportStage::Travel
                }
            }
            TransportStage::Drop { ticks } => {
                let remaining = ctx.world.unload_agent(settlement, agent)?;
                if remaining == 0 {
                    self.record_delivery(ctx);
                    TransportStage::ExitMap
                } else if ticks >= DROP_BUDGET_TICKS {
                    let here = ctx
                        .world
                        .agent_position(settlement, agent)
                        .ok_or(WorldError::AgentNotOnMap { agent, settlement })?;
                    let target = ctx
                        .world
                        .find_drop_spot_near(settlement, here, &mut *ctx.rng)
                        .or_else(|| ctx.world.random_reachable_cell(settlement, &mut *ctx.rng))
                        .unwrap_or(self.deliver_to);
                    debug!(transport = %self.id, ?target, "drop area full, moving on");
                    TransportStage::GotoDropLoc { target }
                } else {
                    TransportStage::Drop {
                        ticks: ticks.saturating_add(1),
                    }
                }
            }
            TransportStage::GotoDropLoc { target } => {
                if ctx.world.step_agent_toward(settlement, agent, target)? == target {
                    TransportStage::Drop { ticks: 0 }
                } else {
                    TransportStage::GotoDropLoc { target }
                }
            }
            TransportStage::ExitMap => {
                if ctx.world.step_agent_toward(settlement, agent, self.exit)? == self.exit {
                    ctx.world.despawn_agent(settlement, agent);
                    info!(transport = %self.id, "pack animal left the map");
                    TransportStage::Finished
                } else {
                    TransportStage::ExitMap
                }
            }
            TransportStage::Finished => TransportStage::Finished,
        };
        Ok(())
    }

    fn record_delivery(&self, ctx: &mut TickContext<'_>) {
        for (def, count) in &self.cargo {
            ctx.record(
                TransferKind::Deliver,
                def,
                *count,
                Holder::Agent(self.agent),
                Holder::Settlement(self.settlement),
            );
        }
        debug!(transport = %self.id, "cargo unloaded");
    }
}
