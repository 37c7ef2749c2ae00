//! Transport pods landing on an outpost.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use outpost_types::{Agent, Holder, ItemStack, OutpostId, SettlementId, Tile, TransferKind};
use outpost_world::Notifier;

use crate::context::TickContext;
use crate::kind::OutpostKind;
use crate::outpost::{AddAgentOutcome, Outpost};

/// The contents of a pod group in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportPods {
    /// Tile the pods are aimed at.
    pub destination: Tile,
    /// Settlement the pods launched from.
    pub origin: SettlementId,
    /// Passengers.
    pub agents: Vec<Agent>,
    /// Cargo.
    pub items: Vec<ItemStack>,
}

impl TransportPods {
    /// Whether no passengers or cargo remain.
    pub const fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.items.is_empty()
    }
}

/// One arrival action offered for pods aimed at an outpost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodOption {
    /// Menu label.
    pub label: String,
    /// The outpost the pods would join.
    pub outpost: OutpostId,
}

impl Outpost {
    /// Arrival actions for `pods`. Empty unless they are aimed at this
    /// outpost's tile.
    pub fn transport_pod_options(&self, pods: &TransportPods) -> Vec<PodOption> {
        if pods.destination != self.tile {
            return Vec::new();
        }
        vec![PodOption {
            label: format!("Add to {}", self.name),
            outpost: self.id,
        }]
    }

    /// Unload landed pods into the outpost.
    ///
    /// Returns what the outpost did not take: agents that failed admission,
    /// or the whole group untouched when it is aimed at another tile.
    pub fn arrive(
        &mut self,
        kind: &OutpostKind,
        pods: TransportPods,
        ctx: &mut TickContext<'_>,
    ) -> TransportPods {
        if pods.destination != self.tile {
            debug!(outpost = %self.id, tile = %pods.destination, "pods aimed elsewhere");
            return pods;
        }
        let TransportPods {
            destination,
            origin,
            agents,
            items,
        } = pods;

        let mut rejected = Vec::new();
        for agent in agents {
            let name = agent.name.clone();
            match self.add_agent(kind, agent, ctx) {
                AddAgentOutcome::Added => {
                    ctx.world
                        .message(format!("{name} has been added to {}.", self.name));
                }
                AddAgentOutcome::Rejected { agent, reason } => {
                    ctx.world
                        .message(format!("{name} cannot join {}: {reason}", self.name));
                    rejected.push(*agent);
                }
            }
        }

        ctx.record_stacks(
            TransferKind::Transfer,
            &items,
            Holder::Settlement(origin),
            Holder::Outpost(self.id),
        );
        let stacks = items.len();
        self.inventory.extend(items);
        self.pay_cost(kind, ctx);
        info!(outpost = %self.id, stacks, rejected = rejected.len(), "transport pods unloaded");
        TransportPods {
            destination,
            origin,
            agents: rejected,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outpost_world::WorldGrid;

    use super::*;
    use crate::kind::OutpostBehavior;
    use crate::testing::{Harness, OUTPOST_TILE, mining};

    fn pods(h: &Harness, destination: Tile, agents: Vec<Agent>) -> TransportPods {
        TransportPods {
            destination,
            origin: h.home,
            agents,
            items: vec![ItemStack::new("steel", 40)],
        }
    }

    #[test]
    fn option_only_for_own_tile() {
        let h = Harness::new();
        let post = Outpost::new("Camp", &mining(), OUTPOST_TILE, h.world.player_faction(), &h.settings);
        let aimed = pods(&h, OUTPOST_TILE, Vec::new());
        assert_eq!(
            post.transport_pod_options(&aimed),
            vec![PodOption {
                label: String::from("Add to Camp"),
                outpost: post.id(),
            }]
        );
        assert!(post.transport_pod_options(&pods(&h, Tile(0), Vec::new())).is_empty());
    }

    #[test]
    fn arrivals_join_and_animals_are_refused() {
        let mut h = Harness::new();
        let mut kind = mining();
        kind.behavior = OutpostBehavior::RestrictedAdmission {
            humanlike_only: true,
            min_skill: None,
        };
        let mut post = Outpost::new("Camp", &kind, OUTPOST_TILE, h.world.player_faction(), &h.settings);
        let landed = pods(
            &h,
            OUTPOST_TILE,
            vec![
                Agent::humanlike("Ada"),
                Agent::animal("Muffy", "muffalo", false, true),
            ],
        );
        let mut ctx = h.ctx(1);
        let rejected = post.arrive(&kind, landed, &mut ctx);
        drop(ctx);

        assert_eq!(rejected.agents.len(), 1);
        assert_eq!(rejected.agents.first().unwrap().name, "Muffy");
        assert!(rejected.items.is_empty());
        assert_eq!(post.occupants().len(), 1);
        assert_eq!(post.inventory().count_of("steel"), 40);
        assert_eq!(h.world.messages().len(), 2);
        assert_eq!(h.ledger.net_flow(Holder::Outpost(post.id()), "steel"), 40);
    }

    #[test]
    fn misaimed_pods_are_handed_back_whole() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = Outpost::new("Camp", &kind, OUTPOST_TILE, h.world.player_faction(), &h.settings);
        let landed = pods(&h, Tile(0), vec![Agent::humanlike("Ada")]);
        let mut ctx = h.ctx(1);
        let returned = post.arrive(&kind, landed.clone(), &mut ctx);
        drop(ctx);

        assert_eq!(returned, landed);
        assert!(post.occupants().is_empty());
        assert!(post.inventory().is_empty());
        assert!(h.ledger.entries().is_empty());
    }
}
