//! Delivery pipeline: routing produced items to a settlement.
//!
//! The configured [`DeliveryMethod`] picks a route. Teleport and drop pods
//! hand items to the destination map at once; a pack animal carries them in
//! through a [`TransportJob`](transport::TransportJob) advanced by the
//! registry. Whatever cannot be routed is kept in the outpost's container,
//! so items are never dropped.

pub mod manifest;
pub mod transport;

use tracing::{debug, info, warn};

use outpost_types::{
    Agent, DeliveryMethod, Holder, ItemStack, Letter, LetterKind, Rot4, SettlementId, Tile,
    TransferKind, TransportId,
};
use outpost_world::{DeliveryMap, Notifier, SettlementInfo, WorldGrid};

use crate::context::{OutpostEvent, TickContext, total_count};
use crate::outpost::Outpost;

use self::manifest::manifest_text;
use self::transport::{TransportJob, TransportStage};

/// Research that unlocks drop pods for [`DeliveryMethod::PackOrPods`].
pub const TRANSPORT_POD_RESEARCH: &str = "transport_pod";

/// Race used when the outpost's biome names no pack animal.
pub const DEFAULT_PACK_ANIMAL: &str = "muffalo";

/// The route actually taken for `method`.
pub fn effective_method<W: WorldGrid + ?Sized>(method: DeliveryMethod, world: &W) -> DeliveryMethod {
    match method {
        DeliveryMethod::PackOrPods if world.research_finished(TRANSPORT_POD_RESEARCH) => {
            DeliveryMethod::ForcePods
        }
        DeliveryMethod::PackOrPods => DeliveryMethod::PackAnimal,
        other => other,
    }
}

/// The player home closest to `tile`.
pub fn nearest_home<W: WorldGrid + ?Sized>(world: &W, tile: Tile) -> Option<SettlementInfo> {
    world
        .player_homes()
        .into_iter()
        .min_by(|a, b| world.distance(a.tile, tile).total_cmp(&world.distance(b.tile, tile)))
}

/// Stacks split by whether they left the outpost.
#[derive(Debug, Default)]
struct Routed {
    sent: Vec<ItemStack>,
    kept: Vec<ItemStack>,
}

impl Routed {
    fn sent(items: Vec<ItemStack>) -> Self {
        Self {
            sent: items,
            kept: Vec::new(),
        }
    }

    fn kept(items: Vec<ItemStack>) -> Self {
        Self {
            sent: Vec::new(),
            kept: items,
        }
    }
}

impl Outpost {
    /// Where deliveries go: the chosen settlement, else the nearest home.
    pub fn resolve_destination<W: WorldGrid + ?Sized>(&self, world: &W) -> Option<SettlementInfo> {
        if let Some(id) = self.delivery_destination {
            match world.settlement(id) {
                Some(info) => return Some(info),
                None => warn!(outpost = %self.id, settlement = %id, "delivery destination is gone"),
            }
        }
        nearest_home(world, self.tile)
    }

    /// Route `items` by the configured delivery method.
    pub fn deliver(&mut self, items: Vec<ItemStack>, ctx: &mut TickContext<'_>) {
        if items.is_empty() {
            return;
        }
        let method = effective_method(ctx.settings.delivery_method, &*ctx.world);
        if method == DeliveryMethod::Store {
            self.announce(None, &items, ctx);
            self.store(items, ctx);
            return;
        }
        let Some(dest) = self.resolve_destination(&*ctx.world) else {
            warn!(outpost = %self.id, "no delivery destination, storing locally");
            self.store(items, ctx);
            return;
        };
        let side = ctx.world.direction(dest.tile, self.tile);
        let routed = match method {
            DeliveryMethod::ForcePods => self.send_pods(dest.id, items, ctx),
            DeliveryMethod::PackAnimal | DeliveryMethod::PackOrPods => {
                self.send_pack_animal(dest.id, side, items, ctx)
            }
            DeliveryMethod::Teleport | DeliveryMethod::Store => {
                self.teleport(dest.id, side, items, ctx)
            }
        };

        if !routed.kept.is_empty() {
            warn!(
                outpost = %self.id,
                stacks = routed.kept.len(),
                method = method.label(),
                "delivery failed, storing locally"
            );
            self.store(routed.kept, ctx);
        }
        if routed.sent.is_empty() {
            return;
        }
        self.announce(Some(&dest), &routed.sent, ctx);
        let count = total_count(&routed.sent);
        info!(outpost = %self.id, settlement = %dest.name, method = method.label(), items = count, "items delivered");
        ctx.emit(OutpostEvent::Delivered {
            outpost: self.id,
            method,
            destination: Some(dest.id),
            items: count,
        });
    }

    fn store(&mut self, items: Vec<ItemStack>, ctx: &mut TickContext<'_>) {
        let count = total_count(&items);
        self.inventory.extend(items);
        debug!(outpost = %self.id, items = count, "items stored");
        ctx.emit(OutpostEvent::Delivered {
            outpost: self.id,
            method: DeliveryMethod::Store,
            destination: None,
            items: count,
        });
    }

    fn announce(&self, dest: Option<&SettlementInfo>, items: &[ItemStack], ctx: &mut TickContext<'_>) {
        let label = match dest {
            Some(_) => format!("Items from {}", self.name),
            None => format!("Items at {}", self.name),
        };
        ctx.world.send_letter(Letter {
            label,
            text: manifest_text(&self.name, items, ctx.catalog),
            kind: LetterKind::Positive,
            tile: Some(dest.map_or(self.tile, |d| d.tile)),
        });
    }

    fn teleport(
        &self,
        dest: SettlementId,
        side: Rot4,
        items: Vec<ItemStack>,
        ctx: &mut TickContext<'_>,
    ) -> Routed {
        let cell = ctx
            .world
            .delivery_spot(dest)
            .or_else(|| ctx.world.reachable_edge_cell(dest, side))
            .or_else(|| ctx.world.random_edge_cell(dest, &mut *ctx.rng));
        let Some(cell) = cell else {
            warn!(outpost = %self.id, settlement = %dest, "no reachable cell to teleport to");
            return Routed::kept(items);
        };
        if let Err(err) = ctx.world.place_items(dest, cell, items.clone()) {
            warn!(outpost = %self.id, error = %err, "teleport failed");
            return Routed::kept(items);
        }
        self.record_delivered(dest, &items, ctx);
        Routed::sent(items)
    }

    fn send_pods(&self, dest: SettlementId, items: Vec<ItemStack>, ctx: &mut TickContext<'_>) -> Routed {
        let base = ctx
            .world
            .delivery_spot(dest)
            .or_else(|| ctx.world.trade_drop_spot(dest));
        let mut routed = Routed::default();
        for stack in items {
            let spot = base
                .and_then(|near| ctx.world.find_drop_spot_near(dest, near, &mut *ctx.rng))
                .or_else(|| ctx.world.random_drop_spot(dest, &mut *ctx.rng));
            let Some(spot) = spot else {
                routed.kept.push(stack);
                continue;
            };
            match ctx.world.launch_drop_pod(dest, spot, vec![stack.clone()]) {
                Ok(()) => {
                    self.record_delivered(dest, core::slice::from_ref(&stack), ctx);
                    routed.sent.push(stack);
                }
                Err(err) => {
                    warn!(outpost = %self.id, error = %err, "drop pod launch failed");
                    routed.kept.push(stack);
                }
            }
        }
        routed
    }

    fn send_pack_animal(
        &self,
        dest: SettlementId,
        side: Rot4,
        items: Vec<ItemStack>,
        ctx: &mut TickContext<'_>,
    ) -> Routed {
        let entry = ctx
            .world
            .reachable_edge_cell(dest, side)
            .or_else(|| ctx.world.random_edge_cell(dest, &mut *ctx.rng));
        let Some(entry) = entry else {
            warn!(outpost = %self.id, settlement = %dest, "no map edge for a pack animal");
            return Routed::kept(items);
        };
        let deliver_to = ctx
            .world
            .delivery_spot(dest)
            .or_else(|| ctx.world.outside_colony_cell(dest))
            .or_else(|| ctx.world.random_reachable_cell(dest, &mut *ctx.rng))
            .unwrap_or(entry);

        let race = ctx
            .world
            .biome_pack_animal(self.tile)
            .unwrap_or_else(|| DEFAULT_PACK_ANIMAL.to_owned());
        let player = ctx.world.player_faction();
        let mut animal = Agent::animal(format!("{} {race}", self.name), race, false, true)
            .with_faction(player);
        animal.inventory.clone_from(&items);
        let agent = animal.id;
        if let Err(err) = ctx.world.spawn_agent(dest, animal, entry) {
            warn!(outpost = %self.id, error = %err, "pack animal could not be spawned");
            return Routed::kept(items);
        }
        ctx.record_stacks(
            TransferKind::Transfer,
            &items,
            Holder::Outpost(self.id),
            Holder::Agent(agent),
        );
        let job = TransportJob {
            id: TransportId::new(),
            outpost: self.id,
            settlement: dest,
            agent,
            deliver_to,
            exit: entry,
            stage: TransportStage::Travel,
            cargo: items.iter().map(|s| (s.def.clone(), s.count)).collect(),
        };
        debug!(outpost = %self.id, transport = %job.id, ?entry, ?deliver_to, "pack animal dispatched");
        ctx.transports.push(job);
        Routed::sent(items)
    }

    fn record_delivered(&self, dest: SettlementId, items: &[ItemStack], ctx: &mut TickContext<'_>) {
        ctx.record_stacks(
            TransferKind::Deliver,
            items,
            Holder::Outpost(self.id),
            Holder::Settlement(dest),
        );
    }
}
