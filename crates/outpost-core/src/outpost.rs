//! The [`Outpost`] aggregate: occupants, container, and trackers.
//!
//! An outpost owns its occupants and its items outright. Agents and stacks
//! only cross its boundary by value, so the same agent can never be listed
//! by an outpost and a caravan at once. Every crossing is written to the
//! ledger through the [`TickContext`].
//!
//! The per-tick driver lives here; the needs, raid, and delivery passes are
//! further `impl Outpost` blocks in their own modules.

use core::fmt::Write as _;
use std::cell::OnceCell;
use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use outpost_agents::config::{TICKS_PER_DAY, TICKS_PER_HOUR};
use outpost_agents::death::{into_corpse, strip};
use outpost_agents::{DeathCause, ItemContainer, OccupantRoster, cumulative_skill, is_capable};
use outpost_types::{
    Agent, AgentId, Caravan, CaravanId, FactionId, HealthCondition, Holder, ItemCatalog, ItemId,
    ItemStack, Letter, LetterKind, OutpostId, SettlementId, Skill, Tile, TransferKind,
};
use outpost_world::{Battlefield, CaravanRegistry, Notifier};

use crate::admission::{AcceptanceReport, can_add_agent};
use crate::context::{OutpostEvent, TickContext, total_count};
use crate::error::OutpostError;
use crate::kind::{OutpostBehavior, OutpostKind};
use crate::packing::PackingState;
use crate::production::ProductionTracker;
use crate::raid::RaidTracker;
use crate::settings::OutpostsSettings;

/// What a tick did to the outpost's existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still standing.
    Continue,
    /// Packed up; the caravan formed, if anyone was left to form one.
    Converted(Option<CaravanId>),
    /// The last occupant died.
    Abandoned,
    /// Every player agent was lost to an incursion.
    Lost,
}

/// Result of offering a single agent to an outpost.
#[derive(Debug, Clone, PartialEq)]
pub enum AddAgentOutcome {
    /// The agent moved in.
    Added,
    /// The agent was refused and handed back.
    Rejected {
        /// The refused agent.
        agent: Box<Agent>,
        /// Why.
        reason: String,
    },
}

/// A stationary world object that abstracts a group of agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outpost {
    pub(crate) id: OutpostId,
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) tile: Tile,
    pub(crate) faction: FactionId,
    pub(crate) occupants: OccupantRoster,
    pub(crate) inventory: ItemContainer,
    #[serde(default)]
    pub(crate) cost_paid: bool,
    #[serde(default)]
    pub(crate) delivery_destination: Option<SettlementId>,
    #[serde(default)]
    pub(crate) packing: PackingState,
    pub(crate) production: ProductionTracker,
    #[serde(default)]
    pub(crate) raid: RaidTracker,
    #[serde(default)]
    pub(crate) chosen_result: Option<usize>,
    #[serde(skip)]
    skill_cache: OnceCell<BTreeMap<Skill, u32>>,
}

impl Outpost {
    /// An empty outpost of `kind` on `tile`.
    pub fn new(
        name: impl Into<String>,
        kind: &OutpostKind,
        tile: Tile,
        faction: FactionId,
        settings: &OutpostsSettings,
    ) -> Self {
        Self {
            id: OutpostId::new(),
            name: name.into(),
            kind: kind.name.clone(),
            tile,
            faction,
            occupants: OccupantRoster::new(),
            inventory: ItemContainer::new(),
            cost_paid: kind.cost_to_make.is_empty(),
            delivery_destination: None,
            packing: PackingState::Idle,
            production: ProductionTracker::new(kind.ticks_per_production, settings),
            raid: RaidTracker::default(),
            chosen_result: matches!(kind.behavior, OutpostBehavior::ChooseResult).then_some(0),
            skill_cache: OnceCell::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Unique id.
    pub const fn id(&self) -> OutpostId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the outpost's kind.
    pub fn kind_name(&self) -> &str {
        &self.kind
    }

    /// World tile.
    pub const fn tile(&self) -> Tile {
        self.tile
    }

    /// Owning faction.
    pub const fn faction(&self) -> FactionId {
        self.faction
    }

    /// Occupants.
    pub const fn occupants(&self) -> &OccupantRoster {
        &self.occupants
    }

    /// Stored items.
    pub const fn inventory(&self) -> &ItemContainer {
        &self.inventory
    }

    /// Whether the creation cost has been paid.
    pub const fn cost_paid(&self) -> bool {
        self.cost_paid
    }

    /// Explicit delivery destination.
    pub const fn delivery_destination(&self) -> Option<SettlementId> {
        self.delivery_destination
    }

    /// Send future deliveries to `settlement`, or to the nearest home when `None`.
    pub const fn set_delivery_destination(&mut self, settlement: Option<SettlementId>) {
        self.delivery_destination = settlement;
    }

    /// Packing state.
    pub const fn packing(&self) -> PackingState {
        self.packing
    }

    /// Production countdown.
    pub const fn production(&self) -> ProductionTracker {
        self.production
    }

    /// Raid state.
    pub const fn raid(&self) -> &RaidTracker {
        &self.raid
    }

    /// The chosen result rule for choose-result outposts.
    pub const fn chosen_result(&self) -> Option<usize> {
        self.chosen_result
    }

    /// Pick which result rule a choose-result outpost produces.
    pub fn choose_result(&mut self, kind: &OutpostKind, index: usize) -> Result<(), OutpostError> {
        if !matches!(kind.behavior, OutpostBehavior::ChooseResult) {
            return Err(OutpostError::CommandDisabled {
                reason: format!("{} has a fixed output", kind.label),
            });
        }
        let Some(rule) = kind.result_rules.get(index) else {
            return Err(OutpostError::CommandDisabled {
                reason: format!("no result option {index}"),
            });
        };
        info!(outpost = %self.id, item = %rule.item, "production result chosen");
        self.chosen_result = Some(index);
        Ok(())
    }

    /// Rename the outpost. Blank names are ignored.
    pub fn rename(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.name = trimmed.to_owned();
        true
    }

    // -----------------------------------------------------------------------
    // Skills
    // -----------------------------------------------------------------------

    /// Occupants able to contribute to the kind's relevant skills.
    pub fn capable_agents(&self, kind: &OutpostKind) -> Vec<&Agent> {
        let relevant = kind.relevant_skills();
        self.occupants
            .iter()
            .filter(|a| is_capable(a, &relevant))
            .collect()
    }

    /// Cumulative `skill` across capable occupants. Cached until the roster
    /// changes.
    pub fn total_skill(&self, kind: &OutpostKind, skill: Skill) -> u32 {
        let totals = self.skill_cache.get_or_init(|| {
            let capable = self.capable_agents(kind);
            Skill::ALL
                .into_iter()
                .map(|s| (s, cumulative_skill(capable.iter().copied(), s)))
                .collect()
        });
        totals.get(&skill).copied().unwrap_or(0)
    }

    /// Drop cached skill totals.
    pub fn invalidate_skills(&mut self) {
        self.skill_cache = OnceCell::new();
    }

    // -----------------------------------------------------------------------
    // Packing
    // -----------------------------------------------------------------------

    /// Begin packing. Returns the countdown length.
    pub fn start_packing(
        &mut self,
        kind: &OutpostKind,
        settings: &OutpostsSettings,
    ) -> Result<u64, OutpostError> {
        let ticks = self
            .packing
            .start(kind.ticks_to_pack, self.occupants.len(), settings)?;
        info!(outpost = %self.id, ticks, "packing started");
        Ok(ticks)
    }

    /// Cancel packing.
    pub fn stop_packing(&mut self) -> Result<(), OutpostError> {
        self.packing.cancel()?;
        info!(outpost = %self.id, "packing cancelled");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Occupants
    // -----------------------------------------------------------------------

    /// Offer a single agent. Refused agents are handed back.
    pub fn add_agent(
        &mut self,
        kind: &OutpostKind,
        agent: Agent,
        ctx: &mut TickContext<'_>,
    ) -> AddAgentOutcome {
        let report = can_add_agent(kind, &agent, &*ctx.world);
        if !report.accepted {
            return AddAgentOutcome::Rejected {
                reason: report.reason.unwrap_or_default(),
                agent: Box::new(agent),
            };
        }
        self.admit(agent, ctx);
        AddAgentOutcome::Added
    }

    fn admit(&mut self, agent: Agent, ctx: &mut TickContext<'_>) {
        ctx.world.detach_world_agent(agent.id);
        let id = agent.id;
        if self.occupants.add(agent) {
            debug!(outpost = %self.id, agent = %id, "agent admitted");
        } else {
            warn!(outpost = %self.id, agent = %id, "agent already an occupant");
        }
        self.invalidate_skills();
    }

    /// Move one agent out of a caravan into the outpost.
    ///
    /// The agent's carried items go to the caravan's next humanlike member.
    /// When no humanlike member is left the caravan dissolves into the
    /// outpost: every member's items go to the container and every member
    /// that passes admission moves in. Members that fail admission stay in
    /// the caravan. The creation cost is paid from the container as soon as
    /// it can be covered in full.
    pub fn add_agent_from_caravan(
        &mut self,
        kind: &OutpostKind,
        caravan_id: CaravanId,
        agent_id: AgentId,
        ctx: &mut TickContext<'_>,
    ) -> Result<AcceptanceReport, OutpostError> {
        self.check_docked(caravan_id, ctx)?;
        {
            let caravan = ctx
                .world
                .caravan(caravan_id)
                .ok_or(OutpostError::CaravanNotDocked(caravan_id))?;
            let agent = caravan
                .members
                .iter()
                .find(|a| a.id == agent_id)
                .ok_or(OutpostError::AgentNotFound(agent_id))?;
            let report = can_add_agent(kind, agent, &*ctx.world);
            if !report.accepted {
                return Ok(report);
            }
        }

        let mut handed_over: Vec<(String, u32, AgentId)> = Vec::new();
        let mut absorbed: Vec<(AgentId, Vec<ItemStack>)> = Vec::new();
        let (agent, leftover) = {
            let caravan = ctx
                .world
                .caravan_mut(caravan_id)
                .ok_or(OutpostError::CaravanNotDocked(caravan_id))?;
            let index = caravan
                .members
                .iter()
                .position(|a| a.id == agent_id)
                .ok_or(OutpostError::AgentNotFound(agent_id))?;
            let mut agent = caravan.members.remove(index);
            let carried = core::mem::take(&mut agent.inventory);

            let receiver = caravan.members.iter_mut().find(|a| a.is_humanlike());
            let leftover = if let Some(receiver) = receiver {
                handed_over.extend(carried.iter().map(|s| (s.def.clone(), s.count, receiver.id)));
                receiver.inventory.extend(carried);
                Vec::new()
            } else {
                absorbed.push((agent.id, carried));
                for member in &mut caravan.members {
                    absorbed.push((member.id, core::mem::take(&mut member.inventory)));
                }
                core::mem::take(&mut caravan.members)
            };
            (agent, leftover)
        };

        for (def, count, to) in handed_over {
            ctx.record(
                TransferKind::Transfer,
                &def,
                count,
                Holder::Agent(agent.id),
                Holder::Agent(to),
            );
        }
        for (holder, stacks) in absorbed {
            ctx.record_stacks(
                TransferKind::Transfer,
                &stacks,
                Holder::Agent(holder),
                Holder::Outpost(self.id),
            );
            self.inventory.extend(stacks);
        }

        info!(outpost = %self.id, agent = %agent.id, caravan = %caravan_id, "agent joined from caravan");
        self.admit(agent, ctx);

        let mut refused = Vec::new();
        for member in leftover {
            match self.add_agent(kind, member, ctx) {
                AddAgentOutcome::Added => {}
                AddAgentOutcome::Rejected { agent, reason } => {
                    debug!(agent = %agent.id, reason, "caravan member stays with caravan");
                    refused.push(*agent);
                }
            }
        }
        let empty = match ctx.world.caravan_mut(caravan_id) {
            Some(caravan) => {
                caravan.members.extend(refused);
                caravan.members.is_empty()
            }
            None => false,
        };
        if empty {
            ctx.world.remove_caravan(caravan_id);
            debug!(caravan = %caravan_id, "caravan dissolved into outpost");
        }

        self.pay_cost(kind, ctx);
        Ok(AcceptanceReport::accept())
    }

    /// Pay the creation cost from the container, all or nothing.
    pub(crate) fn pay_cost(&mut self, kind: &OutpostKind, ctx: &mut TickContext<'_>) {
        if self.cost_paid {
            return;
        }
        let short = kind
            .cost_to_make
            .iter()
            .find(|c| self.inventory.count_of(&c.item) < c.count);
        if let Some(cost) = short {
            debug!(outpost = %self.id, item = %cost.item, "creation cost not yet covered");
            return;
        }
        for cost in &kind.cost_to_make {
            match self.inventory.take_def(&cost.item, cost.count) {
                Ok(paid) => {
                    ctx.record_stacks(
                        TransferKind::Cost,
                        &paid,
                        Holder::Outpost(self.id),
                        Holder::Void,
                    );
                }
                Err(err) => warn!(outpost = %self.id, error = %err, "creation cost payment failed"),
            }
        }
        self.cost_paid = true;
        info!(outpost = %self.id, "creation cost paid");
    }

    /// Send one occupant away. It joins the caravan docked here, or a new
    /// caravan on the outpost's tile. The last occupant cannot leave.
    pub fn remove_agent(
        &mut self,
        agent_id: AgentId,
        ctx: &mut TickContext<'_>,
    ) -> Result<CaravanId, OutpostError> {
        if !self.occupants.contains(agent_id) {
            return Err(OutpostError::AgentNotFound(agent_id));
        }
        if self.occupants.len() <= 1 {
            return Err(OutpostError::CommandDisabled {
                reason: String::from("the last occupant cannot leave"),
            });
        }
        let agent = self
            .occupants
            .remove(agent_id)
            .ok_or(OutpostError::AgentNotFound(agent_id))?;
        self.invalidate_skills();

        if let Some(docked) = ctx.world.docked_caravan(self.tile)
            && let Some(caravan) = ctx.world.caravan_mut(docked)
        {
            caravan.members.push(agent);
            info!(outpost = %self.id, agent = %agent_id, caravan = %docked, "agent left for docked caravan");
            return Ok(docked);
        }
        let mut caravan = Caravan::new(format!("{}'s caravan", agent.name), self.tile, vec![agent]);
        caravan.faction = Some(self.faction);
        let id = ctx.world.spawn_caravan(caravan);
        info!(outpost = %self.id, agent = %agent_id, caravan = %id, "agent left in new caravan");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Put a stack into the container.
    pub fn add_item(&mut self, stack: ItemStack) {
        self.inventory.add(stack);
    }

    /// Take a stack, or part of one, out of the container.
    pub fn take_item(&mut self, id: ItemId, count: Option<u32>) -> Result<ItemStack, OutpostError> {
        Ok(self.inventory.take(id, count)?)
    }

    /// Whether an incursion is underway, by the tracker or the host map.
    pub(crate) fn under_attack(&self, ctx: &TickContext<'_>) -> bool {
        self.raid.is_active() || ctx.world.map_active(self.id)
    }

    fn check_docked(&self, caravan_id: CaravanId, ctx: &TickContext<'_>) -> Result<(), OutpostError> {
        let caravan = ctx
            .world
            .caravan(caravan_id)
            .ok_or(OutpostError::CaravanNotDocked(caravan_id))?;
        if caravan.tile != self.tile || caravan.moving {
            return Err(OutpostError::CaravanNotDocked(caravan_id));
        }
        Ok(())
    }

    /// Move items from the container to a docked caravan.
    pub fn take_items(
        &mut self,
        caravan_id: CaravanId,
        item: ItemId,
        count: Option<u32>,
        ctx: &mut TickContext<'_>,
    ) -> Result<u32, OutpostError> {
        self.check_docked(caravan_id, ctx)?;
        let stack = self.inventory.take(item, count)?;
        let caravan = ctx
            .world
            .caravan_mut(caravan_id)
            .ok_or(OutpostError::CaravanNotDocked(caravan_id))?;
        let index = caravan
            .members
            .iter()
            .position(Agent::is_humanlike)
            .unwrap_or(0);
        let Some(receiver) = caravan.members.get_mut(index) else {
            self.inventory.add(stack);
            return Err(OutpostError::CaravanNotDocked(caravan_id));
        };
        let (def, moved, to) = (stack.def.clone(), stack.count, receiver.id);
        receiver.inventory.push(stack);
        ctx.record(
            TransferKind::Transfer,
            &def,
            moved,
            Holder::Outpost(self.id),
            Holder::Agent(to),
        );
        Ok(moved)
    }

    /// Move items from a docked caravan's members into the container.
    pub fn give_items(
        &mut self,
        caravan_id: CaravanId,
        item: ItemId,
        count: Option<u32>,
        ctx: &mut TickContext<'_>,
    ) -> Result<u32, OutpostError> {
        self.check_docked(caravan_id, ctx)?;
        let caravan = ctx
            .world
            .caravan_mut(caravan_id)
            .ok_or(OutpostError::CaravanNotDocked(caravan_id))?;
        let holder = caravan
            .members
            .iter_mut()
            .find(|a| a.inventory.iter().any(|s| s.id == item))
            .ok_or(outpost_agents::AgentError::ItemNotFound(item))?;
        let mut bag = ItemContainer::new();
        bag.extend(core::mem::take(&mut holder.inventory));
        let taken = bag.take(item, count);
        holder.inventory = bag.drain();
        let stack = taken?;
        let (def, moved, from) = (stack.def.clone(), stack.count, holder.id);
        self.inventory.add(stack);
        ctx.record(
            TransferKind::Transfer,
            &def,
            moved,
            Holder::Agent(from),
            Holder::Outpost(self.id),
        );
        Ok(moved)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Pack up into a caravan on the outpost's tile, emptying the outpost.
    ///
    /// The container is loaded onto a pack animal if one is present, else
    /// onto a humanlike member, else onto whoever is left.
    pub fn convert_to_caravan(&mut self, ctx: &mut TickContext<'_>) -> Option<CaravanId> {
        self.packing = PackingState::Idle;
        let mut members = self.occupants.drain();
        self.invalidate_skills();
        let items = self.inventory.drain();
        let carrier = members
            .iter()
            .position(|a| a.kind.is_pack_animal())
            .or_else(|| members.iter().position(Agent::is_humanlike))
            .unwrap_or(0);

        let caravan = match members.get_mut(carrier) {
            Some(agent) => {
                ctx.record_stacks(
                    TransferKind::Transfer,
                    &items,
                    Holder::Outpost(self.id),
                    Holder::Agent(agent.id),
                );
                agent.inventory.extend(items);
                let mut caravan = Caravan::new(self.name.clone(), self.tile, members);
                caravan.faction = Some(self.faction);
                Some(ctx.world.spawn_caravan(caravan))
            }
            None => {
                if !items.is_empty() {
                    warn!(outpost = %self.id, stacks = items.len(), "no one left to carry items");
                    ctx.record_stacks(
                        TransferKind::Consume,
                        &items,
                        Holder::Outpost(self.id),
                        Holder::Void,
                    );
                }
                None
            }
        };
        info!(outpost = %self.id, caravan = ?caravan, "outpost packed into caravan");
        ctx.emit(OutpostEvent::Converted {
            outpost: self.id,
            caravan,
        });
        caravan
    }

    /// Handle the death of an occupant. Returns `true` when the outpost was
    /// left empty and is now abandoned.
    pub fn notify_agent_died(
        &mut self,
        agent_id: AgentId,
        cause: Option<DeathCause>,
        ctx: &mut TickContext<'_>,
    ) -> bool {
        let Some(mut agent) = self.occupants.remove(agent_id) else {
            warn!(outpost = %self.id, agent = %agent_id, "death reported for unknown agent");
            return false;
        };
        if !agent.is_dead() && cause.is_none() {
            error!(outpost = %self.id, agent = %agent_id, "death reported for living agent");
            self.occupants.add(agent);
            return false;
        }
        self.invalidate_skills();

        let belongings = strip(&mut agent);
        ctx.record_stacks(
            TransferKind::Transfer,
            &belongings,
            Holder::Agent(agent.id),
            Holder::Outpost(self.id),
        );
        self.inventory.extend(belongings);
        let name = agent.name.clone();
        let corpse = into_corpse(agent);
        ctx.record(
            TransferKind::Produce,
            &corpse.def,
            corpse.count,
            Holder::World,
            Holder::Outpost(self.id),
        );
        self.inventory.add(corpse);

        let how = cause.map(|c| format!(" of {c}")).unwrap_or_default();
        info!(outpost = %self.id, agent = %agent_id, cause = %how.trim(), "occupant died");
        ctx.world.send_letter(Letter {
            label: format!("Death: {name}"),
            text: format!("{name} has died{how} at {}.", self.name),
            kind: LetterKind::Death,
            tile: Some(self.tile),
        });
        ctx.emit(OutpostEvent::AgentDied {
            outpost: self.id,
            agent: agent_id,
            cause,
        });

        if !self.occupants.is_empty() {
            return false;
        }
        warn!(outpost = %self.id, "last occupant died, outpost abandoned");
        ctx.world.send_letter(Letter {
            label: format!("{} abandoned", self.name),
            text: format!("Everyone at {} has died. The outpost is abandoned.", self.name),
            kind: LetterKind::Negative,
            tile: Some(self.tile),
        });
        ctx.emit(OutpostEvent::Abandoned { outpost: self.id });
        true
    }

    // -----------------------------------------------------------------------
    // Production
    // -----------------------------------------------------------------------

    /// Run one production cycle and deliver the result.
    pub fn produce(&mut self, kind: &OutpostKind, ctx: &mut TickContext<'_>) {
        let items = self.production_batch(kind, ctx);
        if items.is_empty() {
            debug!(outpost = %self.id, "production cycle yielded nothing");
            return;
        }
        ctx.record_stacks(
            TransferKind::Produce,
            &items,
            Holder::World,
            Holder::Outpost(self.id),
        );
        let count = total_count(&items);
        info!(outpost = %self.id, items = count, "production cycle complete");
        ctx.emit(OutpostEvent::Produced {
            outpost: self.id,
            items: count,
        });
        self.deliver(items, ctx);
    }

    /// The stacks one production cycle would yield right now.
    pub fn production_batch(&self, kind: &OutpostKind, ctx: &TickContext<'_>) -> Vec<ItemStack> {
        let capable = self.capable_agents(kind);
        let multiplier = ctx.settings.production_multiplier;
        kind.active_rules(self.chosen_result)
            .into_iter()
            .flat_map(|rule| rule.make(rule.amount(&capable, multiplier), ctx.catalog))
            .collect()
    }

    /// One-line description of what a production cycle yields.
    pub fn production_string(
        &self,
        kind: &OutpostKind,
        catalog: &ItemCatalog,
        settings: &OutpostsSettings,
    ) -> String {
        let capable = self.capable_agents(kind);
        let parts: Vec<String> = kind
            .active_rules(self.chosen_result)
            .into_iter()
            .map(|rule| {
                let amount = rule.amount(&capable, settings.production_multiplier);
                format!("{amount}x {}", catalog.label(&rule.item))
            })
            .collect();
        let list = match parts.as_slice() {
            [] => return String::from("Produces nothing"),
            [one] => one.clone(),
            [first, second] => format!("{first} and {second}"),
            [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
        };
        format!(
            "Will produce {list} in {}",
            format_ticks(self.production.ticks_until_production())
        )
    }

    /// Multi-line inspection text.
    pub fn inspect_string(
        &self,
        kind: &OutpostKind,
        catalog: &ItemCatalog,
        settings: &OutpostsSettings,
    ) -> String {
        let mut out = format!("{} ({})", self.name, kind.label);
        let _ = write!(out, "\nContains {} pawns", self.occupants.len());
        if let Some(ticks) = self.packing.ticks_remaining() {
            let _ = write!(out, "\nPacking: {} remaining", format_ticks(ticks));
        }
        if kind.produces_anything() {
            let _ = write!(out, "\n{}", self.production_string(kind, catalog, settings));
        }
        for skill in &kind.display_skills {
            let _ = write!(
                out,
                "\nTotal {}: {}",
                skill.label(),
                self.total_skill(kind, *skill)
            );
        }
        if !self.cost_paid {
            out.push_str("\nCreation cost not yet paid");
        }
        out
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the outpost one tick: packing, production, needs, raids.
    ///
    /// Packing is paused while an incursion holds the occupants on the
    /// battlefield.
    pub fn tick(&mut self, kind: &OutpostKind, ctx: &mut TickContext<'_>) -> TickOutcome {
        if !self.under_attack(ctx) && self.packing.advance() {
            return TickOutcome::Converted(self.convert_to_caravan(ctx));
        }
        if self
            .production
            .advance(kind.ticks_per_production, self.packing.is_packing(), ctx.settings)
        {
            self.produce(kind, ctx);
        }
        if self.tick_needs(kind, ctx) {
            return TickOutcome::Abandoned;
        }
        self.tick_raid(ctx)
    }

    // -----------------------------------------------------------------------
    // Developer actions
    // -----------------------------------------------------------------------

    /// Injure a random occupant. Returns the injured agent.
    pub fn damage_random_agent(&mut self, damage: f32, ctx: &mut TickContext<'_>) -> Option<AgentId> {
        let len = self.occupants.len();
        if len == 0 {
            return None;
        }
        let pick = ctx.rng.random_range(0..len);
        let agent = self.occupants.iter_mut().nth(pick)?;
        agent.health.conditions.push(HealthCondition::injury("cut", damage));
        debug!(outpost = %self.id, agent = %agent.id, damage, "dev: occupant injured");
        Some(agent.id)
    }

    /// Empty every occupant's food need.
    pub fn starve_all(&mut self) {
        for agent in self.occupants.iter_mut() {
            agent.needs.food = 0.0;
        }
        debug!(outpost = %self.id, "dev: occupants starved");
    }
}

/// Render a tick count as days and hours.
pub fn format_ticks(ticks: u64) -> String {
    let days = ticks.checked_div(TICKS_PER_DAY).unwrap_or(0);
    let hours = ticks
        .checked_rem(TICKS_PER_DAY)
        .and_then(|rest| rest.checked_div(TICKS_PER_HOUR))
        .unwrap_or(0);
    match (days, hours) {
        (0, 0) => String::from("less than an hour"),
        (0, h) => format!("{h} hours"),
        (d, 0) => format!("{d} days"),
        (d, h) => format!("{d} days {h} hours"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outpost_ledger::ConservationResult;
    use outpost_types::Skill;
    use outpost_world::WorldGrid;

    use super::*;
    use crate::testing::{Harness, OUTPOST_TILE, kind, mining};

    fn costly() -> OutpostKind {
        kind(
            r"
name: mining
cost_to_make:
  - { item: steel, count: 50 }
result_rules:
  - item: steel
    base_amount: 10
ticks_per_production: 1000
",
        )
    }

    fn outpost(h: &Harness, kind: &OutpostKind) -> Outpost {
        Outpost::new("Camp", kind, OUTPOST_TILE, h.world.player_faction(), &h.settings)
    }

    fn docked(h: &mut Harness, members: Vec<Agent>) -> CaravanId {
        h.world.spawn_caravan(Caravan::new("c", OUTPOST_TILE, members))
    }

    #[test]
    fn sole_humanlike_dissolves_caravan_and_pays_cost() {
        let mut h = Harness::new();
        let kind = costly();
        let mut post = outpost(&h, &kind);
        let mut ada = Agent::humanlike("Ada");
        ada.inventory.push(ItemStack::new("steel", 60));
        ada.inventory.push(ItemStack::new("silver", 10));
        let ada_id = ada.id;
        let caravan = docked(&mut h, vec![ada]);

        let mut ctx = h.ctx(1);
        let report = post
            .add_agent_from_caravan(&kind, caravan, ada_id, &mut ctx)
            .unwrap();
        assert!(report.accepted);
        drop(ctx);

        assert!(post.occupants().contains(ada_id));
        assert!(post.cost_paid());
        assert_eq!(post.inventory().count_of("steel"), 10);
        assert_eq!(post.inventory().count_of("silver"), 10);
        assert!(h.world.caravans().next().is_none());
        assert_eq!(h.ledger.verify_conservation(1), ConservationResult::Balanced);
    }

    #[test]
    fn remaining_humanlike_receives_items() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let mut ada = Agent::humanlike("Ada");
        ada.inventory.push(ItemStack::new("steel", 5));
        let ada_id = ada.id;
        let bob = Agent::humanlike("Bob");
        let caravan = docked(&mut h, vec![ada, bob]);

        let mut ctx = h.ctx(1);
        post.add_agent_from_caravan(&kind, caravan, ada_id, &mut ctx)
            .unwrap();
        drop(ctx);

        let left = h.world.caravan(caravan).unwrap();
        assert_eq!(left.members.len(), 1);
        assert_eq!(left.count_of("steel"), 5);
        assert!(post.inventory().is_empty());
    }

    #[test]
    fn animals_follow_last_humanlike_in() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let ada = Agent::humanlike("Ada");
        let ada_id = ada.id;
        let mut muffy = Agent::animal("Muffy", "muffalo", false, true);
        muffy.inventory.push(ItemStack::new("steel", 30));
        let caravan = docked(&mut h, vec![ada, muffy]);

        let mut ctx = h.ctx(1);
        post.add_agent_from_caravan(&kind, caravan, ada_id, &mut ctx)
            .unwrap();
        drop(ctx);

        assert_eq!(post.occupants().len(), 2);
        assert_eq!(post.inventory().count_of("steel"), 30);
        assert!(h.world.caravan(caravan).is_none());
    }

    #[test]
    fn rejected_agent_stays_in_caravan() {
        let mut h = Harness::new();
        let mut kind = mining();
        kind.behavior = OutpostBehavior::RestrictedAdmission {
            humanlike_only: true,
            min_skill: None,
        };
        let mut post = outpost(&h, &kind);
        let muffy = Agent::animal("Muffy", "muffalo", false, true);
        let muffy_id = muffy.id;
        let caravan = docked(&mut h, vec![Agent::humanlike("Ada"), muffy]);

        let mut ctx = h.ctx(1);
        let report = post
            .add_agent_from_caravan(&kind, caravan, muffy_id, &mut ctx)
            .unwrap();
        drop(ctx);

        assert!(!report.accepted);
        assert!(post.occupants().is_empty());
        assert_eq!(h.world.caravan(caravan).unwrap().members.len(), 2);
    }

    #[test]
    fn last_occupant_cannot_leave() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let ada = Agent::humanlike("Ada");
        let ada_id = ada.id;
        let bob = Agent::humanlike("Bob");
        let bob_id = bob.id;
        let mut ctx = h.ctx(1);
        post.add_agent(&kind, ada, &mut ctx);
        post.add_agent(&kind, bob, &mut ctx);

        let caravan = post.remove_agent(ada_id, &mut ctx).unwrap();
        assert!(matches!(
            post.remove_agent(bob_id, &mut ctx),
            Err(OutpostError::CommandDisabled { .. })
        ));
        drop(ctx);
        assert_eq!(h.world.caravan(caravan).unwrap().members.len(), 1);
        assert_eq!(post.occupants().len(), 1);
    }

    #[test]
    fn item_exchange_with_docked_caravan() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let steel = ItemStack::new("steel", 40);
        let steel_id = steel.id;
        post.add_item(steel);
        let caravan = docked(&mut h, vec![Agent::humanlike("Ada")]);

        let mut ctx = h.ctx(1);
        assert_eq!(post.take_items(caravan, steel_id, Some(15), &mut ctx).unwrap(), 15);
        drop(ctx);
        assert_eq!(post.inventory().count_of("steel"), 25);
        let carried = h.world.caravan(caravan).unwrap().items().next().unwrap().id;

        let mut ctx = h.ctx(2);
        assert_eq!(post.give_items(caravan, carried, Some(5), &mut ctx).unwrap(), 5);
        drop(ctx);
        assert_eq!(post.inventory().count_of("steel"), 30);
        assert_eq!(h.world.caravan(caravan).unwrap().count_of("steel"), 10);

        h.world.caravan_mut(caravan).unwrap().moving = true;
        let mut ctx = h.ctx(3);
        assert!(matches!(
            post.give_items(caravan, carried, None, &mut ctx),
            Err(OutpostError::CaravanNotDocked(_))
        ));
    }

    #[test]
    fn death_strips_agent_and_abandons_empty_outpost() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let mut ada = Agent::humanlike("Ada");
        ada.equipment.push(ItemStack::new("revolver", 1));
        let ada_id = ada.id;
        let mut ctx = h.ctx(1);
        post.add_agent(&kind, ada, &mut ctx);

        let abandoned = post.notify_agent_died(ada_id, Some(DeathCause::Starvation), &mut ctx);
        assert!(abandoned);
        assert!(ctx.events.contains(&OutpostEvent::Abandoned { outpost: post.id() }));
        drop(ctx);

        assert_eq!(post.inventory().count_of("revolver"), 1);
        assert_eq!(post.inventory().count_of("corpse_human"), 1);
        assert_eq!(h.world.letters().len(), 2);
    }

    #[test]
    fn living_agent_reported_dead_is_kept() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let ada = Agent::humanlike("Ada");
        let ada_id = ada.id;
        let mut ctx = h.ctx(1);
        post.add_agent(&kind, ada, &mut ctx);
        assert!(!post.notify_agent_died(ada_id, None, &mut ctx));
        assert!(post.occupants().contains(ada_id));
    }

    #[test]
    fn conversion_loads_pack_animal() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let muffy = Agent::animal("Muffy", "muffalo", false, true);
        let muffy_id = muffy.id;
        let mut ctx = h.ctx(1);
        post.add_agent(&kind, Agent::humanlike("Ada"), &mut ctx);
        post.add_agent(&kind, muffy, &mut ctx);
        post.add_item(ItemStack::new("steel", 20));

        let caravan = post.convert_to_caravan(&mut ctx).unwrap();
        drop(ctx);
        let caravan = h.world.caravan(caravan).unwrap();
        let carrier = caravan.members.iter().find(|a| a.id == muffy_id).unwrap();
        assert_eq!(carrier.inventory.len(), 1);
        assert!(post.occupants().is_empty());
        assert!(post.inventory().is_empty());
    }

    #[test]
    fn skill_totals_follow_roster() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let mut ctx = h.ctx(1);
        post.add_agent(&kind, Agent::humanlike("Ada").with_skill(Skill::Mining, 8), &mut ctx);
        assert_eq!(post.total_skill(&kind, Skill::Mining), 8);
        post.add_agent(&kind, Agent::humanlike("Bob").with_skill(Skill::Mining, 4), &mut ctx);
        assert_eq!(post.total_skill(&kind, Skill::Mining), 12);
        post.add_agent(
            &kind,
            Agent::humanlike("Cid").with_disabled_skill(Skill::Mining),
            &mut ctx,
        );
        assert_eq!(post.total_skill(&kind, Skill::Mining), 12);
    }

    #[test]
    fn production_string_lists_rules() {
        let h = Harness::new();
        let kind = mining();
        let post = outpost(&h, &kind);
        let text = post.production_string(&kind, &h.catalog, &h.settings);
        assert!(text.starts_with("Will produce 10x steel in"), "{text}");
    }

    #[test]
    fn ticks_render_as_days_and_hours() {
        assert_eq!(format_ticks(210_000), "3 days 12 hours");
        assert_eq!(format_ticks(120_000), "2 days");
        assert_eq!(format_ticks(5_000), "2 hours");
        assert_eq!(format_ticks(10), "less than an hour");
    }

    #[test]
    fn blank_rename_is_ignored() {
        let h = Harness::new();
        let mut post = outpost(&h, &mining());
        assert!(!post.rename("   "));
        assert!(post.rename("Quarry"));
        assert_eq!(post.name(), "Quarry");
    }

    #[test]
    fn admitted_world_agent_is_detached() {
        let mut h = Harness::new();
        let kind = mining();
        let mut post = outpost(&h, &kind);
        let wanderer = Agent::humanlike("Wanderer");
        let id = wanderer.id;
        h.world.register_world_agent(id);
        let mut ctx = h.ctx(1);
        assert_eq!(post.add_agent(&kind, wanderer, &mut ctx), AddAgentOutcome::Added);
        drop(ctx);
        assert!(!h.world.is_world_agent(id));
        assert_eq!(post.kind_name(), "mining");
    }

    #[test]
    fn take_item_splits_a_stack() {
        let h = Harness::new();
        let mut post = outpost(&h, &mining());
        post.add_item(ItemStack::new("silver", 40));
        let id = post.inventory().iter().next().unwrap().id;
        let part = post.take_item(id, Some(15)).unwrap();
        assert_eq!(part.count, 15);
        assert_eq!(post.inventory().count_of("silver"), 25);
        let rest = post.take_item(id, None).unwrap();
        assert_eq!(rest.count, 25);
        assert!(post.inventory().is_empty());
        assert!(matches!(post.take_item(id, None), Err(OutpostError::Agent { .. })));
    }
}
