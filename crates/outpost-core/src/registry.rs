//! The outpost registry: every outpost in a run plus the shared state they
//! tick against.
//!
//! Outposts live in an arena keyed by [`OutpostId`]; nothing holds a
//! reference to an outpost across calls. The registry owns the seeded
//! generator, the ledger, and in-flight pack-animal transports, and builds a
//! fresh [`TickContext`] for each call into an outpost.
//!
//! One call to [`OutpostRegistry::tick_all`] is one simulation tick:
//!
//! 1. every outpost ticks (packing, production, needs, raids) in id order;
//! 2. every in-flight transport advances one step;
//! 3. converted, abandoned, and lost outposts are removed;
//! 4. the ledger is checked for conservation at this tick.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use outpost_agents::NeedsConfig;
use outpost_ledger::{ConservationResult, Ledger};
use outpost_types::{CaravanId, ItemCatalog, OutpostId, Tile};
use outpost_world::{CaravanRegistry, HostWorld, WorldGrid};

use crate::admission::{Placement, can_spawn_on_tile, requirements_report};
use crate::arrival::{PodOption, TransportPods};
use crate::commands::{CommandDescriptor, CommandOutcome, OutpostCommand};
use crate::config::SimulationConfig;
use crate::context::{OutpostEvent, TickContext};
use crate::delivery::nearest_home;
use crate::delivery::transport::TransportJob;
use crate::error::OutpostError;
use crate::kind::OutpostKind;
use crate::outpost::{Outpost, TickOutcome};
use crate::settings::{OutpostsSettings, SettingsRegistry};

/// What one registry tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick just run.
    pub tick: u64,
    /// Events raised since the previous tick, including by commands.
    pub events: Vec<OutpostEvent>,
    /// Outposts removed this tick.
    pub removed: Vec<OutpostId>,
    /// Transports still walking after this tick.
    pub transports_in_flight: usize,
    /// Ledger conservation at this tick.
    pub conservation: ConservationResult,
}

/// Persisted registry state.
#[derive(Debug, Serialize, Deserialize)]
struct RegistrySnapshot {
    tick: u64,
    outposts: Vec<Outpost>,
    #[serde(default)]
    transports: Vec<TransportJob>,
}

/// Every outpost in a run.
#[derive(Debug)]
pub struct OutpostRegistry {
    settings: OutpostsSettings,
    needs: NeedsConfig,
    catalog: ItemCatalog,
    kinds: BTreeMap<String, OutpostKind>,
    outposts: BTreeMap<OutpostId, Outpost>,
    transports: Vec<TransportJob>,
    pending: Vec<OutpostEvent>,
    ledger: Ledger,
    rng: SmallRng,
    tick: u64,
}

impl OutpostRegistry {
    /// Build a registry from configuration. Per-kind setting overrides are
    /// applied here.
    pub fn new(config: SimulationConfig) -> Self {
        let SimulationConfig {
            mut settings,
            needs,
            items,
            outpost_kinds,
        } = config;
        settings.sanitize();
        let descriptors = SettingsRegistry::outpost_kinds();
        let mut kinds = BTreeMap::new();
        for raw in outpost_kinds {
            let mut kind = OutpostKind::from_config(raw, &needs);
            if let Some(overrides) = settings.overrides_for(&kind.name) {
                let applied = descriptors.apply_overrides(&mut kind, overrides);
                debug!(kind = %kind.name, applied, "setting overrides applied");
            }
            if kinds.contains_key(&kind.name) {
                warn!(kind = %kind.name, "duplicate outpost kind, keeping the first");
                continue;
            }
            kinds.insert(kind.name.clone(), kind);
        }
        info!(kinds = kinds.len(), seed = settings.seed, "outpost registry ready");
        Self {
            rng: SmallRng::seed_from_u64(settings.seed),
            settings,
            needs,
            catalog: items,
            kinds,
            outposts: BTreeMap::new(),
            transports: Vec::new(),
            pending: Vec::new(),
            ledger: Ledger::new(),
            tick: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Global settings.
    pub const fn settings(&self) -> &OutpostsSettings {
        &self.settings
    }

    /// The item catalog.
    pub const fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// The transfer ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// A configured kind.
    pub fn kind(&self, name: &str) -> Option<&OutpostKind> {
        self.kinds.get(name)
    }

    /// Every configured kind, by name.
    pub fn kinds(&self) -> impl Iterator<Item = &OutpostKind> {
        self.kinds.values()
    }

    /// One outpost.
    pub fn outpost(&self, id: OutpostId) -> Option<&Outpost> {
        self.outposts.get(&id)
    }

    /// Every outpost, by id.
    pub fn outposts(&self) -> impl Iterator<Item = &Outpost> {
        self.outposts.values()
    }

    /// Pack-animal transports still walking.
    pub fn transports(&self) -> &[TransportJob] {
        &self.transports
    }

    fn outpost_tiles(&self) -> Vec<Tile> {
        self.outposts.values().map(|o| o.tile).collect()
    }

    fn kind_for(&self, outpost: &Outpost) -> Result<&OutpostKind, OutpostError> {
        self.kinds
            .get(&outpost.kind)
            .ok_or_else(|| OutpostError::UnknownKind(outpost.kind.clone()))
    }

    // -----------------------------------------------------------------------
    // Founding
    // -----------------------------------------------------------------------

    /// Founding checklist for `caravan` settling a `kind` outpost where it
    /// stands.
    pub fn founding_report(
        &self,
        world: &dyn HostWorld,
        kind: &str,
        caravan: CaravanId,
    ) -> Result<String, OutpostError> {
        let kind = self
            .kinds
            .get(kind)
            .ok_or_else(|| OutpostError::UnknownKind(kind.to_owned()))?;
        let caravan = world
            .caravan(caravan)
            .ok_or(OutpostError::CaravanNotDocked(caravan))?;
        let tiles = self.outpost_tiles();
        let placement = Placement {
            kind,
            tile: caravan.tile,
            agents: &caravan.members,
            caravan: Some(caravan),
            outpost_tiles: &tiles,
        };
        Ok(requirements_report(placement, world))
    }

    /// Settle `caravan` as a new outpost of `kind` on its tile.
    ///
    /// Every member that passes admission moves in, the caravan's items go
    /// to the container, and the creation cost is paid. Deliveries default
    /// to the nearest player home.
    pub fn found(
        &mut self,
        world: &mut dyn HostWorld,
        kind: &str,
        caravan_id: CaravanId,
        name: impl Into<String>,
    ) -> Result<OutpostId, OutpostError> {
        let tiles = self.outpost_tiles();
        let kind = self
            .kinds
            .get(kind)
            .ok_or_else(|| OutpostError::UnknownKind(kind.to_owned()))?;
        let (tile, members) = {
            let caravan = world
                .caravan(caravan_id)
                .ok_or(OutpostError::CaravanNotDocked(caravan_id))?;
            let placement = Placement {
                kind,
                tile: caravan.tile,
                agents: &caravan.members,
                caravan: Some(caravan),
                outpost_tiles: &tiles,
            };
            let report = can_spawn_on_tile(placement, &*world);
            if !report.accepted {
                return Err(OutpostError::PlacementRejected {
                    reason: report.reason.unwrap_or_default(),
                });
            }
            let members: Vec<_> = caravan.members.iter().map(|a| a.id).collect();
            (caravan.tile, members)
        };

        let mut outpost = Outpost::new(name, kind, tile, world.player_faction(), &self.settings);
        outpost.set_delivery_destination(nearest_home(&*world, tile).map(|home| home.id));
        let mut ctx = TickContext::new(
            world,
            &self.settings,
            &self.needs,
            &self.catalog,
            &mut self.rng,
            &mut self.ledger,
            self.tick,
        );
        for agent in members {
            if ctx.world.caravan(caravan_id).is_none() {
                break;
            }
            match outpost.add_agent_from_caravan(kind, caravan_id, agent, &mut ctx) {
                Ok(report) if !report.accepted => {
                    debug!(agent = %agent, reason = report.reason_or_empty(), "member stays in caravan");
                }
                Ok(_) | Err(OutpostError::AgentNotFound(_)) => {}
                Err(err) => warn!(agent = %agent, error = %err, "member could not move in"),
            }
        }
        self.pending.append(&mut ctx.events);
        self.transports.append(&mut ctx.transports);

        let id = outpost.id;
        info!(outpost = %id, kind = %kind.name, occupants = outpost.occupants.len(), "outpost founded");
        self.outposts.insert(id, outpost);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every outpost and transport one tick.
    pub fn tick_all(&mut self, world: &mut dyn HostWorld) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let tick = self.tick;
        let mut removed = Vec::new();
        let mut ctx = TickContext::new(
            world,
            &self.settings,
            &self.needs,
            &self.catalog,
            &mut self.rng,
            &mut self.ledger,
            tick,
        );
        for (id, outpost) in &mut self.outposts {
            let Some(kind) = self.kinds.get(&outpost.kind) else {
                error!(outpost = %id, kind = %outpost.kind, "outpost of unknown kind skipped");
                continue;
            };
            match outpost.tick(kind, &mut ctx) {
                TickOutcome::Continue => {}
                TickOutcome::Converted(_) | TickOutcome::Abandoned | TickOutcome::Lost => {
                    removed.push(*id);
                }
            }
        }
        for job in &mut self.transports {
            job.advance(&mut ctx);
        }
        let TickContext {
            mut events,
            transports,
            ..
        } = ctx;

        self.transports.retain(|job| !job.is_finished());
        self.transports.extend(transports);
        for id in &removed {
            if let Some(outpost) = self.outposts.remove(id) {
                info!(outpost = %id, name = %outpost.name, "outpost removed");
            }
        }
        let mut all = core::mem::take(&mut self.pending);
        all.append(&mut events);
        TickSummary {
            tick,
            events: all,
            removed,
            transports_in_flight: self.transports.len(),
            conservation: self.ledger.verify_conservation(tick),
        }
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    /// Commands on one outpost.
    pub fn commands(&self, id: OutpostId) -> Result<Vec<CommandDescriptor>, OutpostError> {
        let outpost = self.outposts.get(&id).ok_or(OutpostError::OutpostNotFound(id))?;
        Ok(outpost.commands(self.kind_for(outpost)?, &self.settings))
    }

    /// Commands a docked caravan offers toward one outpost.
    pub fn caravan_commands(
        &self,
        world: &dyn HostWorld,
        id: OutpostId,
        caravan: CaravanId,
    ) -> Result<Vec<CommandDescriptor>, OutpostError> {
        let outpost = self.outposts.get(&id).ok_or(OutpostError::OutpostNotFound(id))?;
        let caravan = world
            .caravan(caravan)
            .ok_or(OutpostError::CaravanNotDocked(caravan))?;
        Ok(outpost.caravan_commands(self.kind_for(outpost)?, caravan, world))
    }

    /// Run a command on one outpost. Events it raises are reported with the
    /// next tick.
    pub fn execute(
        &mut self,
        world: &mut dyn HostWorld,
        id: OutpostId,
        command: OutpostCommand,
    ) -> Result<CommandOutcome, OutpostError> {
        let outpost = self
            .outposts
            .get_mut(&id)
            .ok_or(OutpostError::OutpostNotFound(id))?;
        let kind = self
            .kinds
            .get(&outpost.kind)
            .ok_or_else(|| OutpostError::UnknownKind(outpost.kind.clone()))?;
        let mut ctx = TickContext::new(
            world,
            &self.settings,
            &self.needs,
            &self.catalog,
            &mut self.rng,
            &mut self.ledger,
            self.tick,
        );
        let outcome = outpost.execute_command(kind, command, &mut ctx);
        self.pending.append(&mut ctx.events);
        self.transports.append(&mut ctx.transports);
        outcome
    }

    /// Arrival actions every outpost offers for `pods`.
    pub fn transport_pod_options(&self, pods: &TransportPods) -> Vec<PodOption> {
        self.outposts
            .values()
            .flat_map(|o| o.transport_pod_options(pods))
            .collect()
    }

    /// Land `pods` on one outpost. Whatever it does not take is handed back.
    pub fn arrive(
        &mut self,
        world: &mut dyn HostWorld,
        id: OutpostId,
        pods: TransportPods,
    ) -> Result<TransportPods, OutpostError> {
        let outpost = self
            .outposts
            .get_mut(&id)
            .ok_or(OutpostError::OutpostNotFound(id))?;
        let kind = self
            .kinds
            .get(&outpost.kind)
            .ok_or_else(|| OutpostError::UnknownKind(outpost.kind.clone()))?;
        let mut ctx = TickContext::new(
            world,
            &self.settings,
            &self.needs,
            &self.catalog,
            &mut self.rng,
            &mut self.ledger,
            self.tick,
        );
        let rejected = outpost.arrive(kind, pods, &mut ctx);
        self.pending.append(&mut ctx.events);
        Ok(rejected)
    }

    /// End an incursion on one outpost at once.
    pub fn force_end_incursion(
        &mut self,
        world: &mut dyn HostWorld,
        id: OutpostId,
    ) -> Result<bool, OutpostError> {
        let outpost = self
            .outposts
            .get_mut(&id)
            .ok_or(OutpostError::OutpostNotFound(id))?;
        let mut ctx = TickContext::new(
            world,
            &self.settings,
            &self.needs,
            &self.catalog,
            &mut self.rng,
            &mut self.ledger,
            self.tick,
        );
        let ended = outpost.force_end_incursion(&mut ctx);
        self.pending.append(&mut ctx.events);
        Ok(ended)
    }

    /// Inspection text for one outpost.
    pub fn inspect(&self, id: OutpostId) -> Result<String, OutpostError> {
        let outpost = self.outposts.get(&id).ok_or(OutpostError::OutpostNotFound(id))?;
        Ok(outpost.inspect_string(self.kind_for(outpost)?, &self.catalog, &self.settings))
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Serialize every outpost and in-flight transport.
    pub fn save_json(&self) -> Result<String, OutpostError> {
        let snapshot = RegistrySnapshot {
            tick: self.tick,
            outposts: self.outposts.values().cloned().collect(),
            transports: self.transports.clone(),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Replace every outpost and transport with saved state. Duplicate
    /// occupants and empty stacks in the save are swept.
    pub fn load_json(&mut self, json: &str) -> Result<(), OutpostError> {
        let snapshot: RegistrySnapshot = serde_json::from_str(json)?;
        let mut outposts = BTreeMap::new();
        for mut outpost in snapshot.outposts {
            let swept = outpost
                .occupants
                .sweep_duplicates()
                .saturating_add(outpost.inventory.purge_invalid());
            if swept > 0 {
                debug!(outpost = %outpost.id, swept, "repaired saved outpost");
            }
            if !self.kinds.contains_key(&outpost.kind) {
                warn!(outpost = %outpost.id, kind = %outpost.kind, "saved outpost has unknown kind");
            }
            outposts.insert(outpost.id, outpost);
        }
        self.tick = snapshot.tick;
        self.outposts = outposts;
        self.transports = snapshot.transports;
        info!(tick = self.tick, outposts = self.outposts.len(), "registry loaded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outpost_types::{Agent, Caravan, DeliveryMethod, ItemStack, Skill};
    use outpost_world::SimWorld;

    use super::*;

    const CONFIG: &str = r"
settings:
  delivery_method: store
  do_raids: false
  seed: 7
  per_outpost:
    mining:
      OutpostKind.TicksPerProduction: '60000'
items:
  - { name: steel, stack_limit: 75, market_value: 2 }
outpost_kinds:
  - name: mining
    min_agents: 1
    ticks_per_production: 120000
    cost_to_make:
      - { item: steel, count: 10 }
    result_rules:
      - item: steel
        base_amount: 5
        amounts_per_skill:
          - mining: 1
";

    fn world() -> (SimWorld, CaravanId) {
        let mut world = SimWorld::new();
        world.add_tile(Tile(0), "temperate_forest", 0.0, 0.0);
        world.add_tile(Tile(5), "temperate_forest", 5.0, 0.0);
        world.add_settlement("Home", Tile(0), true);
        let mut ada = Agent::humanlike("Ada").with_skill(Skill::Mining, 5);
        ada.inventory.push(ItemStack::new("steel", 30));
        let caravan = world.spawn_caravan(Caravan::new("c", Tile(5), vec![ada]));
        (world, caravan)
    }

    fn registry() -> OutpostRegistry {
        OutpostRegistry::new(SimulationConfig::parse(CONFIG).unwrap())
    }

    #[test]
    fn overrides_apply_to_kinds() {
        let registry = registry();
        assert_eq!(registry.kind("mining").unwrap().ticks_per_production, 60_000);
        assert_eq!(registry.settings().delivery_method, DeliveryMethod::Store);
    }

    #[test]
    fn founding_absorbs_caravan_and_pays_cost() {
        let mut registry = registry();
        let (mut world, caravan) = world();
        let report = registry.founding_report(&world, "mining", caravan).unwrap();
        assert!(report.lines().all(|l| l.starts_with('✓')), "{report}");

        let id = registry.found(&mut world, "mining", caravan, "Quarry").unwrap();
        let post = registry.outpost(id).unwrap();
        assert_eq!(post.occupants().len(), 1);
        assert!(post.cost_paid());
        assert_eq!(post.inventory().count_of("steel"), 20);
        assert!(post.delivery_destination().is_some());
        assert!(world.caravan(caravan).is_none());
    }

    #[test]
    fn founding_next_to_settlement_is_rejected() {
        let mut registry = registry();
        let (mut world, _) = world();
        world.add_tile(Tile(1), "temperate_forest", 1.0, 0.0);
        let near = world.spawn_caravan(Caravan::new("n", Tile(1), vec![Agent::humanlike("Bob")]));
        assert!(matches!(
            registry.found(&mut world, "mining", near, "Too close"),
            Err(OutpostError::PlacementRejected { .. })
        ));
        assert!(matches!(
            registry.found(&mut world, "farming", near, "Nope"),
            Err(OutpostError::UnknownKind(_))
        ));
    }

    #[test]
    fn production_fires_once_per_period() {
        let mut registry = registry();
        let (mut world, caravan) = world();
        let id = registry.found(&mut world, "mining", caravan, "Quarry").unwrap();
        let mut produced = 0;
        for _ in 0..60_000 {
            let summary = registry.tick_all(&mut world);
            assert_eq!(summary.conservation, ConservationResult::Balanced);
            produced += summary
                .events
                .iter()
                .filter(|e| matches!(e, OutpostEvent::Produced { .. }))
                .count();
        }
        assert_eq!(produced, 1);
        assert_eq!(registry.outpost(id).unwrap().inventory().count_of("steel"), 30);
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut registry = registry();
        let (mut world, caravan) = world();
        let id = registry.found(&mut world, "mining", caravan, "Quarry").unwrap();
        registry
            .execute(&mut world, id, OutpostCommand::StartPacking)
            .unwrap();
        for _ in 0..10 {
            registry.tick_all(&mut world);
        }
        let json = registry.save_json().unwrap();

        let mut restored = OutpostRegistry::new(SimulationConfig::parse(CONFIG).unwrap());
        restored.load_json(&json).unwrap();
        assert_eq!(restored.tick(), 10);
        let before = registry.outpost(id).unwrap();
        let after = restored.outpost(id).unwrap();
        assert_eq!(after.name(), before.name());
        assert_eq!(after.packing(), before.packing());
        assert_eq!(after.production(), before.production());
        assert_eq!(after.inventory().count_of("steel"), 20);
        assert_eq!(
            restored.inspect(id).unwrap(),
            registry.inspect(id).unwrap()
        );
    }

    #[test]
    fn commands_reach_the_outpost() {
        let mut registry = registry();
        let (mut world, caravan) = world();
        let id = registry.found(&mut world, "mining", caravan, "Quarry").unwrap();
        assert!(!registry.commands(id).unwrap().is_empty());
        assert!(matches!(
            registry.execute(&mut world, OutpostId::new(), OutpostCommand::StopPacking),
            Err(OutpostError::OutpostNotFound(_))
        ));
        assert!(matches!(
            registry.execute(&mut world, id, OutpostCommand::StopPacking),
            Err(OutpostError::NotPacking)
        ));
    }
}
