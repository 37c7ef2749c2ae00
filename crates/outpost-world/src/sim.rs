//! [`SimWorld`]: a deterministic in-memory host.
//!
//! Implements every host trait over plain collections. The engine binary
//! uses it to run outposts without a game attached, and the test suites
//! use it to observe exactly where items and agents end up.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, RngCore};
use tracing::debug;

use outpost_types::{
    Agent, AgentId, AgentStatus, Caravan, CaravanId, Cell, FactionId, ItemStack, Letter,
    OutpostId, Rot4, SettlementId, Tile,
};

use crate::error::WorldError;
use crate::host::{
    BattleSnapshot, Battlefield, CaravanRegistry, DeliveryMap, Notifier, SettlementInfo,
    WorldGrid,
};

/// Default side length of a settlement map.
pub const DEFAULT_MAP_SIZE: i32 = 50;

/// A world tile's static properties.
#[derive(Debug, Clone, PartialEq)]
pub struct SimTile {
    /// Biome name.
    pub biome: String,
    /// World-map x coordinate.
    pub x: f32,
    /// World-map y coordinate.
    pub y: f32,
    /// Whether crops can grow here right now.
    pub growing: bool,
}

/// An agent standing on a settlement map.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedAgent {
    /// Current cell.
    pub cell: Cell,
    /// The agent.
    pub agent: Agent,
    /// Whether it has been hurt since arriving.
    pub harmed: bool,
}

/// A settlement's rendered map.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMap {
    /// Side length.
    pub size: i32,
    /// Delivery spot structure, if built.
    pub delivery_spot: Option<Cell>,
    /// Trade drop spot, if any.
    pub trade_drop_spot: Option<Cell>,
    /// Centre of the home area.
    pub home_center: Cell,
    /// Radius of the home area.
    pub home_radius: i32,
    /// Edges that cannot be reached from inside the colony.
    pub unreachable_edges: Vec<Rot4>,
    /// Cells with no room left to drop items.
    pub full_cells: BTreeSet<Cell>,
    /// Items lying on the ground.
    pub ground: Vec<(Cell, ItemStack)>,
    /// Drop pods that have landed.
    pub pods: Vec<(Cell, Vec<ItemStack>)>,
    /// Agents present.
    pub agents: Vec<SpawnedAgent>,
}

impl SimMap {
    /// An empty square map of `size` cells.
    pub const fn new(size: i32) -> Self {
        Self {
            size,
            delivery_spot: None,
            trade_drop_spot: None,
            home_center: Cell::new(size / 2, size / 2),
            home_radius: size / 5,
            unreachable_edges: Vec::new(),
            full_cells: BTreeSet::new(),
            ground: Vec::new(),
            pods: Vec::new(),
            agents: Vec::new(),
        }
    }

    /// Total count of `def` on the ground or in landed pods.
    pub fn delivered_count(&self, def: &str) -> u32 {
        let ground = self.ground.iter().map(|(_, s)| s);
        let pods = self.pods.iter().flat_map(|(_, items)| items.iter());
        ground
            .chain(pods)
            .filter(|s| s.def == def)
            .fold(0u32, |acc, s| acc.saturating_add(s.count))
    }

    fn edge_cell(&self, side: Rot4) -> Cell {
        let mid = self.size / 2;
        let last = self.size.saturating_sub(1);
        match side {
            Rot4::North => Cell::new(mid, last),
            Rot4::East => Cell::new(last, mid),
            Rot4::South => Cell::new(mid, 0),
            Rot4::West => Cell::new(0, mid),
        }
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.size).contains(&cell.x) && (0..self.size).contains(&cell.z)
    }

    fn random_interior(&self, rng: &mut dyn RngCore) -> Option<Cell> {
        if self.size < 3 {
            return None;
        }
        let hi = self.size.saturating_sub(1);
        for _ in 0..20 {
            let cell = Cell::new(rng.random_range(1..hi), rng.random_range(1..hi));
            if !self.full_cells.contains(&cell) {
                return Some(cell);
            }
        }
        None
    }

    fn spawned(&self, id: AgentId) -> Option<&SpawnedAgent> {
        self.agents.iter().find(|s| s.agent.id == id)
    }

    fn spawned_mut(&mut self, id: AgentId) -> Option<&mut SpawnedAgent> {
        self.agents.iter_mut().find(|s| s.agent.id == id)
    }
}

/// A settlement with its map.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettlement {
    /// World-map view of the settlement.
    pub info: SettlementInfo,
    /// Its map.
    pub map: SimMap,
}

/// An outpost map under attack.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBattle {
    /// Outpost tile.
    pub tile: Tile,
    /// Attacking faction.
    pub faction: FactionId,
    /// Occupants placed on the map.
    pub player_agents: Vec<Agent>,
    /// Raiders.
    pub hostiles: Vec<Agent>,
    /// Incoming raider drop pods.
    pub skyfallers: usize,
    /// Raider structures.
    pub hostile_buildings: usize,
    /// Visible weapons on the ground.
    pub loose_weapons: Vec<ItemStack>,
}

/// In-memory host implementing [`HostWorld`](crate::HostWorld).
#[derive(Debug, Clone)]
pub struct SimWorld {
    tiles: BTreeMap<Tile, SimTile>,
    settlements: BTreeMap<SettlementId, SimSettlement>,
    caravans: BTreeMap<CaravanId, Caravan>,
    world_agents: BTreeSet<AgentId>,
    research: BTreeSet<String>,
    forbidden_events: BTreeSet<String>,
    pack_animals: BTreeMap<String, String>,
    player_faction: FactionId,
    hostile_factions: Vec<FactionId>,
    base_threat_points: f32,
    raider_weapon: String,
    loot_def: String,
    battles: BTreeMap<OutpostId, SimBattle>,
    letters: Vec<Letter>,
    messages: Vec<String>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// An empty world with a fresh player faction.
    pub fn new() -> Self {
        Self {
            tiles: BTreeMap::new(),
            settlements: BTreeMap::new(),
            caravans: BTreeMap::new(),
            world_agents: BTreeSet::new(),
            research: BTreeSet::new(),
            forbidden_events: BTreeSet::new(),
            pack_animals: BTreeMap::new(),
            player_faction: FactionId::new(),
            hostile_factions: Vec::new(),
            base_threat_points: 400.0,
            raider_weapon: String::from("revolver"),
            loot_def: String::from("silver"),
            battles: BTreeMap::new(),
            letters: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Add a tile at world coordinates `(x, y)`.
    pub fn add_tile(&mut self, tile: Tile, biome: &str, x: f32, y: f32) {
        self.tiles.insert(
            tile,
            SimTile {
                biome: biome.to_owned(),
                x,
                y,
                growing: true,
            },
        );
    }

    /// Mutable access to a tile.
    pub fn tile_mut(&mut self, tile: Tile) -> Option<&mut SimTile> {
        self.tiles.get_mut(&tile)
    }

    /// Found a settlement with a default-sized map.
    pub fn add_settlement(&mut self, name: &str, tile: Tile, player_home: bool) -> SettlementId {
        let id = SettlementId::new();
        self.settlements.insert(
            id,
            SimSettlement {
                info: SettlementInfo {
                    id,
                    name: name.to_owned(),
                    tile,
                    player_home,
                },
                map: SimMap::new(DEFAULT_MAP_SIZE),
            },
        );
        id
    }

    /// A settlement's map.
    pub fn map(&self, id: SettlementId) -> Option<&SimMap> {
        self.settlements.get(&id).map(|s| &s.map)
    }

    /// A settlement's map, mutably.
    pub fn map_mut(&mut self, id: SettlementId) -> Option<&mut SimMap> {
        self.settlements.get_mut(&id).map(|s| &mut s.map)
    }

    /// Register an agent as unassigned on the world.
    pub fn register_world_agent(&mut self, id: AgentId) {
        self.world_agents.insert(id);
    }

    /// Whether an agent is registered as unassigned on the world.
    pub fn is_world_agent(&self, id: AgentId) -> bool {
        self.world_agents.contains(&id)
    }

    /// Mark a research project finished.
    pub fn finish_research(&mut self, project: &str) {
        self.research.insert(project.to_owned());
    }

    /// Forbid every agent from taking part in `event`.
    pub fn forbid_event(&mut self, event: &str) {
        self.forbidden_events.insert(event.to_owned());
    }

    /// Set the pack animal race native to `biome`.
    pub fn set_pack_animal(&mut self, biome: &str, race: &str) {
        self.pack_animals.insert(biome.to_owned(), race.to_owned());
    }

    /// Add a faction that may raid outposts.
    pub fn add_hostile_faction(&mut self, faction: FactionId) {
        self.hostile_factions.push(faction);
    }

    /// Set the storyteller's base threat points.
    pub const fn set_base_threat_points(&mut self, points: f32) {
        self.base_threat_points = points;
    }

    /// A battlefield, if one is open.
    pub fn battle(&self, outpost: OutpostId) -> Option<&SimBattle> {
        self.battles.get(&outpost)
    }

    /// A battlefield, mutably.
    pub fn battle_mut(&mut self, outpost: OutpostId) -> Option<&mut SimBattle> {
        self.battles.get_mut(&outpost)
    }

    /// Every caravan on the world map.
    pub fn caravans(&self) -> impl Iterator<Item = &Caravan> {
        self.caravans.values()
    }

    /// Letters received so far.
    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    /// Messages received so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn map_or_err(&self, id: SettlementId) -> Result<&SimMap, WorldError> {
        self.map(id).ok_or(WorldError::SettlementNotFound(id))
    }

    fn map_mut_or_err(&mut self, id: SettlementId) -> Result<&mut SimMap, WorldError> {
        self.map_mut(id).ok_or(WorldError::SettlementNotFound(id))
    }
}

impl WorldGrid for SimWorld {
    fn biome(&self, tile: Tile) -> Option<String> {
        self.tiles.get(&tile).map(|t| t.biome.clone())
    }

    fn longitude(&self, tile: Tile) -> f32 {
        // One world unit per degree.
        self.tiles.get(&tile).map_or(0.0, |t| t.x)
    }

    fn distance(&self, from: Tile, to: Tile) -> f32 {
        match (self.tiles.get(&from), self.tiles.get(&to)) {
            (Some(a), Some(b)) => (b.x - a.x).hypot(b.y - a.y),
            _ => f32::MAX,
        }
    }

    fn direction(&self, from: Tile, to: Tile) -> Rot4 {
        match (self.tiles.get(&from), self.tiles.get(&to)) {
            (Some(a), Some(b)) => Rot4::from_offset(f64::from(b.x - a.x), f64::from(b.y - a.y)),
            _ => Rot4::North,
        }
    }

    fn neighbors(&self, tile: Tile) -> Vec<Tile> {
        self.tiles
            .keys()
            .copied()
            .filter(|t| *t != tile && self.distance(tile, *t) <= 1.5)
            .collect()
    }

    fn growing_possible(&self, tile: Tile) -> bool {
        self.tiles.get(&tile).is_some_and(|t| t.growing)
    }

    fn settlement_at(&self, tile: Tile) -> Option<SettlementInfo> {
        self.settlements
            .values()
            .find(|s| s.info.tile == tile)
            .map(|s| s.info.clone())
    }

    fn settlement(&self, id: SettlementId) -> Option<SettlementInfo> {
        self.settlements.get(&id).map(|s| s.info.clone())
    }

    fn player_homes(&self) -> Vec<SettlementInfo> {
        self.settlements
            .values()
            .filter(|s| s.info.player_home)
            .map(|s| s.info.clone())
            .collect()
    }

    fn player_faction(&self) -> FactionId {
        self.player_faction
    }

    fn research_finished(&self, project: &str) -> bool {
        self.research.contains(project)
    }

    fn event_allowed(&self, _agent: &Agent, event: &str) -> bool {
        !self.forbidden_events.contains(event)
    }

    fn biome_pack_animal(&self, tile: Tile) -> Option<String> {
        let biome = self.tiles.get(&tile)?;
        self.pack_animals.get(&biome.biome).cloned()
    }
}

impl CaravanRegistry for SimWorld {
    fn caravan(&self, id: CaravanId) -> Option<&Caravan> {
        self.caravans.get(&id)
    }

    fn caravan_mut(&mut self, id: CaravanId) -> Option<&mut Caravan> {
        self.caravans.get_mut(&id)
    }

    fn docked_caravan(&self, tile: Tile) -> Option<CaravanId> {
        self.caravans
            .values()
            .find(|c| c.tile == tile && !c.moving)
            .map(|c| c.id)
    }

    fn spawn_caravan(&mut self, caravan: Caravan) -> CaravanId {
        let id = caravan.id;
        debug!(caravan = %id, members = caravan.members.len(), "caravan spawned");
        self.caravans.insert(id, caravan);
        id
    }

    fn remove_caravan(&mut self, id: CaravanId) -> Option<Caravan> {
        self.caravans.remove(&id)
    }

    fn detach_world_agent(&mut self, id: AgentId) -> bool {
        self.world_agents.remove(&id)
    }
}

impl DeliveryMap for SimWorld {
    fn delivery_spot(&self, settlement: SettlementId) -> Option<Cell> {
        self.map(settlement)?.delivery_spot
    }

    fn trade_drop_spot(&self, settlement: SettlementId) -> Option<Cell> {
        self.map(settlement)?.trade_drop_spot
    }

    fn random_drop_spot(&self, settlement: SettlementId, rng: &mut dyn RngCore) -> Option<Cell> {
        self.map(settlement)?.random_interior(rng)
    }

    fn reachable_edge_cell(&self, settlement: SettlementId, side: Rot4) -> Option<Cell> {
        let map = self.map(settlement)?;
        (!map.unreachable_edges.contains(&side)).then(|| map.edge_cell(side))
    }

    fn random_edge_cell(&self, settlement: SettlementId, rng: &mut dyn RngCore) -> Option<Cell> {
        let map = self.map(settlement)?;
        let sides: Vec<Rot4> = [Rot4::North, Rot4::East, Rot4::South, Rot4::West]
            .into_iter()
            .filter(|s| !map.unreachable_edges.contains(s))
            .collect();
        if sides.is_empty() {
            return None;
        }
        let side = *sides.get(rng.random_range(0..sides.len()))?;
        let along = rng.random_range(0..map.size);
        let last = map.size.saturating_sub(1);
        Some(match side {
            Rot4::North => Cell::new(along, last),
            Rot4::East => Cell::new(last, along),
            Rot4::South => Cell::new(along, 0),
            Rot4::West => Cell::new(0, along),
        })
    }

    fn outside_colony_cell(&self, settlement: SettlementId) -> Option<Cell> {
        let map = self.map(settlement)?;
        let cell = Cell::new(
            map.home_center
                .x
                .saturating_add(map.home_radius)
                .saturating_add(2),
            map.home_center.z,
        );
        map.in_bounds(cell).then_some(cell)
    }

    fn random_reachable_cell(
        &self,
        settlement: SettlementId,
        rng: &mut dyn RngCore,
    ) -> Option<Cell> {
        self.map(settlement)?.random_interior(rng)
    }

    fn find_drop_spot_near(
        &self,
        settlement: SettlementId,
        near: Cell,
        _rng: &mut dyn RngCore,
    ) -> Option<Cell> {
        let map = self.map(settlement)?;
        for radius in 1i32..=25 {
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    let cell = Cell::new(near.x.saturating_add(dx), near.z.saturating_add(dz));
                    if map.in_bounds(cell) && !map.full_cells.contains(&cell) {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }

    fn place_items(
        &mut self,
        settlement: SettlementId,
        cell: Cell,
        items: Vec<ItemStack>,
    ) -> Result<(), WorldError> {
        let map = self.map_mut_or_err(settlement)?;
        map.ground.extend(items.into_iter().map(|s| (cell, s)));
        Ok(())
    }

    fn launch_drop_pod(
        &mut self,
        settlement: SettlementId,
        cell: Cell,
        items: Vec<ItemStack>,
    ) -> Result<(), WorldError> {
        let map = self.map_mut_or_err(settlement)?;
        map.pods.push((cell, items));
        Ok(())
    }

    fn spawn_agent(
        &mut self,
        settlement: SettlementId,
        agent: Agent,
        cell: Cell,
    ) -> Result<(), WorldError> {
        let map = self.map_mut_or_err(settlement)?;
        map.agents.push(SpawnedAgent {
            cell,
            agent,
            harmed: false,
        });
        Ok(())
    }

    fn agent_position(&self, settlement: SettlementId, agent: AgentId) -> Option<Cell> {
        self.map(settlement)?.spawned(agent).map(|s| s.cell)
    }

    fn agent_harmed(&self, settlement: SettlementId, agent: AgentId) -> bool {
        self.map(settlement)
            .and_then(|m| m.spawned(agent))
            .is_some_and(|s| s.harmed)
    }

    fn step_agent_toward(
        &mut self,
        settlement: SettlementId,
        agent: AgentId,
        target: Cell,
    ) -> Result<Cell, WorldError> {
        let spawned = self
            .map_mut_or_err(settlement)?
            .spawned_mut(agent)
            .ok_or(WorldError::AgentNotOnMap { agent, settlement })?;
        let step = |from: i32, to: i32| from.saturating_add((to.saturating_sub(from)).signum());
        spawned.cell = Cell::new(step(spawned.cell.x, target.x), step(spawned.cell.z, target.z));
        Ok(spawned.cell)
    }

    fn unload_agent(
        &mut self,
        settlement: SettlementId,
        agent: AgentId,
    ) -> Result<usize, WorldError> {
        let map = self.map_mut_or_err(settlement)?;
        let full = map.full_cells.clone();
        let spawned = map
            .spawned_mut(agent)
            .ok_or(WorldError::AgentNotOnMap { agent, settlement })?;
        if full.contains(&spawned.cell) {
            return Ok(spawned.agent.inventory.len());
        }
        let cell = spawned.cell;
        let items = core::mem::take(&mut spawned.agent.inventory);
        map.ground.extend(items.into_iter().map(|s| (cell, s)));
        Ok(0)
    }

    fn despawn_agent(&mut self, settlement: SettlementId, agent: AgentId) -> Option<Agent> {
        let map = self.map_mut(settlement)?;
        let idx = map.agents.iter().position(|s| s.agent.id == agent)?;
        Some(map.agents.remove(idx).agent)
    }
}

impl Battlefield for SimWorld {
    fn map_active(&self, outpost: OutpostId) -> bool {
        self.battles.contains_key(&outpost)
    }

    fn map_threat_points(&self, outpost: OutpostId) -> Option<f32> {
        self.battles
            .contains_key(&outpost)
            .then_some(self.base_threat_points)
    }

    fn raid_target(&self, _tile: Tile, rng: &mut dyn RngCore) -> Option<(FactionId, f32)> {
        if self.hostile_factions.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.hostile_factions.len());
        let faction = *self.hostile_factions.get(idx)?;
        Some((faction, self.base_threat_points))
    }

    fn open_battlefield(
        &mut self,
        outpost: OutpostId,
        tile: Tile,
        occupants: Vec<Agent>,
        faction: FactionId,
        points: f32,
    ) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let raiders = ((points / 100.0).round() as usize).max(1);
        let hostiles = (0..raiders)
            .map(|i| {
                let mut raider = Agent::humanlike(format!("Raider {i}")).with_faction(faction);
                raider
                    .equipment
                    .push(ItemStack::new(self.raider_weapon.clone(), 1));
                raider
            })
            .collect();
        debug!(outpost = %outpost, raiders, points, "battlefield opened");
        self.battles.insert(
            outpost,
            SimBattle {
                tile,
                faction,
                player_agents: occupants,
                hostiles,
                skyfallers: 0,
                hostile_buildings: 0,
                loose_weapons: Vec::new(),
            },
        );
    }

    fn snapshot(&self, outpost: OutpostId, faction: FactionId) -> Option<BattleSnapshot> {
        let battle = self.battles.get(&outpost)?;
        Some(BattleSnapshot {
            active_hostiles: battle
                .hostiles
                .iter()
                .filter(|h| h.faction == Some(faction) && !h.is_dead() && !h.is_downed())
                .count(),
            skyfallers: battle.skyfallers,
            hostile_buildings: battle.hostile_buildings,
            free_colonists: battle
                .player_agents
                .iter()
                .filter(|a| a.is_humanlike() && !a.is_dead() && a.status == AgentStatus::Free)
                .count(),
        })
    }

    fn take_player_agents(&mut self, outpost: OutpostId, _player: FactionId) -> Vec<Agent> {
        let Some(battle) = self.battles.get_mut(&outpost) else {
            return Vec::new();
        };
        let (alive, dead): (Vec<Agent>, Vec<Agent>) = core::mem::take(&mut battle.player_agents)
            .into_iter()
            .partition(|a| !a.is_dead());
        battle.player_agents = dead;
        alive
    }

    fn take_loose_weapons(&mut self, outpost: OutpostId) -> Vec<ItemStack> {
        self.battles
            .get_mut(&outpost)
            .map(|b| core::mem::take(&mut b.loose_weapons))
            .unwrap_or_default()
    }

    fn take_player_corpses(&mut self, outpost: OutpostId, _player: FactionId) -> Vec<ItemStack> {
        let Some(battle) = self.battles.get_mut(&outpost) else {
            return Vec::new();
        };
        let (dead, alive): (Vec<Agent>, Vec<Agent>) = core::mem::take(&mut battle.player_agents)
            .into_iter()
            .partition(Agent::is_dead);
        battle.player_agents = alive;
        dead.into_iter().map(ItemStack::corpse_of).collect()
    }

    fn take_hostile_corpse_weapons(
        &mut self,
        outpost: OutpostId,
        faction: FactionId,
    ) -> Vec<ItemStack> {
        let Some(battle) = self.battles.get_mut(&outpost) else {
            return Vec::new();
        };
        battle
            .hostiles
            .iter_mut()
            .filter(|h| h.is_dead() && h.faction == Some(faction))
            .flat_map(|h| core::mem::take(&mut h.equipment))
            .collect()
    }

    fn take_downed_hostile(&mut self, outpost: OutpostId, faction: FactionId) -> Option<Agent> {
        let battle = self.battles.get_mut(&outpost)?;
        let idx = battle
            .hostiles
            .iter()
            .position(|h| h.faction == Some(faction) && h.is_humanlike() && h.is_downed())?;
        Some(battle.hostiles.remove(idx))
    }

    fn faction_loot(
        &self,
        _faction: FactionId,
        value: f32,
        _rng: &mut dyn RngCore,
    ) -> Vec<ItemStack> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = value.max(0.0).floor() as u32;
        if count == 0 {
            Vec::new()
        } else {
            vec![ItemStack::new(self.loot_def.clone(), count)]
        }
    }

    fn close_battlefield(&mut self, outpost: OutpostId) {
        self.battles.remove(&outpost);
    }
}

impl Notifier for SimWorld {
    fn send_letter(&mut self, letter: Letter) {
        debug!(label = letter.label, "letter");
        self.letters.push(letter);
    }

    fn message(&mut self, text: String) {
        self.messages.push(text);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn world() -> (SimWorld, SettlementId) {
        let mut w = SimWorld::new();
        w.add_tile(Tile(0), "temperate_forest", 0.0, 0.0);
        w.add_tile(Tile(1), "temperate_forest", 1.0, 0.0);
        w.add_tile(Tile(9), "tundra", 9.0, 0.0);
        let home = w.add_settlement("Home", Tile(0), true);
        (w, home)
    }

    #[test]
    fn neighbors_and_direction() {
        let (w, _) = world();
        assert_eq!(w.neighbors(Tile(0)), vec![Tile(1)]);
        assert_eq!(w.direction(Tile(0), Tile(9)), Rot4::East);
        assert!((w.distance(Tile(0), Tile(9)) - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unreachable_edges_are_skipped() {
        let (mut w, home) = world();
        w.map_mut(home).unwrap().unreachable_edges.push(Rot4::East);
        assert!(w.reachable_edge_cell(home, Rot4::East).is_none());
        assert_eq!(w.reachable_edge_cell(home, Rot4::West), Some(Cell::new(0, 25)));
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let cell = w.random_edge_cell(home, &mut rng).unwrap();
            let on_east_side = cell.x == 49 && cell.z != 0 && cell.z != 49;
            assert!(!on_east_side);
        }
    }

    #[test]
    fn unloading_on_a_full_cell_keeps_cargo() {
        let (mut w, home) = world();
        let mut muffalo = Agent::animal("Muffy", "muffalo", false, true);
        muffalo.inventory.push(ItemStack::new("steel", 10));
        let id = muffalo.id;
        w.spawn_agent(home, muffalo, Cell::new(5, 5)).unwrap();
        w.map_mut(home).unwrap().full_cells.insert(Cell::new(5, 5));
        assert_eq!(w.unload_agent(home, id).unwrap(), 1);
        w.map_mut(home).unwrap().full_cells.clear();
        assert_eq!(w.unload_agent(home, id).unwrap(), 0);
        assert_eq!(w.map(home).unwrap().delivered_count("steel"), 10);
    }

    #[test]
    fn agents_step_one_cell_at_a_time() {
        let (mut w, home) = world();
        let agent = Agent::humanlike("Walker");
        let id = agent.id;
        w.spawn_agent(home, agent, Cell::new(0, 0)).unwrap();
        let pos = w.step_agent_toward(home, id, Cell::new(3, 1)).unwrap();
        assert_eq!(pos, Cell::new(1, 1));
        let pos = w.step_agent_toward(home, id, Cell::new(3, 1)).unwrap();
        assert_eq!(pos, Cell::new(2, 1));
    }

    #[test]
    fn battlefield_counts_active_hostiles() {
        let (mut w, _) = world();
        let outpost = OutpostId::new();
        let raiders = FactionId::new();
        w.open_battlefield(outpost, Tile(9), vec![Agent::humanlike("Ada")], raiders, 300.0);
        let snap = w.snapshot(outpost, raiders).unwrap();
        assert_eq!(snap.active_hostiles, 3);
        assert_eq!(snap.free_colonists, 1);
        for h in &mut w.battle_mut(outpost).unwrap().hostiles {
            h.health.dead = true;
        }
        assert_eq!(w.snapshot(outpost, raiders).unwrap().active_hostiles, 0);
        assert_eq!(w.take_hostile_corpse_weapons(outpost, raiders).len(), 3);
    }

    #[test]
    fn missing_settlement_is_an_error() {
        let (mut w, _) = world();
        let result = w.place_items(SettlementId::new(), Cell::new(1, 1), Vec::new());
        assert!(matches!(result, Err(WorldError::SettlementNotFound(_))));
    }
}
