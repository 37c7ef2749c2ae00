//! Interfaces the outpost engine consumes from its host simulation.
//!
//! The host owns everything outside an outpost: the world map, caravans,
//! settlement maps, battlefields, and the player's letter stack. Each
//! concern is its own trait; [`HostWorld`] bundles them so the engine can
//! take a single `&mut dyn HostWorld`.
//!
//! Methods that need randomness take `&mut dyn RngCore` so that every
//! trait stays object safe and the engine's seeded generator drives all
//! random choices.

use rand::RngCore;

use outpost_types::{
    Agent, AgentId, Caravan, CaravanId, Cell, FactionId, ItemStack, Letter, OutpostId, Rot4,
    SettlementId, Tile,
};

use crate::error::WorldError;

/// A settlement as seen from the world map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementInfo {
    /// Settlement id.
    pub id: SettlementId,
    /// Display name.
    pub name: String,
    /// World tile.
    pub tile: Tile,
    /// Whether the player owns it.
    pub player_home: bool,
}

/// World-map queries: tiles, distances, settlements, research, ideology.
pub trait WorldGrid {
    /// Biome name of a tile.
    fn biome(&self, tile: Tile) -> Option<String>;

    /// Longitude in degrees, used for local time of day.
    fn longitude(&self, tile: Tile) -> f32;

    /// World-map travel distance between two tiles.
    fn distance(&self, from: Tile, to: Tile) -> f32;

    /// Direction from `from` toward `to`.
    fn direction(&self, from: Tile, to: Tile) -> Rot4;

    /// Tiles adjacent to `tile`.
    fn neighbors(&self, tile: Tile) -> Vec<Tile>;

    /// Whether crops can currently be grown on `tile`.
    fn growing_possible(&self, tile: Tile) -> bool;

    /// Settlement on `tile`, if any.
    fn settlement_at(&self, tile: Tile) -> Option<SettlementInfo>;

    /// Look up a settlement.
    fn settlement(&self, id: SettlementId) -> Option<SettlementInfo>;

    /// Every player home with a map.
    fn player_homes(&self) -> Vec<SettlementInfo>;

    /// The player's faction.
    fn player_faction(&self) -> FactionId;

    /// Whether a research project is finished.
    fn research_finished(&self, project: &str) -> bool;

    /// Whether the agent's beliefs permit taking part in `event`.
    fn event_allowed(&self, agent: &Agent, event: &str) -> bool;

    /// The pack animal race native to a tile's biome.
    fn biome_pack_animal(&self, tile: Tile) -> Option<String>;
}

/// Caravans and the registry of agents not assigned anywhere.
pub trait CaravanRegistry {
    /// Look up a caravan.
    fn caravan(&self, id: CaravanId) -> Option<&Caravan>;

    /// Look up a caravan mutably.
    fn caravan_mut(&mut self, id: CaravanId) -> Option<&mut Caravan>;

    /// A player caravan stationary on `tile`, if any.
    fn docked_caravan(&self, tile: Tile) -> Option<CaravanId>;

    /// Put a new caravan on the world map.
    fn spawn_caravan(&mut self, caravan: Caravan) -> CaravanId;

    /// Remove a caravan from the world map, returning what is left of it.
    fn remove_caravan(&mut self, id: CaravanId) -> Option<Caravan>;

    /// Detach an agent from the world's unassigned-agent registry.
    /// Returns `true` if it was registered.
    fn detach_world_agent(&mut self, id: AgentId) -> bool;
}

/// Placement of delivered items and pack animals on settlement maps.
pub trait DeliveryMap {
    /// The configured delivery spot structure, if one is built.
    fn delivery_spot(&self, settlement: SettlementId) -> Option<Cell>;

    /// The trade drop spot, if one exists.
    fn trade_drop_spot(&self, settlement: SettlementId) -> Option<Cell>;

    /// A random cell suitable for a drop pod landing.
    fn random_drop_spot(&self, settlement: SettlementId, rng: &mut dyn RngCore) -> Option<Cell>;

    /// A reachable edge cell on the `side` edge.
    fn reachable_edge_cell(&self, settlement: SettlementId, side: Rot4) -> Option<Cell>;

    /// A random reachable edge cell.
    fn random_edge_cell(&self, settlement: SettlementId, rng: &mut dyn RngCore) -> Option<Cell>;

    /// A reachable cell just outside the colony's home area.
    fn outside_colony_cell(&self, settlement: SettlementId) -> Option<Cell>;

    /// Any random reachable cell.
    fn random_reachable_cell(
        &self,
        settlement: SettlementId,
        rng: &mut dyn RngCore,
    ) -> Option<Cell>;

    /// A cell near `near` with enough free space around it to unload.
    fn find_drop_spot_near(
        &self,
        settlement: SettlementId,
        near: Cell,
        rng: &mut dyn RngCore,
    ) -> Option<Cell>;

    /// Place items on the ground at (or near) `cell`.
    fn place_items(
        &mut self,
        settlement: SettlementId,
        cell: Cell,
        items: Vec<ItemStack>,
    ) -> Result<(), WorldError>;

    /// Launch a drop pod carrying `items` to `cell`.
    fn launch_drop_pod(
        &mut self,
        settlement: SettlementId,
        cell: Cell,
        items: Vec<ItemStack>,
    ) -> Result<(), WorldError>;

    /// Spawn an agent on the map.
    fn spawn_agent(
        &mut self,
        settlement: SettlementId,
        agent: Agent,
        cell: Cell,
    ) -> Result<(), WorldError>;

    /// Current position of a spawned agent.
    fn agent_position(&self, settlement: SettlementId, agent: AgentId) -> Option<Cell>;

    /// Whether a spawned agent has been harmed since it arrived.
    fn agent_harmed(&self, settlement: SettlementId, agent: AgentId) -> bool;

    /// Move a spawned agent one step toward `target`. Returns the new position.
    fn step_agent_toward(
        &mut self,
        settlement: SettlementId,
        agent: AgentId,
        target: Cell,
    ) -> Result<Cell, WorldError>;

    /// Drop as much of the agent's inventory as fits around it. Returns the
    /// number of stacks still carried.
    fn unload_agent(&mut self, settlement: SettlementId, agent: AgentId)
    -> Result<usize, WorldError>;

    /// Remove a spawned agent from the map.
    fn despawn_agent(&mut self, settlement: SettlementId, agent: AgentId) -> Option<Agent>;
}

/// Counts describing a battlefield at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattleSnapshot {
    /// Hostile agents of the attacking faction that are alive and not downed.
    pub active_hostiles: usize,
    /// Incoming hostile drop pods or other skyfallers.
    pub skyfallers: usize,
    /// Structures owned by the attacking faction.
    pub hostile_buildings: usize,
    /// Free player-faction colonists alive on the map.
    pub free_colonists: usize,
}

/// The rendered map of an outpost under attack.
pub trait Battlefield {
    /// Whether the outpost's map is currently rendered.
    fn map_active(&self, outpost: OutpostId) -> bool;

    /// Default threat points of the outpost's rendered map, when one is
    /// active.
    fn map_threat_points(&self, outpost: OutpostId) -> Option<f32>;

    /// Choose a faction to raid `tile` and the base threat points for it.
    fn raid_target(&self, tile: Tile, rng: &mut dyn RngCore) -> Option<(FactionId, f32)>;

    /// Generate the outpost's map with the occupants placed on it and a
    /// raid of `points` from `faction` arriving.
    fn open_battlefield(
        &mut self,
        outpost: OutpostId,
        tile: Tile,
        occupants: Vec<Agent>,
        faction: FactionId,
        points: f32,
    );

    /// Counts for the win/loss check.
    fn snapshot(&self, outpost: OutpostId, faction: FactionId) -> Option<BattleSnapshot>;

    /// Remove and return living player-faction agents.
    fn take_player_agents(&mut self, outpost: OutpostId, player: FactionId) -> Vec<Agent>;

    /// Remove and return visible weapons lying on the ground.
    fn take_loose_weapons(&mut self, outpost: OutpostId) -> Vec<ItemStack>;

    /// Remove and return corpses of player-faction agents.
    fn take_player_corpses(&mut self, outpost: OutpostId, player: FactionId) -> Vec<ItemStack>;

    /// Strip and return weapons from corpses of the attacking faction.
    fn take_hostile_corpse_weapons(
        &mut self,
        outpost: OutpostId,
        faction: FactionId,
    ) -> Vec<ItemStack>;

    /// Remove and return one downed humanlike hostile, if any.
    fn take_downed_hostile(&mut self, outpost: OutpostId, faction: FactionId) -> Option<Agent>;

    /// Generate loot worth about `value` from a faction's loot table.
    fn faction_loot(&self, faction: FactionId, value: f32, rng: &mut dyn RngCore)
    -> Vec<ItemStack>;

    /// Destroy the map.
    fn close_battlefield(&mut self, outpost: OutpostId);
}

/// Letters and messages to the player.
pub trait Notifier {
    /// Send a letter.
    fn send_letter(&mut self, letter: Letter);

    /// Show a transient message.
    fn message(&mut self, text: String);
}

/// Every host capability the outpost engine needs.
pub trait HostWorld: WorldGrid + CaravanRegistry + DeliveryMap + Battlefield + Notifier {}

impl<T> HostWorld for T where T: WorldGrid + CaravanRegistry + DeliveryMap + Battlefield + Notifier {}
