//! World seeding for a standalone run.
//!
//! Builds a small in-memory world: one player home, a free tile a few
//! steps away, and a caravan of settlers standing on that tile, equipped
//! to found the chosen outpost kind. Settler count, skill levels, and
//! carried items are derived from the kind's founding requirements.

use outpost_core::OutpostKind;
use outpost_types::{Agent, Caravan, CaravanId, FactionId, ItemStack, SettlementId, Skill, Tile};
use outpost_world::{CaravanRegistry, SimWorld};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

/// Highest skill level a settler can hold.
const MAX_SKILL_LEVEL: u32 = 20;

/// Tile of the player home.
const HOME_TILE: Tile = Tile(0);

/// Tile the settlers found on.
const OUTPOST_TILE: Tile = Tile(1);

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Seeding options, read from the `seed` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedConfig {
    /// Outpost kind to found; the first configured kind when absent.
    #[serde(default)]
    pub outpost_kind: Option<String>,

    /// Minimum number of settlers in the founding caravan.
    #[serde(default = "default_settlers")]
    pub settlers: u32,

    /// Level of every skill the kind cares about, before requirements.
    #[serde(default = "default_skill_level")]
    pub skill_level: u32,

    /// Hostile factions available to raid.
    #[serde(default = "default_hostile_factions")]
    pub hostile_factions: u32,

    /// Biome of the outpost tile when the kind allows any.
    #[serde(default = "default_biome")]
    pub biome: String,

    /// Research projects already finished.
    #[serde(default)]
    pub research: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            outpost_kind: None,
            settlers: default_settlers(),
            skill_level: default_skill_level(),
            hostile_factions: default_hostile_factions(),
            biome: default_biome(),
            research: Vec::new(),
        }
    }
}

const fn default_settlers() -> u32 {
    3
}

const fn default_skill_level() -> u32 {
    8
}

const fn default_hostile_factions() -> u32 {
    1
}

fn default_biome() -> String {
    String::from("temperate_forest")
}

// -----------------------------------------------------------------------
// Seeding
// -----------------------------------------------------------------------

/// A seeded world ready for founding.
#[derive(Debug)]
pub struct SeededWorld {
    /// The world.
    pub world: SimWorld,
    /// The player home.
    pub home: SettlementId,
    /// The founding caravan.
    pub caravan: CaravanId,
}

/// Build a world in which `kind` can be founded by a caravan.
pub fn seed_world(config: &SeedConfig, kind: &OutpostKind) -> Result<SeededWorld, EngineError> {
    let biome = kind
        .allowed_biomes
        .first()
        .cloned()
        .unwrap_or_else(|| config.biome.clone());
    if kind.disallowed_biomes.contains(&biome) {
        return Err(EngineError::Seed {
            message: format!("biome {biome} is not allowed for {}", kind.name),
        });
    }

    let mut world = SimWorld::new();
    world.add_tile(HOME_TILE, &biome, 0.0, 0.0);
    world.add_tile(OUTPOST_TILE, &biome, 3.0, 0.0);
    let home = world.add_settlement("Home", HOME_TILE, true);
    for project in &config.research {
        world.finish_research(project);
    }
    for _ in 0..config.hostile_factions {
        world.add_hostile_faction(FactionId::new());
    }

    let settlers = settlers(config, kind);
    let count = settlers.len();
    let caravan = world.spawn_caravan(Caravan::new("Settlers", OUTPOST_TILE, settlers));
    info!(kind = %kind.name, settlers = count, biome = %biome, "world seeded");
    Ok(SeededWorld {
        world,
        home,
        caravan,
    })
}

/// Settlers able to found `kind`. The first carries the creation cost.
fn settlers(config: &SeedConfig, kind: &OutpostKind) -> Vec<Agent> {
    let by_skill = kind
        .required_skills
        .iter()
        .map(|req| req.amount.div_ceil(MAX_SKILL_LEVEL))
        .max()
        .unwrap_or(0);
    let count = config.settlers.max(kind.min_agents).max(by_skill).max(1);

    let mut agents: Vec<Agent> = (1..=count)
        .map(|i| {
            let mut agent = Agent::humanlike(format!("Settler {i}"));
            for skill in kind.relevant_skills() {
                agent = agent.with_skill(skill, level_for(config, kind, skill, count));
            }
            agent
        })
        .collect();
    if let Some(first) = agents.first_mut() {
        first.inventory.extend(
            kind.cost_to_make
                .iter()
                .map(|cost| ItemStack::new(cost.item.clone(), cost.count)),
        );
    }
    agents
}

/// Per-settler level of `skill`: at least the configured level, raised so
/// the caravan meets the kind's requirement together.
fn level_for(config: &SeedConfig, kind: &OutpostKind, skill: Skill, settlers: u32) -> u32 {
    let required = kind
        .required_skills
        .iter()
        .filter(|req| req.skill == skill)
        .map(|req| req.amount.div_ceil(settlers.max(1)))
        .max()
        .unwrap_or(0);
    config.skill_level.max(required).min(MAX_SKILL_LEVEL)
}
