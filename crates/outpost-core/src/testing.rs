//! Shared fixtures for unit tests.

#![allow(clippy::panic, clippy::missing_panics_doc)]

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal::Decimal;

use outpost_agents::NeedsConfig;
use outpost_ledger::Ledger;
use outpost_types::{ItemCatalog, ItemDef, SettlementId, Tile};
use outpost_world::SimWorld;

use crate::config::OutpostKindConfig;
use crate::context::TickContext;
use crate::kind::OutpostKind;
use crate::settings::OutpostsSettings;

/// Home settlement on tile 0, outpost site on tile 5.
pub const OUTPOST_TILE: Tile = Tile(5);

/// Everything a [`TickContext`] borrows.
pub struct Harness {
    pub world: SimWorld,
    pub home: SettlementId,
    pub settings: OutpostsSettings,
    pub needs: NeedsConfig,
    pub catalog: ItemCatalog,
    pub rng: SmallRng,
    pub ledger: Ledger,
}

impl Harness {
    pub fn new() -> Self {
        let mut world = SimWorld::new();
        world.add_tile(Tile(0), "temperate_forest", 0.0, 0.0);
        world.add_tile(OUTPOST_TILE, "temperate_forest", 5.0, 0.0);
        let home = world.add_settlement("Home", Tile(0), true);
        let mut catalog = ItemCatalog::default();
        for (name, limit, value) in [("steel", 75, 2), ("silver", 500, 1), ("revolver", 1, 200)] {
            catalog.insert(item(name, limit, value));
        }
        catalog.insert(ItemDef {
            nutrition: Some(0.9),
            human_edible: true,
            ..item("meal_simple", 10, 15)
        });
        catalog.insert(ItemDef {
            medicine_potency: Some(1.0),
            ..item("medicine_industrial", 25, 18)
        });
        Self {
            world,
            home,
            settings: OutpostsSettings {
                do_raids: false,
                ..OutpostsSettings::default()
            },
            needs: NeedsConfig::default(),
            catalog,
            rng: SmallRng::seed_from_u64(42),
            ledger: Ledger::new(),
        }
    }

    pub fn ctx(&mut self, tick: u64) -> TickContext<'_> {
        TickContext::new(
            &mut self.world,
            &self.settings,
            &self.needs,
            &self.catalog,
            &mut self.rng,
            &mut self.ledger,
            tick,
        )
    }
}

pub fn item(name: &str, stack_limit: u32, value: i64) -> ItemDef {
    ItemDef {
        name: name.to_owned(),
        label: String::new(),
        stack_limit,
        market_value: Decimal::new(value, 0),
        medicine_potency: None,
        nutrition: None,
        human_edible: false,
        weapon: name == "revolver",
    }
}

pub fn kind(yaml: &str) -> OutpostKind {
    let config: OutpostKindConfig = serde_yml::from_str(yaml).unwrap_or_else(|err| {
        panic!("bad test kind: {err}");
    });
    OutpostKind::from_config(config, &NeedsConfig::default())
}

/// A mining kind producing steel from mining skill.
pub fn mining() -> OutpostKind {
    kind(
        r"
name: mining
label: mining outpost
result_rules:
  - item: steel
    base_amount: 10
    amounts_per_skill:
      - mining: 2
ticks_per_production: 1000
ticks_to_pack: 420000
",
    )
}
