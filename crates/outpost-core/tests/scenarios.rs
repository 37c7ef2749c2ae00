//! End-to-end outpost scenarios driven through the registry against the
//! in-memory host.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use outpost_core::{
    CommandOutcome, OutpostCommand, OutpostError, OutpostEvent, OutpostRegistry, SimulationConfig,
    TransportPods,
};
use outpost_ledger::ConservationResult;
use outpost_types::{
    Agent, CaravanId, FactionId, Holder, ItemStack, OutpostId, SettlementId, Skill, Tile,
    TransferKind,
};
use outpost_world::{Battlefield, CaravanRegistry, SimWorld};

const CONFIG: &str = r"
settings:
  delivery_method: teleport
  do_raids: false
  seed: 11
items:
  - { name: steel, stack_limit: 75, market_value: 2 }
  - { name: silver, stack_limit: 500, market_value: 1 }
  - { name: revolver, stack_limit: 1, market_value: 150 }
  - { name: meal_simple, stack_limit: 10, market_value: 15, nutrition: 0.9, human_edible: true }
outpost_kinds:
  - name: mining
    label: mining outpost
    min_agents: 1
    ticks_per_production: 60000
    ticks_to_pack: 2500
    cost_to_make:
      - { item: steel, count: 10 }
    result_rules:
      - item: steel
        base_amount: 20
        amounts_per_skill:
          - mining: 2
";

struct Scenario {
    world: SimWorld,
    home: SettlementId,
    registry: OutpostRegistry,
}

impl Scenario {
    fn new(config: &str) -> Self {
        let mut world = SimWorld::new();
        world.add_tile(Tile(0), "temperate_forest", 0.0, 0.0);
        world.add_tile(Tile(5), "temperate_forest", 5.0, 0.0);
        let home = world.add_settlement("Home", Tile(0), true);
        Self {
            world,
            home,
            registry: OutpostRegistry::new(SimulationConfig::parse(config).unwrap()),
        }
    }

    fn caravan(&mut self, agents: Vec<Agent>) -> CaravanId {
        self.world
            .spawn_caravan(outpost_types::Caravan::new("Settlers", Tile(5), agents))
    }

    fn found(&mut self) -> OutpostId {
        let mut ada = Agent::humanlike("Ada").with_skill(Skill::Mining, 5);
        ada.inventory.push(ItemStack::new("steel", 15));
        let caravan = self.caravan(vec![ada, Agent::humanlike("Bo").with_skill(Skill::Mining, 3)]);
        self.registry
            .found(&mut self.world, "mining", caravan, "Quarry")
            .unwrap()
    }

    /// Tick until `done` holds for a summary, up to `limit` ticks.
    fn run_until(
        &mut self,
        limit: u64,
        mut done: impl FnMut(&outpost_core::TickSummary) -> bool,
    ) -> Vec<OutpostEvent> {
        let mut events = Vec::new();
        for _ in 0..limit {
            let summary = self.registry.tick_all(&mut self.world);
            assert_eq!(summary.conservation, ConservationResult::Balanced);
            let stop = done(&summary);
            events.extend(summary.events);
            if stop {
                return events;
            }
        }
        panic!("condition not reached within {limit} ticks");
    }
}

#[test]
fn found_produce_deliver_and_pack_up() {
    let mut s = Scenario::new(CONFIG);
    let id = s.found();
    assert_eq!(s.registry.outpost(id).unwrap().occupants().len(), 2);
    assert_eq!(s.registry.outpost(id).unwrap().inventory().count_of("steel"), 5);

    let events = s.run_until(60_000, |summary| {
        summary
            .events
            .iter()
            .any(|e| matches!(e, OutpostEvent::Delivered { .. }))
    });
    assert!(
        events
            .iter()
            .any(|e| matches!(e, OutpostEvent::Produced { items: 36, .. }))
    );
    let map = s.world.map(s.home).unwrap();
    assert_eq!(map.delivered_count("steel"), 36);
    assert_eq!(
        s.registry
            .ledger()
            .total_of_kind(TransferKind::Deliver, "steel"),
        36
    );
    assert!(s.world.letters().iter().any(|l| l.label == "Items from Quarry"));

    let outcome = s
        .registry
        .execute(&mut s.world, id, OutpostCommand::StartPacking)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::PackingStarted(1250));
    let events = s.run_until(1250, |summary| summary.removed.contains(&id));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, OutpostEvent::Converted { caravan: Some(_), .. }))
    );
    assert!(s.registry.outpost(id).is_none());

    let caravan = s.world.caravans().next().unwrap();
    assert_eq!(caravan.members.len(), 2);
    assert_eq!(caravan.count_of("steel"), 5);
}

#[test]
fn raid_is_repelled_and_loot_secured() {
    let config = CONFIG
        .replace("do_raids: false", "do_raids: true\n  raid_interval: { min: 5, max: 5 }");
    let mut s = Scenario::new(&config);
    s.world.add_hostile_faction(FactionId::new());
    s.world.set_base_threat_points(200.0);
    let id = s.found();

    s.run_until(20, |summary| {
        summary
            .events
            .iter()
            .any(|e| matches!(e, OutpostEvent::RaidStarted { .. }))
    });
    assert!(s.world.map_active(id));
    assert!(s.registry.outpost(id).unwrap().occupants().is_empty());

    for hostile in &mut s.world.battle_mut(id).unwrap().hostiles {
        hostile.health.dead = true;
    }
    let events = s.run_until(1, |_| true);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, OutpostEvent::RaidWon { .. }))
    );
    assert!(!s.world.map_active(id));

    let post = s.registry.outpost(id).unwrap();
    assert_eq!(post.occupants().len(), 2);
    assert!(post.inventory().count_of("revolver") > 0);
    assert!(s.registry.ledger().total_of_kind(TransferKind::Loot, "revolver") > 0);
    assert!(s.world.letters().iter().any(|l| l.label == "Battle won"));
}

#[test]
fn losing_every_defender_loses_the_outpost() {
    let config = CONFIG
        .replace("do_raids: false", "do_raids: true\n  raid_interval: { min: 3, max: 3 }");
    let mut s = Scenario::new(&config);
    s.world.add_hostile_faction(FactionId::new());
    let id = s.found();
    s.run_until(20, |summary| {
        summary
            .events
            .iter()
            .any(|e| matches!(e, OutpostEvent::RaidStarted { .. }))
    });

    for defender in &mut s.world.battle_mut(id).unwrap().player_agents {
        defender.health.dead = true;
    }
    let events = s.run_until(1, |summary| summary.removed.contains(&id));
    assert!(events.iter().any(|e| matches!(e, OutpostEvent::Lost { .. })));
    assert!(s.registry.outpost(id).is_none());
    assert!(!s.world.map_active(id));
    assert!(s.world.letters().iter().any(|l| l.label == "Outpost lost"));
}

#[test]
fn packing_waits_out_a_raid() {
    let config = CONFIG
        .replace("do_raids: false", "do_raids: true\n  raid_interval: { min: 3, max: 3 }")
        .replace("ticks_to_pack: 2500", "ticks_to_pack: 40");
    let mut s = Scenario::new(&config);
    s.world.add_hostile_faction(FactionId::new());
    let id = s.found();
    let outcome = s
        .registry
        .execute(&mut s.world, id, OutpostCommand::StartPacking)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::PackingStarted(20));

    s.run_until(20, |summary| {
        summary
            .events
            .iter()
            .any(|e| matches!(e, OutpostEvent::RaidStarted { .. }))
    });
    for _ in 0..60 {
        let summary = s.registry.tick_all(&mut s.world);
        assert_eq!(summary.conservation, ConservationResult::Balanced);
        assert!(!summary.removed.contains(&id));
    }

    let post = s.registry.outpost(id).unwrap();
    assert!(post.packing().is_packing());
    assert_eq!(post.inventory().count_of("steel"), 5);
    assert!(s.world.map_active(id));
    assert_eq!(
        s.registry
            .ledger()
            .total_of_kind(TransferKind::Consume, "steel"),
        0
    );
    assert!(s.world.caravans().next().is_none());
}

#[test]
fn pods_join_an_existing_outpost() {
    let mut s = Scenario::new(CONFIG);
    let id = s.found();
    let pods = TransportPods {
        destination: Tile(5),
        origin: s.home,
        agents: vec![Agent::humanlike("Cy")],
        items: vec![ItemStack::new("silver", 100)],
    };
    let options = s.registry.transport_pod_options(&pods);
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].outpost, id);

    let refused = s.registry.arrive(&mut s.world, id, pods).unwrap();
    assert!(refused.is_empty());
    let post = s.registry.outpost(id).unwrap();
    assert_eq!(post.occupants().len(), 3);
    assert_eq!(post.inventory().count_of("silver"), 100);
    assert_eq!(
        s.registry
            .ledger()
            .net_flow(Holder::Settlement(s.home), "silver"),
        -100
    );
}

#[test]
fn unknown_outpost_is_reported() {
    let mut s = Scenario::new(CONFIG);
    assert!(matches!(
        s.registry.inspect(OutpostId::new()),
        Err(OutpostError::OutpostNotFound(_))
    ));
    assert!(matches!(
        s.registry.force_end_incursion(&mut s.world, OutpostId::new()),
        Err(OutpostError::OutpostNotFound(_))
    ));
}
