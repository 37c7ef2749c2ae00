//! Admission and placement checks.
//!
//! Nothing here mutates state. Every check returns an [`AcceptanceReport`]
//! carrying a reason the player can read; rejection is a normal outcome,
//! not an error.

use core::fmt::Write as _;

use outpost_agents::cumulative_skill;
use outpost_types::{Agent, Caravan, Tile};
use outpost_world::WorldGrid;

use crate::kind::{OutpostBehavior, OutpostKind};

/// Result of an admission or placement check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceReport {
    /// Whether the check passed.
    pub accepted: bool,
    /// Why it failed.
    pub reason: Option<String>,
}

impl AcceptanceReport {
    /// A passing report.
    pub const fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    /// A failing report.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }

    /// The reason, or an empty string when accepted.
    pub fn reason_or_empty(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}

/// Whether `agent` may live at an outpost of `kind`.
pub fn can_add_agent<W: WorldGrid + ?Sized>(
    kind: &OutpostKind,
    agent: &Agent,
    world: &W,
) -> AcceptanceReport {
    if agent.is_dead() {
        return AcceptanceReport::reject(format!("{} is dead", agent.name));
    }
    if let Some(event) = &kind.required_event
        && !world.event_allowed(agent, event)
    {
        return AcceptanceReport::reject(format!(
            "{} will not take part in {event}",
            agent.name
        ));
    }
    if let OutpostBehavior::RestrictedAdmission {
        humanlike_only,
        min_skill,
    } = kind.behavior
    {
        if humanlike_only && !agent.is_humanlike() {
            return AcceptanceReport::reject(format!("{} only accepts people", kind.label));
        }
        if let Some(min) = min_skill
            && agent.skill_level(min.skill) < min.amount
        {
            return AcceptanceReport::reject(format!(
                "{} needs {} {} or better",
                agent.name,
                min.skill.label(),
                min.amount
            ));
        }
    }
    AcceptanceReport::accept()
}

/// One founding requirement and whether it is met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// What is required.
    pub description: String,
    /// Whether it is met.
    pub met: bool,
}

/// Everything needed to evaluate founding on a tile.
#[derive(Clone, Copy)]
pub struct Placement<'a> {
    /// The kind to found.
    pub kind: &'a OutpostKind,
    /// The tile.
    pub tile: Tile,
    /// Agents that would move in.
    pub agents: &'a [Agent],
    /// The caravan paying the cost, if any.
    pub caravan: Option<&'a Caravan>,
    /// Tiles already holding outposts.
    pub outpost_tiles: &'a [Tile],
}

/// Evaluate every founding requirement in check order.
pub fn requirements<W: WorldGrid + ?Sized>(
    placement: Placement<'_>,
    world: &W,
) -> Vec<Requirement> {
    let Placement {
        kind,
        tile,
        agents,
        caravan,
        outpost_tiles,
    } = placement;
    let admissible: Vec<&Agent> = agents
        .iter()
        .filter(|a| can_add_agent(kind, a, world).accepted)
        .collect();
    let mut reqs = vec![Requirement {
        description: String::from("At least one pawn can live here"),
        met: !admissible.is_empty(),
    }];

    let biome = world.biome(tile);
    let biome_ok = biome.as_ref().is_some_and(|b| {
        (kind.allowed_biomes.is_empty() || kind.allowed_biomes.contains(b))
            && !kind.disallowed_biomes.contains(b)
    });
    reqs.push(Requirement {
        description: format!("Biome allowed ({})", biome.as_deref().unwrap_or("unknown")),
        met: biome_ok,
    });

    let occupied = |t: Tile| world.settlement_at(t).is_some() || outpost_tiles.contains(&t);
    let crowded = occupied(tile) || world.neighbors(tile).into_iter().any(occupied);
    reqs.push(Requirement {
        description: String::from("No settlement or outpost on or next to this tile"),
        met: !crowded,
    });

    if kind.min_agents > 0 {
        let count = u32::try_from(admissible.len()).unwrap_or(u32::MAX);
        reqs.push(Requirement {
            description: format!("At least {} pawns", kind.min_agents),
            met: count >= kind.min_agents,
        });
    }

    for req in &kind.required_skills {
        let total = cumulative_skill(admissible.iter().copied(), req.skill);
        reqs.push(Requirement {
            description: format!("Total {} of {} (have {total})", req.skill.label(), req.amount),
            met: total >= req.amount,
        });
    }

    if kind.requires_growing {
        reqs.push(Requirement {
            description: String::from("Growing season"),
            met: world.growing_possible(tile),
        });
    }

    for cost in &kind.cost_to_make {
        let have = caravan.map_or(0, |c| c.count_of(&cost.item));
        reqs.push(Requirement {
            description: format!("{}x {} (have {have})", cost.count, cost.item),
            met: have >= cost.count,
        });
    }
    reqs
}

/// Whether an outpost of `kind` may be founded; the reason names the
/// first unmet requirement.
pub fn can_spawn_on_tile<W: WorldGrid + ?Sized>(
    placement: Placement<'_>,
    world: &W,
) -> AcceptanceReport {
    requirements(placement, world)
        .into_iter()
        .find(|r| !r.met)
        .map_or_else(AcceptanceReport::accept, |r| {
            AcceptanceReport::reject(r.description)
        })
}

/// Every requirement on its own line, marked met or unmet.
pub fn requirements_report<W: WorldGrid + ?Sized>(
    placement: Placement<'_>,
    world: &W,
) -> String {
    let mut out = String::new();
    for req in requirements(placement, world) {
        let mark = if req.met { '✓' } else { '✖' };
        let _ = writeln!(out, "{mark} {}", req.description);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outpost_agents::NeedsConfig;
    use outpost_types::{ItemStack, Skill};
    use outpost_world::SimWorld;

    use super::*;
    use crate::config::OutpostKindConfig;
    use crate::kind::SkillAmount;

    fn world() -> SimWorld {
        let mut w = SimWorld::new();
        w.add_tile(Tile(0), "temperate_forest", 0.0, 0.0);
        w.add_tile(Tile(1), "temperate_forest", 1.0, 0.0);
        w.add_tile(Tile(5), "temperate_forest", 5.0, 0.0);
        w.add_tile(Tile(9), "ocean", 9.0, 0.0);
        w.add_settlement("Home", Tile(0), true);
        w
    }

    fn mining() -> OutpostKind {
        let config: OutpostKindConfig = serde_yml::from_str(
            r"
name: mining
disallowed_biomes: [ocean]
min_agents: 2
required_skills:
  - mining: 10
cost_to_make:
  - { item: steel, count: 50 }
",
        )
        .unwrap();
        OutpostKind::from_config(config, &NeedsConfig::default())
    }

    fn crew() -> Vec<Agent> {
        let mut a = Agent::humanlike("A").with_skill(Skill::Mining, 6);
        a.inventory.push(ItemStack::new("steel", 60));
        vec![a, Agent::humanlike("B").with_skill(Skill::Mining, 5)]
    }

    fn placement<'a>(
        kind: &'a OutpostKind,
        tile: Tile,
        agents: &'a [Agent],
        caravan: Option<&'a Caravan>,
    ) -> Placement<'a> {
        Placement {
            kind,
            tile,
            agents,
            caravan,
            outpost_tiles: &[],
        }
    }

    #[test]
    fn valid_placement_is_accepted() {
        let w = world();
        let kind = mining();
        let agents = crew();
        let caravan = Caravan::new("c", Tile(5), agents.clone());
        let report = can_spawn_on_tile(placement(&kind, Tile(5), &agents, Some(&caravan)), &w);
        assert_eq!(report, AcceptanceReport::accept());
    }

    #[test]
    fn first_failure_is_reported() {
        let w = world();
        let kind = mining();
        let agents = crew();
        let caravan = Caravan::new("c", Tile(1), agents.clone());

        let next_to_home = can_spawn_on_tile(placement(&kind, Tile(1), &agents, Some(&caravan)), &w);
        assert!(next_to_home.reason_or_empty().contains("No settlement"));

        let ocean = can_spawn_on_tile(placement(&kind, Tile(9), &agents, Some(&caravan)), &w);
        assert!(ocean.reason_or_empty().contains("Biome"));

        let solo = agents.get(..1).unwrap();
        let too_few = can_spawn_on_tile(placement(&kind, Tile(5), solo, Some(&caravan)), &w);
        assert!(too_few.reason_or_empty().contains("At least 2"));

        let unpaid = can_spawn_on_tile(placement(&kind, Tile(5), &agents, None), &w);
        assert!(unpaid.reason_or_empty().contains("steel"));
    }

    #[test]
    fn report_marks_each_requirement() {
        let w = world();
        let kind = mining();
        let agents = crew();
        let report = requirements_report(placement(&kind, Tile(5), &agents, None), &w);
        assert!(report.contains("✓ Total mining of 10 (have 11)"));
        assert!(report.contains("✖ 50x steel (have 0)"));
    }

    #[test]
    fn restricted_admission_rejects() {
        let w = world();
        let mut kind = mining();
        kind.behavior = OutpostBehavior::RestrictedAdmission {
            humanlike_only: true,
            min_skill: Some(SkillAmount {
                skill: Skill::Mining,
                amount: 6,
            }),
        };
        let animal = Agent::animal("Muffy", "muffalo", false, true);
        assert!(!can_add_agent(&kind, &animal, &w).accepted);
        let novice = Agent::humanlike("Novice").with_skill(Skill::Mining, 2);
        assert!(!can_add_agent(&kind, &novice, &w).accepted);
        let expert = Agent::humanlike("Expert").with_skill(Skill::Mining, 9);
        assert!(can_add_agent(&kind, &expert, &w).accepted);
    }

    #[test]
    fn event_compatibility_is_checked() {
        let mut w = world();
        let mut kind = mining();
        kind.required_event = Some(String::from("mining_work"));
        let agent = Agent::humanlike("Ada");
        assert!(can_add_agent(&kind, &agent, &w).accepted);
        w.forbid_event("mining_work");
        let report = can_add_agent(&kind, &agent, &w);
        assert!(report.reason_or_empty().contains("mining_work"));
    }

    #[test]
    fn growing_season_is_required_when_asked() {
        let mut w = world();
        let mut kind = mining();
        kind.requires_growing = true;
        let agents = crew();
        let caravan = Caravan::new("c", Tile(5), agents.clone());
        let ok = can_spawn_on_tile(placement(&kind, Tile(5), &agents, Some(&caravan)), &w);
        assert!(ok.accepted);
        w.tile_mut(Tile(5)).unwrap().growing = false;
        let winter = can_spawn_on_tile(placement(&kind, Tile(5), &agents, Some(&caravan)), &w);
        assert_eq!(winter.reason_or_empty(), "Growing season");
    }
}
