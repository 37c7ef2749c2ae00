//! Death conditions and the stripping of a dead agent's belongings.
//!
//! When an occupant dies its carried items, equipment, and unlocked apparel
//! go back to the outpost container, followed by the corpse itself. Locked
//! apparel stays on the body.

use outpost_types::{Agent, ConditionKind, ItemStack};

/// The cause of an agent's death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Malnutrition reached a lethal severity.
    Starvation,
    /// A disease reached a lethal severity.
    Disease,
    /// Injuries exceeded the agent's hit points.
    Injury,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::Disease => write!(f, "disease"),
            Self::Injury => write!(f, "injury"),
        }
    }
}

/// Check whether an agent meets any death condition.
///
/// This only inspects the current state; it does not mutate anything.
pub fn check_death(agent: &Agent) -> Option<DeathCause> {
    if agent.health.injury_total() >= agent.health.max_hit_points {
        return Some(DeathCause::Injury);
    }
    agent
        .health
        .conditions
        .iter()
        .find_map(|c| match c.kind {
            ConditionKind::Malnutrition if c.severity >= 1.0 => Some(DeathCause::Starvation),
            ConditionKind::Disease { .. } if c.severity >= 1.0 => Some(DeathCause::Disease),
            _ => None,
        })
}

/// Remove everything the agent carries, holds, or wears (except locked
/// apparel) and return it.
pub fn strip(agent: &mut Agent) -> Vec<ItemStack> {
    let mut items = core::mem::take(&mut agent.inventory);
    items.append(&mut agent.equipment);
    let (locked, unlocked): (Vec<_>, Vec<_>) =
        core::mem::take(&mut agent.apparel).into_iter().partition(|w| w.locked);
    agent.apparel = locked;
    items.extend(unlocked.into_iter().map(|w| w.item));
    items
}

/// Turn a dead agent into a corpse stack. Anything still worn stays on it.
pub fn into_corpse(mut agent: Agent) -> ItemStack {
    agent.health.dead = true;
    ItemStack::corpse_of(agent)
}

#[cfg(test)]
mod tests {
    use outpost_types::{HealthCondition, WornApparel};

    use super::*;

    #[test]
    fn healthy_agent_is_alive() {
        assert_eq!(check_death(&Agent::humanlike("Ada")), None);
    }

    #[test]
    fn lethal_malnutrition_is_starvation() {
        let mut agent = Agent::humanlike("Ada");
        agent.health.conditions.push(HealthCondition {
            def: String::from("malnutrition"),
            kind: ConditionKind::Malnutrition,
            severity: 1.0,
            tend_quality: None,
            immunity: 0.0,
        });
        assert_eq!(check_death(&agent), Some(DeathCause::Starvation));
    }

    #[test]
    fn strip_leaves_locked_apparel() {
        let mut agent = Agent::humanlike("Ada");
        agent.inventory.push(ItemStack::new("silver", 10));
        agent.equipment.push(ItemStack::new("rifle", 1));
        agent.apparel.push(WornApparel {
            item: ItemStack::new("parka", 1),
            locked: false,
        });
        agent.apparel.push(WornApparel {
            item: ItemStack::new("slave_collar", 1),
            locked: true,
        });

        let items = strip(&mut agent);
        let defs: Vec<_> = items.iter().map(|s| s.def.as_str()).collect();
        assert_eq!(defs, vec!["silver", "rifle", "parka"]);
        assert_eq!(agent.apparel.len(), 1);
        assert!(agent.inventory.is_empty() && agent.equipment.is_empty());

        let corpse = into_corpse(agent);
        assert_eq!(corpse.def, "corpse_human");
        assert!(corpse.corpse.is_some_and(|a| a.is_dead()));
    }
}
