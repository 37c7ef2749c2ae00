//! Core entity structs: item stacks, agents, caravans, letters, and ledger
//! entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{
    AgentKind, AgentStatus, Holder, LetterKind, MedicalCare, Quality, Skill, TransferKind,
};
use crate::ids::{AgentId, CaravanId, FactionId, ItemId, LedgerEntryId};

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A world-map tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile(pub u32);

impl core::fmt::Display for Tile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "tile {}", self.0)
    }
}

/// A cell on a rendered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl Cell {
    /// Construct a cell.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chebyshev distance to another cell.
    pub fn distance_to(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        dx.max(dz)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Current and maximum hit points of a damageable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    /// Remaining hit points.
    pub current: u32,
    /// Hit points when undamaged.
    pub max: u32,
}

impl HitPoints {
    /// Returns `true` when the item has lost any hit points.
    pub const fn is_damaged(self) -> bool {
        self.current < self.max
    }
}

/// A stack of identical items.
///
/// A stack is owned by exactly one container at a time. Count is always
/// positive for a live stack; zero-count stacks are swept by their
/// container before consumers read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Identity of this stack.
    pub id: ItemId,
    /// Item definition name (key into the item catalog).
    pub def: String,
    /// Number of items in the stack.
    pub count: u32,
    /// Quality, for crafted items.
    #[serde(default)]
    pub quality: Option<Quality>,
    /// Hit points, for damageable items.
    #[serde(default)]
    pub hit_points: Option<HitPoints>,
    /// Material the item was made from.
    #[serde(default)]
    pub stuff: Option<String>,
    /// The dead agent, when this stack is a corpse.
    #[serde(default)]
    pub corpse: Option<Box<Agent>>,
}

impl ItemStack {
    /// Create a plain stack of `count` items of `def`.
    pub fn new(def: impl Into<String>, count: u32) -> Self {
        Self {
            id: ItemId::new(),
            def: def.into(),
            count,
            quality: None,
            hit_points: None,
            stuff: None,
            corpse: None,
        }
    }

    /// Builder: set quality.
    #[must_use]
    pub const fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Builder: set hit points.
    #[must_use]
    pub const fn with_hit_points(mut self, current: u32, max: u32) -> Self {
        self.hit_points = Some(HitPoints { current, max });
        self
    }

    /// Builder: set stuff material.
    #[must_use]
    pub fn with_stuff(mut self, stuff: impl Into<String>) -> Self {
        self.stuff = Some(stuff.into());
        self
    }

    /// Wrap a dead agent into a corpse stack.
    pub fn corpse_of(agent: Agent) -> Self {
        let mut stack = Self::new(format!("corpse_{}", agent.race), 1);
        stack.corpse = Some(Box::new(agent));
        stack
    }

    /// Returns `true` if this stack has a unique identity worth listing
    /// on its own (made from stuff, damaged, or quality-bearing).
    pub fn is_singular(&self) -> bool {
        self.stuff.is_some()
            || self.quality.is_some()
            || self.hit_points.is_some_and(HitPoints::is_damaged)
            || self.corpse.is_some()
    }

    /// Returns `true` for a stack that may not be read by consumers.
    pub const fn is_invalid(&self) -> bool {
        self.count == 0
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Level in one skill, plus whether the agent is incapable of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Skill level (0-20).
    pub level: u32,
    /// Totally disabled by backstory or traits.
    #[serde(default)]
    pub disabled: bool,
}

/// How a health condition progresses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ConditionKind {
    /// Physical damage. Severity is in hit points.
    Injury,
    /// An illness racing against immunity. Severity is 0-1, lethal at 1.
    Disease {
        /// Severity gained per day while untended and not immune.
        severity_per_day: f32,
        /// Immunity gained per day.
        immunity_per_day: f32,
    },
    /// Starvation. Severity is 0-1, lethal at 1.
    Malnutrition,
}

/// A single health condition on an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCondition {
    /// Condition name, for display.
    pub def: String,
    /// Progression model.
    pub kind: ConditionKind,
    /// Current severity.
    pub severity: f32,
    /// Quality of the last tend (0-1), if tended.
    #[serde(default)]
    pub tend_quality: Option<f32>,
    /// Immunity progress (0-1), for diseases.
    #[serde(default)]
    pub immunity: f32,
}

impl HealthCondition {
    /// A fresh untended injury of `damage` hit points.
    pub fn injury(def: impl Into<String>, damage: f32) -> Self {
        Self {
            def: def.into(),
            kind: ConditionKind::Injury,
            severity: damage,
            tend_quality: None,
            immunity: 0.0,
        }
    }

    /// A fresh untended disease at `severity`.
    pub fn disease(
        def: impl Into<String>,
        severity: f32,
        severity_per_day: f32,
        immunity_per_day: f32,
    ) -> Self {
        Self {
            def: def.into(),
            kind: ConditionKind::Disease {
                severity_per_day,
                immunity_per_day,
            },
            severity,
            tend_quality: None,
            immunity: 0.0,
        }
    }

    /// Whether the condition benefits from tending right now.
    pub const fn needs_tending(&self) -> bool {
        self.tend_quality.is_none() && !matches!(self.kind, ConditionKind::Malnutrition)
    }
}

/// Health state of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Active conditions.
    #[serde(default)]
    pub conditions: Vec<HealthCondition>,
    /// Total injury hit points survivable.
    pub max_hit_points: f32,
    /// Set once the agent has died.
    #[serde(default)]
    pub dead: bool,
}

impl Health {
    /// Healthy state with the given hit-point pool.
    pub const fn new(max_hit_points: f32) -> Self {
        Self {
            conditions: Vec::new(),
            max_hit_points,
            dead: false,
        }
    }

    /// Sum of injury severities.
    pub fn injury_total(&self) -> f32 {
        self.conditions
            .iter()
            .filter(|c| matches!(c.kind, ConditionKind::Injury))
            .map(|c| c.severity)
            .sum()
    }
}

/// Food and rest levels, both in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// Food level.
    pub food: f32,
    /// Rest level.
    pub rest: f32,
    /// Food level at or below which the agent wants to eat.
    pub food_want_eat: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            food: 1.0,
            rest: 1.0,
            food_want_eat: 0.3,
        }
    }
}

/// A worn piece of apparel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WornApparel {
    /// The apparel item.
    pub item: ItemStack,
    /// Locked apparel (e.g. slave collars) stays on the body at death.
    #[serde(default)]
    pub locked: bool,
}

/// A simulated agent: a colonist, a working animal, or a hostile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Race name (e.g. `human`, `muffalo`).
    pub race: String,
    /// Humanlike or animal.
    pub kind: AgentKind,
    /// Faction membership.
    #[serde(default)]
    pub faction: Option<FactionId>,
    /// Free, prisoner, or slave.
    #[serde(default)]
    pub status: AgentStatus,
    /// Skill levels.
    #[serde(default)]
    pub skills: BTreeMap<Skill, SkillRecord>,
    /// Food and rest.
    #[serde(default)]
    pub needs: Needs,
    /// Health conditions.
    pub health: Health,
    /// Age in ticks.
    #[serde(default)]
    pub age_ticks: u64,
    /// Carried items.
    #[serde(default)]
    pub inventory: Vec<ItemStack>,
    /// Held weapons and tools.
    #[serde(default)]
    pub equipment: Vec<ItemStack>,
    /// Worn apparel.
    #[serde(default)]
    pub apparel: Vec<WornApparel>,
    /// Market value of the agent itself.
    #[serde(default)]
    pub market_value: Decimal,
    /// Medicine restriction.
    #[serde(default)]
    pub medical_care: MedicalCare,
}

impl Agent {
    /// A healthy humanlike agent with no skills or belongings.
    pub fn humanlike(name: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            race: String::from("human"),
            kind: AgentKind::Humanlike,
            faction: None,
            status: AgentStatus::Free,
            skills: BTreeMap::new(),
            needs: Needs::default(),
            health: Health::new(100.0),
            age_ticks: 0,
            inventory: Vec::new(),
            equipment: Vec::new(),
            apparel: Vec::new(),
            market_value: Decimal::new(1750, 0),
            medical_care: MedicalCare::default(),
        }
    }

    /// A healthy animal of `race`.
    pub fn animal(
        name: impl Into<String>,
        race: impl Into<String>,
        trainable_release: bool,
        pack_animal: bool,
    ) -> Self {
        Self {
            race: race.into(),
            kind: AgentKind::Animal {
                trainable_release,
                pack_animal,
            },
            market_value: Decimal::new(250, 0),
            ..Self::humanlike(name)
        }
    }

    /// Builder: set a skill level.
    #[must_use]
    pub fn with_skill(mut self, skill: Skill, level: u32) -> Self {
        self.skills.insert(
            skill,
            SkillRecord {
                level,
                disabled: false,
            },
        );
        self
    }

    /// Builder: mark a skill as totally disabled.
    #[must_use]
    pub fn with_disabled_skill(mut self, skill: Skill) -> Self {
        self.skills.insert(
            skill,
            SkillRecord {
                level: 0,
                disabled: true,
            },
        );
        self
    }

    /// Builder: set faction.
    #[must_use]
    pub const fn with_faction(mut self, faction: FactionId) -> Self {
        self.faction = Some(faction);
        self
    }

    /// Level in `skill`, or zero when absent or disabled.
    pub fn skill_level(&self, skill: Skill) -> u32 {
        self.skills
            .get(&skill)
            .filter(|r| !r.disabled)
            .map_or(0, |r| r.level)
    }

    /// Returns `true` if the agent can never perform `skill`.
    pub fn skill_disabled(&self, skill: Skill) -> bool {
        self.skills.get(&skill).is_some_and(|r| r.disabled)
    }

    /// Returns `true` once the agent has died.
    pub const fn is_dead(&self) -> bool {
        self.health.dead
    }

    /// Returns `true` while the agent is incapacitated by injuries.
    pub fn is_downed(&self) -> bool {
        !self.health.dead && self.health.injury_total() * 2.0 >= self.health.max_hit_points
    }

    /// Returns `true` for humanlike agents.
    pub const fn is_humanlike(&self) -> bool {
        self.kind.is_humanlike()
    }
}

// ---------------------------------------------------------------------------
// Caravans
// ---------------------------------------------------------------------------

/// A mobile group of agents travelling the world map.
///
/// Items travel in member inventories; a caravan has no container of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caravan {
    /// Unique identifier.
    pub id: CaravanId,
    /// Display name.
    pub name: String,
    /// Current tile.
    pub tile: Tile,
    /// Owning faction.
    pub faction: Option<FactionId>,
    /// Member agents.
    pub members: Vec<Agent>,
    /// Whether the caravan is currently travelling.
    #[serde(default)]
    pub moving: bool,
}

impl Caravan {
    /// A stationary caravan at `tile`.
    pub fn new(name: impl Into<String>, tile: Tile, members: Vec<Agent>) -> Self {
        Self {
            id: CaravanId::new(),
            name: name.into(),
            tile,
            faction: None,
            members,
            moving: false,
        }
    }

    /// Total count of `def` across member inventories.
    pub fn count_of(&self, def: &str) -> u32 {
        self.members
            .iter()
            .flat_map(|a| a.inventory.iter())
            .filter(|s| s.def == def)
            .fold(0u32, |acc, s| acc.saturating_add(s.count))
    }

    /// Iterate every item stack carried by any member.
    pub fn items(&self) -> impl Iterator<Item = &ItemStack> {
        self.members.iter().flat_map(|a| a.inventory.iter())
    }
}

// ---------------------------------------------------------------------------
// Letters
// ---------------------------------------------------------------------------

/// A message delivered to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    /// Short title.
    pub label: String,
    /// Body text.
    pub text: String,
    /// Tone.
    pub kind: LetterKind,
    /// World tile the letter points at.
    pub tile: Option<Tile>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A single recorded item movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier.
    pub id: LedgerEntryId,
    /// Tick at which the movement happened.
    pub tick: u64,
    /// Category.
    pub kind: TransferKind,
    /// Item definition moved.
    pub def: String,
    /// Number of items moved.
    pub count: u32,
    /// Source holder.
    pub from: Holder,
    /// Destination holder.
    pub to: Holder,
    /// Wall-clock time the entry was written.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn singular_items() {
        assert!(!ItemStack::new("steel", 10).is_singular());
        assert!(ItemStack::new("rifle", 1).with_quality(Quality::Good).is_singular());
        assert!(ItemStack::new("chair", 1).with_stuff("wood").is_singular());
        assert!(ItemStack::new("knife", 1).with_hit_points(40, 50).is_singular());
        assert!(!ItemStack::new("knife", 1).with_hit_points(50, 50).is_singular());
    }

    #[test]
    fn disabled_skill_reads_as_zero() {
        let agent = Agent::humanlike("Ada")
            .with_skill(Skill::Mining, 8)
            .with_disabled_skill(Skill::Social);
        assert_eq!(agent.skill_level(Skill::Mining), 8);
        assert_eq!(agent.skill_level(Skill::Social), 0);
        assert!(agent.skill_disabled(Skill::Social));
        assert!(!agent.skill_disabled(Skill::Plants));
    }

    #[test]
    fn heavy_injuries_down_an_agent() {
        let mut agent = Agent::humanlike("Bo");
        assert!(!agent.is_downed());
        agent.health.conditions.push(HealthCondition::injury("cut", 60.0));
        assert!(agent.is_downed());
    }

    #[test]
    fn caravan_counts_member_items() {
        let mut a = Agent::humanlike("A");
        a.inventory.push(ItemStack::new("silver", 30));
        let mut b = Agent::humanlike("B");
        b.inventory.push(ItemStack::new("silver", 20));
        let caravan = Caravan::new("c", Tile(1), vec![a, b]);
        assert_eq!(caravan.count_of("silver"), 50);
        assert_eq!(caravan.items().count(), 2);
    }

    #[test]
    fn agent_survives_json_round_trip() {
        let agent = Agent::humanlike("Cy").with_skill(Skill::Medicine, 5);
        let json = serde_json::to_string(&agent).unwrap();
        let back: Agent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, agent);
    }
}
