//! Enumeration types shared across the outpost workspace.
//!
//! All enums serialize as `snake_case` strings so that configuration files
//! and save data stay human-readable.

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, CaravanId, OutpostId, SettlementId};

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// A work skill an agent may have levels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Ranged combat.
    Shooting,
    /// Close combat.
    Melee,
    /// Building and repairing.
    Construction,
    /// Mining and drilling.
    Mining,
    /// Cooking and butchering.
    Cooking,
    /// Growing and harvesting plants.
    Plants,
    /// Taming, training, and handling animals.
    Animals,
    /// Crafting items.
    Crafting,
    /// Art.
    Artistic,
    /// Doctoring and tending.
    Medicine,
    /// Trading and recruiting.
    Social,
    /// Research.
    Intellectual,
}

impl Skill {
    /// Every skill, in display order.
    pub const ALL: [Self; 12] = [
        Self::Shooting,
        Self::Melee,
        Self::Construction,
        Self::Mining,
        Self::Cooking,
        Self::Plants,
        Self::Animals,
        Self::Crafting,
        Self::Artistic,
        Self::Medicine,
        Self::Social,
        Self::Intellectual,
    ];

    /// Lower-case display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shooting => "shooting",
            Self::Melee => "melee",
            Self::Construction => "construction",
            Self::Mining => "mining",
            Self::Cooking => "cooking",
            Self::Plants => "plants",
            Self::Animals => "animals",
            Self::Crafting => "crafting",
            Self::Artistic => "artistic",
            Self::Medicine => "medicine",
            Self::Social => "social",
            Self::Intellectual => "intellectual",
        }
    }

    /// Parse a skill from its `snake_case` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == name)
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// How produced and looted items reach their destination settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Items appear instantly at a drop spot or map edge.
    #[default]
    Teleport,
    /// A pack animal walks in from the map edge carrying the items.
    PackAnimal,
    /// Items stay in the outpost's own container.
    Store,
    /// Items fall in drop pods near the drop spot.
    ForcePods,
    /// Drop pods once the technology is researched, pack animals before.
    PackOrPods,
}

impl DeliveryMethod {
    /// Settings label for the method.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Teleport => "teleport",
            Self::PackAnimal => "pack_animal",
            Self::Store => "store",
            Self::ForcePods => "force_pods",
            Self::PackOrPods => "pack_or_pods",
        }
    }
}

/// A cardinal direction on a map, used to bias edge cell selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rot4 {
    /// Toward positive z.
    North,
    /// Toward positive x.
    East,
    /// Toward negative z.
    South,
    /// Toward negative x.
    West,
}

impl Rot4 {
    /// Direction whose axis dominates the offset `(dx, dz)`.
    pub fn from_offset(dx: f64, dz: f64) -> Self {
        if dx.abs() > dz.abs() {
            if dx > 0.0 { Self::East } else { Self::West }
        } else if dz >= 0.0 {
            Self::North
        } else {
            Self::South
        }
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Whether an agent is a person or an animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AgentKind {
    /// A person with skills, equipment, and apparel.
    Humanlike,
    /// An animal.
    Animal {
        /// Whether the animal can be trained to be released in combat.
        trainable_release: bool,
        /// Whether the animal can carry cargo.
        pack_animal: bool,
    },
}

impl AgentKind {
    /// Returns `true` for humanlike agents.
    pub const fn is_humanlike(self) -> bool {
        matches!(self, Self::Humanlike)
    }

    /// Returns `true` for animals that can carry cargo.
    pub const fn is_pack_animal(self) -> bool {
        matches!(
            self,
            Self::Animal {
                pack_animal: true,
                ..
            }
        )
    }
}

/// Social status of an agent within its faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// A free member.
    #[default]
    Free,
    /// Held captive.
    Prisoner,
    /// Enslaved.
    Slave,
}

/// Crafted item quality tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Lowest tier.
    Awful,
    /// Below average.
    Poor,
    /// Average.
    Normal,
    /// Above average.
    Good,
    /// High tier.
    Excellent,
    /// Very high tier.
    Masterwork,
    /// Highest tier.
    Legendary,
}

impl Quality {
    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Awful => "awful",
            Self::Poor => "poor",
            Self::Normal => "normal",
            Self::Good => "good",
            Self::Excellent => "excellent",
            Self::Masterwork => "masterwork",
            Self::Legendary => "legendary",
        }
    }
}

/// Which medicine an agent may be treated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalCare {
    /// Never tended.
    NoCare,
    /// Tended without medicine.
    NoMeds,
    /// Herbal medicine or weaker.
    HerbalOrWorse,
    /// Industrial medicine or weaker.
    NormalOrWorse,
    /// Any medicine.
    #[default]
    Best,
}

impl MedicalCare {
    /// Highest medicine potency allowed by this care level.
    pub const fn max_potency(self) -> Option<f32> {
        match self {
            Self::NoCare | Self::NoMeds => None,
            Self::HerbalOrWorse => Some(0.6),
            Self::NormalOrWorse => Some(1.0),
            Self::Best => Some(f32::MAX),
        }
    }

    /// Whether the agent may be tended at all.
    pub const fn allows_tending(self) -> bool {
        !matches!(self, Self::NoCare)
    }
}

// ---------------------------------------------------------------------------
// Letters
// ---------------------------------------------------------------------------

/// Tone of a letter sent to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterKind {
    /// Informational.
    Neutral,
    /// Good news.
    Positive,
    /// Bad news.
    Negative,
    /// Someone died.
    Death,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Categories of item movement recorded in the transfer ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Holder to holder.
    Transfer,
    /// Created by outpost production.
    Produce,
    /// Picked up from a battlefield after a won incursion.
    Loot,
    /// Eaten or spent as medicine.
    Consume,
    /// Paid as the one-time creation cost.
    Cost,
    /// Handed to a destination settlement.
    Deliver,
}

/// Anything that can hold items, as seen by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum Holder {
    /// An outpost's container.
    Outpost(OutpostId),
    /// A caravan as a whole.
    Caravan(CaravanId),
    /// A single agent's carried inventory.
    Agent(AgentId),
    /// A settlement map.
    Settlement(SettlementId),
    /// Source for newly created items.
    World,
    /// Sink for consumed items.
    Void,
}

impl Holder {
    /// Returns `true` for the `World` source and `Void` sink.
    pub const fn is_external(self) -> bool {
        matches!(self, Self::World | Self::Void)
    }
}
