//! Resolved outpost kinds: admission data, result rules, and behavior.
//!
//! An [`OutpostKind`] is built once from its [`OutpostKindConfig`] when the
//! registry starts. Skill amounts are validated here; a malformed entry is
//! logged and skipped and the rest of the kind stays usable.

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::error;

use outpost_agents::{NeedsConfig, cumulative_skill};
use outpost_types::{Agent, ItemCatalog, ItemStack, Skill};

use crate::config::{ItemCount, OutpostKindConfig, RawSkillAmounts, ResultRuleConfig};

/// A skill paired with an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SkillAmount {
    /// The skill.
    pub skill: Skill,
    /// Amount or level.
    pub amount: u32,
}

/// The closed set of outpost behaviors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum OutpostBehavior {
    /// Every result rule produces.
    #[default]
    Standard,
    /// Only the rule chosen by the player produces.
    ChooseResult,
    /// Extra admission rules on top of the standard ones.
    RestrictedAdmission {
        /// Reject animals.
        #[serde(default)]
        humanlike_only: bool,
        /// Reject agents below this skill level.
        #[serde(default)]
        min_skill: Option<SkillAmount>,
    },
}

/// A validated production rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRule {
    /// Produced item.
    pub item: String,
    /// Flat amount per cycle.
    pub base_amount: u32,
    /// Extra amount per capable agent.
    pub amount_per_agent: u32,
    /// Extra amount per point of cumulative skill.
    pub amounts_per_skill: Vec<SkillAmount>,
    /// Cumulative skill required before the rule yields anything.
    pub min_amounts_per_skill: Vec<SkillAmount>,
}

impl ResultRule {
    fn from_config(config: ResultRuleConfig, kind: &str) -> Self {
        Self {
            amounts_per_skill: parse_skill_amounts(
                &config.amounts_per_skill,
                kind,
                "amounts_per_skill",
            ),
            min_amounts_per_skill: parse_skill_amounts(
                &config.min_amounts_per_skill,
                kind,
                "min_amounts_per_skill",
            ),
            item: config.item,
            base_amount: config.base_amount,
            amount_per_agent: config.amount_per_agent,
        }
    }

    /// Amount produced by `capable` agents, scaled by `multiplier`.
    ///
    /// `round((base + per_agent * n + sum(per_skill * cumulative)) * multiplier)`,
    /// or zero when any minimum cumulative skill is unmet.
    pub fn amount(&self, capable: &[&Agent], multiplier: f32) -> u32 {
        let gated = self
            .min_amounts_per_skill
            .iter()
            .any(|min| cumulative_skill(capable.iter().copied(), min.skill) < min.amount);
        if gated {
            return 0;
        }
        let agents = u64::try_from(capable.len()).unwrap_or(u64::MAX);
        let mut total = u64::from(self.base_amount)
            .saturating_add(u64::from(self.amount_per_agent).saturating_mul(agents));
        for per in &self.amounts_per_skill {
            let skill = cumulative_skill(capable.iter().copied(), per.skill);
            total = total.saturating_add(u64::from(per.amount).saturating_mul(u64::from(skill)));
        }
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let scaled = (total as f64 * f64::from(multiplier)).round().max(0.0) as u64;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Materialize `amount` items as full stacks plus one remainder stack.
    pub fn make(&self, amount: u32, catalog: &ItemCatalog) -> Vec<ItemStack> {
        let limit = catalog.stack_limit(&self.item);
        let full = amount.checked_div(limit).unwrap_or(0);
        let rest = amount.checked_rem(limit).unwrap_or(0);
        let mut stacks: Vec<ItemStack> = (0..full)
            .map(|_| ItemStack::new(self.item.clone(), limit))
            .collect();
        if rest > 0 {
            stacks.push(ItemStack::new(self.item.clone(), rest));
        }
        stacks
    }
}

/// A fully resolved outpost kind.
#[derive(Debug, Clone, PartialEq)]
pub struct OutpostKind {
    /// Unique kind name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Biomes the kind may be founded in; empty means any.
    pub allowed_biomes: Vec<String>,
    /// Biomes the kind may never be founded in.
    pub disallowed_biomes: Vec<String>,
    /// Minimum admissible agents to found.
    pub min_agents: u32,
    /// Cumulative skills required to found.
    pub required_skills: Vec<SkillAmount>,
    /// One-time creation cost.
    pub cost_to_make: Vec<ItemCount>,
    /// Event every admitted agent must accept.
    pub required_event: Option<String>,
    /// Whether the tile must allow growing.
    pub requires_growing: bool,
    /// Production rules.
    pub result_rules: Vec<ResultRule>,
    /// Ticks between production cycles.
    pub ticks_per_production: u64,
    /// Base packing duration for one occupant.
    pub ticks_to_pack: u64,
    /// Food occupants eat.
    pub provided_food: String,
    /// World display radius, `-1` for none.
    pub range: i32,
    /// Extra skills shown when inspecting.
    pub display_skills: Vec<Skill>,
    /// Behavior variant.
    pub behavior: OutpostBehavior,
    /// Rest gain factor while sleeping at this kind of outpost.
    pub rest_effectiveness: f32,
}

impl OutpostKind {
    /// Resolve a configured kind. Malformed skill entries are logged and
    /// skipped.
    pub fn from_config(config: OutpostKindConfig, needs: &NeedsConfig) -> Self {
        let name = config.name;
        let display_skills = config
            .display_skills
            .iter()
            .filter_map(|raw| {
                let skill = Skill::from_name(raw);
                if skill.is_none() {
                    error!(kind = %name, skill = %raw, "unknown display skill, skipping");
                }
                skill
            })
            .collect();
        Self {
            label: if config.label.is_empty() {
                name.clone()
            } else {
                config.label
            },
            allowed_biomes: config.allowed_biomes,
            disallowed_biomes: config.disallowed_biomes,
            min_agents: config.min_agents,
            required_skills: parse_skill_amounts(&config.required_skills, &name, "required_skills"),
            cost_to_make: config.cost_to_make,
            required_event: config.required_event,
            requires_growing: config.requires_growing,
            result_rules: config
                .result_rules
                .into_iter()
                .map(|r| ResultRule::from_config(r, &name))
                .collect(),
            ticks_per_production: config.ticks_per_production,
            ticks_to_pack: config.ticks_to_pack,
            provided_food: config.provided_food,
            range: config.range,
            display_skills,
            behavior: config.behavior,
            rest_effectiveness: needs.rest_effectiveness,
            name,
        }
    }

    /// Skills that matter to this kind, deduplicated and sorted.
    pub fn relevant_skills(&self) -> Vec<Skill> {
        let mut skills: BTreeSet<Skill> = self.required_skills.iter().map(|s| s.skill).collect();
        for rule in &self.result_rules {
            skills.extend(rule.amounts_per_skill.iter().map(|s| s.skill));
            skills.extend(rule.min_amounts_per_skill.iter().map(|s| s.skill));
        }
        if let OutpostBehavior::RestrictedAdmission {
            min_skill: Some(min),
            ..
        } = self.behavior
        {
            skills.insert(min.skill);
        }
        skills.into_iter().collect()
    }

    /// Rules that produce this cycle. A choose-result kind produces only
    /// the chosen rule, defaulting to the first.
    pub fn active_rules(&self, chosen: Option<usize>) -> Vec<&ResultRule> {
        match self.behavior {
            OutpostBehavior::ChooseResult => {
                self.result_rules.get(chosen.unwrap_or(0)).into_iter().collect()
            }
            OutpostBehavior::Standard | OutpostBehavior::RestrictedAdmission { .. } => {
                self.result_rules.iter().collect()
            }
        }
    }

    /// Whether any rule is configured.
    pub fn produces_anything(&self) -> bool {
        !self.result_rules.is_empty()
    }
}

/// Validate a raw skill list. Each entry must be a single `{skill: amount}`
/// pair naming a known skill with a non-negative amount.
fn parse_skill_amounts(raw: &RawSkillAmounts, kind: &str, field: &str) -> Vec<SkillAmount> {
    let mut parsed = Vec::with_capacity(raw.len());
    for entry in raw {
        let mut pairs = entry.iter();
        let (Some((name, amount)), None) = (pairs.next(), pairs.next()) else {
            error!(
                kind,
                field,
                entries = entry.len(),
                "skill amount must have exactly one entry, skipping"
            );
            continue;
        };
        let Some(skill) = Skill::from_name(name) else {
            error!(kind, field, skill = %name, "unknown skill, skipping");
            continue;
        };
        let Ok(amount) = u32::try_from(*amount) else {
            error!(kind, field, skill = %name, amount, "skill amount out of range, skipping");
            continue;
        };
        parsed.push(SkillAmount { skill, amount });
    }
    parsed
}
