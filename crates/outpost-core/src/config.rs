//! Configuration loading and typed config structures for the outpost engine.
//!
//! The canonical configuration lives in `outposts-config.yaml` at the
//! project root. This module defines the structs that mirror the YAML and
//! a loader for it. Outpost kinds are kept in their raw form here and
//! resolved into [`OutpostKind`](crate::kind::OutpostKind) values by the
//! registry, which is where malformed rules are reported and skipped.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use outpost_agents::NeedsConfig;
use outpost_types::ItemCatalog;

use crate::kind::OutpostBehavior;
use crate::settings::OutpostsSettings;

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write a configuration file.
    #[error("failed to access config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse or emit YAML content.
    #[error("failed to process config YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `outposts-config.yaml`. Every section may be
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Global settings.
    #[serde(default)]
    pub settings: OutpostsSettings,

    /// Needs and health tunables.
    #[serde(default)]
    pub needs: NeedsConfig,

    /// Item definitions.
    #[serde(default)]
    pub items: ItemCatalog,

    /// Outpost kinds, in declaration order.
    #[serde(default)]
    pub outpost_kinds: Vec<OutpostKindConfig>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.settings.sanitize();
        Ok(config)
    }
}

/// A `{item, count}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemCount {
    /// Item definition name.
    pub item: String,
    /// Number of items.
    pub count: u32,
}

/// Skill amounts as written in YAML: a list of single-entry maps such as
/// `- mining: 5`. Validation happens when the kind is resolved.
pub type RawSkillAmounts = Vec<BTreeMap<String, i64>>;

/// One production rule, unresolved.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultRuleConfig {
    /// Produced item.
    pub item: String,
    /// Flat amount per cycle.
    #[serde(default)]
    pub base_amount: u32,
    /// Extra amount per capable agent.
    #[serde(default)]
    pub amount_per_agent: u32,
    /// Extra amount per point of cumulative skill.
    #[serde(default)]
    pub amounts_per_skill: RawSkillAmounts,
    /// Cumulative skill required before the rule yields anything.
    #[serde(default)]
    pub min_amounts_per_skill: RawSkillAmounts,
}

/// One outpost kind, unresolved.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutpostKindConfig {
    /// Unique kind name.
    pub name: String,

    /// Display label.
    #[serde(default)]
    pub label: String,

    /// Biomes the kind may be founded in; empty means any.
    #[serde(default)]
    pub allowed_biomes: Vec<String>,

    /// Biomes the kind may never be founded in.
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,

    /// Minimum admissible agents to found.
    #[serde(default)]
    pub min_agents: u32,

    /// Cumulative skills required to found.
    #[serde(default)]
    pub required_skills: RawSkillAmounts,

    /// One-time cost paid from absorbed caravan items.
    #[serde(default)]
    pub cost_to_make: Vec<ItemCount>,

    /// Event every admitted agent must be willing to take part in.
    #[serde(default)]
    pub required_event: Option<String>,

    /// Whether the tile must allow growing.
    #[serde(default)]
    pub requires_growing: bool,

    /// Production rules.
    #[serde(default)]
    pub result_rules: Vec<ResultRuleConfig>,

    /// Ticks between production cycles (default: 15 days).
    #[serde(default = "default_ticks_per_production")]
    pub ticks_per_production: u64,

    /// Base packing duration for one occupant (default: 7 days).
    #[serde(default = "default_ticks_to_pack")]
    pub ticks_to_pack: u64,

    /// Food occupants eat.
    #[serde(default = "default_provided_food")]
    pub provided_food: String,

    /// World display radius, `-1` for none.
    #[serde(default = "default_range")]
    pub range: i32,

    /// Skills shown in the inspect pane besides the relevant ones.
    #[serde(default)]
    pub display_skills: Vec<String>,

    /// Behavior variant.
    #[serde(default)]
    pub behavior: OutpostBehavior,
}

const fn default_ticks_per_production() -> u64 {
    900_000
}

const fn default_ticks_to_pack() -> u64 {
    420_000
}

fn default_provided_food() -> String {
    String::from("meal_simple")
}

const fn default_range() -> i32 {
    -1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use outpost_types::DeliveryMethod;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert!(config.outpost_kinds.is_empty());
    }

    #[test]
    fn parses_full_kind() {
        let yaml = r"
settings:
  delivery_method: pack_or_pods
  production_multiplier: 2.0
  raid_interval: { min: 60000, max: 120000 }
items:
  - name: steel
    market_value: 2
outpost_kinds:
  - name: mining
    label: mining outpost
    disallowed_biomes: [ocean]
    min_agents: 2
    required_skills:
      - mining: 10
    cost_to_make:
      - { item: steel, count: 50 }
    result_rules:
      - item: steel
        base_amount: 10
        amounts_per_skill:
          - mining: 3
    behavior:
      type: restricted_admission
      humanlike_only: true
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.settings.delivery_method, DeliveryMethod::PackOrPods);
        assert_eq!(config.settings.raid_interval.max, 120_000);
        assert_eq!(config.items.len(), 1);
        let kind = config.outpost_kinds.first().unwrap();
        assert_eq!(kind.min_agents, 2);
        assert_eq!(kind.ticks_to_pack, 420_000);
        assert_eq!(kind.provided_food, "meal_simple");
        assert_eq!(kind.range, -1);
        assert_eq!(kind.cost_to_make.first().unwrap().count, 50);
        assert!(matches!(
            kind.behavior,
            OutpostBehavior::RestrictedAdmission { humanlike_only: true, .. }
        ));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SimulationConfig::parse("outpost_kinds: [[[");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn settings_are_sanitized_on_parse() {
        let config = SimulationConfig::parse("settings:\n  time_multiplier: 99\n").unwrap();
        assert!((config.settings.time_multiplier - 5.0).abs() < f32::EPSILON);
    }
}
