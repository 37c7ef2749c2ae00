//! Global outpost settings and the per-kind settings registry.
//!
//! [`OutpostsSettings`] is the global settings value. It is loaded once,
//! passed to every operation through the tick context, and saved
//! explicitly next to a save game with [`OutpostsSettings::save`].
//!
//! [`SettingsRegistry`] maps stable string keys to typed descriptors for
//! the tunable fields of an [`OutpostKind`]. Per-kind overrides are stored
//! as strings under `per_outpost.<kind>.<key>` and applied when the kind is
//! resolved.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use outpost_types::DeliveryMethod;

use crate::config::ConfigError;
use crate::kind::OutpostKind;

/// A closed tick interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    /// Lower bound, inclusive.
    pub min: u64,
    /// Upper bound, inclusive.
    pub max: u64,
}

/// Global settings shared by every outpost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutpostsSettings {
    /// Multiplier on every produced amount (0.1 to 10).
    #[serde(default = "default_multiplier")]
    pub production_multiplier: f32,

    /// Multiplier on every countdown (0.01 to 5).
    #[serde(default = "default_multiplier")]
    pub time_multiplier: f32,

    /// How produced items reach the destination settlement.
    #[serde(default)]
    pub delivery_method: DeliveryMethod,

    /// Whether outposts get raided.
    #[serde(default = "default_do_raids")]
    pub do_raids: bool,

    /// Ticks between raids on one outpost.
    #[serde(default = "default_raid_interval")]
    pub raid_interval: TickRange,

    /// Multiplier on resolved raid points (0.01 to 10).
    #[serde(default = "default_multiplier")]
    pub raid_difficulty_multiplier: f32,

    /// Multiplier on raid points when valuing faction loot.
    #[serde(default = "default_multiplier")]
    pub loot_points_factor: f32,

    /// Per-kind overrides: kind name to setting key to value.
    #[serde(default)]
    pub per_outpost: BTreeMap<String, BTreeMap<String, String>>,

    /// Enables debug commands.
    #[serde(default)]
    pub dev_mode: bool,

    /// Seed for the run's random generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for OutpostsSettings {
    fn default() -> Self {
        Self {
            production_multiplier: default_multiplier(),
            time_multiplier: default_multiplier(),
            delivery_method: DeliveryMethod::default(),
            do_raids: default_do_raids(),
            raid_interval: default_raid_interval(),
            raid_difficulty_multiplier: default_multiplier(),
            loot_points_factor: default_multiplier(),
            per_outpost: BTreeMap::new(),
            dev_mode: false,
            seed: default_seed(),
        }
    }
}

const fn default_multiplier() -> f32 {
    1.0
}

const fn default_do_raids() -> bool {
    true
}

/// Half a quadrum to a full quadrum.
const fn default_raid_interval() -> TickRange {
    TickRange {
        min: 450_000,
        max: 900_000,
    }
}

const fn default_seed() -> u64 {
    42
}

/// Clamp `value` into `[min, max]`, mapping non-finite input to `fallback`.
fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl OutpostsSettings {
    /// Force every bounded value into its range.
    pub fn sanitize(&mut self) {
        self.production_multiplier = clamp_finite(self.production_multiplier, 0.1, 10.0, 1.0);
        self.time_multiplier = clamp_finite(self.time_multiplier, 0.01, 5.0, 1.0);
        self.raid_difficulty_multiplier =
            clamp_finite(self.raid_difficulty_multiplier, 0.01, 10.0, 1.0);
        self.loot_points_factor = clamp_finite(self.loot_points_factor, 0.0, 10.0, 1.0);
        if self.raid_interval.min > self.raid_interval.max {
            core::mem::swap(&mut self.raid_interval.min, &mut self.raid_interval.max);
        }
    }

    /// Scale a tick count by the global time multiplier.
    pub fn scale_ticks(&self, ticks: u64) -> u64 {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let scaled = (ticks as f64 * f64::from(self.time_multiplier)).round() as u64;
        scaled
    }

    /// Overrides recorded for one outpost kind.
    pub fn overrides_for(&self, kind: &str) -> Option<&BTreeMap<String, String>> {
        self.per_outpost.get(kind)
    }

    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if it is not valid settings YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_yml::from_str(&contents)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save settings as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if serialization fails, or
    /// [`ConfigError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Settings registry
// ---------------------------------------------------------------------------

/// How a setting is presented to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Whole numbers.
    IntSlider,
    /// Real numbers.
    Slider,
    /// A real number shown as a percentage.
    Percentage,
    /// A tick count shown as days and hours.
    Time,
    /// On or off.
    Checkbox,
}

/// A tunable field of [`OutpostKind`].
#[derive(Debug, Clone, Copy)]
pub struct SettingDescriptor {
    /// Stable key, e.g. `"OutpostKind.TicksToPack"`.
    pub key: &'static str,
    /// Localization key for the label.
    pub label_key: &'static str,
    /// Presentation.
    pub mode: DrawMode,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// The setting is hidden for kinds whose value equals this sentinel.
    pub hide_when: Option<f64>,
    read: fn(&OutpostKind) -> f64,
    write: fn(&mut OutpostKind, f64),
}

impl SettingDescriptor {
    /// The kind's current value.
    pub fn value(&self, kind: &OutpostKind) -> f64 {
        (self.read)(kind)
    }

    /// Whether the setting applies to `kind` at all.
    pub fn visible(&self, kind: &OutpostKind) -> bool {
        self.hide_when
            .is_none_or(|sentinel| (self.value(kind) - sentinel).abs() > f64::EPSILON)
    }

    /// Parse a stored value. Returns `None` for anything unusable.
    pub fn parse(&self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        let value = match self.mode {
            DrawMode::Checkbox => match raw {
                "true" => 1.0,
                "false" => 0.0,
                other => other.parse::<f64>().ok()?,
            },
            _ => raw.parse::<f64>().ok()?,
        };
        if !value.is_finite() {
            return None;
        }
        Some(match self.mode {
            DrawMode::IntSlider | DrawMode::Time | DrawMode::Checkbox => value.round(),
            DrawMode::Slider | DrawMode::Percentage => value,
        })
    }

    /// Clamp `value` into bounds and write it into `kind`.
    pub fn apply(&self, kind: &mut OutpostKind, value: f64) {
        (self.write)(kind, value.clamp(self.min, self.max));
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(value: f64) -> u32 {
    value as u32
}

#[allow(clippy::cast_possible_truncation)]
fn to_i32(value: f64) -> i32 {
    value as i32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u64(value: f64) -> u64 {
    value as u64
}

#[allow(clippy::cast_possible_truncation)]
fn to_f32(value: f64) -> f32 {
    value as f32
}

#[allow(clippy::cast_precision_loss)]
fn from_u64(value: u64) -> f64 {
    value as f64
}

/// Registry of every tunable outpost-kind field.
#[derive(Debug, Clone)]
pub struct SettingsRegistry {
    descriptors: Vec<SettingDescriptor>,
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::outpost_kinds()
    }
}

impl SettingsRegistry {
    /// The registry of [`OutpostKind`] settings.
    pub fn outpost_kinds() -> Self {
        Self {
            descriptors: vec![
                SettingDescriptor {
                    key: "OutpostKind.MinAgents",
                    label_key: "Outposts.Setting.MinimumPawns",
                    mode: DrawMode::IntSlider,
                    min: 1.0,
                    max: 10.0,
                    hide_when: Some(0.0),
                    read: |k| f64::from(k.min_agents),
                    write: |k, v| k.min_agents = to_u32(v),
                },
                SettingDescriptor {
                    key: "OutpostKind.Range",
                    label_key: "Outposts.Setting.Range",
                    mode: DrawMode::IntSlider,
                    min: 1.0,
                    max: 30.0,
                    hide_when: Some(-1.0),
                    read: |k| f64::from(k.range),
                    write: |k, v| k.range = to_i32(v),
                },
                SettingDescriptor {
                    key: "OutpostKind.TicksPerProduction",
                    label_key: "Outposts.Setting.ProductionTime",
                    mode: DrawMode::Time,
                    min: 60_000.0,
                    max: 3_600_000.0,
                    hide_when: Some(0.0),
                    read: |k| from_u64(k.ticks_per_production),
                    write: |k, v| k.ticks_per_production = to_u64(v),
                },
                SettingDescriptor {
                    key: "OutpostKind.TicksToPack",
                    label_key: "Outposts.Setting.PackTime",
                    mode: DrawMode::Time,
                    min: 2_500.0,
                    max: 3_600_000.0,
                    hide_when: None,
                    read: |k| from_u64(k.ticks_to_pack),
                    write: |k, v| k.ticks_to_pack = to_u64(v),
                },
                SettingDescriptor {
                    key: "Needs.RestEffectiveness",
                    label_key: "Outposts.Setting.RestEffectiveness",
                    mode: DrawMode::Percentage,
                    min: 0.1,
                    max: 2.0,
                    hide_when: None,
                    read: |k| f64::from(k.rest_effectiveness),
                    write: |k, v| k.rest_effectiveness = to_f32(v),
                },
            ],
        }
    }

    /// Look up a descriptor by key.
    pub fn get(&self, key: &str) -> Option<&SettingDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    /// Every descriptor, in registration order.
    pub fn iter(&self) -> core::slice::Iter<'_, SettingDescriptor> {
        self.descriptors.iter()
    }

    /// Descriptors shown for `kind`.
    pub fn visible_for<'a>(
        &'a self,
        kind: &'a OutpostKind,
    ) -> impl Iterator<Item = &'a SettingDescriptor> {
        self.descriptors.iter().filter(move |d| d.visible(kind))
    }

    /// Apply stored overrides to `kind`. Unknown keys, unparsable values,
    /// and settings hidden for this kind are logged and ignored. Returns
    /// how many overrides took effect.
    pub fn apply_overrides(
        &self,
        kind: &mut OutpostKind,
        overrides: &BTreeMap<String, String>,
    ) -> usize {
        let mut applied = 0usize;
        for (key, raw) in overrides {
            let Some(descriptor) = self.get(key) else {
                warn!(kind = %kind.name, key = %key, "unknown outpost setting");
                continue;
            };
            if !descriptor.visible(kind) {
                warn!(kind = %kind.name, key = %key, "setting does not apply to this kind");
                continue;
            }
            let Some(value) = descriptor.parse(raw) else {
                warn!(kind = %kind.name, key = %key, value = %raw, "unparsable setting value");
                continue;
            };
            descriptor.apply(kind, value);
            applied = applied.saturating_add(1);
        }
        applied
    }

    /// Store an override for `key`, or drop it when `value` equals the
    /// configured default of `base`. Returns `false` for unknown keys.
    pub fn set_override(
        &self,
        overrides: &mut BTreeMap<String, String>,
        base: &OutpostKind,
        key: &str,
        value: f64,
    ) -> bool {
        let Some(descriptor) = self.get(key) else {
            return false;
        };
        let value = value.clamp(descriptor.min, descriptor.max);
        if (value - descriptor.value(base)).abs() <= f64::EPSILON {
            overrides.remove(key);
        } else {
            overrides.insert(key.to_owned(), value.to_string());
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::OutpostKindConfig;

    fn kind() -> OutpostKind {
        let config: OutpostKindConfig = serde_yml::from_str("name: farm\nmin_agents: 2\n").unwrap();
        OutpostKind::from_config(config, &outpost_agents::NeedsConfig::default())
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = OutpostsSettings::default();
        assert_eq!(settings.delivery_method, DeliveryMethod::Teleport);
        assert!(settings.do_raids);
        assert_eq!(settings.raid_interval.min, 450_000);
        assert_eq!(settings.raid_interval.max, 900_000);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = OutpostsSettings {
            production_multiplier: 50.0,
            time_multiplier: f32::NAN,
            raid_interval: TickRange { min: 9, max: 3 },
            ..OutpostsSettings::default()
        };
        settings.sanitize();
        assert!((settings.production_multiplier - 10.0).abs() < f32::EPSILON);
        assert!((settings.time_multiplier - 1.0).abs() < f32::EPSILON);
        assert_eq!(settings.raid_interval, TickRange { min: 3, max: 9 });
    }

    #[test]
    fn scale_ticks_uses_time_multiplier() {
        let settings = OutpostsSettings {
            time_multiplier: 0.5,
            ..OutpostsSettings::default()
        };
        assert_eq!(settings.scale_ticks(420_000), 210_000);
    }

    #[test]
    fn overrides_are_parsed_clamped_and_applied() {
        let registry = SettingsRegistry::outpost_kinds();
        let mut kind = kind();
        let overrides: BTreeMap<String, String> = [
            ("OutpostKind.MinAgents", "40"),
            ("OutpostKind.TicksToPack", "120000"),
            ("OutpostKind.Range", "not a number"),
            ("Outpost.Unknown", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        let applied = registry.apply_overrides(&mut kind, &overrides);
        assert_eq!(applied, 2);
        assert_eq!(kind.min_agents, 10);
        assert_eq!(kind.ticks_to_pack, 120_000);
        assert_eq!(kind.range, -1);
    }

    #[test]
    fn hidden_settings_are_not_applied() {
        let registry = SettingsRegistry::outpost_kinds();
        let mut kind = kind();
        let overrides: BTreeMap<String, String> =
            [("OutpostKind.Range".to_owned(), "5".to_owned())].into_iter().collect();
        assert_eq!(registry.apply_overrides(&mut kind, &overrides), 0);
        assert_eq!(kind.range, -1);
        assert!(registry.visible_for(&kind).all(|d| d.key != "OutpostKind.Range"));
    }

    #[test]
    fn default_values_are_dropped_from_overrides() {
        let registry = SettingsRegistry::outpost_kinds();
        let base = kind();
        let mut overrides = BTreeMap::new();
        assert!(registry.set_override(&mut overrides, &base, "OutpostKind.TicksToPack", 60_000.0));
        assert_eq!(overrides.get("OutpostKind.TicksToPack").map(String::as_str), Some("60000"));
        assert!(registry.set_override(&mut overrides, &base, "OutpostKind.TicksToPack", 420_000.0));
        assert!(overrides.is_empty());
        assert!(!registry.set_override(&mut overrides, &base, "Nope", 1.0));
    }

    #[test]
    fn checkbox_values_parse_as_flags() {
        let descriptor = SettingDescriptor {
            key: "Test.Flag",
            label_key: "Test.Flag",
            mode: DrawMode::Checkbox,
            min: 0.0,
            max: 1.0,
            hide_when: None,
            read: |_| 0.0,
            write: |_, _| {},
        };
        assert_eq!(descriptor.parse("true"), Some(1.0));
        assert_eq!(descriptor.parse("false"), Some(0.0));
        assert_eq!(descriptor.parse("maybe"), None);
    }

    #[test]
    fn settings_save_and_load() {
        let dir = std::env::temp_dir().join(format!("outposts-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.yaml");
        let mut settings = OutpostsSettings {
            delivery_method: DeliveryMethod::Store,
            ..OutpostsSettings::default()
        };
        settings
            .per_outpost
            .entry("farm".to_owned())
            .or_default()
            .insert("OutpostKind.TicksToPack".to_owned(), "60000".to_owned());
        settings.save(&path).unwrap();
        let loaded = OutpostsSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
