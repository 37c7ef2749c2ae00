//! Item definitions and the catalog that resolves them by name.
//!
//! The catalog is loaded from configuration. Unknown definitions resolve to
//! a conservative fallback (stack limit 1, no value) so that a stale save
//! never causes a lookup failure.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::structs::ItemStack;

/// Static properties of an item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Unique definition name.
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Maximum items per stack.
    #[serde(default = "default_stack_limit")]
    pub stack_limit: u32,
    /// Market value of one item.
    #[serde(default)]
    pub market_value: Decimal,
    /// Medical potency, for medicine.
    #[serde(default)]
    pub medicine_potency: Option<f32>,
    /// Nutrition per item, for food.
    #[serde(default)]
    pub nutrition: Option<f32>,
    /// Whether humanlike agents can eat it.
    #[serde(default)]
    pub human_edible: bool,
    /// Whether this is a weapon.
    #[serde(default)]
    pub weapon: bool,
}

const fn default_stack_limit() -> u32 {
    75
}

impl ItemDef {
    /// Returns `true` if the item is medicine.
    pub const fn is_medicine(&self) -> bool {
        self.medicine_potency.is_some()
    }

    /// Returns `true` if the item is nutrition-giving food humans can eat.
    pub fn is_human_food(&self) -> bool {
        self.human_edible && self.nutrition.is_some_and(|n| n > 0.0)
    }

    /// Display label, falling back to the definition name.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// Lookup table of item definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ItemDef>", into = "Vec<ItemDef>")]
pub struct ItemCatalog {
    defs: BTreeMap<String, ItemDef>,
}

impl From<Vec<ItemDef>> for ItemCatalog {
    fn from(defs: Vec<ItemDef>) -> Self {
        Self {
            defs: defs.into_iter().map(|d| (d.name.clone(), d)).collect(),
        }
    }
}

impl From<ItemCatalog> for Vec<ItemDef> {
    fn from(catalog: ItemCatalog) -> Self {
        catalog.defs.into_values().collect()
    }
}

impl ItemCatalog {
    /// Register or replace a definition.
    pub fn insert(&mut self, def: ItemDef) {
        self.defs.insert(def.name.clone(), def);
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&ItemDef> {
        self.defs.get(name)
    }

    /// Stack limit for `name`, 1 when unknown.
    pub fn stack_limit(&self, name: &str) -> u32 {
        self.get(name).map_or(1, |d| d.stack_limit.max(1))
    }

    /// Display label for `name`.
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map_or(name, ItemDef::display_label)
    }

    /// Market value of a whole stack.
    ///
    /// Damaged items are discounted by their remaining hit-point fraction.
    /// Corpses are worth the agent's own market value.
    pub fn stack_value(&self, stack: &ItemStack) -> Decimal {
        if let Some(agent) = &stack.corpse {
            return agent.market_value;
        }
        let unit = self.get(&stack.def).map_or(Decimal::ZERO, |d| d.market_value);
        let mut value = unit.saturating_mul(Decimal::from(stack.count));
        if let Some(hp) = stack.hit_points {
            if hp.max > 0 {
                value = value
                    .saturating_mul(Decimal::from(hp.current))
                    .checked_div(Decimal::from(hp.max))
                    .unwrap_or(value);
            }
        }
        value
    }

    /// Iterate all weapon definitions.
    pub fn weapons(&self) -> impl Iterator<Item = &ItemDef> {
        self.defs.values().filter(|d| d.weapon)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` when no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        serde_yml::from_str(
            r"
- name: steel
  stack_limit: 75
  market_value: 1.9
- name: medicine_industrial
  label: medicine
  stack_limit: 25
  market_value: 18
  medicine_potency: 1.0
- name: meal_simple
  stack_limit: 10
  nutrition: 0.9
  human_edible: true
",
        )
        .unwrap()
    }

    #[test]
    fn loads_from_yaml_list() {
        let c = catalog();
        assert_eq!(c.len(), 3);
        assert_eq!(c.stack_limit("medicine_industrial"), 25);
        assert!(c.get("medicine_industrial").unwrap().is_medicine());
        assert!(c.get("meal_simple").unwrap().is_human_food());
        assert_eq!(c.label("medicine_industrial"), "medicine");
        assert_eq!(c.label("steel"), "steel");
    }

    #[test]
    fn unknown_defs_fall_back() {
        let c = catalog();
        assert_eq!(c.stack_limit("unobtainium"), 1);
        assert_eq!(c.stack_value(&ItemStack::new("unobtainium", 5)), Decimal::ZERO);
    }

    #[test]
    fn damaged_stacks_are_discounted() {
        let c = catalog();
        let whole = c.stack_value(&ItemStack::new("medicine_industrial", 2));
        assert_eq!(whole, Decimal::new(36, 0));
        let half = c.stack_value(&ItemStack::new("medicine_industrial", 2).with_hit_points(5, 10));
        assert_eq!(half, Decimal::new(18, 0));
    }
}
