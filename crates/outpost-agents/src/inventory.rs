//! The item container held by an outpost.
//!
//! An ordered multiset of [`ItemStack`]s. Stacks are never merged, so every
//! stack keeps its identity (quality, hit points, corpse contents). All
//! removals hand the removed stack back to the caller by value: the
//! container and the receiver can never both hold the same item.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use outpost_types::{ItemCatalog, ItemId, ItemStack};

use crate::error::AgentError;

/// Ordered collection of item stacks owned by a single holder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemContainer {
    stacks: Vec<ItemStack>,
}

impl ItemContainer {
    /// Create an empty container.
    pub const fn new() -> Self {
        Self { stacks: Vec::new() }
    }

    /// Number of stacks held.
    pub const fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Returns `true` when no stacks are held.
    pub const fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Iterate held stacks in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, ItemStack> {
        self.stacks.iter()
    }

    /// Look up a stack by id.
    pub fn get(&self, id: ItemId) -> Option<&ItemStack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    /// Returns `true` if the stack is held here.
    pub fn contains(&self, id: ItemId) -> bool {
        self.stacks.iter().any(|s| s.id == id)
    }

    /// Add a stack. Empty stacks are discarded.
    pub fn add(&mut self, stack: ItemStack) {
        if stack.is_invalid() {
            debug!(def = stack.def, "discarding empty stack");
            return;
        }
        self.stacks.push(stack);
    }

    /// Add every stack from `stacks`.
    pub fn extend(&mut self, stacks: impl IntoIterator<Item = ItemStack>) {
        for stack in stacks {
            self.add(stack);
        }
    }

    /// Total count of `def` across all stacks.
    pub fn count_of(&self, def: &str) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.def == def)
            .fold(0u32, |acc, s| acc.saturating_add(s.count))
    }

    /// Take `count` items from stack `id`, or the whole stack when `count`
    /// is `None` or covers it.
    ///
    /// A partial take splits the stack: the remainder keeps its id and the
    /// returned part gets a fresh one.
    pub fn take(&mut self, id: ItemId, count: Option<u32>) -> Result<ItemStack, AgentError> {
        let idx = self
            .stacks
            .iter()
            .position(|s| s.id == id)
            .ok_or(AgentError::ItemNotFound(id))?;
        let held = self.stacks.get(idx).map_or(0, |s| s.count);
        let wanted = count.unwrap_or(held);
        if wanted == 0 {
            return Err(AgentError::ZeroCount);
        }
        if wanted >= held {
            return Ok(self.stacks.remove(idx));
        }
        let Some(stack) = self.stacks.get_mut(idx) else {
            return Err(AgentError::ItemNotFound(id));
        };
        stack.count = held.saturating_sub(wanted);
        let mut part = stack.clone();
        part.id = ItemId::new();
        part.count = wanted;
        part.corpse = None;
        Ok(part)
    }

    /// Take exactly `count` items of `def`, spread across stacks in order.
    ///
    /// Nothing is removed unless the full amount is available.
    pub fn take_def(&mut self, def: &str, count: u32) -> Result<Vec<ItemStack>, AgentError> {
        let available = self.count_of(def);
        if available < count {
            return Err(AgentError::InsufficientItems {
                def: def.to_owned(),
                requested: count,
                available,
            });
        }
        let ids: Vec<ItemId> = self
            .stacks
            .iter()
            .filter(|s| s.def == def)
            .map(|s| s.id)
            .collect();
        let mut remaining = count;
        let mut taken = Vec::new();
        for id in ids {
            if remaining == 0 {
                break;
            }
            let part = self.take(id, Some(remaining))?;
            remaining = remaining.saturating_sub(part.count);
            taken.push(part);
        }
        Ok(taken)
    }

    /// Remove and return every stack matching `pred`.
    pub fn take_where(&mut self, mut pred: impl FnMut(&ItemStack) -> bool) -> Vec<ItemStack> {
        let (taken, kept): (Vec<ItemStack>, Vec<ItemStack>) = core::mem::take(&mut self.stacks)
            .into_iter()
            .partition(|s| pred(s));
        self.stacks = kept;
        taken
    }

    /// Remove and return everything.
    pub fn drain(&mut self) -> Vec<ItemStack> {
        core::mem::take(&mut self.stacks)
    }

    /// Drop zero-count stacks. Returns how many were swept.
    pub fn purge_invalid(&mut self) -> usize {
        let before = self.stacks.len();
        self.stacks.retain(|s| !s.is_invalid());
        let swept = before.saturating_sub(self.stacks.len());
        if swept > 0 {
            debug!(swept, "purged invalid stacks");
        }
        swept
    }

    /// The highest-potency medicine stack whose potency does not exceed
    /// `max_potency`, with its potency. Invalid stacks are purged first.
    pub fn best_medicine(
        &mut self,
        catalog: &ItemCatalog,
        max_potency: f32,
    ) -> Option<(ItemId, f32)> {
        self.purge_invalid();
        self.stacks
            .iter()
            .filter_map(|s| {
                let potency = catalog.get(&s.def)?.medicine_potency?;
                (potency <= max_potency).then_some((s.id, potency))
            })
            .fold(None, |best: Option<(ItemId, f32)>, cand| match best {
                Some(b) if b.1 >= cand.1 => Some(b),
                _ => Some(cand),
            })
    }

    /// Total market value of the contents.
    pub fn total_value(&self, catalog: &ItemCatalog) -> Decimal {
        self.stacks
            .iter()
            .map(|s| catalog.stack_value(s))
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

impl<'a> IntoIterator for &'a ItemContainer {
    type Item = &'a ItemStack;
    type IntoIter = core::slice::Iter<'a, ItemStack>;

    fn into_iter(self) -> Self::IntoIter {
        self.stacks.iter()
    }
}
