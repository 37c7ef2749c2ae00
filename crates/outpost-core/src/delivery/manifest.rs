//! The item list sent to the player with each delivery.
//!
//! Stacks with an identity of their own (made from a material, damaged,
//! quality-bearing, or a corpse) are listed one per line. Everything else
//! is summed per definition.

use outpost_types::{ItemCatalog, ItemStack};

/// Label of a single stack, including material, quality, and damage.
pub fn item_label(stack: &ItemStack, catalog: &ItemCatalog) -> String {
    let base = catalog.label(&stack.def);
    let mut label = match &stack.stuff {
        Some(stuff) => format!("{} {base}", catalog.label(stuff)),
        None => base.to_owned(),
    };
    if let Some(agent) = &stack.corpse {
        label = format!("{base} of {}", agent.name);
    }
    if let Some(quality) = stack.quality {
        label = format!("{label} ({})", quality.label());
    }
    if let Some(hp) = stack.hit_points
        && hp.is_damaged()
    {
        let percent = u64::from(hp.current)
            .saturating_mul(100)
            .checked_div(u64::from(hp.max))
            .unwrap_or(0);
        label = format!("{label} {percent}%");
    }
    label
}

/// One line per singular stack, then one per remaining definition.
pub fn manifest_lines(stacks: &[ItemStack], catalog: &ItemCatalog) -> Vec<String> {
    let mut singles = Vec::new();
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for stack in stacks {
        if stack.is_singular() {
            singles.push(item_label(stack, catalog));
            continue;
        }
        match counts.iter_mut().find(|(def, _)| *def == stack.def) {
            Some((_, count)) => *count = count.saturating_add(stack.count),
            None => counts.push((&stack.def, stack.count)),
        }
    }
    singles.extend(
        counts
            .into_iter()
            .map(|(def, count)| format!("{count}x {}", catalog.label(def))),
    );
    singles
}

/// Body of the delivery letter.
pub fn manifest_text(outpost: &str, stacks: &[ItemStack], catalog: &ItemCatalog) -> String {
    let mut text = format!("{outpost} has sent the following items:\n");
    for line in manifest_lines(stacks, catalog) {
        text.push_str("  - ");
        text.push_str(&line);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use outpost_types::Quality;

    use super::*;
    use crate::testing::Harness;

    #[test]
    fn plain_stacks_are_summed_and_singles_listed() {
        let h = Harness::new();
        let stacks = vec![
            ItemStack::new("steel", 75),
            ItemStack::new("revolver", 1).with_quality(Quality::Good),
            ItemStack::new("steel", 10),
            ItemStack::new("silver", 5),
            ItemStack::new("revolver", 1).with_hit_points(30, 60),
        ];
        let lines = manifest_lines(&stacks, &h.catalog);
        assert_eq!(
            lines,
            vec![
                String::from("revolver (good)"),
                String::from("revolver 50%"),
                String::from("85x steel"),
                String::from("5x silver"),
            ]
        );
    }

    #[test]
    fn letter_text_lists_every_line() {
        let h = Harness::new();
        let text = manifest_text(
            "Quarry",
            &[ItemStack::new("steel", 3).with_stuff("silver")],
            &h.catalog,
        );
        assert_eq!(text, "Quarry has sent the following items:\n  - silver steel\n");
    }
}
