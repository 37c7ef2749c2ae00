//! Per-tick food, rest, and age mechanics for abstracted agents.
//!
//! Occupants of an outpost without a rendered map are not simulated by the
//! host, so their needs are advanced here. Visitors only ever eat: their
//! caravan's own travel simulation handles rest.

use outpost_types::{Agent, AgentId, ConditionKind, HealthCondition};

use crate::config::{NeedsConfig, TICKS_PER_DAY, TICKS_PER_HOUR};

/// Local hour of day (0-23) at `tick` for a tile at `longitude` degrees.
pub fn local_hour(tick: u64, longitude: f32) -> u32 {
    let day = i64::try_from(TICKS_PER_DAY).unwrap_or(i64::MAX);
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let offset = (f64::from(longitude) / 360.0 * TICKS_PER_DAY as f64).round() as i64;
    let local = i64::try_from(tick)
        .unwrap_or(i64::MAX)
        .saturating_add(offset)
        .rem_euclid(day);
    let hour = local
        .checked_div(i64::try_from(TICKS_PER_HOUR).unwrap_or(1))
        .unwrap_or(0);
    u32::try_from(hour).unwrap_or(0)
}

/// Returns `true` during the night rest window, which wraps midnight.
pub const fn is_rest_hour(hour: u32, config: &NeedsConfig) -> bool {
    if config.night_start_hour > config.night_end_hour {
        hour >= config.night_start_hour || hour < config.night_end_hour
    } else {
        hour >= config.night_start_hour && hour < config.night_end_hour
    }
}

/// Staggered interval check: fires once every `interval` ticks, at a phase
/// derived from the agent id so that agents do not all act on one tick.
pub fn is_hash_interval_tick(id: AgentId, tick: u64, interval: u64) -> bool {
    if interval == 0 {
        return false;
    }
    let raw = id.into_inner().as_u128();
    #[allow(clippy::cast_possible_truncation)]
    let phase = (raw as u64) ^ (raw.wrapping_shr(64) as u64);
    tick.wrapping_add(phase).checked_rem(interval) == Some(0)
}

/// Advance the agent's age by one tick.
pub const fn advance_age(agent: &mut Agent) {
    agent.age_ticks = agent.age_ticks.saturating_add(1);
}

/// Advance hunger and rest by one tick.
///
/// At zero food the agent starts suffering malnutrition; the health tick
/// progresses it from there.
pub fn tick_needs(agent: &mut Agent, config: &NeedsConfig, resting: bool) {
    let needs = &mut agent.needs;
    needs.food = (needs.food - config.food_fall_per_tick).clamp(0.0, 1.0);
    needs.rest = if resting {
        needs.rest + config.rest_gain_per_tick * config.rest_effectiveness
    } else {
        needs.rest - config.rest_fall_per_tick
    }
    .clamp(0.0, 1.0);

    let starving = needs.food <= 0.0;
    let malnourished = agent
        .health
        .conditions
        .iter()
        .any(|c| matches!(c.kind, ConditionKind::Malnutrition));
    if starving && !malnourished {
        agent.health.conditions.push(HealthCondition {
            def: String::from("malnutrition"),
            kind: ConditionKind::Malnutrition,
            severity: 0.0,
            tend_quality: None,
            immunity: 0.0,
        });
    }
}

/// Returns `true` when the agent's food is at or below its want-eat level.
pub fn wants_to_eat(agent: &Agent) -> bool {
    !agent.is_dead() && agent.needs.food <= agent.needs.food_want_eat
}

/// Feed the agent one item worth `nutrition`. Returns the food gained,
/// which never exceeds what the agent wanted.
pub fn feed(agent: &mut Agent, nutrition: f32) -> f32 {
    let wanted = (1.0 - agent.needs.food).max(0.0);
    let gained = nutrition.clamp(0.0, wanted);
    agent.needs.food += gained;
    gained
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_wrap_with_longitude() {
        assert_eq!(local_hour(0, 0.0), 0);
        assert_eq!(local_hour(2_500 * 23, 0.0), 23);
        // A quarter turn east is six hours ahead.
        assert_eq!(local_hour(0, 90.0), 6);
        // A quarter turn west is six hours behind, wrapping to the prior day.
        assert_eq!(local_hour(0, -90.0), 18);
    }

    #[test]
    fn rest_window_wraps_midnight() {
        let config = NeedsConfig::default();
        assert!(is_rest_hour(23, &config));
        assert!(is_rest_hour(0, &config));
        assert!(is_rest_hour(4, &config));
        assert!(!is_rest_hour(5, &config));
        assert!(!is_rest_hour(12, &config));
    }

    #[test]
    fn hash_interval_fires_once_per_interval() {
        let id = AgentId::new();
        let hits = (0..3_000u64)
            .filter(|t| is_hash_interval_tick(id, *t, 300))
            .count();
        assert_eq!(hits, 10);
        assert!(!is_hash_interval_tick(id, 5, 0));
    }

    #[test]
    fn resting_recovers_at_reduced_effectiveness() {
        let config = NeedsConfig::default();
        let mut agent = Agent::humanlike("Ada");
        agent.needs.rest = 0.5;
        tick_needs(&mut agent, &config, true);
        let expected = 0.5 + config.rest_gain_per_tick * 0.75;
        assert!((agent.needs.rest - expected).abs() < 1e-6);
        tick_needs(&mut agent, &config, false);
        assert!(agent.needs.rest < expected);
    }

    #[test]
    fn starving_adds_malnutrition_once() {
        let config = NeedsConfig::default();
        let mut agent = Agent::humanlike("Ada");
        agent.needs.food = 0.0;
        tick_needs(&mut agent, &config, false);
        tick_needs(&mut agent, &config, false);
        assert_eq!(agent.health.conditions.len(), 1);
    }

    #[test]
    fn feeding_is_capped_by_appetite() {
        let mut agent = Agent::humanlike("Ada");
        agent.needs.food = 0.8;
        let gained = feed(&mut agent, 0.9);
        assert!((gained - 0.2).abs() < 1e-6);
        assert!((agent.needs.food - 1.0).abs() < 1e-6);
        assert!(!wants_to_eat(&agent));
        agent.needs.food = 0.3;
        assert!(wants_to_eat(&agent));
    }
}
