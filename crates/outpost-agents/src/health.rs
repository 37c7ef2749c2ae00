//! The health tick for abstracted agents.
//!
//! One parameterised tick covers both the every-tick condition progression
//! and the periodic care pass (tending plus injury healing). A condition
//! that cannot be progressed is removed on its own; it never aborts the
//! tick for the agent or the outpost.

use rand::Rng;
use tracing::warn;

use outpost_types::{Agent, ConditionKind, HealthCondition};

use crate::config::{NeedsConfig, TICKS_PER_DAY};
use crate::death::check_death;
use crate::error::AgentError;

/// Potency used when tending without any medicine.
pub const NO_MEDICINE_POTENCY: f32 = 0.3;

/// Inputs for the periodic care pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarePass {
    /// Medicine skill of the doctor, if one is available.
    pub doctor_skill: Option<u32>,
    /// Potency of the medicine spent on this agent, if any.
    pub medicine_potency: Option<f32>,
}

/// What happened during one health tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthTickOutcome {
    /// Names of conditions removed because they faulted.
    pub faulted: Vec<String>,
    /// Number of conditions that resolved naturally.
    pub resolved: usize,
    /// Quality of the tend given this tick, if any.
    pub tended: Option<f32>,
    /// Whether the agent died this tick.
    pub died: bool,
}

/// Returns `true` if any condition would benefit from tending.
pub fn needs_tending(agent: &Agent) -> bool {
    agent.medical_care.allows_tending()
        && agent.health.conditions.iter().any(HealthCondition::needs_tending)
}

/// Run one health tick.
///
/// Conditions progress every tick. When `care` is provided the agent is
/// also tended (if it needs it and a doctor is present) and one untended
/// and one tended injury heal.
pub fn health_tick(
    agent: &mut Agent,
    config: &NeedsConfig,
    care: Option<CarePass>,
    rng: &mut impl Rng,
) -> HealthTickOutcome {
    let mut outcome = HealthTickOutcome::default();
    if agent.is_dead() {
        return outcome;
    }

    let food = agent.needs.food;
    let mut kept = Vec::with_capacity(agent.health.conditions.len());
    for mut condition in core::mem::take(&mut agent.health.conditions) {
        match progress(&mut condition, food, config) {
            Ok(true) => outcome.resolved = outcome.resolved.saturating_add(1),
            Ok(false) => kept.push(condition),
            Err(err) => {
                warn!(agent = %agent.id, error = %err, "removing faulted health condition");
                outcome.faulted.push(condition.def);
            }
        }
    }
    agent.health.conditions = kept;

    if let Some(care) = care {
        if let Some(skill) = care.doctor_skill
            && needs_tending(agent)
        {
            outcome.tended = Some(tend(agent, skill, care.medicine_potency, rng));
        }
        outcome.resolved = outcome
            .resolved
            .saturating_add(heal_injuries(agent, config, rng));
    }

    if check_death(agent).is_some() {
        agent.health.dead = true;
        outcome.died = true;
    }
    outcome
}

/// Advance one condition by a tick. Returns `Ok(true)` when it resolved.
fn progress(
    condition: &mut HealthCondition,
    food: f32,
    config: &NeedsConfig,
) -> Result<bool, AgentError> {
    if !condition.severity.is_finite() || condition.severity < 0.0 {
        return Err(AgentError::ConditionFault {
            condition: condition.def.clone(),
            reason: format!("severity {}", condition.severity),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let per_tick = 1.0 / TICKS_PER_DAY as f32;
    match condition.kind {
        ConditionKind::Injury => {}
        ConditionKind::Disease {
            severity_per_day,
            immunity_per_day,
        } => {
            if !severity_per_day.is_finite() || !immunity_per_day.is_finite() {
                return Err(AgentError::ConditionFault {
                    condition: condition.def.clone(),
                    reason: String::from("non-finite progression rate"),
                });
            }
            condition.immunity = (condition.immunity + immunity_per_day * per_tick).min(1.0);
            if condition.immunity >= 1.0 {
                condition.severity -= severity_per_day.abs() * per_tick;
            } else {
                let slowed = 1.0 - 0.5 * condition.tend_quality.unwrap_or(0.0);
                condition.severity += severity_per_day * slowed * per_tick;
            }
        }
        ConditionKind::Malnutrition => {
            if food <= 0.0 {
                condition.severity += config.malnutrition_per_tick;
            } else {
                condition.severity -= config.malnutrition_per_tick * 2.0;
            }
        }
    }
    Ok(condition.severity <= 0.0)
}

/// Tend quality for a doctor of `skill` using medicine of `potency`.
pub fn tend_quality(skill: u32, potency: Option<f32>, noise: f32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let skill_factor = 0.06f32.mul_add(skill.min(20) as f32, 0.2);
    skill_factor
        .mul_add(potency.unwrap_or(NO_MEDICINE_POTENCY), noise)
        .clamp(0.0, 1.0)
}

/// Tend every condition that needs it. Returns the tend quality.
pub fn tend(agent: &mut Agent, skill: u32, potency: Option<f32>, rng: &mut impl Rng) -> f32 {
    let quality = tend_quality(skill, potency, rng.random_range(-0.1..0.1));
    for condition in &mut agent.health.conditions {
        if condition.needs_tending() {
            condition.tend_quality = Some(quality);
        }
    }
    quality
}

/// Heal one random untended injury naturally and one random tended injury
/// at a rate scaled by tend quality. Returns how many injuries closed.
pub fn heal_injuries(agent: &mut Agent, config: &NeedsConfig, rng: &mut impl Rng) -> usize {
    if let Some(idx) = pick_injury(agent, false, rng)
        && let Some(injury) = agent.health.conditions.get_mut(idx)
    {
        injury.severity -= config.heal_per_pass;
    }
    if let Some(idx) = pick_injury(agent, true, rng)
        && let Some(injury) = agent.health.conditions.get_mut(idx)
    {
        let quality = injury.tend_quality.unwrap_or(0.0).clamp(0.0, 1.0);
        injury.severity -= config.heal_per_pass * lerp(0.5, 1.5, quality);
    }

    let before = agent.health.conditions.len();
    agent
        .health
        .conditions
        .retain(|c| !(matches!(c.kind, ConditionKind::Injury) && c.severity <= 0.0));
    before.saturating_sub(agent.health.conditions.len())
}

/// Index of a random injury that is (or is not) tended.
fn pick_injury(agent: &Agent, tended: bool, rng: &mut impl Rng) -> Option<usize> {
    let candidates: Vec<usize> = agent
        .health
        .conditions
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c.kind, ConditionKind::Injury) && c.tend_quality.is_some() == tended)
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.get(rng.random_range(0..candidates.len())).copied()
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn faulted_condition_is_removed_and_tick_continues() {
        let config = NeedsConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut agent = Agent::humanlike("Ada");
        agent.health.conditions.push(HealthCondition::injury("bad", f32::NAN));
        agent.health.conditions.push(HealthCondition::injury("cut", 5.0));

        let outcome = health_tick(&mut agent, &config, None, &mut rng);
        assert_eq!(outcome.faulted, vec![String::from("bad")]);
        assert_eq!(agent.health.conditions.len(), 1);
        assert!(!outcome.died);
    }

    #[test]
    fn care_pass_tends_and_heals() {
        let config = NeedsConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut agent = Agent::humanlike("Ada");
        agent.health.conditions.push(HealthCondition::injury("cut", 5.0));
        let care = CarePass {
            doctor_skill: Some(10),
            medicine_potency: Some(1.0),
        };

        let outcome = health_tick(&mut agent, &config, Some(care), &mut rng);
        let quality = outcome.tended.unwrap_or_default();
        assert!(quality > 0.5);
        let cut = agent.health.conditions.first().map_or(0.0, |c| c.severity);
        // Tended healing runs at 0.5x to 1.5x the natural rate.
        assert!(cut < 5.0 - 0.5 * config.heal_per_pass + 1e-4);
        assert!(!needs_tending(&agent));
    }

    #[test]
    fn no_doctor_still_heals_naturally() {
        let config = NeedsConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut agent = Agent::humanlike("Ada");
        agent.health.conditions.push(HealthCondition::injury("scratch", 1.0));
        let outcome = health_tick(&mut agent, &config, Some(CarePass::default()), &mut rng);
        assert_eq!(outcome.tended, None);
        assert_eq!(outcome.resolved, 1);
        assert!(agent.health.conditions.is_empty());
    }

    #[test]
    fn lethal_injuries_kill() {
        let config = NeedsConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut agent = Agent::humanlike("Ada");
        agent.health.conditions.push(HealthCondition::injury("gunshot", 150.0));
        let outcome = health_tick(&mut agent, &config, None, &mut rng);
        assert!(outcome.died);
        assert!(agent.is_dead());
    }

    #[test]
    fn immunity_beats_a_slow_disease() {
        let config = NeedsConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut agent = Agent::humanlike("Ada");
        agent
            .health
            .conditions
            .push(HealthCondition::disease("flu", 0.2, 0.2, 0.5));
        for _ in 0..420_000 {
            health_tick(&mut agent, &config, None, &mut rng);
        }
        assert!(!agent.is_dead());
        assert!(agent.health.conditions.is_empty());
    }

    #[test]
    fn tend_quality_scales_with_skill_and_medicine() {
        assert!(tend_quality(15, Some(1.0), 0.0) > tend_quality(2, Some(1.0), 0.0));
        assert!(tend_quality(10, Some(1.0), 0.0) > tend_quality(10, None, 0.0));
        assert!(tend_quality(20, Some(1.6), 0.1) <= 1.0);
    }
}
