//! Needs pass: feeding visitors and keeping abstracted occupants alive.
//!
//! Occupants are only simulated here while the outpost has no rendered
//! map. Food is synthesized from the kind's provided food and never drawn
//! from the container; medicine is drawn from the container. Nobody eats
//! when the provided food is missing from the catalog or is not something
//! humans can eat.

use tracing::{debug, warn};

use outpost_agents::death::check_death;
use outpost_agents::health::needs_tending;
use outpost_agents::needs::{
    advance_age, feed, is_hash_interval_tick, is_rest_hour, local_hour, tick_needs, wants_to_eat,
};
use outpost_agents::{CarePass, DeathCause, NeedsConfig, health_tick};
use outpost_types::{AgentId, Holder, Skill, TransferKind};
use outpost_world::{Battlefield, CaravanRegistry, WorldGrid};

use crate::context::TickContext;
use crate::kind::OutpostKind;
use crate::outpost::Outpost;

impl Outpost {
    /// Run the needs pass. Returns `true` when a death left the outpost
    /// empty.
    pub(crate) fn tick_needs(&mut self, kind: &OutpostKind, ctx: &mut TickContext<'_>) -> bool {
        let nutrition = ctx
            .catalog
            .get(&kind.provided_food)
            .filter(|d| d.is_human_food())
            .and_then(|d| d.nutrition);
        self.feed_visitors(kind, nutrition, ctx);

        if self.occupants.is_empty() || ctx.world.map_active(self.id) {
            return false;
        }
        let config = NeedsConfig {
            rest_effectiveness: kind.rest_effectiveness,
            ..ctx.needs.clone()
        };
        let deaths = self.tick_occupants(kind, &config, nutrition, ctx);
        for (agent, cause) in deaths {
            if self.notify_agent_died(agent, cause, ctx) {
                return true;
            }
        }
        false
    }

    /// Members of a caravan docked here eat from the outpost's kitchen.
    fn feed_visitors(&self, kind: &OutpostKind, nutrition: Option<f32>, ctx: &mut TickContext<'_>) {
        let Some(caravan_id) = ctx.world.docked_caravan(self.tile) else {
            return;
        };
        let (tick, interval) = (ctx.tick, ctx.needs.eat_interval);
        let mut fed = Vec::new();
        let mut hungry = Vec::new();
        if let Some(caravan) = ctx.world.caravan_mut(caravan_id) {
            for member in &mut caravan.members {
                if !is_hash_interval_tick(member.id, tick, interval) || !wants_to_eat(member) {
                    continue;
                }
                match nutrition {
                    Some(nutrition) => {
                        feed(member, nutrition);
                        fed.push(member.id);
                    }
                    None => hungry.push(member.id),
                }
            }
        }
        for agent in fed {
            self.record_meal(&kind.provided_food, agent, ctx);
        }
        for agent in hungry {
            self.warn_inedible(kind, agent);
        }
    }

    fn warn_inedible(&self, kind: &OutpostKind, agent: AgentId) {
        warn!(
            outpost = %self.id,
            agent = %agent,
            food = %kind.provided_food,
            "provided food is not edible, meal skipped"
        );
    }

    fn record_meal(&self, food: &str, agent: AgentId, ctx: &mut TickContext<'_>) {
        ctx.record(TransferKind::Produce, food, 1, Holder::World, Holder::Agent(agent));
        ctx.record(TransferKind::Consume, food, 1, Holder::Agent(agent), Holder::Void);
        debug!(outpost = %self.id, agent = %agent, food, "meal eaten");
    }

    fn tick_occupants(
        &mut self,
        kind: &OutpostKind,
        config: &NeedsConfig,
        nutrition: Option<f32>,
        ctx: &mut TickContext<'_>,
    ) -> Vec<(AgentId, Option<DeathCause>)> {
        let tick = ctx.tick;
        let resting = is_rest_hour(local_hour(tick, ctx.world.longitude(self.tile)), config);
        let doctor = self
            .occupants
            .iter()
            .filter(|a| a.is_humanlike() && !a.is_dead() && !a.is_downed())
            .map(|a| a.skill_level(Skill::Medicine))
            .max();

        let mut deaths = Vec::new();
        for id in self.occupants.ids() {
            let care = is_hash_interval_tick(id, tick, config.health_interval)
                .then(|| self.care_pass(id, doctor, ctx));
            let Some(agent) = self.occupants.get_mut(id) else {
                continue;
            };
            advance_age(agent);
            tick_needs(agent, config, resting);
            let outcome = health_tick(agent, config, care, &mut *ctx.rng);
            if !outcome.faulted.is_empty() {
                warn!(outpost = %self.id, agent = %id, faulted = ?outcome.faulted, "health conditions removed");
            }
            if outcome.died {
                deaths.push((id, check_death(agent)));
                continue;
            }
            if is_hash_interval_tick(id, tick, config.eat_interval) && wants_to_eat(agent) {
                match nutrition {
                    Some(nutrition) => {
                        feed(agent, nutrition);
                        self.record_meal(&kind.provided_food, id, ctx);
                    }
                    None => self.warn_inedible(kind, id),
                }
            }
        }
        if !deaths.is_empty() {
            self.invalidate_skills();
        }
        deaths
    }

    /// Pick the doctor's skill and spend one unit of the best allowed
    /// medicine on `agent` if it needs tending.
    fn care_pass(&mut self, agent: AgentId, doctor: Option<u32>, ctx: &mut TickContext<'_>) -> CarePass {
        let Some(patient) = self.occupants.get(agent) else {
            return CarePass::default();
        };
        if doctor.is_none() || !needs_tending(patient) {
            return CarePass {
                doctor_skill: doctor,
                medicine_potency: None,
            };
        }
        let medicine = patient
            .medical_care
            .max_potency()
            .and_then(|max| self.inventory.best_medicine(ctx.catalog, max));
        let medicine_potency = medicine.and_then(|(item, potency)| {
            let unit = self.inventory.take(item, Some(1)).ok()?;
            ctx.record(
                TransferKind::Consume,
                &unit.def,
                unit.count,
                Holder::Outpost(self.id),
                Holder::Void,
            );
            Some(potency)
        });
        CarePass {
            doctor_skill: doctor,
            medicine_potency,
        }
    }
}
