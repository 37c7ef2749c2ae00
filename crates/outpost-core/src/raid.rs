//! Raid tracker: scheduling, point scaling, and incursion resolution.
//!
//! Raid strength grows with the main colony's threat level, the number of
//! agents able to fight, and the wealth they carry:
//!
//! ```text
//! points = threat(base) * pawns(fighters) * wealth(local) * random(0.25..0.35)
//! points = max(points, min_map_points) * difficulty, clamped to [35, 10000]
//! ```
//!
//! While the battlefield is open the tracker holds the attacking faction and
//! its points; the outpost's occupants live on the host's map until the
//! incursion resolves as a win or a loss.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use outpost_types::{
    Agent, AgentKind, AgentStatus, FactionId, Holder, ItemCatalog, ItemStack, Letter, LetterKind,
    TransferKind,
};
use outpost_world::{Battlefield, Notifier, WorldGrid};

use crate::context::{OutpostEvent, TickContext};
use crate::curves::{LOOT_VALUE_CURVE, PAWN_CURVE, THREAT_CURVE, WEALTH_CURVE};
use crate::outpost::{Outpost, TickOutcome};
use crate::settings::OutpostsSettings;

/// Lowest possible raid.
pub const MIN_RAID_POINTS: f32 = 35.0;

/// Highest possible raid.
pub const MAX_RAID_POINTS: f32 = 10_000.0;

/// Chance that a downed humanlike raider is taken prisoner after a win.
pub const CAPTURE_CHANCE: f64 = 0.33;

/// Band of the random factor applied to raw raid points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaidPointRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound, exclusive.
    pub max: f32,
}

impl Default for RaidPointRange {
    fn default() -> Self {
        Self {
            min: 0.25,
            max: 0.35,
        }
    }
}

impl RaidPointRange {
    /// Draw a factor from the band.
    pub fn sample(self, rng: &mut impl Rng) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Everything [`raid_points`] depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaidPointInputs {
    /// Threat points of the main colony.
    pub base_points: f32,
    /// Agents able to fight.
    pub fighters: usize,
    /// Wealth carried by those agents.
    pub wealth: f32,
    /// Random factor, normally drawn from [`RaidPointRange`].
    pub factor: f32,
    /// Floor before the difficulty multiplier.
    pub min_map_points: f32,
    /// Global difficulty multiplier.
    pub difficulty: f32,
}

/// Resolve raid points. Always within `[35, 10000]`.
pub fn raid_points(inputs: RaidPointInputs) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let fighters = inputs.fighters as f32;
    let raw = THREAT_CURVE.evaluate(inputs.base_points)
        * PAWN_CURVE.evaluate(fighters)
        * WEALTH_CURVE.evaluate(inputs.wealth)
        * inputs.factor;
    let points = raw.max(inputs.min_map_points) * inputs.difficulty;
    if points.is_finite() {
        points.clamp(MIN_RAID_POINTS, MAX_RAID_POINTS)
    } else {
        MIN_RAID_POINTS
    }
}

/// Humanlike non-prisoners and animals trained to be released in combat.
pub fn is_fighter(agent: &Agent) -> bool {
    match agent.kind {
        AgentKind::Humanlike => agent.status != AgentStatus::Prisoner,
        AgentKind::Animal {
            trainable_release, ..
        } => trainable_release,
    }
}

/// Wealth the fighters bring: carried, held, and worn items plus their own
/// market value, discounted by a quarter for slaves.
pub fn local_wealth<'a>(agents: impl IntoIterator<Item = &'a Agent>, catalog: &ItemCatalog) -> f32 {
    let slave_discount = Decimal::new(75, 2);
    let total = agents
        .into_iter()
        .filter(|a| is_fighter(a))
        .map(|agent| {
            let belongings = agent
                .inventory
                .iter()
                .chain(&agent.equipment)
                .chain(agent.apparel.iter().map(|w| &w.item))
                .map(|s| catalog.stack_value(s))
                .fold(Decimal::ZERO, Decimal::saturating_add);
            let own = if agent.status == AgentStatus::Slave {
                agent.market_value.saturating_mul(slave_discount)
            } else {
                agent.market_value
            };
            belongings.saturating_add(own)
        })
        .fold(Decimal::ZERO, Decimal::saturating_add);
    total.to_f32().unwrap_or(f32::MAX)
}

/// Raid state of one outpost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RaidTracker {
    faction: Option<FactionId>,
    #[serde(default)]
    points: f32,
    #[serde(default)]
    ticks_until_raid: Option<u64>,
}

impl RaidTracker {
    /// The attacking faction while an incursion is underway.
    pub const fn faction(&self) -> Option<FactionId> {
        self.faction
    }

    /// Resolved points of the current incursion.
    pub const fn points(&self) -> f32 {
        self.points
    }

    /// Ticks until the next raid, once scheduled.
    pub const fn ticks_until_raid(&self) -> Option<u64> {
        self.ticks_until_raid
    }

    /// Whether an incursion is underway.
    pub const fn is_active(&self) -> bool {
        self.faction.is_some()
    }

    /// Record an incursion.
    pub const fn begin(&mut self, faction: FactionId, points: f32) {
        self.faction = Some(faction);
        self.points = points;
        self.ticks_until_raid = None;
    }

    /// Clear the incursion.
    pub const fn reset(&mut self) {
        self.faction = None;
        self.points = 0.0;
    }

    /// Draw the next raid countdown from the configured interval.
    pub fn schedule(&mut self, settings: &OutpostsSettings, rng: &mut impl Rng) -> u64 {
        let range = settings.raid_interval;
        let ticks = settings
            .scale_ticks(rng.random_range(range.min..=range.max))
            .max(1);
        self.ticks_until_raid = Some(ticks);
        ticks
    }

    /// Advance the countdown. Returns `true` when a raid is due.
    pub const fn advance(&mut self) -> bool {
        if self.faction.is_some() {
            return false;
        }
        match self.ticks_until_raid {
            Some(ticks) if ticks <= 1 => {
                self.ticks_until_raid = None;
                true
            }
            Some(ticks) => {
                self.ticks_until_raid = Some(ticks.saturating_sub(1));
                false
            }
            None => false,
        }
    }
}

impl Outpost {
    /// Raid points for an incursion against this outpost right now.
    pub fn resolve_raid_points(
        &self,
        base_points: f32,
        range: RaidPointRange,
        ctx: &mut TickContext<'_>,
    ) -> f32 {
        let min_map_points = ctx
            .world
            .map_threat_points(self.id)
            .unwrap_or(MIN_RAID_POINTS);
        let inputs = RaidPointInputs {
            base_points,
            fighters: self.occupants.iter().filter(|a| is_fighter(a)).count(),
            wealth: local_wealth(self.occupants.iter(), ctx.catalog),
            factor: range.sample(&mut *ctx.rng),
            min_map_points,
            difficulty: ctx.settings.raid_difficulty_multiplier,
        };
        let points = raid_points(inputs);
        debug!(outpost = %self.id, ?inputs, points, "raid points resolved");
        points
    }

    /// Raid step of the tick.
    pub(crate) fn tick_raid(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        if ctx.world.map_active(self.id) {
            return self.resolve_incursion(ctx);
        }
        if !ctx.settings.do_raids || self.occupants.is_empty() {
            return TickOutcome::Continue;
        }
        if self.raid.ticks_until_raid().is_none() {
            self.raid.schedule(ctx.settings, &mut *ctx.rng);
        } else if self.raid.advance() {
            self.start_raid(ctx);
        }
        TickOutcome::Continue
    }

    fn start_raid(&mut self, ctx: &mut TickContext<'_>) {
        let Some((faction, base)) = ctx.world.raid_target(self.tile, &mut *ctx.rng) else {
            debug!(outpost = %self.id, "no faction available to raid");
            self.raid.schedule(ctx.settings, &mut *ctx.rng);
            return;
        };
        let points = self.resolve_raid_points(base, RaidPointRange::default(), ctx);
        self.raid.begin(faction, points);
        let occupants = self.occupants.drain();
        self.invalidate_skills();
        info!(outpost = %self.id, faction = %faction, points, "outpost raided");
        ctx.world.open_battlefield(self.id, self.tile, occupants, faction, points);
        ctx.world.send_letter(Letter {
            label: format!("Raid on {}", self.name),
            text: format!("{} is under attack.", self.name),
            kind: LetterKind::Negative,
            tile: Some(self.tile),
        });
        ctx.emit(OutpostEvent::RaidStarted {
            outpost: self.id,
            faction,
            points,
        });
    }

    /// Check the battlefield for a win or a loss.
    pub fn resolve_incursion(&mut self, ctx: &mut TickContext<'_>) -> TickOutcome {
        let Some(faction) = self.raid.faction() else {
            return TickOutcome::Continue;
        };
        let Some(snapshot) = ctx.world.snapshot(self.id, faction) else {
            return TickOutcome::Continue;
        };
        if snapshot.free_colonists == 0 {
            ctx.world.close_battlefield(self.id);
            self.raid.reset();
            info!(outpost = %self.id, "outpost lost");
            ctx.world.send_letter(Letter {
                label: String::from("Outpost lost"),
                text: format!("Everyone at {} is gone. The outpost has been lost.", self.name),
                kind: LetterKind::Negative,
                tile: Some(self.tile),
            });
            ctx.emit(OutpostEvent::Lost { outpost: self.id });
            return TickOutcome::Lost;
        }
        if snapshot.active_hostiles > 0 || snapshot.skyfallers > 0 || snapshot.hostile_buildings > 0
        {
            return TickOutcome::Continue;
        }
        self.win_incursion(faction, ctx);
        TickOutcome::Continue
    }

    fn win_incursion(&mut self, faction: FactionId, ctx: &mut TickContext<'_>) {
        self.return_player_agents(ctx);
        let mut lines = Vec::new();
        let mut value = Decimal::ZERO;

        let weapons = ctx.world.take_loose_weapons(self.id);
        value = value.saturating_add(self.secure(weapons, ctx));

        let player = ctx.world.player_faction();
        let corpses = ctx.world.take_player_corpses(self.id, player);
        for corpse in &corpses {
            if let Some(agent) = &corpse.corpse {
                lines.push(format!("{} was brought home for burial.", agent.name));
            }
        }
        self.secure(corpses, ctx);

        let spoils = ctx.world.take_hostile_corpse_weapons(self.id, faction);
        value = value.saturating_add(self.secure(spoils, ctx));

        while let Some(mut hostile) = ctx.world.take_downed_hostile(self.id, faction) {
            if !ctx.rng.random_bool(CAPTURE_CHANCE) {
                continue;
            }
            hostile.status = AgentStatus::Prisoner;
            lines.push(format!("{} was captured.", hostile.name));
            self.occupants.add(hostile);
        }

        let loot_value = LOOT_VALUE_CURVE.evaluate(self.raid.points() * ctx.settings.loot_points_factor);
        let loot = ctx.world.faction_loot(faction, loot_value, &mut *ctx.rng);
        value = value.saturating_add(self.secure(loot, ctx));
        if value > Decimal::ZERO {
            lines.push(format!("Secured loot worth {}.", value.round_dp(0)));
        }

        ctx.world.close_battlefield(self.id);
        self.raid.reset();
        self.raid.schedule(ctx.settings, &mut *ctx.rng);
        self.invalidate_skills();
        info!(outpost = %self.id, loot = %value, "raid repelled");
        let mut text = format!("The attack on {} has been repelled.", self.name);
        for line in lines {
            text.push('\n');
            text.push_str(&line);
        }
        ctx.world.send_letter(Letter {
            label: String::from("Battle won"),
            text,
            kind: LetterKind::Positive,
            tile: Some(self.tile),
        });
        ctx.emit(OutpostEvent::RaidWon {
            outpost: self.id,
            loot_value: value,
        });
    }

    /// Store battlefield items. Returns their market value.
    fn secure(&mut self, stacks: Vec<ItemStack>, ctx: &mut TickContext<'_>) -> Decimal {
        ctx.record_stacks(
            TransferKind::Loot,
            &stacks,
            Holder::World,
            Holder::Outpost(self.id),
        );
        let value = stacks
            .iter()
            .map(|s| ctx.catalog.stack_value(s))
            .fold(Decimal::ZERO, Decimal::saturating_add);
        self.inventory.extend(stacks);
        value
    }

    fn return_player_agents(&mut self, ctx: &mut TickContext<'_>) {
        let player = ctx.world.player_faction();
        for agent in ctx.world.take_player_agents(self.id, player) {
            self.occupants.add(agent);
        }
        self.invalidate_skills();
    }

    /// End an incursion immediately, returning the occupants. Returns
    /// `false` when no battlefield is open.
    pub fn force_end_incursion(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if !ctx.world.map_active(self.id) {
            return false;
        }
        self.return_player_agents(ctx);
        ctx.world.close_battlefield(self.id);
        self.raid.reset();
        self.raid.schedule(ctx.settings, &mut *ctx.rng);
        info!(outpost = %self.id, "incursion ended by force");
        true
    }
}
