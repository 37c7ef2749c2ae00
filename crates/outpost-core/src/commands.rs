//! Player commands on an outpost.
//!
//! [`Outpost::commands`] and [`Outpost::caravan_commands`] list what the
//! player can do right now, each with an optional reason it is disabled.
//! The lists are rebuilt on every call. [`Outpost::execute_command`]
//! re-validates before acting, so a stale descriptor can never bypass a
//! check.

use serde::{Deserialize, Serialize};
use tracing::info;

use outpost_types::{AgentId, Caravan, CaravanId, DeliveryMethod, ItemId, SettlementId};
use outpost_world::WorldGrid;

use crate::admission::{AcceptanceReport, can_add_agent};
use crate::context::TickContext;
use crate::error::OutpostError;
use crate::kind::{OutpostBehavior, OutpostKind};
use crate::outpost::Outpost;
use crate::settings::OutpostsSettings;

/// Countdown set by the dev pack command.
pub const DEV_PACK_TICKS: u64 = 1;

/// Countdown set by the dev produce command.
pub const DEV_PRODUCE_TICKS: u64 = 10;

/// Damage dealt by the dev damage command.
pub const DEV_DAMAGE: f32 = 10.0;

const UNDER_ATTACK: &str = "the outpost is under attack";

/// An action the player can take on an outpost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum OutpostCommand {
    /// Begin the packing countdown.
    StartPacking,
    /// Cancel packing.
    StopPacking,
    /// Send one occupant away.
    RemoveAgent {
        /// The occupant.
        agent: AgentId,
    },
    /// Pick where deliveries go; `None` means the nearest home.
    SetDeliveryDestination {
        /// The settlement.
        settlement: Option<SettlementId>,
    },
    /// Pick the produced result.
    ChooseResult {
        /// Index into the kind's result rules.
        index: usize,
    },
    /// Rename the outpost.
    Rename {
        /// The new name.
        name: String,
    },
    /// Move an agent from a docked caravan into the outpost.
    AddAgent {
        /// The docked caravan.
        caravan: CaravanId,
        /// The agent.
        agent: AgentId,
    },
    /// Move items from the container to a docked caravan.
    TakeItems {
        /// The docked caravan.
        caravan: CaravanId,
        /// The stack.
        item: ItemId,
        /// How many, `None` for the whole stack.
        count: Option<u32>,
    },
    /// Move items from a docked caravan into the container.
    GiveItems {
        /// The docked caravan.
        caravan: CaravanId,
        /// The stack.
        item: ItemId,
        /// How many, `None` for the whole stack.
        count: Option<u32>,
    },
    /// Dev: finish packing on the next tick.
    PackNow,
    /// Dev: produce within a few ticks.
    ProduceNow,
    /// Dev: injure a random occupant.
    DamageRandomAgent,
    /// Dev: empty every occupant's food need.
    StarveAll,
}

impl OutpostCommand {
    /// Translation key of the command's label.
    pub const fn label_key(&self) -> &'static str {
        match self {
            Self::StartPacking => "Outposts.Commands.Pack.Label",
            Self::StopPacking => "Outposts.Commands.StopPack.Label",
            Self::RemoveAgent { .. } => "Outposts.Commands.Remove.Label",
            Self::SetDeliveryDestination { .. } => "Outposts.Commands.DeliveryColony.Label",
            Self::ChooseResult { .. } => "Outposts.Commands.SetResult.Label",
            Self::Rename { .. } => "Outposts.Commands.Rename.Label",
            Self::AddAgent { .. } => "Outposts.Commands.AddPawn.Label",
            Self::TakeItems { .. } => "Outposts.Commands.TakeItems.Label",
            Self::GiveItems { .. } => "Outposts.Commands.GiveItems.Label",
            Self::PackNow => "Dev: Pack",
            Self::ProduceNow => "Dev: Produce",
            Self::DamageRandomAgent => "Dev: Damage random pawn",
            Self::StarveAll => "Dev: All pawns need food",
        }
    }

    /// Whether the command only exists in dev mode.
    pub const fn is_dev(&self) -> bool {
        matches!(
            self,
            Self::PackNow | Self::ProduceNow | Self::DamageRandomAgent | Self::StarveAll
        )
    }
}

/// A command as shown to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    /// The command to execute.
    pub command: OutpostCommand,
    /// Why it is unavailable, if it is.
    pub disabled_reason: Option<String>,
}

impl CommandDescriptor {
    fn enabled(command: OutpostCommand) -> Self {
        Self {
            command,
            disabled_reason: None,
        }
    }

    fn from_report(command: OutpostCommand, report: AcceptanceReport) -> Self {
        Self {
            command,
            disabled_reason: report.reason,
        }
    }

    /// Whether the command can run.
    pub const fn is_enabled(&self) -> bool {
        self.disabled_reason.is_none()
    }
}

/// What an executed command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Nothing further to report.
    Done,
    /// Packing started with this countdown.
    PackingStarted(u64),
    /// An occupant left in this caravan.
    AgentLeft(CaravanId),
    /// An agent was offered from a caravan.
    Admission(AcceptanceReport),
    /// Items moved between container and caravan.
    ItemsMoved(u32),
    /// A dev injury landed on this agent.
    Injured(Option<AgentId>),
}

impl Outpost {
    /// Commands on the outpost itself.
    pub fn commands(&self, kind: &OutpostKind, settings: &OutpostsSettings) -> Vec<CommandDescriptor> {
        let mut out = Vec::new();
        let raided = self.raid.is_active().then(|| String::from(UNDER_ATTACK));
        if self.packing.is_packing() {
            out.push(CommandDescriptor::enabled(OutpostCommand::StopPacking));
        } else {
            out.push(CommandDescriptor {
                command: OutpostCommand::StartPacking,
                disabled_reason: raided.clone(),
            });
        }

        let lonely = (self.occupants.len() <= 1).then(|| String::from("the last occupant cannot leave"));
        for agent in self.occupants.iter() {
            out.push(CommandDescriptor {
                command: OutpostCommand::RemoveAgent { agent: agent.id },
                disabled_reason: lonely.clone(),
            });
        }

        if settings.delivery_method != DeliveryMethod::Store && kind.produces_anything() {
            out.push(CommandDescriptor::enabled(
                OutpostCommand::SetDeliveryDestination {
                    settlement: self.delivery_destination,
                },
            ));
        }
        if matches!(kind.behavior, OutpostBehavior::ChooseResult) {
            out.extend((0..kind.result_rules.len()).map(|index| {
                CommandDescriptor::enabled(OutpostCommand::ChooseResult { index })
            }));
        }
        out.push(CommandDescriptor::enabled(OutpostCommand::Rename {
            name: self.name.clone(),
        }));

        if settings.dev_mode {
            out.push(CommandDescriptor {
                command: OutpostCommand::PackNow,
                disabled_reason: raided,
            });
            out.extend(
                [
                    OutpostCommand::ProduceNow,
                    OutpostCommand::DamageRandomAgent,
                    OutpostCommand::StarveAll,
                ]
                .into_iter()
                .map(CommandDescriptor::enabled),
            );
        }
        out
    }

    /// Commands a docked caravan offers toward this outpost: one per
    /// member to join, one per container stack to take, one per carried
    /// stack to give.
    pub fn caravan_commands<W: WorldGrid + ?Sized>(
        &self,
        kind: &OutpostKind,
        caravan: &Caravan,
        world: &W,
    ) -> Vec<CommandDescriptor> {
        let docked = caravan.tile == self.tile && !caravan.moving;
        let undocked = (!docked).then(|| String::from("caravan is not at the outpost"));
        let mut out: Vec<CommandDescriptor> = caravan
            .members
            .iter()
            .map(|agent| {
                let command = OutpostCommand::AddAgent {
                    caravan: caravan.id,
                    agent: agent.id,
                };
                match &undocked {
                    Some(reason) => CommandDescriptor {
                        command,
                        disabled_reason: Some(reason.clone()),
                    },
                    None => CommandDescriptor::from_report(command, can_add_agent(kind, agent, world)),
                }
            })
            .collect();
        out.extend(self.inventory.iter().map(|stack| CommandDescriptor {
            command: OutpostCommand::TakeItems {
                caravan: caravan.id,
                item: stack.id,
                count: None,
            },
            disabled_reason: undocked.clone(),
        }));
        out.extend(caravan.items().map(|stack| CommandDescriptor {
            command: OutpostCommand::GiveItems {
                caravan: caravan.id,
                item: stack.id,
                count: None,
            },
            disabled_reason: undocked.clone(),
        }));
        out
    }

    /// Run `command`.
    pub fn execute_command(
        &mut self,
        kind: &OutpostKind,
        command: OutpostCommand,
        ctx: &mut TickContext<'_>,
    ) -> Result<CommandOutcome, OutpostError> {
        if command.is_dev() && !ctx.settings.dev_mode {
            return Err(OutpostError::CommandDisabled {
                reason: String::from("dev mode is off"),
            });
        }
        if matches!(command, OutpostCommand::StartPacking | OutpostCommand::PackNow)
            && self.under_attack(ctx)
        {
            return Err(OutpostError::CommandDisabled {
                reason: String::from(UNDER_ATTACK),
            });
        }
        info!(outpost = %self.id, command = command.label_key(), "executing command");
        let outcome = match command {
            OutpostCommand::StartPacking => {
                CommandOutcome::PackingStarted(self.start_packing(kind, ctx.settings)?)
            }
            OutpostCommand::StopPacking => {
                self.stop_packing()?;
                CommandOutcome::Done
            }
            OutpostCommand::RemoveAgent { agent } => {
                CommandOutcome::AgentLeft(self.remove_agent(agent, ctx)?)
            }
            OutpostCommand::SetDeliveryDestination { settlement } => {
                if ctx.settings.delivery_method == DeliveryMethod::Store {
                    return Err(OutpostError::CommandDisabled {
                        reason: String::from("items are stored at the outpost"),
                    });
                }
                if let Some(id) = settlement
                    && ctx.world.settlement(id).is_none()
                {
                    return Err(OutpostError::CommandDisabled {
                        reason: format!("settlement {id} does not exist"),
                    });
                }
                self.set_delivery_destination(settlement);
                CommandOutcome::Done
            }
            OutpostCommand::ChooseResult { index } => {
                self.choose_result(kind, index)?;
                CommandOutcome::Done
            }
            OutpostCommand::Rename { name } => {
                if !self.rename(name) {
                    return Err(OutpostError::CommandDisabled {
                        reason: String::from("name cannot be blank"),
                    });
                }
                CommandOutcome::Done
            }
            OutpostCommand::AddAgent { caravan, agent } => {
                CommandOutcome::Admission(self.add_agent_from_caravan(kind, caravan, agent, ctx)?)
            }
            OutpostCommand::TakeItems {
                caravan,
                item,
                count,
            } => CommandOutcome::ItemsMoved(self.take_items(caravan, item, count, ctx)?),
            OutpostCommand::GiveItems {
                caravan,
                item,
                count,
            } => CommandOutcome::ItemsMoved(self.give_items(caravan, item, count, ctx)?),
            OutpostCommand::PackNow => {
                self.packing.force(DEV_PACK_TICKS);
                CommandOutcome::Done
            }
            OutpostCommand::ProduceNow => {
                self.production.set(DEV_PRODUCE_TICKS);
                CommandOutcome::Done
            }
            OutpostCommand::DamageRandomAgent => {
                CommandOutcome::Injured(self.damage_random_agent(DEV_DAMAGE, ctx))
            }
            OutpostCommand::StarveAll => {
                self.starve_all();
                CommandOutcome::Done
            }
        };
        Ok(outcome)
    }
}
