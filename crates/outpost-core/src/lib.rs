//! Outpost lifecycle and resource simulation.
//!
//! An outpost is a caravan settled on a world tile. Its occupants produce
//! items on a fixed cycle, the items are delivered to a player settlement,
//! and the outpost can be packed back into a caravan. While the outpost has
//! no rendered map its occupants are kept alive here, and it is raided on a
//! random interval.
//!
//! # Modules
//!
//! - [`kind`] -- Outpost kinds: admission rules, costs, and production rules.
//! - [`outpost`] -- The outpost itself and its per-tick pipeline.
//! - [`admission`] -- Agent admission and founding requirements.
//! - [`packing`] / [`production`] -- The two countdown trackers.
//! - [`needs`] -- Keeping abstracted occupants fed, rested, and tended.
//! - [`raid`] -- Raid scheduling, point scaling, and incursion outcomes.
//! - [`delivery`] -- Routing produced items to a settlement.
//! - [`commands`] -- Player and debug commands.
//! - [`arrival`] -- Transport pods landing on an outpost.
//! - [`registry`] -- Every outpost in a run and the tick loop over them.
//! - [`settings`] / [`config`] -- Global settings, per-kind overrides, and
//!   YAML loading.

pub mod admission;
pub mod arrival;
pub mod commands;
pub mod config;
pub mod context;
pub mod curves;
pub mod delivery;
pub mod error;
pub mod kind;
pub mod needs;
pub mod outpost;
pub mod packing;
pub mod production;
pub mod raid;
pub mod registry;
pub mod settings;

#[cfg(test)]
mod testing;

pub use admission::AcceptanceReport;
pub use arrival::{PodOption, TransportPods};
pub use commands::{CommandDescriptor, CommandOutcome, OutpostCommand};
pub use config::SimulationConfig;
pub use context::{OutpostEvent, TickContext};
pub use error::OutpostError;
pub use kind::OutpostKind;
pub use outpost::{Outpost, TickOutcome};
pub use registry::{OutpostRegistry, TickSummary};
pub use settings::OutpostsSettings;
