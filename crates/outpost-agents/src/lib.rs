//! Agent-level mechanics for the outpost simulation.
//!
//! Everything here operates on agents and item stacks without knowing about
//! outposts, caravans, or the host world. The core crate composes these
//! pieces into the outpost trackers.
//!
//! # Modules
//!
//! - [`config`] -- Tunables for needs and health ([`NeedsConfig`])
//! - [`death`] -- Death conditions and belongings stripping ([`DeathCause`])
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`health`] -- The unified health tick, tending, and healing
//! - [`inventory`] -- The outpost item container ([`ItemContainer`])
//! - [`needs`] -- Food, rest, and age per tick
//! - [`roster`] -- Occupant roster and capability filter ([`OccupantRoster`])

pub mod config;
pub mod death;
pub mod error;
pub mod health;
pub mod inventory;
pub mod needs;
pub mod roster;

// Re-export primary types at crate root for convenience.
pub use config::NeedsConfig;
pub use death::DeathCause;
pub use error::AgentError;
pub use health::{CarePass, HealthTickOutcome, health_tick};
pub use inventory::ItemContainer;
pub use roster::{OccupantRoster, cumulative_skill, is_capable};
