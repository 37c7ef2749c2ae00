//! Host world interfaces for the outpost engine, plus an in-memory host.
//!
//! The outpost engine never touches rendering, pathfinding, or combat
//! directly. It asks its host through the traits in [`host`], and the host
//! answers. [`SimWorld`] is a complete host over plain collections.
//!
//! # Modules
//!
//! - [`error`] -- Error types for host operations ([`WorldError`])
//! - [`host`] -- The host traits and [`HostWorld`]
//! - [`sim`] -- [`SimWorld`], the deterministic in-memory host

pub mod error;
pub mod host;
pub mod sim;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use host::{
    BattleSnapshot, Battlefield, CaravanRegistry, DeliveryMap, HostWorld, Notifier,
    SettlementInfo, WorldGrid,
};
pub use sim::{SimBattle, SimMap, SimWorld};
