//! Error types for the `outpost-world` crate.
//!
//! Host operations that can fail return [`WorldError`]. The core engine
//! treats every one of these as recoverable: a failed delivery falls back
//! to local storage, a failed spawn leaves the items with the outpost.

use outpost_types::{AgentId, CaravanId, OutpostId, SettlementId, Tile};

/// Errors that can occur during host world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A tile was not found on the world map.
    #[error("tile not found: {0}")]
    TileNotFound(Tile),

    /// A settlement was not found or has no map.
    #[error("settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    /// A caravan was not found.
    #[error("caravan not found: {0}")]
    CaravanNotFound(CaravanId),

    /// The agent is not spawned on the settlement's map.
    #[error("agent {agent} is not on the map of settlement {settlement}")]
    AgentNotOnMap {
        /// The agent.
        agent: AgentId,
        /// The settlement.
        settlement: SettlementId,
    },

    /// The outpost has no active battlefield map.
    #[error("outpost {0} has no active map")]
    MapNotActive(OutpostId),
}
