//! Error types for the `outpost-core` crate.
//!
//! Admission failures are not errors: they are [`AcceptanceReport`] values.
//! Everything here is recoverable at the call site; nothing aborts a tick.
//!
//! [`AcceptanceReport`]: crate::admission::AcceptanceReport

use outpost_types::{AgentId, CaravanId, OutpostId};

/// Errors raised by outpost operations.
#[derive(Debug, thiserror::Error)]
pub enum OutpostError {
    /// The agent is not an occupant of this outpost.
    #[error("agent {0} is not an occupant")]
    AgentNotFound(AgentId),

    /// No outpost with this id is registered.
    #[error("outpost not found: {0}")]
    OutpostNotFound(OutpostId),

    /// The outpost kind is not configured.
    #[error("unknown outpost kind: {0}")]
    UnknownKind(String),

    /// The caravan does not exist or is not at the outpost.
    #[error("caravan {0} is not docked at the outpost")]
    CaravanNotDocked(CaravanId),

    /// Packing was requested while already packing.
    #[error("outpost is already packing")]
    AlreadyPacking,

    /// Packing was cancelled while idle.
    #[error("outpost is not packing")]
    NotPacking,

    /// An outpost cannot be founded here with this caravan.
    #[error("cannot found outpost: {reason}")]
    PlacementRejected {
        /// The first failed requirement.
        reason: String,
    },

    /// A command was executed while disabled.
    #[error("command disabled: {reason}")]
    CommandDisabled {
        /// Why the command is unavailable.
        reason: String,
    },

    /// An agent-level operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: outpost_agents::AgentError,
    },

    /// A host operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: outpost_world::WorldError,
    },

    /// A ledger entry was rejected.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: outpost_ledger::LedgerError,
    },

    /// Saved registry state could not be read or written.
    #[error("persistence error: {source}")]
    Persist {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
