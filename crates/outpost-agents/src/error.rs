//! Error types for the outpost-agents crate.
//!
//! Container and health operations return typed errors rather than
//! panicking. Callers decide whether an error is recoverable; the health
//! tick, for instance, catches [`AgentError::ConditionFault`] and removes
//! the offending condition.

use outpost_types::ItemId;

/// Errors that can occur during agent and container operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The requested stack is not in the container.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Attempted to take more items than the container holds.
    #[error("insufficient items: wanted {requested} of {def} but only have {available}")]
    InsufficientItems {
        /// Item definition requested.
        def: String,
        /// The quantity the caller attempted to take.
        requested: u32,
        /// The quantity actually held.
        available: u32,
    },

    /// A zero-count take was requested.
    #[error("cannot take zero items")]
    ZeroCount,

    /// A health condition is in a state that cannot be progressed.
    #[error("health condition {condition} faulted: {reason}")]
    ConditionFault {
        /// Name of the faulting condition.
        condition: String,
        /// Description of the fault.
        reason: String,
    },
}
