//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity the outpost engine touches has a strongly-typed ID so that
//! an agent id can never be handed to an item lookup by mistake. All IDs use
//! UUID v7 (time-ordered), which keeps saved rosters sorted by creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an outpost.
    OutpostId
}

define_id! {
    /// Unique identifier for an agent (colonist, animal, or hostile).
    AgentId
}

define_id! {
    /// Unique identifier for an item stack.
    ItemId
}

define_id! {
    /// Unique identifier for a faction.
    FactionId
}

define_id! {
    /// Unique identifier for a player or NPC settlement.
    SettlementId
}

define_id! {
    /// Unique identifier for a caravan (mobile group).
    CaravanId
}

define_id! {
    /// Unique identifier for a pack-animal transport job.
    TransportId
}

define_id! {
    /// Unique identifier for a ledger entry (item transfer record).
    LedgerEntryId
}
