//! Shared type definitions for the outpost simulation engine.
//!
//! This crate is the single source of truth for the data that flows between
//! the agent, world, and core crates. It contains no simulation logic.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (skills, delivery methods, ledger kinds)
//! - [`structs`] -- Core entity structs (items, agents, caravans, letters)
//! - [`catalog`] -- Item definitions and the [`ItemCatalog`]

pub mod catalog;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use catalog::{ItemCatalog, ItemDef};
pub use enums::{
    AgentKind, AgentStatus, DeliveryMethod, Holder, LetterKind, MedicalCare, Quality, Rot4, Skill,
    TransferKind,
};
pub use ids::{
    AgentId, CaravanId, FactionId, ItemId, LedgerEntryId, OutpostId, SettlementId, TransportId,
};
pub use structs::{
    Agent, Caravan, Cell, ConditionKind, Health, HealthCondition, HitPoints, ItemStack,
    LedgerEntry, Letter, Needs, SkillRecord, Tile, WornApparel,
};
