//! The occupant roster of an outpost.
//!
//! Holds agents by value. The "capable" subset is derived on demand: a
//! capable agent is a living humanlike that is not totally disabled in any
//! of the outpost's relevant skills.

use serde::{Deserialize, Serialize};
use tracing::debug;

use outpost_types::{Agent, AgentId, Skill};

/// Ordered collection of agents living at an outpost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccupantRoster {
    agents: Vec<Agent>,
}

impl OccupantRoster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Number of occupants.
    pub const fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns `true` when nobody lives here.
    pub const fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns `true` if the agent is an occupant.
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.iter().any(|a| a.id == id)
    }

    /// Add an agent unless an agent with the same id is already present.
    ///
    /// Returns `false` for a duplicate; the duplicate copy is dropped.
    pub fn add(&mut self, agent: Agent) -> bool {
        if self.contains(agent.id) {
            debug!(agent = %agent.id, "agent already in roster");
            return false;
        }
        self.agents.push(agent);
        true
    }

    /// Remove and return an occupant.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let idx = self.agents.iter().position(|a| a.id == id)?;
        Some(self.agents.remove(idx))
    }

    /// Remove and return every occupant.
    pub fn drain(&mut self) -> Vec<Agent> {
        core::mem::take(&mut self.agents)
    }

    /// Look up an occupant.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Look up an occupant mutably.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    /// Iterate occupants.
    pub fn iter(&self) -> core::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    /// Iterate occupants mutably.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Agent> {
        self.agents.iter_mut()
    }

    /// Occupant ids in roster order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id).collect()
    }

    /// Occupants able to work given the outpost's relevant skills.
    pub fn capable<'a>(&'a self, relevant: &'a [Skill]) -> impl Iterator<Item = &'a Agent> {
        self.agents.iter().filter(|a| is_capable(a, relevant))
    }

    /// Drop any repeated ids, keeping the first occurrence.
    pub fn sweep_duplicates(&mut self) -> usize {
        let before = self.agents.len();
        let mut seen = std::collections::BTreeSet::new();
        self.agents.retain(|a| seen.insert(a.id));
        let swept = before.saturating_sub(self.agents.len());
        if swept > 0 {
            debug!(swept, "swept duplicate roster entries");
        }
        swept
    }
}

/// Returns `true` if the agent can contribute work.
pub fn is_capable(agent: &Agent, relevant: &[Skill]) -> bool {
    agent.is_humanlike() && !agent.is_dead() && !relevant.iter().any(|s| agent.skill_disabled(*s))
}

/// Sum of `skill` levels across `agents`.
pub fn cumulative_skill<'a>(agents: impl IntoIterator<Item = &'a Agent>, skill: Skill) -> u32 {
    agents
        .into_iter()
        .fold(0u32, |acc, a| acc.saturating_add(a.skill_level(skill)))
}
