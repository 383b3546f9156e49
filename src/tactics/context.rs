//! Per-call view of the battlefield for one agent

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::Cell;
use crate::hazard::HazardField;
use crate::tactics::breach::BreachState;
use crate::tactics::risk;
use crate::world::agent::AgentState;
use crate::world::query::{Battlefield, PathResult, TerrainQuery, TraversalParams, WorldQuery};

/// Everything a candidate strategy may read
pub struct DecisionContext<'a> {
    pub agent: &'a AgentState,
    pub battlefield: &'a dyn Battlefield,
    pub config: &'a EngineConfig,
    pub hazard: &'a HazardField,
    pub breach: BreachState,
    /// Standing members of the agent's faction, the agent included
    pub group_size: usize,
    pub params: TraversalParams,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        agent: &'a AgentState,
        battlefield: &'a dyn Battlefield,
        config: &'a EngineConfig,
        hazard: &'a HazardField,
        breach: BreachState,
    ) -> Self {
        let group_size = battlefield
            .agents()
            .iter()
            .filter(|a| a.faction == agent.faction && !a.downed)
            .count()
            .max(1);
        Self {
            agent,
            battlefield,
            config,
            hazard,
            breach,
            group_size,
            params: TraversalParams::assault().with_max_cost(config.selection.max_path_cost),
        }
    }

    pub fn origin(&self) -> Cell {
        self.agent.position
    }

    pub fn find_path(&self, start: Cell, goal: Cell) -> Result<PathResult> {
        self.battlefield.find_path(start, goal, &self.params)
    }

    /// Path from the agent to `goal`
    pub fn path_to(&self, goal: Cell) -> Result<PathResult> {
        self.find_path(self.origin(), goal)
    }

    pub fn can_reach(&self, goal: Cell) -> bool {
        self.battlefield.can_reach(self.origin(), goal, &self.params)
    }

    pub fn trap_near(&self, cell: Cell) -> bool {
        risk::trap_nearby(self.battlefield, cell, self.config.risk.trap_radius)
    }

    pub fn path_trap_risk(&self, cells: &[Cell]) -> f32 {
        risk::path_trap_risk(
            self.battlefield,
            cells,
            self.config.risk.trap_radius,
            self.config.risk.path_trap_penalty,
        )
    }

    pub fn is_safe_cell(&self, cell: Cell) -> bool {
        risk::is_safe_cell(self.battlefield, self.hazard, cell, &self.config.risk)
    }
}
