//! Collaborator contracts the engine reads the world through
//!
//! Terrain, path search and world state are owned by the host. The engine
//! only ever holds a borrowed `&dyn Battlefield` for the length of one call.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{AgentId, Cell, FactionId, GroupId, StructureId, Tick};
use crate::tactics::job::{JobKind, JobTarget};
use crate::world::agent::AgentState;
use crate::world::structure::{Structure, StructureKind};

/// Traversal settings for a path request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraversalParams {
    /// Route through doors as if they were open
    pub pass_doors: bool,
    /// Give up once the accumulated cost exceeds this
    pub max_cost: Option<f32>,
}

impl TraversalParams {
    /// Hostile assault movement: doors are passable, no cost cap until one is set
    pub fn assault() -> Self {
        Self {
            pass_doors: true,
            max_cost: None,
        }
    }

    pub fn with_max_cost(mut self, max_cost: f32) -> Self {
        self.max_cost = Some(max_cost);
        self
    }
}

impl Default for TraversalParams {
    fn default() -> Self {
        Self::assault()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub found: bool,
    pub cost: f32,
    /// Start to end, both inclusive. Empty when not found
    pub cells: Vec<Cell>,
}

impl PathResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            cost: 0.0,
            cells: Vec::new(),
        }
    }

    pub fn last_cell(&self) -> Option<Cell> {
        self.cells.last().copied()
    }
}

/// A fallen combatant lying in the open
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Casualty {
    pub position: Cell,
    pub faction: FactionId,
    /// Ticks since death
    pub age_ticks: Tick,
}

/// Something an attacker wants to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Agent(AgentId),
    Structure(StructureId),
}

impl TargetRef {
    pub fn position<W: WorldQuery + ?Sized>(&self, world: &W) -> Option<Cell> {
        match self {
            TargetRef::Agent(id) => world.agent(*id).map(|a| a.position),
            TargetRef::Structure(id) => world.structure(*id).map(|s| s.position),
        }
    }

    /// Still present and able to fight back (downed agents and destroyed structures are not)
    pub fn is_active<W: WorldQuery + ?Sized>(&self, world: &W) -> bool {
        match self {
            TargetRef::Agent(id) => world.agent(*id).map_or(false, |a| !a.downed),
            TargetRef::Structure(id) => world.structure(*id).map_or(false, |s| !s.destroyed),
        }
    }

    pub fn as_job_target(&self) -> JobTarget {
        match self {
            TargetRef::Agent(id) => JobTarget::Agent(*id),
            TargetRef::Structure(id) => JobTarget::Structure(*id),
        }
    }
}

/// Terrain and path search
pub trait TerrainQuery {
    fn in_bounds(&self, cell: Cell) -> bool;

    fn walkable(&self, cell: Cell) -> bool;

    /// An agent can stand here
    fn standable(&self, cell: Cell) -> bool {
        self.walkable(cell)
    }

    fn has_line_of_sight(&self, from: Cell, to: Cell) -> bool;

    fn provides_cover(&self, cell: Cell) -> bool;

    /// Both cells lie within `max_region_hops` connected regions of each other
    fn same_region(&self, a: Cell, b: Cell, max_region_hops: u32) -> bool;

    /// Path search. The goal is reached by standing on it or, when it is
    /// not passable, by touching it from a neighboring cell.
    ///
    /// Fails with `CollaboratorUnavailable` when no search service exists.
    fn find_path(&self, start: Cell, goal: Cell, params: &TraversalParams) -> Result<PathResult>;

    fn can_reach(&self, start: Cell, goal: Cell, params: &TraversalParams) -> bool {
        matches!(self.find_path(start, goal, params), Ok(path) if path.found)
    }
}

/// World state: agents, structures, casualties and reservations
pub trait WorldQuery {
    fn now(&self) -> Tick;

    fn agents(&self) -> &[AgentState];

    fn structures(&self) -> &[Structure];

    fn casualties(&self) -> &[Casualty];

    fn agent(&self, id: AgentId) -> Option<&AgentState> {
        self.agents().iter().find(|a| a.id == id)
    }

    fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures().iter().find(|s| s.id == id)
    }

    /// Standing structures on `cell`
    fn structures_at(&self, cell: Cell) -> Vec<&Structure> {
        self.structures()
            .iter()
            .filter(|s| s.position == cell && !s.destroyed)
            .collect()
    }

    /// The blocking structure on `cell`, if any
    fn structure_at(&self, cell: Cell) -> Option<&Structure> {
        self.structures_at(cell)
            .into_iter()
            .find(|s| s.kind.blocks_movement(false))
    }

    fn is_trap_at(&self, cell: Cell) -> bool {
        self.structures_at(cell)
            .iter()
            .any(|s| s.kind == StructureKind::Trap)
    }

    /// Another agent is already working on this structure
    fn reserved_by_other(&self, structure: StructureId, agent: AgentId) -> bool {
        self.agents().iter().any(|other| {
            other.id != agent
                && !other.downed
                && other.current_job.as_ref().map_or(false, |job| {
                    matches!(job.kind, JobKind::Mine | JobKind::AttackMelee)
                        && job.target_a == JobTarget::Structure(structure)
                })
        })
    }

    /// An agent from outside `group` is already attacking, mining or carrying off `target`
    fn claimed_by_other_group(&self, target: TargetRef, group: Option<GroupId>, owner: AgentId) -> bool {
        let wanted = target.as_job_target();
        self.agents().iter().any(|other| {
            other.id != owner
                && !other.downed
                && other.group != group
                && other.current_job.as_ref().map_or(false, |job| {
                    matches!(job.kind, JobKind::AttackMelee | JobKind::Mine | JobKind::Kidnap)
                        && job.target_a == wanted
                })
        })
    }

    /// Another agent is already carrying this downed agent off
    fn kidnap_reserved_by_other(&self, target: AgentId, agent: AgentId) -> bool {
        self.agents().iter().any(|other| {
            other.id != agent
                && other.current_job.as_ref().map_or(false, |job| {
                    job.kind == JobKind::Kidnap && job.target_a == JobTarget::Agent(target)
                })
        })
    }
}

/// Everything the engine needs from the host in one object
pub trait Battlefield: TerrainQuery + WorldQuery {}

impl<T: TerrainQuery + WorldQuery + ?Sized> Battlefield for T {}
