//! In-memory square-grid battlefield
//!
//! A complete `Battlefield` used by the runner, the tests and the benches.
//! Hosts with their own map embed the engine through the query traits instead.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::{AgentId, Cell, StructureId, Tick};
use crate::spatial::{adjacent_8, points_on_line};
use crate::world::agent::AgentState;
use crate::world::query::{Casualty, PathResult, TerrainQuery, TraversalParams, WorldQuery};
use crate::world::structure::{Structure, StructureKind};

/// Cells spanned by one region hop
const REGION_SPAN: u32 = 12;

/// Extra traversal cost of forcing a door
const DOOR_COST: f32 = 4.0;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    cell: Cell,
    f_cost: f32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWorld {
    width: i32,
    height: i32,
    tick: Tick,
    impassable: AHashSet<Cell>,
    cover: AHashSet<Cell>,
    agents: Vec<AgentState>,
    structures: Vec<Structure>,
    casualties: Vec<Casualty>,
    path_search: bool,
}

impl GridWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            tick: 0,
            impassable: AHashSet::new(),
            cover: AHashSet::new(),
            agents: Vec::new(),
            structures: Vec::new(),
            casualties: Vec::new(),
            path_search: true,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    pub fn advance(&mut self, ticks: Tick) {
        self.tick += ticks;
        for casualty in &mut self.casualties {
            casualty.age_ticks += ticks;
        }
    }

    pub fn add_agent(&mut self, agent: AgentState) -> AgentId {
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    pub fn add_structure(&mut self, structure: Structure) -> StructureId {
        let id = structure.id;
        self.structures.push(structure);
        id
    }

    /// Wall segment along the rasterized line between two cells
    pub fn add_wall_line(&mut self, from: Cell, to: Cell) -> Vec<StructureId> {
        points_on_line(from, to)
            .into_iter()
            .map(|cell| self.add_structure(Structure::wall(cell)))
            .collect()
    }

    pub fn add_casualty(&mut self, casualty: Casualty) {
        self.casualties.push(casualty);
    }

    /// Natural rock or water that nothing can cross
    pub fn block_terrain(&mut self, cell: Cell) {
        self.impassable.insert(cell);
    }

    pub fn add_cover(&mut self, cell: Cell) {
        self.cover.insert(cell);
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentState> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == id)
    }

    pub fn destroy_structure(&mut self, id: StructureId) {
        if let Some(structure) = self.structure_mut(id) {
            structure.destroyed = true;
            structure.hit_points = 0.0;
        }
    }

    /// Simulates a host without a path search service
    pub fn disable_path_search(&mut self) {
        self.path_search = false;
    }

    /// Cells closed to movement and the door cells among the passable ones
    fn occupancy(&self, pass_doors: bool) -> (AHashSet<Cell>, AHashSet<Cell>) {
        let mut blocked = self.impassable.clone();
        let mut doors = AHashSet::new();
        for structure in self.structures.iter().filter(|s| !s.destroyed) {
            if structure.kind.blocks_movement(pass_doors) {
                blocked.insert(structure.position);
            } else if structure.kind == StructureKind::Door {
                doors.insert(structure.position);
            }
        }
        (blocked, doors)
    }

    fn blocks_sight_at(&self, cell: Cell) -> bool {
        self.impassable.contains(&cell)
            || self
                .structures
                .iter()
                .any(|s| !s.destroyed && s.position == cell && s.kind.blocks_sight())
    }
}

impl TerrainQuery for GridWorld {
    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
    }

    fn walkable(&self, cell: Cell) -> bool {
        self.in_bounds(cell)
            && !self.impassable.contains(&cell)
            && !self
                .structures
                .iter()
                .any(|s| !s.destroyed && s.position == cell && s.kind.blocks_movement(true))
    }

    fn standable(&self, cell: Cell) -> bool {
        self.walkable(cell)
            && !self
                .structures
                .iter()
                .any(|s| !s.destroyed && s.position == cell && s.kind == StructureKind::Door)
    }

    fn has_line_of_sight(&self, from: Cell, to: Cell) -> bool {
        let line = points_on_line(from, to);

        // Check all cells except start and end
        for cell in line.iter().skip(1).take(line.len().saturating_sub(2)) {
            if !self.in_bounds(*cell) || self.blocks_sight_at(*cell) {
                return false;
            }
        }

        true
    }

    fn provides_cover(&self, cell: Cell) -> bool {
        self.cover.contains(&cell)
    }

    fn same_region(&self, a: Cell, b: Cell, max_region_hops: u32) -> bool {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return false;
        }
        if a == b {
            return true;
        }

        let (blocked, _) = self.occupancy(false);
        let limit = max_region_hops.saturating_mul(REGION_SPAN);
        let mut seen = AHashSet::new();
        let mut frontier = VecDeque::new();
        seen.insert(a);
        frontier.push_back((a, 0u32));

        while let Some((cell, depth)) = frontier.pop_front() {
            if depth >= limit {
                continue;
            }
            for next in adjacent_8(cell) {
                if next == b {
                    return true;
                }
                if !self.in_bounds(next) || blocked.contains(&next) || !seen.insert(next) {
                    continue;
                }
                frontier.push_back((next, depth + 1));
            }
        }

        false
    }

    fn find_path(&self, start: Cell, goal: Cell, params: &TraversalParams) -> Result<PathResult> {
        if !self.path_search {
            return Err(EngineError::CollaboratorUnavailable(
                "path search service".to_string(),
            ));
        }
        if !self.in_bounds(start) || !self.in_bounds(goal) {
            return Ok(PathResult::not_found());
        }

        let (blocked, doors) = self.occupancy(params.pass_doors);
        let goal_passable = !blocked.contains(&goal);
        let reached = |cell: Cell| {
            cell == goal || (!goal_passable && cell.distance_squared(goal) <= 2)
        };
        let heuristic = |cell: Cell| {
            let d = cell.distance(goal);
            if goal_passable {
                d
            } else {
                (d - 1.5).max(0.0)
            }
        };

        if reached(start) {
            return Ok(PathResult {
                found: true,
                cost: 0.0,
                cells: vec![start],
            });
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
        let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();

        g_scores.insert(start, 0.0);
        open_set.push(PathNode {
            cell: start,
            f_cost: heuristic(start),
        });

        while let Some(current) = open_set.pop() {
            let current_g = *g_scores.get(&current.cell).unwrap_or(&f32::INFINITY);

            if reached(current.cell) {
                return Ok(PathResult {
                    found: true,
                    cost: current_g,
                    cells: reconstruct_path(&came_from, current.cell),
                });
            }

            for neighbor in adjacent_8(current.cell) {
                if !self.in_bounds(neighbor) || blocked.contains(&neighbor) {
                    continue;
                }

                let step = neighbor - current.cell;
                let diagonal = step.x != 0 && step.z != 0;
                // No cutting corners past blocked cells
                if diagonal
                    && (blocked.contains(&Cell::new(current.cell.x + step.x, current.cell.z))
                        || blocked.contains(&Cell::new(current.cell.x, current.cell.z + step.z)))
                {
                    continue;
                }

                let mut move_cost = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
                if doors.contains(&neighbor) {
                    move_cost += DOOR_COST;
                }

                let tentative_g = current_g + move_cost;
                if params.max_cost.map_or(false, |max| tentative_g > max) {
                    continue;
                }

                let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);
                if tentative_g < neighbor_g {
                    came_from.insert(neighbor, current.cell);
                    g_scores.insert(neighbor, tentative_g);
                    open_set.push(PathNode {
                        cell: neighbor,
                        f_cost: tentative_g + heuristic(neighbor),
                    });
                }
            }
        }

        Ok(PathResult::not_found())
    }
}

impl WorldQuery for GridWorld {
    fn now(&self) -> Tick {
        self.tick
    }

    fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    fn structures(&self) -> &[Structure] {
        &self.structures
    }

    fn casualties(&self) -> &[Casualty] {
        &self.casualties
    }
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &AHashMap<Cell, Cell>, mut current: Cell) -> Vec<Cell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assault() -> TraversalParams {
        TraversalParams::assault()
    }

    #[test]
    fn test_pathfind_straight_line() {
        let world = GridWorld::new(10, 10);
        let start = Cell::new(0, 0);
        let goal = Cell::new(5, 0);

        let path = world.find_path(start, goal, &assault()).unwrap();

        assert!(path.found);
        assert_eq!(path.cells.first(), Some(&start));
        assert_eq!(path.cells.last(), Some(&goal));
        assert!((path.cost - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_pathfind_around_obstacle() {
        let mut world = GridWorld::new(10, 10);
        world.block_terrain(Cell::new(2, 0));
        world.block_terrain(Cell::new(2, 1));

        let path = world
            .find_path(Cell::new(0, 0), Cell::new(5, 0), &assault())
            .unwrap();

        assert!(path.found);
        assert!(!path.cells.contains(&Cell::new(2, 0)));
        assert!(!path.cells.contains(&Cell::new(2, 1)));
    }

    #[test]
    fn test_pathfind_no_path() {
        let mut world = GridWorld::new(10, 10);
        world.add_wall_line(Cell::new(5, 0), Cell::new(5, 9));

        let path = world
            .find_path(Cell::new(0, 5), Cell::new(9, 5), &assault())
            .unwrap();
        assert!(!path.found);
        assert!(path.cells.is_empty());
    }

    #[test]
    fn test_blocked_goal_is_reached_by_touch() {
        let mut world = GridWorld::new(10, 10);
        world.add_structure(Structure::wall(Cell::new(5, 5)));

        let path = world
            .find_path(Cell::new(0, 5), Cell::new(5, 5), &assault())
            .unwrap();
        assert!(path.found);
        let last = path.last_cell().unwrap();
        assert!(last.distance_squared(Cell::new(5, 5)) <= 2);
        assert_ne!(last, Cell::new(5, 5));
    }

    #[test]
    fn test_doors_open_only_for_assault() {
        let mut world = GridWorld::new(10, 10);
        world.add_wall_line(Cell::new(5, 0), Cell::new(5, 9));
        world.add_structure(Structure::door(Cell::new(5, 5)));
        // The wall under the door does not exist in a real map
        let wall_under_door = world
            .structures()
            .iter()
            .find(|s| s.position == Cell::new(5, 5) && s.kind == StructureKind::Wall)
            .map(|s| s.id)
            .unwrap();
        world.destroy_structure(wall_under_door);

        let through = world
            .find_path(Cell::new(0, 5), Cell::new(9, 5), &assault())
            .unwrap();
        assert!(through.found);
        assert!(through.cells.contains(&Cell::new(5, 5)));

        let closed = TraversalParams {
            pass_doors: false,
            max_cost: None,
        };
        assert!(!world.can_reach(Cell::new(0, 5), Cell::new(9, 5), &closed));
        assert!(!world.same_region(Cell::new(0, 5), Cell::new(9, 5), 9));
    }

    #[test]
    fn test_max_cost_limits_search() {
        let world = GridWorld::new(30, 3);
        let params = TraversalParams {
            pass_doors: true,
            max_cost: Some(5.0),
        };
        assert!(!world.can_reach(Cell::new(0, 1), Cell::new(20, 1), &params));
        assert!(world.can_reach(Cell::new(0, 1), Cell::new(4, 1), &params));
    }

    #[test]
    fn test_line_of_sight_blocked_by_wall() {
        let mut world = GridWorld::new(10, 10);
        assert!(world.has_line_of_sight(Cell::new(0, 0), Cell::new(9, 0)));
        world.add_structure(Structure::wall(Cell::new(4, 0)));
        assert!(!world.has_line_of_sight(Cell::new(0, 0), Cell::new(9, 0)));
        // Endpoints never block
        assert!(world.has_line_of_sight(Cell::new(0, 0), Cell::new(4, 0)));
    }

    #[test]
    fn test_disabled_path_search_errors() {
        let mut world = GridWorld::new(5, 5);
        world.disable_path_search();
        let result = world.find_path(Cell::new(0, 0), Cell::new(4, 4), &assault());
        assert!(matches!(result, Err(EngineError::CollaboratorUnavailable(_))));
        assert!(!world.can_reach(Cell::new(0, 0), Cell::new(4, 4), &assault()));
    }

    #[test]
    fn test_same_region_respects_hops() {
        let world = GridWorld::new(100, 3);
        assert!(world.same_region(Cell::new(0, 1), Cell::new(10, 1), 1));
        assert!(!world.same_region(Cell::new(0, 1), Cell::new(50, 1), 1));
        assert!(world.same_region(Cell::new(0, 1), Cell::new(50, 1), 9));
    }

    #[test]
    fn test_advance_ages_casualties() {
        let mut world = GridWorld::new(5, 5);
        world.add_casualty(Casualty {
            position: Cell::new(1, 1),
            faction: crate::core::types::FactionId(3),
            age_ticks: 10,
        });
        world.advance(50);
        assert_eq!(world.now(), 50);
        assert_eq!(world.casualties()[0].age_ticks, 60);
    }
}
