//! Risk scans over cells and routes

use crate::core::config::{LateralConfig, RiskConfig};
use crate::core::types::Cell;
use crate::hazard::HazardField;
use crate::spatial::{adjacent_8, square_neighborhood};
use crate::world::query::{Battlefield, WorldQuery};
use crate::world::structure::StructureKind;

/// Any trap within the square of half-width `radius` around `cell`
pub fn trap_nearby<W: WorldQuery + ?Sized>(world: &W, cell: Cell, radius: i32) -> bool {
    square_neighborhood(cell, radius).any(|c| world.is_trap_at(c))
}

/// `penalty` for every route cell with a trap next to it
pub fn path_trap_risk<W: WorldQuery + ?Sized>(
    world: &W,
    cells: &[Cell],
    radius: i32,
    penalty: f32,
) -> f32 {
    cells
        .iter()
        .filter(|c| trap_nearby(world, **c, radius))
        .count() as f32
        * penalty
}

/// A turret or trap stands on `cell`
pub fn defensive_structure_at<W: WorldQuery + ?Sized>(world: &W, cell: Cell) -> bool {
    world
        .structures_at(cell)
        .iter()
        .any(|s| s.kind.is_defensive())
}

/// Risk from defensive structures standing on the cell itself
pub fn structure_risk<W: WorldQuery + ?Sized>(world: &W, cell: Cell, config: &RiskConfig) -> f32 {
    let mut risk = 0.0;
    for structure in world.structures_at(cell) {
        match structure.kind {
            StructureKind::Turret if structure.owned_by_defenders() => {
                let covers = structure.turret.map_or(false, |t| {
                    t.weapon.range > 0.0 && structure.position.distance(cell) <= t.weapon.range
                });
                if covers {
                    risk += config.turret_coverage_risk;
                }
            }
            StructureKind::Trap => risk += config.trap_structure_risk,
            _ => {}
        }
    }
    risk
}

/// Walls, doors and rock on a cell
pub fn obstruction_count<W: WorldQuery + ?Sized>(world: &W, cell: Cell) -> usize {
    world
        .structures_at(cell)
        .iter()
        .filter(|s| s.kind.is_breakable_obstacle())
        .count()
}

/// Extra cost of chewing through thick or healthy fortifications
pub fn thickness_penalty<W: WorldQuery + ?Sized>(world: &W, route: &[Cell], config: &LateralConfig) -> f32 {
    let mut penalty = 0.0;
    for cell in route {
        let Some(structure) = world.structure_at(*cell) else {
            continue;
        };
        if !structure.kind.is_fortification() {
            continue;
        }
        let adjacent = adjacent_8(*cell)
            .iter()
            .filter(|c| {
                world
                    .structure_at(**c)
                    .map_or(false, |s| s.kind.is_fortification())
            })
            .count();
        penalty += structure.hp_ratio() * config.thickness_hp_weight
            + adjacent as f32 * config.thickness_adjacent_weight;
    }
    penalty
}

/// Modeled fire from every armed defender that can see and reach `cell`
pub fn incoming_fire_risk<B: Battlefield + ?Sized>(battlefield: &B, cell: Cell, config: &RiskConfig) -> f32 {
    let mut risk = 0.0;
    for defender in battlefield.agents().iter().filter(|a| a.is_armed_defender()) {
        let Some(weapon) = defender.weapon else {
            continue;
        };
        if weapon.range <= 0.0 || defender.position.distance(cell) > weapon.range {
            continue;
        }
        if !battlefield.has_line_of_sight(defender.position, cell) {
            continue;
        }
        let mut danger = config.defender_fire_base + weapon.dps * config.defender_dps_weight;
        if battlefield.provides_cover(cell) {
            danger *= config.cover_factor;
        }
        risk += danger;
    }
    risk
}

/// Standable, no trap close by and below the hazard threshold
pub fn is_safe_cell<B: Battlefield + ?Sized>(
    battlefield: &B,
    hazard: &HazardField,
    cell: Cell,
    config: &RiskConfig,
) -> bool {
    battlefield.in_bounds(cell)
        && battlefield.standable(cell)
        && !trap_nearby(battlefield, cell, config.trap_radius)
        && hazard.intensity_at(cell) < config.hazard_safe_threshold
}

/// Some route cell has no line of sight to the target, so a wall really is in the way
pub fn wall_on_path_to_target<B: Battlefield + ?Sized>(battlefield: &B, route: &[Cell], target: Cell) -> bool {
    route
        .iter()
        .any(|c| battlefield.in_bounds(*c) && !battlefield.has_line_of_sight(*c, target))
}
