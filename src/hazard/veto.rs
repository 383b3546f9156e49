//! Melee veto: the hazard field's say in whether a charge is worth it

use crate::core::config::HazardConfig;
use crate::core::types::Cell;
use crate::hazard::field::HazardField;

/// True when a melee attack on `target_cell` should be called off
///
/// Unreachable targets are always vetoed. Otherwise the charge is rejected
/// when it would take the agent out of a clean cell into a hazardous one
/// more than `melee_veto_distance` cells away.
pub fn veto_melee(
    field: &HazardField,
    agent_cell: Cell,
    target_cell: Cell,
    reachable: bool,
    config: &HazardConfig,
) -> bool {
    if !reachable {
        return true;
    }

    agent_cell.distance(target_cell) > config.melee_veto_distance
        && field.intensity_at(agent_cell) == 0
        && field.intensity_at(target_cell) > 0
}
