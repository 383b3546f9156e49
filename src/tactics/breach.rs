//! Per-group breach escalation and ranged breach-cast safety

use serde::{Deserialize, Serialize};

use crate::core::config::BreachConfig;
use crate::core::types::Cell;
use crate::spatial::points_collinear;
use crate::world::agent::Weapon;
use crate::world::query::TerrainQuery;
use crate::world::structure::{Structure, StructureKind};

/// How far a raiding group is willing to go to get through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachState {
    /// Natural rock counts as a breach target
    pub breach_mineables: bool,
    /// Ranged breachers keep their minimum distance from the target
    pub enforce_minimum_range: bool,
    pub done_reset: bool,
}

impl Default for BreachState {
    fn default() -> Self {
        Self {
            breach_mineables: false,
            enforce_minimum_range: true,
            done_reset: false,
        }
    }
}

impl BreachState {
    /// One step up the ladder; false once nothing is left to relax
    ///
    /// Order: drop the minimum range rule, reset once, then allow rock.
    pub fn escalate(&mut self) -> bool {
        if self.enforce_minimum_range {
            self.enforce_minimum_range = false;
            return true;
        }
        if !self.done_reset {
            self.done_reset = true;
            return true;
        }
        if !self.breach_mineables {
            self.breach_mineables = true;
            return true;
        }
        false
    }

    /// Whether this group would break `structure` to get through
    pub fn breach_blocks(&self, structure: &Structure) -> bool {
        if structure.destroyed || !structure.kind.is_breakable_obstacle() {
            return false;
        }
        structure.owned_by_defenders()
            || (self.breach_mineables && structure.kind == StructureKind::Mineable)
    }
}

/// A ranged breacher's firing position paired with what it shoots at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangedCast {
    pub firing_cell: Cell,
    pub target: Cell,
}

/// Whether `cell` is a sound firing position for breaching `target`
///
/// The minimum range scales with the weapon (range² / modifier). Long-range
/// weapons also refuse cells whose line to `target` runs through another
/// breacher's firing cell; explosives only care about breachers close by.
pub fn safe_for_ranged_cast<T: TerrainQuery + ?Sized>(
    terrain: &T,
    cell: Cell,
    target: Cell,
    weapon: &Weapon,
    state: &BreachState,
    allies_casting: &[RangedCast],
    config: &BreachConfig,
) -> bool {
    if !terrain.in_bounds(cell) || !terrain.walkable(cell) {
        return false;
    }

    if state.enforce_minimum_range {
        let modifier = if weapon.grenade {
            config.grenade_range_modifier
        } else if weapon.explosive {
            config.explosive_range_modifier
        } else {
            config.range_modifier
        };
        let min_squared = weapon.range * weapon.range / modifier;
        if (cell.distance_squared(target) as f32) <= min_squared {
            return false;
        }
    }

    if weapon.range > config.long_range_threshold {
        for cast in allies_casting {
            if cast.firing_cell == cell {
                continue;
            }
            let near = (cell.distance_squared(cast.firing_cell) as f32) < config.collinear_radius_squared;
            if (!weapon.explosive || near)
                && points_collinear(cell, cast.firing_cell, target, config.collinear_tolerance)
            {
                return false;
            }
        }
    }

    true
}
