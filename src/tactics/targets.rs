//! High-value targets and what they are worth

use serde::{Deserialize, Serialize};

use crate::core::types::Cell;
use crate::world::query::{TargetRef, WorldQuery};
use crate::world::structure::{Structure, StructureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Defender { downed: bool },
    Storage,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighValueTarget {
    pub target: TargetRef,
    pub kind: TargetKind,
    pub position: Cell,
    pub value: f32,
}

impl HighValueTarget {
    pub fn label(&self) -> String {
        match self.kind {
            TargetKind::Defender { downed: true } => format!("downed defender at {}", self.position),
            TargetKind::Defender { downed: false } => format!("defender at {}", self.position),
            TargetKind::Storage => format!("storage at {}", self.position),
            TargetKind::Power => format!("power at {}", self.position),
        }
    }
}

/// Value of a target kind; downed defenders are worth the most
pub fn target_value(kind: TargetKind) -> f32 {
    match kind {
        TargetKind::Defender { downed } => {
            if downed {
                7.0
            } else {
                2.0
            }
        }
        TargetKind::Storage => 2.0,
        TargetKind::Power => 1.5,
    }
}

fn structure_kind(structure: &Structure) -> Option<TargetKind> {
    if structure.destroyed || !structure.owned_by_defenders() {
        return None;
    }
    match structure.kind {
        StructureKind::Storage => Some(TargetKind::Storage),
        StructureKind::Power => Some(TargetKind::Power),
        _ => None,
    }
}

/// Defender personnel plus their storage and power structures
pub fn high_value_targets<W: WorldQuery + ?Sized>(world: &W) -> Vec<HighValueTarget> {
    let mut targets = Vec::new();

    for agent in world.agents() {
        if !agent.is_defender() || !agent.humanlike {
            continue;
        }
        let kind = TargetKind::Defender {
            downed: agent.downed,
        };
        targets.push(HighValueTarget {
            target: TargetRef::Agent(agent.id),
            kind,
            position: agent.position,
            value: target_value(kind),
        });
    }

    for structure in world.structures() {
        if let Some(kind) = structure_kind(structure) {
            targets.push(HighValueTarget {
                target: TargetRef::Structure(structure.id),
                kind,
                position: structure.position,
                value: target_value(kind),
            });
        }
    }

    targets
}

/// Things worth attacking when nothing better turned up
///
/// Standing defenders and every defender structure that still stands.
pub fn attack_targets<W: WorldQuery + ?Sized>(world: &W) -> Vec<(TargetRef, Cell)> {
    let agents = world
        .agents()
        .iter()
        .filter(|a| a.is_defender() && !a.downed)
        .map(|a| (TargetRef::Agent(a.id), a.position));
    let structures = world
        .structures()
        .iter()
        .filter(|s| !s.destroyed && s.owned_by_defenders() && !s.kind.is_breakable_obstacle())
        .map(|s| (TargetRef::Structure(s.id), s.position));
    agents.chain(structures).collect()
}
