//! Structure classification as resolved by the world-query collaborator

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, FactionId, StructureId};
use crate::world::agent::Weapon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    Wall,
    Door,
    /// Natural or constructed rock that can be mined through
    Mineable,
    Storage,
    /// Batteries and generators
    Power,
    Turret,
    Trap,
    Other,
}

impl StructureKind {
    /// Wall, door or mineable rock
    pub fn is_breakable_obstacle(&self) -> bool {
        matches!(self, StructureKind::Wall | StructureKind::Door | StructureKind::Mineable)
    }

    /// Counts towards wall thickness
    pub fn is_fortification(&self) -> bool {
        matches!(self, StructureKind::Wall | StructureKind::Mineable)
    }

    pub fn is_defensive(&self) -> bool {
        matches!(self, StructureKind::Turret | StructureKind::Trap)
    }

    pub fn blocks_movement(&self, pass_doors: bool) -> bool {
        match self {
            StructureKind::Wall
            | StructureKind::Mineable
            | StructureKind::Turret
            | StructureKind::Power => true,
            StructureKind::Door => !pass_doors,
            StructureKind::Storage | StructureKind::Trap | StructureKind::Other => false,
        }
    }

    pub fn blocks_sight(&self) -> bool {
        matches!(self, StructureKind::Wall | StructureKind::Door | StructureKind::Mineable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Defender,
    Faction(FactionId),
    Unowned,
}

/// Live turret status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurretState {
    pub weapon: Weapon,
    pub active: bool,
    /// Power net could power it right now
    pub can_power: bool,
    pub aiming: bool,
    pub has_ammo: bool,
    pub has_fuel: bool,
    /// Sealed behind closed or locked access
    pub access_closed: bool,
}

impl TurretState {
    pub fn new(weapon: Weapon) -> Self {
        Self {
            weapon,
            active: true,
            can_power: true,
            aiming: false,
            has_ammo: true,
            has_fuel: true,
            access_closed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub kind: StructureKind,
    pub position: Cell,
    pub owner: Owner,
    pub hit_points: f32,
    pub max_hit_points: f32,
    pub destroyed: bool,
    pub combat_dangerous: bool,
    pub turret: Option<TurretState>,
}

impl Structure {
    pub fn new(kind: StructureKind, position: Cell, owner: Owner) -> Self {
        Self {
            id: StructureId::new(),
            kind,
            position,
            owner,
            hit_points: 300.0,
            max_hit_points: 300.0,
            destroyed: false,
            combat_dangerous: false,
            turret: None,
        }
    }

    pub fn wall(position: Cell) -> Self {
        Self::new(StructureKind::Wall, position, Owner::Defender)
    }

    pub fn door(position: Cell) -> Self {
        Self::new(StructureKind::Door, position, Owner::Defender)
    }

    pub fn rock(position: Cell) -> Self {
        Self::new(StructureKind::Mineable, position, Owner::Unowned)
    }

    pub fn trap(position: Cell) -> Self {
        Self::new(StructureKind::Trap, position, Owner::Defender)
    }

    pub fn turret(position: Cell, weapon: Weapon) -> Self {
        let mut turret = Self::new(StructureKind::Turret, position, Owner::Defender);
        turret.combat_dangerous = true;
        turret.turret = Some(TurretState::new(weapon));
        turret
    }

    pub fn with_hit_points(mut self, hit_points: f32) -> Self {
        self.hit_points = hit_points;
        self
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hit_points <= 0.0 {
            return 1.0;
        }
        (self.hit_points / self.max_hit_points).clamp(0.0, 1.0)
    }

    pub fn owned_by_defenders(&self) -> bool {
        self.owner == Owner::Defender
    }

    pub fn is_standing(&self) -> bool {
        !self.destroyed
    }
}
