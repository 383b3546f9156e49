//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use uuid::Uuid;

/// Simulation tick counter (60 ticks per simulated second)
pub type Tick = u64;

/// Ticks in one simulated second
pub const TICKS_PER_SECOND: Tick = 60;

/// Unique identifier for agents (raiders, defenders, anything that moves)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for structures (walls, doors, turrets, traps, storage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(pub Uuid);

impl StructureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StructureId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier for an agent group that shares one assault plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// Faction identifier. Faction 0 is reserved for the defending side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    pub const DEFENDERS: FactionId = FactionId(0);

    pub fn is_defender(&self) -> bool {
        *self == Self::DEFENDERS
    }

    /// Every non-defender faction is hostile to the defenders and vice versa
    pub fn hostile_to(&self, other: FactionId) -> bool {
        self.is_defender() != other.is_defender()
    }
}

/// Square grid cell. `z` is the second horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance
    pub fn distance(&self, other: Cell) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }

    pub fn distance_squared(&self, other: Cell) -> i32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Component-wise sign, used for "one step towards" arithmetic
    pub fn signum(&self) -> Cell {
        Cell::new(self.x.signum(), self.z.signum())
    }

    pub fn scale(&self, factor: i32) -> Cell {
        Cell::new(self.x * factor, self.z * factor)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

impl Add for Cell {
    type Output = Cell;

    fn add(self, rhs: Cell) -> Cell {
        Cell::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Cell {
    type Output = Cell;

    fn sub(self, rhs: Cell) -> Cell {
        Cell::new(self.x - rhs.x, self.z - rhs.z)
    }
}
