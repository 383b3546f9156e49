//! Battlefield snapshots and the collaborator contracts the engine queries

pub mod agent;
pub mod grid_world;
pub mod query;
pub mod structure;

pub use agent::{AgentState, Disposition, Skills, Weapon};
pub use grid_world::GridWorld;
pub use query::{
    Battlefield, Casualty, PathResult, TargetRef, TerrainQuery, TraversalParams, WorldQuery,
};
pub use structure::{Owner, Structure, StructureKind, TurretState};
