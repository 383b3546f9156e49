//! Candidate generation, scoring and selection for one agent at a time

pub mod approach;
pub mod breach;
pub mod breaking;
pub mod candidate;
pub mod context;
pub mod engine;
pub mod formation;
pub mod job;
pub mod killzone;
pub mod obstacle;
pub mod risk;
pub mod targets;
pub mod wander;
pub mod weighting;

pub use breach::{safe_for_ranged_cast, BreachState, RangedCast};
pub use candidate::{Candidate, CandidatePool};
pub use context::DecisionContext;
pub use formation::{flank_positions, nearest_safe_cell, role_of, Role};
pub use job::{Decision, Job, JobKind, JobTarget, Urgency};
pub use targets::{HighValueTarget, TargetKind};
pub use weighting::trait_weight;
