//! Killzone - per-agent tactical decisions for raids on fortified bases
//!
//! A `MapSession` owns the shared state of one map (hazard field, path-risk
//! cache, breach escalation) and turns an agent snapshot plus a read-only
//! view of the battlefield into one job recommendation per call.

pub mod cache;
pub mod core;
pub mod hazard;
pub mod session;
pub mod spatial;
pub mod tactics;
pub mod world;

pub use crate::core::{load_config, Cell, EngineConfig, EngineError, Result};
pub use session::MapSession;
pub use tactics::{Decision, Job, JobKind, JobTarget};
pub use world::{Battlefield, GridWorld};
