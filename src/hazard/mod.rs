//! Shared danger field rebuilt from the defenders' live threats

pub mod field;
pub mod sources;
pub mod veto;

pub use field::{HazardField, RebuildOutcome, MAX_INTENSITY};
pub use sources::{collect_threat_sources, ThreatSource};
pub use veto::veto_melee;
