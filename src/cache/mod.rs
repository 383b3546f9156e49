//! Path-risk cache shared by every agent on a map

pub mod path_risk;

pub use path_risk::{CachedPathEntry, PathRiskCache};
