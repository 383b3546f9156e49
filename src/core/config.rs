//! Engine configuration with documented constants
//!
//! Every threshold, weight and radius the engine uses lives here. Most of the
//! scoring numbers were tuned empirically against real raids; several skip
//! conditions overlap on purpose and are kept as separate named fields so they
//! can be tuned one at a time.
//!
//! Loaded from TOML; every section falls back to its defaults when omitted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::core::types::Tick;

/// Hazard field rebuild and threat-source weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Minimum ticks between two rebuilds (300 ticks = 5 simulated seconds)
    pub rebuild_cooldown_ticks: Tick,
    /// Casualties older than this stop contributing
    pub casualty_max_age_ticks: Tick,
    /// Weight of a fresh casualty; decays linearly to zero at max age
    pub casualty_weight: u32,
    /// Intensity added to each cell on a standing threat's sightline
    pub los_cost: u32,
    /// Radius of the blob printed around casualties and melee guards
    pub blob_radius: f32,
    /// Melee targets further than this are vetoed when they stand in danger
    pub melee_veto_distance: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            rebuild_cooldown_ticks: 300,
            casualty_max_age_ticks: 1800,
            casualty_weight: 1000,
            los_cost: 30,
            blob_radius: 1.0,
            melee_veto_distance: 3.0,
        }
    }
}

/// Trap and defensive-structure risk accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Half-width of the trap neighborhood scan (1 = 3x3)
    pub trap_radius: i32,
    /// Risk per trapped cell on a real path
    pub path_trap_penalty: f32,
    /// Risk per trapped cell on a rasterized lateral route
    pub route_trap_penalty: f32,
    /// Risk per trapped cell on the killzone line
    pub killzone_trap_penalty: f32,
    /// Direct approach is only accepted below this path trap risk
    pub max_trap_risk: f32,
    /// Breach targets reached through more trap risk than this are dropped
    pub max_obstacle_path_trap_risk: f32,
    /// Sap candidates reached through more trap risk than this are dropped
    pub max_sap_path_trap_risk: f32,
    /// Radius scanned for turrets and traps around each route cell
    pub defense_scan_radius: f32,
    /// Risk for a cell inside a defender turret's weapon range
    pub turret_coverage_risk: f32,
    /// Risk for a trap sitting on the cell itself
    pub trap_structure_risk: f32,
    /// Cells at or above this hazard intensity are never "safe"
    pub hazard_safe_threshold: u8,
    /// Incoming-fire risk per defender covering a cell
    pub defender_fire_base: f32,
    /// Extra incoming-fire risk per point of defender weapon DPS
    pub defender_dps_weight: f32,
    /// Multiplier applied to incoming fire when the cell offers cover
    pub cover_factor: f32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            trap_radius: 1,
            path_trap_penalty: 100.0,
            route_trap_penalty: 40.0,
            killzone_trap_penalty: 10.0,
            max_trap_risk: 50.0,
            max_obstacle_path_trap_risk: 40.0,
            max_sap_path_trap_risk: 80.0,
            defense_scan_radius: 3.0,
            turret_coverage_risk: 4.0,
            trap_structure_risk: 3.0,
            hazard_safe_threshold: 1,
            defender_fire_base: 1.5,
            defender_dps_weight: 0.5,
            cover_factor: 0.5,
        }
    }
}

/// Lateral route scoring
///
/// The `skip_*` fields are the discard rules. They overlap (a route with trap
/// risk 90 trips three of them); that is how they were tuned, so they are
/// evaluated in order and never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralConfig {
    /// Sideways jog of the intermediate point, 0 = straight line
    pub lateral_offsets: Vec<i32>,
    pub base_score: f32,
    /// Added to the base when a lone unit faces an obstruction
    pub lone_breacher_bonus: f32,
    /// Added when the route is unobstructed and risk free
    pub clear_route_bonus: f32,
    /// Both trap and defense risk below this count as "clear"
    pub clear_route_threshold: f32,
    /// Trap risk above this cuts the base score
    pub trapped_base_threshold: f32,
    pub trapped_base_cut: f32,
    /// Trap risk above this cuts the final score
    pub trapped_score_threshold: f32,
    pub trapped_score_cut: f32,
    /// Route distance divided by this becomes time cost
    pub distance_divisor: f32,
    /// Time cost per obstructing cell
    pub wall_time_cost: f32,
    /// Obstruction penalty per obstructing cell
    pub wall_weight: f32,
    /// Thickness penalty per unit of remaining hit-point ratio
    pub thickness_hp_weight: f32,
    /// Thickness penalty per fortified neighbor of an obstructing cell
    pub thickness_adjacent_weight: f32,
    pub defense_penalty: f32,
    /// Defense risk above this adds `defense_penalty`
    pub defense_penalty_threshold: f32,
    /// Added when the group has more than one unit
    pub group_bonus: f32,
    /// Subtracted for groups facing an obstruction
    pub group_wall_penalty: f32,
    /// Added when the chosen breach target is a door
    pub door_route_bonus: f32,
    pub alternate_path_base: f32,
    pub path_length_divisor: f32,
    pub sap_base: f32,
    pub sap_distance_divisor: f32,
    pub sap_hp_divisor: f32,
    pub skip_trap_risk: f32,
    pub skip_paired_trap_risk: f32,
    pub skip_paired_defense_risk: f32,
    pub skip_obstructed_trap_risk: f32,
    pub skip_trap_ceiling: f32,
    pub skip_defense_ceiling: f32,
    pub late_skip_trap_risk: f32,
    pub late_skip_paired_trap_risk: f32,
}

impl Default for LateralConfig {
    fn default() -> Self {
        Self {
            lateral_offsets: vec![0, 2, -2, 4, -4],
            base_score: 2.0,
            lone_breacher_bonus: 20.0,
            clear_route_bonus: 35.0,
            clear_route_threshold: 1.0,
            trapped_base_threshold: 2.0,
            trapped_base_cut: 50.0,
            trapped_score_threshold: 3.0,
            trapped_score_cut: 75.0,
            distance_divisor: 30.0,
            wall_time_cost: 2.5,
            wall_weight: 20.0,
            thickness_hp_weight: 0.01,
            thickness_adjacent_weight: 4.0,
            defense_penalty: 40.0,
            defense_penalty_threshold: 1.5,
            group_bonus: 2.0,
            group_wall_penalty: 10.0,
            door_route_bonus: 50.0,
            alternate_path_base: 150.0,
            path_length_divisor: 15.0,
            sap_base: 15.0,
            sap_distance_divisor: 6.0,
            sap_hp_divisor: 15.0,
            skip_trap_risk: 80.0,
            skip_paired_trap_risk: 30.0,
            skip_paired_defense_risk: 5.0,
            skip_obstructed_trap_risk: 10.0,
            skip_trap_ceiling: 100.0,
            skip_defense_ceiling: 10.0,
            late_skip_trap_risk: 50.0,
            late_skip_paired_trap_risk: 20.0,
        }
    }
}

/// Breach target selection along a route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub door_bonus: f32,
    /// Scaled by missing hit-point ratio, so weaker obstacles win
    pub weakness_bonus: f32,
    pub trap_adjacent_penalty: f32,
    /// Penalty when the cell right behind the obstacle is trapped
    pub trap_behind_penalty: f32,
    /// Divided by (distance to nearest defender + 1)
    pub defender_proximity_bonus: f32,
    /// Another unit of the same faction is already breaking it
    pub focus_fire_bonus: f32,
    /// It is the agent's current target
    pub hysteresis_bonus: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            door_bonus: 100.0,
            weakness_bonus: 50.0,
            trap_adjacent_penalty: 300.0,
            trap_behind_penalty: 500.0,
            defender_proximity_bonus: 10.0,
            focus_fire_bonus: 20.0,
            hysteresis_bonus: 20.0,
        }
    }
}

/// Opportunistic structure breaking and killzone traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakingConfig {
    pub structure_threat: f32,
    pub mineable_threat: f32,
    pub structure_time_cost: f32,
    pub mineable_time_cost: f32,
    pub path_cost_divisor: f32,
    /// Trap risk added when the structure itself sits in a trapped 3x3
    pub structure_trap_penalty: f32,
    pub expiry_ticks: u32,
    pub killzone_base: f32,
    pub killzone_distance_divisor: f32,
}

impl Default for BreakingConfig {
    fn default() -> Self {
        Self {
            structure_threat: 1.5,
            mineable_threat: 0.5,
            structure_time_cost: 1.0,
            mineable_time_cost: 2.0,
            path_cost_divisor: 35.0,
            structure_trap_penalty: 50.0,
            expiry_ticks: 120,
            killzone_base: 2.0,
            killzone_distance_divisor: 30.0,
        }
    }
}

/// Role and formation heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Armor rating above which an agent counts as front-line
    pub front_line_armor: f32,
    pub advance_radius: f32,
    pub advance_score: f32,
    pub fallback_score: f32,
    /// Search radius for the front-line ally a ranged agent falls back behind
    pub ally_radius: f32,
    /// Allies within this radius form a focus-fire group
    pub group_radius: f32,
    pub group_min_size: usize,
    pub focus_fire_score: f32,
    /// Health fraction below which the bait candidate appears
    pub bait_health: f32,
    pub bait_radius: f32,
    pub bait_score: f32,
    pub flank_distance: i32,
    pub max_flankers: usize,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            front_line_armor: 0.3,
            advance_radius: 5.0,
            advance_score: 2.5,
            fallback_score: 2.0,
            ally_radius: 20.0,
            group_radius: 15.0,
            group_min_size: 2,
            focus_fire_score: 4.0,
            bait_health: 0.5,
            bait_radius: 8.0,
            bait_score: 1.0,
            flank_distance: 5,
            max_flankers: 4,
        }
    }
}

/// Candidate weighting, selection and fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub direct_base: f32,
    /// Candidates at or below this are discarded
    pub score_floor: f32,
    pub duty_focus_score: f32,
    /// Weight added per shooting/melee skill level
    pub skill_weight: f32,
    pub timid_factor: f32,
    /// Squared distance under which the duty focus counts as reached
    pub arrival_distance_squared: i32,
    /// Region hops allowed for "same reachability region" checks
    pub region_hops: u32,
    pub wander_radius: f32,
    pub flee_radius: f32,
    /// Cache size above which no new targets are discovered
    pub max_sappers: usize,
    /// Followers closer than this to the breacher stay put
    pub follow_min_distance: f32,
    /// Path searches give up past this accumulated cost
    pub max_path_cost: f32,
    pub expiry_min: u32,
    pub expiry_max: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            direct_base: 200.0,
            score_floor: -50.0,
            duty_focus_score: 0.5,
            skill_weight: 0.1,
            timid_factor: 0.7,
            arrival_distance_squared: 100,
            region_hops: 9,
            wander_radius: 8.0,
            flee_radius: 10.0,
            max_sappers: 10,
            follow_min_distance: 10.0,
            max_path_cost: 400.0,
            expiry_min: 200,
            expiry_max: 400,
        }
    }
}

/// Ranged breach-cast placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreachConfig {
    /// range² / modifier is the minimum squared distance to the target
    pub range_modifier: f32,
    pub explosive_range_modifier: f32,
    pub grenade_range_modifier: f32,
    /// Only weapons longer than this check for collinear allies
    pub long_range_threshold: f32,
    pub collinear_tolerance: f32,
    pub collinear_radius_squared: f32,
}

impl Default for BreachConfig {
    fn default() -> Self {
        Self {
            range_modifier: 10.0,
            explosive_range_modifier: 5.0,
            grenade_range_modifier: 1.5,
            long_range_threshold: 30.0,
            collinear_tolerance: 1.0,
            collinear_radius_squared: 100.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hazard: HazardConfig,
    pub risk: RiskConfig,
    pub lateral: LateralConfig,
    pub obstacle: ObstacleConfig,
    pub breaking: BreakingConfig,
    pub formation: FormationConfig,
    pub selection: SelectionConfig,
    pub breach: BreachConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing sections and fields keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.risk.trap_radius < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "trap_radius ({}) must not be negative",
                self.risk.trap_radius
            )));
        }

        if self.selection.expiry_min > self.selection.expiry_max {
            return Err(EngineError::InvalidConfig(format!(
                "expiry_min ({}) should be <= expiry_max ({})",
                self.selection.expiry_min, self.selection.expiry_max
            )));
        }

        if self.hazard.casualty_max_age_ticks == 0 {
            return Err(EngineError::InvalidConfig(
                "casualty_max_age_ticks must be positive".into(),
            ));
        }

        let positives = [
            ("lateral.distance_divisor", self.lateral.distance_divisor),
            ("lateral.path_length_divisor", self.lateral.path_length_divisor),
            ("lateral.sap_distance_divisor", self.lateral.sap_distance_divisor),
            ("lateral.sap_hp_divisor", self.lateral.sap_hp_divisor),
            ("breaking.path_cost_divisor", self.breaking.path_cost_divisor),
            (
                "breaking.killzone_distance_divisor",
                self.breaking.killzone_distance_divisor,
            ),
            ("breach.range_modifier", self.breach.range_modifier),
            ("breach.explosive_range_modifier", self.breach.explosive_range_modifier),
            ("breach.grenade_range_modifier", self.breach.grenade_range_modifier),
            ("selection.max_path_cost", self.selection.max_path_cost),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{} ({}) must be positive",
                    name, value
                )));
            }
        }

        if self.lateral.lateral_offsets.is_empty() {
            return Err(EngineError::InvalidConfig(
                "lateral.lateral_offsets must not be empty".into(),
            ));
        }

        Ok(())
    }
}

/// Load engine configuration from a TOML file
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)?;
    EngineConfig::from_toml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.hazard.rebuild_cooldown_ticks, 300);
        assert_eq!(config.selection.score_floor, -50.0);
        assert_eq!(config.obstacle.door_bonus, 100.0);
        assert_eq!(config.lateral.lateral_offsets, vec![0, 2, -2, 4, -4]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [hazard]
            los_cost = 55

            [selection]
            max_sappers = 3
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.hazard.los_cost, 55);
        assert_eq!(config.hazard.rebuild_cooldown_ticks, 300);
        assert_eq!(config.selection.max_sappers, 3);
        assert_eq!(config.risk.trap_radius, 1);
    }

    #[test]
    fn test_rejects_inverted_expiry() {
        let result = EngineConfig::from_toml_str(
            r#"
            [selection]
            expiry_min = 500
            expiry_max = 100
            "#,
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_nan_divisor() {
        let mut config = EngineConfig::default();
        config.lateral.distance_divisor = f32::NAN;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.selection.max_path_cost = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let result = EngineConfig::from_toml_str("hazard = 12");
        assert!(matches!(result, Err(EngineError::ConfigParse(_))));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
