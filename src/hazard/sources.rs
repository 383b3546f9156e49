//! Threat sources feeding the hazard field
//!
//! Sources are recomputed from the world on every rebuild. Each kind has its
//! own readiness predicate; a source that is not ready contributes nothing.

use serde::{Deserialize, Serialize};

use crate::core::config::HazardConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::Cell;
use crate::world::agent::AgentState;
use crate::world::query::{Casualty, WorldQuery};
use crate::world::structure::{Owner, Structure};

/// Longest sightline sweep accepted from a single source
pub const MAX_SWEEP_RANGE: f32 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThreatSource {
    /// Fallen hostile lying in the open, weighted by how fresh it is
    ExposedCasualty { position: Cell, weight: u32 },
    /// Downed hostile combatant still on the field
    DownedCombatant { position: Cell },
    /// Drafted defender holding position with a melee weapon
    MeleeGuard { position: Cell },
    /// Drafted defender holding position with a ranged weapon
    AimingRangedUnit {
        position: Cell,
        range: f32,
        min_range: f32,
    },
    /// Powered, loaded and idle defender turret
    ActiveDefensiveStructure {
        position: Cell,
        range: f32,
        min_range: f32,
    },
}

impl ThreatSource {
    pub fn position(&self) -> Cell {
        match self {
            ThreatSource::ExposedCasualty { position, .. }
            | ThreatSource::DownedCombatant { position }
            | ThreatSource::MeleeGuard { position }
            | ThreatSource::AimingRangedUnit { position, .. }
            | ThreatSource::ActiveDefensiveStructure { position, .. } => *position,
        }
    }

    /// Reject sources whose numbers cannot describe a sweep
    pub fn validate(&self) -> Result<()> {
        match self {
            ThreatSource::AimingRangedUnit {
                range, min_range, ..
            }
            | ThreatSource::ActiveDefensiveStructure {
                range, min_range, ..
            } => {
                if !range.is_finite() || *range <= 0.0 || *range > MAX_SWEEP_RANGE {
                    return Err(EngineError::MalformedThreatSource(format!(
                        "range {} at {}",
                        range,
                        self.position()
                    )));
                }
                if !min_range.is_finite() || *min_range < 0.0 || min_range > range {
                    return Err(EngineError::MalformedThreatSource(format!(
                        "minimum range {} at {}",
                        min_range,
                        self.position()
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Decay weight of a casualty, or None once it is too old to matter
pub fn casualty_weight(casualty: &Casualty, config: &HazardConfig) -> Option<u32> {
    if casualty.faction.is_defender() {
        return None;
    }
    let max_age = config.casualty_max_age_ticks;
    if max_age == 0 || casualty.age_ticks >= max_age {
        return None;
    }
    let remaining = max_age - casualty.age_ticks;
    let weight = u64::from(config.casualty_weight) * remaining / max_age;
    Some(weight.min(u64::from(u32::MAX)) as u32)
}

/// Drafted defender standing in a combat-wait posture and not yet aiming
pub fn defender_ready(agent: &AgentState) -> bool {
    agent.is_armed_defender() && agent.drafted && agent.holding_position && !agent.aiming
}

/// Turret that would open fire on anything stepping into its sightlines
pub fn turret_ready(structure: &Structure) -> bool {
    if structure.destroyed || structure.owner != Owner::Defender || !structure.combat_dangerous {
        return false;
    }
    let Some(turret) = structure.turret else {
        return false;
    };

    (turret.active || turret.can_power)
        && !turret.aiming
        && turret.has_ammo
        && turret.has_fuel
        && !turret.access_closed
        && !turret.weapon.area_denial
}

/// Snapshot every ready threat source in the world
pub fn collect_threat_sources<W: WorldQuery + ?Sized>(
    world: &W,
    config: &HazardConfig,
) -> Vec<ThreatSource> {
    let mut sources = Vec::new();

    for casualty in world.casualties() {
        if let Some(weight) = casualty_weight(casualty, config) {
            sources.push(ThreatSource::ExposedCasualty {
                position: casualty.position,
                weight,
            });
        }
    }

    for agent in world.agents() {
        if agent.downed && !agent.is_defender() {
            sources.push(ThreatSource::DownedCombatant {
                position: agent.position,
            });
            continue;
        }
        if !defender_ready(agent) {
            continue;
        }
        let Some(weapon) = agent.weapon else {
            continue;
        };
        if !weapon.ranged {
            sources.push(ThreatSource::MeleeGuard {
                position: agent.position,
            });
        } else if !weapon.area_denial {
            sources.push(ThreatSource::AimingRangedUnit {
                position: agent.position,
                range: weapon.range,
                min_range: weapon.min_range,
            });
        }
    }

    for structure in world.structures() {
        if !turret_ready(structure) {
            continue;
        }
        if let Some(turret) = structure.turret {
            sources.push(ThreatSource::ActiveDefensiveStructure {
                position: structure.position,
                range: turret.weapon.range,
                min_range: turret.weapon.min_range,
            });
        }
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FactionId;
    use crate::world::agent::Weapon;
    use crate::world::GridWorld;

    fn casualty(age_ticks: u64) -> Casualty {
        Casualty {
            position: Cell::new(5, 5),
            faction: FactionId(4),
            age_ticks,
        }
    }

    #[test]
    fn test_casualty_weight_decays() {
        let config = HazardConfig::default();
        assert_eq!(casualty_weight(&casualty(0), &config), Some(1000));
        assert_eq!(casualty_weight(&casualty(1200), &config), Some(333));
        assert_eq!(casualty_weight(&casualty(1800), &config), None);
    }

    #[test]
    fn test_defender_casualties_ignored() {
        let mut fallen = casualty(10);
        fallen.faction = FactionId::DEFENDERS;
        assert_eq!(casualty_weight(&fallen, &HazardConfig::default()), None);
    }

    #[test]
    fn test_turret_readiness() {
        let mut turret = Structure::turret(Cell::new(2, 2), Weapon::ranged(20.0, 3.0));
        assert!(turret_ready(&turret));

        let mut state = turret.turret.unwrap();
        state.aiming = true;
        turret.turret = Some(state);
        assert!(!turret_ready(&turret));

        state.aiming = false;
        state.has_ammo = false;
        turret.turret = Some(state);
        assert!(!turret_ready(&turret));

        state.has_ammo = true;
        state.active = false;
        state.can_power = false;
        turret.turret = Some(state);
        assert!(!turret_ready(&turret));

        state.can_power = true;
        state.access_closed = true;
        turret.turret = Some(state);
        assert!(!turret_ready(&turret));
    }

    #[test]
    fn test_area_denial_never_sweeps() {
        let mut world = GridWorld::new(20, 20);
        let mut launcher = Weapon::ranged(30.0, 8.0);
        launcher.area_denial = true;
        world.add_structure(Structure::turret(Cell::new(3, 3), launcher));
        world.add_agent(
            AgentState::new(FactionId::DEFENDERS, Cell::new(6, 6))
                .with_weapon(launcher)
                .holding(),
        );

        let sources = collect_threat_sources(&world, &HazardConfig::default());
        assert!(sources.is_empty());
    }

    #[test]
    fn test_collects_each_kind() {
        let mut world = GridWorld::new(20, 20);
        world.add_casualty(casualty(100));
        let mut downed = AgentState::new(FactionId(4), Cell::new(8, 8));
        downed.downed = true;
        world.add_agent(downed);
        world.add_agent(
            AgentState::new(FactionId::DEFENDERS, Cell::new(1, 1))
                .with_weapon(Weapon::melee(5.0))
                .holding(),
        );
        world.add_agent(
            AgentState::new(FactionId::DEFENDERS, Cell::new(2, 1))
                .with_weapon(Weapon::ranged(20.0, 4.0))
                .holding(),
        );
        // Not drafted: no contribution
        world.add_agent(
            AgentState::new(FactionId::DEFENDERS, Cell::new(3, 1))
                .with_weapon(Weapon::ranged(20.0, 4.0)),
        );
        world.add_structure(Structure::turret(Cell::new(10, 10), Weapon::ranged(25.0, 3.0)));

        let sources = collect_threat_sources(&world, &HazardConfig::default());
        assert_eq!(sources.len(), 5);
        assert!(matches!(sources[0], ThreatSource::ExposedCasualty { .. }));
        assert!(sources
            .iter()
            .any(|s| matches!(s, ThreatSource::MeleeGuard { .. })));
        assert!(sources
            .iter()
            .any(|s| matches!(s, ThreatSource::ActiveDefensiveStructure { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_range() {
        let source = ThreatSource::AimingRangedUnit {
            position: Cell::new(0, 0),
            range: f32::NAN,
            min_range: 0.0,
        };
        assert!(matches!(
            source.validate(),
            Err(EngineError::MalformedThreatSource(_))
        ));

        let inverted = ThreatSource::ActiveDefensiveStructure {
            position: Cell::new(0, 0),
            range: 5.0,
            min_range: 9.0,
        };
        assert!(inverted.validate().is_err());
    }
}
