//! Agent snapshots as handed over by the host simulation

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Cell, FactionId, GroupId};
use crate::tactics::job::Job;

/// Weapon capabilities, resolved by the host (no name matching here)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub ranged: bool,
    pub range: f32,
    pub min_range: f32,
    /// Average damage per second
    pub dps: f32,
    /// Saturation launchers: never counted as an aimed sightline threat
    pub area_denial: bool,
    pub explosive: bool,
    pub grenade: bool,
}

impl Weapon {
    pub fn melee(dps: f32) -> Self {
        Self {
            ranged: false,
            range: 1.5,
            min_range: 0.0,
            dps,
            area_denial: false,
            explosive: false,
            grenade: false,
        }
    }

    pub fn ranged(range: f32, dps: f32) -> Self {
        Self {
            ranged: true,
            range,
            min_range: 0.0,
            dps,
            area_denial: false,
            explosive: false,
            grenade: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub shooting: u8,
    pub melee: u8,
}

/// Personality flags that change how an agent weighs risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    /// Scores are scaled down by the timid factor
    pub timid: bool,
    /// Ignores trap and defense risk when probing routes
    pub nimble: bool,
}

/// Read-only view of one agent for a single decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub faction: FactionId,
    pub group: Option<GroupId>,
    pub position: Cell,
    /// Summary health in [0, 1]
    pub health: f32,
    pub downed: bool,
    pub humanlike: bool,
    pub weapon: Option<Weapon>,
    /// Best sharp armor rating among worn apparel
    pub armor_rating: f32,
    pub skills: Skills,
    pub disposition: Disposition,
    pub mining_disabled: bool,
    pub duty_focus: Option<Cell>,
    pub drafted: bool,
    /// Standing in a combat-wait posture
    pub holding_position: bool,
    /// Currently aiming at something
    pub aiming: bool,
    pub current_job: Option<Job>,
}

impl AgentState {
    pub fn new(faction: FactionId, position: Cell) -> Self {
        Self {
            id: AgentId::new(),
            faction,
            group: None,
            position,
            health: 1.0,
            downed: false,
            humanlike: true,
            weapon: None,
            armor_rating: 0.0,
            skills: Skills::default(),
            disposition: Disposition::default(),
            mining_disabled: false,
            duty_focus: None,
            drafted: false,
            holding_position: false,
            aiming: false,
            current_job: None,
        }
    }

    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    pub fn with_duty_focus(mut self, focus: Cell) -> Self {
        self.duty_focus = Some(focus);
        self
    }

    /// Drafted and waiting for a target
    pub fn holding(mut self) -> Self {
        self.drafted = true;
        self.holding_position = true;
        self
    }

    pub fn is_defender(&self) -> bool {
        self.faction.is_defender()
    }

    /// Fighting defender: not downed and carrying any weapon
    pub fn is_armed_defender(&self) -> bool {
        self.is_defender() && !self.downed && self.weapon.is_some()
    }

    pub fn has_ranged_weapon(&self) -> bool {
        self.weapon.map_or(false, |w| w.ranged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_defaults() {
        let agent = AgentState::new(FactionId(2), Cell::new(1, 1));
        assert_eq!(agent.health, 1.0);
        assert!(!agent.is_defender());
        assert!(agent.current_job.is_none());
    }

    #[test]
    fn test_armed_defender() {
        let defender = AgentState::new(FactionId::DEFENDERS, Cell::new(0, 0))
            .with_weapon(Weapon::ranged(25.0, 4.0));
        assert!(defender.is_armed_defender());
        assert!(defender.has_ranged_weapon());

        let mut downed = defender.clone();
        downed.downed = true;
        assert!(!downed.is_armed_defender());
    }
}
