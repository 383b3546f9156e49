//! Per-agent multiplier applied to every candidate score

use crate::core::config::SelectionConfig;
use crate::world::agent::AgentState;

/// Skilled, healthy agents commit harder; timid ones hold back
pub fn trait_weight(agent: &AgentState, config: &SelectionConfig) -> f32 {
    let skill = 1.0
        + f32::from(agent.skills.shooting) * config.skill_weight
        + f32::from(agent.skills.melee) * config.skill_weight;
    let mut weight = skill * agent.health.clamp(0.0, 1.0);
    if agent.disposition.timid {
        weight *= config.timid_factor;
    }
    weight
}
