//! Role classification and formation-aware candidates

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::{FormationConfig, RiskConfig};
use crate::core::types::Cell;
use crate::hazard::{veto_melee, HazardField};
use crate::spatial::cells_in_radius;
use crate::tactics::candidate::CandidatePool;
use crate::tactics::context::DecisionContext;
use crate::tactics::job::{Job, JobTarget};
use crate::tactics::risk;
use crate::world::agent::AgentState;
use crate::world::query::{Battlefield, WorldQuery};
use crate::world::structure::StructureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    FrontLine,
    Ranged,
    Generic,
}

/// Role follows from equipment: ranged weapon first, then heavy armor
pub fn role_of(agent: &AgentState, config: &FormationConfig) -> Role {
    if agent.has_ranged_weapon() {
        Role::Ranged
    } else if agent.armor_rating > config.front_line_armor {
        Role::FrontLine
    } else {
        Role::Generic
    }
}

/// Closest safe cell around `origin`, the origin itself excluded
pub fn nearest_safe_cell<B: Battlefield + ?Sized>(
    battlefield: &B,
    hazard: &HazardField,
    origin: Cell,
    radius: f32,
    config: &RiskConfig,
) -> Option<Cell> {
    cells_in_radius(origin, radius)
        .into_iter()
        .filter(|&cell| cell != origin && risk::is_safe_cell(battlefield, hazard, cell, config))
        .min_by_key(|cell| cell.distance_squared(origin))
}

/// Positions around `target` for up to `ally_count` flankers
///
/// Both sides across the approach axis first, then behind and in front.
pub fn flank_positions(target: Cell, origin: Cell, ally_count: usize, config: &FormationConfig) -> Vec<Cell> {
    let mut axis = (target - origin).signum();
    if axis == Cell::new(0, 0) {
        axis = Cell::new(1, 0);
    }
    let side = Cell::new(-axis.z, axis.x);
    let reach = config.flank_distance;

    [
        target + side.scale(reach),
        target - side.scale(reach),
        target + axis.scale(reach),
        target - axis.scale(reach),
    ]
    .into_iter()
    .take(ally_count.min(config.max_flankers))
    .collect()
}

pub fn generate(ctx: &DecisionContext, pool: &mut CandidatePool) {
    let config = &ctx.config.formation;
    match role_of(ctx.agent, config) {
        Role::FrontLine => advance_to_cover(ctx, pool),
        Role::Ranged => fall_back_behind_front_line(ctx, pool),
        Role::Generic => {}
    }
    focus_fire(ctx, pool);
    bait(ctx, pool);
}

fn advance_to_cover(ctx: &DecisionContext, pool: &mut CandidatePool) {
    let config = &ctx.config.formation;
    if let Some(cell) = nearest_safe_cell(
        ctx.battlefield,
        ctx.hazard,
        ctx.origin(),
        config.advance_radius,
        &ctx.config.risk,
    ) {
        pool.offer(
            Job::goto(cell),
            config.advance_score,
            format!("Front line advance to {}", cell),
        );
    }
}

fn fall_back_behind_front_line(ctx: &DecisionContext, pool: &mut CandidatePool) {
    let config = &ctx.config.formation;
    let world = ctx.battlefield;
    let origin = ctx.origin();

    let front = world
        .agents()
        .iter()
        .filter(|a| {
            a.id != ctx.agent.id
                && a.faction == ctx.agent.faction
                && !a.downed
                && role_of(a, config) == Role::FrontLine
                && a.position.distance(origin) <= config.ally_radius
        })
        .min_by_key(|a| a.position.distance_squared(origin));
    let Some(front) = front else {
        return;
    };

    // Facing is towards the ally's duty focus, else towards the closest defender
    let facing = front.duty_focus.or_else(|| {
        world
            .agents()
            .iter()
            .filter(|a| a.is_defender() && !a.downed)
            .min_by_key(|a| a.position.distance_squared(front.position))
            .map(|a| a.position)
    });
    let Some(facing) = facing else {
        return;
    };
    let dir = (facing - front.position).signum();
    if dir == Cell::new(0, 0) {
        return;
    }

    let behind = [front.position - dir, front.position - dir.scale(2)]
        .into_iter()
        .find(|&cell| cell != origin && ctx.is_safe_cell(cell));
    if let Some(cell) = behind {
        pool.offer(
            Job::goto(cell),
            config.fallback_score,
            format!("Fall back behind front line at {}", front.position),
        );
    }
}

fn focus_fire(ctx: &DecisionContext, pool: &mut CandidatePool) {
    let config = &ctx.config.formation;
    let world = ctx.battlefield;
    let origin = ctx.origin();

    let mut group: Vec<Cell> = world
        .agents()
        .iter()
        .filter(|a| {
            a.id != ctx.agent.id
                && a.faction == ctx.agent.faction
                && !a.downed
                && a.position.distance(origin) <= config.group_radius
        })
        .map(|a| a.position)
        .collect();
    if group.len() < config.group_min_size {
        return;
    }
    group.push(origin);

    let average_distance = |cell: Cell| group.iter().map(|p| p.distance(cell)).sum::<f32>() / group.len() as f32;

    let target = world
        .agents()
        .iter()
        .filter(|a| a.is_defender() && !a.downed)
        .filter(|a| {
            let reachable = ctx.can_reach(a.position);
            !veto_melee(ctx.hazard, origin, a.position, reachable, &ctx.config.hazard)
        })
        .min_by_key(|a| OrderedFloat(average_distance(a.position)));

    if let Some(target) = target {
        pool.offer(
            Job::attack_melee(JobTarget::Agent(target.id)),
            config.focus_fire_score,
            format!("Group of {} focus fire on {}", group.len(), target.position),
        );
    }
}

fn bait(ctx: &DecisionContext, pool: &mut CandidatePool) {
    let config = &ctx.config.formation;
    if ctx.agent.health > config.bait_health {
        return;
    }
    let origin = ctx.origin();

    let trap = ctx
        .battlefield
        .structures()
        .iter()
        .filter(|s| s.kind == StructureKind::Trap && !s.destroyed && s.position != origin)
        .filter(|s| s.position.distance(origin) <= config.bait_radius)
        .min_by_key(|s| s.position.distance_squared(origin));

    if let Some(trap) = trap {
        pool.offer(
            Job::goto(trap.position),
            config.bait_score,
            format!("Wounded lure towards trap at {}", trap.position),
        );
    }
}
