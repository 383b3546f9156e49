//! Direct approach and lateral route candidates
//!
//! Every high-value target first gets a direct path request. A safe path
//! ends the search for that target; otherwise straight and sideways-jogged
//! lateral routes are scored for risk and obstruction.

use crate::cache::CachedPathEntry;
use crate::core::error::Result;
use crate::core::types::Cell;
use crate::spatial::{cells_in_radius, lateral_route};
use crate::tactics::candidate::CandidatePool;
use crate::tactics::context::DecisionContext;
use crate::tactics::job::Job;
use crate::tactics::obstacle::{breach_job_along, find_optimal_obstacle};
use crate::tactics::risk;
use crate::tactics::targets::{HighValueTarget, TargetKind};
use crate::world::query::{PathResult, TargetRef, TerrainQuery, WorldQuery};
use crate::world::structure::StructureKind;

/// Accumulated risk along one lateral route
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteRisk {
    pub trap: f32,
    pub defense: f32,
    pub walls: usize,
}

pub fn generate(ctx: &DecisionContext, targets: &[HighValueTarget], pool: &mut CandidatePool) -> Result<()> {
    let lateral = &ctx.config.lateral;

    for target in targets {
        let path = ctx.path_to(target.position)?;
        let path_trap = if path.found {
            ctx.path_trap_risk(&path.cells)
        } else {
            0.0
        };

        if path.found && path_trap < ctx.config.risk.max_trap_risk {
            let score = ctx.config.selection.direct_base - path_trap - path.cost / lateral.path_length_divisor
                + target.value;
            pool.offer(
                Job::goto(target.position),
                score,
                format!("Safe path to {}", target.label()),
            );
            continue;
        }

        if path.found && ctx.origin() != target.position {
            let score = lateral.alternate_path_base + target.value
                - path_trap
                - path.cost / lateral.path_length_divisor;
            pool.offer(
                Job::goto(target.position),
                score,
                format!("Trapped alternate path to {}", target.label()),
            );
        }

        for &offset in &lateral.lateral_offsets {
            score_lateral_route(ctx, target, &path, offset, pool)?;
        }
    }

    Ok(())
}

/// Trap, defense and obstruction totals for a route
pub fn assess_route(ctx: &DecisionContext, route: &[Cell]) -> RouteRisk {
    let world = ctx.battlefield;
    let config = &ctx.config.risk;
    let nimble = ctx.agent.disposition.nimble;
    let mut assessed = RouteRisk::default();

    for &cell in route {
        if !world.in_bounds(cell) {
            continue;
        }
        assessed.walls += risk::obstruction_count(world, cell);
        if nimble {
            continue;
        }
        if ctx.trap_near(cell) {
            assessed.trap += config.route_trap_penalty;
        }
        for near in cells_in_radius(cell, config.defense_scan_radius) {
            if world.in_bounds(near) && risk::defensive_structure_at(world, near) {
                assessed.defense += 1.0;
            }
        }
        assessed.defense += risk::structure_risk(world, cell, config);
    }

    assessed
}

fn score_lateral_route(
    ctx: &DecisionContext,
    target: &HighValueTarget,
    path: &PathResult,
    offset: i32,
    pool: &mut CandidatePool,
) -> Result<()> {
    let lateral = &ctx.config.lateral;
    let world = ctx.battlefield;
    let origin = ctx.origin();

    let route = lateral_route(origin, target.position, offset);
    if route.is_empty() {
        return Ok(());
    }

    let RouteRisk { trap, defense, walls } = assess_route(ctx, &route);
    let obstructed = walls > 0;
    let time_cost = origin.distance(target.position) / lateral.distance_divisor + walls as f32 * lateral.wall_time_cost;

    let mut base = lateral.base_score;
    if ctx.group_size == 1 && obstructed {
        base += lateral.lone_breacher_bonus;
    }
    if trap > lateral.trapped_base_threshold {
        base = (base - lateral.trapped_base_cut).max(0.1);
    }

    if trap > lateral.skip_trap_risk || (trap > lateral.skip_paired_trap_risk && defense > lateral.skip_paired_defense_risk) {
        return Ok(());
    }
    if obstructed && trap > lateral.skip_obstructed_trap_risk {
        return Ok(());
    }
    if !obstructed && trap < lateral.clear_route_threshold && defense < lateral.clear_route_threshold {
        base += lateral.clear_route_bonus;
    }
    if trap > lateral.skip_trap_ceiling || defense > lateral.skip_defense_ceiling {
        return Ok(());
    }
    if obstructed && !risk::wall_on_path_to_target(world, &route, target.position) {
        return Ok(());
    }

    let defense_penalty = if defense > lateral.defense_penalty_threshold {
        lateral.defense_penalty
    } else {
        0.0
    };
    let wall_penalty = if obstructed {
        walls as f32 * lateral.wall_weight + risk::thickness_penalty(world, &route, lateral)
    } else {
        0.0
    };

    let mut score = base + target.value - trap - defense - time_cost - defense_penalty - wall_penalty;
    if ctx.group_size > 1 {
        score += lateral.group_bonus;
        if obstructed {
            score -= lateral.group_wall_penalty;
        }
    }
    if trap > lateral.trapped_score_threshold {
        score -= lateral.trapped_score_cut;
    }

    if trap > lateral.late_skip_trap_risk
        || (trap > lateral.late_skip_paired_trap_risk && defense > lateral.skip_paired_defense_risk)
    {
        return Ok(());
    }

    if obstructed {
        pool.note_obstruction();
        return breach_along_route(ctx, target, path, &route, trap, score, offset, pool);
    }

    let job = match (target.kind, target.target) {
        (TargetKind::Defender { downed: true }, TargetRef::Agent(id)) => {
            let clear = trap < lateral.clear_route_threshold && defense < lateral.clear_route_threshold;
            if !clear || world.kidnap_reserved_by_other(id, ctx.agent.id) {
                return Ok(());
            }
            Job::kidnap(id)
        }
        _ => Job::attack_melee(target.target.as_job_target()),
    };
    pool.offer(
        job,
        score,
        format!("Lateral (offset {}) to {}", offset, target.label()),
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn breach_along_route(
    ctx: &DecisionContext,
    target: &HighValueTarget,
    path: &PathResult,
    route: &[Cell],
    trap: f32,
    score: f32,
    offset: i32,
    pool: &mut CandidatePool,
) -> Result<()> {
    let lateral = &ctx.config.lateral;
    let Some((obstacle, index)) = find_optimal_obstacle(ctx, route) else {
        return Ok(());
    };

    let approach = ctx.path_to(obstacle.position)?;
    if !approach.found {
        return Ok(());
    }
    let obstacle_trap = ctx.path_trap_risk(&approach.cells);
    if obstacle_trap > ctx.config.risk.max_obstacle_path_trap_risk {
        return Ok(());
    }

    let mut score = score + trap - obstacle_trap;
    if obstacle.kind == StructureKind::Door {
        score += lateral.door_route_bonus;
    }

    let cell_before = approach.last_cell().unwrap_or_else(|| ctx.origin());
    let cell_after = route.get(index + 1).copied().unwrap_or(target.position);
    pool.remember(
        CachedPathEntry::new(ctx.agent.id, ctx.agent.group, target.target, cell_before)
            .blocked_by(obstacle.id, cell_after),
    );

    let Some(job) = breach_job_along(ctx, obstacle, &approach.cells) else {
        return Ok(());
    };
    pool.offer(
        job.clone(),
        score,
        format!(
            "Breach {:?} at {} (offset {}) towards {}",
            obstacle.kind,
            obstacle.position,
            offset,
            target.label()
        ),
    );

    if !path.found && obstacle_trap <= ctx.config.risk.max_sap_path_trap_risk {
        let sap = target.value + lateral.sap_base
            - obstacle_trap
            - approach.cost / lateral.sap_distance_divisor
            - obstacle.hit_points / lateral.sap_hp_divisor;
        pool.offer(
            job,
            sap,
            format!("Sap {} towards {}", obstacle.position, target.label()),
        );
    }

    Ok(())
}
