//! Opportunistic breaking of whatever stands between the agent and a target

use crate::core::error::Result;
use crate::spatial::points_on_line;
use crate::tactics::candidate::CandidatePool;
use crate::tactics::context::DecisionContext;
use crate::tactics::obstacle::breach_job_along;
use crate::tactics::targets::HighValueTarget;
use crate::world::query::{TerrainQuery, WorldQuery};
use crate::world::structure::StructureKind;

pub fn generate(ctx: &DecisionContext, targets: &[HighValueTarget], pool: &mut CandidatePool) -> Result<()> {
    let world = ctx.battlefield;
    let config = &ctx.config.breaking;

    for target in targets {
        if !ctx.can_reach(target.position) {
            continue;
        }

        for cell in points_on_line(ctx.origin(), target.position) {
            if !world.in_bounds(cell) {
                continue;
            }
            for structure in world.structures_at(cell) {
                if !ctx.breach.breach_blocks(structure)
                    || pool.targets_structure(structure.id)
                    || world.reserved_by_other(structure.id, ctx.agent.id)
                    || !ctx.can_reach(structure.position)
                {
                    continue;
                }

                let path = ctx.path_to(structure.position)?;
                if !path.found {
                    continue;
                }

                let mineable = structure.kind == StructureKind::Mineable;
                let mut trap = ctx.path_trap_risk(&path.cells);
                if ctx.trap_near(structure.position) {
                    trap += config.structure_trap_penalty;
                }
                let (threat, handling) = if mineable {
                    (config.mineable_threat, config.mineable_time_cost)
                } else {
                    (config.structure_threat, config.structure_time_cost)
                };
                let time_cost = path.cost / config.path_cost_divisor + handling;
                let score = threat - trap - time_cost;

                let Some(job) = breach_job_along(ctx, structure, &path.cells) else {
                    continue;
                };
                pool.offer(
                    job.with_expiry(config.expiry_ticks),
                    score,
                    format!("Break {:?} at {} on the way to {}", structure.kind, cell, target.label()),
                );
            }
        }
    }

    Ok(())
}
