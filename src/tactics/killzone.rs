//! Moving to the assigned duty focus while weighing the fire along the way

use crate::core::types::Cell;
use crate::spatial::points_on_line;
use crate::tactics::candidate::CandidatePool;
use crate::tactics::context::DecisionContext;
use crate::tactics::job::Job;
use crate::tactics::risk;
use crate::world::query::TerrainQuery;

/// Risk of walking the straight line to `focus`: traps plus modeled defender fire
pub fn line_risk(ctx: &DecisionContext, focus: Cell) -> (f32, f32) {
    let world = ctx.battlefield;
    let risk_config = &ctx.config.risk;
    let mut trap = 0.0;
    let mut fire = 0.0;

    for cell in points_on_line(ctx.origin(), focus) {
        if !world.in_bounds(cell) {
            continue;
        }
        if ctx.trap_near(cell) {
            trap += risk_config.killzone_trap_penalty;
        }
        fire += risk::incoming_fire_risk(world, cell, risk_config);
    }

    (trap, fire)
}

pub fn generate(ctx: &DecisionContext, pool: &mut CandidatePool) {
    let Some(focus) = ctx.agent.duty_focus else {
        return;
    };
    if focus == ctx.origin() || !ctx.battlefield.in_bounds(focus) || !ctx.can_reach(focus) {
        return;
    }

    let config = &ctx.config.breaking;
    let (trap, fire) = line_risk(ctx, focus);
    let score = config.killzone_base - trap - fire - ctx.origin().distance(focus) / config.killzone_distance_divisor;

    pool.offer(
        Job::goto(focus),
        score,
        format!("Killzone approach to {} (trap {:.1}, fire {:.1})", focus, trap, fire),
    );
}
