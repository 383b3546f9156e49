//! Random nearby cells for wandering and backing off

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::Cell;
use crate::spatial::cells_in_radius;
use crate::tactics::context::DecisionContext;
use crate::tactics::job::Job;
use crate::world::query::TerrainQuery;

/// Uniformly random standable cell within `radius` that `accept` allows and
/// that lies in the same region as `origin`
pub fn random_cell_near<T, R, F>(
    terrain: &T,
    rng: &mut R,
    origin: Cell,
    radius: f32,
    region_hops: u32,
    accept: F,
) -> Option<Cell>
where
    T: TerrainQuery + ?Sized,
    R: Rng,
    F: Fn(Cell) -> bool,
{
    let mut cells = cells_in_radius(origin, radius);
    cells.shuffle(rng);
    cells.into_iter().find(|&cell| {
        terrain.in_bounds(cell)
            && terrain.standable(cell)
            && accept(cell)
            && terrain.same_region(origin, cell, region_hops)
    })
}

/// Amble to a random safe cell near the agent
pub fn safe_wander<R: Rng>(ctx: &DecisionContext, rng: &mut R) -> Option<Job> {
    let origin = ctx.origin();
    let selection = &ctx.config.selection;
    random_cell_near(
        ctx.battlefield,
        rng,
        origin,
        selection.wander_radius,
        selection.region_hops,
        |cell| cell != origin && ctx.is_safe_cell(cell),
    )
    .map(|cell| Job::goto(cell).ambling())
}
