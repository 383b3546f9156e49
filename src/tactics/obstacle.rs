//! Picking which wall, door or rock to break, and the jobs that break it

use ahash::AHashSet;
use rand::Rng;

use crate::cache::CachedPathEntry;
use crate::core::types::{AgentId, Cell, StructureId};
use crate::tactics::breach::{safe_for_ranged_cast, RangedCast};
use crate::tactics::context::DecisionContext;
use crate::tactics::job::{Job, JobKind, JobTarget};
use crate::tactics::wander::random_cell_near;
use crate::world::query::{TargetRef, TerrainQuery, WorldQuery};
use crate::world::structure::{Owner, Structure, StructureKind};

/// Another standing agent of `agent`'s faction is already breaking this structure
pub fn engaged_by_ally<W: WorldQuery + ?Sized>(world: &W, structure: StructureId, agent: AgentId) -> bool {
    let Some(me) = world.agent(agent) else {
        return false;
    };
    world.agents().iter().any(|other| {
        other.id != agent
            && other.faction == me.faction
            && !other.downed
            && other
                .current_job
                .as_ref()
                .map_or(false, |job| job.is_breach() && job.targets_structure(structure))
    })
}

/// Desirability of breaking `structure`, found at `route[index]`
pub fn score_obstacle(ctx: &DecisionContext, structure: &Structure, route: &[Cell], index: usize) -> f32 {
    let config = &ctx.config.obstacle;
    let world = ctx.battlefield;
    let mut score = 0.0;

    if structure.kind == StructureKind::Door {
        score += config.door_bonus;
    }
    score += (1.0 - structure.hp_ratio()) * config.weakness_bonus;

    if ctx.trap_near(structure.position) {
        score -= config.trap_adjacent_penalty;
    }
    if let Some(behind) = route.get(index + 1) {
        if ctx.trap_near(*behind) {
            score -= config.trap_behind_penalty;
        }
    }

    let nearest_defender = world
        .agents()
        .iter()
        .filter(|a| a.is_defender() && !a.downed)
        .map(|a| a.position.distance(structure.position))
        .fold(f32::INFINITY, f32::min);
    if nearest_defender.is_finite() {
        score += config.defender_proximity_bonus / (nearest_defender + 1.0);
    }

    if engaged_by_ally(world, structure.id, ctx.agent.id) {
        score += config.focus_fire_bonus;
    }
    if ctx
        .agent
        .current_job
        .as_ref()
        .map_or(false, |job| job.targets_structure(structure.id))
    {
        score += config.hysteresis_bonus;
    }

    score
}

/// Best breakable obstacle on `route` with its index, if any is reachable
pub fn find_optimal_obstacle<'a>(ctx: &DecisionContext<'a>, route: &[Cell]) -> Option<(&'a Structure, usize)> {
    let world = ctx.battlefield;
    let mut seen = AHashSet::new();
    let mut best: Option<(&'a Structure, usize, f32)> = None;

    for (index, cell) in route.iter().enumerate() {
        if !world.in_bounds(*cell) {
            continue;
        }
        for structure in world.structures_at(*cell) {
            if !structure.kind.is_breakable_obstacle() || !seen.insert(structure.id) {
                continue;
            }
            if !matches!(structure.owner, Owner::Defender | Owner::Unowned) {
                continue;
            }
            if !ctx.can_reach(structure.position) {
                continue;
            }
            let score = score_obstacle(ctx, structure, route, index);
            if best.map_or(true, |(_, _, top)| score > top) {
                best = Some((structure, index, score));
            }
        }
    }

    best.map(|(structure, index, _)| (structure, index))
}

/// Mine when the agent can and nobody else holds the rock, otherwise hit it
pub fn breach_job(ctx: &DecisionContext, structure: &Structure) -> Job {
    let can_mine = structure.kind == StructureKind::Mineable
        && !ctx.agent.mining_disabled
        && !ctx.battlefield.reserved_by_other(structure.id, ctx.agent.id);
    if can_mine {
        Job::mine(structure.id)
    } else {
        Job::attack_melee(JobTarget::Structure(structure.id))
    }
}

/// Firing cells of group mates already breaching from range
pub fn group_ranged_casts(ctx: &DecisionContext) -> Vec<RangedCast> {
    let world = ctx.battlefield;
    world
        .agents()
        .iter()
        .filter(|a| {
            a.id != ctx.agent.id && !a.downed && a.faction == ctx.agent.faction && a.group == ctx.agent.group
        })
        .filter_map(|a| {
            let job = a.current_job.as_ref().filter(|job| job.is_breach())?;
            let Some(JobTarget::Cell(firing_cell)) = job.target_b else {
                return None;
            };
            let JobTarget::Structure(id) = job.target_a else {
                return None;
            };
            let target = world.structure(id)?.position;
            Some(RangedCast { firing_cell, target })
        })
        .collect()
}

/// Breach job for an agent walking `approach` towards `structure`
///
/// Ranged breachers fire from the first cell on the approach that is in
/// range and safe to cast from; that cell rides along as the second target.
/// None when no such cell exists.
pub fn breach_job_along(ctx: &DecisionContext, structure: &Structure, approach: &[Cell]) -> Option<Job> {
    let job = breach_job(ctx, structure);
    let Some(weapon) = ctx.agent.weapon.filter(|w| w.ranged) else {
        return Some(job);
    };
    if job.kind == JobKind::Mine {
        return Some(job);
    }

    let casts = group_ranged_casts(ctx);
    let firing_cell = approach
        .iter()
        .copied()
        .filter(|cell| cell.distance(structure.position) <= weapon.range)
        .find(|&cell| {
            safe_for_ranged_cast(
                ctx.battlefield,
                cell,
                structure.position,
                &weapon,
                &ctx.breach,
                &casts,
                &ctx.config.breach,
            )
        })?;

    let mut job = job;
    job.target_b = Some(JobTarget::Cell(firing_cell));
    Some(job)
}

/// Breach job for a remembered path: the blocker, or the target itself
///
/// When the thing to hit sits next to a trap, the agent backs off to a
/// random nearby cell instead.
pub fn breach_job_for_entry<R: Rng>(ctx: &DecisionContext, entry: &CachedPathEntry, rng: &mut R) -> Option<Job> {
    let world = ctx.battlefield;
    let (position, job) = match entry.blocking {
        Some(id) => {
            let structure = world.structure(id).filter(|s| !s.destroyed)?;
            (structure.position, breach_job(ctx, structure))
        }
        None => match entry.target {
            TargetRef::Agent(id) => {
                let target = world.agent(id)?;
                (target.position, Job::attack_melee(JobTarget::Agent(id)))
            }
            TargetRef::Structure(id) => {
                let structure = world.structure(id).filter(|s| !s.destroyed)?;
                (structure.position, breach_job(ctx, structure))
            }
        },
    };

    if ctx.trap_near(position) {
        let origin = ctx.origin();
        let radius = ctx.config.selection.flee_radius;
        let hops = ctx.config.selection.region_hops;
        return random_cell_near(world, rng, origin, radius, hops, |c| c != origin).map(Job::goto);
    }

    let mut job = job;
    job.collide_with_agents = true;
    Some(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{FactionId, GroupId};
    use crate::hazard::HazardField;
    use crate::spatial::points_on_line;
    use crate::tactics::breach::BreachState;
    use crate::world::agent::{AgentState, Weapon};
    use crate::world::GridWorld;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn raider_at(cell: Cell) -> AgentState {
        AgentState::new(FactionId(2), cell)
    }

    #[test]
    fn test_ranged_breacher_fires_from_first_cell_in_range() {
        let mut world = GridWorld::new(30, 30);
        let wall = world.add_structure(Structure::wall(Cell::new(8, 10)));
        let agent = raider_at(Cell::new(0, 10)).with_weapon(Weapon::ranged(6.0, 3.0));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());

        let structure = world.structure(wall).unwrap();
        let approach = points_on_line(Cell::new(0, 10), Cell::new(7, 10));
        let job = breach_job_along(&ctx, structure, &approach).unwrap();
        assert_eq!(job.kind, JobKind::AttackMelee);
        assert_eq!(job.target_a, JobTarget::Structure(wall));
        assert_eq!(job.target_b, Some(JobTarget::Cell(Cell::new(2, 10))));
    }

    #[test]
    fn test_ranged_breacher_refuses_line_through_group_mate() {
        let mut world = GridWorld::new(60, 30);
        let group = GroupId::new();
        let wall = world.add_structure(Structure::wall(Cell::new(30, 10)));
        let other_wall = world.add_structure(Structure::wall(Cell::new(30, 20)));
        let sniper = Weapon::ranged(40.0, 2.0);

        let mut mate = raider_at(Cell::new(2, 10)).with_group(group).with_weapon(sniper);
        let mut cast = Job::attack_melee(JobTarget::Structure(other_wall));
        cast.target_b = Some(JobTarget::Cell(Cell::new(2, 10)));
        mate.current_job = Some(cast);
        world.add_agent(mate);

        let agent = raider_at(Cell::new(10, 10)).with_group(group).with_weapon(sniper);
        let config = EngineConfig::default();
        let hazard = HazardField::new(60, 30);
        let state = BreachState {
            enforce_minimum_range: false,
            ..BreachState::default()
        };
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, state);

        assert_eq!(group_ranged_casts(&ctx).len(), 1);
        let structure = world.structure(wall).unwrap();
        let approach = points_on_line(Cell::new(10, 10), Cell::new(29, 10));
        assert!(breach_job_along(&ctx, structure, &approach).is_none());

        // Outside the group the same cell is fine
        let loner = raider_at(Cell::new(10, 10)).with_weapon(sniper);
        let ctx = DecisionContext::new(&loner, &world, &config, &hazard, state);
        let job = breach_job_along(&ctx, structure, &approach).unwrap();
        assert_eq!(job.target_b, Some(JobTarget::Cell(Cell::new(10, 10))));
    }

    #[test]
    fn test_melee_breacher_has_no_firing_cell() {
        let mut world = GridWorld::new(30, 30);
        let wall = world.add_structure(Structure::wall(Cell::new(8, 10)));
        let agent = raider_at(Cell::new(0, 10));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());

        let approach = points_on_line(Cell::new(0, 10), Cell::new(7, 10));
        let job = breach_job_along(&ctx, world.structure(wall).unwrap(), &approach).unwrap();
        assert_eq!(job.target_b, None);
    }

    #[test]
    fn test_door_beats_healthy_wall() {
        let mut world = GridWorld::new(30, 30);
        let wall = world.add_structure(Structure::wall(Cell::new(5, 10)));
        let door = world.add_structure(Structure::door(Cell::new(8, 10)));
        let agent = raider_at(Cell::new(1, 10));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());

        let route = points_on_line(Cell::new(1, 10), Cell::new(12, 10));
        let (chosen, index) = find_optimal_obstacle(&ctx, &route).unwrap();
        assert_eq!(chosen.id, door);
        assert_eq!(route[index], Cell::new(8, 10));
        assert_ne!(chosen.id, wall);
    }

    #[test]
    fn test_door_outweighs_weakened_wall() {
        let mut world = GridWorld::new(30, 30);
        world.add_structure(Structure::wall(Cell::new(5, 10)).with_hit_points(30.0));
        world.add_structure(Structure::door(Cell::new(8, 10)));
        let agent = raider_at(Cell::new(1, 10));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());

        let route = points_on_line(Cell::new(1, 10), Cell::new(12, 10));
        let (chosen, _) = find_optimal_obstacle(&ctx, &route).unwrap();
        assert_eq!(chosen.kind, StructureKind::Door);
    }

    #[test]
    fn test_trapped_obstacle_is_avoided() {
        let mut world = GridWorld::new(30, 30);
        world.add_structure(Structure::door(Cell::new(5, 10)));
        world.add_structure(Structure::trap(Cell::new(5, 11)));
        let wall = world.add_structure(Structure::wall(Cell::new(8, 10)));
        let agent = raider_at(Cell::new(1, 10));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());

        let route = points_on_line(Cell::new(1, 10), Cell::new(12, 10));
        let (chosen, _) = find_optimal_obstacle(&ctx, &route).unwrap();
        assert_eq!(chosen.id, wall);
    }

    #[test]
    fn test_mining_preferred_for_rock() {
        let mut world = GridWorld::new(10, 10);
        let rock = Structure::rock(Cell::new(4, 4));
        world.add_structure(rock.clone());
        let mut agent = raider_at(Cell::new(1, 1));
        let config = EngineConfig::default();
        let hazard = HazardField::new(10, 10);

        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());
        assert_eq!(breach_job(&ctx, &rock).kind, crate::tactics::job::JobKind::Mine);

        agent.mining_disabled = true;
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());
        assert_eq!(breach_job(&ctx, &rock).kind, crate::tactics::job::JobKind::AttackMelee);
    }

    #[test]
    fn test_entry_job_flees_trapped_blocker() {
        let mut world = GridWorld::new(30, 30);
        let wall = world.add_structure(Structure::wall(Cell::new(10, 10)));
        world.add_structure(Structure::trap(Cell::new(9, 10)));
        let agent = raider_at(Cell::new(3, 3));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());
        let entry = CachedPathEntry::new(agent.id, None, TargetRef::Structure(StructureId::new()), Cell::new(9, 9))
            .blocked_by(wall, Cell::new(11, 10));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let job = breach_job_for_entry(&ctx, &entry, &mut rng).unwrap();
        assert_eq!(job.kind, crate::tactics::job::JobKind::Goto);
        let JobTarget::Cell(cell) = job.target_a else {
            panic!("flee job targets a cell");
        };
        assert!(cell.distance(agent.position) <= config.selection.flee_radius);
    }

    #[test]
    fn test_entry_job_breaks_blocker() {
        let mut world = GridWorld::new(30, 30);
        let wall = world.add_structure(Structure::wall(Cell::new(10, 10)));
        let agent = raider_at(Cell::new(3, 3));
        let config = EngineConfig::default();
        let hazard = HazardField::new(30, 30);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());
        let entry = CachedPathEntry::new(agent.id, None, TargetRef::Structure(StructureId::new()), Cell::new(9, 9))
            .blocked_by(wall, Cell::new(11, 10));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let job = breach_job_for_entry(&ctx, &entry, &mut rng).unwrap();
        assert!(job.targets_structure(wall));
        assert!(job.collide_with_agents);

        world.destroy_structure(wall);
        let ctx = DecisionContext::new(&agent, &world, &config, &hazard, BreachState::default());
        assert!(breach_job_for_entry(&ctx, &entry, &mut rng).is_none());
    }
}
