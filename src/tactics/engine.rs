//! The per-agent decision driver
//!
//! One call runs the whole pipeline for a single agent: hazard refresh,
//! arrival check, cache pruning, candidate generation, trait weighting,
//! selection and the fallback chain. Collaborator failures degrade to
//! `Decision::Defer`; anything else that goes wrong inside one strategy
//! only costs that strategy's candidates.

use rand::Rng;

use crate::cache::{CachedPathEntry, PathRiskCache};
use crate::core::config::SelectionConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::Cell;
use crate::session::MapSession;
use crate::spatial::points_on_line;
use crate::tactics::candidate::CandidatePool;
use crate::tactics::context::DecisionContext;
use crate::tactics::job::{Decision, Job};
use crate::tactics::obstacle::breach_job_for_entry;
use crate::tactics::targets::{attack_targets, high_value_targets};
use crate::tactics::wander::safe_wander;
use crate::tactics::weighting::trait_weight;
use crate::tactics::{approach, breaking, formation, killzone};
use crate::world::agent::AgentState;
use crate::world::query::{Battlefield, TargetRef, TerrainQuery, WorldQuery};

pub(crate) fn decide(session: &mut MapSession, agent: &AgentState, battlefield: &dyn Battlefield) -> Decision {
    let MapSession {
        config,
        hazard,
        cache,
        breach_states,
        rng,
        path_search_reported,
    } = session;
    let selection = &config.selection;

    if hazard.is_dirty() {
        hazard.rebuild(battlefield, &config.hazard);
    }

    if let Some(focus) = agent.duty_focus {
        if arrived(battlefield, agent.position, focus, selection) {
            tracing::debug!("Agent {:?} arrived at duty focus {}", agent.id, focus);
            return Decision::Arrived;
        }
    }

    let trimmed = cache.prune(|entry| entry_is_valid(battlefield, entry, selection.region_hops));
    if trimmed > 0 {
        tracing::debug!("Trimmed {} stale path entries, {} left", trimmed, cache.len());
    }

    let breach = agent
        .group
        .and_then(|group| breach_states.get(&group).copied())
        .unwrap_or_default();
    let ctx = DecisionContext::new(agent, battlefield, config, hazard, breach);

    let mut pool = CandidatePool::new();
    if let Err(e) = generate_candidates(&ctx, &mut pool) {
        report_unavailable(path_search_reported, &e);
        return Decision::Defer;
    }

    for entry in pool.take_discoveries() {
        if entry_is_valid(battlefield, &entry, selection.region_hops) {
            cache.insert(entry);
        }
    }

    if let Some(group) = agent.group {
        if pool.saw_obstruction() && !pool.has_breach() {
            let state = breach_states.entry(group).or_default();
            if state.escalate() {
                tracing::debug!("Group {:?} escalated breach rules: {:?}", group, state);
            }
        }
    }

    pool.apply_weight(trait_weight(agent, selection));

    let chosen = match pool.best_above(selection.score_floor) {
        Some(best) => {
            tracing::debug!(
                "Agent {:?} chose '{}' ({:.2}) from {} candidates",
                agent.id,
                best.rationale,
                best.score,
                pool.len()
            );
            Some(best.job.clone())
        }
        None => match fallback(&ctx, cache, rng) {
            Ok(job) => job,
            Err(e @ EngineError::CollaboratorUnavailable(_)) => {
                report_unavailable(path_search_reported, &e);
                return Decision::Defer;
            }
            Err(e) => {
                tracing::warn!("Fallback failed for agent {:?}: {}", agent.id, e);
                None
            }
        },
    };

    let job = match chosen {
        Some(job) if agent.current_job.as_ref().map_or(false, |current| current.same_assignment(&job)) => {
            tracing::debug!("Agent {:?} keeps its current {:?} job", agent.id, job.kind);
            return Decision::KeepCurrent;
        }
        Some(job) => job,
        None => match safe_wander(&ctx, rng) {
            Some(job) => job,
            None => return Decision::Idle,
        },
    };

    let job = match job.expiry_ticks {
        Some(_) => job,
        None => {
            let ticks = rng.gen_range(selection.expiry_min..=selection.expiry_max);
            job.with_expiry(ticks)
        }
    };
    Decision::Assign(job)
}

/// Close to the duty focus and in the same part of the map
fn arrived<T: TerrainQuery + ?Sized>(terrain: &T, origin: Cell, focus: Cell, selection: &SelectionConfig) -> bool {
    terrain.in_bounds(focus)
        && origin.distance_squared(focus) < selection.arrival_distance_squared
        && terrain.same_region(origin, focus, selection.region_hops)
}

/// Target alive and unclaimed, owner standing, blocker still up and still reachable
pub(crate) fn entry_is_valid<B: Battlefield + ?Sized>(battlefield: &B, entry: &CachedPathEntry, region_hops: u32) -> bool {
    if !entry.target.is_active(battlefield) {
        return false;
    }
    if battlefield.claimed_by_other_group(entry.target, entry.group, entry.owner) {
        return false;
    }
    let Some(owner) = battlefield.agent(entry.owner).filter(|a| !a.downed) else {
        return false;
    };
    if let Some(id) = entry.blocking {
        if !battlefield.structure(id).map_or(false, |s| s.is_standing()) {
            return false;
        }
    }
    battlefield.same_region(owner.position, entry.cell_before, region_hops)
}

fn report_unavailable(reported: &mut bool, error: &EngineError) {
    if !*reported {
        tracing::error!("Deferring to default behavior: {}", error);
        *reported = true;
    }
}

fn generate_candidates(ctx: &DecisionContext, pool: &mut CandidatePool) -> Result<()> {
    if let Some(focus) = ctx.agent.duty_focus {
        if ctx.battlefield.in_bounds(focus) && focus != ctx.origin() {
            pool.offer(
                Job::goto(focus),
                ctx.config.selection.duty_focus_score,
                format!("Head for duty focus {}", focus),
            );
        }
    }

    let targets = high_value_targets(ctx.battlefield);
    isolate("approach", approach::generate(ctx, &targets, pool))?;
    isolate("breaking", breaking::generate(ctx, &targets, pool))?;
    killzone::generate(ctx, pool);
    formation::generate(ctx, pool);
    Ok(())
}

/// Keep a missing collaborator fatal for the call, swallow everything else
fn isolate(strategy: &str, outcome: Result<()>) -> Result<()> {
    match outcome {
        Err(e @ EngineError::CollaboratorUnavailable(_)) => Err(e),
        Err(e) => {
            tracing::warn!("Dropped {} candidates: {}", strategy, e);
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

/// Nothing scored above the floor: sap a remembered path, follow a breacher, or wander
fn fallback<R: Rng>(ctx: &DecisionContext, cache: &mut PathRiskCache, rng: &mut R) -> Result<Option<Job>> {
    let world = ctx.battlefield;
    let agent = ctx.agent;
    let mut result = safe_wander(ctx, rng);

    let remembered = cache
        .nearest(agent.position, |entry| {
            entry.group == agent.group
                && entry
                    .blocking
                    .map_or(true, |id| !world.reserved_by_other(id, agent.id))
        })
        .cloned();
    let memory = match remembered {
        Some(entry) => Some(entry),
        None => discover(ctx, cache)?,
    };

    match memory {
        Some(entry) => {
            if let Some(job) = breach_job_for_entry(ctx, &entry, rng) {
                tracing::debug!("Agent {:?} saps remembered path to {:?}", agent.id, entry.target);
                result = Some(job);
            }
        }
        None => {
            if let Some(job) = follow_breacher(ctx) {
                result = Some(job);
            }
        }
    }

    Ok(result)
}

/// Look for a path to the nearest attack target nobody remembers yet
fn discover(ctx: &DecisionContext, cache: &mut PathRiskCache) -> Result<Option<CachedPathEntry>> {
    let agent = ctx.agent;
    let origin = ctx.origin();

    let target = attack_targets(ctx.battlefield)
        .into_iter()
        .filter(|(target, _)| !cache.remembers(*target))
        .min_by_key(|(_, cell)| cell.distance_squared(origin));
    let Some((target, cell)) = target else {
        cache.suppress_discovery();
        return Ok(None);
    };
    if !cache.permits_discovery() || cache.len() >= ctx.config.selection.max_sappers {
        return Ok(None);
    }

    let path = ctx.path_to(cell)?;
    let entry = if path.found {
        CachedPathEntry::new(agent.id, agent.group, target, path.last_cell().unwrap_or(origin))
    } else {
        match blocker_on_line(ctx, target, cell) {
            Some(entry) => entry,
            None => return Ok(None),
        }
    };

    if !entry_is_valid(ctx.battlefield, &entry, ctx.config.selection.region_hops) {
        return Ok(None);
    }
    tracing::debug!(
        "Discovered path to {:?} at {} (blocked: {})",
        target,
        cell,
        entry.blocking.is_some()
    );
    cache.insert(entry.clone());
    Ok(Some(entry))
}

/// First breachable, untrapped structure on the straight line to `goal`
///
/// Trapped candidates are recorded as exclusions on the returned entry.
fn blocker_on_line(ctx: &DecisionContext, target: TargetRef, goal: Cell) -> Option<CachedPathEntry> {
    let world = ctx.battlefield;
    let origin = ctx.origin();
    let line = points_on_line(origin, goal);
    let mut exclusions = Vec::new();

    for (index, cell) in line.iter().enumerate() {
        if !world.in_bounds(*cell) {
            continue;
        }
        for structure in world.structures_at(*cell) {
            if !ctx.breach.breach_blocks(structure) || exclusions.contains(&structure.id) {
                continue;
            }
            if ctx.trap_near(structure.position) {
                exclusions.push(structure.id);
                continue;
            }
            let before = index.checked_sub(1).map_or(origin, |i| line[i]);
            let after = line.get(index + 1).copied().unwrap_or(goal);
            let mut entry = CachedPathEntry::new(ctx.agent.id, ctx.agent.group, target, before)
                .blocked_by(structure.id, after);
            entry.exclusions = exclusions;
            return Some(entry);
        }
    }
    None
}

/// Tag along behind the nearest ally already breaking something
fn follow_breacher(ctx: &DecisionContext) -> Option<Job> {
    let agent = ctx.agent;
    let origin = ctx.origin();
    let breacher = ctx
        .battlefield
        .agents()
        .iter()
        .filter(|a| {
            a.id != agent.id
                && a.faction == agent.faction
                && !a.downed
                && a.current_job.as_ref().map_or(false, Job::is_breach)
        })
        .min_by_key(|a| a.position.distance_squared(origin))?;

    if breacher.position.distance(origin) < ctx.config.selection.follow_min_distance {
        return None;
    }
    Some(Job::follow(breacher.id))
}
