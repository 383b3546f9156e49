//! Path-risk cache: every entry left after a decision still points at
//! something alive, blocked by something standing

use killzone::cache::CachedPathEntry;
use killzone::core::types::{AgentId, Cell, FactionId, GroupId, StructureId};
use killzone::tactics::Job;
use killzone::world::{AgentState, Owner, Structure, StructureKind, WorldQuery};
use killzone::{EngineConfig, GridWorld, MapSession};
use proptest::prelude::*;

const RAIDERS: FactionId = FactionId(4);

/// Storage and a defender behind a solid wall line, raiders on the far side
fn walled_raid(raider_rows: &[i32]) -> (GridWorld, Vec<AgentId>, Vec<StructureId>) {
    let mut world = GridWorld::new(40, 30);
    let walls = world.add_wall_line(Cell::new(20, 0), Cell::new(20, 29));
    world.add_structure(Structure::new(StructureKind::Storage, Cell::new(30, 10), Owner::Defender));
    world.add_agent(AgentState::new(FactionId::DEFENDERS, Cell::new(32, 20)));

    let group = GroupId::new();
    let raiders = raider_rows
        .iter()
        .map(|&z| world.add_agent(AgentState::new(RAIDERS, Cell::new(4, z)).with_group(group)))
        .collect();
    (world, raiders, walls)
}

fn assert_sound(world: &GridWorld, entries: &[CachedPathEntry]) {
    for entry in entries {
        assert!(entry.target.is_active(world), "dead target kept: {:?}", entry.target);
        let owner = world.agent(entry.owner).expect("owner exists");
        assert!(!owner.downed, "downed owner kept");
        if let Some(id) = entry.blocking {
            let blocker = world.structure(id).expect("blocker exists");
            assert!(!blocker.destroyed, "destroyed blocker kept");
        }
    }
}

fn decide_all(session: &mut MapSession, world: &GridWorld, raiders: &[AgentId]) {
    for id in raiders {
        if let Some(snapshot) = world.agent(*id).cloned() {
            session.decide(&snapshot, world);
        }
    }
}

#[test]
fn test_breached_wall_is_forgotten() {
    let (mut world, raiders, _) = walled_raid(&[10, 12]);
    let mut session = MapSession::with_seed(40, 30, EngineConfig::default(), 21).unwrap();

    decide_all(&mut session, &world, &raiders);
    let blockers: Vec<StructureId> = session.cache().iter().filter_map(|e| e.blocking).collect();
    assert!(!blockers.is_empty());

    for id in &blockers {
        world.destroy_structure(*id);
    }
    decide_all(&mut session, &world, &raiders[..1]);

    assert!(session.cache().iter().all(|e| e.blocking.map_or(true, |b| !blockers.contains(&b))));
    let entries: Vec<CachedPathEntry> = session.cache().iter().cloned().collect();
    assert_sound(&world, &entries);
}

#[test]
fn test_invalidate_and_reset_clear_everything() {
    let (world, raiders, _) = walled_raid(&[10]);
    let mut session = MapSession::with_seed(40, 30, EngineConfig::default(), 22).unwrap();
    decide_all(&mut session, &world, &raiders);
    assert!(!session.cache().is_empty());

    session.invalidate_cache();
    assert!(session.cache().is_empty());
    assert!(session.cache().permits_discovery());

    decide_all(&mut session, &world, &raiders);
    session.reset();
    assert!(session.cache().is_empty());
}

#[test]
fn test_entries_for_downed_owner_are_pruned() {
    let (mut world, raiders, _) = walled_raid(&[8, 14]);
    let mut session = MapSession::with_seed(40, 30, EngineConfig::default(), 23).unwrap();
    decide_all(&mut session, &world, &raiders);

    world.agent_mut(raiders[0]).unwrap().downed = true;
    decide_all(&mut session, &world, &raiders[1..]);
    assert!(session.cache().iter().all(|e| e.owner != raiders[0]));
}

#[test]
fn test_target_claimed_by_another_group_is_forgotten() {
    let (mut world, raiders, _) = walled_raid(&[10, 12]);
    let mut session = MapSession::with_seed(40, 30, EngineConfig::default(), 24).unwrap();
    decide_all(&mut session, &world, &raiders);
    let claimed = session.cache().iter().next().map(|e| e.target).expect("a remembered path");

    let mut rival = AgentState::new(RAIDERS, Cell::new(4, 25)).with_group(GroupId::new());
    rival.current_job = Some(Job::attack_melee(claimed.as_job_target()));
    world.add_agent(rival);

    decide_all(&mut session, &world, &raiders);
    assert!(session.cache().iter().all(|e| e.target != claimed));
}

#[test]
fn test_own_group_claim_keeps_entry() {
    let (mut world, raiders, _) = walled_raid(&[10]);
    let mut session = MapSession::with_seed(40, 30, EngineConfig::default(), 25).unwrap();
    decide_all(&mut session, &world, &raiders);
    let entry = session.cache().iter().next().cloned().expect("a remembered path");

    let mut mate = AgentState::new(RAIDERS, Cell::new(4, 20));
    mate.group = entry.group;
    mate.current_job = Some(Job::attack_melee(entry.target.as_job_target()));
    world.add_agent(mate);

    assert!(!world.claimed_by_other_group(entry.target, entry.group, entry.owner));
    decide_all(&mut session, &world, &raiders);
    assert!(session.cache().iter().any(|e| e.target == entry.target));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_cache_sound_after_destruction(
        rows in prop::collection::vec(1i32..29, 1..4),
        destroyed in prop::collection::vec(0usize..30, 0..12),
        down_defender in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let (mut world, raiders, walls) = walled_raid(&rows);
        let mut session = MapSession::with_seed(40, 30, EngineConfig::default(), seed).unwrap();
        decide_all(&mut session, &world, &raiders);

        for index in destroyed {
            if let Some(id) = walls.get(index) {
                world.destroy_structure(*id);
            }
        }
        if down_defender {
            let defender = world
                .agents()
                .iter()
                .find(|a| a.is_defender())
                .map(|a| a.id)
                .unwrap();
            world.agent_mut(defender).unwrap().downed = true;
        }
        decide_all(&mut session, &world, &raiders[..1]);

        let entries: Vec<CachedPathEntry> = session.cache().iter().cloned().collect();
        for entry in &entries {
            prop_assert!(entry.target.is_active(&world));
            if let Some(id) = entry.blocking {
                prop_assert!(world.structure(id).map_or(false, |s| !s.destroyed));
            }
        }
    }
}
