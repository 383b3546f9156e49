//! Headless Raid Runner
//!
//! Builds a small fortified compound, lets a raiding party decide and act
//! on every decision tick, and prints a JSON or text summary.

use std::path::PathBuf;

use ahash::AHashMap;
use clap::Parser;
use killzone::core::types::{AgentId, Cell, FactionId, GroupId};
use killzone::tactics::{Decision, Job, JobKind, JobTarget};
use killzone::world::{
    AgentState, Casualty, Owner, Structure, StructureKind, TerrainQuery, TraversalParams, Weapon,
    WorldQuery,
};
use killzone::{load_config, EngineConfig, GridWorld, MapSession};
use serde::Serialize;

/// Headless Raid Runner - raiders against a walled compound
#[derive(Parser, Debug)]
#[command(name = "raid_runner")]
#[command(about = "Run a scripted raid through the decision engine and report what the raiders did")]
struct Args {
    /// Map width in cells
    #[arg(long, default_value_t = 64)]
    map_width: i32,

    /// Map height in cells
    #[arg(long, default_value_t = 48)]
    map_height: i32,

    /// Simulation ticks to run
    #[arg(long, default_value_t = 1800)]
    ticks: u64,

    /// Ticks between two decision rounds
    #[arg(long, default_value_t = 30)]
    decision_interval: u64,

    /// Number of raiders
    #[arg(long, default_value_t = 6)]
    raiders: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Engine config (TOML); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every decision to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RaidResult {
    seed: u64,
    ticks: u64,
    decision_rounds: u64,
    decisions: AHashMap<String, usize>,
    jobs: AHashMap<String, usize>,
    structures_destroyed: usize,
    defenders_downed: usize,
    raiders_downed: usize,
    cached_paths: usize,
    peak_hazard: u8,
}

const RAIDER_FACTION: FactionId = FactionId(7);
const MELEE_DAMAGE: f32 = 40.0;
const AGENT_DAMAGE: f32 = 0.25;
const TURRET_DAMAGE: f32 = 0.1;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("killzone=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => load_config(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config '{}': {}", path.display(), e);
            eprintln!("Using default config");
            EngineConfig::default()
        }),
        None => EngineConfig::default(),
    };

    let mut world = build_compound(args.map_width, args.map_height);
    let group = GroupId::new();
    let raiders = spawn_raiders(&mut world, group, args.raiders);

    let mut session = match MapSession::with_seed(args.map_width, args.map_height, config, seed) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Raid started: {} raiders against {} structures on a {}x{} map",
        raiders.len(),
        world.structures().len(),
        args.map_width,
        args.map_height
    );

    let mut decisions: AHashMap<String, usize> = AHashMap::new();
    let mut jobs: AHashMap<String, usize> = AHashMap::new();
    let mut rounds = 0;
    let mut peak_hazard = 0;
    let interval = args.decision_interval.max(1);

    while world.now() < args.ticks {
        if world.now() % interval == 0 {
            rounds += 1;
            for &id in &raiders {
                let Some(snapshot) = world.agent(id).filter(|a| !a.downed).cloned() else {
                    continue;
                };
                let decision = session.decide(&snapshot, &world);
                if args.verbose {
                    eprintln!("[{}] {:?} at {}: {:?}", world.now(), id, snapshot.position, decision);
                }
                *decisions.entry(decision_label(&decision).to_string()).or_default() += 1;
                if let Decision::Assign(job) = &decision {
                    *jobs.entry(format!("{:?}", job.kind)).or_default() += 1;
                }
                apply_decision(&mut world, id, decision);
            }
        }

        if step_raiders(&mut world, &raiders) {
            session.mark_dirty();
        }
        if turrets_fire(&mut world) {
            session.mark_dirty();
        }
        peak_hazard = peak_hazard.max(max_hazard(&session, &world));
        world.advance(1);
    }

    let result = RaidResult {
        seed,
        ticks: world.now(),
        decision_rounds: rounds,
        decisions,
        jobs,
        structures_destroyed: world.structures().iter().filter(|s| s.destroyed).count(),
        defenders_downed: world
            .agents()
            .iter()
            .filter(|a| a.is_defender() && a.downed)
            .count(),
        raiders_downed: world
            .agents()
            .iter()
            .filter(|a| a.faction == RAIDER_FACTION && a.downed)
            .count(),
        cached_paths: session.cache().len(),
        peak_hazard,
    };
    session.destroy();

    match args.format.as_str() {
        "text" => print_text(&result),
        "json" => print_json(&result),
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            print_json(&result);
        }
    }
}

fn print_json(result: &RaidResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize result: {}", e),
    }
}

fn print_text(result: &RaidResult) {
    println!("Raid Result");
    println!("===========");
    println!("Ticks: {} ({} decision rounds)", result.ticks, result.decision_rounds);
    println!("Structures destroyed: {}", result.structures_destroyed);
    println!("Defenders downed: {}", result.defenders_downed);
    println!("Raiders downed: {}", result.raiders_downed);
    println!("Cached paths: {}", result.cached_paths);
    println!("Peak hazard: {}", result.peak_hazard);
    println!();
    println!("Decisions:");
    let mut decisions: Vec<_> = result.decisions.iter().collect();
    decisions.sort();
    for (label, count) in decisions {
        println!("  {:<12} {}", label, count);
    }
    println!("Jobs:");
    let mut jobs: Vec<_> = result.jobs.iter().collect();
    jobs.sort();
    for (kind, count) in jobs {
        println!("  {:<12} {}", kind, count);
    }
    println!();
    println!("Seed: {}", result.seed);
}

fn decision_label(decision: &Decision) -> &'static str {
    match decision {
        Decision::Assign(_) => "assign",
        Decision::KeepCurrent => "keep",
        Decision::Arrived => "arrived",
        Decision::Defer => "defer",
        Decision::Idle => "idle",
    }
}

/// Walled compound: storage and power inside, one door on the west side,
/// a turret on the north-east corner and traps in front of the door
fn build_compound(width: i32, height: i32) -> GridWorld {
    let mut world = GridWorld::new(width, height);
    let (x0, x1) = (width / 2, width / 2 + 14);
    let (z0, z1) = (height / 2 - 8, height / 2 + 8);
    let door = Cell::new(x0, height / 2);

    world.add_wall_line(Cell::new(x0, z0), Cell::new(x1, z0));
    world.add_wall_line(Cell::new(x0, z1), Cell::new(x1, z1));
    world.add_wall_line(Cell::new(x1, z0 + 1), Cell::new(x1, z1 - 1));
    world.add_wall_line(Cell::new(x0, z0 + 1), Cell::new(x0, door.z - 1));
    world.add_wall_line(Cell::new(x0, door.z + 1), Cell::new(x0, z1 - 1));
    world.add_structure(Structure::door(door));

    world.add_structure(Structure::new(
        StructureKind::Storage,
        Cell::new(x0 + 8, height / 2 - 3),
        Owner::Defender,
    ));
    world.add_structure(Structure::new(
        StructureKind::Power,
        Cell::new(x0 + 10, height / 2 + 3),
        Owner::Defender,
    ));
    world.add_structure(Structure::turret(Cell::new(x1 - 1, z0 + 1), Weapon::ranged(18.0, 6.0)));
    world.add_structure(Structure::trap(door - Cell::new(2, 0)));
    world.add_structure(Structure::trap(door - Cell::new(2, 1)));

    for (i, z) in [height / 2 - 2, height / 2 + 2].into_iter().enumerate() {
        let weapon = if i == 0 {
            Weapon::ranged(24.0, 5.0)
        } else {
            Weapon::melee(8.0)
        };
        world.add_agent(
            AgentState::new(FactionId::DEFENDERS, Cell::new(x0 + 4, z))
                .with_weapon(weapon)
                .holding(),
        );
    }
    world.add_agent(AgentState::new(FactionId::DEFENDERS, Cell::new(x0 + 9, height / 2)));

    for x in (x0 - 6)..(x0 - 3) {
        world.add_cover(Cell::new(x, height / 2 - 4));
    }
    world.add_casualty(Casualty {
        position: Cell::new(x0 - 5, height / 2 + 5),
        faction: RAIDER_FACTION,
        age_ticks: 600,
    });

    world
}

fn spawn_raiders(world: &mut GridWorld, group: GroupId, count: usize) -> Vec<AgentId> {
    let focus = Cell::new(world.width() / 2 - 4, world.height() / 2);
    (0..count)
        .map(|i| {
            let z = (world.height() / 2 - count as i32 + 2 * i as i32).clamp(0, world.height() - 1);
            let mut raider = AgentState::new(RAIDER_FACTION, Cell::new(2, z))
                .with_group(group)
                .with_duty_focus(focus);
            match i % 3 {
                0 => raider.armor_rating = 0.6,
                1 => raider.weapon = Some(Weapon::ranged(22.0, 4.0)),
                _ => raider.weapon = Some(Weapon::melee(6.0)),
            }
            raider.skills.melee = (i % 5) as u8;
            raider.skills.shooting = (i % 4) as u8;
            raider.disposition.timid = i % 4 == 3;
            world.add_agent(raider)
        })
        .collect()
}

fn apply_decision(world: &mut GridWorld, id: AgentId, decision: Decision) {
    let Some(agent) = world.agent_mut(id) else {
        return;
    };
    match decision {
        Decision::Assign(job) => agent.current_job = Some(job),
        Decision::Arrived => {
            agent.duty_focus = None;
            agent.current_job = None;
        }
        Decision::Idle | Decision::Defer => agent.current_job = None,
        Decision::KeepCurrent => {}
    }
}

fn target_cell(world: &GridWorld, target: JobTarget) -> Option<Cell> {
    match target {
        JobTarget::Cell(cell) => Some(cell),
        JobTarget::Agent(id) => world.agent(id).map(|a| a.position),
        JobTarget::Structure(id) => world.structure(id).filter(|s| !s.destroyed).map(|s| s.position),
    }
}

/// Move each raider one cell along its job, or act when already there.
/// Returns true when a structure fell or someone went down.
fn step_raiders(world: &mut GridWorld, raiders: &[AgentId]) -> bool {
    let mut changed = false;
    for &id in raiders {
        let Some(agent) = world.agent(id).filter(|a| !a.downed) else {
            continue;
        };
        let Some(job) = agent.current_job.clone() else {
            continue;
        };
        let position = agent.position;
        // Ranged breachers walk to their firing cell and shoot from there
        let goal = match job.target_b {
            Some(JobTarget::Cell(firing_cell)) if job.is_breach() => target_cell(world, job.target_a).map(|_| firing_cell),
            _ => target_cell(world, job.target_a),
        };
        let Some(goal) = goal else {
            if let Some(agent) = world.agent_mut(id) {
                agent.current_job = None;
            }
            continue;
        };

        let path = match world.find_path(position, goal, &TraversalParams::assault()) {
            Ok(path) if path.found => path,
            _ => continue,
        };
        if path.cells.len() > 1 && !(job.kind == JobKind::Follow && position.distance(goal) < 3.0) {
            let next = path.cells[1];
            if let Some(agent) = world.agent_mut(id) {
                agent.position = next;
            }
            continue;
        }

        changed |= act(world, id, &job);
    }
    changed
}

fn act(world: &mut GridWorld, id: AgentId, job: &Job) -> bool {
    match (job.kind, job.target_a) {
        (JobKind::AttackMelee | JobKind::Mine, JobTarget::Structure(target)) => {
            let Some(structure) = world.structure_mut(target) else {
                return false;
            };
            structure.hit_points -= MELEE_DAMAGE;
            if structure.hit_points <= 0.0 {
                world.destroy_structure(target);
                clear_job(world, id);
                return true;
            }
            false
        }
        (JobKind::AttackMelee, JobTarget::Agent(target)) => {
            let Some(victim) = world.agent_mut(target) else {
                return false;
            };
            victim.health -= AGENT_DAMAGE;
            if victim.health <= 0.0 && !victim.downed {
                victim.downed = true;
                clear_job(world, id);
                return true;
            }
            false
        }
        (JobKind::Goto | JobKind::Kidnap, _) => {
            clear_job(world, id);
            false
        }
        _ => false,
    }
}

fn clear_job(world: &mut GridWorld, id: AgentId) {
    if let Some(agent) = world.agent_mut(id) {
        agent.current_job = None;
    }
}

/// Ready turrets chip at every raider they can see
fn turrets_fire(world: &mut GridWorld) -> bool {
    let turrets: Vec<(Cell, f32)> = world
        .structures()
        .iter()
        .filter(|s| s.kind == StructureKind::Turret && !s.destroyed)
        .filter_map(|s| s.turret.map(|t| (s.position, t.weapon.range)))
        .collect();
    let targets: Vec<AgentId> = world
        .agents()
        .iter()
        .filter(|a| a.faction == RAIDER_FACTION && !a.downed)
        .filter(|a| {
            turrets.iter().any(|(at, range)| {
                at.distance(a.position) <= *range && world.has_line_of_sight(*at, a.position)
            })
        })
        .map(|a| a.id)
        .collect();

    let mut downed = false;
    for id in targets {
        if let Some(raider) = world.agent_mut(id) {
            raider.health -= TURRET_DAMAGE / 60.0;
            if raider.health <= 0.0 {
                raider.downed = true;
                downed = true;
            }
        }
    }
    if downed {
        let fallen: Vec<Casualty> = world
            .agents()
            .iter()
            .filter(|a| a.faction == RAIDER_FACTION && a.downed)
            .map(|a| Casualty {
                position: a.position,
                faction: a.faction,
                age_ticks: 0,
            })
            .collect();
        for casualty in fallen {
            if !world.casualties().iter().any(|c| c.position == casualty.position) {
                world.add_casualty(casualty);
            }
        }
    }
    downed
}

fn max_hazard(session: &MapSession, world: &GridWorld) -> u8 {
    let mut peak = 0;
    for x in 0..world.width() {
        for z in 0..world.height() {
            peak = peak.max(session.hazard_at(Cell::new(x, z)));
        }
    }
    peak
}
