//! Per-map arena owning everything shared between agents
//!
//! One `MapSession` lives as long as its map. The host drives it strictly
//! sequentially: one `decide` per agent per decision tick, no concurrent
//! calls. Nothing here is global; two maps are two sessions.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cache::PathRiskCache;
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{Cell, GroupId};
use crate::hazard::{veto_melee, HazardField, RebuildOutcome};
use crate::tactics::breach::BreachState;
use crate::tactics::engine;
use crate::tactics::job::Decision;
use crate::world::agent::AgentState;
use crate::world::query::{Battlefield, TraversalParams};

pub struct MapSession {
    pub(crate) config: EngineConfig,
    pub(crate) hazard: HazardField,
    pub(crate) cache: PathRiskCache,
    pub(crate) breach_states: AHashMap<GroupId, BreachState>,
    pub(crate) rng: ChaCha8Rng,
    /// The missing path service has been logged once already
    pub(crate) path_search_reported: bool,
}

impl MapSession {
    /// Session for a `width` x `height` map, seeded from entropy
    pub fn create_for_map(width: i32, height: i32, config: EngineConfig) -> Result<Self> {
        Self::build(width, height, config, ChaCha8Rng::from_entropy())
    }

    /// Reproducible session: same seed, same world, same decisions
    pub fn with_seed(width: i32, height: i32, config: EngineConfig, seed: u64) -> Result<Self> {
        Self::build(width, height, config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build(width: i32, height: i32, config: EngineConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Created session for {}x{} map", width, height);
        Ok(Self {
            config,
            hazard: HazardField::new(width, height),
            cache: PathRiskCache::new(),
            breach_states: AHashMap::new(),
            rng,
            path_search_reported: false,
        })
    }

    /// The assault restarted: forget paths, escalation and the last rebuild
    pub fn reset(&mut self) {
        self.cache.clear();
        self.hazard.reset();
        self.breach_states.clear();
        self.path_search_reported = false;
        tracing::debug!("Session reset");
    }

    /// Map unloaded
    pub fn destroy(self) {
        tracing::debug!(
            "Session destroyed with {} cached paths and {} breaching groups",
            self.cache.len(),
            self.breach_states.len()
        );
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    /// Request a hazard rebuild on the next refresh or decision
    pub fn mark_dirty(&mut self) {
        self.hazard.mark_dirty();
    }

    pub fn hazard_at(&self, cell: Cell) -> u8 {
        self.hazard.intensity_at(cell)
    }

    /// Rebuild now unless the cooldown says otherwise
    pub fn rebuild_hazard<B: Battlefield + ?Sized>(&mut self, battlefield: &B) -> RebuildOutcome {
        self.hazard.rebuild(battlefield, &self.config.hazard)
    }

    /// Rebuild only when something marked the field dirty
    pub fn refresh_hazard<B: Battlefield + ?Sized>(&mut self, battlefield: &B) -> RebuildOutcome {
        if !self.hazard.is_dirty() {
            return RebuildOutcome::Clean;
        }
        self.rebuild_hazard(battlefield)
    }

    /// One decision for `agent`; the snapshot should match what `battlefield` holds
    pub fn decide(&mut self, agent: &AgentState, battlefield: &dyn Battlefield) -> Decision {
        engine::decide(self, agent, battlefield)
    }

    /// Whether `agent` should call off a melee charge on `target_cell`
    pub fn veto_melee<B: Battlefield + ?Sized>(&self, battlefield: &B, agent: &AgentState, target_cell: Cell) -> bool {
        let params = TraversalParams::assault().with_max_cost(self.config.selection.max_path_cost);
        let reachable = battlefield.can_reach(agent.position, target_cell, &params);
        veto_melee(&self.hazard, agent.position, target_cell, reachable, &self.config.hazard)
    }

    pub fn breach_state(&self, group: GroupId) -> BreachState {
        self.breach_states.get(&group).copied().unwrap_or_default()
    }

    pub fn hazard(&self) -> &HazardField {
        &self.hazard
    }

    pub fn cache(&self) -> &PathRiskCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
