//! Per-map danger intensity grid
//!
//! One byte per cell, saturating at 255. The grid is zeroed and recomputed
//! from the current threat sources on every rebuild, and read-only between
//! rebuilds.

use serde::{Deserialize, Serialize};

use crate::core::config::HazardConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{Cell, Tick};
use crate::hazard::sources::{collect_threat_sources, ThreatSource};
use crate::spatial::{cells_in_radius, points_on_line, radial_offsets};
use crate::world::query::Battlefield;

/// Ceiling every cell saturates at
pub const MAX_INTENSITY: u8 = u8::MAX;

/// What a rebuild request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildOutcome {
    /// The field was recomputed
    Rebuilt { sources: usize, skipped: usize },
    /// Inside the cooldown window; the field is untouched
    Throttled,
    /// Nothing was dirty
    Clean,
}

#[derive(Debug, Clone)]
pub struct HazardField {
    width: i32,
    height: i32,
    grid: Vec<u8>,
    /// Per-source pass marks so one sightline is never counted twice
    scratch: Vec<u8>,
    last_rebuild: Option<Tick>,
    dirty: bool,
}

impl HazardField {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            grid: vec![0; len],
            scratch: vec![0; len],
            last_rebuild: None,
            dirty: true,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.z < 0 || cell.x >= self.width || cell.z >= self.height {
            return None;
        }
        Some(cell.z as usize * self.width as usize + cell.x as usize)
    }

    /// Intensity at `cell`; cells off the map are clean
    pub fn intensity_at(&self, cell: Cell) -> u8 {
        self.index(cell).map_or(0, |i| self.grid[i])
    }

    /// Highest intensity within `radius` of `center`
    pub fn max_in_radius(&self, center: Cell, radius: f32) -> u8 {
        cells_in_radius(center, radius)
            .into_iter()
            .map(|c| self.intensity_at(c))
            .max()
            .unwrap_or(0)
    }

    /// Summed intensity along a run of cells
    pub fn sum_along(&self, cells: &[Cell]) -> u32 {
        cells.iter().map(|c| u32::from(self.intensity_at(*c))).sum()
    }

    /// Saturating add; out-of-bounds cells are ignored
    pub fn increment(&mut self, cell: Cell, amount: u32) {
        if let Some(i) = self.index(cell) {
            let current = u32::from(self.grid[i]);
            self.grid[i] = current.saturating_add(amount).min(u32::from(MAX_INTENSITY)) as u8;
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_rebuild(&self) -> Option<Tick> {
        self.last_rebuild
    }

    /// Whether the cooldown has elapsed since the previous rebuild
    pub fn cooldown_elapsed(&self, now: Tick, cooldown: Tick) -> bool {
        match self.last_rebuild {
            Some(last) => now.saturating_sub(last) >= cooldown,
            None => true,
        }
    }

    /// Forget everything, including the last rebuild time
    pub fn reset(&mut self) {
        self.grid.fill(0);
        self.scratch.fill(0);
        self.last_rebuild = None;
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.grid.fill(0);
    }

    /// Recompute the field from the world's current threat sources
    ///
    /// Inside the cooldown window this only clears the dirty flag.
    pub fn rebuild<B: Battlefield + ?Sized>(
        &mut self,
        battlefield: &B,
        config: &HazardConfig,
    ) -> RebuildOutcome {
        self.dirty = false;
        let now = battlefield.now();
        if !self.cooldown_elapsed(now, config.rebuild_cooldown_ticks) {
            tracing::debug!("Hazard rebuild throttled at tick {}", now);
            return RebuildOutcome::Throttled;
        }

        self.clear();
        let sources = collect_threat_sources(battlefield, config);
        let mut applied = 0;
        let mut skipped = 0;
        for source in &sources {
            match self.apply_source(battlefield, source, config) {
                Ok(_) => applied += 1,
                Err(e) => {
                    tracing::warn!("Skipping threat source: {}", e);
                    skipped += 1;
                }
            }
        }

        self.last_rebuild = Some(now);
        tracing::debug!(
            "Hazard field rebuilt at tick {}: {} sources, {} skipped",
            now,
            applied,
            skipped
        );
        RebuildOutcome::Rebuilt {
            sources: applied,
            skipped,
        }
    }

    /// Paint one source into the field, returning the number of cells marked
    pub fn apply_source<B: Battlefield + ?Sized>(
        &mut self,
        battlefield: &B,
        source: &ThreatSource,
        config: &HazardConfig,
    ) -> Result<usize> {
        source.validate()?;
        let origin = source.position();
        if self.index(origin).is_none() {
            return Err(EngineError::MalformedThreatSource(format!(
                "origin {} is off the map",
                origin
            )));
        }

        let marked = match *source {
            ThreatSource::ExposedCasualty { position, weight } => {
                self.paint_blob(battlefield, position, config.blob_radius, weight)
            }
            ThreatSource::DownedCombatant { position } | ThreatSource::MeleeGuard { position } => {
                self.paint_blob(battlefield, position, config.blob_radius, config.los_cost)
            }
            ThreatSource::AimingRangedUnit {
                position,
                range,
                min_range,
            }
            | ThreatSource::ActiveDefensiveStructure {
                position,
                range,
                min_range,
            } => self.sweep_sightlines(battlefield, position, range, min_range, config.los_cost),
        };
        Ok(marked)
    }

    /// Small blob around a position; only cells still clean are marked
    fn paint_blob<B: Battlefield + ?Sized>(
        &mut self,
        battlefield: &B,
        center: Cell,
        radius: f32,
        amount: u32,
    ) -> usize {
        let mut marked = 0;
        for cell in cells_in_radius(center, radius) {
            if battlefield.in_bounds(cell)
                && battlefield.walkable(cell)
                && self.intensity_at(cell) == 0
            {
                self.increment(cell, amount);
                marked += 1;
            }
        }
        marked
    }

    /// Every cell visible from `origin` within range, outermost rings first
    fn sweep_sightlines<B: Battlefield + ?Sized>(
        &mut self,
        battlefield: &B,
        origin: Cell,
        range: f32,
        min_range: f32,
        amount: u32,
    ) -> usize {
        self.scratch.fill(0);
        let min_range_squared = (min_range * min_range) as i32;
        let mut marked = 0;

        for offset in radial_offsets(range).into_iter().rev() {
            let squared = offset.x * offset.x + offset.z * offset.z;
            if squared == 0 || (min_range >= 1.0 && squared <= min_range_squared) {
                continue;
            }
            let target = origin + offset;
            let Some(index) = self.index(target) else {
                continue;
            };
            if !battlefield.walkable(target)
                || self.scratch[index] != 0
                || !battlefield.has_line_of_sight(origin, target)
            {
                continue;
            }

            // The shooter's own cell is not a sightline
            for cell in points_on_line(origin, target).into_iter().skip(1) {
                let Some(i) = self.index(cell) else {
                    continue;
                };
                if self.scratch[i] != 0 || !battlefield.walkable(cell) {
                    continue;
                }
                self.scratch[i] = 1;
                self.increment(cell, amount);
                marked += 1;
            }
        }
        marked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FactionId;
    use crate::world::agent::{AgentState, Weapon};
    use crate::world::query::Casualty;
    use crate::world::structure::Structure;
    use crate::world::GridWorld;

    #[test]
    fn test_increment_saturates() {
        let mut field = HazardField::new(4, 4);
        let cell = Cell::new(1, 1);
        field.increment(cell, 200);
        field.increment(cell, 200);
        assert_eq!(field.intensity_at(cell), MAX_INTENSITY);
        field.increment(cell, u32::MAX);
        assert_eq!(field.intensity_at(cell), MAX_INTENSITY);
    }

    #[test]
    fn test_out_of_bounds_is_clean() {
        let mut field = HazardField::new(4, 4);
        field.increment(Cell::new(-1, 2), 10);
        field.increment(Cell::new(4, 0), 10);
        assert_eq!(field.intensity_at(Cell::new(-1, 2)), 0);
        assert_eq!(field.intensity_at(Cell::new(4, 0)), 0);
    }

    #[test]
    fn test_casualty_blob_clips_to_ceiling() {
        let mut world = GridWorld::new(20, 20);
        world.add_casualty(Casualty {
            position: Cell::new(10, 10),
            faction: FactionId(7),
            age_ticks: 1200,
        });
        let config = HazardConfig::default();
        let mut field = HazardField::new(20, 20);

        let outcome = field.rebuild(&world, &config);
        assert_eq!(
            outcome,
            RebuildOutcome::Rebuilt {
                sources: 1,
                skipped: 0
            }
        );
        assert_eq!(field.intensity_at(Cell::new(10, 10)), 255);
        assert_eq!(field.intensity_at(Cell::new(11, 10)), 255);
        assert_eq!(field.intensity_at(Cell::new(11, 11)), 0);
        assert_eq!(field.intensity_at(Cell::new(13, 10)), 0);
    }

    #[test]
    fn test_turret_sweep_stops_at_walls() {
        let mut world = GridWorld::new(30, 30);
        world.add_structure(Structure::turret(Cell::new(5, 15), Weapon::ranged(10.0, 3.0)));
        world.add_wall_line(Cell::new(8, 10), Cell::new(8, 20));
        let config = HazardConfig::default();
        let mut field = HazardField::new(30, 30);

        field.rebuild(&world, &config);
        assert!(field.intensity_at(Cell::new(7, 15)) > 0);
        assert_eq!(field.intensity_at(Cell::new(10, 15)), 0);
        // Out of range
        assert_eq!(field.intensity_at(Cell::new(5, 27)), 0);
        // Inside range on the open side
        assert!(field.intensity_at(Cell::new(5, 8)) > 0);
    }

    #[test]
    fn test_each_sightline_cell_counted_once_per_source() {
        let mut world = GridWorld::new(30, 30);
        world.add_structure(Structure::turret(Cell::new(15, 15), Weapon::ranged(8.0, 3.0)));
        let config = HazardConfig::default();
        let mut field = HazardField::new(30, 30);

        field.rebuild(&world, &config);
        let expected = config.los_cost.min(255) as u8;
        assert_eq!(field.intensity_at(Cell::new(18, 15)), expected);
        assert_eq!(field.intensity_at(Cell::new(15, 20)), expected);
    }

    #[test]
    fn test_shooter_cell_stays_clean() {
        let mut world = GridWorld::new(20, 20);
        let mut carbine = Weapon::ranged(6.0, 3.0);
        carbine.min_range = 0.5;
        world.add_agent(
            AgentState::new(FactionId::DEFENDERS, Cell::new(10, 10))
                .with_weapon(carbine)
                .holding(),
        );
        let mut field = HazardField::new(20, 20);

        field.rebuild(&world, &HazardConfig::default());
        assert_eq!(field.intensity_at(Cell::new(10, 10)), 0);
        assert!(field.intensity_at(Cell::new(11, 10)) > 0);
        assert!(field.intensity_at(Cell::new(10, 15)) > 0);
    }

    #[test]
    fn test_min_range_leaves_inner_ring_for_outer_lines() {
        let mut world = GridWorld::new(30, 30);
        let mut mortar = Weapon::ranged(10.0, 3.0);
        mortar.min_range = 4.0;
        world.add_structure(Structure::turret(Cell::new(15, 15), mortar));
        let mut field = HazardField::new(30, 30);

        field.rebuild(&world, &HazardConfig::default());
        // Outer target marked
        assert!(field.intensity_at(Cell::new(15, 24)) > 0);
        // Beyond range nothing
        assert_eq!(field.intensity_at(Cell::new(15, 27)), 0);
    }

    #[test]
    fn test_rebuild_is_throttled() {
        let mut world = GridWorld::new(20, 20);
        let config = HazardConfig::default();
        let mut field = HazardField::new(20, 20);

        assert!(matches!(
            field.rebuild(&world, &config),
            RebuildOutcome::Rebuilt { .. }
        ));

        world.add_structure(Structure::turret(Cell::new(5, 5), Weapon::ranged(10.0, 3.0)));
        world.advance(config.rebuild_cooldown_ticks - 1);
        field.mark_dirty();
        assert_eq!(field.rebuild(&world, &config), RebuildOutcome::Throttled);
        assert!(!field.is_dirty());
        assert_eq!(field.intensity_at(Cell::new(6, 5)), 0);

        world.advance(1);
        assert!(matches!(
            field.rebuild(&world, &config),
            RebuildOutcome::Rebuilt { sources: 1, .. }
        ));
        assert!(field.intensity_at(Cell::new(6, 5)) > 0);
    }

    #[test]
    fn test_malformed_source_is_skipped() {
        let mut world = GridWorld::new(20, 20);
        world.add_structure(Structure::turret(Cell::new(5, 5), Weapon::ranged(f32::NAN, 3.0)));
        world.add_structure(Structure::turret(Cell::new(15, 15), Weapon::ranged(5.0, 3.0)));
        let mut field = HazardField::new(20, 20);

        let outcome = field.rebuild(&world, &HazardConfig::default());
        assert_eq!(
            outcome,
            RebuildOutcome::Rebuilt {
                sources: 1,
                skipped: 1
            }
        );
        assert!(field.intensity_at(Cell::new(16, 15)) > 0);
    }

    #[test]
    fn test_reset_forgets_last_rebuild() {
        let world = GridWorld::new(10, 10);
        let config = HazardConfig::default();
        let mut field = HazardField::new(10, 10);
        field.rebuild(&world, &config);
        assert_eq!(field.last_rebuild(), Some(0));

        field.reset();
        assert_eq!(field.last_rebuild(), None);
        assert!(field.is_dirty());
        assert!(matches!(
            field.rebuild(&world, &config),
            RebuildOutcome::Rebuilt { .. }
        ));
    }

    #[test]
    fn test_area_queries() {
        let mut field = HazardField::new(10, 10);
        field.increment(Cell::new(3, 3), 40);
        field.increment(Cell::new(4, 3), 10);
        assert_eq!(field.max_in_radius(Cell::new(4, 4), 1.5), 40);
        assert_eq!(
            field.sum_along(&[Cell::new(3, 3), Cell::new(4, 3), Cell::new(5, 3)]),
            50
        );
    }
}
