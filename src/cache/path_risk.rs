//! Cross-agent memory of blocked attack paths
//!
//! Entries are pruned at the start of every decision and cleared when the
//! assault resets. Removing anything re-opens target discovery.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Cell, GroupId, StructureId};
use crate::world::query::TargetRef;

/// One remembered path fact: who wanted what, and what stood in the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPathEntry {
    pub owner: AgentId,
    pub group: Option<GroupId>,
    pub target: TargetRef,
    pub blocking: Option<StructureId>,
    /// Standing cell in front of the obstacle (or next to the target)
    pub cell_before: Cell,
    pub cell_after: Cell,
    /// Obstacles ruled out for this path
    pub exclusions: Vec<StructureId>,
}

impl CachedPathEntry {
    pub fn new(owner: AgentId, group: Option<GroupId>, target: TargetRef, cell_before: Cell) -> Self {
        Self {
            owner,
            group,
            target,
            blocking: None,
            cell_before,
            cell_after: cell_before,
            exclusions: Vec::new(),
        }
    }

    pub fn blocked_by(mut self, obstacle: StructureId, cell_after: Cell) -> Self {
        self.blocking = Some(obstacle);
        self.cell_after = cell_after;
        self
    }

    fn key(&self) -> (Option<GroupId>, TargetRef, Option<StructureId>) {
        (self.group, self.target, self.blocking)
    }
}

#[derive(Debug, Clone)]
pub struct PathRiskCache {
    entries: Vec<CachedPathEntry>,
    permit_discovery: bool,
    trimmed_this_cycle: bool,
}

impl Default for PathRiskCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRiskCache {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            permit_discovery: true,
            trimmed_this_cycle: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedPathEntry> {
        self.entries.iter()
    }

    /// Drop every entry failing `is_valid`; returns how many went
    pub fn prune<F>(&mut self, mut is_valid: F) -> usize
    where
        F: FnMut(&CachedPathEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|entry| is_valid(entry));
        let removed = before - self.entries.len();
        self.trimmed_this_cycle = removed > 0;
        if removed > 0 {
            self.permit_discovery = true;
        }
        removed
    }

    pub fn find<F>(&self, selector: F) -> Option<&CachedPathEntry>
    where
        F: Fn(&CachedPathEntry) -> bool,
    {
        self.entries.iter().find(|entry| selector(entry))
    }

    /// Matching entry whose `cell_before` is closest to `from`
    pub fn nearest<F>(&self, from: Cell, selector: F) -> Option<&CachedPathEntry>
    where
        F: Fn(&CachedPathEntry) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| selector(entry))
            .min_by_key(|entry| OrderedFloat(entry.cell_before.distance(from)))
    }

    /// Insert, replacing any entry for the same group, target and obstacle
    pub fn insert(&mut self, entry: CachedPathEntry) {
        let key = entry.key();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.key() == key) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn remembers(&self, target: TargetRef) -> bool {
        self.entries.iter().any(|entry| entry.target == target)
    }

    /// Forget everything; discovery is allowed again
    pub fn clear(&mut self) {
        self.entries.clear();
        self.permit_discovery = true;
        self.trimmed_this_cycle = false;
    }

    pub fn permits_discovery(&self) -> bool {
        self.permit_discovery
    }

    /// Nothing left worth discovering until a prune frees something
    pub fn suppress_discovery(&mut self) {
        self.permit_discovery = false;
    }

    pub fn trimmed_this_cycle(&self) -> bool {
        self.trimmed_this_cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(at: Cell) -> CachedPathEntry {
        CachedPathEntry::new(
            AgentId::new(),
            None,
            TargetRef::Structure(StructureId::new()),
            at,
        )
    }

    #[test]
    fn test_prune_reopens_discovery() {
        let mut cache = PathRiskCache::new();
        cache.insert(entry(Cell::new(1, 1)));
        cache.insert(entry(Cell::new(5, 5)));
        cache.suppress_discovery();

        let removed = cache.prune(|e| e.cell_before.x > 2);
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.trimmed_this_cycle());
        assert!(cache.permits_discovery());
    }

    #[test]
    fn test_prune_without_removal_keeps_flags() {
        let mut cache = PathRiskCache::new();
        cache.insert(entry(Cell::new(1, 1)));
        cache.suppress_discovery();

        assert_eq!(cache.prune(|_| true), 0);
        assert!(!cache.trimmed_this_cycle());
        assert!(!cache.permits_discovery());
    }

    #[test]
    fn test_nearest_first() {
        let mut cache = PathRiskCache::new();
        cache.insert(entry(Cell::new(10, 10)));
        cache.insert(entry(Cell::new(2, 3)));
        cache.insert(entry(Cell::new(6, 6)));

        let nearest = cache.nearest(Cell::new(0, 0), |_| true).unwrap();
        assert_eq!(nearest.cell_before, Cell::new(2, 3));

        let far = cache
            .nearest(Cell::new(0, 0), |e| e.cell_before.x > 5)
            .unwrap();
        assert_eq!(far.cell_before, Cell::new(6, 6));
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut cache = PathRiskCache::new();
        let first = entry(Cell::new(1, 1));
        let mut second = first.clone();
        second.cell_before = Cell::new(2, 2);

        cache.insert(first);
        cache.insert(second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.iter().next().unwrap().cell_before, Cell::new(2, 2));
    }

    #[test]
    fn test_clear() {
        let mut cache = PathRiskCache::new();
        let remembered = entry(Cell::new(1, 1));
        let target = remembered.target;
        cache.insert(remembered);
        assert!(cache.remembers(target));
        cache.suppress_discovery();

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.permits_discovery());
        assert!(!cache.remembers(target));
    }
}
