//! Scored candidate jobs collected during one decision

use ordered_float::OrderedFloat;

use crate::cache::CachedPathEntry;
use crate::core::error::EngineError;
use crate::core::types::StructureId;
use crate::tactics::job::Job;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub job: Job,
    pub score: f32,
    pub rationale: String,
}

/// Everything the strategies produced for one agent in one call
///
/// Also carries the path facts found along the way, which the driver writes
/// back into the shared cache once generation is done.
#[derive(Debug, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    discoveries: Vec<CachedPathEntry>,
    saw_obstruction: bool,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Add a candidate; one with a non-finite score is logged and dropped
    pub fn offer(&mut self, job: Job, score: f32, rationale: impl Into<String>) -> bool {
        let rationale = rationale.into();
        if !score.is_finite() {
            let error = EngineError::MalformedCandidate(format!("{} scored {}", rationale, score));
            tracing::warn!("Skipping candidate: {}", error);
            return false;
        }
        self.candidates.push(Candidate {
            job,
            score,
            rationale,
        });
        true
    }

    pub fn remember(&mut self, entry: CachedPathEntry) {
        self.discoveries.push(entry);
    }

    pub fn take_discoveries(&mut self) -> Vec<CachedPathEntry> {
        std::mem::take(&mut self.discoveries)
    }

    /// A lateral route ran into a wall, door or rock
    pub fn note_obstruction(&mut self) {
        self.saw_obstruction = true;
    }

    pub fn saw_obstruction(&self) -> bool {
        self.saw_obstruction
    }

    /// Some candidate already works on this structure
    pub fn targets_structure(&self, id: StructureId) -> bool {
        self.candidates.iter().any(|c| c.job.targets_structure(id))
    }

    pub fn has_breach(&self) -> bool {
        self.candidates.iter().any(|c| c.job.is_breach())
    }

    /// Multiply every score by the agent's trait weight
    pub fn apply_weight(&mut self, weight: f32) {
        for candidate in &mut self.candidates {
            candidate.score *= weight;
        }
    }

    /// Highest score strictly above `floor`; ties go to the earliest offered
    pub fn best_above(&self, floor: f32) -> Option<&Candidate> {
        self.candidates
            .iter()
            .rev()
            .filter(|c| c.score > floor)
            .max_by_key(|c| OrderedFloat(c.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Cell;
    use crate::tactics::job::JobTarget;

    #[test]
    fn test_best_above_floor() {
        let mut pool = CandidatePool::new();
        pool.offer(Job::goto(Cell::new(1, 1)), -80.0, "too risky");
        pool.offer(Job::goto(Cell::new(2, 2)), 3.0, "ok");
        pool.offer(Job::goto(Cell::new(3, 3)), 12.5, "best");

        let best = pool.best_above(-50.0).unwrap();
        assert_eq!(best.rationale, "best");
    }

    #[test]
    fn test_nothing_above_floor() {
        let mut pool = CandidatePool::new();
        pool.offer(Job::goto(Cell::new(1, 1)), -50.0, "at floor");
        pool.offer(Job::goto(Cell::new(2, 1)), -120.0, "below");
        assert!(pool.best_above(-50.0).is_none());
    }

    #[test]
    fn test_ties_keep_first() {
        let mut pool = CandidatePool::new();
        pool.offer(Job::goto(Cell::new(1, 1)), 2.0, "first");
        pool.offer(Job::goto(Cell::new(2, 1)), 2.0, "second");
        assert_eq!(pool.best_above(-50.0).unwrap().rationale, "first");
    }

    #[test]
    fn test_non_finite_scores_are_dropped() {
        let mut pool = CandidatePool::new();
        assert!(!pool.offer(Job::goto(Cell::new(1, 1)), f32::NAN, "nan"));
        assert!(!pool.offer(Job::goto(Cell::new(1, 1)), f32::INFINITY, "inf"));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_weight_scales_scores() {
        let mut pool = CandidatePool::new();
        pool.offer(Job::goto(Cell::new(1, 1)), 10.0, "a");
        pool.apply_weight(0.5);
        assert_eq!(pool.iter().next().unwrap().score, 5.0);
    }

    #[test]
    fn test_structure_targeting() {
        let wall = StructureId::new();
        let mut pool = CandidatePool::new();
        assert!(!pool.has_breach());
        pool.offer(Job::attack_melee(JobTarget::Structure(wall)), 1.0, "hit wall");
        assert!(pool.targets_structure(wall));
        assert!(pool.has_breach());
    }
}
