//! Job recommendations handed back to the host

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Cell, StructureId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    Goto,
    AttackMelee,
    Mine,
    Follow,
    Kidnap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobTarget {
    Cell(Cell),
    Agent(AgentId),
    Structure(StructureId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[default]
    Normal,
    Amble,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub kind: JobKind,
    pub target_a: JobTarget,
    pub target_b: Option<JobTarget>,
    /// Ticks until the host re-plans; None until the engine fills it in
    pub expiry_ticks: Option<u32>,
    pub urgency: Urgency,
    pub collide_with_agents: bool,
    pub expire_requires_enemies_nearby: bool,
}

impl Job {
    pub fn new(kind: JobKind, target_a: JobTarget) -> Self {
        Self {
            kind,
            target_a,
            target_b: None,
            expiry_ticks: None,
            urgency: Urgency::Normal,
            collide_with_agents: false,
            expire_requires_enemies_nearby: false,
        }
    }

    pub fn goto(cell: Cell) -> Self {
        Self::new(JobKind::Goto, JobTarget::Cell(cell))
    }

    pub fn attack_melee(target: JobTarget) -> Self {
        Self::new(JobKind::AttackMelee, target)
    }

    pub fn mine(structure: StructureId) -> Self {
        Self::new(JobKind::Mine, JobTarget::Structure(structure))
    }

    pub fn follow(agent: AgentId) -> Self {
        Self::new(JobKind::Follow, JobTarget::Agent(agent))
    }

    pub fn kidnap(agent: AgentId) -> Self {
        Self::new(JobKind::Kidnap, JobTarget::Agent(agent))
    }

    pub fn with_expiry(mut self, ticks: u32) -> Self {
        self.expiry_ticks = Some(ticks);
        self
    }

    pub fn ambling(mut self) -> Self {
        self.urgency = Urgency::Amble;
        self
    }

    /// Same kind aimed at the same targets
    pub fn same_assignment(&self, other: &Job) -> bool {
        self.kind == other.kind && self.target_a == other.target_a && self.target_b == other.target_b
    }

    /// Works on a structure (mining or melee on a building)
    pub fn is_breach(&self) -> bool {
        matches!(self.kind, JobKind::Mine | JobKind::AttackMelee)
            && matches!(self.target_a, JobTarget::Structure(_))
    }

    pub fn targets_structure(&self, id: StructureId) -> bool {
        self.target_a == JobTarget::Structure(id)
    }
}

/// Outcome of one decision call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Start this job
    Assign(Job),
    /// The best job is the one already running
    KeepCurrent,
    /// Reached the duty focus; the host moves the agent on
    Arrived,
    /// A collaborator service is missing; run the default behavior
    Defer,
    /// Nothing to do and nowhere safe to wander
    Idle,
}

impl Decision {
    pub fn job(&self) -> Option<&Job> {
        match self {
            Decision::Assign(job) => Some(job),
            _ => None,
        }
    }

    pub fn into_job(self) -> Option<Job> {
        match self {
            Decision::Assign(job) => Some(job),
            _ => None,
        }
    }

    /// The agent ends the call with something to do
    pub fn keeps_agent_busy(&self) -> bool {
        matches!(self, Decision::Assign(_) | Decision::KeepCurrent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_assignment_ignores_expiry() {
        let a = Job::goto(Cell::new(3, 4)).with_expiry(200);
        let b = Job::goto(Cell::new(3, 4)).with_expiry(350).ambling();
        assert!(a.same_assignment(&b));
        assert!(!a.same_assignment(&Job::goto(Cell::new(4, 4))));
    }

    #[test]
    fn test_breach_jobs() {
        let wall = StructureId::new();
        assert!(Job::mine(wall).is_breach());
        assert!(Job::attack_melee(JobTarget::Structure(wall)).is_breach());
        assert!(!Job::attack_melee(JobTarget::Agent(AgentId::new())).is_breach());
        assert!(Job::mine(wall).targets_structure(wall));
    }

    #[test]
    fn test_decision_job_view() {
        let job = Job::follow(AgentId::new());
        assert_eq!(Decision::Assign(job.clone()).job(), Some(&job));
        assert!(Decision::KeepCurrent.job().is_none());
        assert!(Decision::KeepCurrent.keeps_agent_busy());
        assert!(!Decision::Idle.keeps_agent_busy());
    }
}
