use super::{GaConfig, GenerationStats, ProjectId, StudentId};
use crate::solver::ConstraintViolations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One student's final placement, with the preference rank it satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub student_id: StudentId,
    pub project_id: ProjectId,
    /// Rank the student gave this project; `None` when it was unranked.
    pub preference_rank: Option<u8>,
}

/// Post-run notice about a condition the search could not resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Advisory {
    /// No project's GPA floor admits this student; their position stayed in
    /// violation and the fitness carried the penalty.
    NoFeasibleProject { student_id: StudentId, gpa: f64 },
}

/// Run-level bookkeeping attached to a finished result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Generations actually executed (early stops make this less than the
    /// configured maximum).
    pub generations_run: u32,
    pub best_fitness: f64,
    /// Snapshot of the parameters the run used.
    pub config: GaConfig,
}

impl RunMetadata {
    pub fn new(config: GaConfig) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            elapsed_ms: 0,
            generations_run: 0,
            best_fitness: 0.0,
            config,
        }
    }
}

/// Everything a finished run reports: the best assignment found, the
/// per-generation stats stream, run metadata, advisories, and whatever
/// constraint violations remain in the reported assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub assignments: Vec<Assignment>,
    pub stats: Vec<GenerationStats>,
    pub metadata: RunMetadata,
    pub advisories: Vec<Advisory>,
    pub residual_violations: ConstraintViolations,
}

impl RunResult {
    /// The final placement as a student → project map.
    pub fn assignment_map(&self) -> HashMap<StudentId, ProjectId> {
        self.assignments
            .iter()
            .map(|a| (a.student_id, a.project_id))
            .collect()
    }

    /// Whether the reported assignment satisfies every constraint.
    pub fn is_feasible(&self) -> bool {
        !self.residual_violations.has_violations()
    }
}
