use super::{ProjectId, StudentId};
use serde::{Deserialize, Serialize};

/// Score contributed by landing a student on their first choice.
pub const WEIGHT_FIRST_CHOICE: f64 = 100.0;
/// Score contributed by a project the student never ranked.
pub const WEIGHT_NO_PREFERENCE: f64 = 0.0;

const RANK_WEIGHTS: [f64; 5] = [100.0, 80.0, 60.0, 40.0, 20.0];

/// Maps a preference rank to its fixed score weight.
///
/// Ranks outside 1..=5 weigh nothing, same as an unranked project.
pub fn weight_for_rank(rank: u8) -> f64 {
    match rank {
        1..=5 => RANK_WEIGHTS[rank as usize - 1],
        _ => WEIGHT_NO_PREFERENCE,
    }
}

/// A single ranked choice: one student naming one project at rank 1..=5.
///
/// Per student the dataset enforces that ranks are unique and a project
/// appears at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Preference {
    pub student_id: StudentId,
    pub project_id: ProjectId,
    pub rank: u8,
}

impl Preference {
    pub fn new(student_id: StudentId, project_id: ProjectId, rank: u8) -> Self {
        Self {
            student_id,
            project_id,
            rank,
        }
    }

    /// The score weight this choice contributes when satisfied.
    pub fn weight(&self) -> f64 {
        weight_for_rank(self.rank)
    }
}
