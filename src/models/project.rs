use serde::{Deserialize, Serialize};

/// Row identity of a project in the catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i32);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A project offering with a capacity band and an optional GPA floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Project {
    pub id: ProjectId,
    /// Short symbolic code, e.g. "CS-OPT-01".
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Smallest viable team size. At least 1.
    pub min_capacity: u32,
    /// Largest admissible team size. At least `min_capacity`.
    pub max_capacity: u32,
    /// Minimum GPA a student must hold to join. 0.0 means no gate.
    pub required_gpa: f64,
}

impl Project {
    pub fn new(id: ProjectId, code: &str, name: &str, min_capacity: u32, max_capacity: u32) -> Self {
        Self {
            id,
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            min_capacity,
            max_capacity,
            required_gpa: 0.0,
        }
    }

    pub fn with_required_gpa(mut self, required_gpa: f64) -> Self {
        self.required_gpa = required_gpa;
        self
    }

    /// Whether a student with the given GPA clears this project's floor.
    pub fn admits_gpa(&self, gpa: f64) -> bool {
        gpa >= self.required_gpa
    }

    /// Whether a head count sits inside the capacity band.
    pub fn is_within_capacity(&self, count: u32) -> bool {
        count >= self.min_capacity && count <= self.max_capacity
    }
}
