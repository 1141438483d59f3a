mod config;
mod dataset;
mod outcome;
mod preference;
mod project;
mod stats;
mod student;

pub use config::{ConfigError, GaConfig, PenaltyWeights};
pub use dataset::{Dataset, DatasetError};
pub use outcome::{Advisory, Assignment, RunMetadata, RunResult};
pub use preference::{Preference, WEIGHT_FIRST_CHOICE, WEIGHT_NO_PREFERENCE, weight_for_rank};
pub use project::{Project, ProjectId};
pub use stats::GenerationStats;
pub use student::{Student, StudentId};
