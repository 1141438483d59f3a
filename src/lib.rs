//! Assigns each student in a cohort to exactly one project from a fixed
//! catalog, maximizing weighted preference satisfaction while respecting
//! project capacity bands, GPA floors, and partner co-location.
//!
//! The search is a generational genetic algorithm: candidate assignments
//! are fixed-length vectors scored by preference weight minus constraint
//! penalties, with optional best-effort repair keeping the population near
//! feasibility. Invalid candidates survive with reduced fitness so the
//! search can cross infeasible regions; only the final reported assignment
//! is flagged if violations remain.
//!
//! ```no_run
//! use cohort_ga::models::{Dataset, GaConfig};
//! use cohort_ga::solver::GaDriver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let (students, projects, preferences) = (vec![], vec![], vec![]);
//! let dataset = Dataset::new(students, projects, preferences)?;
//! let mut driver = GaDriver::new(&dataset, GaConfig::medium().with_seed(12345))?;
//! let result = driver.run();
//!
//! for assignment in &result.assignments {
//!     println!("{} -> {}", assignment.student_id, assignment.project_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod models;
pub mod solver;

pub use models::{Dataset, GaConfig, RunResult};
pub use solver::{CancelToken, GaDriver};
