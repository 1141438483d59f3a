use serde::{Deserialize, Serialize};

/// Fitness aggregates recorded once per generation.
///
/// `best_ever_fitness` tracks the maximum across the whole run so far, so
/// it is monotone non-decreasing over the stats stream even when the
/// in-generation best dips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub worst_fitness: f64,
    pub std_dev: f64,
    /// Chromosomes satisfying all three constraints this generation.
    pub valid_count: usize,
    pub best_ever_fitness: f64,
}

impl std::fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gen {}: best={:.2} avg={:.2} worst={:.2} valid={} best-ever={:.2}",
            self.generation,
            self.best_fitness,
            self.average_fitness,
            self.worst_fitness,
            self.valid_count,
            self.best_ever_fitness
        )
    }
}
