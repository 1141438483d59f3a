use serde::{Deserialize, Serialize};

/// Penalty weights applied per unit of constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyWeights {
    /// Per student above max or below min capacity. Default 50.
    pub capacity: f64,
    /// Per student assigned below a project's GPA floor. Default 30.
    pub gpa: f64,
    /// Per partner pair split across projects. Default 40.
    pub partner: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            capacity: 50.0,
            gpa: 30.0,
            partner: 40.0,
        }
    }
}

/// Invalid run parameters, reported before the run begins.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("population size must be at least 10, got {0}")]
    PopulationTooSmall(usize),
    #[error("max generations must be at least 1, got {0}")]
    NoGenerations(u32),
    #[error("mutation rate must be between 0.0 and 1.0, got {0}")]
    MutationRateOutOfRange(f64),
    #[error("crossover rate must be between 0.0 and 1.0, got {0}")]
    CrossoverRateOutOfRange(f64),
    #[error("elite percentage must be between 0.0 and 1.0, got {0}")]
    ElitePercentageOutOfRange(f64),
    #[error("tournament size must be at least 2, got {0}")]
    TournamentTooSmall(usize),
    #[error("convergence window must be at least 1 generation, got {0}")]
    ConvergenceWindowTooSmall(usize),
}

/// Tunable parameters for one assignment run.
///
/// `Default` carries the general-purpose values; the preset constructors
/// bundle settings sized to the roster. All parameters are checked by
/// [`GaConfig::validate`] before a driver will accept them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    pub population_size: usize,
    pub max_generations: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elite_percentage: f64,
    pub tournament_size: usize,
    pub convergence_enabled: bool,
    /// Sliding window of generations inspected by the convergence test.
    pub convergence_generations: usize,
    /// Minimum total best-ever improvement over the window to keep going.
    pub convergence_threshold: f64,
    /// Stop as soon as best fitness reaches this value, if set.
    pub target_fitness: Option<f64>,
    pub repair_enabled: bool,
    /// Fixed PRNG seed for reproducible runs. Absent means nondeterministic.
    pub seed: Option<u64>,
    pub penalties: PenaltyWeights,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 200,
            max_generations: 1000,
            mutation_rate: 0.02,
            crossover_rate: 0.8,
            elite_percentage: 0.05,
            tournament_size: 3,
            convergence_enabled: true,
            convergence_generations: 50,
            convergence_threshold: 0.001,
            target_fitness: None,
            repair_enabled: true,
            seed: None,
            penalties: PenaltyWeights::default(),
        }
    }
}

impl GaConfig {
    /// Preset for small rosters (under ~50 students).
    pub fn small() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            mutation_rate: 0.03,
            crossover_rate: 0.8,
            elite_percentage: 0.10,
            tournament_size: 3,
            ..Self::default()
        }
    }

    /// Preset for medium rosters (~50-200 students).
    pub fn medium() -> Self {
        Self {
            population_size: 200,
            max_generations: 1000,
            mutation_rate: 0.02,
            crossover_rate: 0.8,
            elite_percentage: 0.05,
            tournament_size: 4,
            ..Self::default()
        }
    }

    /// Preset for large rosters (over ~200 students).
    pub fn large() -> Self {
        Self {
            population_size: 500,
            max_generations: 2000,
            mutation_rate: 0.01,
            crossover_rate: 0.85,
            elite_percentage: 0.05,
            tournament_size: 5,
            ..Self::default()
        }
    }

    /// Fast preset for smoke tests and quick iteration.
    pub fn quick() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            mutation_rate: 0.05,
            crossover_rate: 0.9,
            elite_percentage: 0.10,
            tournament_size: 3,
            convergence_generations: 20,
            ..Self::default()
        }
    }

    /// Preset that trades run time for solution quality.
    pub fn high_quality() -> Self {
        Self {
            population_size: 750,
            max_generations: 3000,
            mutation_rate: 0.025,
            crossover_rate: 0.85,
            elite_percentage: 0.10,
            tournament_size: 5,
            convergence_generations: 100,
            convergence_threshold: 0.0005,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = Some(target);
        self
    }

    pub fn with_repair(mut self, enabled: bool) -> Self {
        self.repair_enabled = enabled;
        self
    }

    pub fn with_penalties(mut self, penalties: PenaltyWeights) -> Self {
        self.penalties = penalties;
        self
    }

    /// Checks every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 10 {
            return Err(ConfigError::PopulationTooSmall(self.population_size));
        }
        if self.max_generations < 1 {
            return Err(ConfigError::NoGenerations(self.max_generations));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRateOutOfRange(self.mutation_rate));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(ConfigError::CrossoverRateOutOfRange(self.crossover_rate));
        }
        if !(0.0..=1.0).contains(&self.elite_percentage) {
            return Err(ConfigError::ElitePercentageOutOfRange(self.elite_percentage));
        }
        if self.tournament_size < 2 {
            return Err(ConfigError::TournamentTooSmall(self.tournament_size));
        }
        if self.convergence_generations < 1 {
            return Err(ConfigError::ConvergenceWindowTooSmall(
                self.convergence_generations,
            ));
        }
        Ok(())
    }
}
