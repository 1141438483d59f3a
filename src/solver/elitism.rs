use super::{Chromosome, Population};
use crate::models::ProjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum ElitismError {
    #[error("elite fraction must be between 0.0 and 1.0, got {0}")]
    FractionOutOfRange(f64),
    #[error("max elite count ({max}) must not be below min elite count ({min})")]
    InvalidBounds { min: usize, max: usize },
}

/// Summary of one generation's preserved elite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EliteStats {
    pub count: usize,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub average_fitness: f64,
}

/// Unconditional carry-over of the top chromosomes into the next
/// generation.
///
/// The elite count is `clamp(round(fraction · N), min, max)`, further
/// capped at the population size. With `unique_only` set (the default),
/// duplicate assignment vectors are skipped while walking the sorted
/// population, so the carried elite are structurally distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elitism {
    fraction: f64,
    min: usize,
    max: usize,
    unique_only: bool,
}

impl Default for Elitism {
    fn default() -> Self {
        Self {
            fraction: 0.05,
            min: 1,
            max: 50,
            unique_only: true,
        }
    }
}

impl Elitism {
    pub fn new(fraction: f64) -> Result<Self, ElitismError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ElitismError::FractionOutOfRange(fraction));
        }
        Ok(Self {
            fraction,
            ..Self::default()
        })
    }

    pub fn with_bounds(fraction: f64, min: usize, max: usize) -> Result<Self, ElitismError> {
        if max < min {
            return Err(ElitismError::InvalidBounds { min, max });
        }
        let mut elitism = Self::new(fraction)?;
        elitism.min = min;
        elitism.max = max;
        Ok(elitism)
    }

    pub fn with_unique_only(mut self, unique_only: bool) -> Self {
        self.unique_only = unique_only;
        self
    }

    /// Number of elites to preserve out of `population_size`.
    pub fn elite_count(&self, population_size: usize) -> usize {
        let count = (population_size as f64 * self.fraction).round() as usize;
        count.clamp(self.min, self.max).min(population_size)
    }

    /// Slots left for offspring after the elite are placed.
    pub fn remaining_slots(&self, population_size: usize) -> usize {
        population_size - self.elite_count(population_size)
    }

    /// Deep copies of the top chromosomes, skipping structural duplicates
    /// when `unique_only` is set. Forces a population sort.
    pub fn select_elite(&self, population: &mut Population) -> Vec<Chromosome> {
        let target = self.elite_count(population.len());

        if !self.unique_only {
            return population.elite(target);
        }

        population.sort_by_fitness();
        let mut elite: Vec<Chromosome> = Vec::with_capacity(target);
        let mut seen: HashSet<Vec<ProjectId>> = HashSet::with_capacity(target);

        for chromosome in population.chromosomes() {
            if elite.len() >= target {
                break;
            }
            if seen.insert(chromosome.assignments().to_vec()) {
                elite.push(chromosome.clone());
            }
        }

        elite
    }

    /// Overwrites the worst `elite.len()` slots of `new_population` with
    /// deep copies of the elite.
    pub fn apply_elitism(&self, elite: &[Chromosome], new_population: &mut Population) {
        if elite.is_empty() {
            return;
        }

        new_population.sort_by_fitness();
        let size = new_population.len();

        for (i, chromosome) in elite.iter().enumerate() {
            if i >= size {
                break;
            }
            new_population.set(size - 1 - i, chromosome.clone());
        }
    }

    /// Driver invariant: the best fitness after applying elitism must be
    /// at least the previous generation's best.
    pub fn verify_preserved(&self, previous_best: f64, new_population: &mut Population) -> bool {
        new_population.best_fitness() >= previous_best
    }

    /// Aggregates for a selected elite slice (assumed sorted best-first).
    pub fn elite_stats(elite: &[Chromosome]) -> EliteStats {
        if elite.is_empty() {
            return EliteStats {
                count: 0,
                best_fitness: 0.0,
                worst_fitness: 0.0,
                average_fitness: 0.0,
            };
        }
        let total: f64 = elite.iter().map(Chromosome::fitness).sum();
        EliteStats {
            count: elite.len(),
            best_fitness: elite[0].fitness(),
            worst_fitness: elite[elite.len() - 1].fitness(),
            average_fitness: total / elite.len() as f64,
        }
    }
}
