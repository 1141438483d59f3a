use super::Chromosome;
use crate::models::ProjectId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Swaps two distinct random positions. No-op for length < 2.
fn swap_positions<R: Rng>(chromosome: &mut Chromosome, rng: &mut R) {
    let length = chromosome.len();
    if length < 2 {
        return;
    }
    let a = rng.random_range(0..length);
    let mut b = rng.random_range(0..length);
    while b == a {
        b = rng.random_range(0..length);
    }
    chromosome.swap(a, b);
}

/// Fisher–Yates shuffles the inclusive segment `[start, end]`.
fn scramble_segment<R: Rng>(chromosome: &mut Chromosome, start: usize, end: usize, rng: &mut R) {
    for i in ((start + 1)..=end).rev() {
        let j = start + rng.random_range(0..=(i - start));
        chromosome.swap(i, j);
    }
}

/// Reverses the inclusive segment `[start, end]`.
fn invert_segment(chromosome: &mut Chromosome, start: usize, end: usize) {
    let (mut a, mut b) = (start, end);
    while a < b {
        chromosome.swap(a, b);
        a += 1;
        b -= 1;
    }
}

/// Draws a random inclusive segment `[a, b]` with `a <= b`.
fn random_segment<R: Rng>(length: usize, rng: &mut R) -> (usize, usize) {
    let mut a = rng.random_range(0..length);
    let mut b = rng.random_range(0..length);
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }
    (a, b)
}

/// Perturbation applied when mutation fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    /// Exchange the assignments of two random positions.
    Swap,
    /// Reassign one random position to a random candidate project.
    RandomReset,
    /// Shuffle a random segment.
    Scramble,
    /// Reverse a random segment.
    Inversion,
}

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("mutation rate must be between 0.0 and 1.0, got {0}")]
    RateOutOfRange(f64),
    #[error("mutation needs at least one candidate project")]
    NoCandidates,
}

/// Rate-gated in-place mutation.
///
/// With probability `rate` exactly one operator application perturbs the
/// chromosome, which invalidates its caches. The candidate project list
/// feeds random resets (both the `RandomReset` kind and per-gene
/// mutation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationOperator {
    kind: MutationKind,
    rate: f64,
    candidates: Vec<ProjectId>,
}

impl MutationOperator {
    pub fn new(
        kind: MutationKind,
        rate: f64,
        candidates: Vec<ProjectId>,
    ) -> Result<Self, MutationError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(MutationError::RateOutOfRange(rate));
        }
        if candidates.is_empty() {
            return Err(MutationError::NoCandidates);
        }
        Ok(Self {
            kind,
            rate,
            candidates,
        })
    }

    pub fn swap(rate: f64, candidates: Vec<ProjectId>) -> Result<Self, MutationError> {
        Self::new(MutationKind::Swap, rate, candidates)
    }

    pub fn random_reset(rate: f64, candidates: Vec<ProjectId>) -> Result<Self, MutationError> {
        Self::new(MutationKind::RandomReset, rate, candidates)
    }

    pub fn scramble(rate: f64, candidates: Vec<ProjectId>) -> Result<Self, MutationError> {
        Self::new(MutationKind::Scramble, rate, candidates)
    }

    pub fn inversion(rate: f64, candidates: Vec<ProjectId>) -> Result<Self, MutationError> {
        Self::new(MutationKind::Inversion, rate, candidates)
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Applies one perturbation with probability `rate`. Returns whether
    /// the chromosome was mutated.
    #[instrument(level = "debug", skip_all, fields(kind = ?self.kind, length = chromosome.len()))]
    pub fn mutate<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) -> bool {
        if rng.random::<f64>() > self.rate {
            return false;
        }
        self.apply(chromosome, rng);
        true
    }

    /// Independent Bernoulli trial per position, each performing a random
    /// reset. Returns the number of mutated positions.
    pub fn mutate_per_gene<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        per_gene_rate: f64,
        rng: &mut R,
    ) -> usize {
        let mut mutated = 0;
        for position in 0..chromosome.len() {
            if rng.random::<f64>() < per_gene_rate {
                let project = self.candidates[rng.random_range(0..self.candidates.len())];
                chromosome.set(position, project);
                mutated += 1;
            }
        }
        mutated
    }

    /// Fitness-adaptive swap mutation: weaker chromosomes mutate more.
    ///
    /// Effective rate is `max_rate − ratio · (max_rate − min_rate)` where
    /// `ratio = fitness / max_fitness` clamped to `[0, 1]`, so negative
    /// fitness mutates at `max_rate` and the population best at
    /// `min_rate`. The perturbation is a position swap regardless of the
    /// configured kind.
    pub fn adaptive_mutate<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        fitness: f64,
        max_fitness: f64,
        min_rate: f64,
        max_rate: f64,
        rng: &mut R,
    ) -> bool {
        let ratio = if max_fitness > 0.0 {
            (fitness / max_fitness).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let effective_rate = max_rate - ratio * (max_rate - min_rate);

        if rng.random::<f64>() < effective_rate {
            swap_positions(chromosome, rng);
            return true;
        }
        false
    }

    fn apply<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) {
        match self.kind {
            MutationKind::Swap => swap_positions(chromosome, rng),
            MutationKind::RandomReset => {
                let position = rng.random_range(0..chromosome.len());
                let project = self.candidates[rng.random_range(0..self.candidates.len())];
                chromosome.set(position, project);
            }
            MutationKind::Scramble => {
                if chromosome.len() < 2 {
                    return;
                }
                let (a, b) = random_segment(chromosome.len(), rng);
                scramble_segment(chromosome, a, b, rng);
            }
            MutationKind::Inversion => {
                if chromosome.len() < 2 {
                    return;
                }
                let (a, b) = random_segment(chromosome.len(), rng);
                invert_segment(chromosome, a, b);
            }
        }
    }
}
