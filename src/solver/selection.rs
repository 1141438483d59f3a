use super::Population;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Picks one tournament winner: `size` draws with replacement, highest
/// fitness wins, ties go to the first seen.
fn tournament_select<R: Rng>(population: &Population, size: usize, rng: &mut R) -> usize {
    let mut winner = rng.random_range(0..population.len());
    for _ in 1..size {
        let challenger = rng.random_range(0..population.len());
        if population.get(challenger).fitness() > population.get(winner).fitness() {
            winner = challenger;
        }
    }
    winner
}

/// Spins a fitness-proportional wheel. Negative fitness values are handled
/// by shifting every weight up by `|min| + 1`; a zero total weight falls
/// back to a uniform draw.
fn roulette_select<R: Rng>(population: &Population, rng: &mut R) -> usize {
    let min_fitness = population
        .chromosomes()
        .iter()
        .map(|c| c.fitness())
        .fold(f64::INFINITY, f64::min);
    let shift = if min_fitness < 0.0 {
        -min_fitness + 1.0
    } else {
        0.0
    };

    let total: f64 = population
        .chromosomes()
        .iter()
        .map(|c| c.fitness() + shift)
        .sum();

    if total == 0.0 {
        return rng.random_range(0..population.len());
    }

    let spin = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (index, chromosome) in population.chromosomes().iter().enumerate() {
        cumulative += chromosome.fitness() + shift;
        if cumulative >= spin {
            return index;
        }
    }

    population.len() - 1
}

/// Rank-proportional draw: the best chromosome carries rank N, the worst
/// rank 1. Sampling happens through a locally sorted index view, so the
/// population's own order is untouched.
fn rank_select<R: Rng>(population: &Population, rng: &mut R) -> usize {
    let n = population.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| population.get(a).cmp_fitness_desc(population.get(b)));

    let total_rank = n * (n + 1) / 2;
    let spin = rng.random_range(0..total_rank);

    let mut cumulative = 0;
    for (i, &index) in order.iter().enumerate() {
        cumulative += n - i;
        if cumulative > spin {
            return index;
        }
    }

    order[0]
}

#[derive(Debug, thiserror::Error)]
#[error("tournament size must be at least 2, got {0}")]
pub struct TournamentSizeError(usize);

/// Parent selection strategy. Selection reads the population but never
/// reorders or otherwise mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// `size` uniform draws with replacement; the fittest wins.
    Tournament { size: usize },
    /// Probability proportional to (shifted) fitness.
    RouletteWheel,
    /// Probability proportional to descending-fitness rank.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Self::Tournament { size: 3 }
    }
}

impl Selection {
    pub fn tournament(size: usize) -> Result<Self, TournamentSizeError> {
        if size < 2 {
            return Err(TournamentSizeError(size));
        }
        Ok(Self::Tournament { size })
    }

    pub fn roulette_wheel() -> Self {
        Self::RouletteWheel
    }

    pub fn rank() -> Self {
        Self::Rank
    }

    /// Selects one parent, returned as an index into the population.
    ///
    /// Precondition: the population is non-empty.
    pub fn select<R: Rng>(&self, population: &Population, rng: &mut R) -> usize {
        debug_assert!(!population.is_empty());

        match self {
            Self::Tournament { size } => tournament_select(population, *size, rng),
            Self::RouletteWheel => roulette_select(population, rng),
            Self::Rank => rank_select(population, rng),
        }
    }

    /// Selects a parent pair, resampling the second parent up to 10 times
    /// to avoid handing back the same individual twice.
    pub fn select_pair<R: Rng>(&self, population: &Population, rng: &mut R) -> (usize, usize) {
        let first = self.select(population, rng);
        let mut second = self.select(population, rng);

        let mut attempts = 0;
        while second == first && attempts < 10 {
            second = self.select(population, rng);
            attempts += 1;
        }

        (first, second)
    }
}
