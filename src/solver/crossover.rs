use super::Chromosome;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Uniform crossover: each position independently keeps or swaps the
/// parents' genes, biased by `bias` toward keeping.
fn uniform_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    bias: f64,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let length = parent1.len();
    let mut genes1 = Vec::with_capacity(length);
    let mut genes2 = Vec::with_capacity(length);

    for i in 0..length {
        if rng.random_bool(bias) {
            genes1.push(parent1.get(i));
            genes2.push(parent2.get(i));
        } else {
            genes1.push(parent2.get(i));
            genes2.push(parent1.get(i));
        }
    }

    (Chromosome::new(genes1), Chromosome::new(genes2))
}

/// Single-point crossover at `cut`: heads are kept, tails are exchanged.
fn single_point_crossover(
    parent1: &Chromosome,
    parent2: &Chromosome,
    cut: usize,
) -> (Chromosome, Chromosome) {
    let mut genes1 = parent1.assignments()[..cut].to_vec();
    genes1.extend_from_slice(&parent2.assignments()[cut..]);

    let mut genes2 = parent2.assignments()[..cut].to_vec();
    genes2.extend_from_slice(&parent1.assignments()[cut..]);

    (Chromosome::new(genes1), Chromosome::new(genes2))
}

/// Two-point crossover: the half-open segment `[a, b)` is exchanged,
/// everything outside is retained.
fn two_point_crossover(
    parent1: &Chromosome,
    parent2: &Chromosome,
    a: usize,
    b: usize,
) -> (Chromosome, Chromosome) {
    let length = parent1.len();
    let mut genes1 = Vec::with_capacity(length);
    let mut genes2 = Vec::with_capacity(length);

    for i in 0..length {
        if i >= a && i < b {
            genes1.push(parent2.get(i));
            genes2.push(parent1.get(i));
        } else {
            genes1.push(parent1.get(i));
            genes2.push(parent2.get(i));
        }
    }

    (Chromosome::new(genes1), Chromosome::new(genes2))
}

/// Recombination scheme applied once crossover fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrossoverKind {
    /// Per-position coin flip with the given bias toward parent order.
    Uniform { bias: f64 },
    /// One cut in `1..N-1`; tails are exchanged.
    SinglePoint,
    /// Two cuts; the middle segment is exchanged.
    TwoPoint,
}

#[derive(Debug, thiserror::Error)]
pub enum CrossoverError {
    #[error("crossover rate must be between 0.0 and 1.0, got {0}")]
    RateOutOfRange(f64),
    #[error("uniform crossover bias must be between 0.0 and 1.0, got {0}")]
    BiasOutOfRange(f64),
}

/// Rate-gated crossover producing two offspring per parent pair.
///
/// With probability `1 − rate` the parents pass through as plain deep
/// copies (caches intact). Actual recombination always yields fresh
/// chromosomes with unevaluated caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverOperator {
    kind: CrossoverKind,
    rate: f64,
}

impl Default for CrossoverOperator {
    fn default() -> Self {
        Self {
            kind: CrossoverKind::Uniform { bias: 0.5 },
            rate: 0.8,
        }
    }
}

impl CrossoverOperator {
    pub fn new(kind: CrossoverKind, rate: f64) -> Result<Self, CrossoverError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(CrossoverError::RateOutOfRange(rate));
        }
        if let CrossoverKind::Uniform { bias } = kind {
            if !(0.0..=1.0).contains(&bias) {
                return Err(CrossoverError::BiasOutOfRange(bias));
            }
        }
        Ok(Self { kind, rate })
    }

    pub fn uniform(rate: f64, bias: f64) -> Result<Self, CrossoverError> {
        Self::new(CrossoverKind::Uniform { bias }, rate)
    }

    pub fn single_point(rate: f64) -> Result<Self, CrossoverError> {
        Self::new(CrossoverKind::SinglePoint, rate)
    }

    pub fn two_point(rate: f64) -> Result<Self, CrossoverError> {
        Self::new(CrossoverKind::TwoPoint, rate)
    }

    pub fn kind(&self) -> &CrossoverKind {
        &self.kind
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Produces two offspring from the parent pair.
    ///
    /// Precondition: parents have equal length.
    #[instrument(level = "debug", skip_all, fields(kind = ?self.kind, length = parent1.len()))]
    pub fn apply<R: Rng>(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        debug_assert_eq!(parent1.len(), parent2.len());

        if rng.random::<f64>() > self.rate {
            return (parent1.clone(), parent2.clone());
        }

        let length = parent1.len();
        match self.kind {
            CrossoverKind::Uniform { bias } => uniform_crossover(parent1, parent2, bias, rng),
            CrossoverKind::SinglePoint => {
                if length < 2 {
                    // No interior cut exists.
                    return (parent1.clone(), parent2.clone());
                }
                let cut = rng.random_range(1..length);
                single_point_crossover(parent1, parent2, cut)
            }
            CrossoverKind::TwoPoint => {
                let mut a = rng.random_range(0..length);
                let mut b = rng.random_range(0..length);
                if a > b {
                    std::mem::swap(&mut a, &mut b);
                }
                two_point_crossover(parent1, parent2, a, b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn parents() -> (Chromosome, Chromosome) {
        (
            Chromosome::new((1..=5).map(ProjectId).collect()),
            Chromosome::new((6..=10).map(ProjectId).collect()),
        )
    }

    #[test]
    fn it_validates_rate_and_bias() {
        assert!(CrossoverOperator::uniform(1.5, 0.5).is_err());
        assert!(CrossoverOperator::uniform(-0.1, 0.5).is_err());
        assert!(CrossoverOperator::uniform(0.8, 1.5).is_err());
        assert!(CrossoverOperator::single_point(0.8).is_ok());
    }

    #[test]
    fn zero_rate_returns_parent_copies() {
        let (mut p1, p2) = parents();
        p1.set_fitness(42.0);
        let operator = CrossoverOperator::uniform(0.0, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let (o1, o2) = operator.apply(&p1, &p2, &mut rng);

        assert_eq!(o1.assignments(), p1.assignments());
        assert_eq!(o2.assignments(), p2.assignments());
        // A pass-through copy keeps its cache.
        assert_eq!(o1.fitness(), 42.0);
    }

    #[test]
    fn uniform_offspring_take_each_gene_from_one_parent() {
        let (p1, p2) = parents();
        let operator = CrossoverOperator::uniform(1.0, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let (o1, o2) = operator.apply(&p1, &p2, &mut rng);

        assert!(!o1.is_evaluated());
        assert!(!o2.is_evaluated());
        for i in 0..p1.len() {
            assert!(o1.get(i) == p1.get(i) || o1.get(i) == p2.get(i));
            // Offspring are complementary at every position.
            if o1.get(i) == p1.get(i) {
                assert_eq!(o2.get(i), p2.get(i));
            } else {
                assert_eq!(o2.get(i), p1.get(i));
            }
        }
    }

    #[test]
    fn uniform_extreme_bias_copies_whole_parents() {
        let (p1, p2) = parents();
        let mut rng = StdRng::seed_from_u64(42);

        let all_first = CrossoverOperator::uniform(1.0, 1.0).unwrap();
        let (o1, o2) = all_first.apply(&p1, &p2, &mut rng);
        assert_eq!(o1.assignments(), p1.assignments());
        assert_eq!(o2.assignments(), p2.assignments());

        let all_second = CrossoverOperator::uniform(1.0, 0.0).unwrap();
        let (o1, o2) = all_second.apply(&p1, &p2, &mut rng);
        assert_eq!(o1.assignments(), p2.assignments());
        assert_eq!(o2.assignments(), p1.assignments());
    }

    #[test]
    fn single_point_exchanges_tails_exactly_once() {
        let (p1, p2) = parents();

        for cut in 1..5 {
            let (o1, o2) = single_point_crossover(&p1, &p2, cut);
            assert_eq!(&o1.assignments()[..cut], &p1.assignments()[..cut]);
            assert_eq!(&o1.assignments()[cut..], &p2.assignments()[cut..]);
            assert_eq!(&o2.assignments()[..cut], &p2.assignments()[..cut]);
            assert_eq!(&o2.assignments()[cut..], &p1.assignments()[cut..]);
        }
    }

    #[test]
    fn single_point_cut_stays_interior() {
        let (p1, p2) = parents();
        let operator = CrossoverOperator::single_point(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        // A cut of 0 or N would clone a parent wholesale; the offspring
        // must always mix both.
        for _ in 0..200 {
            let (o1, _) = operator.apply(&p1, &p2, &mut rng);
            assert_eq!(o1.get(0), p1.get(0));
            assert_eq!(o1.get(4), p2.get(4));
        }
    }

    #[test]
    fn length_one_parents_cannot_be_single_point_crossed() {
        let p1 = Chromosome::new(vec![ProjectId(1)]);
        let p2 = Chromosome::new(vec![ProjectId(2)]);
        let operator = CrossoverOperator::single_point(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let (o1, o2) = operator.apply(&p1, &p2, &mut rng);
        assert_eq!(o1.assignments(), p1.assignments());
        assert_eq!(o2.assignments(), p2.assignments());
    }

    #[test]
    fn two_point_swaps_the_middle_segment() {
        let (p1, p2) = parents();

        let (o1, o2) = two_point_crossover(&p1, &p2, 1, 4);

        assert_eq!(
            o1.assignments(),
            &[ProjectId(1), ProjectId(7), ProjectId(8), ProjectId(9), ProjectId(5)]
        );
        assert_eq!(
            o2.assignments(),
            &[ProjectId(6), ProjectId(2), ProjectId(3), ProjectId(4), ProjectId(10)]
        );
    }

    #[test]
    fn two_point_with_equal_points_is_a_copy() {
        let (p1, p2) = parents();
        let (o1, o2) = two_point_crossover(&p1, &p2, 2, 2);
        assert_eq!(o1.assignments(), p1.assignments());
        assert_eq!(o2.assignments(), p2.assignments());
    }

    #[test]
    fn offspring_length_always_matches_parents() {
        let (p1, p2) = parents();
        let mut rng = StdRng::seed_from_u64(7);

        for operator in [
            CrossoverOperator::uniform(1.0, 0.5).unwrap(),
            CrossoverOperator::single_point(1.0).unwrap(),
            CrossoverOperator::two_point(1.0).unwrap(),
        ] {
            for _ in 0..50 {
                let (o1, o2) = operator.apply(&p1, &p2, &mut rng);
                assert_eq!(o1.len(), 5);
                assert_eq!(o2.len(), 5);
            }
        }
    }
}
