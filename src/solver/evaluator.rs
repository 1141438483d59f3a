use super::Chromosome;
use crate::models::{Dataset, PenaltyWeights, ProjectId, WEIGHT_FIRST_CHOICE, weight_for_rank};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

/// Weighted components of one chromosome's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub preference_score: f64,
    pub capacity_penalty: f64,
    pub gpa_penalty: f64,
    pub partner_penalty: f64,
    pub total: f64,
}

impl FitnessBreakdown {
    pub fn total_penalty(&self) -> f64 {
        self.capacity_penalty + self.gpa_penalty + self.partner_penalty
    }
}

/// Pure scoring function over the dataset's precomputed index tables.
///
/// `fitness = preference_score − Wc·capacity_excess − Wg·gpa_violations
/// − Wp·partner_splits`. Higher is better; heavy penalties can push the
/// score negative. Evaluation writes the chromosome's fitness cache.
///
/// The evaluator holds only shared references into the read-only dataset,
/// so parallel workers may score disjoint chromosomes concurrently.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator<'a> {
    dataset: &'a Dataset,
    weights: PenaltyWeights,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(dataset: &'a Dataset, weights: PenaltyWeights) -> Self {
        Self { dataset, weights }
    }

    /// Scores the chromosome and records the value in its fitness cache.
    ///
    /// Precondition: the chromosome length equals the roster size.
    pub fn evaluate(&self, chromosome: &mut Chromosome) -> f64 {
        debug_assert_eq!(chromosome.len(), self.dataset.student_count());

        let fitness = self.preference_score(chromosome)
            - self.weights.capacity * self.capacity_excess(chromosome) as f64
            - self.weights.gpa * self.gpa_violation_count(chromosome) as f64
            - self.weights.partner * self.partner_split_count(chromosome) as f64;

        chromosome.set_fitness(fitness);
        fitness
    }

    /// Sum of rank weights over all positions; unranked projects add 0.
    pub fn preference_score(&self, chromosome: &Chromosome) -> f64 {
        (0..chromosome.len())
            .map(|position| {
                let student = self.dataset.student_at(position);
                match self.dataset.rank_of(student.id, chromosome.get(position)) {
                    Some(rank) => weight_for_rank(rank),
                    None => 0.0,
                }
            })
            .sum()
    }

    /// Total head count outside capacity bands, summed over all projects:
    /// `max(0, min − n) + max(0, n − max)` per project.
    pub fn capacity_excess(&self, chromosome: &Chromosome) -> u32 {
        let counts = count_per_project(chromosome);

        self.dataset
            .projects()
            .iter()
            .map(|project| {
                let count = counts.get(&project.id).copied().unwrap_or(0);
                let under = project.min_capacity.saturating_sub(count);
                let over = count.saturating_sub(project.max_capacity);
                under + over
            })
            .sum()
    }

    /// Positions whose assigned project requires more GPA than the student
    /// holds.
    pub fn gpa_violation_count(&self, chromosome: &Chromosome) -> usize {
        (0..chromosome.len())
            .filter(|&position| {
                let student = self.dataset.student_at(position);
                match self.dataset.project(chromosome.get(position)) {
                    Some(project) => !project.admits_gpa(student.gpa),
                    None => false,
                }
            })
            .count()
    }

    /// Partner pairs assigned to different projects. Each pair counts once
    /// (enumerated with the lower position first).
    pub fn partner_split_count(&self, chromosome: &Chromosome) -> usize {
        (0..chromosome.len())
            .filter(|&position| {
                match self.dataset.partner_position(position) {
                    Some(partner) if partner > position => {
                        chromosome.get(position) != chromosome.get(partner)
                    }
                    _ => false,
                }
            })
            .count()
    }

    /// The four weighted components and their total, without touching the
    /// chromosome's cache.
    #[instrument(level = "debug", skip_all)]
    pub fn breakdown(&self, chromosome: &Chromosome) -> FitnessBreakdown {
        let preference_score = self.preference_score(chromosome);
        let capacity_penalty = self.weights.capacity * self.capacity_excess(chromosome) as f64;
        let gpa_penalty = self.weights.gpa * self.gpa_violation_count(chromosome) as f64;
        let partner_penalty = self.weights.partner * self.partner_split_count(chromosome) as f64;

        FitnessBreakdown {
            preference_score,
            capacity_penalty,
            gpa_penalty,
            partner_penalty,
            total: preference_score - capacity_penalty - gpa_penalty - partner_penalty,
        }
    }

    /// Histogram of satisfied preference ranks: bucket 0 counts positions
    /// whose project the student never ranked, buckets 1..=5 count ranks.
    pub fn preference_distribution(&self, chromosome: &Chromosome) -> [usize; 6] {
        let mut distribution = [0usize; 6];
        for position in 0..chromosome.len() {
            let student = self.dataset.student_at(position);
            match self.dataset.rank_of(student.id, chromosome.get(position)) {
                Some(rank @ 1..=5) => distribution[rank as usize] += 1,
                _ => distribution[0] += 1,
            }
        }
        distribution
    }

    /// Score if every student landed their first choice with no penalties.
    pub fn max_possible_score(&self) -> f64 {
        self.dataset.student_count() as f64 * WEIGHT_FIRST_CHOICE
    }
}

fn count_per_project(chromosome: &Chromosome) -> HashMap<ProjectId, u32> {
    let mut counts = HashMap::new();
    for &project in chromosome.assignments() {
        *counts.entry(project).or_insert(0) += 1;
    }
    counts
}
