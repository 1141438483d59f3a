use crate::models::ProjectId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One candidate solution: a project id per roster position.
///
/// Position `i` holds the project assigned to the `i`-th student under the
/// dataset's fixed roster ordering. The fitness and validity caches start
/// unevaluated and are cleared by every write, so a stale value can never
/// be read as current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chromosome {
    assignments: Vec<ProjectId>,
    fitness: Option<f64>,
    validity: Option<bool>,
}

impl Chromosome {
    /// Wraps an existing assignment vector. Caches start unevaluated.
    pub fn new(assignments: Vec<ProjectId>) -> Self {
        Self {
            assignments,
            fitness: None,
            validity: None,
        }
    }

    /// Assigns every position a uniformly random candidate project.
    pub fn random<R: Rng>(length: usize, candidates: &[ProjectId], rng: &mut R) -> Self {
        let assignments = (0..length)
            .map(|_| candidates[rng.random_range(0..candidates.len())])
            .collect();
        Self::new(assignments)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn get(&self, position: usize) -> ProjectId {
        self.assignments[position]
    }

    /// Reassigns one position, invalidating both caches.
    pub fn set(&mut self, position: usize, project: ProjectId) {
        self.assignments[position] = project;
        self.clear_caches();
    }

    /// Swaps the assignments of two positions, invalidating both caches.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.assignments.swap(a, b);
        self.clear_caches();
    }

    pub fn assignments(&self) -> &[ProjectId] {
        &self.assignments
    }

    /// How many positions map to the given project.
    pub fn count_in_project(&self, project: ProjectId) -> usize {
        self.assignments.iter().filter(|&&p| p == project).count()
    }

    /// Positions mapped to the given project, in ascending order.
    pub fn positions_in_project(&self, project: ProjectId) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == project)
            .map(|(i, _)| i)
            .collect()
    }

    /// Cached fitness, or 0.0 while unevaluated.
    pub fn fitness(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }

    /// Cached fitness as recorded by the evaluator, `None` while stale.
    pub fn evaluated_fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Cached validity as recorded by the constraint checker, `None` while
    /// stale.
    pub fn validity(&self) -> Option<bool> {
        self.validity
    }

    /// Whether the chromosome is known to satisfy all constraints. A stale
    /// cache reads as not valid.
    pub fn is_valid(&self) -> bool {
        self.validity == Some(true)
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.validity = Some(valid);
    }

    /// Descending fitness order for population sorting; unevaluated reads
    /// as 0.0.
    pub fn cmp_fitness_desc(&self, other: &Self) -> Ordering {
        other.fitness().total_cmp(&self.fitness())
    }

    fn clear_caches(&mut self) {
        self.fitness = None;
        self.validity = None;
    }
}

/// Equality compares assignment vectors only; caches are bookkeeping.
impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.assignments == other.assignments
    }
}

impl Eq for Chromosome {}
