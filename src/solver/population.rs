use super::Chromosome;
use crate::models::ProjectId;
use rand::Rng;

/// Ordered collection of chromosomes with lazily maintained sort order.
///
/// The `sorted` flag is cleared by every mutator and set by
/// [`Population::sort_by_fitness`]; accessors that need order force a sort.
/// Sorted order is descending by fitness; ties are left unspecified.
#[derive(Debug, Clone)]
pub struct Population {
    chromosomes: Vec<Chromosome>,
    target_size: usize,
    sorted: bool,
}

impl Population {
    /// Creates an empty population with the given target size.
    pub fn new(target_size: usize) -> Self {
        Self {
            chromosomes: Vec::with_capacity(target_size),
            target_size,
            sorted: false,
        }
    }

    /// Creates a population of uniformly random chromosomes.
    pub fn random<R: Rng>(
        size: usize,
        chromosome_length: usize,
        candidates: &[ProjectId],
        rng: &mut R,
    ) -> Self {
        let mut population = Self::new(size);
        for _ in 0..size {
            population.push(Chromosome::random(chromosome_length, candidates, rng));
        }
        population
    }

    pub fn push(&mut self, chromosome: Chromosome) {
        self.chromosomes.push(chromosome);
        self.sorted = false;
    }

    pub fn get(&self, index: usize) -> &Chromosome {
        &self.chromosomes[index]
    }

    pub fn set(&mut self, index: usize, chromosome: Chromosome) {
        self.chromosomes[index] = chromosome;
        self.sorted = false;
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn chromosomes_mut(&mut self) -> &mut [Chromosome] {
        self.sorted = false;
        &mut self.chromosomes
    }

    /// Sorts descending by fitness. A no-op when already sorted.
    pub fn sort_by_fitness(&mut self) {
        if !self.sorted {
            self.chromosomes.sort_by(|a, b| a.cmp_fitness_desc(b));
            self.sorted = true;
        }
    }

    /// Highest-fitness chromosome. Forces a sort.
    pub fn best(&mut self) -> Option<&Chromosome> {
        self.sort_by_fitness();
        self.chromosomes.first()
    }

    /// Lowest-fitness chromosome. Forces a sort.
    pub fn worst(&mut self) -> Option<&Chromosome> {
        self.sort_by_fitness();
        self.chromosomes.last()
    }

    /// Deep copies of the top `n` chromosomes. Forces a sort.
    pub fn elite(&mut self, n: usize) -> Vec<Chromosome> {
        self.sort_by_fitness();
        let count = n.min(self.chromosomes.len());
        self.chromosomes[..count].to_vec()
    }

    pub fn best_fitness(&mut self) -> f64 {
        self.best().map(Chromosome::fitness).unwrap_or(0.0)
    }

    pub fn worst_fitness(&mut self) -> f64 {
        self.worst().map(Chromosome::fitness).unwrap_or(0.0)
    }

    pub fn average_fitness(&self) -> f64 {
        if self.chromosomes.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.chromosomes.iter().map(Chromosome::fitness).sum();
        sum / self.chromosomes.len() as f64
    }

    /// Population standard deviation of fitness (n divisor).
    pub fn fitness_std_dev(&self) -> f64 {
        if self.chromosomes.len() < 2 {
            return 0.0;
        }
        let avg = self.average_fitness();
        let sum_sq: f64 = self
            .chromosomes
            .iter()
            .map(|c| {
                let diff = c.fitness() - avg;
                diff * diff
            })
            .sum();
        (sum_sq / self.chromosomes.len() as f64).sqrt()
    }

    /// Chromosomes whose validity cache reads true.
    pub fn count_valid(&self) -> usize {
        self.chromosomes.iter().filter(|c| c.is_valid()).count()
    }

    /// Whether any member shares an assignment vector with `chromosome`.
    pub fn contains_duplicate(&self, chromosome: &Chromosome) -> bool {
        self.chromosomes.iter().any(|c| c == chromosome)
    }

    pub fn clear(&mut self) {
        self.chromosomes.clear();
        self.sorted = false;
    }

    pub fn replace_all(&mut self, chromosomes: Vec<Chromosome>) {
        self.chromosomes = chromosomes;
        self.sorted = false;
    }

    /// Drops the worst chromosomes until the population is back at its
    /// target size.
    pub fn truncate_to_target(&mut self) {
        if self.chromosomes.len() > self.target_size {
            self.sort_by_fitness();
            self.chromosomes.truncate(self.target_size);
        }
    }
}
