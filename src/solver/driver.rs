use super::{
    Chromosome, ConstraintChecker, CrossoverOperator, Elitism, FitnessEvaluator, MutationOperator,
    Population, Selection,
};
use crate::models::{
    Advisory, Assignment, ConfigError, Dataset, GaConfig, GenerationStats, RunMetadata, RunResult,
};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cooperative cancellation handle, checked at generation boundaries.
///
/// Cancelling is not an error: the run returns the best result found so
/// far together with the stats recorded up to that point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why the generational loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    TargetReached,
    Converged,
    Cancelled,
    GenerationsExhausted,
}

/// Generational GA loop over one dataset snapshot.
///
/// Per generation: evaluate → record stats → stop tests → elites + breed
/// (select, crossover, mutate, repair) → swap. The driver owns the PRNG;
/// with a configured seed, identical inputs reproduce the stats stream and
/// final assignments exactly.
pub struct GaDriver<'a> {
    dataset: &'a Dataset,
    config: GaConfig,
    selection: Selection,
    crossover: CrossoverOperator,
    mutation: MutationOperator,
    elitism: Elitism,
    rng: Pcg64,
}

impl<'a> GaDriver<'a> {
    /// Builds a driver with operators derived from the config defaults:
    /// tournament selection, uniform crossover, swap mutation, unique
    /// elitism. Fails fast on any invalid parameter.
    pub fn new(dataset: &'a Dataset, config: GaConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        // Ranges were validated above; the constructors re-check them.
        let selection = Selection::tournament(config.tournament_size)
            .map_err(|_| ConfigError::TournamentTooSmall(config.tournament_size))?;
        let crossover = CrossoverOperator::uniform(config.crossover_rate, 0.5)
            .map_err(|_| ConfigError::CrossoverRateOutOfRange(config.crossover_rate))?;
        let mutation = MutationOperator::swap(
            config.mutation_rate,
            dataset.candidate_projects().to_vec(),
        )
        .map_err(|_| ConfigError::MutationRateOutOfRange(config.mutation_rate))?;
        let elitism = Elitism::new(config.elite_percentage)
            .map_err(|_| ConfigError::ElitePercentageOutOfRange(config.elite_percentage))?;

        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_rng(&mut rand::rng()),
        };

        Ok(Self {
            dataset,
            config,
            selection,
            crossover,
            mutation,
            elitism,
            rng,
        })
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_crossover(mut self, crossover: CrossoverOperator) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_mutation(mut self, mutation: MutationOperator) -> Self {
        self.mutation = mutation;
        self
    }

    pub fn with_elitism(mut self, elitism: Elitism) -> Self {
        self.elitism = elitism;
        self
    }

    /// Runs to completion without external cancellation.
    pub fn run(&mut self) -> RunResult {
        self.run_with_cancel(&CancelToken::new())
    }

    /// Executes the generational loop, honoring the cancellation token at
    /// generation boundaries.
    #[instrument(level = "info", skip_all, fields(students = self.dataset.student_count(), population = self.config.population_size))]
    pub fn run_with_cancel(&mut self, cancel: &CancelToken) -> RunResult {
        let started = Instant::now();
        let mut metadata = RunMetadata::new(self.config.clone());

        tracing::info!(run_id = %metadata.run_id, "starting assignment run");

        let evaluator = FitnessEvaluator::new(self.dataset, self.config.penalties);
        let checker = ConstraintChecker::new(self.dataset);

        let mut population = Population::random(
            self.config.population_size,
            self.dataset.student_count(),
            self.dataset.candidate_projects(),
            &mut self.rng,
        );
        evaluate_population(&evaluator, &mut population);
        if self.config.repair_enabled {
            for chromosome in population.chromosomes_mut() {
                checker.repair(chromosome, &mut self.rng);
            }
            evaluate_population(&evaluator, &mut population);
        }
        ensure_validity(&checker, &mut population);

        let mut stats: Vec<GenerationStats> = Vec::new();
        let mut best_ever: Option<Chromosome> = None;
        let mut stop_reason = StopReason::GenerationsExhausted;
        let mut generations_run = 0;

        for generation in 0..self.config.max_generations {
            population.sort_by_fitness();
            track_best_ever(&mut best_ever, &mut population);
            let best_ever_fitness = best_ever.as_ref().map(Chromosome::fitness).unwrap_or(0.0);

            stats.push(GenerationStats {
                generation,
                best_fitness: population.best_fitness(),
                average_fitness: population.average_fitness(),
                worst_fitness: population.worst_fitness(),
                std_dev: population.fitness_std_dev(),
                valid_count: population.count_valid(),
                best_ever_fitness,
            });

            if let Some(target) = self.config.target_fitness {
                if best_ever_fitness >= target {
                    stop_reason = StopReason::TargetReached;
                    generations_run = generation + 1;
                    break;
                }
            }
            if self.config.convergence_enabled && self.has_converged(&stats) {
                stop_reason = StopReason::Converged;
                generations_run = generation + 1;
                break;
            }
            if cancel.is_cancelled() {
                stop_reason = StopReason::Cancelled;
                generations_run = generation + 1;
                break;
            }

            let previous_best = population.best_fitness();
            let elite = self.elitism.select_elite(&mut population);
            tracing::debug!(stats = ?Elitism::elite_stats(&elite), "elite preserved");

            let mut next = Population::new(self.config.population_size);
            for chromosome in elite {
                next.push(chromosome);
            }

            while next.len() < self.config.population_size {
                let (i, j) = self.selection.select_pair(&population, &mut self.rng);
                let (mut first, mut second) =
                    self.crossover
                        .apply(population.get(i), population.get(j), &mut self.rng);

                self.mutation.mutate(&mut first, &mut self.rng);
                self.mutation.mutate(&mut second, &mut self.rng);

                if self.config.repair_enabled {
                    checker.repair(&mut first, &mut self.rng);
                    checker.repair(&mut second, &mut self.rng);
                }

                next.push(first);
                if next.len() < self.config.population_size {
                    next.push(second);
                }
            }

            evaluate_population(&evaluator, &mut next);
            ensure_validity(&checker, &mut next);

            if !self.elitism.verify_preserved(previous_best, &mut next) {
                tracing::warn!(
                    generation,
                    previous_best,
                    "elitism failed to preserve the best fitness"
                );
            }

            population = next;
            generations_run = generation + 1;
        }

        // A generation bred right before the cap is reached was never
        // inspected by the stats pass above.
        population.sort_by_fitness();
        track_best_ever(&mut best_ever, &mut population);

        let best = match best_ever {
            Some(chromosome) => chromosome,
            None => population.best().cloned().unwrap_or_else(|| {
                Chromosome::new(Vec::new())
            }),
        };

        metadata.elapsed_ms = started.elapsed().as_millis() as u64;
        metadata.generations_run = generations_run;
        metadata.best_fitness = best.fitness();

        tracing::info!(
            run_id = %metadata.run_id,
            reason = ?stop_reason,
            generations = generations_run,
            best_fitness = metadata.best_fitness,
            elapsed_ms = metadata.elapsed_ms,
            "assignment run finished"
        );

        let assignments = (0..best.len())
            .map(|position| {
                let student = self.dataset.student_at(position);
                let project_id = best.get(position);
                Assignment {
                    student_id: student.id,
                    project_id,
                    preference_rank: self.dataset.rank_of(student.id, project_id),
                }
            })
            .collect();

        let advisories = self.collect_advisories();
        let residual_violations = checker.violations(&best);

        RunResult {
            assignments,
            stats,
            metadata,
            advisories,
            residual_violations,
        }
    }

    /// Converged when the best-ever values across the sliding window have
    /// improved by less than the threshold in total.
    fn has_converged(&self, stats: &[GenerationStats]) -> bool {
        let window = self.config.convergence_generations;
        if stats.len() < window {
            return false;
        }
        let recent = &stats[stats.len() - window..];
        let improvement = recent[recent.len() - 1].best_ever_fitness - recent[0].best_ever_fitness;
        improvement < self.config.convergence_threshold
    }

    fn collect_advisories(&self) -> Vec<Advisory> {
        self.dataset
            .students()
            .iter()
            .filter(|student| self.dataset.projects_admitting(student.gpa).is_empty())
            .map(|student| Advisory::NoFeasibleProject {
                student_id: student.id,
                gpa: student.gpa,
            })
            .collect()
    }
}

/// Keeps a deep copy of the fittest chromosome seen so far. The population
/// must be sorted.
fn track_best_ever(best_ever: &mut Option<Chromosome>, population: &mut Population) {
    if let Some(best) = population.best() {
        let improved = best_ever
            .as_ref()
            .is_none_or(|current| best.fitness() > current.fitness());
        if improved {
            *best_ever = Some(best.clone());
        }
    }
}

/// Scores every chromosome whose fitness cache is stale. Elite carry-overs
/// keep their cached value.
fn evaluate_population(evaluator: &FitnessEvaluator<'_>, population: &mut Population) {
    #[cfg(feature = "parallel")]
    population
        .chromosomes_mut()
        .par_iter_mut()
        .for_each(|chromosome| {
            if !chromosome.is_evaluated() {
                evaluator.evaluate(chromosome);
            }
        });

    #[cfg(not(feature = "parallel"))]
    for chromosome in population.chromosomes_mut() {
        if !chromosome.is_evaluated() {
            evaluator.evaluate(chromosome);
        }
    }
}

/// Refreshes validity for chromosomes whose validity cache is stale, so
/// the per-generation valid count is meaningful even with repair disabled.
fn ensure_validity(checker: &ConstraintChecker<'_>, population: &mut Population) {
    for chromosome in population.chromosomes_mut() {
        if chromosome.validity().is_none() {
            checker.check_all(chromosome);
        }
    }
}
