mod chromosome;
mod constraints;
mod crossover;
mod driver;
mod elitism;
mod evaluator;
mod mutation;
mod population;
mod selection;

pub use chromosome::Chromosome;
pub use constraints::{
    CapacityViolation, ConstraintChecker, ConstraintViolations, GpaViolation, PartnerViolation,
};
pub use crossover::{CrossoverError, CrossoverKind, CrossoverOperator};
pub use driver::{CancelToken, GaDriver};
pub use elitism::{EliteStats, Elitism, ElitismError};
pub use evaluator::{FitnessBreakdown, FitnessEvaluator};
pub use mutation::{MutationError, MutationKind, MutationOperator};
pub use population::Population;
pub use selection::{Selection, TournamentSizeError};
