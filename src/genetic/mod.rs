//! Genetic operators over single-edit patches.
//!
//! All randomness flows through an explicitly passed `Rng`, so a run is
//! reproducible from its seed as long as the operators are driven from a
//! single thread.

mod crossover;
mod donors;
mod initializer;
mod mutator;
mod producer;
pub mod retry;
mod selection;

pub use crossover::SingleEditCrossover;
pub use donors::DonorPool;
pub use initializer::{PopulationInitializer, ATTEMPTS_PER_SLOT};
pub use mutator::{SingleEditMutator, MUTATION_ATTEMPTS};
pub use producer::NextGenerationProducer;
pub use selection::{Individual, ParentSelector, TournamentSelection};
