//! Generational repair search.
//!
//! One run moves through
//!
//! ```text
//! Init -> EvaluatingInitial -> Evolving(1..=max_generations) -> Succeeded | Exhausted
//! ```
//!
//! The statement index and the weighted sampler are built once from the
//! buggy source. Every random draw happens on the calling thread from a
//! single seeded `StdRng`; only test execution is fanned out, so a run is
//! reproducible from its seed.

mod candidate;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::benchmark::{BenchmarkConfig, LoadedBenchmark};
use crate::config::Config;
use crate::core::{Error, Result};
use crate::eval::{Evaluator, TestOutcome};
use crate::faultloc::{FaultLocalization, WeightedSampler};
use crate::fitness::FitnessFunction;
use crate::genetic::{
    DonorPool, NextGenerationProducer, PopulationInitializer, SingleEditCrossover,
    SingleEditMutator, TournamentSelection,
};
use crate::parser::Parser;
use crate::patch::{Patch, PatchApplier};
use crate::program::StatementIndex;

pub use candidate::{CandidateEvaluator, EvaluatedCandidate};

/// Knobs of a single repair run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub max_generations: usize,
    pub population_size: usize,
    /// Wall-clock limit per candidate evaluation.
    pub timeout: Duration,
    pub seed: u64,
    pub delete_probability: f64,
    pub mutation_probability: f64,
    /// Restrict donors to statements of the target's kind.
    pub same_kind: bool,
    pub tournament_size: usize,
    pub enforce_unique: bool,
    pub max_attempts_per_child: usize,
    /// Evaluation workers; 0 means available parallelism.
    pub jobs: usize,
    pub cache: bool,
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_generations: 50,
            population_size: 10,
            timeout: Duration::from_secs(20),
            seed: 42,
            delete_probability: 0.1,
            mutation_probability: 0.94,
            same_kind: true,
            tournament_size: 3,
            enforce_unique: true,
            max_attempts_per_child: 50,
            jobs: 0,
            cache: true,
            progress: false,
        }
    }
}

impl RunConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_generations: config.search.max_generations,
            population_size: config.search.population_size,
            timeout: Duration::from_secs(config.search.timeout_secs),
            seed: config.search.seed,
            delete_probability: config.genetic.delete_probability,
            mutation_probability: config.genetic.mutation_probability,
            same_kind: config.genetic.same_kind_donors,
            tournament_size: config.genetic.tournament_size,
            enforce_unique: config.genetic.enforce_unique,
            max_attempts_per_child: config.genetic.max_attempts_per_child,
            jobs: config.evaluation.jobs,
            cache: config.evaluation.cache,
            progress: config.evaluation.progress,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidArgument(
                "population size must be > 0".to_string(),
            ));
        }
        if self.max_generations == 0 {
            return Err(Error::InvalidArgument(
                "max generations must be > 0".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidArgument("timeout must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Where a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Succeeded,
    Exhausted,
    /// Not a single initial candidate could be applied and evaluated.
    NoEvaluableCandidates,
}

/// Outcome of a repair run.
#[derive(Debug, Clone, Serialize)]
pub struct RepairResult {
    pub benchmark: String,
    pub success: bool,
    pub phase: SearchPhase,
    /// Source with the winning (or best) patch applied.
    pub realized_source: Option<String>,
    pub outcome: Option<TestOutcome>,
    pub patch: Option<Patch>,
    /// `None` when no candidate was scored; negative infinity serializes as null.
    pub fitness: Option<f64>,
    /// Generations evolved after the initial population.
    pub generations: usize,
    /// Calls made to the evaluator.
    pub evaluations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RepairResult {
    fn from_candidate(
        benchmark: &str,
        phase: SearchPhase,
        candidate: EvaluatedCandidate,
        generations: usize,
        evaluations: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            success: phase == SearchPhase::Succeeded,
            phase,
            realized_source: candidate.source,
            outcome: candidate.outcome,
            patch: Some(candidate.patch),
            fitness: Some(candidate.fitness),
            generations,
            evaluations,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn empty(benchmark: &str, evaluations: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            success: false,
            phase: SearchPhase::NoEvaluableCandidates,
            realized_source: None,
            outcome: None,
            patch: None,
            fitness: None,
            generations: 0,
            evaluations,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// GenProg-style single-edit repair.
pub struct RepairEngine {
    parser: Parser,
    evaluator: Arc<dyn Evaluator>,
    fitness: FitnessFunction,
}

impl RepairEngine {
    pub fn new(evaluator: Arc<dyn Evaluator>, fitness: FitnessFunction) -> Self {
        Self {
            parser: Parser::new(),
            evaluator,
            fitness,
        }
    }

    pub fn repair_loaded(
        &self,
        loaded: &LoadedBenchmark,
        config: &RunConfig,
    ) -> Result<RepairResult> {
        self.repair(&loaded.config, &loaded.fault_localization, config)
    }

    /// Search for a patch that makes the benchmark's tests pass.
    ///
    /// Fails before any evaluation when the buggy source does not parse or
    /// the fault localization leaves nothing to sample. Everything after
    /// that is recovered per candidate.
    pub fn repair(
        &self,
        benchmark: &BenchmarkConfig,
        fault_localization: &FaultLocalization,
        config: &RunConfig,
    ) -> Result<RepairResult> {
        config.validate()?;
        let started_at = Utc::now();
        let name = benchmark.name.as_str();

        // Init
        let index = StatementIndex::from_source(&self.parser, &benchmark.buggy)?;
        tracing::info!("Indexed {} statements in {}", index.len(), name);
        let sampler = WeightedSampler::new(&index, fault_localization)?;
        tracing::info!(
            "Sampling over {} targets (total weight {})",
            sampler.len(),
            sampler.total()
        );
        let donors = DonorPool::new(&index, config.same_kind);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let initializer = PopulationInitializer::new(
            &sampler,
            &donors,
            config.population_size,
            config.delete_probability,
        )?;
        let producer = NextGenerationProducer::new(
            config.population_size,
            TournamentSelection::maximize(config.tournament_size, |c: &EvaluatedCandidate| {
                c.fitness
            })?,
            SingleEditCrossover::new(&donors),
            SingleEditMutator::new(&sampler, &donors, config.mutation_probability)?,
        )?
        .with_enforce_unique(config.enforce_unique)
        .with_max_attempts_per_child(config.max_attempts_per_child);

        let applier =
            PatchApplier::new(index.language(), index.path()).with_same_kind(config.same_kind);
        let candidates = CandidateEvaluator::new(
            benchmark,
            applier,
            Arc::clone(&self.evaluator),
            self.fitness,
            config.timeout,
            config.jobs,
        )?
        .with_cache(config.cache)
        .with_progress(config.progress);

        // EvaluatingInitial
        let mut population = candidates.evaluate_all(initializer.initialize(&mut rng), 0);
        if let Some(winner) = first_success(&population) {
            tracing::info!("Repaired {} in the initial population", name);
            return Ok(RepairResult::from_candidate(
                name,
                SearchPhase::Succeeded,
                winner,
                0,
                candidates.evaluations(),
                started_at,
            ));
        }
        if population.iter().all(|c| c.outcome.is_none()) {
            tracing::warn!("No initial candidate of {} could be evaluated", name);
            return Ok(RepairResult::empty(name, candidates.evaluations(), started_at));
        }
        let mut best = update_best(None, &population);

        // Evolving
        for generation in 1..=config.max_generations {
            let children = producer.produce(&mut rng, &population)?;
            population = candidates.evaluate_all(children, generation);

            if let Some(winner) = first_success(&population) {
                tracing::info!("Repaired {} in generation {}", name, generation);
                return Ok(RepairResult::from_candidate(
                    name,
                    SearchPhase::Succeeded,
                    winner,
                    generation,
                    candidates.evaluations(),
                    started_at,
                ));
            }
            best = update_best(best, &population);
            tracing::info!(
                "Generation {}/{}: best fitness {}",
                generation,
                config.max_generations,
                best.as_ref().map_or(f64::NEG_INFINITY, |b| b.fitness)
            );
        }

        tracing::info!(
            "Search for {} exhausted after {} generations",
            name,
            config.max_generations
        );
        match best {
            Some(best) => Ok(RepairResult::from_candidate(
                name,
                SearchPhase::Exhausted,
                best,
                config.max_generations,
                candidates.evaluations(),
                started_at,
            )),
            None => Ok(RepairResult::empty(name, candidates.evaluations(), started_at)),
        }
    }
}

/// Lowest-index successful candidate.
fn first_success(population: &[EvaluatedCandidate]) -> Option<EvaluatedCandidate> {
    population.iter().find(|c| c.is_success()).cloned()
}

/// Strict improvement only, so earlier candidates win ties.
fn update_best(
    best: Option<EvaluatedCandidate>,
    population: &[EvaluatedCandidate],
) -> Option<EvaluatedCandidate> {
    population.iter().fold(best, |best, candidate| match best {
        Some(b) if candidate.fitness > b.fitness => Some(candidate.clone()),
        Some(b) => Some(b),
        None => Some(candidate.clone()),
    })
}
