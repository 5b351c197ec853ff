//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::eval::RetentionPolicy;
use crate::fitness::FitnessFunction;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search budget and seeding.
    pub search: SearchConfig,
    /// Genetic operator parameters.
    pub genetic: GeneticConfig,
    /// Fitness weights.
    pub fitness: FitnessConfig,
    /// Sandbox evaluation.
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `MEND_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("MEND_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from directory, looking for mend.toml or .mend/mend.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `MEND_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("mend.toml")))
            .merge(Toml::file(dir.join(".mend/mend.toml")))
            .merge(Env::prefixed("MEND_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the search cannot run with.
    pub fn validate(&self) -> Result<()> {
        let s = &self.search;
        if s.population_size == 0 {
            return Err(Error::config("search.population_size must be > 0"));
        }
        if s.max_generations == 0 {
            return Err(Error::config("search.max_generations must be > 0"));
        }
        if s.timeout_secs == 0 {
            return Err(Error::config("search.timeout_secs must be > 0"));
        }

        let g = &self.genetic;
        for (name, p) in [
            ("genetic.delete_probability", g.delete_probability),
            ("genetic.mutation_probability", g.mutation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::config(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if g.tournament_size < 2 {
            return Err(Error::config(format!(
                "genetic.tournament_size must be >= 2, got {}",
                g.tournament_size
            )));
        }
        if g.max_attempts_per_child == 0 {
            return Err(Error::config("genetic.max_attempts_per_child must be > 0"));
        }

        self.fitness
            .function()
            .map_err(|e| Error::config(format!("fitness: {e}")))?;

        if self.evaluation.maven_command.trim().is_empty() {
            return Err(Error::config("evaluation.maven_command must not be blank"));
        }
        Ok(())
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Search budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Patches per generation.
    pub population_size: usize,
    /// Generations after the initial population.
    pub max_generations: usize,
    /// Wall-clock limit per candidate build-and-test.
    pub timeout_secs: u64,
    /// RNG seed; equal seeds give equal trajectories.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            max_generations: 50,
            timeout_secs: 20,
            seed: 42,
        }
    }
}

/// Genetic operator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Chance that an initial patch is a Delete.
    pub delete_probability: f64,
    /// Chance that a child is mutated after crossover.
    pub mutation_probability: f64,
    /// Only replace statements with donors of the same kind.
    pub same_kind_donors: bool,
    pub tournament_size: usize,
    /// Reject duplicate children within a generation.
    pub enforce_unique: bool,
    pub max_attempts_per_child: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            delete_probability: 0.1,
            mutation_probability: 0.94,
            same_kind_donors: true,
            tournament_size: 3,
            enforce_unique: true,
            max_attempts_per_child: 50,
        }
    }
}

/// Fitness weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub positive_weight: f64,
    /// Must be > 0.
    pub negative_weight: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            positive_weight: 1.0,
            negative_weight: 10.0,
        }
    }
}

impl FitnessConfig {
    pub fn function(&self) -> Result<FitnessFunction> {
        FitnessFunction::new(self.positive_weight, self.negative_weight)
    }
}

/// Sandbox evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Parallel evaluations (0 = available parallelism).
    pub jobs: usize,
    pub maven_command: String,
    pub retention: RetentionPolicy,
    /// Evaluate identical candidate sources once per run.
    pub cache: bool,
    /// Show a progress bar per generation.
    pub progress: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            maven_command: "mvn".to_string(),
            retention: RetentionPolicy::Never,
            cache: true,
            progress: false,
        }
    }
}
