//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::eval::RetentionPolicy;

/// Mend - evolutionary program repair guided by fault localization.
#[derive(Parser)]
#[command(name = "mend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of parallel test runs (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Evaluate identical candidates again instead of reusing their result
    #[arg(long)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search for a patch that makes a benchmark's tests pass
    #[command(alias = "repair")]
    Run(RunArgs),

    /// Check that benchmarks load, parse and have sampleable targets
    #[command(alias = "check")]
    Validate(BenchmarkSelection),

    /// Run a benchmark's tests against its buggy and fixed programs
    Test(TestArgs),
}

/// Which benchmarks to operate on.
#[derive(Args, Clone, Debug)]
pub struct BenchmarkSelection {
    /// Directory holding one subdirectory per benchmark
    #[arg(short = 'r', long, default_value = "benchmarks")]
    pub benchmarks_root: PathBuf,

    /// Benchmark name (directory under the root)
    #[arg(short, long, conflicts_with = "all", required_unless_present = "all")]
    pub name: Option<String>,

    /// Every benchmark under the root
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: BenchmarkSelection,

    /// Per-candidate build and test timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Patches per generation
    #[arg(long)]
    pub population_size: Option<usize>,

    /// Generations evolved after the initial population
    #[arg(long)]
    pub max_generations: Option<usize>,

    /// Keep candidate workspaces on disk
    #[arg(long, value_enum)]
    pub keep_workspace: Option<KeepWorkspace>,

    /// Show a progress bar per generation
    #[arg(long)]
    pub progress: bool,
}

#[derive(Args, Clone, Debug)]
pub struct TestArgs {
    #[command(flatten)]
    pub selection: BenchmarkSelection,

    /// Per-run build and test timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep the test workspaces on disk
    #[arg(long, value_enum)]
    pub keep_workspace: Option<KeepWorkspace>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    #[default]
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeepWorkspace {
    Never,
    Always,
    OnFailure,
}

impl From<KeepWorkspace> for RetentionPolicy {
    fn from(keep: KeepWorkspace) -> Self {
        match keep {
            KeepWorkspace::Never => RetentionPolicy::Never,
            KeepWorkspace::Always => RetentionPolicy::Always,
            KeepWorkspace::OnFailure => RetentionPolicy::OnFailure,
        }
    }
}

impl Cli {
    /// Fold the global flags into `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(jobs) = self.jobs {
            config.evaluation.jobs = jobs;
        }
        if self.no_cache {
            config.evaluation.cache = false;
        }
    }
}

impl RunArgs {
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(t) = self.timeout_secs {
            config.search.timeout_secs = t;
        }
        if let Some(seed) = self.seed {
            config.search.seed = seed;
        }
        if let Some(n) = self.population_size {
            config.search.population_size = n;
        }
        if let Some(n) = self.max_generations {
            config.search.max_generations = n;
        }
        if let Some(keep) = self.keep_workspace {
            config.evaluation.retention = keep.into();
        }
        if self.progress {
            config.evaluation.progress = true;
        }
    }
}

impl TestArgs {
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(t) = self.timeout_secs {
            config.search.timeout_secs = t;
        }
        if let Some(keep) = self.keep_workspace {
            config.evaluation.retention = keep.into();
        }
    }
}
