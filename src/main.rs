//! Mend CLI - evolutionary program repair for benchmark programs.

use std::io::stdout;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser as _;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mend::benchmark::{BenchmarkConfig, BenchmarkLoader};
use mend::cli::{BenchmarkSelection, Cli, Command, OutputFormat};
use mend::config::Config;
use mend::core::progress::create_spinner;
use mend::engine::{RepairEngine, RunConfig};
use mend::eval::{EvaluationRequest, Evaluator, WorkspaceEvaluator};
use mend::faultloc::{JsonFaultLocProvider, WeightedSampler};
use mend::output::{Format, RepairReport, SuiteReport, ValidationReport};
use mend::parser::Parser;
use mend::patch::{EditDescription, Patch, PatchPrinter};
use mend::program::StatementIndex;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every selected benchmark met its command's goal.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };
    cli.apply_overrides(&mut config);

    let format = match cli.format {
        OutputFormat::Json => Format::Json,
        OutputFormat::Markdown => Format::Markdown,
        OutputFormat::Text => Format::Text,
    };

    match &cli.command {
        Command::Run(args) => {
            args.apply_overrides(&mut config);
            config.validate()?;
            run_repair(&args.selection, &config, format)
        }
        Command::Validate(selection) => {
            config.validate()?;
            run_validate(selection, format)
        }
        Command::Test(args) => {
            args.apply_overrides(&mut config);
            config.validate()?;
            run_suites(&args.selection, &config, format)
        }
    }
}

fn select(selection: &BenchmarkSelection) -> anyhow::Result<(BenchmarkLoader, Vec<String>)> {
    let loader = BenchmarkLoader::new(&selection.benchmarks_root)?;
    let names = match &selection.name {
        Some(name) => vec![name.clone()],
        None => loader.list_available(),
    };
    if names.is_empty() {
        anyhow::bail!(
            "no benchmarks found under {}",
            selection.benchmarks_root.display()
        );
    }
    Ok((loader, names))
}

fn run_repair(
    selection: &BenchmarkSelection,
    config: &Config,
    format: Format,
) -> anyhow::Result<bool> {
    let (loader, names) = select(selection)?;
    let evaluator = WorkspaceEvaluator::maven(
        &config.evaluation.maven_command,
        config.evaluation.retention,
    );
    let engine = RepairEngine::new(Arc::new(evaluator), config.fitness.function()?);
    let run_config = RunConfig::from_config(config);
    let provider = JsonFaultLocProvider::new();
    let parser = Parser::new();

    let mut all_repaired = true;
    for name in &names {
        let loaded = match loader.load_with(name, &provider) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Skipping {}: {}", name, e);
                all_repaired = false;
                continue;
            }
        };
        let result = match engine.repair_loaded(&loaded, &run_config) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Repair of {} failed: {}", name, e);
                all_repaired = false;
                continue;
            }
        };
        all_repaired &= result.success;

        let edits = match &result.patch {
            Some(patch) => describe(&parser, &loaded.config, patch)?,
            None => Vec::new(),
        };
        format.write(&RepairReport { result, edits }, &mut stdout())?;
    }
    Ok(all_repaired)
}

fn describe(
    parser: &Parser,
    benchmark: &BenchmarkConfig,
    patch: &Patch,
) -> anyhow::Result<Vec<EditDescription>> {
    let index = StatementIndex::from_source(parser, &benchmark.buggy)?;
    Ok(PatchPrinter::new(&index).describe(patch)?)
}

fn run_validate(selection: &BenchmarkSelection, format: Format) -> anyhow::Result<bool> {
    let (loader, names) = select(selection)?;
    let provider = JsonFaultLocProvider::new();
    let parser = Parser::new();

    let mut all_valid = true;
    for name in &names {
        let report = validate_one(&loader, &provider, &parser, name)
            .unwrap_or_else(|e| ValidationReport::failed(name, &e));
        all_valid &= report.is_valid();
        format.write(&report, &mut stdout())?;
    }
    Ok(all_valid)
}

fn validate_one(
    loader: &BenchmarkLoader,
    provider: &JsonFaultLocProvider,
    parser: &Parser,
    name: &str,
) -> mend::core::Result<ValidationReport> {
    let loaded = loader.load_with(name, provider)?;
    let index = StatementIndex::from_source(parser, &loaded.config.buggy)?;
    let sampler = WeightedSampler::new(&index, &loaded.fault_localization)?;
    Ok(ValidationReport {
        benchmark: name.to_string(),
        language: loaded.config.language().to_string(),
        statements: index.len(),
        weighted_lines: loaded.fault_localization.statements.len(),
        targets: sampler.len(),
        total_weight: sampler.total(),
        error: None,
    })
}

/// Runs the suite against the buggy and, when present, the fixed program.
/// Succeeds when every fixed program passes.
fn run_suites(
    selection: &BenchmarkSelection,
    config: &Config,
    format: Format,
) -> anyhow::Result<bool> {
    let (loader, names) = select(selection)?;
    let evaluator = WorkspaceEvaluator::maven(
        &config.evaluation.maven_command,
        config.evaluation.retention,
    );
    let timeout = Duration::from_secs(config.search.timeout_secs);

    let mut all_fixed_pass = true;
    for name in &names {
        let benchmark = loader.load(name)?;
        let mut programs = vec![("buggy", &benchmark.buggy)];
        if let Some(fixed) = &benchmark.fixed {
            programs.push(("fixed", fixed));
        }

        for (program, source) in programs {
            let request = EvaluationRequest::new(&benchmark, &source.content, timeout);
            let spinner = create_spinner(&format!("Testing {program} program of {name}"));
            let result = evaluator.evaluate(&request);
            spinner.finish_and_clear();
            let result =
                result.with_context(|| format!("{program} suite of {name} could not run"))?;
            if let Some(dir) = &result.workspace {
                if result.retained {
                    tracing::info!("Workspace retained at {}", dir.display());
                }
            }
            if program == "fixed" && result.outcome.is_failure() {
                all_fixed_pass = false;
            }
            let report = SuiteReport {
                benchmark: name.clone(),
                program: program.to_string(),
                outcome: result.outcome,
            };
            format.write(&report, &mut stdout())?;
        }
    }
    Ok(all_fixed_pass)
}
