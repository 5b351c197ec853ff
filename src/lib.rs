//! Mend - evolutionary automated program repair.
//!
//! Mend searches for a small structural patch that makes a buggy program
//! pass its test suite. Candidate patches delete or replace whole
//! statements; targets are drawn in proportion to fault-localization
//! weights and donors are copied from elsewhere in the same program.
//!
//! # Supported Languages
//!
//! Java (evaluated through Maven), plus indexing and patching for Go, Rust,
//! Python, TypeScript, JavaScript, TSX/JSX, C, C++ and C#.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mend::benchmark::BenchmarkLoader;
//! use mend::engine::{RepairEngine, RunConfig};
//! use mend::eval::{RetentionPolicy, WorkspaceEvaluator};
//! use mend::faultloc::JsonFaultLocProvider;
//! use mend::fitness::FitnessFunction;
//!
//! let loader = BenchmarkLoader::new("benchmarks").unwrap();
//! let benchmark = loader.load_with("clamp", &JsonFaultLocProvider::new()).unwrap();
//! let evaluator = WorkspaceEvaluator::maven("mvn", RetentionPolicy::Never);
//! let engine = RepairEngine::new(Arc::new(evaluator), FitnessFunction::default());
//! let result = engine.repair_loaded(&benchmark, &RunConfig::default()).unwrap();
//! println!("repaired: {}", result.success);
//! ```

pub mod benchmark;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod eval;
pub mod faultloc;
pub mod fitness;
pub mod genetic;
pub mod output;
pub mod parser;
pub mod patch;
pub mod program;

pub use core::{Error, Result};
pub use engine::{RepairEngine, RepairResult, RunConfig};
