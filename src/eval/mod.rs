//! Candidate evaluation: build a sandbox, run the test suite, report counts.
//!
//! The engine only depends on the [`Evaluator`] trait. The Maven-backed
//! implementation lives in [`WorkspaceEvaluator`], which glues together a
//! [`WorkspaceBuilder`], a [`TestRunner`] and a [`RetentionPolicy`].

mod evaluator;
mod runner;
pub mod surefire;
mod workspace;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkConfig;
use crate::core::Result;

pub use evaluator::{RetentionPolicy, WorkspaceEvaluator};
pub use runner::{MavenTestRunner, TestRunner, EXIT_SPAWN_FAILURE, EXIT_TIMEOUT};
pub use workspace::{WorkspaceBuilder, WorkspaceCleaner, WORKSPACE_PREFIX};

/// Result of compiling and testing one candidate.
///
/// Counts come straight from the test reports and may be inconsistent;
/// consumers clamp them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub tests_run: i32,
    pub failures: i32,
    pub errors: i32,
    pub skipped: i32,
    pub exit_code: i32,
    pub timed_out: bool,
    pub all_passed: bool,
    /// `classname#name` of each failed or errored test.
    #[serde(default)]
    pub failed_test_ids: Vec<String>,
    /// Combined stdout and stderr of the harness.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default)]
    pub duration_ms: u64,
}

impl TestOutcome {
    pub fn passed(&self) -> i32 {
        (self.tests_run.max(0) - self.skipped.max(0) - self.failures.max(0) - self.errors.max(0))
            .max(0)
    }

    /// Test failed, errored, timed out or the harness exited non-zero.
    pub fn is_failure(&self) -> bool {
        !self.all_passed || self.timed_out || self.exit_code != 0
    }
}

/// One candidate to evaluate.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    pub benchmark: &'a BenchmarkConfig,
    pub candidate_source: &'a str,
    /// Wall-clock limit for the build-and-test step.
    pub timeout: Duration,
}

impl<'a> EvaluationRequest<'a> {
    pub fn new(
        benchmark: &'a BenchmarkConfig,
        candidate_source: &'a str,
        timeout: Duration,
    ) -> Self {
        Self {
            benchmark,
            candidate_source,
            timeout,
        }
    }
}

/// Outcome plus what happened to the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub outcome: TestOutcome,
    /// Set only when the workspace was retained.
    pub workspace: Option<PathBuf>,
    pub retained: bool,
}

/// Compiles and tests candidate sources.
///
/// Implementations must be safe to call from several threads at once; each
/// call gets its own isolated sandbox. An `Err` means the infrastructure
/// failed, not the candidate.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<EvaluationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_is_clamped() {
        let o = TestOutcome {
            tests_run: 5,
            failures: 2,
            skipped: 1,
            ..TestOutcome::default()
        };
        assert_eq!(o.passed(), 2);

        let o = TestOutcome {
            tests_run: 1,
            errors: 4,
            ..TestOutcome::default()
        };
        assert_eq!(o.passed(), 0);
    }

    #[test]
    fn test_is_failure() {
        let ok = TestOutcome {
            tests_run: 3,
            all_passed: true,
            ..TestOutcome::default()
        };
        assert!(!ok.is_failure());
        assert!(TestOutcome {
            exit_code: 1,
            ..ok.clone()
        }
        .is_failure());
        assert!(TestOutcome {
            timed_out: true,
            ..ok
        }
        .is_failure());
    }

    #[test]
    fn test_outcome_json_shape() {
        let o = TestOutcome {
            tests_run: 2,
            failures: 1,
            failed_test_ids: vec!["ClampTest#high".to_string()],
            ..TestOutcome::default()
        };
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["tests_run"], 2);
        assert_eq!(json["failed_test_ids"][0], "ClampTest#high");
        assert!(json.get("output").is_none());

        let back: TestOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, o);
    }
}
