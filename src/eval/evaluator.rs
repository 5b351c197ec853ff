//! Sandbox-backed evaluator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Language, Result};

use super::runner::{MavenTestRunner, TestRunner};
use super::workspace::{WorkspaceBuilder, WorkspaceCleaner};
use super::{EvaluationRequest, EvaluationResult, Evaluator};

/// What happens to a sandbox after its tests ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    #[default]
    Never,
    Always,
    /// Keep sandboxes whose run failed, for inspection.
    OnFailure,
}

impl RetentionPolicy {
    pub fn keeps(self, failed: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::OnFailure => failed,
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Never => "never",
            Self::Always => "always",
            Self::OnFailure => "on_failure",
        })
    }
}

impl FromStr for RetentionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "never" => Ok(Self::Never),
            "always" => Ok(Self::Always),
            "on_failure" => Ok(Self::OnFailure),
            other => Err(Error::config(format!(
                "unknown retention policy '{other}' (expected never, always or on_failure)"
            ))),
        }
    }
}

/// Builds a fresh workspace per candidate, runs the suite, then keeps or
/// deletes the workspace according to the retention policy.
pub struct WorkspaceEvaluator {
    builder: WorkspaceBuilder,
    runner: Box<dyn TestRunner>,
    retention: RetentionPolicy,
}

impl WorkspaceEvaluator {
    pub fn new(
        builder: WorkspaceBuilder,
        runner: Box<dyn TestRunner>,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            builder,
            runner,
            retention,
        }
    }

    /// Maven evaluator invoking `maven_command`.
    pub fn maven(maven_command: &str, retention: RetentionPolicy) -> Self {
        Self::new(
            WorkspaceBuilder::new(),
            Box::new(MavenTestRunner::new(maven_command)),
            retention,
        )
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }
}

impl Evaluator for WorkspaceEvaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<EvaluationResult> {
        if request.benchmark.language() != Language::Java {
            return Err(Error::workspace(format!(
                "only Java benchmarks can be built, {} is {}",
                request.benchmark.name,
                request.benchmark.language()
            )));
        }
        if request.candidate_source.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "candidate source is empty".to_string(),
            ));
        }

        let dir = self.builder.build(request.benchmark, request.candidate_source)?;
        tracing::debug!("Evaluating candidate in {}", dir.display());

        let outcome = self.runner.run_tests(&dir, request.timeout);

        if self.retention.keeps(outcome.is_failure()) {
            Ok(EvaluationResult {
                outcome,
                workspace: Some(dir),
                retained: true,
            })
        } else {
            WorkspaceCleaner::delete_quietly(&dir);
            Ok(EvaluationResult {
                outcome,
                workspace: None,
                retained: false,
            })
        }
    }
}
