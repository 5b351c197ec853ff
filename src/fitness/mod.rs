//! Scalar fitness of a test outcome.
//!
//! ```text
//! bad    = max(0, failures) + max(0, errors)
//! passed = max(0, tests_run - max(0, skipped) - bad)
//! score  = w_pos * passed - w_neg * bad
//! ```
//!
//! adjusted by fixed penalties for timeouts and empty runs and a large
//! bonus for a clean pass, so that any success outranks any partial credit.
//! A missing outcome scores negative infinity.

use serde::Serialize;

use crate::core::{Error, Result};
use crate::eval::TestOutcome;

pub const TIMEOUT_PENALTY: f64 = 1000.0;
/// Non-zero exit without a single test run, usually a compile error.
pub const BUILD_FAILURE_PENALTY: f64 = 2000.0;
pub const NO_TESTS_PENALTY: f64 = 50.0;
pub const SUCCESS_BONUS: f64 = 10_000.0;

/// Weighted pass/fail scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitnessFunction {
    positive_weight: f64,
    negative_weight: f64,
}

impl Default for FitnessFunction {
    fn default() -> Self {
        Self {
            positive_weight: 1.0,
            negative_weight: 10.0,
        }
    }
}

impl FitnessFunction {
    pub fn new(positive_weight: f64, negative_weight: f64) -> Result<Self> {
        if !positive_weight.is_finite() || positive_weight < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "positive weight must be finite and >= 0, got {positive_weight}"
            )));
        }
        if !negative_weight.is_finite() || negative_weight <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "negative weight must be finite and > 0, got {negative_weight}"
            )));
        }
        Ok(Self {
            positive_weight,
            negative_weight,
        })
    }

    pub fn positive_weight(&self) -> f64 {
        self.positive_weight
    }

    pub fn negative_weight(&self) -> f64 {
        self.negative_weight
    }

    /// Score an outcome; `None` means the candidate could not be evaluated.
    pub fn score(&self, outcome: Option<&TestOutcome>) -> f64 {
        let Some(o) = outcome else {
            return f64::NEG_INFINITY;
        };

        let bad = o.failures.max(0) as f64 + o.errors.max(0) as f64;
        let run = o.tests_run.max(0) as f64;
        let skipped = o.skipped.max(0) as f64;
        let passed = (run - skipped - bad).max(0.0);

        let mut score = self.positive_weight * passed - self.negative_weight * bad;

        if o.timed_out {
            score -= TIMEOUT_PENALTY;
        }
        if o.exit_code != 0 && o.tests_run == 0 {
            score -= BUILD_FAILURE_PENALTY;
        } else if o.exit_code == 0 && o.tests_run == 0 {
            score -= NO_TESTS_PENALTY;
        }
        if o.all_passed && !o.timed_out && o.exit_code == 0 {
            score += SUCCESS_BONUS;
        }

        score
    }
}

/// A candidate counts as a repair when every test passed within the time limit.
pub fn is_success(outcome: Option<&TestOutcome>) -> bool {
    outcome.is_some_and(|o| o.all_passed && !o.timed_out)
}
