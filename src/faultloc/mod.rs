//! Fault localization: per-line suspiciousness and weighted target sampling.

mod json;
mod sampler;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

pub use json::{FaultLocalizationProvider, JsonFaultLocProvider};
pub use sampler::WeightedSampler;

/// Tolerance used when snapping weights onto the allowed levels.
pub const EPSILON: f64 = 1e-9;

/// The suspiciousness levels a line may carry.
pub const WEIGHT_LEVELS: [f64; 3] = [0.0, 0.1, 1.0];

/// Suspiciousness of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedLocation {
    pub line: u32,
    pub weight: f64,
}

impl WeightedLocation {
    pub fn new(line: u32, weight: f64) -> Self {
        Self { line, weight }
    }
}

/// Suspiciousness map for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultLocalization {
    pub file: String,
    #[serde(default)]
    pub statements: Vec<WeightedLocation>,
}

impl FaultLocalization {
    pub fn new(file: impl Into<String>, statements: Vec<WeightedLocation>) -> Self {
        Self {
            file: file.into(),
            statements,
        }
    }

    /// Validate against a source of `line_count` lines.
    ///
    /// Weights within [`EPSILON`] of an allowed level are snapped onto it,
    /// anything else is rejected. Lines must be unique and in range.
    /// Zero-weight lines are dropped afterwards and at least one positive
    /// line must remain.
    pub fn validate(mut self, line_count: usize) -> Result<Self> {
        if self.file.trim().is_empty() || self.statements.is_empty() {
            return Err(Error::fault_localization(
                "missing required fields `file` and `statements`",
            ));
        }

        let mut seen = HashSet::new();
        for location in &mut self.statements {
            if location.line == 0 || location.weight < -EPSILON {
                return Err(Error::fault_localization(format!(
                    "invalid line {} or weight {}",
                    location.line, location.weight
                )));
            }
            if location.line as usize > line_count {
                return Err(Error::fault_localization(format!(
                    "line {} out of range (source has {line_count} lines)",
                    location.line
                )));
            }
            location.weight = snap(location.weight).ok_or_else(|| {
                Error::fault_localization(format!(
                    "invalid weight {} on line {}",
                    location.weight, location.line
                ))
            })?;
            if !seen.insert(location.line) {
                return Err(Error::fault_localization(format!(
                    "duplicate line {}",
                    location.line
                )));
            }
        }

        self.statements.retain(|l| l.weight > EPSILON);
        if self.statements.is_empty() {
            return Err(Error::fault_localization("no locations with weight > 0.0"));
        }
        Ok(self)
    }

    /// Locations with positive weight.
    pub fn positive(&self) -> impl Iterator<Item = &WeightedLocation> + '_ {
        self.statements.iter().filter(|l| l.weight > 0.0)
    }
}

fn snap(weight: f64) -> Option<f64> {
    WEIGHT_LEVELS
        .iter()
        .copied()
        .find(|level| (weight - level).abs() <= EPSILON)
}
