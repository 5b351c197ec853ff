//! Fault-localization providers.

use crate::benchmark::BenchmarkConfig;
use crate::core::{Error, Result};

use super::FaultLocalization;

/// Source of validated fault-localization data for a benchmark.
pub trait FaultLocalizationProvider: Send + Sync {
    fn load_for(&self, benchmark: &BenchmarkConfig) -> Result<FaultLocalization>;
}

/// Reads `faultloc.json` next to the benchmark sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFaultLocProvider;

impl JsonFaultLocProvider {
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate raw JSON against a source of `line_count` lines.
    pub fn parse(raw: &str, line_count: usize) -> Result<FaultLocalization> {
        let parsed: FaultLocalization = serde_json::from_str(raw)
            .map_err(|e| Error::fault_localization(format!("malformed JSON: {e}")))?;
        parsed.validate(line_count)
    }
}

impl FaultLocalizationProvider for JsonFaultLocProvider {
    fn load_for(&self, benchmark: &BenchmarkConfig) -> Result<FaultLocalization> {
        let raw = std::fs::read_to_string(&benchmark.faultloc_path)?;
        let fl = Self::parse(&raw, benchmark.buggy.total_lines())?;
        tracing::debug!(
            "Loaded {} weighted lines for {}",
            fl.statements.len(),
            benchmark.name
        );
        Ok(fl)
    }
}
