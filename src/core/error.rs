//! Error types for the mend library.

use std::path::PathBuf;

use thiserror::Error;

use crate::program::{StatementId, StatementKind};

/// Result type alias using mend's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, indexing, patching or evaluating a program.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported language for the given file.
    #[error("Unsupported language for file: {path}")]
    UnsupportedLanguage { path: PathBuf },

    /// Parse error from tree-sitter, or a tree containing syntax errors.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A statement id that is not present in the index.
    #[error("Statement not found: {0}")]
    StatementNotFound(StatementId),

    /// Nothing left to sample from.
    #[error("No repair targets: {0}")]
    NoTargets(String),

    /// Structurally invalid patch.
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    /// Replace whose donor kind differs from the target kind.
    #[error("Kind mismatch: target is {target}, donor is {donor}")]
    KindMismatch {
        target: StatementKind,
        donor: StatementKind,
    },

    /// Operator received a patch with the wrong number of edits.
    #[error("Expected a single-edit patch, got {0} edits")]
    InvalidArity(usize),

    /// Selection over an empty population.
    #[error("Population is empty")]
    EmptyPopulation,

    /// Fault-localization data failed validation.
    #[error("Fault localization error: {0}")]
    FaultLocalization(String),

    /// Benchmark layout error.
    #[error("Benchmark error: {0}")]
    Benchmark(String),

    /// Sandbox workspace error.
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new fault-localization error.
    pub fn fault_localization(message: impl Into<String>) -> Self {
        Self::FaultLocalization(message.into())
    }

    /// Create a new benchmark error.
    pub fn benchmark(message: impl Into<String>) -> Self {
        Self::Benchmark(message.into())
    }

    /// Create a new workspace error.
    pub fn workspace(message: impl Into<String>) -> Self {
        Self::Workspace(message.into())
    }

    /// Create a new invalid patch error.
    pub fn invalid_patch(message: impl Into<String>) -> Self {
        Self::InvalidPatch(message.into())
    }

    /// Create a new parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::benchmark("missing buggy/");
        assert_eq!(err.to_string(), "Benchmark error: missing buggy/");

        let err = Error::StatementNotFound(StatementId::new(3, 5, 3, 15));
        assert_eq!(err.to_string(), "Statement not found: 3:5-3:15");

        let err = Error::InvalidArity(2);
        assert_eq!(err.to_string(), "Expected a single-edit patch, got 2 edits");
    }

    #[test]
    fn test_kind_mismatch_display() {
        let err = Error::KindMismatch {
            target: StatementKind::Return,
            donor: StatementKind::Expression,
        };
        assert_eq!(
            err.to_string(),
            "Kind mismatch: target is return, donor is expression"
        );
    }
}
