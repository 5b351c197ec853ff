//! Core types shared across the repair pipeline.

mod error;
mod language;
pub mod progress;
mod source_file;

pub use error::{Error, Result};
pub use language::Language;
pub use source_file::SourceFile;
