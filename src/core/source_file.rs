//! Source file representation.

use std::path::{Path, PathBuf};

use super::{Error, Language, Result};

/// A program source file with its text loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path to the file.
    pub path: PathBuf,
    /// Detected language.
    pub language: Language,
    /// File content.
    pub content: String,
}

impl SourceFile {
    /// Load a source file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let language = Language::detect(path).ok_or_else(|| Error::UnsupportedLanguage {
            path: path.to_path_buf(),
        })?;
        if !path.is_file() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            language,
            content,
        })
    }

    /// Create from existing content.
    pub fn from_content(
        path: impl Into<PathBuf>,
        language: Language,
        content: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            content: content.into(),
        }
    }

    /// File name without directories, e.g. `Program.java`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File stem, which for Java is the public class name.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Count total lines.
    pub fn total_lines(&self) -> usize {
        self.content.lines().count()
    }

    /// Whether the file has no non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
