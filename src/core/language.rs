//! Language detection and enumeration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Languages whose programs can be indexed and patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Tsx,
    Jsx,
    Java,
    C,
    Cpp,
    CSharp,
}

impl Language {
    /// Detect language from file path based on extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::from_extension(extension)
    }

    /// Get language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "py" => Some(Self::Python),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "tsx" => Some(Self::Tsx),
            "jsx" => Some(Self::Jsx),
            "java" => Some(Self::Java),
            "c" => Some(Self::C),
            "cpp" | "cc" | "cxx" => Some(Self::Cpp),
            "cs" => Some(Self::CSharp),
            _ => None,
        }
    }

    /// Get the display name for the language.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::TypeScript => "TypeScript",
            Self::JavaScript => "JavaScript",
            Self::Tsx => "TSX",
            Self::Jsx => "JSX",
            Self::Java => "Java",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
        }
    }

    /// Text that stands in for a removed statement when the grammar
    /// requires something in its place (an unbraced `if` body, a sole
    /// statement in a Python suite).
    pub fn empty_statement(&self) -> &'static str {
        match self {
            Self::Python => "pass",
            _ => "{}",
        }
    }

    /// Whether blocks are delimited by indentation rather than braces.
    pub fn is_indentation_scoped(&self) -> bool {
        matches!(self, Self::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
