//! Tree-sitter based multi-language parser.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tree_sitter::{Language as TsLanguage, Node, Parser as TsParser, Tree};

use crate::core::{Error, Language, Result, SourceFile};

/// Thread-safe parser pool for multi-language parsing.
pub struct Parser {
    /// Cached parsers per language.
    parsers: Mutex<HashMap<Language, TsParser>>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {
            parsers: Mutex::new(HashMap::new()),
        }
    }

    /// Parse a loaded source file.
    pub fn parse_source(&self, file: &SourceFile) -> Result<ParseResult> {
        self.parse(file.content.as_bytes(), file.language, &file.path)
    }

    /// Parse content with explicit language.
    ///
    /// A tree that contains error or missing nodes is rejected: patches
    /// are only ever computed against well-formed programs.
    pub fn parse(&self, content: &[u8], lang: Language, path: &Path) -> Result<ParseResult> {
        let ts_lang = get_tree_sitter_language(lang)?;

        let tree = {
            let mut parsers = self.parsers.lock();
            let parser = match parsers.entry(lang) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    let mut p = TsParser::new();
                    p.set_language(&ts_lang)
                        .map_err(|err| Error::parse(path, err.to_string()))?;
                    e.insert(p)
                }
            };

            parser
                .parse(content, None)
                .ok_or_else(|| Error::parse(path, "Failed to parse file"))?
        };

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => format!(
                    "syntax error at line {}, column {}",
                    node.start_position().row + 1,
                    node.start_position().column + 1
                ),
                None => "syntax error".to_string(),
            };
            return Err(Error::parse(path, message));
        }

        Ok(ParseResult {
            tree: Arc::new(tree),
            source: content.to_vec(),
            language: lang,
            path: path.to_path_buf(),
        })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Result of parsing a source file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed syntax tree.
    pub tree: Arc<Tree>,
    /// Original source content.
    pub source: Vec<u8>,
    /// Detected language.
    pub language: Language,
    /// File path.
    pub path: std::path::PathBuf,
}

impl ParseResult {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: &Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Get tree-sitter language for a Language enum value.
pub fn get_tree_sitter_language(lang: Language) -> Result<TsLanguage> {
    let ts_lang = match lang {
        Language::Go => tree_sitter_go::LANGUAGE,
        Language::Rust => tree_sitter_rust::LANGUAGE,
        Language::Python => tree_sitter_python::LANGUAGE,
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
        Language::JavaScript | Language::Jsx => tree_sitter_javascript::LANGUAGE,
        Language::Java => tree_sitter_java::LANGUAGE,
        Language::C => tree_sitter_c::LANGUAGE,
        Language::Cpp => tree_sitter_cpp::LANGUAGE,
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE,
    };
    Ok(ts_lang.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_java() {
        let parser = Parser::new();
        let content = b"class A {\n  int f() { return 1; }\n}\n";
        let result = parser
            .parse(content, Language::Java, Path::new("A.java"))
            .unwrap();

        assert_eq!(result.language, Language::Java);
        assert_eq!(result.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_rejects_syntax_errors() {
        let parser = Parser::new();
        let content = b"class A {\n  int f() { return 1 \n}\n";
        let err = parser
            .parse(content, Language::Java, Path::new("A.java"))
            .unwrap_err();

        match err {
            Error::Parse { path, message } => {
                assert_eq!(path, Path::new("A.java"));
                assert!(message.contains("syntax error"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_is_reused_across_calls() {
        let parser = Parser::new();
        for _ in 0..3 {
            parser
                .parse(b"def f():\n    return 1\n", Language::Python, Path::new("f.py"))
                .unwrap();
        }
        assert_eq!(parser.parsers.lock().len(), 1);
    }
}
