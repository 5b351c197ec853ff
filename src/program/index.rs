//! Statement index over one parsed program snapshot.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::core::{Error, Language, Result, SourceFile};
use crate::parser::Parser;

use super::statement::{classify, in_container, is_sole_statement};
use super::{StatementId, StatementKind};

/// How a statement can be taken out of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The statement sits in a statement list and can simply be cut out.
    Detach,
    /// The grammar needs something in its place; the language's empty
    /// statement is substituted.
    Substitute,
}

/// One indexed statement.
#[derive(Debug, Clone)]
pub struct StatementNode {
    pub id: StatementId,
    pub kind: StatementKind,
    /// Grammar node kind, e.g. `return_statement`.
    pub node_kind: &'static str,
    pub byte_range: Range<usize>,
    pub removal: Removal,
}

/// All statements of one program snapshot, in pre-order.
///
/// Built once per source text and never mutated. When two statement
/// nodes cover exactly the same range the outermost one owns the id.
#[derive(Debug, Clone)]
pub struct StatementIndex {
    path: PathBuf,
    language: Language,
    source: String,
    order: Vec<StatementId>,
    nodes: HashMap<StatementId, StatementNode>,
}

impl StatementIndex {
    /// Parse `source` and index its statements.
    pub fn build(parser: &Parser, source: &str, language: Language, path: &Path) -> Result<Self> {
        let parsed = parser.parse(source.as_bytes(), language, path)?;

        let mut order = Vec::new();
        let mut nodes = HashMap::new();

        let mut cursor = parsed.tree.walk();
        'walk: loop {
            let node = cursor.node();
            if let Some(kind) = classify(language, &node) {
                let id = StatementId::of_node(&node);
                if !nodes.contains_key(&id) {
                    let removal = if !in_container(language, &node)
                        || (language.is_indentation_scoped() && is_sole_statement(language, &node))
                    {
                        Removal::Substitute
                    } else {
                        Removal::Detach
                    };
                    order.push(id);
                    nodes.insert(
                        id,
                        StatementNode {
                            id,
                            kind,
                            node_kind: node.kind(),
                            byte_range: node.byte_range(),
                            removal,
                        },
                    );
                }
            }

            if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }

        tracing::debug!(
            "Indexed {} statements in {}",
            order.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            language,
            source: source.to_string(),
            order,
            nodes,
        })
    }

    /// Index a loaded source file.
    pub fn from_source(parser: &Parser, file: &SourceFile) -> Result<Self> {
        Self::build(parser, &file.content, file.language, &file.path)
    }

    /// Look up a statement; unknown ids are an error.
    pub fn get(&self, id: StatementId) -> Result<&StatementNode> {
        self.nodes.get(&id).ok_or(Error::StatementNotFound(id))
    }

    pub fn contains(&self, id: StatementId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: StatementId) -> Result<StatementKind> {
        self.get(id).map(|n| n.kind)
    }

    /// Exact source text of a statement.
    pub fn text(&self, id: StatementId) -> Result<&str> {
        let node = self.get(id)?;
        Ok(&self.source[node.byte_range.clone()])
    }

    /// All ids in traversal order.
    pub fn ids(&self) -> &[StatementId] {
        &self.order
    }

    /// All statements in traversal order.
    pub fn statements(&self) -> impl Iterator<Item = &StatementNode> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines in the indexed source.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}
