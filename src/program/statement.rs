//! Statement identities and per-language statement classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::core::Language;

/// Positional identity of a statement in one parse of a fixed source text.
///
/// Lines and columns are 1-based and the end column is inclusive, so a
/// statement `return x;` starting at the fifth column of line 3 is
/// `3:5-3:13`. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementId {
    pub begin_line: u32,
    pub begin_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl StatementId {
    pub fn new(begin_line: u32, begin_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            begin_line,
            begin_col,
            end_line,
            end_col,
        }
    }

    /// Identity of a syntax node's source range.
    pub fn of_node(node: &Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            begin_line: start.row as u32 + 1,
            begin_col: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            // tree-sitter's exclusive 0-based end equals the inclusive 1-based one
            end_col: end.column as u32,
        }
    }

    /// Number of lines spanned minus one; zero for single-line statements.
    pub fn line_span(&self) -> u32 {
        self.end_line - self.begin_line
    }

    /// Whether `line` falls within `[begin_line, end_line]`.
    pub fn contains_line(&self, line: u32) -> bool {
        self.begin_line <= line && line <= self.end_line
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.begin_line, self.begin_col, self.end_line, self.end_col
        )
    }
}

/// Discrete statement category used for type-compatible donor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Block,
    Expression,
    Declaration,
    Assignment,
    If,
    Switch,
    While,
    DoWhile,
    For,
    ForEach,
    Return,
    Break,
    Continue,
    Throw,
    Try,
    With,
    Labeled,
    Assert,
    Yield,
    Synchronized,
    ConstructorCall,
    Goto,
    Pass,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Expression => "expression",
            Self::Declaration => "declaration",
            Self::Assignment => "assignment",
            Self::If => "if",
            Self::Switch => "switch",
            Self::While => "while",
            Self::DoWhile => "do_while",
            Self::For => "for",
            Self::ForEach => "for_each",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Throw => "throw",
            Self::Try => "try",
            Self::With => "with",
            Self::Labeled => "labeled",
            Self::Assert => "assert",
            Self::Yield => "yield",
            Self::Synchronized => "synchronized",
            Self::ConstructorCall => "constructor_call",
            Self::Goto => "goto",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use StatementKind as K;

const JAVA_STATEMENTS: &[(&str, StatementKind)] = &[
    ("block", K::Block),
    ("expression_statement", K::Expression),
    ("local_variable_declaration", K::Declaration),
    ("if_statement", K::If),
    ("switch_expression", K::Switch),
    ("while_statement", K::While),
    ("do_statement", K::DoWhile),
    ("for_statement", K::For),
    ("enhanced_for_statement", K::ForEach),
    ("return_statement", K::Return),
    ("break_statement", K::Break),
    ("continue_statement", K::Continue),
    ("throw_statement", K::Throw),
    ("try_statement", K::Try),
    ("try_with_resources_statement", K::Try),
    ("labeled_statement", K::Labeled),
    ("assert_statement", K::Assert),
    ("yield_statement", K::Yield),
    ("synchronized_statement", K::Synchronized),
    ("explicit_constructor_invocation", K::ConstructorCall),
];

const GO_STATEMENTS: &[(&str, StatementKind)] = &[
    ("block", K::Block),
    ("expression_statement", K::Expression),
    ("send_statement", K::Expression),
    ("inc_statement", K::Expression),
    ("dec_statement", K::Expression),
    ("go_statement", K::Expression),
    ("defer_statement", K::Expression),
    ("assignment_statement", K::Assignment),
    ("short_var_declaration", K::Declaration),
    ("var_declaration", K::Declaration),
    ("const_declaration", K::Declaration),
    ("if_statement", K::If),
    ("expression_switch_statement", K::Switch),
    ("type_switch_statement", K::Switch),
    ("select_statement", K::Switch),
    ("for_statement", K::For),
    ("return_statement", K::Return),
    ("break_statement", K::Break),
    ("continue_statement", K::Continue),
    ("goto_statement", K::Goto),
    ("fallthrough_statement", K::Goto),
    ("labeled_statement", K::Labeled),
];

const RUST_STATEMENTS: &[(&str, StatementKind)] = &[
    ("block", K::Block),
    ("expression_statement", K::Expression),
    ("let_declaration", K::Declaration),
];

const PYTHON_STATEMENTS: &[(&str, StatementKind)] = &[
    ("block", K::Block),
    ("expression_statement", K::Expression),
    ("if_statement", K::If),
    ("match_statement", K::Switch),
    ("while_statement", K::While),
    ("for_statement", K::ForEach),
    ("return_statement", K::Return),
    ("break_statement", K::Break),
    ("continue_statement", K::Continue),
    ("raise_statement", K::Throw),
    ("try_statement", K::Try),
    ("with_statement", K::With),
    ("assert_statement", K::Assert),
    ("delete_statement", K::Expression),
    ("global_statement", K::Declaration),
    ("nonlocal_statement", K::Declaration),
    ("pass_statement", K::Pass),
];

const JS_STATEMENTS: &[(&str, StatementKind)] = &[
    ("statement_block", K::Block),
    ("expression_statement", K::Expression),
    ("lexical_declaration", K::Declaration),
    ("variable_declaration", K::Declaration),
    ("if_statement", K::If),
    ("switch_statement", K::Switch),
    ("while_statement", K::While),
    ("do_statement", K::DoWhile),
    ("for_statement", K::For),
    ("for_in_statement", K::ForEach),
    ("return_statement", K::Return),
    ("break_statement", K::Break),
    ("continue_statement", K::Continue),
    ("throw_statement", K::Throw),
    ("try_statement", K::Try),
    ("labeled_statement", K::Labeled),
    ("empty_statement", K::Pass),
];

const C_STATEMENTS: &[(&str, StatementKind)] = &[
    ("compound_statement", K::Block),
    ("expression_statement", K::Expression),
    ("declaration", K::Declaration),
    ("if_statement", K::If),
    ("switch_statement", K::Switch),
    ("while_statement", K::While),
    ("do_statement", K::DoWhile),
    ("for_statement", K::For),
    ("for_range_loop", K::ForEach),
    ("return_statement", K::Return),
    ("break_statement", K::Break),
    ("continue_statement", K::Continue),
    ("throw_statement", K::Throw),
    ("try_statement", K::Try),
    ("goto_statement", K::Goto),
    ("labeled_statement", K::Labeled),
];

const CSHARP_STATEMENTS: &[(&str, StatementKind)] = &[
    ("block", K::Block),
    ("expression_statement", K::Expression),
    ("local_declaration_statement", K::Declaration),
    ("if_statement", K::If),
    ("switch_statement", K::Switch),
    ("while_statement", K::While),
    ("do_statement", K::DoWhile),
    ("for_statement", K::For),
    ("foreach_statement", K::ForEach),
    ("return_statement", K::Return),
    ("break_statement", K::Break),
    ("continue_statement", K::Continue),
    ("throw_statement", K::Throw),
    ("try_statement", K::Try),
    ("using_statement", K::With),
    ("lock_statement", K::Synchronized),
    ("yield_statement", K::Yield),
    ("goto_statement", K::Goto),
    ("labeled_statement", K::Labeled),
    ("empty_statement", K::Pass),
];

/// Node kinds whose children form a sequence of statements.
pub(crate) fn container_kinds(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Java => &[
            "block",
            "constructor_body",
            "switch_block_statement_group",
            "program",
        ],
        Language::Go => &[
            "block",
            "statement_list",
            "expression_case",
            "default_case",
            "type_case",
            "communication_case",
        ],
        Language::Rust => &["block"],
        Language::Python => &["block", "module"],
        Language::TypeScript | Language::Tsx | Language::JavaScript | Language::Jsx => &[
            "statement_block",
            "program",
            "switch_case",
            "switch_default",
        ],
        Language::C | Language::Cpp => &["compound_statement", "case_statement"],
        Language::CSharp => &["block", "switch_section"],
    }
}

/// Statement kinds that also occur in non-statement positions, such as a
/// `for` initializer or an operand. They only count in statement position.
fn positional_kinds(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Java => &["local_variable_declaration", "switch_expression"],
        Language::Go => &["var_declaration", "const_declaration"],
        Language::C | Language::Cpp => &["declaration"],
        Language::Rust => &["let_declaration", "expression_statement"],
        _ => &[],
    }
}

fn statement_table(lang: Language) -> &'static [(&'static str, StatementKind)] {
    match lang {
        Language::Java => JAVA_STATEMENTS,
        Language::Go => GO_STATEMENTS,
        Language::Rust => RUST_STATEMENTS,
        Language::Python => PYTHON_STATEMENTS,
        Language::TypeScript | Language::Tsx | Language::JavaScript | Language::Jsx => {
            JS_STATEMENTS
        }
        Language::C | Language::Cpp => C_STATEMENTS,
        Language::CSharp => CSHARP_STATEMENTS,
    }
}

fn lookup(lang: Language, node_kind: &str) -> Option<StatementKind> {
    statement_table(lang)
        .iter()
        .find(|(kind, _)| *kind == node_kind)
        .map(|(_, k)| *k)
}

/// Classify a syntax node as a statement, if it is one.
pub(crate) fn classify(lang: Language, node: &Node<'_>) -> Option<StatementKind> {
    if !node.is_named() {
        return None;
    }
    let kind = lookup(lang, node.kind())?;

    if positional_kinds(lang).contains(&node.kind()) {
        if !in_statement_position(lang, node) {
            return None;
        }
    }

    if lang == Language::Python && kind == K::Expression {
        let assigns = node
            .named_child(0)
            .map(|c| matches!(c.kind(), "assignment" | "augmented_assignment"))
            .unwrap_or(false);
        if assigns {
            return Some(K::Assignment);
        }
    }

    Some(kind)
}

/// Fields that hold a nested statement, e.g. the body of a loop.
const STATEMENT_SLOTS: &[&str] = &["body", "consequence", "alternative"];

/// Whether a node occupies a statement slot: directly inside a container,
/// as a labeled statement, or as a nested statement body of its parent.
fn in_statement_position(lang: Language, node: &Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    if container_kinds(lang).contains(&parent.kind()) {
        return true;
    }
    if lookup(lang, parent.kind()).is_none() {
        return false;
    }
    if parent.kind() == "labeled_statement" {
        return true;
    }
    STATEMENT_SLOTS
        .iter()
        .any(|field| parent.child_by_field_name(*field).as_ref() == Some(node))
}

/// Whether a node sits inside a statement container, which makes it
/// removable without leaving a hole in the grammar.
pub(crate) fn in_container(lang: Language, node: &Node<'_>) -> bool {
    node.parent()
        .map(|p| container_kinds(lang).contains(&p.kind()))
        .unwrap_or(false)
}

/// Whether a node is the only statement among its container's children.
pub(crate) fn is_sole_statement(lang: Language, node: &Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let mut cursor = parent.walk();
    let statements = parent
        .named_children(&mut cursor)
        .filter(|c| classify(lang, c).is_some())
        .count();
    statements == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_id_display() {
        let id = StatementId::new(12, 9, 12, 20);
        assert_eq!(id.to_string(), "12:9-12:20");
        assert_eq!(id.line_span(), 0);
        assert!(id.contains_line(12));
        assert!(!id.contains_line(13));
    }

    #[test]
    fn test_statement_id_orders_by_position() {
        let a = StatementId::new(3, 5, 3, 10);
        let b = StatementId::new(3, 12, 3, 20);
        let c = StatementId::new(4, 1, 4, 2);
        let mut ids = vec![c, b, a];
        ids.sort();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StatementKind::ForEach).unwrap();
        assert_eq!(json, "\"for_each\"");
        assert_eq!(StatementKind::DoWhile.to_string(), "do_while");
    }

    #[test]
    fn test_every_language_has_a_block_kind() {
        for lang in [
            Language::Java,
            Language::Go,
            Language::Rust,
            Language::Python,
            Language::TypeScript,
            Language::C,
            Language::CSharp,
        ] {
            assert!(
                statement_table(lang).iter().any(|(_, k)| *k == K::Block),
                "{lang} has no block statement"
            );
        }
    }
}
