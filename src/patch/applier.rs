//! Structural patch application over source text.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::core::{Error, Language, Result};
use crate::parser::Parser;
use crate::program::{Removal, StatementIndex, StatementNode};

use super::{EditOp, Patch};

/// Applies patches to one program's source text.
///
/// Every call re-parses the text it is given, so ids are resolved against
/// a fresh index and text outside edited regions is carried over byte for
/// byte.
pub struct PatchApplier {
    parser: Parser,
    language: Language,
    path: PathBuf,
    same_kind: bool,
}

/// One resolved edit: replace `range` of the working buffer with `text`.
#[derive(Debug)]
struct Splice {
    begin: (u32, u32),
    range: Range<usize>,
    text: String,
    detach: bool,
}

impl PatchApplier {
    pub fn new(language: Language, path: impl Into<PathBuf>) -> Self {
        Self {
            parser: Parser::new(),
            language,
            path: path.into(),
            same_kind: true,
        }
    }

    /// Reject Replace edits whose donor kind differs from the target kind.
    pub fn with_same_kind(mut self, same_kind: bool) -> Self {
        self.same_kind = same_kind;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `patch` to `source` and return the candidate source.
    pub fn apply(&self, source: &str, patch: &Patch) -> Result<String> {
        let index = StatementIndex::build(&self.parser, source, self.language, &self.path)?;

        let mut splices = Vec::with_capacity(patch.len());
        for edit in patch.edits() {
            splices.push(self.resolve(&index, edit)?);
        }

        for (i, a) in splices.iter().enumerate() {
            if splices[i + 1..].iter().any(|b| b.range == a.range) {
                return Err(Error::invalid_patch(format!(
                    "more than one edit targets {}..{}",
                    a.range.start, a.range.end
                )));
            }
        }

        // Later statements first; among equal starts the inner one first.
        splices.sort_by(|a, b| {
            b.begin
                .cmp(&a.begin)
                .then(a.range.end.cmp(&b.range.end))
        });

        let mut buffer = source.to_string();
        let mut applied: Vec<(Range<usize>, isize)> = Vec::new();
        for splice in splices {
            let mut end = splice.range.end as isize;
            for (done, delta) in &applied {
                if done.start >= splice.range.start && done.end <= splice.range.end {
                    end += delta;
                } else if done.start < splice.range.end {
                    return Err(Error::invalid_patch("edits overlap partially"));
                }
            }
            let start = splice.range.start;
            let end = end as usize;
            let (start, end) = if splice.detach {
                whole_line(&buffer, start, end)
            } else {
                (start, end)
            };

            let delta = splice.text.len() as isize - (end - start) as isize;
            buffer.replace_range(start..end, &splice.text);
            applied.push((splice.range, delta));
        }

        Ok(buffer)
    }

    fn resolve(&self, index: &StatementIndex, edit: &EditOp) -> Result<Splice> {
        match *edit {
            EditOp::Delete { target } => {
                let node = index.get(target)?;
                let (text, detach) = match node.removal {
                    Removal::Detach => (String::new(), true),
                    Removal::Substitute => (self.language.empty_statement().to_string(), false),
                };
                Ok(splice(node, text, detach))
            }
            EditOp::Replace { target, donor } => {
                if target == donor {
                    return Err(Error::invalid_patch(format!(
                        "replace donor equals target {target}"
                    )));
                }
                let target_node = index.get(target)?;
                let donor_node = index.get(donor)?;
                if self.same_kind && target_node.kind != donor_node.kind {
                    return Err(Error::KindMismatch {
                        target: target_node.kind,
                        donor: donor_node.kind,
                    });
                }

                let donor_text = index.text(donor)?;
                let text = if self.language.is_indentation_scoped() {
                    reindent(donor_text, donor.begin_col, target.begin_col)
                } else {
                    donor_text.to_string()
                };
                Ok(splice(target_node, text, false))
            }
        }
    }
}

fn splice(node: &StatementNode, text: String, detach: bool) -> Splice {
    Splice {
        begin: (node.id.begin_line, node.id.begin_col),
        range: node.byte_range.clone(),
        text,
        detach,
    }
}

/// Widen `[start, end)` to the whole line when nothing but whitespace
/// would remain on it.
fn whole_line(buffer: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = buffer[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = buffer[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(buffer.len());

    let before_blank = buffer[line_start..start].trim().is_empty();
    let after_blank = buffer[end..line_end].trim().is_empty();
    if before_blank && after_blank {
        (line_start, line_end)
    } else {
        (start, end)
    }
}

/// Shift continuation lines of `text` from column `from` to column `to`.
fn reindent(text: &str, from: u32, to: u32) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let mut out = String::with_capacity(text.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        if to > from {
            out.push_str(&" ".repeat((to - from) as usize));
            out.push_str(line);
        } else {
            let strip = (from - to) as usize;
            let indent = line.len() - line.trim_start_matches(' ').len();
            out.push_str(&line[indent.min(strip)..]);
        }
    }
    out
}
