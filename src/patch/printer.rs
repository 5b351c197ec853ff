//! Human-readable patch descriptions.

use serde::Serialize;

use crate::core::Result;
use crate::program::{StatementId, StatementIndex, StatementKind};

use super::{EditOp, Patch};

/// Description of one edit with before/after snippets.
#[derive(Debug, Clone, Serialize)]
pub struct EditDescription {
    pub op: &'static str,
    pub target: StatementId,
    pub kind: StatementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor: Option<StatementId>,
    pub before: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// Renders patches against the index of the program they were built for.
pub struct PatchPrinter<'a> {
    index: &'a StatementIndex,
}

impl<'a> PatchPrinter<'a> {
    pub fn new(index: &'a StatementIndex) -> Self {
        Self { index }
    }

    /// Describe every edit, ordered by target line.
    pub fn describe(&self, patch: &Patch) -> Result<Vec<EditDescription>> {
        let mut edits: Vec<&EditOp> = patch.edits().iter().collect();
        edits.sort_by_key(|e| e.target().begin_line);

        edits
            .into_iter()
            .map(|edit| {
                let target = edit.target();
                let kind = self.index.kind(target)?;
                let before = one_line(self.index.text(target)?);
                let after = match edit.donor() {
                    Some(donor) => Some(one_line(self.index.text(donor)?)),
                    None => None,
                };
                Ok(EditDescription {
                    op: if edit.is_replace() { "replace" } else { "delete" },
                    target,
                    kind,
                    donor: edit.donor(),
                    before,
                    after,
                })
            })
            .collect()
    }

    /// Plain-text rendering for terminal output.
    pub fn print(&self, patch: &Patch) -> Result<String> {
        let mut out = format!("Patch ({} edit(s))\n", patch.len());
        for (i, edit) in self.describe(patch)?.iter().enumerate() {
            out.push_str(&format!("\nEdit {}:\n", i + 1));
            out.push_str(&format!("  Type   : {}\n", edit.op.to_uppercase()));
            out.push_str(&format!("  Target : {} ({})\n", edit.target, edit.kind));
            if let Some(donor) = edit.donor {
                out.push_str(&format!("  Donor  : {donor}\n"));
            }
            out.push_str(&format!("  Before : {}\n", edit.before));
            if let Some(after) = &edit.after {
                out.push_str(&format!("  After  : {after}\n"));
            }
        }
        Ok(out)
    }
}

/// Collapse a snippet onto one line.
fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
