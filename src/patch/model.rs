//! Edit operations and patches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::program::StatementId;

/// One structural edit over statement identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// Remove the target statement.
    Delete { target: StatementId },
    /// Substitute the target statement with a copy of the donor statement.
    Replace {
        target: StatementId,
        donor: StatementId,
    },
}

impl EditOp {
    pub fn target(&self) -> StatementId {
        match self {
            Self::Delete { target } | Self::Replace { target, .. } => *target,
        }
    }

    pub fn donor(&self) -> Option<StatementId> {
        match self {
            Self::Delete { .. } => None,
            Self::Replace { donor, .. } => Some(*donor),
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }

    /// Uniqueness key, `DEL@id` or `REP@target<-donor`.
    pub fn signature(&self) -> String {
        match self {
            Self::Delete { target } => format!("DEL@{target}"),
            Self::Replace { target, donor } => format!("REP@{target}<-{donor}"),
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// A candidate repair: an ordered list of one to three edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<EditOp>", into = "Vec<EditOp>")]
pub struct Patch {
    edits: Vec<EditOp>,
}

impl Patch {
    /// Upper bound on edits per patch.
    pub const MAX_EDITS: usize = 3;

    pub fn new(edits: Vec<EditOp>) -> Result<Self> {
        if edits.is_empty() {
            return Err(Error::invalid_patch("patch must have at least one edit"));
        }
        if edits.len() > Self::MAX_EDITS {
            return Err(Error::invalid_patch(format!(
                "patch has {} edits, at most {} allowed",
                edits.len(),
                Self::MAX_EDITS
            )));
        }
        Ok(Self { edits })
    }

    /// A single-edit patch, the only shape the search constructs.
    pub fn single(edit: EditOp) -> Self {
        Self { edits: vec![edit] }
    }

    pub fn delete(target: StatementId) -> Self {
        Self::single(EditOp::Delete { target })
    }

    pub fn replace(target: StatementId, donor: StatementId) -> Self {
        Self::single(EditOp::Replace { target, donor })
    }

    pub fn edits(&self) -> &[EditOp] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The only edit of a single-edit patch.
    pub fn single_edit(&self) -> Result<EditOp> {
        match self.edits.as_slice() {
            [edit] => Ok(*edit),
            edits => Err(Error::InvalidArity(edits.len())),
        }
    }

    /// Uniqueness key; edit signatures joined by `|`.
    pub fn signature(&self) -> String {
        self.edits
            .iter()
            .map(EditOp::signature)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl TryFrom<Vec<EditOp>> for Patch {
    type Error = Error;

    fn try_from(edits: Vec<EditOp>) -> Result<Self> {
        Self::new(edits)
    }
}

impl From<Patch> for Vec<EditOp> {
    fn from(patch: Patch) -> Self {
        patch.edits
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(line: u32) -> StatementId {
        StatementId::new(line, 9, line, 20)
    }

    #[test]
    fn test_signatures() {
        assert_eq!(Patch::delete(id(4)).signature(), "DEL@4:9-4:20");
        assert_eq!(
            Patch::replace(id(7), id(4)).signature(),
            "REP@7:9-7:20<-4:9-4:20"
        );
    }

    #[test]
    fn test_patch_bounds() {
        assert!(matches!(Patch::new(vec![]), Err(Error::InvalidPatch(_))));

        let four = vec![EditOp::Delete { target: id(1) }; 4];
        assert!(matches!(Patch::new(four), Err(Error::InvalidPatch(_))));

        let three = vec![
            EditOp::Delete { target: id(1) },
            EditOp::Delete { target: id(2) },
            EditOp::Delete { target: id(3) },
        ];
        let patch = Patch::new(three).unwrap();
        assert_eq!(patch.len(), 3);
        assert!(matches!(patch.single_edit(), Err(Error::InvalidArity(3))));
    }

    #[test]
    fn test_edit_accessors() {
        let rep = EditOp::Replace {
            target: id(7),
            donor: id(4),
        };
        assert_eq!(rep.target(), id(7));
        assert_eq!(rep.donor(), Some(id(4)));
        assert!(rep.is_replace());

        let del = EditOp::Delete { target: id(7) };
        assert_eq!(del.donor(), None);
        assert!(!del.is_replace());
    }

    #[test]
    fn test_deserialize_rejects_empty_patch() {
        let err = serde_json::from_str::<Patch>("[]");
        assert!(err.is_err());

        let patch: Patch = serde_json::from_str(
            r#"[{"op":"delete","target":{"begin_line":2,"begin_col":1,"end_line":2,"end_col":4}}]"#,
        )
        .unwrap();
        assert_eq!(patch, Patch::delete(StatementId::new(2, 1, 2, 4)));
    }
}
