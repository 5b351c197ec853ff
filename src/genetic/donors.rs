//! Donor statements available to Replace edits.

use std::collections::HashMap;

use rand::Rng;

use crate::program::{StatementId, StatementIndex, StatementKind};

use super::retry::retry;

/// Statements of one program, partitioned by kind.
#[derive(Debug, Clone)]
pub struct DonorPool {
    all: Vec<StatementId>,
    kinds: HashMap<StatementId, StatementKind>,
    by_kind: HashMap<StatementKind, Vec<StatementId>>,
    same_kind: bool,
}

impl DonorPool {
    pub fn new(index: &StatementIndex, same_kind: bool) -> Self {
        let mut kinds = HashMap::with_capacity(index.len());
        let mut by_kind: HashMap<StatementKind, Vec<StatementId>> = HashMap::new();
        for stmt in index.statements() {
            kinds.insert(stmt.id, stmt.kind);
            by_kind.entry(stmt.kind).or_default().push(stmt.id);
        }
        Self {
            all: index.ids().to_vec(),
            kinds,
            by_kind,
            same_kind,
        }
    }

    /// Whether donors must share the target's kind.
    pub fn same_kind(&self) -> bool {
        self.same_kind
    }

    pub fn kind_of(&self, id: StatementId) -> Option<StatementKind> {
        self.kinds.get(&id).copied()
    }

    /// Statements of one kind, in traversal order.
    pub fn of_kind(&self, kind: StatementKind) -> &[StatementId] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all(&self) -> &[StatementId] {
        &self.all
    }

    /// Whether `Replace(target, donor)` is a valid edit under this pool's policy.
    pub fn is_compatible(&self, target: StatementId, donor: StatementId) -> bool {
        if target == donor {
            return false;
        }
        match (self.kind_of(target), self.kind_of(donor)) {
            (Some(t), Some(d)) => !self.same_kind || t == d,
            _ => false,
        }
    }

    /// Find a donor for `target`: `tries` uniform random picks, then an
    /// ordered scan. `None` when no compatible donor exists.
    pub fn find<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        target: StatementId,
        tries: usize,
    ) -> Option<StatementId> {
        let candidates: &[StatementId] = if self.same_kind {
            match self.kind_of(target) {
                Some(kind) => self.of_kind(kind),
                None => &[],
            }
        } else {
            &self.all
        };
        if candidates.is_empty() {
            return None;
        }

        retry(tries, || {
            let donor = candidates[rng.gen_range(0..candidates.len())];
            (donor != target).then_some(donor)
        })
        .or_else(|| candidates.iter().copied().find(|d| *d != target))
    }
}
