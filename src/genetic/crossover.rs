//! Single-edit crossover.

use rand::Rng;

use crate::core::Result;
use crate::patch::{EditOp, Patch};
use crate::program::StatementId;

use super::donors::DonorPool;

/// Random donor picks when repairing an invalid recombined pair.
const DONOR_TRIES: usize = 30;

/// Recombines two single-edit patches.
pub struct SingleEditCrossover<'a> {
    donors: &'a DonorPool,
}

impl<'a> SingleEditCrossover<'a> {
    pub fn new(donors: &'a DonorPool) -> Self {
        Self { donors }
    }

    /// Cross two single-edit patches.
    ///
    /// Two Replace parents swap target and donor: the child takes its
    /// target from one parent (50/50) and its donor from the other. Any
    /// Delete involved leaves nothing to recombine, so one parent is
    /// returned unchanged.
    pub fn crossover<R: Rng + ?Sized>(&self, rng: &mut R, a: &Patch, b: &Patch) -> Result<Patch> {
        let edit_a = a.single_edit()?;
        let edit_b = b.single_edit()?;

        match (edit_a, edit_b) {
            (
                EditOp::Replace {
                    target: target_a,
                    donor: donor_a,
                },
                EditOp::Replace {
                    target: target_b,
                    donor: donor_b,
                },
            ) => {
                let (target, donor) = if rng.gen::<bool>() {
                    (target_a, donor_b)
                } else {
                    (target_b, donor_a)
                };
                let donor = if self.donors.is_compatible(target, donor) {
                    donor
                } else {
                    self.repair_donor(rng, target)
                };
                Ok(Patch::replace(target, donor))
            }
            _ => Ok(if rng.gen::<bool>() { a.clone() } else { b.clone() }),
        }
    }

    /// A compatible donor if one exists, otherwise the first statement that
    /// is not the target. Never fails; an incompatible result is rejected
    /// later when the patch is applied.
    fn repair_donor<R: Rng + ?Sized>(&self, rng: &mut R, target: StatementId) -> StatementId {
        self.donors
            .find(rng, target, DONOR_TRIES)
            .or_else(|| self.donors.all().iter().copied().find(|d| *d != target))
            .unwrap_or(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, Language};
    use crate::parser::Parser;
    use crate::program::{StatementIndex, StatementKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;

    const SRC: &str = "class A {\n    int f(int a) {\n        a++;\n        a--;\n        if (a > 3) {\n            return 3;\n        }\n        return a;\n    }\n}\n";

    fn pool() -> DonorPool {
        let index =
            StatementIndex::build(&Parser::new(), SRC, Language::Java, Path::new("A.java"))
                .unwrap();
        DonorPool::new(&index, true)
    }

    #[test]
    fn test_replace_parents_swap_donors() {
        let donors = pool();
        let exprs = donors.of_kind(StatementKind::Expression).to_vec();
        let rets = donors.of_kind(StatementKind::Return).to_vec();
        let a = Patch::replace(exprs[0], exprs[1]);
        let b = Patch::replace(rets[0], rets[1]);
        let crossover = SingleEditCrossover::new(&donors);

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let child = crossover.crossover(&mut rng, &a, &b).unwrap();
            let edit = child.single_edit().unwrap();
            let (target, donor) = (edit.target(), edit.donor().unwrap());
            // cross-kind pairs are repaired back to a same-kind donor
            assert!(donors.is_compatible(target, donor));
            assert!(target == exprs[0] || target == rets[0]);
        }
    }

    #[test]
    fn test_delete_parent_is_inherited() {
        let donors = pool();
        let rets = donors.of_kind(StatementKind::Return).to_vec();
        let a = Patch::delete(rets[0]);
        let b = Patch::replace(rets[1], rets[0]);
        let crossover = SingleEditCrossover::new(&donors);

        let mut rng = StdRng::seed_from_u64(8);
        let mut seen_a = false;
        let mut seen_b = false;
        for _ in 0..50 {
            let child = crossover.crossover(&mut rng, &a, &b).unwrap();
            seen_a |= child == a;
            seen_b |= child == b;
            assert!(child == a || child == b);
        }
        assert!(seen_a && seen_b);
    }

    #[test]
    fn test_multi_edit_parent_is_rejected() {
        let donors = pool();
        let rets = donors.of_kind(StatementKind::Return).to_vec();
        let multi = Patch::new(vec![
            EditOp::Delete { target: rets[0] },
            EditOp::Delete { target: rets[1] },
        ])
        .unwrap();
        let single = Patch::delete(rets[0]);
        let crossover = SingleEditCrossover::new(&donors);

        let err = crossover
            .crossover(&mut StdRng::seed_from_u64(0), &multi, &single)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArity(2)));
    }

    #[test]
    fn test_same_target_and_donor_is_repaired() {
        let donors = pool();
        let rets = donors.of_kind(StatementKind::Return).to_vec();
        // either way round the child would be REP@r0<-r0 or REP@r1<-r1
        let a = Patch::replace(rets[0], rets[1]);
        let b = Patch::replace(rets[1], rets[0]);
        let crossover = SingleEditCrossover::new(&donors);

        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            let child = crossover.crossover(&mut rng, &a, &b).unwrap();
            let edit = child.single_edit().unwrap();
            assert_ne!(edit.target(), edit.donor().unwrap());
        }
    }
}
