//! Single-edit mutation.

use rand::Rng;

use crate::core::{Error, Result};
use crate::faultloc::WeightedSampler;
use crate::patch::{EditOp, Patch};

use super::donors::DonorPool;
use super::retry::retry_or_else;

/// Attempts at producing a valid, changed mutant.
pub const MUTATION_ATTEMPTS: usize = 10;

const DONOR_TRIES: usize = 30;

/// The three mutation operators, drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    ChangeTarget,
    ChangeDonor,
    FlipKind,
}

/// Perturbs single-edit patches.
pub struct SingleEditMutator<'a> {
    sampler: &'a WeightedSampler,
    donors: &'a DonorPool,
    probability: f64,
}

impl<'a> SingleEditMutator<'a> {
    pub fn new(
        sampler: &'a WeightedSampler,
        donors: &'a DonorPool,
        probability: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidArgument(format!(
                "mutation probability must be in [0, 1], got {probability}"
            )));
        }
        Ok(Self {
            sampler,
            donors,
            probability,
        })
    }

    /// Mutate with the configured probability, otherwise return the patch unchanged.
    pub fn maybe_mutate<R: Rng + ?Sized>(&self, rng: &mut R, patch: &Patch) -> Patch {
        if rng.gen::<f64>() < self.probability {
            self.mutate_once(rng, patch)
        } else {
            patch.clone()
        }
    }

    /// Apply one random operator. Falls back to the original patch when no
    /// valid mutant that differs from it turns up; multi-edit patches are
    /// returned unchanged.
    pub fn mutate_once<R: Rng + ?Sized>(&self, rng: &mut R, patch: &Patch) -> Patch {
        let Ok(edit) = patch.single_edit() else {
            return patch.clone();
        };

        retry_or_else(
            MUTATION_ATTEMPTS,
            || {
                let operator = match rng.gen_range(0..3) {
                    0 => Operator::ChangeTarget,
                    1 => Operator::ChangeDonor,
                    _ => Operator::FlipKind,
                };
                self.apply(rng, operator, edit)
                    .filter(|mutant| mutant != patch)
            },
            || {
                tracing::trace!("No mutant found for {}, keeping it", patch);
                patch.clone()
            },
        )
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        operator: Operator,
        edit: EditOp,
    ) -> Option<Patch> {
        match (operator, edit) {
            (Operator::ChangeTarget, EditOp::Delete { .. }) => {
                Some(Patch::delete(self.sampler.sample(rng)))
            }
            (Operator::ChangeTarget, EditOp::Replace { .. }) => {
                let target = self.sampler.sample(rng);
                let donor = self.donors.find(rng, target, DONOR_TRIES)?;
                Some(Patch::replace(target, donor))
            }
            (Operator::ChangeDonor, EditOp::Replace { target, .. }) => {
                let donor = self.donors.find(rng, target, DONOR_TRIES)?;
                Some(Patch::replace(target, donor))
            }
            (Operator::ChangeDonor, EditOp::Delete { .. }) => None,
            (Operator::FlipKind, EditOp::Delete { target }) => {
                let donor = self.donors.find(rng, target, DONOR_TRIES)?;
                Some(Patch::replace(target, donor))
            }
            (Operator::FlipKind, EditOp::Replace { target, .. }) => Some(Patch::delete(target)),
        }
    }
}
