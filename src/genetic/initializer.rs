//! Initial population construction.

use rand::Rng;

use crate::core::{Error, Result};
use crate::faultloc::WeightedSampler;
use crate::patch::Patch;

use super::donors::DonorPool;
use super::retry::fill_unique;

/// Attempts per population slot before uniqueness is given up.
pub const ATTEMPTS_PER_SLOT: usize = 50;

/// Random donor picks before falling back to a scan.
const DONOR_TRIES: usize = 20;

/// Builds the first generation of single-edit patches.
pub struct PopulationInitializer<'a> {
    sampler: &'a WeightedSampler,
    donors: &'a DonorPool,
    population_size: usize,
    delete_probability: f64,
}

impl<'a> PopulationInitializer<'a> {
    pub fn new(
        sampler: &'a WeightedSampler,
        donors: &'a DonorPool,
        population_size: usize,
        delete_probability: f64,
    ) -> Result<Self> {
        if population_size == 0 {
            return Err(Error::InvalidArgument(
                "population size must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&delete_probability) {
            return Err(Error::InvalidArgument(format!(
                "delete probability must be in [0, 1], got {delete_probability}"
            )));
        }
        Ok(Self {
            sampler,
            donors,
            population_size,
            delete_probability,
        })
    }

    /// Exactly `population_size` patches, unique by signature unless the
    /// attempt budget runs out first.
    pub fn initialize<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Patch> {
        let mut population = fill_unique(
            self.population_size,
            self.population_size * ATTEMPTS_PER_SLOT,
            Patch::signature,
            || self.random_patch(rng),
        );

        if population.len() < self.population_size {
            tracing::debug!(
                "Uniqueness budget exhausted with {}/{} patches, filling with duplicates",
                population.len(),
                self.population_size
            );
        }
        while population.len() < self.population_size {
            population.push(self.random_patch(rng));
        }
        population
    }

    /// One random single-edit patch on a fault-localized target.
    pub fn random_patch<R: Rng + ?Sized>(&self, rng: &mut R) -> Patch {
        let target = self.sampler.sample(rng);
        if rng.gen::<f64>() < self.delete_probability {
            return Patch::delete(target);
        }
        match self.donors.find(rng, target, DONOR_TRIES) {
            Some(donor) => Patch::replace(target, donor),
            None => Patch::delete(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use crate::faultloc::{FaultLocalization, WeightedLocation};
    use crate::parser::Parser;
    use crate::patch::EditOp;
    use crate::program::{StatementIndex, StatementKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::path::Path;

    const SRC: &str = "class A {\n    int f(int a) {\n        a++;\n        a--;\n        a += 2;\n        if (a > 3) {\n            return 3;\n        }\n        return a;\n    }\n}\n";

    fn fixture(lines: &[(u32, f64)]) -> (StatementIndex, WeightedSampler) {
        let index =
            StatementIndex::build(&Parser::new(), SRC, Language::Java, Path::new("A.java"))
                .unwrap();
        let fl = FaultLocalization::new(
            "A.java",
            lines
                .iter()
                .map(|&(l, w)| WeightedLocation::new(l, w))
                .collect(),
        );
        let sampler = WeightedSampler::new(&index, &fl).unwrap();
        (index, sampler)
    }

    #[test]
    fn test_population_is_unique_when_possible() {
        let (index, sampler) = fixture(&[(3, 1.0), (4, 1.0), (5, 1.0), (9, 1.0)]);
        let donors = DonorPool::new(&index, true);
        let init = PopulationInitializer::new(&sampler, &donors, 6, 0.1).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let population = init.initialize(&mut rng);
        assert_eq!(population.len(), 6);
        let signatures: HashSet<String> = population.iter().map(Patch::signature).collect();
        assert_eq!(signatures.len(), 6);
    }

    #[test]
    fn test_population_size_is_exact_when_space_is_small() {
        let (index, sampler) = fixture(&[(9, 1.0)]);
        let donors = DonorPool::new(&index, true);
        let init = PopulationInitializer::new(&sampler, &donors, 5, 0.5).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let population = init.initialize(&mut rng);
        // only DEL@ret and REP@ret<-other exist
        assert_eq!(population.len(), 5);
    }

    #[test]
    fn test_replace_donors_share_kind() {
        let (index, sampler) = fixture(&[(3, 1.0), (7, 1.0), (9, 1.0)]);
        let donors = DonorPool::new(&index, true);
        let init = PopulationInitializer::new(&sampler, &donors, 20, 0.0).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        for patch in init.initialize(&mut rng) {
            if let EditOp::Replace { target, donor } = patch.single_edit().unwrap() {
                assert_ne!(target, donor);
                assert_eq!(index.kind(target).unwrap(), index.kind(donor).unwrap());
            }
        }
    }

    #[test]
    fn test_no_donor_falls_back_to_delete() {
        let src = "class A {\n    int f() {\n        return 1;\n    }\n}\n";
        let index =
            StatementIndex::build(&Parser::new(), src, Language::Java, Path::new("A.java"))
                .unwrap();
        let fl = FaultLocalization::new("A.java", vec![WeightedLocation::new(3, 1.0)]);
        let sampler = WeightedSampler::new(&index, &fl).unwrap();
        let donors = DonorPool::new(&index, true);
        let init = PopulationInitializer::new(&sampler, &donors, 1, 0.0).unwrap();

        let patch = init.random_patch(&mut StdRng::seed_from_u64(0));
        let edit = patch.single_edit().unwrap();
        assert!(!edit.is_replace());
        assert_eq!(index.kind(edit.target()).unwrap(), StatementKind::Return);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let (index, sampler) = fixture(&[(9, 1.0)]);
        let donors = DonorPool::new(&index, true);
        assert!(PopulationInitializer::new(&sampler, &donors, 0, 0.1).is_err());
        assert!(PopulationInitializer::new(&sampler, &donors, 3, 1.5).is_err());
    }
}
