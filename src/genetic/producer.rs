//! Next-generation production.

use std::collections::HashSet;

use rand::Rng;

use crate::core::{Error, Result};
use crate::patch::Patch;

use super::crossover::SingleEditCrossover;
use super::mutator::SingleEditMutator;
use super::selection::{Individual, ParentSelector};

/// Breeds a new generation of patches from an evaluated one.
pub struct NextGenerationProducer<'a, S> {
    size: usize,
    selector: S,
    crossover: SingleEditCrossover<'a>,
    mutator: SingleEditMutator<'a>,
    enforce_unique: bool,
    max_attempts_per_child: usize,
}

impl<'a, S> NextGenerationProducer<'a, S> {
    pub fn new(
        size: usize,
        selector: S,
        crossover: SingleEditCrossover<'a>,
        mutator: SingleEditMutator<'a>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument(
                "population size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            size,
            selector,
            crossover,
            mutator,
            enforce_unique: true,
            max_attempts_per_child: 50,
        })
    }

    /// Reject children whose signature is already in the generation.
    pub fn with_enforce_unique(mut self, enforce_unique: bool) -> Self {
        self.enforce_unique = enforce_unique;
        self
    }

    pub fn with_max_attempts_per_child(mut self, attempts: usize) -> Self {
        self.max_attempts_per_child = attempts.max(1);
        self
    }

    /// Exactly `size` children.
    ///
    /// With uniqueness enforced, children are bred until the generation is
    /// full or `size * max_attempts_per_child` breedings were spent; the
    /// rest is then bred without the uniqueness check. Without it, the
    /// loop stops at the same budget and clones selected parents.
    pub fn produce<E, R>(&self, rng: &mut R, population: &[E]) -> Result<Vec<Patch>>
    where
        E: Individual,
        S: ParentSelector<E>,
        R: Rng + ?Sized,
    {
        if population.is_empty() {
            return Err(Error::EmptyPopulation);
        }
        let budget = self.size * self.max_attempts_per_child;

        let mut seen = HashSet::with_capacity(self.size);
        let mut children = Vec::with_capacity(self.size);
        let mut attempts = 0;
        while children.len() < self.size && attempts < budget {
            attempts += 1;
            let child = self.breed(rng, population)?;
            if !self.enforce_unique || seen.insert(child.signature()) {
                children.push(child);
            }
        }

        if children.len() < self.size {
            if self.enforce_unique {
                tracing::debug!(
                    "Unique children exhausted at {}/{}, relaxing uniqueness",
                    children.len(),
                    self.size
                );
                while children.len() < self.size {
                    children.push(self.breed(rng, population)?);
                }
            } else {
                while children.len() < self.size {
                    let parent = self.selector.select_one(rng, population)?;
                    children.push(parent.patch().clone());
                }
            }
        }

        Ok(children)
    }

    /// Select two parents, cross them and maybe mutate the child.
    fn breed<E, R>(&self, rng: &mut R, population: &[E]) -> Result<Patch>
    where
        E: Individual,
        S: ParentSelector<E>,
        R: Rng + ?Sized,
    {
        let a = self.selector.select_one(rng, population)?;
        let b = self.selector.select_one(rng, population)?;
        let child = self.crossover.crossover(rng, a.patch(), b.patch())?;
        Ok(self.mutator.maybe_mutate(rng, &child))
    }
}
