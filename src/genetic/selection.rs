//! Parent selection.

use std::cmp::Ordering;

use rand::Rng;

use crate::core::{Error, Result};
use crate::patch::Patch;

/// A population member carrying a patch and its fitness.
pub trait Individual {
    fn patch(&self) -> &Patch;
    fn fitness(&self) -> f64;
}

/// Strategy for picking one parent out of a population.
pub trait ParentSelector<T> {
    fn select_one<'p, R: Rng + ?Sized>(&self, rng: &mut R, population: &'p [T]) -> Result<&'p T>;
}

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// k-way tournament selection with replacement.
///
/// The comparator defines "better": `Ordering::Less` means the left
/// element wins. Exact ties are settled by a coin flip to keep diversity.
/// When `k` equals the population size every member takes part exactly
/// once, so the best element is always found. A larger `k` still draws
/// with replacement.
pub struct TournamentSelection<T> {
    size: usize,
    better: Comparator<T>,
}

impl<T: 'static> TournamentSelection<T> {
    pub fn new(
        size: usize,
        better: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    ) -> Result<Self> {
        if size < 2 {
            return Err(Error::InvalidArgument(format!(
                "tournament size must be >= 2, got {size}"
            )));
        }
        Ok(Self {
            size,
            better: Box::new(better),
        })
    }

    /// Higher fitness wins.
    pub fn maximize(
        size: usize,
        fitness: impl Fn(&T) -> f64 + Send + Sync + 'static,
    ) -> Result<Self> {
        Self::new(size, move |a, b| fitness(b).total_cmp(&fitness(a)))
    }

    /// Lower fitness wins.
    pub fn minimize(
        size: usize,
        fitness: impl Fn(&T) -> f64 + Send + Sync + 'static,
    ) -> Result<Self> {
        Self::new(size, move |a, b| fitness(a).total_cmp(&fitness(b)))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Select `count` parents independently.
    pub fn select_many<'p, R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        population: &'p [T],
        count: usize,
    ) -> Result<Vec<&'p T>> {
        if count == 0 {
            return Err(Error::InvalidArgument("count must be > 0".to_string()));
        }
        (0..count).map(|_| self.select_one(rng, population)).collect()
    }

    fn contest<'p, R: Rng + ?Sized>(&self, rng: &mut R, best: &'p T, candidate: &'p T) -> &'p T {
        match (self.better)(candidate, best) {
            Ordering::Less => candidate,
            Ordering::Equal if rng.gen::<bool>() => candidate,
            _ => best,
        }
    }
}

impl<T: 'static> ParentSelector<T> for TournamentSelection<T> {
    fn select_one<'p, R: Rng + ?Sized>(&self, rng: &mut R, population: &'p [T]) -> Result<&'p T> {
        let first = population.first().ok_or(Error::EmptyPopulation)?;

        if self.size == population.len() {
            return Ok(population[1..]
                .iter()
                .fold(first, |best, candidate| self.contest(rng, best, candidate)));
        }

        let mut best = &population[rng.gen_range(0..population.len())];
        for _ in 1..self.size {
            let candidate = &population[rng.gen_range(0..population.len())];
            best = self.contest(rng, best, candidate);
        }
        Ok(best)
    }
}
