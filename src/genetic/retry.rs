//! Bounded retry with fallback.
//!
//! Every randomized construction in the search (donor lookup, mutation,
//! unique population filling) tries a bounded number of times and then
//! falls back to something deterministic instead of failing.

use std::collections::HashSet;
use std::hash::Hash;

/// Call `attempt` up to `budget` times and return its first `Some`.
pub fn retry<T>(budget: usize, mut attempt: impl FnMut() -> Option<T>) -> Option<T> {
    (0..budget).find_map(|_| attempt())
}

/// Like [`retry`], but fall back to `fallback` once the budget is spent.
pub fn retry_or_else<T>(
    budget: usize,
    attempt: impl FnMut() -> Option<T>,
    fallback: impl FnOnce() -> T,
) -> T {
    retry(budget, attempt).unwrap_or_else(fallback)
}

/// Collect up to `size` items whose keys are pairwise distinct, calling
/// `make` at most `budget` times. May return fewer than `size` items.
pub fn fill_unique<T, K: Eq + Hash>(
    size: usize,
    budget: usize,
    key: impl Fn(&T) -> K,
    mut make: impl FnMut() -> T,
) -> Vec<T> {
    let mut items = Vec::with_capacity(size);
    let mut seen = HashSet::with_capacity(size);
    for _ in 0..budget {
        if items.len() >= size {
            break;
        }
        let item = make();
        if seen.insert(key(&item)) {
            items.push(item);
        }
    }
    items
}
