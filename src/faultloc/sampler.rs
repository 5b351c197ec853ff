//! Fault-localization weighted statement sampling.

use std::collections::HashMap;

use rand::Rng;

use crate::core::{Error, Result};
use crate::program::{StatementId, StatementIndex};

use super::FaultLocalization;

/// Roulette-wheel sampler over suspicious statements.
///
/// Each positive-weight line is resolved to one statement; weights of
/// lines that land on the same statement add up. Statements appear in the
/// order their first line was resolved.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    ids: Vec<StatementId>,
    weights: Vec<f64>,
    cumulative: Vec<f64>,
    total: f64,
}

impl WeightedSampler {
    pub fn new(index: &StatementIndex, fl: &FaultLocalization) -> Result<Self> {
        if index.is_empty() {
            return Err(Error::NoTargets(format!(
                "{} contains no statements",
                index.path().display()
            )));
        }

        let mut ids: Vec<StatementId> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut slot: HashMap<StatementId, usize> = HashMap::new();

        for location in fl.positive() {
            let id = resolve_line(index, location.line)?;
            match slot.get(&id) {
                Some(&i) => weights[i] += location.weight,
                None => {
                    slot.insert(id, ids.len());
                    ids.push(id);
                    weights.push(location.weight);
                }
            }
        }

        let (ids, weights): (Vec<_>, Vec<_>) = ids
            .into_iter()
            .zip(weights)
            .filter(|(_, w)| *w > 0.0)
            .unzip();

        if ids.is_empty() {
            return Err(Error::NoTargets(format!(
                "no positive fault-localization weight in {}",
                fl.file
            )));
        }

        let mut total = 0.0;
        let cumulative = weights
            .iter()
            .map(|w| {
                total += w;
                total
            })
            .collect();

        tracing::debug!(
            "Sampler covers {} statements, total weight {:.2}",
            ids.len(),
            total
        );

        Ok(Self {
            ids,
            weights,
            cumulative,
            total,
        })
    }

    /// Draw a statement with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> StatementId {
        let r = rng.gen::<f64>() * self.total;
        let idx = self.cumulative.partition_point(|c| *c < r);
        self.ids[idx.min(self.ids.len() - 1)]
    }

    /// Statements that can be drawn, in sampling order.
    pub fn ids(&self) -> &[StatementId] {
        &self.ids
    }

    /// Accumulated weight of `id`, zero if it cannot be drawn.
    pub fn weight_of(&self, id: StatementId) -> f64 {
        self.ids
            .iter()
            .position(|x| *x == id)
            .map(|i| self.weights[i])
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Map a source line onto one statement.
///
/// The tightest statement enclosing the line wins (fewest lines, then
/// first in traversal order). Lines outside every
/// statement go to the nearest statement starting after them, else the
/// nearest one ending before them.
fn resolve_line(index: &StatementIndex, line: u32) -> Result<StatementId> {
    let enclosing = index
        .statements()
        .filter(|s| s.id.contains_line(line))
        .min_by_key(|s| s.id.line_span());
    if let Some(stmt) = enclosing {
        return Ok(stmt.id);
    }

    let next = index
        .statements()
        .filter(|s| s.id.begin_line > line)
        .min_by_key(|s| s.id.begin_line);
    if let Some(stmt) = next {
        return Ok(stmt.id);
    }

    let previous = index
        .statements()
        .filter(|s| s.id.end_line < line)
        .max_by_key(|s| s.id.end_line);
    previous
        .map(|s| s.id)
        .ok_or_else(|| Error::NoTargets(format!("no statement near line {line}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use crate::faultloc::WeightedLocation;
    use crate::parser::Parser;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;

    const SRC: &str = "class A {\n    int f(int a, int b) {\n        int c = a;\n\n        if (a > b) {\n            c = b;\n        }\n        return c;\n    }\n}\n";

    fn index() -> StatementIndex {
        StatementIndex::build(&Parser::new(), SRC, Language::Java, Path::new("A.java")).unwrap()
    }

    fn fl(entries: &[(u32, f64)]) -> FaultLocalization {
        FaultLocalization::new(
            "A.java",
            entries
                .iter()
                .map(|&(l, w)| WeightedLocation::new(l, w))
                .collect(),
        )
    }

    #[test]
    fn test_resolves_tightest_enclosing_statement() {
        let idx = index();
        let id = resolve_line(&idx, 6).unwrap();
        assert_eq!(idx.text(id).unwrap(), "c = b;");
        let id = resolve_line(&idx, 5).unwrap();
        assert!(idx.text(id).unwrap().starts_with("if (a > b)"));
    }

    #[test]
    fn test_loop_header_resolves_to_the_loop() {
        let src = "class S {\n    int sum(int n) {\n        int s = 0;\n        for (int i = 0; i < n; i++) { s += i; }\n        return s;\n    }\n}\n";
        let idx = StatementIndex::build(&Parser::new(), src, Language::Java, Path::new("S.java"))
            .unwrap();
        let id = resolve_line(&idx, 4).unwrap();
        assert_eq!(idx.kind(id).unwrap(), crate::program::StatementKind::For);
        assert!(idx.text(id).unwrap().starts_with("for (int i = 0;"));
    }

    #[test]
    fn test_resolves_gaps_forward_then_backward() {
        let idx = index();
        // line 4 is blank but inside the method body block
        let id = resolve_line(&idx, 4).unwrap();
        assert!(idx.text(id).unwrap().starts_with('{'));
        // line 1 precedes every statement
        let id = resolve_line(&idx, 1).unwrap();
        assert_eq!(id.begin_line, 2);
        // line 10 follows every statement
        let id = resolve_line(&idx, 10).unwrap();
        assert_eq!(id.end_line, 9);
    }

    #[test]
    fn test_weights_on_same_statement_accumulate() {
        let idx = index();
        let sampler = WeightedSampler::new(&idx, &fl(&[(5, 0.1), (7, 0.1), (8, 1.0)])).unwrap();
        assert_eq!(sampler.len(), 2);
        let if_id = sampler.ids()[0];
        assert!((sampler.weight_of(if_id) - 0.2).abs() < 1e-12);
        assert!((sampler.total() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_mean_no_targets() {
        let idx = index();
        let err = WeightedSampler::new(&idx, &fl(&[(3, 0.0), (8, 0.0)])).unwrap_err();
        assert!(matches!(err, Error::NoTargets(_)));
    }

    #[test]
    fn test_sampling_follows_weights() {
        let idx = index();
        let sampler = WeightedSampler::new(&idx, &fl(&[(3, 0.1), (8, 1.0)])).unwrap();
        let decl = sampler.ids()[0];
        let ret = sampler.ids()[1];

        let mut rng = StdRng::seed_from_u64(7);
        let draws = 20_000;
        let mut hits = 0;
        for _ in 0..draws {
            let id = sampler.sample(&mut rng);
            assert!(id == decl || id == ret);
            if id == ret {
                hits += 1;
            }
        }
        let share = hits as f64 / draws as f64;
        assert!((share - 1.0 / 1.1).abs() < 0.02, "share was {share}");
    }

    #[test]
    fn test_empty_program_has_no_targets() {
        let idx = StatementIndex::build(
            &Parser::new(),
            "class Empty {}\n",
            Language::Java,
            Path::new("Empty.java"),
        )
        .unwrap();
        let err = WeightedSampler::new(&idx, &fl(&[(1, 1.0)])).unwrap_err();
        assert!(matches!(err, Error::NoTargets(_)));
    }
}
