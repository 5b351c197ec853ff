//! Applying and scoring one generation of patches.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64;

use crate::benchmark::BenchmarkConfig;
use crate::core::progress::ProgressTracker;
use crate::core::{Error, Result};
use crate::eval::{EvaluationRequest, Evaluator, TestOutcome};
use crate::fitness::{is_success, FitnessFunction};
use crate::genetic::Individual;
use crate::patch::{Patch, PatchApplier};

/// A scored patch.
///
/// `outcome` is `None` exactly when the patch could not be applied or the
/// evaluator failed, in which case `fitness` is negative infinity.
#[derive(Debug, Clone)]
pub struct EvaluatedCandidate {
    pub patch: Patch,
    pub fitness: f64,
    pub outcome: Option<TestOutcome>,
    /// Realized candidate source, when the patch applied.
    pub source: Option<String>,
}

impl EvaluatedCandidate {
    pub fn is_success(&self) -> bool {
        is_success(self.outcome.as_ref())
    }
}

impl Individual for EvaluatedCandidate {
    fn patch(&self) -> &Patch {
        &self.patch
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// Applies patches on the calling thread, then runs the distinct candidate
/// sources through the evaluator on a bounded worker pool.
pub struct CandidateEvaluator<'a> {
    benchmark: &'a BenchmarkConfig,
    applier: PatchApplier,
    evaluator: Arc<dyn Evaluator>,
    fitness: FitnessFunction,
    timeout: Duration,
    pool: rayon::ThreadPool,
    cache: Option<Mutex<HashMap<u64, TestOutcome>>>,
    progress: bool,
    evaluations: AtomicUsize,
}

impl<'a> CandidateEvaluator<'a> {
    /// `jobs == 0` uses the available parallelism.
    pub fn new(
        benchmark: &'a BenchmarkConfig,
        applier: PatchApplier,
        evaluator: Arc<dyn Evaluator>,
        fitness: FitnessFunction,
        timeout: Duration,
        jobs: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("mend-eval-{i}"))
            .build()
            .map_err(|e| Error::config(format!("failed to build evaluation pool: {e}")))?;

        Ok(Self {
            benchmark,
            applier,
            evaluator,
            fitness,
            timeout,
            pool,
            cache: None,
            progress: false,
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Evaluate each distinct candidate source at most once per run.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(|| Mutex::new(HashMap::new()));
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Calls made to the underlying evaluator so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Score every patch. The result is in input order.
    pub fn evaluate_all(&self, patches: Vec<Patch>, generation: usize) -> Vec<EvaluatedCandidate> {
        let original = &self.benchmark.buggy.content;
        let sources: Vec<Option<String>> = patches
            .iter()
            .map(|patch| match self.applier.apply(original, patch) {
                Ok(source) => Some(source),
                Err(e) => {
                    tracing::debug!("Patch {} does not apply: {}", patch, e);
                    None
                }
            })
            .collect();

        let outcomes = self.run(&sources, generation);

        patches
            .into_iter()
            .zip(sources)
            .zip(outcomes)
            .map(|((patch, source), outcome)| EvaluatedCandidate {
                fitness: self.fitness.score(outcome.as_ref()),
                patch,
                outcome,
                source,
            })
            .collect()
    }

    /// One outcome per source slot.
    fn run(&self, sources: &[Option<String>], generation: usize) -> Vec<Option<TestOutcome>> {
        let keys: Vec<Option<u64>> = sources
            .iter()
            .map(|s| s.as_deref().map(|s| xxh3_64(s.as_bytes())))
            .collect();

        // slot indices that need a real evaluation
        let mut pending: Vec<usize> = Vec::new();
        let mut claimed: HashSet<u64> = HashSet::new();
        for (slot, key) in keys.iter().enumerate() {
            let Some(key) = *key else { continue };
            if let Some(cache) = &self.cache {
                if cache.lock().contains_key(&key) || !claimed.insert(key) {
                    continue;
                }
            }
            pending.push(slot);
        }

        let tracker = ProgressTracker::for_generation(pending.len(), generation, self.progress);
        let fresh: Vec<(usize, Option<TestOutcome>)> = self.pool.install(|| {
            pending
                .par_iter()
                .map(|&slot| {
                    let source = sources[slot].as_deref().unwrap_or_default();
                    let outcome = self.evaluate_one(source);
                    tracker.inc();
                    (slot, outcome)
                })
                .collect()
        });
        tracker.finish_and_clear();

        let mut outcomes: Vec<Option<TestOutcome>> = vec![None; sources.len()];
        for (slot, outcome) in fresh {
            // failures are not cached so a flaky sandbox gets another chance
            if let (Some(cache), Some(key), Some(o)) = (&self.cache, keys[slot], &outcome) {
                cache.lock().insert(key, o.clone());
            }
            outcomes[slot] = outcome;
        }

        if let Some(cache) = &self.cache {
            let cache = cache.lock();
            for (slot, key) in keys.iter().enumerate() {
                if let (None, Some(key)) = (&outcomes[slot], key) {
                    outcomes[slot] = cache.get(key).cloned();
                }
            }
        }
        outcomes
    }

    /// Infrastructure failures become an absent outcome.
    fn evaluate_one(&self, source: &str) -> Option<TestOutcome> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let request = EvaluationRequest::new(self.benchmark, source, self.timeout);
        match self.evaluator.evaluate(&request) {
            Ok(result) => {
                if result.retained {
                    if let Some(dir) = &result.workspace {
                        tracing::info!("Workspace retained at {}", dir.display());
                    }
                }
                Some(result.outcome)
            }
            Err(e) => {
                tracing::warn!("Evaluation failed for {}: {}", self.benchmark.name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Language, SourceFile};
    use crate::eval::EvaluationResult;
    use crate::parser::Parser;
    use crate::program::{StatementId, StatementIndex, StatementKind};
    use std::path::PathBuf;

    const BUGGY: &str = "class Clamp {\n    int clamp(int x, int low, int high) {\n        if (x < low) {\n            return low;\n        }\n        if (x > high) {\n            return low;\n        }\n        return x;\n    }\n}\n";

    /// Passes iff the source contains `return high;`, counts every call.
    struct Oracle {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl Evaluator for Oracle {
        fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<EvaluationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_on {
                if request.candidate_source.contains(marker) {
                    return Err(Error::workspace("disk full"));
                }
            }
            let ok = request.candidate_source.contains("return high;");
            Ok(EvaluationResult {
                outcome: TestOutcome {
                    tests_run: 3,
                    failures: if ok { 0 } else { 1 },
                    exit_code: if ok { 0 } else { 1 },
                    all_passed: ok,
                    ..TestOutcome::default()
                },
                workspace: None,
                retained: false,
            })
        }
    }

    fn benchmark() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "clamp".to_string(),
            root: PathBuf::from("clamp"),
            buggy: SourceFile::from_content("Clamp.java", Language::Java, BUGGY),
            fixed: None,
            tests: SourceFile::from_content(
                "ClampTest.java",
                Language::Java,
                "class ClampTest {}",
            ),
            faultloc_path: PathBuf::from("clamp/faultloc.json"),
        }
    }

    fn returns(bm: &BenchmarkConfig) -> Vec<StatementId> {
        let index = StatementIndex::from_source(&Parser::new(), &bm.buggy).unwrap();
        index
            .statements()
            .filter(|s| s.kind == StatementKind::Return)
            .map(|s| s.id)
            .collect()
    }

    fn evaluator<'a>(bm: &'a BenchmarkConfig, oracle: Arc<Oracle>) -> CandidateEvaluator<'a> {
        CandidateEvaluator::new(
            bm,
            PatchApplier::new(Language::Java, "Clamp.java"),
            oracle,
            FitnessFunction::default(),
            Duration::from_secs(1),
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_scores_in_input_order() {
        let bm = benchmark();
        let rets = returns(&bm);
        let oracle = Arc::new(Oracle {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let eval = evaluator(&bm, oracle);

        // rets: return low (line 4), return low (line 7), return x
        let patches = vec![
            Patch::delete(rets[2]),
            Patch::replace(rets[1], rets[0]),
            Patch::replace(rets[0], rets[0]),
        ];
        let scored = eval.evaluate_all(patches.clone(), 0);

        assert_eq!(scored.len(), 3);
        for (candidate, patch) in scored.iter().zip(&patches) {
            assert_eq!(&candidate.patch, patch);
        }
        assert!(scored[0].outcome.is_some());
        assert!(!scored[0].is_success());
        // identical donor and target never applies
        assert!(scored[2].outcome.is_none());
        assert!(scored[2].source.is_none());
        assert_eq!(scored[2].fitness, f64::NEG_INFINITY);
    }

    #[test]
    fn test_cache_skips_identical_sources() {
        let bm = benchmark();
        let rets = returns(&bm);
        let oracle = Arc::new(Oracle {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let eval = evaluator(&bm, oracle.clone()).with_cache(true);

        let patches = vec![Patch::delete(rets[2]), Patch::delete(rets[2])];
        let scored = eval.evaluate_all(patches.clone(), 0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scored[0].fitness, scored[1].fitness);

        eval.evaluate_all(patches, 1);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(eval.evaluations(), 1);
    }

    #[test]
    fn test_without_cache_every_slot_is_evaluated() {
        let bm = benchmark();
        let rets = returns(&bm);
        let oracle = Arc::new(Oracle {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let eval = evaluator(&bm, oracle.clone()).with_cache(false);

        eval.evaluate_all(vec![Patch::delete(rets[2]), Patch::delete(rets[2])], 0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_infrastructure_failure_scores_negative_infinity() {
        let bm = benchmark();
        let rets = returns(&bm);
        let oracle = Arc::new(Oracle {
            calls: AtomicUsize::new(0),
            fail_on: Some("return x;"),
        });
        let eval = evaluator(&bm, oracle);

        // deleting `return x;` removes the marker, every other patch keeps it
        let scored = eval.evaluate_all(vec![Patch::delete(rets[2]), Patch::delete(rets[0])], 0);
        assert!(scored[0].outcome.is_some());
        assert!(scored[1].outcome.is_none());
        assert_eq!(scored[1].fitness, f64::NEG_INFINITY);
        assert!(scored[1].source.is_some());
    }
}
