use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;

use mend::core::Language;
use mend::eval::TestOutcome;
use mend::faultloc::{FaultLocalization, WeightedLocation, WeightedSampler};
use mend::fitness::FitnessFunction;
use mend::genetic::{ParentSelector, TournamentSelection};
use mend::parser::Parser;
use mend::patch::{Patch, PatchApplier};
use mend::program::{StatementId, StatementIndex};

/// A Java method whose body is built from `lines`, one statement per line
/// starting at line 3.
fn java_program(lines: &[&str]) -> String {
    let mut src = String::from("class P {\n    int f(int a, int b) {\n");
    for line in lines {
        src.push_str("        ");
        src.push_str(line);
        src.push('\n');
    }
    src.push_str("        return a;\n    }\n}\n");
    src
}

fn statement_lines() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(
        prop_oneof![
            Just("a++;"),
            Just("b = a * 2;"),
            Just("int c = a + b;"),
            Just("if (a > b) { a = b; }"),
            Just("while (a < 10) { a += 3; }"),
            Just("for (int i = 0; i < b; i++) { a--; }"),
            Just("System.out.println(a);"),
        ],
        1..8,
    )
}

fn index_of(src: &str) -> StatementIndex {
    StatementIndex::build(&Parser::new(), src, Language::Java, Path::new("P.java")).unwrap()
}

/// 1-based line and 0-based byte column of `offset`.
fn position(source: &str, offset: usize) -> (u32, u32) {
    let before = &source[..offset];
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, (offset - line_start) as u32)
}

fn outcome(tests_run: i32, failures: i32, errors: i32, skipped: i32) -> TestOutcome {
    TestOutcome {
        tests_run,
        failures,
        errors,
        skipped,
        exit_code: if failures + errors > 0 { 1 } else { 0 },
        ..TestOutcome::default()
    }
}

// ---------------------------------------------------------------------------
// Fitness
// ---------------------------------------------------------------------------

proptest! {
    /// With equal failure, error and skip counts, more passing tests score higher.
    #[test]
    fn more_passed_tests_score_higher(
        failures in 1..20i32,
        errors in 0..20i32,
        skipped in 0..20i32,
        run in 0..100i32,
        extra in 1..50i32,
    ) {
        let fitness = FitnessFunction::default();
        let base = failures + errors + skipped + run;
        let fewer = outcome(base, failures, errors, skipped);
        let more = outcome(base + extra, failures, errors, skipped);
        prop_assert!(fitness.score(Some(&more)) > fitness.score(Some(&fewer)));
    }

    /// A clean full pass beats every outcome that lacks one.
    #[test]
    fn success_dominates_everything_else(
        run in 0..1_000i32,
        failures in 0..1_000i32,
        errors in 0..100i32,
        timed_out in any::<bool>(),
        exit_code in -2..3i32,
        pos in 0.0..5.0f64,
        neg in 0.01..50.0f64,
    ) {
        let fitness = FitnessFunction::new(pos, neg).unwrap();
        let success = TestOutcome {
            tests_run: 1,
            all_passed: true,
            ..TestOutcome::default()
        };
        let other = TestOutcome {
            tests_run: run,
            failures,
            errors,
            timed_out,
            exit_code,
            all_passed: failures == 0 && errors == 0 && !timed_out && exit_code == 0,
            ..TestOutcome::default()
        };
        prop_assume!(!(other.all_passed && !other.timed_out && other.exit_code == 0));
        prop_assert!(fitness.score(Some(&success)) > fitness.score(Some(&other)));
        prop_assert!(fitness.score(Some(&other)) > fitness.score(None));
    }
}

// ---------------------------------------------------------------------------
// Statement index and patch application
// ---------------------------------------------------------------------------

proptest! {
    /// Recomputing each statement's position from its byte range gives back
    /// its id; unknown ids do not resolve.
    #[test]
    fn index_ids_match_byte_ranges(lines in statement_lines()) {
        let src = java_program(&lines);
        let index = index_of(&src);
        prop_assert!(!index.is_empty());
        for &id in index.ids() {
            let range = index.get(id).unwrap().byte_range.clone();
            let (begin_line, begin_col) = position(index.source(), range.start);
            let (end_line, end_col) = position(index.source(), range.end);
            prop_assert_eq!(StatementId::new(begin_line, begin_col + 1, end_line, end_col), id);
        }
        let bogus = StatementId::new(1000, 1, 1000, 5);
        prop_assert!(index.get(bogus).is_err());
    }

    /// Applying the same patch twice gives byte-identical output.
    #[test]
    fn applier_is_deterministic(
        lines in statement_lines(),
        pick in any::<prop::sample::Index>(),
        donor in any::<prop::sample::Index>(),
    ) {
        let src = java_program(&lines);
        let index = index_of(&src);
        let ids = index.ids();
        let target = ids[pick.index(ids.len())];
        let donor = ids[donor.index(ids.len())];
        let applier = PatchApplier::new(Language::Java, "P.java").with_same_kind(false);

        let patch = if target == donor {
            Patch::delete(target)
        } else {
            Patch::replace(target, donor)
        };
        let first = applier.apply(&src, &patch);
        let second = applier.apply(&src, &patch);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "apply was not deterministic for {}", patch),
        }
    }

    /// Replacing a statement with itself is always rejected.
    #[test]
    fn self_replacement_is_rejected(
        lines in statement_lines(),
        pick in any::<prop::sample::Index>(),
    ) {
        let src = java_program(&lines);
        let index = index_of(&src);
        let target = index.ids()[pick.index(index.len())];
        let applier = PatchApplier::new(Language::Java, "P.java");
        prop_assert!(applier.apply(&src, &Patch::replace(target, target)).is_err());
    }
}

// ---------------------------------------------------------------------------
// Sampling and selection
// ---------------------------------------------------------------------------

proptest! {
    /// Only lines with positive weight are ever drawn.
    #[test]
    fn sampler_never_draws_zero_weight(
        lines in statement_lines(),
        levels in prop::collection::vec(prop_oneof![Just(0.0), Just(0.1), Just(1.0)], 8),
        seed in any::<u64>(),
    ) {
        let src = java_program(&lines);
        let index = index_of(&src);
        let body: Vec<(u32, f64)> = (0..lines.len())
            .map(|i| (i as u32 + 3, levels[i]))
            .collect();
        prop_assume!(body.iter().any(|&(_, w)| w > 0.0));

        let fl = FaultLocalization::new(
            "P.java",
            body.iter().map(|&(l, w)| WeightedLocation::new(l, w)).collect(),
        );
        let sampler = WeightedSampler::new(&index, &fl).unwrap();
        let allowed: HashSet<u32> = body
            .iter()
            .filter(|&&(_, w)| w > 0.0)
            .map(|&(l, _)| l)
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..200 {
            let id = sampler.sample(&mut rng);
            prop_assert!(sampler.weight_of(id) > 0.0);
            prop_assert!(allowed.contains(&id.begin_line), "drew {} outside weighted lines", id);
        }
    }

    /// A full-size tournament always returns the unique maximum.
    #[test]
    fn full_tournament_returns_unique_maximum(
        values in prop::collection::hash_set(-1_000_000i64..1_000_000, 2..30),
        seed in any::<u64>(),
    ) {
        let population: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
        let max = population.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let ts = TournamentSelection::maximize(population.len(), |x: &f64| *x).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(*ts.select_one(&mut rng, &population).unwrap(), max);
    }
}
