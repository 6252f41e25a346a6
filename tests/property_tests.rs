//! Property-based tests for the Testable Properties of the discrimination
//! network: retraction inverse, order invariance of final state, and
//! weight positivity under arbitrary feedback sequences.

use std::collections::BTreeSet;

use emberrete::condition::{Condition, ConditionField as F};
use emberrete::engine::Engine;
use emberrete::strategy::{ConflictResolutionStrategy, GamblersBucketBrigade};
use proptest::prelude::*;

fn build_family_engine() -> Engine {
    let mut engine = Engine::new();
    engine
        .add_production(
            "grandparent",
            vec![
                Condition::new(F::var("x"), F::constant("parent"), F::var("y")),
                Condition::new(F::var("y"), F::constant("parent"), F::var("z")),
            ],
            Vec::new(),
        )
        .unwrap();
    engine
}

fn matches_snapshot(engine: &Engine) -> BTreeSet<(String, String, String)> {
    engine
        .matches("grandparent")
        .into_iter()
        .map(|bindings| {
            let get = |v: &str| bindings.get(&emberrete::term::VarName(v.to_string())).unwrap().to_string();
            (get("x"), get("y"), get("z"))
        })
        .collect()
}

fn names(n: usize) -> impl Strategy<Value = String> {
    (0..n).prop_map(|i| format!("p{i}"))
}

proptest! {
    /// Testable Property 4: assert(x); retract(x) returns the engine to
    /// exactly the pre-assert state of match snapshots.
    #[test]
    fn retraction_is_the_inverse_of_assertion(a in names(6), b in names(6)) {
        prop_assume!(a != b);
        let mut engine = build_family_engine();
        engine.assert("seed", "parent", "mid");
        let before = matches_snapshot(&engine);

        let wme = engine.assert(a.clone(), "parent", b.clone());
        engine.retract(wme).unwrap();

        let after = matches_snapshot(&engine);
        prop_assert_eq!(before, after);
    }

    /// Testable Property 5: asserting the same multiset of WMEs in any
    /// order yields the same set of full-match tokens.
    #[test]
    fn order_of_assertion_does_not_affect_final_matches(
        mut triples in prop::collection::vec((names(4), names(4)), 1..6)
    ) {
        triples.dedup();
        let forward: Vec<_> = triples.clone();
        let mut backward = triples.clone();
        backward.reverse();

        let mut forward_engine = build_family_engine();
        for (x, y) in &forward {
            forward_engine.assert(x.clone(), "parent", y.clone());
        }

        let mut backward_engine = build_family_engine();
        for (x, y) in &backward {
            backward_engine.assert(x.clone(), "parent", y.clone());
        }

        prop_assert_eq!(matches_snapshot(&forward_engine), matches_snapshot(&backward_engine));
    }

    /// Testable Property 7: after any sequence of feedback calls, every
    /// weight stays at or above the clamp floor.
    #[test]
    fn bucket_brigade_weights_never_drop_below_the_floor(
        scores in prop::collection::vec(-2.0f64..2.0, 0..40)
    ) {
        let mut strategy = GamblersBucketBrigade::new(11).with_weight_floor(0.1);
        for score in scores {
            strategy.feedback("R", score);
            prop_assert!(strategy.weight("R") >= 0.1);
        }
    }
}
