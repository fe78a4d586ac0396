//! Property-based tests for prediction invariants.

use bp_config::{HistoricalDataset, Variant};
use bp_core::input::{sample_inputs, PlanningInputs};
use bp_core::predictor::{CONFIDENCE_CEILING, CONFIDENCE_FLOOR};
use bp_core::{predict, BudgetPredictor, PredictionOutcome, TrendEstimator};
use proptest::prelude::*;
use serde_json::{json, Value};

fn assert_invariants(outcome: &PredictionOutcome) -> Result<(), TestCaseError> {
    let (allocation, committed, spent) = outcome.amounts();
    match outcome {
        PredictionOutcome::Computed(_) => {
            prop_assert!(allocation >= 0, "allocation {}", allocation);
            prop_assert!(committed <= allocation, "{} > {}", committed, allocation);
            prop_assert!(spent <= committed, "{} > {}", spent, committed);
        }
        PredictionOutcome::Fallback(f) => {
            prop_assert_eq!((allocation, committed, spent), (480_000_000, 465_000_000, 450_000_000));
            prop_assert!(!f.error.is_empty());
        }
    }
    prop_assert_eq!(outcome.next_year(), 2024);
    Ok(())
}

/// Planning-input values as a form or JSON client might send them.
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..200).prop_map(|n| json!(n)),
        (0i64..200).prop_map(|n| json!(n.to_string())),
        (0.0f64..10.0).prop_map(|x| json!(x)),
        (0.0f64..5e7).prop_map(|x| json!(format!("{:.2}", x))),
        Just(json!("abc")),
        Just(json!(null)),
        Just(json!(true)),
    ]
}

fn inputs_strategy() -> impl Strategy<Value = PlanningInputs> {
    let keys = prop::sample::select(vec![
        "promotions",
        "retirements",
        "newJoinees",
        "newJoineeBasicPay",
        "incrementJanuary",
        "incrementJuly",
        "basicPayDifference",
        "gratuity",
        "payLevel",
        "unrelated",
    ]);
    prop::collection::vec((keys, value_strategy()), 0..10)
        .prop_map(|pairs| pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn regression_outcome_is_consistent(inputs in inputs_strategy()) {
        for variant in Variant::ALL {
            let outcome = BudgetPredictor::builtin(*variant).predict(&inputs);
            assert_invariants(&outcome)?;
            let confidence = outcome.confidence();
            if !outcome.is_fallback() {
                prop_assert!((CONFIDENCE_FLOOR..=CONFIDENCE_CEILING).contains(&confidence));
            }
            prop_assert_eq!(outcome.factors(), &inputs);
        }
    }

    #[test]
    fn trend_outcome_is_consistent(inputs in inputs_strategy()) {
        let estimator = TrendEstimator::new(Variant::Updated.schema(), HistoricalDataset::builtin());
        let outcome = estimator.estimate(&inputs);
        assert_invariants(&outcome)?;
        prop_assert!(!outcome.is_fallback(), "{:?}", outcome.error());
        prop_assert_eq!(outcome.confidence(), 0.90);
    }

    #[test]
    fn prediction_is_idempotent(inputs in inputs_strategy()) {
        prop_assert_eq!(predict(&inputs), predict(&inputs));
    }

    #[test]
    fn numeric_staffing_counts_never_fall_back(
        promotions in 0i64..500,
        retirements in 0i64..500,
        new_joinees in 0i64..500,
    ) {
        let mut inputs = PlanningInputs::new();
        inputs.insert("promotions".into(), json!(promotions));
        inputs.insert("retirements".into(), json!(retirements.to_string()));
        inputs.insert("newJoinees".into(), json!(new_joinees));
        let outcome = predict(&inputs);
        prop_assert!(!outcome.is_fallback(), "{:?}", outcome.error());
        assert_invariants(&outcome)?;
    }
}

#[test]
fn documented_sample_predicts_next_year() {
    let outcome = predict(&sample_inputs(Variant::Updated));
    assert!(!outcome.is_fallback(), "{:?}", outcome.error());
    assert_eq!(outcome.next_year(), 2024);
    let (allocation, committed, spent) = outcome.amounts();
    assert!(allocation >= committed && committed >= spent && spent >= 0);
}

#[test]
fn empty_input_does_not_panic() {
    let outcome = predict(&PlanningInputs::new());
    assert_eq!(outcome.next_year(), 2024);
}

#[test]
fn non_numeric_promotions_returns_exact_fallback() {
    let mut inputs = PlanningInputs::new();
    inputs.insert("promotions".into(), json!("abc"));
    let json = serde_json::to_value(predict(&inputs)).unwrap();

    let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["allocation", "committed", "confidence", "error", "factors", "nextYear", "spent"]
    );
    assert_eq!(json["allocation"], 480_000_000);
    assert_eq!(json["committed"], 465_000_000);
    assert_eq!(json["spent"], 450_000_000);
    assert_eq!(json["confidence"], 0.75);
    assert_eq!(json["factors"]["promotions"], "abc");
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[test]
fn decimal_string_for_integer_field_falls_back() {
    let mut inputs = PlanningInputs::new();
    inputs.insert("newJoinees".into(), json!("2.5"));
    assert!(predict(&inputs).is_fallback());
}
