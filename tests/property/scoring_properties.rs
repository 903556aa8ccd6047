use diagnosis_core::core::scoring::{most_likely, score};
use diagnosis_core::core::types::{Counters, Likelihoods, Observation, Priors};
use diagnosis_core::learning::{initial_counters, recompute_priors, update};
use diagnosis_core::DiagnosisError;
use proptest::prelude::*;
use std::collections::BTreeMap;

const SYMPTOMS: [&str; 4] = ["cough", "fever", "headache", "rash"];

fn symptoms() -> Vec<String> {
    SYMPTOMS.iter().map(|s| s.to_string()).collect()
}

/// Up to 6 categories, each with a positive prior and a likelihood per symptom
/// strictly inside (0, 1) so no category can be ruled out entirely.
fn model() -> impl Strategy<Value = (Priors, Likelihoods)> {
    prop::collection::vec(
        (0.01f64..1.0, prop::collection::vec(0.01f64..0.99, SYMPTOMS.len())),
        1..6,
    )
    .prop_map(|rows| {
        let mut priors = Priors::new();
        let mut likelihoods = Likelihoods::new();
        for (i, (prior, ls)) in rows.into_iter().enumerate() {
            let category = format!("c{i}");
            priors.insert(category.clone(), prior);
            likelihoods.insert(
                category,
                SYMPTOMS.iter().map(|s| s.to_string()).zip(ls).collect(),
            );
        }
        (priors, likelihoods)
    })
}

fn observation() -> impl Strategy<Value = Observation> {
    prop::collection::vec(any::<bool>(), SYMPTOMS.len()).prop_map(|flags| {
        let answers: BTreeMap<String, bool> = symptoms().into_iter().zip(flags).collect();
        Observation::new(&symptoms(), answers).unwrap()
    })
}

proptest! {
    #[test]
    fn posterior_sums_to_one((priors, likelihoods) in model(), obs in observation()) {
        let posterior = score(&priors, &likelihoods, &obs).unwrap();
        let total: f64 = posterior.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "sum was {}", total);
        prop_assert!(posterior.values().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn scoring_is_idempotent((priors, likelihoods) in model(), obs in observation()) {
        let first = score(&priors, &likelihoods, &obs).unwrap();
        let second = score(&priors, &likelihoods, &obs).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(most_likely(&first), most_likely(&second));
    }

    #[test]
    fn most_likely_has_the_maximum((priors, likelihoods) in model(), obs in observation()) {
        let posterior = score(&priors, &likelihoods, &obs).unwrap();
        let best = most_likely(&posterior).unwrap();
        let max = posterior.values().cloned().fold(f64::MIN, f64::max);
        prop_assert_eq!(posterior[best], max);
    }

    #[test]
    fn recomputed_priors_sum_to_one(counts in prop::collection::vec(1u64..10_000, 1..20)) {
        let counters: Counters = counts
            .iter()
            .enumerate()
            .map(|(i, n)| (format!("c{i}"), *n))
            .collect();
        let priors = recompute_priors(&counters).unwrap();
        let total: f64 = priors.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_confirmation_never_touches_counters(n in 1usize..10, name in "[x-z]{3,8}") {
        let categories: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
        let counters = initial_counters(&categories);
        let err = update(&counters, &name).unwrap_err();
        prop_assert!(matches!(err, DiagnosisError::UnknownCategory(_)));
        prop_assert!(counters.values().all(|&c| c == 1));
    }
}

#[test]
fn lone_ruled_out_category_is_degenerate() {
    let priors = Priors::from([("flu".to_string(), 1.0)]);
    let likelihoods = Likelihoods::from([(
        "flu".to_string(),
        symptoms().into_iter().map(|s| (s, 0.0)).collect(),
    )]);
    let obs = Observation::from_present(&symptoms(), &["rash"]).unwrap();
    assert!(matches!(
        score(&priors, &likelihoods, &obs),
        Err(DiagnosisError::DegenerateEvidence)
    ));
}
