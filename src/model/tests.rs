// Model search scenarios
//
// Each test builds a small sample table with a known cost law plus a
// deterministic jitter and checks which regressors the search picks.

use super::*;
use crate::error::EngineError;
use crate::samples::{SampleTable, SizeTransform, VariableCatalog, VariableDescriptor, VariableSource};
use std::collections::BTreeMap;

const JITTER: [f64; 6] = [0.3, -0.2, 0.1, -0.4, 0.25, -0.05];

fn record(table: &mut SampleTable, label: &str, n: u64, metrics: &[(&str, f64)]) {
    let raw: BTreeMap<String, f64> = metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    table.record(label, n, &raw).unwrap();
}

/// N = 10, 20, ..., 200 with `cost(N) + jitter`
fn record_law(table: &mut SampleTable, label: &str, cost: impl Fn(f64) -> f64) {
    for (i, n) in (10..=200u64).step_by(10).enumerate() {
        let cycles = cost(n as f64) + JITTER[i % JITTER.len()];
        record(table, label, n, &[("cycles", cycles)]);
    }
}

fn size_and_constant() -> FamilyAssignment {
    FamilyAssignment::new()
        .with(Family::new("size", ["N", "N2", "log(N)"]))
        .with(Family::new("constant", ["Constant"]))
}

fn engine(table: &SampleTable) -> ModelSearchEngine<'_> {
    ModelSearchEngine::new(table, SearchConfig::default()).unwrap()
}

/// Scenario: cost grows linearly with a fixed setup overhead
#[test]
fn test_linear_cost_selects_n() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);

    let outcome = engine(&table)
        .fit("copy", "cycles", &size_and_constant())
        .unwrap();
    let result = outcome.result().expect("linear law should converge");

    assert_eq!(result.variables(), vec!["N", "Constant"]);
    let slope = result.term("N").unwrap();
    assert!((slope.coefficient - 2.0).abs() < 0.01, "slope {}", slope.coefficient);
    assert!(slope.p_value < 0.01);
    let intercept = result.term("Constant").unwrap();
    assert!((intercept.coefficient - 3.0).abs() < 0.5);
    assert!(result.fit.r_squared > 0.999);
    assert_eq!(result.chosen, 0);
}

#[test]
fn test_candidates_in_enumeration_order() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);

    let outcome = engine(&table)
        .fit("copy", "cycles", &size_and_constant())
        .unwrap();
    let variables: Vec<Vec<String>> = outcome
        .candidates()
        .iter()
        .map(|c| c.variables.clone())
        .collect();
    assert_eq!(
        variables,
        vec![
            vec!["N".to_string(), "Constant".to_string()],
            vec!["N2".to_string(), "Constant".to_string()],
            vec!["log(N)".to_string(), "Constant".to_string()],
        ]
    );
    assert!(outcome.candidates().iter().all(CandidateReport::is_accepted));
}

/// Scenario: quadratic algorithm, searched over the default groups
#[test]
fn test_quadratic_cost_with_default_families() {
    let mut table = SampleTable::new();
    record_law(&mut table, "sort", |n| 5.0 + 0.5 * n * n);

    let outcome = engine(&table).fit_default("sort", "cycles").unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.variables(), vec!["Constant", "N2"]);
    assert!((result.term("N2").unwrap().coefficient - 0.5).abs() < 1e-3);
    // Constant family × four size transforms
    assert_eq!(outcome.candidates().len(), 4);
}

#[test]
fn test_bic_criterion() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);

    let config = SearchConfig {
        criterion: Criterion::Bic,
        ..SearchConfig::default()
    };
    let engine = ModelSearchEngine::new(&table, config).unwrap();
    let result = engine
        .fit("copy", "cycles", &size_and_constant())
        .unwrap()
        .result()
        .cloned()
        .unwrap();
    assert_eq!(result.criterion, Criterion::Bic);
    assert_eq!(result.variables(), vec!["N", "Constant"]);
}

/// Scenario: not enough points to fit anything
#[test]
fn test_too_few_observations_for_any_candidate() {
    let mut table = SampleTable::new();
    record(&mut table, "tiny", 10, &[("cycles", 23.0)]);
    record(&mut table, "tiny", 20, &[("cycles", 43.0)]);

    let families = FamilyAssignment::new()
        .with(Family::new("size", ["N"]))
        .with(Family::new("constant", ["Constant"]));
    let outcome = engine(&table).fit("tiny", "cycles", &families).unwrap();

    match outcome {
        ModelOutcome::NotConverged(failure) => {
            assert_eq!(failure.reason, NonConvergence::AllCandidatesFailed);
            assert_eq!(failure.candidates.len(), 1);
            assert_eq!(
                failure.candidates[0].status,
                CandidateStatus::Failed(FitFailure::InsufficientDegreesOfFreedom {
                    observations: 2,
                    coefficients: 2,
                })
            );
        }
        ModelOutcome::Converged(_) => panic!("two points cannot fit two coefficients"),
    }
}

#[test]
fn test_fewer_observations_than_largest_family() {
    let mut table = SampleTable::new();
    for (n, cycles) in [(10, 25.0), (20, 41.0), (40, 86.0)] {
        record(&mut table, "short", n, &[("cycles", cycles)]);
    }

    let outcome = engine(&table).fit_default("short", "cycles").unwrap();
    match &outcome {
        ModelOutcome::NotConverged(failure) => {
            assert_eq!(
                failure.reason,
                NonConvergence::InsufficientObservations {
                    observations: 3,
                    largest_family: 4,
                }
            );
        }
        ModelOutcome::Converged(_) => panic!("expected non-convergence"),
    }
    // Every candidate is still reported
    assert_eq!(outcome.candidates().len(), 4);
    assert!(!outcome.is_converged());
    assert_eq!(outcome.label(), "short");
}

#[test]
fn test_tie_goes_to_first_enumerated() {
    let mut table = SampleTable::new();
    for (i, n) in (1..=12u64).enumerate() {
        let x = (n * 3) as f64;
        record(
            &mut table,
            "dup",
            n,
            &[("a", x), ("b", x), ("cycles", 2.0 * x + JITTER[i % 6])],
        );
    }

    let families = FamilyAssignment::new()
        .with(Family::new("alt", ["a", "b"]))
        .with(Family::new("constant", ["Constant"]));
    let outcome = engine(&table).fit("dup", "cycles", &families).unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.chosen, 0);
    assert_eq!(result.variables(), vec!["a", "Constant"]);
}

#[test]
fn test_singular_candidate_is_reported() {
    let mut table = SampleTable::new();
    for (i, n) in (1..=10u64).enumerate() {
        record(
            &mut table,
            "flat",
            n,
            &[("cycles", 7.0 + JITTER[i % 6]), ("one", 1.0)],
        );
    }

    // "one" duplicates the intercept
    let families = FamilyAssignment::new()
        .with(Family::new("alt", ["one", "N"]))
        .with(Family::new("constant", ["Constant"]));
    let outcome = engine(&table).fit("flat", "cycles", &families).unwrap();
    assert_eq!(
        outcome.candidates()[0].status,
        CandidateStatus::Failed(FitFailure::Singular)
    );
    assert_eq!(outcome.result().unwrap().variables(), vec!["N", "Constant"]);
}

#[test]
fn test_reject_negative_coefficients() {
    let mut table = SampleTable::new();
    record_law(&mut table, "shrink", |n| 1000.0 - 2.0 * n);

    let families = FamilyAssignment::new()
        .with(Family::new("size", ["N"]))
        .with(Family::new("constant", ["Constant"]));

    let strict = SearchConfig {
        reject_negative_coefficients: true,
        ..SearchConfig::default()
    };
    let outcome = ModelSearchEngine::new(&table, strict)
        .unwrap()
        .fit("shrink", "cycles", &families)
        .unwrap();
    match outcome {
        ModelOutcome::NotConverged(failure) => {
            assert_eq!(failure.reason, NonConvergence::AllCandidatesRejected);
            assert!(matches!(
                &failure.candidates[0].status,
                CandidateStatus::Rejected(RejectReason::NegativeCoefficient { name, .. }) if name == "N"
            ));
        }
        ModelOutcome::Converged(_) => panic!("negative slope should be rejected"),
    }

    // Default policy keeps it
    let outcome = engine(&table).fit("shrink", "cycles", &families).unwrap();
    assert!(outcome.result().unwrap().term("N").unwrap().coefficient < 0.0);
}

/// Scenario: cost does not depend on N at all
#[test]
fn test_require_significant_terms() {
    let mut table = SampleTable::new();
    for (i, n) in (10..=200u64).step_by(10).enumerate() {
        let cycles = 50.0 + if i % 2 == 0 { 1.0 } else { -1.0 };
        record(&mut table, "flat", n, &[("cycles", cycles)]);
    }
    let families = FamilyAssignment::new()
        .with(Family::new("size", ["N"]))
        .with(Family::new("constant", ["Constant"]));

    let strict = SearchConfig {
        require_significant_terms: true,
        ..SearchConfig::default()
    };
    let outcome = ModelSearchEngine::new(&table, strict)
        .unwrap()
        .fit("flat", "cycles", &families)
        .unwrap();
    match outcome {
        ModelOutcome::NotConverged(failure) => {
            assert_eq!(failure.reason, NonConvergence::AllCandidatesRejected);
            match &failure.candidates[0].status {
                CandidateStatus::Rejected(RejectReason::InsignificantTerm { name, p_value }) => {
                    assert_eq!(name, "N");
                    assert!(*p_value > 0.05);
                }
                other => panic!("unexpected status {:?}", other),
            }
        }
        ModelOutcome::Converged(_) => panic!("slope on pure noise should be rejected"),
    }

    // Without the filter the insignificant model is still reported
    let result = engine(&table)
        .fit("flat", "cycles", &families)
        .unwrap()
        .result()
        .cloned()
        .unwrap();
    assert!(result.term("N").unwrap().p_value > 0.05);
    assert!((result.term("Constant").unwrap().coefficient - 50.0).abs() < 1.0);
}

#[test]
fn test_empty_families_yield_no_candidates() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| n);

    let families = FamilyAssignment::new().with(Family::new("empty", Vec::<String>::new()));
    let outcome = engine(&table).fit("copy", "cycles", &families).unwrap();
    match outcome {
        ModelOutcome::NotConverged(failure) => {
            assert_eq!(failure.reason, NonConvergence::NoCandidates);
            assert!(failure.candidates.is_empty());
        }
        ModelOutcome::Converged(_) => panic!("nothing to fit"),
    }
}

#[test]
fn test_lookup_errors() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| n);
    let engine = engine(&table);

    assert!(matches!(
        engine.fit_default("missing", "cycles"),
        Err(EngineError::UnknownLabel(_))
    ));
    assert!(matches!(
        engine.fit_default("copy", "instructions"),
        Err(EngineError::UnknownDependent { .. })
    ));
    let bad = FamilyAssignment::new().with(Family::new("size", ["N3"]));
    assert!(matches!(
        engine.fit("copy", "cycles", &bad),
        Err(EngineError::UnknownFamilyMember { .. })
    ));
}

#[test]
fn test_combination_limit() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| n);

    let config = SearchConfig {
        max_combinations: 3,
        ..SearchConfig::default()
    };
    let engine = ModelSearchEngine::new(&table, config).unwrap();
    assert!(matches!(
        engine.fit_default("copy", "cycles"),
        Err(EngineError::TooManyCombinations { count: 4, limit: 3 })
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let table = SampleTable::new();
    let config = SearchConfig {
        significance_level: -1.0,
        ..SearchConfig::default()
    };
    assert!(matches!(
        ModelSearchEngine::new(&table, config),
        Err(EngineError::InvalidConfig(_))
    ));
}

#[test]
fn test_fit_all_in_label_order() {
    let mut table = SampleTable::new();
    record_law(&mut table, "sort", |n| 5.0 + 0.5 * n * n);
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);

    let outcomes = engine(&table).fit_all("cycles").unwrap();
    let labels: Vec<&str> = outcomes.iter().map(ModelOutcome::label).collect();
    assert_eq!(labels, vec!["copy", "sort"]);
    assert!(outcomes.iter().all(ModelOutcome::is_converged));
}

#[test]
fn test_pooled_model_scopes_variables_by_label() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);
    record_law(&mut table, "sort", |n| 5.0 + 0.5 * n * n);

    let outcome = engine(&table).fit_pooled("cycles").unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.label, POOLED_LABEL);
    assert_eq!(
        result.variables(),
        vec!["copy:Constant", "copy:N", "sort:Constant", "sort:N2"]
    );
    assert!((result.term("copy:N").unwrap().coefficient - 2.0).abs() < 0.01);
    // 1 × 4 × 1 × 4
    assert_eq!(outcome.candidates().len(), 16);
}

#[test]
fn test_pooled_model_shares_global_variables() {
    let catalog = VariableCatalog::empty()
        .with(VariableDescriptor::new("Constant", 0, VariableSource::Constant).global())
        .with(VariableDescriptor::new(
            "N",
            1,
            VariableSource::ProblemSize(SizeTransform::Linear),
        ));
    let mut table = SampleTable::with_catalog(catalog);
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);
    record_law(&mut table, "fill", |n| 3.0 + 5.0 * n);

    let outcome = engine(&table).fit_pooled("cycles").unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.variables(), vec!["Constant", "copy:N", "fill:N"]);
    assert!((result.term("Constant").unwrap().coefficient - 3.0).abs() < 0.5);
    assert!((result.term("fill:N").unwrap().coefficient - 5.0).abs() < 0.01);
}

#[test]
fn test_pooled_requires_dependent_everywhere() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| n);
    record(&mut table, "other", 10, &[("instructions", 5.0)]);

    assert!(matches!(
        engine(&table).fit_pooled("cycles"),
        Err(EngineError::UnknownDependent { label, .. }) if label == "other"
    ));
}

#[test]
fn test_outcome_serializes_to_json() {
    let mut table = SampleTable::new();
    record_law(&mut table, "copy", |n| 3.0 + 2.0 * n);
    let outcome = engine(&table)
        .fit("copy", "cycles", &size_and_constant())
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "converged");
    assert_eq!(json["terms"][0]["name"], "N");
    assert_eq!(json["candidates"][0]["status"]["status"], "accepted");
}
