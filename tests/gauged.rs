use kira_segeval::error::EvalError;
use kira_segeval::metrics::{HecMetrics, MetricsTuple, compute_gauged_score};

fn tuple(v: f64) -> MetricsTuple {
    MetricsTuple([Some(v); 6])
}

#[test]
fn metric_equal_to_delta_scores_ninety() {
    let metrics: Vec<HecMetrics> = vec![vec![tuple(0.2), tuple(3.0)], vec![tuple(0.4), tuple(6.0)]];
    let score = compute_gauged_score(&metrics, &metrics).unwrap().unwrap();
    assert!((score - 90.0).abs() < 1e-12);
}

#[test]
fn perfect_prediction_scores_hundred() {
    let metrics = vec![vec![tuple(0.0)]];
    let deltas = vec![vec![tuple(0.5)]];
    let score = compute_gauged_score(&metrics, &deltas).unwrap().unwrap();
    assert!((score - 100.0).abs() < 1e-12);
}

#[test]
fn undefined_and_zero_deltas_are_excluded() {
    let mut m = [Some(1.0); 6];
    m[0] = None;
    let mut d = [Some(0.5); 6];
    d[1] = Some(0.0);
    d[2] = None;
    let metrics = vec![vec![MetricsTuple(m)]];
    let deltas = vec![vec![MetricsTuple(d)]];
    // entries 3, 4, 5 remain, each ratio 2
    let score = compute_gauged_score(&metrics, &deltas).unwrap().unwrap();
    assert!((score - 80.0).abs() < 1e-12);
}

#[test]
fn nothing_defined_gives_none() {
    let metrics = vec![vec![MetricsTuple([None; 6])]];
    let deltas = vec![vec![tuple(1.0)]];
    assert_eq!(compute_gauged_score(&metrics, &deltas).unwrap(), None);
    assert_eq!(compute_gauged_score(&[], &[]).unwrap(), None);
}

#[test]
fn mismatched_shapes_are_config_errors() {
    let metrics = vec![vec![tuple(1.0)]];
    let deltas = vec![vec![tuple(1.0)], vec![tuple(1.0)]];
    let err = compute_gauged_score(&metrics, &deltas).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::Config(_))
    ));

    let deltas = vec![vec![tuple(1.0), tuple(1.0)]];
    assert!(compute_gauged_score(&metrics, &deltas).is_err());
}
