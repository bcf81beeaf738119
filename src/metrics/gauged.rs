use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::ctx::OutputPaths;
use crate::deltas::load_deltas;
use crate::error::EvalError;
use crate::labels::LabelRegistry;
use crate::math::pool::run_indexed;
use crate::math::stats::defined_mean;
use crate::metrics::{HecMetrics, N_METRICS, evaluate_sources};
use crate::volume::read_volume;

pub const PERFECT_SCORE: f64 = 100.0;
pub const ERROR_WEIGHT: f64 = 10.0;

/// `100 - 10 * mean(metric / delta)` over every (reference, HEC, metric)
/// entry. `metrics[r]` is the submission compared against reference `r` and
/// `deltas[r]` that reference's delta.
///
/// Entries where the metric or the delta is undefined, or the delta is zero,
/// drop out of the mean. Returns `Ok(None)` when no entry is left.
pub fn compute_gauged_score(metrics: &[HecMetrics], deltas: &[HecMetrics]) -> Result<Option<f64>> {
    if metrics.len() != deltas.len() {
        return Err(EvalError::config(format!(
            "{} metric sets but {} delta sets",
            metrics.len(),
            deltas.len()
        ))
        .into());
    }

    let mut scaled = Vec::with_capacity(metrics.len() * N_METRICS * 6);
    let mut zero_deltas = 0usize;
    for (r, (m, d)) in metrics.iter().zip(deltas.iter()).enumerate() {
        if m.len() != d.len() {
            return Err(EvalError::config(format!(
                "reference {}: {} HECs in metrics but {} in deltas",
                r,
                m.len(),
                d.len()
            ))
            .into());
        }
        for (mt, dt) in m.iter().zip(d.iter()) {
            for idx in 0..N_METRICS {
                let value = match (mt.get(idx), dt.get(idx)) {
                    (Some(_), Some(delta)) if delta == 0.0 => {
                        zero_deltas += 1;
                        None
                    }
                    (Some(metric), Some(delta)) => Some(metric / delta),
                    _ => None,
                };
                scaled.push(value);
            }
        }
    }

    if zero_deltas > 0 {
        warn!(zero_deltas, "zero deltas excluded from gauged score");
    }

    Ok(defined_mean(scaled).map(|mean| PERFECT_SCORE - ERROR_WEIGHT * mean))
}

/// Scores `predicted` against every sample listed in the case's delta report.
pub fn score_prediction(
    predicted: &Path,
    case_dir: &Path,
    registry: &LabelRegistry,
    suffix: Option<&str>,
    threads: usize,
) -> Result<Option<f64>> {
    let paths = OutputPaths::for_case(case_dir.to_path_buf(), suffix);
    let report = load_deltas(&paths.deltas_json, registry)?;
    let prediction = read_volume(predicted)?;

    let results = run_indexed(threads, report.samples.len(), |i| {
        let reference = paths.samples_dir.join(&report.samples[i]);
        evaluate_sources(&prediction, &reference, registry)
    })?;
    let metrics = results
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("scoring {}", predicted.display()))?;

    let score = compute_gauged_score(&metrics, &report.deltas)?;
    info!(
        case = %report.case,
        references = metrics.len(),
        score = ?score,
        "gauged score computed"
    );
    Ok(score)
}
