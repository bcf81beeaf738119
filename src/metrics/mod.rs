pub mod edt;
pub mod gauged;
pub mod surface;

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use gauged::compute_gauged_score;

use crate::error::EvalError;
use crate::labels::LabelRegistry;
use crate::volume::{Volume, VolumeSource, mask};

pub const N_METRICS: usize = 6;
pub const DISTANCE_CAP: f64 = 100.0;

pub const ONE_MINUS_DICE: usize = 0;
pub const ONE_MINUS_JACCARD: usize = 1;
pub const SRVD: usize = 2;
pub const AVD: usize = 3;
pub const ASSD: usize = 4;
pub const RMSD: usize = 5;

/// Six error metrics, all lower-is-better. `None` marks a value that is not
/// defined (both masks empty).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsTuple(pub [Option<f64>; N_METRICS]);

impl MetricsTuple {
    pub fn get(&self, idx: usize) -> Option<f64> {
        self.0[idx]
    }

    pub fn values(&self) -> &[Option<f64>; N_METRICS] {
        &self.0
    }
}

/// One tuple per HEC, in registry order.
pub type HecMetrics = Vec<MetricsTuple>;

pub fn compute_metrics(
    predicted: &Array3<u8>,
    reference: &Array3<u8>,
    labels: &[u8],
    spacing: [f64; 3],
) -> Result<MetricsTuple, EvalError> {
    if predicted.shape() != reference.shape() {
        let p = predicted.shape();
        let r = reference.shape();
        return Err(EvalError::ShapeMismatch {
            left: [p[0], p[1], p[2]],
            right: [r[0], r[1], r[2]],
        });
    }

    if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(EvalError::config(format!(
            "spacing must be positive and finite, got {spacing:?}"
        )));
    }

    let mask_pred = predicted.mapv(|v| labels.contains(&v));
    let mask_ref = reference.mapv(|v| labels.contains(&v));

    let n_pred = mask::count(&mask_pred);
    let n_ref = mask::count(&mask_ref);
    let mut n_inter = 0usize;
    Zip::from(&mask_pred).and(&mask_ref).for_each(|&p, &r| {
        if p && r {
            n_inter += 1;
        }
    });
    let n_union = n_pred + n_ref - n_inter;

    let voxel_volume: f64 = spacing.iter().product();
    let vol_pred = n_pred as f64 * voxel_volume;
    let vol_ref = n_ref as f64 * voxel_volume;
    let avd = (vol_pred - vol_ref).abs();

    if n_pred == 0 && n_ref == 0 {
        return Ok(MetricsTuple([None, None, None, Some(avd), None, None]));
    }

    let dice = 2.0 * n_inter as f64 / (n_pred + n_ref) as f64;
    let jaccard = n_inter as f64 / n_union as f64;
    let srvd = 2.0 * avd / (vol_pred + vol_ref);

    let (assd, rmsd) = match surface::surface_distances(&mask_pred, &mask_ref, spacing) {
        Some((pred_to_ref, ref_to_pred)) => capped_surface_stats(&pred_to_ref, &ref_to_pred),
        None => (DISTANCE_CAP, DISTANCE_CAP),
    };

    Ok(MetricsTuple([
        Some(1.0 - dice),
        Some(1.0 - jaccard),
        Some(srvd),
        Some(avd),
        Some(assd),
        Some(rmsd),
    ]))
}

fn capped_surface_stats(a: &[f64], b: &[f64]) -> (f64, f64) {
    let n = (a.len() + b.len()) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &d in a.iter().chain(b.iter()) {
        let d = d.min(DISTANCE_CAP);
        sum += d;
        sum_sq += d * d;
    }
    (sum / n, (sum_sq / n).sqrt())
}

/// Compares two volumes for every HEC of the registry. Differing spacing is
/// tolerated with a warning and the predicted spacing is used.
pub fn evaluate_volumes(
    predicted: &Volume,
    reference: &Volume,
    registry: &LabelRegistry,
) -> Result<HecMetrics> {
    predicted.ensure_same_shape(reference)?;
    if !predicted.spacing_matches(reference) {
        warn!(
            predicted = ?predicted.spacing,
            reference = ?reference.spacing,
            "predicted and reference segmentation do not have the same spacing"
        );
    }
    let mut out = Vec::with_capacity(registry.hecs().len());
    for hec in registry.hecs() {
        let tuple = compute_metrics(
            &predicted.labels,
            &reference.labels,
            &hec.labels,
            predicted.spacing,
        )
        .with_context(|| format!("HEC {}", hec.name))?;
        out.push(tuple);
    }
    Ok(out)
}

pub fn evaluate_case(
    predicted: &Path,
    reference: &Path,
    registry: &LabelRegistry,
) -> Result<HecMetrics> {
    evaluate_sources(predicted, reference, registry)
}

pub fn evaluate_sources<A, B>(
    predicted: &A,
    reference: &B,
    registry: &LabelRegistry,
) -> Result<HecMetrics>
where
    A: VolumeSource + ?Sized,
    B: VolumeSource + ?Sized,
{
    let pred = predicted.load()?;
    let reference_vol = reference.load()?;
    evaluate_volumes(&pred, &reference_vol, registry).with_context(|| {
        format!(
            "evaluating {} against {}",
            predicted.describe(),
            reference.describe()
        )
    })
}
