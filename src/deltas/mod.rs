//! Inter-annotator variability: every sample against every other sample,
//! then a leave-one-out mean per sample.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::EvalError;
use crate::io::json_writer::read_json;
use crate::labels::LabelRegistry;
use crate::math::pool::run_indexed;
use crate::math::stats::defined_mean;
use crate::metrics::{HecMetrics, MetricsTuple, N_METRICS, evaluate_sources};
use crate::schema::v1::DeltaReport;
use crate::volume::VolumeSource;

/// Symmetric n x n matrix of per-HEC metrics. The diagonal is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PairMatrix {
    pub n: usize,
    pub hecs: usize,
    pub cells: Vec<Option<HecMetrics>>,
}

impl PairMatrix {
    pub fn empty(n: usize, hecs: usize) -> Self {
        Self {
            n,
            hecs,
            cells: vec![None; n * n],
        }
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&HecMetrics> {
        self.cells.get(i * self.n + j).and_then(|c| c.as_ref())
    }

    pub fn set_pair(&mut self, i: usize, j: usize, metrics: HecMetrics) {
        self.cells[j * self.n + i] = Some(metrics.clone());
        self.cells[i * self.n + j] = Some(metrics);
    }

    /// Row-major nested form used by the JSON report.
    pub fn to_rows(&self) -> Vec<Vec<Option<HecMetrics>>> {
        self.cells.chunks(self.n.max(1)).map(|row| row.to_vec()).collect()
    }
}

/// The `(i, j)` pairs with `i < j`, in row-major order.
pub fn pair_units(n: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push((i, j));
        }
    }
    out
}

/// Evaluates every unordered pair on the worker pool. Any failed pair fails
/// the whole matrix.
pub fn all_pairs<S>(sources: &[S], registry: &LabelRegistry, threads: usize) -> Result<PairMatrix>
where
    S: VolumeSource,
{
    let n = sources.len();
    if n < 2 {
        return Err(EvalError::config(format!(
            "deltas need at least 2 reference segmentations, got {n}"
        ))
        .into());
    }
    let units = pair_units(n);
    info!(segmentations = n, pairs = units.len(), "evaluating all pairs");

    let results = run_indexed(threads, units.len(), |u| {
        let (i, j) = units[u];
        evaluate_sources(&sources[i], &sources[j], registry)
    })?;

    let mut matrix = PairMatrix::empty(n, registry.hecs().len());
    let mut first_error = None;
    let mut failed = 0usize;
    for (u, result) in results.into_iter().enumerate() {
        let (i, j) = units[u];
        match result {
            Ok(metrics) => matrix.set_pair(i, j, metrics),
            Err(err) => {
                failed += 1;
                warn!(i, j, error = %format!("{err:#}"), "pair failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err.context(format!("{failed} of {} pairs failed", units.len())));
    }
    Ok(matrix)
}

/// Per sample, per HEC, per metric: mean over the other samples of the
/// defined pair values. No defined value gives `None`.
pub fn compute_deltas(matrix: &PairMatrix) -> Vec<HecMetrics> {
    let mut out = Vec::with_capacity(matrix.n);
    let mut undefined = 0usize;
    for i in 0..matrix.n {
        let mut per_hec = Vec::with_capacity(matrix.hecs);
        for h in 0..matrix.hecs {
            let mut tuple = [None; N_METRICS];
            for (m, slot) in tuple.iter_mut().enumerate() {
                *slot = defined_mean(
                    (0..matrix.n)
                        .filter(|&j| j != i)
                        .map(|j| matrix.get(i, j).and_then(|hm| hm.get(h)).and_then(|t| t.get(m))),
                );
                if slot.is_none() {
                    undefined += 1;
                }
            }
            per_hec.push(MetricsTuple(tuple));
        }
        out.push(per_hec);
    }
    if undefined > 0 {
        info!(undefined, "delta entries with no defined pair values");
    }
    out
}

/// Reads `deltas.json` back and checks it against the registry.
pub fn load_deltas(path: &Path, registry: &LabelRegistry) -> Result<DeltaReport> {
    let report: DeltaReport =
        read_json(path).with_context(|| format!("failed to load deltas {}", path.display()))?;
    let expected = registry.hec_names();
    if report.hecs != expected {
        return Err(EvalError::config(format!(
            "{} was computed for HECs {:?}, expected {:?}",
            path.display(),
            report.hecs,
            expected
        ))
        .into());
    }
    if report.deltas.len() != report.samples.len() {
        return Err(EvalError::config(format!(
            "{} lists {} samples but {} delta rows",
            path.display(),
            report.samples.len(),
            report.deltas.len()
        ))
        .into());
    }
    Ok(report)
}
