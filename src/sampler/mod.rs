pub mod consensus;
pub mod discover;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::construct::{LabelGroups, build_segmentation};
use crate::ctx::SampleOptions;
use crate::error::EvalError;
use crate::io::json_writer::write_json;
use crate::labels::LabelRegistry;
use crate::math::pool::run_indexed;
use crate::schema::v1::SampleManifest;
use crate::volume::write_volume;

use discover::CaseAnnotations;

pub const SAMPLES_DIR: &str = "segmentation_samples";
pub const SAMPLE_PREFIX: &str = "sample_";
pub const VOLUME_SUFFIX: &str = ".kvol.gz";

/// Seed of one sample. Distinct for every (case, sample) pair, so a sample
/// can be regenerated alone without replaying the draws before it.
pub fn sample_seed(case_id: u64, sample_index: u32) -> u64 {
    (case_id << 32) | sample_index as u64
}

/// `sample_0007` or `sample_0007_{suffix}`.
pub fn sample_stem(sample_index: u32, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) => format!("{SAMPLE_PREFIX}{sample_index:04}_{s}"),
        None => format!("{SAMPLE_PREFIX}{sample_index:04}"),
    }
}

/// One drawn delineation per instance, grouped by class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub seed: u64,
    pub chosen: LabelGroups<PathBuf>,
}

pub fn draw_selection(annotations: &CaseAnnotations, seed: u64) -> Selection {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut chosen: LabelGroups<PathBuf> = BTreeMap::new();
    for (&class_id, structure) in &annotations.structures {
        for inst in &structure.instances {
            let n = inst.delineations.len();
            if n == 0 {
                continue;
            }
            let pick = rng.gen_range(0..n);
            chosen
                .entry(class_id)
                .or_default()
                .push(inst.delineations[pick].path.clone());
        }
    }
    Selection { seed, chosen }
}

pub fn build_manifest(
    annotations: &CaseAnnotations,
    registry: &LabelRegistry,
    selection: &Selection,
    sample_index: u32,
    options: &SampleOptions,
) -> SampleManifest {
    let mut manifest = SampleManifest::new(
        &annotations.case_name,
        sample_index,
        selection.seed,
        options.policy,
    );
    for class in registry.classes() {
        let files = selection
            .chosen
            .get(&class.id)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        manifest.structures.insert(class.name.clone(), files);
    }
    manifest
}

#[derive(Debug)]
enum UnitOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Draws and writes `options.num_samples` segmentations of one case into
/// `out_dir`. Every unit runs even when others fail; failures are reported
/// together at the end. Returns the volume paths in sample order.
pub fn generate_samples(
    annotations: &CaseAnnotations,
    registry: &LabelRegistry,
    options: &SampleOptions,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if annotations.total_delineations() == 0 {
        return Err(EvalError::config(format!(
            "case {} has no delineations",
            annotations.case_name
        ))
        .into());
    }
    if !options.policy.is_default() && options.suffix.is_none() {
        warn!(
            policy = options.policy.name(),
            "non-default construction policy without a suffix; existing default samples may be overwritten"
        );
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let suffix = options.suffix.as_deref();
    let total = options.num_samples as usize;
    let results = run_indexed(options.threads, total, |i| {
        let index = i as u32;
        let stem = sample_stem(index, suffix);
        let volume_path = out_dir.join(format!("{stem}{VOLUME_SUFFIX}"));
        if options.skip_existing && volume_path.is_file() {
            return Ok(UnitOutcome::Skipped(volume_path));
        }
        let selection = draw_selection(annotations, sample_seed(annotations.case_id, index));
        let volume = build_segmentation(registry, options.policy, &selection.chosen)?;
        write_volume(&volume_path, &volume)?;
        let manifest = build_manifest(annotations, registry, &selection, index, options);
        write_json(&out_dir.join(format!("{stem}.json")), &manifest)?;
        Ok(UnitOutcome::Written(volume_path))
    })?;

    let mut paths = Vec::with_capacity(total);
    let mut written = 0usize;
    let mut failed = 0usize;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(UnitOutcome::Written(path)) => {
                written += 1;
                paths.push(path);
            }
            Ok(UnitOutcome::Skipped(path)) => paths.push(path),
            Err(err) => {
                failed += 1;
                warn!(case = %annotations.case_name, sample = i, error = %format!("{err:#}"), "sample failed");
            }
        }
    }
    info!(
        case = %annotations.case_name,
        written,
        skipped = paths.len() - written,
        failed,
        "samples generated"
    );
    if failed > 0 {
        return Err(EvalError::UnitFailures { failed, total }.into());
    }
    Ok(paths)
}

/// Sample volumes already in `samples_dir` for the given suffix, in sample
/// order, truncated to `max` when set.
pub fn list_samples(samples_dir: &Path, suffix: Option<&str>, max: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let entries = fs::read_dir(samples_dir)
        .with_context(|| format!("failed to list {}", samples_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(index) = parse_sample_name(&name, suffix) {
            found.push((index, entry.path()));
        }
    }
    found.sort();
    let mut paths: Vec<PathBuf> = found.into_iter().map(|(_, p)| p).collect();
    if let Some(max) = max {
        paths.truncate(max);
    }
    Ok(paths)
}

fn parse_sample_name(name: &str, suffix: Option<&str>) -> Option<u32> {
    let stem = name.strip_prefix(SAMPLE_PREFIX)?.strip_suffix(VOLUME_SUFFIX)?;
    let digits = match suffix {
        Some(s) => stem.strip_suffix(s)?.strip_suffix('_')?,
        None => stem,
    };
    if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
