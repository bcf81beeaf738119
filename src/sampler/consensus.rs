//! Deterministic consensus of all annotators, as an alternative to random
//! sampling.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EvalError;
use crate::labels::LabelRegistry;
use crate::sampler::discover::CaseAnnotations;
use crate::volume::{Volume, VolumeSource, mask, write_volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMode {
    Or,
    And,
    Majority,
}

impl ConsensusMode {
    pub const ALL: [ConsensusMode; 3] = [Self::Or, Self::And, Self::Majority];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Majority => "MAJ",
        }
    }

    pub fn file_name(&self) -> String {
        format!("aggregated_{}_seg.kvol.gz", self.tag())
    }

    /// Whether a voxel marked by `count` of `n` annotators is kept.
    pub fn keeps(&self, count: u32, n: u32) -> bool {
        match self {
            Self::Or => count > 0,
            Self::And => count == n,
            Self::Majority => 2 * count > n,
        }
    }
}

/// Combines every delineation of every instance into one labeled volume.
pub fn aggregate_case(
    annotations: &CaseAnnotations,
    registry: &LabelRegistry,
    mode: ConsensusMode,
) -> Result<Volume> {
    let mut template: Option<Volume> = None;
    let mut structure_masks: Vec<(u8, Array3<bool>)> = Vec::new();

    for (&class_id, structure) in &annotations.structures {
        let mut structure_mask: Option<Array3<bool>> = None;
        for inst in &structure.instances {
            let n = inst.delineations.len() as u32;
            if n == 0 {
                continue;
            }
            let mut counts: Option<Array3<u32>> = None;
            for d in &inst.delineations {
                let vol = d
                    .path
                    .load()
                    .with_context(|| format!("loading {}", d.path.display()))?;
                let tpl = template.get_or_insert_with(|| Volume::zeros_like(&vol));
                tpl.ensure_same_shape(&vol)?;
                let acc = counts.get_or_insert_with(|| Array3::zeros(vol.labels.raw_dim()));
                Zip::from(acc).and(&vol.labels).for_each(|c, &v| {
                    if v != 0 {
                        *c += 1;
                    }
                });
            }
            let Some(counts) = counts else {
                continue;
            };
            let inst_mask = counts.mapv(|c| mode.keeps(c, n));
            match structure_mask.as_mut() {
                None => structure_mask = Some(inst_mask),
                Some(m) => mask::union_in_place(m, &inst_mask),
            }
        }
        if let Some(m) = structure_mask {
            structure_masks.push((class_id, m));
        }
    }

    let mut out = template.ok_or_else(|| {
        EvalError::config(format!("case {} has no delineations", annotations.case_name))
    })?;
    for label in registry.construction_order() {
        for (class_id, m) in &structure_masks {
            if class_id != label {
                continue;
            }
            Zip::from(&mut out.labels).and(m).for_each(|o, &keep| {
                if keep {
                    *o = *label;
                }
            });
        }
    }
    Ok(out)
}

/// Writes `aggregated_{OR,AND,MAJ}_seg.kvol.gz` into the case directory for
/// each requested mode.
pub fn write_consensus(
    annotations: &CaseAnnotations,
    registry: &LabelRegistry,
    modes: &[ConsensusMode],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(modes.len());
    for mode in modes {
        let volume = aggregate_case(annotations, registry, *mode)?;
        let path = annotations.case_dir.join(mode.file_name());
        write_volume(&path, &volume)?;
        info!(case = %annotations.case_name, mode = mode.tag(), path = %path.display(), "consensus written");
        written.push(path);
    }
    Ok(written)
}
