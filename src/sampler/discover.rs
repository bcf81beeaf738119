use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::error::EvalError;
use crate::labels::LabelRegistry;

pub const SEGMENTATIONS_DIR: &str = "segmentations";
pub const CASE_PREFIX: &str = "case_";
pub const EXPECTED_ANNOTATORS: usize = 3;

/// One annotator's binary delineation of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delineation {
    pub annotator: u32,
    pub path: PathBuf,
}

impl Delineation {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub index: u32,
    pub delineations: Vec<Delineation>,
}

#[derive(Debug, Clone)]
pub struct StructureAnnotations {
    pub class_id: u8,
    pub name: String,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone)]
pub struct CaseAnnotations {
    pub case_name: String,
    pub case_id: u64,
    pub case_dir: PathBuf,
    /// Keyed by class id, so iteration is ascending id.
    pub structures: BTreeMap<u8, StructureAnnotations>,
    /// File names that were not recognised as delineations.
    pub skipped: Vec<String>,
}

impl CaseAnnotations {
    pub fn total_delineations(&self) -> usize {
        self.structures
            .values()
            .flat_map(|s| s.instances.iter())
            .map(|i| i.delineations.len())
            .sum()
    }

    /// Instances that were not delineated by exactly three annotators.
    pub fn annotator_anomalies(&self) -> Vec<String> {
        let mut out = Vec::new();
        for structure in self.structures.values() {
            for inst in &structure.instances {
                if inst.delineations.len() != EXPECTED_ANNOTATORS {
                    let files: Vec<String> =
                        inst.delineations.iter().map(Delineation::file_name).collect();
                    out.push(format!(
                        "{} instance {} has {} delineations: [{}]",
                        structure.name,
                        inst.index,
                        inst.delineations.len(),
                        files.join(", ")
                    ));
                }
            }
        }
        out
    }
}

/// `case_00042` -> 42.
pub fn parse_case_id(case_name: &str) -> Result<u64, EvalError> {
    case_name
        .strip_prefix(CASE_PREFIX)
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| EvalError::config(format!("cannot parse case id from '{case_name}'")))
}

/// Splits `{structure}_instance-{N}_annotation-{A}.kvol[.gz]` into its parts.
pub fn parse_annotation_file_name(name: &str) -> Option<(String, u32, u32)> {
    let stem = name
        .strip_suffix(".kvol.gz")
        .or_else(|| name.strip_suffix(".kvol"))?;
    let (structure, rest) = stem.split_once("_instance-")?;
    let (instance, annotation) = rest.split_once("_annotation-")?;
    if structure.is_empty() {
        return None;
    }
    let instance = instance.parse::<u32>().ok()?;
    let annotation = annotation.parse::<u32>().ok()?;
    Some((structure.to_string(), instance, annotation))
}

pub fn discover_case(case_dir: &Path, registry: &LabelRegistry) -> Result<CaseAnnotations> {
    let case_name = case_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let case_id = parse_case_id(&case_name)?;
    let seg_dir = case_dir.join(SEGMENTATIONS_DIR);
    if !seg_dir.is_dir() {
        return Err(EvalError::config(format!(
            "{} has no {} directory",
            case_dir.display(),
            SEGMENTATIONS_DIR
        ))
        .into());
    }

    let mut grouped: BTreeMap<u8, BTreeMap<u32, Vec<Delineation>>> = BTreeMap::new();
    let mut skipped = Vec::new();
    let entries = fs::read_dir(&seg_dir)
        .with_context(|| format!("failed to list {}", seg_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Some((structure, instance, annotator)) = parse_annotation_file_name(&name) else {
            warn!(file = %name, "skipping file that is not a delineation");
            skipped.push(name);
            continue;
        };
        let Some(class_id) = registry.class_id(&structure) else {
            warn!(file = %name, structure = %structure, "skipping delineation of unknown structure");
            skipped.push(name);
            continue;
        };
        grouped
            .entry(class_id)
            .or_default()
            .entry(instance)
            .or_default()
            .push(Delineation {
                annotator,
                path: entry.path(),
            });
    }
    skipped.sort();

    let mut structures = BTreeMap::new();
    for (class_id, instances) in grouped {
        let name = registry.class_name(class_id).unwrap_or_default().to_string();
        let instances = instances
            .into_iter()
            .map(|(index, mut delineations)| {
                delineations.sort_by(|a, b| a.annotator.cmp(&b.annotator).then(a.path.cmp(&b.path)));
                Instance {
                    index,
                    delineations,
                }
            })
            .collect::<Vec<_>>();
        debug!(structure = %name, instances = instances.len(), "structure discovered");
        structures.insert(
            class_id,
            StructureAnnotations {
                class_id,
                name,
                instances,
            },
        );
    }

    Ok(CaseAnnotations {
        case_name,
        case_id,
        case_dir: case_dir.to_path_buf(),
        structures,
        skipped,
    })
}

/// Case directories under `root` that already have delineations, sorted by
/// name. Cases without a segmentations directory are not published yet.
pub fn list_cases(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        fs::read_dir(root).with_context(|| format!("failed to list {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(CASE_PREFIX) || !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.path().join(SEGMENTATIONS_DIR).is_dir() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

/// One named case, or every published case under `root`.
pub fn resolve_cases(root: &Path, case: Option<&str>) -> Result<Vec<PathBuf>> {
    match case {
        Some(name) => {
            let dir = root.join(name);
            if !dir.is_dir() {
                return Err(EvalError::config(format!("case directory {} does not exist", dir.display())).into());
            }
            Ok(vec![dir])
        }
        None => {
            if !root.is_dir() {
                return Err(EvalError::config(format!("data root {} does not exist", root.display())).into());
            }
            list_cases(root)
        }
    }
}
