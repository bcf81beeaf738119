use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::construct::ConstructionPolicy;
use crate::labels::{LabelRegistry, METRIC_NAMES};
use crate::metrics::HecMetrics;

pub const TOOL: &str = "kira-segeval";
pub const SCHEMA_VERSION: &str = "v1";

/// Written next to each sampled segmentation: which delineation was drawn
/// for every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleManifest {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub case: String,
    pub sample_index: u32,
    pub seed: u64,
    pub policy: ConstructionPolicy,
    /// Structure name -> chosen file names, one per instance.
    pub structures: BTreeMap<String, Vec<String>>,
}

impl SampleManifest {
    pub fn new(case: &str, sample_index: u32, seed: u64, policy: ConstructionPolicy) -> Self {
        Self {
            tool: TOOL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            case: case.to_string(),
            sample_index,
            seed,
            policy,
            structures: BTreeMap::new(),
        }
    }
}

/// Per-sample deltas: `deltas[i][h][m]` is the mean disagreement of sample
/// `i` with every other sample, `null` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub case: String,
    pub hecs: Vec<String>,
    pub metrics: Vec<String>,
    pub samples: Vec<String>,
    pub deltas: Vec<HecMetrics>,
}

impl DeltaReport {
    pub fn new(
        case: &str,
        registry: &LabelRegistry,
        samples: Vec<String>,
        deltas: Vec<HecMetrics>,
    ) -> Self {
        Self {
            tool: TOOL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            case: case.to_string(),
            hecs: registry.hec_names(),
            metrics: METRIC_NAMES.iter().map(|m| m.to_string()).collect(),
            samples,
            deltas,
        }
    }
}

/// The full symmetric pair matrix; the diagonal is `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub case: String,
    pub hecs: Vec<String>,
    pub metrics: Vec<String>,
    pub samples: Vec<String>,
    pub pairs: Vec<Vec<Option<HecMetrics>>>,
}

impl PairReport {
    pub fn new(
        case: &str,
        registry: &LabelRegistry,
        samples: Vec<String>,
        pairs: Vec<Vec<Option<HecMetrics>>>,
    ) -> Self {
        Self {
            tool: TOOL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            case: case.to_string(),
            hecs: registry.hec_names(),
            metrics: METRIC_NAMES.iter().map(|m| m.to_string()).collect(),
            samples,
            pairs,
        }
    }
}
