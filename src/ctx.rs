use std::path::PathBuf;

use crate::construct::ConstructionPolicy;
use crate::deltas::PairMatrix;
use crate::labels::LabelRegistry;
use crate::metrics::HecMetrics;
use crate::sampler::SAMPLES_DIR;
use crate::sampler::consensus::ConsensusMode;
use crate::sampler::discover::CaseAnnotations;

pub const DEFAULT_NUM_SAMPLES: u32 = 100;
pub const DEFAULT_SAMPLE_THREADS: usize = 5;
pub const DEFAULT_DELTA_THREADS: usize = 8;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub num_samples: u32,
    pub threads: usize,
    pub skip_existing: bool,
    pub verbose: bool,
    pub policy: ConstructionPolicy,
    pub suffix: Option<String>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            num_samples: DEFAULT_NUM_SAMPLES,
            threads: DEFAULT_SAMPLE_THREADS,
            skip_existing: false,
            verbose: false,
            policy: ConstructionPolicy::Default,
            suffix: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub case_dir: PathBuf,
    pub samples_dir: PathBuf,
    pub deltas_json: PathBuf,
    pub all_pairs_json: PathBuf,
}

impl OutputPaths {
    pub fn for_case(case_dir: PathBuf, suffix: Option<&str>) -> Self {
        let tail = suffix.map(|s| format!("_{s}")).unwrap_or_default();
        Self {
            samples_dir: case_dir.join(SAMPLES_DIR),
            deltas_json: case_dir.join(format!("deltas{tail}.json")),
            all_pairs_json: case_dir.join(format!("all_pairs{tail}.json")),
            case_dir,
        }
    }
}

/// State of one case run, threaded through the pipeline stages.
#[derive(Debug)]
pub struct Ctx {
    pub case_dir: PathBuf,
    pub case_name: String,
    pub registry: LabelRegistry,
    pub options: SampleOptions,
    pub consensus_modes: Vec<ConsensusMode>,
    pub delta_threads: usize,
    pub max_samples: Option<usize>,
    pub annotations: Option<CaseAnnotations>,
    pub sample_paths: Vec<PathBuf>,
    pub consensus_paths: Vec<PathBuf>,
    pub pair_matrix: Option<PairMatrix>,
    pub deltas: Option<Vec<HecMetrics>>,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
}

impl Ctx {
    pub fn new(case_dir: PathBuf, registry: LabelRegistry, options: SampleOptions) -> Self {
        let case_name = case_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let output = OutputPaths::for_case(case_dir.clone(), options.suffix.as_deref());
        Self {
            case_dir,
            case_name,
            registry,
            options,
            consensus_modes: Vec::new(),
            delta_threads: DEFAULT_DELTA_THREADS,
            max_samples: None,
            annotations: None,
            sample_paths: Vec::new(),
            consensus_paths: Vec::new(),
            pair_matrix: None,
            deltas: None,
            warnings: Vec::new(),
            output,
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}
