use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::construct::{ConstructionPolicy, DEFAULT_CLOSING_RADIUS_MM};
use crate::ranking::Aggregator;
use crate::sampler::consensus::ConsensusMode;

#[derive(Debug, Parser)]
#[command(
    name = "kira-segeval",
    version,
    about = "Multi-annotator segmentation sampling, deltas, gauged scores and ranking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Draw random segmentations from the per-instance delineations
    Sample(SampleArgs),
    /// Build OR/AND/majority consensus segmentations
    Consensus(ConsensusArgs),
    /// Compute inter-sample deltas for each case
    Deltas(DeltasArgs),
    /// Compare one predicted segmentation with one reference
    Evaluate(EvaluateArgs),
    /// Gauged score of a prediction against a case's samples
    Score(ScoreArgs),
    /// Rank teams from a summary CSV
    Rank(RankArgs),
    Labels(LabelsArgs),
}

#[derive(Debug, Args)]
pub struct DataArgs {
    #[arg(long, help = "Data root holding case_XXXXX directories (default: $KITS21_DATA_DIR or ./data)")]
    pub data: Option<PathBuf>,

    #[arg(long, help = "Only process this case (e.g. case_00000)")]
    pub case: Option<String>,

    #[arg(long, default_value_t = false, help = "Use the test-set root ($KITS21_TEST_DIR)")]
    pub test_set: bool,

    #[arg(long, help = "Label table TSV replacing the built-in one")]
    pub labels: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SampleArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, default_value_t = 100)]
    pub num_samples: u32,

    #[arg(long, default_value_t = 5, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, default_value_t = false)]
    pub skip_existing: bool,

    #[arg(long, default_value_t = false, help = "Report instances without exactly 3 delineations")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = PolicyArg::Default)]
    pub policy: PolicyArg,

    #[arg(long, default_value_t = DEFAULT_CLOSING_RADIUS_MM, help = "Closing radius in mm for --policy closed-kidney")]
    pub closing_radius_mm: f64,

    #[arg(long, help = "Suffix for sample file names (sample_XXXX_<suffix>)")]
    pub suffix: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConsensusArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, value_enum, num_args = 1.., default_values_t = [ModeArg::Or, ModeArg::And, ModeArg::Maj])]
    pub mode: Vec<ModeArg>,
}

#[derive(Debug, Args)]
pub struct DeltasArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, default_value_t = 8, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, help = "Use at most this many samples per case")]
    pub max_samples: Option<usize>,

    #[arg(long)]
    pub suffix: Option<String>,
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub pred: PathBuf,

    #[arg(long)]
    pub reference: PathBuf,

    #[arg(long)]
    pub labels: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[arg(long)]
    pub pred: PathBuf,

    #[arg(long, help = "Case directory holding deltas.json and segmentation_samples/")]
    pub case_dir: PathBuf,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long)]
    pub suffix: Option<String>,

    #[arg(long)]
    pub labels: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    #[arg(long, help = "Summary CSV: team,metric1..metric6 (higher is better)")]
    pub summary: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = AggregatorArg::Mean)]
    pub aggregator: AggregatorArg,
}

#[derive(Debug, Args)]
pub struct LabelsArgs {
    #[command(subcommand)]
    pub command: LabelsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LabelsCommand {
    Show(LabelsShowArgs),
}

#[derive(Debug, Args)]
pub struct LabelsShowArgs {
    #[arg(long, help = "Optional label table TSV to show instead of the built-in one")]
    pub labels: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Default,
    ConvexHull,
    ClosedKidney,
    UreterOnTop,
}

impl PolicyArg {
    pub fn to_policy(self, closing_radius_mm: f64) -> ConstructionPolicy {
        match self {
            Self::Default => ConstructionPolicy::Default,
            Self::ConvexHull => ConstructionPolicy::ConvexHull,
            Self::ClosedKidney => ConstructionPolicy::ClosedKidney {
                radius_mm: closing_radius_mm,
            },
            Self::UreterOnTop => ConstructionPolicy::UreterOnTop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Or,
    And,
    Maj,
}

impl From<ModeArg> for ConsensusMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Or => ConsensusMode::Or,
            ModeArg::And => ConsensusMode::And,
            ModeArg::Maj => ConsensusMode::Majority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AggregatorArg {
    Mean,
    Median,
}

impl From<AggregatorArg> for Aggregator {
    fn from(value: AggregatorArg) -> Self {
        match value {
            AggregatorArg::Mean => Aggregator::Mean,
            AggregatorArg::Median => Aggregator::Median,
        }
    }
}
