use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldscore::DedupStrategy;

#[derive(Parser, Debug)]
#[command(
    name = "fieldscore",
    version,
    about = "Score form field detections against hand-labeled ground truth"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score one prediction file against ground truth
    Score(ScoreArgs),
    /// Collapse duplicate fields from overlapping regional passes
    Dedup(DedupArgs),
    /// Score several prediction files against one ground truth and rank them
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// Predicted field set (JSON)
    #[arg(long)]
    pub predicted: PathBuf,

    /// Ground-truth field set (JSON)
    #[arg(long)]
    pub truth: PathBuf,

    /// Scoring config (TOML); defaults to the per-user config if present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum IoU for a match (0.0-1.0)
    #[arg(long)]
    pub iou_threshold: Option<f64>,

    /// Deduplicate predictions before scoring
    #[arg(long, value_enum)]
    pub dedup: Option<DedupMode>,

    /// Coordinate tolerance for deduplication (percentage points)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Write the full JSON report here
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DedupArgs {
    /// Field set with optional `_region` / `_quadrant` tags (JSON)
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = DedupMode::Identity)]
    pub strategy: DedupMode,

    /// Coordinate tolerance (percentage points)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Output file; stdout when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Ground-truth field set (JSON)
    #[arg(long)]
    pub truth: PathBuf,

    /// Prediction files, one run each
    #[arg(long, num_args = 1.., required = true)]
    pub predicted: Vec<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the ranking as JSON here
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DedupMode {
    None,
    Identity,
    Position,
}

impl From<DedupMode> for DedupStrategy {
    fn from(mode: DedupMode) -> Self {
        match mode {
            DedupMode::None => DedupStrategy::None,
            DedupMode::Identity => DedupStrategy::Identity,
            DedupMode::Position => DedupStrategy::Position,
        }
    }
}
