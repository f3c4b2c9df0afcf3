mod cli;
mod util;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use fieldscore::{
    deduplicate, load_field_set, rank_by_overall, score_batch, score_extraction, DedupOptions,
    Field, PredictionRun, RegionTagged, ScoreMetrics, ScoringConfig,
};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Cli, Commands, DedupArgs, ScoreArgs};
use crate::util::{run_name, write_json_pretty};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score(args) => run_score(args),
        Commands::Dedup(args) => run_dedup(args),
        Commands::Batch(args) => run_batch(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig> {
    ScoringConfig::load_or_default(path).context("failed to load scoring config")
}

fn load_tagged(path: &Path) -> Result<Vec<RegionTagged>> {
    load_field_set(path)
        .with_context(|| format!("failed to load field set: {}", path.display()))
}

fn load_fields(path: &Path) -> Result<Vec<Field>> {
    load_field_set(path)
        .with_context(|| format!("failed to load field set: {}", path.display()))
}

fn apply_tolerance(options: &mut DedupOptions, tolerance: Option<f64>) {
    if let Some(tolerance) = tolerance {
        options.identity_tolerance = tolerance;
        options.position_tolerance = tolerance;
    }
}

fn run_score(args: ScoreArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(threshold) = args.iou_threshold {
        config.matching.iou_threshold = threshold.clamp(0.0, 1.0);
    }
    if let Some(mode) = args.dedup {
        config.dedup.strategy = mode.into();
    }
    apply_tolerance(&mut config.dedup, args.tolerance);

    let tagged = load_tagged(&args.predicted)?;
    let raw_count = tagged.len();
    let predicted = deduplicate(tagged, &config.dedup);
    let truth = load_fields(&args.truth)?;

    info!(
        predicted = predicted.len(),
        removed = raw_count - predicted.len(),
        truth = truth.len(),
        iou_threshold = config.matching.iou_threshold,
        "scoring extraction"
    );

    let score = score_extraction(&predicted, &truth, &config.score_options());
    print!("{}", score.summary());

    if let Some(output) = args.output {
        write_json_pretty(&output, &score)?;
        info!(path = %output.display(), "wrote score report");
    }

    Ok(())
}

fn run_dedup(args: DedupArgs) -> Result<()> {
    let mut options = DedupOptions {
        strategy: args.strategy.into(),
        ..Default::default()
    };
    apply_tolerance(&mut options, args.tolerance);

    let tagged = load_tagged(&args.input)?;
    let before = tagged.len();
    let fields = deduplicate(tagged, &options);
    info!(
        before,
        after = fields.len(),
        strategy = ?options.strategy,
        "deduplicated fields"
    );

    match args.output {
        Some(output) => {
            write_json_pretty(&output, &fields)?;
            info!(path = %output.display(), "wrote deduplicated fields");
        }
        None => {
            let json =
                serde_json::to_string_pretty(&fields).context("failed to serialize fields")?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write to stdout")?;
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct RankedRun<'a> {
    rank: usize,
    name: &'a str,
    metrics: ScoreMetrics,
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let truth = load_fields(&args.truth)?;

    let runs = args
        .predicted
        .iter()
        .map(|path| {
            let fields = deduplicate(load_tagged(path)?, &config.dedup);
            Ok(PredictionRun::new(run_name(path), fields))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(runs = runs.len(), truth = truth.len(), "scoring batch");

    let mut scored = score_batch(&runs, &truth, &config.score_options());
    rank_by_overall(&mut scored);

    let ranking: Vec<RankedRun<'_>> = scored
        .iter()
        .enumerate()
        .map(|(i, run)| RankedRun {
            rank: i + 1,
            name: run.name,
            metrics: run.score.metrics(),
        })
        .collect();

    println!(
        "{:>4}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  name",
        "rank", "overall", "recall", "prec", "iou", "types", "labels"
    );
    for entry in &ranking {
        let m = &entry.metrics;
        println!(
            "{:>4}  {:>7.1}  {:>7.1}  {:>7.1}  {:>7.1}  {:>7.1}  {:>7.1}  {}",
            entry.rank,
            m.overall_score,
            m.detection_rate,
            m.precision_rate,
            m.avg_iou,
            m.type_accuracy,
            m.label_accuracy,
            entry.name
        );
    }

    if let Some(output) = args.output {
        write_json_pretty(&output, &ranking)?;
        info!(path = %output.display(), "wrote batch ranking");
    }

    Ok(())
}
