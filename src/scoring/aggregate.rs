//! Aggregate scoring
//!
//! Reduces the matcher's matched/missed/extra partition into the
//! percentage-based [`ExtractionScore`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::matcher::match_fields;
use super::types::{
    ExtractionScore, IouDistribution, MatchOutcome, Result, ScoreOptions, ScoreWeights,
    TypeConfusion,
};
use crate::field::{Field, FieldType};

/// Score a prediction set against ground truth
pub fn score_extraction<'a>(
    predicted: &'a [Field],
    truth: &'a [Field],
    options: &ScoreOptions,
) -> ExtractionScore<'a> {
    let outcome = match_fields(predicted, truth, &options.matching);
    let score = aggregate(outcome, predicted, truth, &options.weights);

    debug!(
        overall = score.overall_score,
        detection = score.detection_rate,
        precision = score.precision_rate,
        "extraction scored"
    );
    score
}

/// Score with overall weights given as a metric-name map.
///
/// Fails when the map lacks any metric weight.
pub fn score_extraction_with_weights<'a>(
    predicted: &'a [Field],
    truth: &'a [Field],
    weights: &HashMap<String, f64>,
) -> Result<ExtractionScore<'a>> {
    let options = ScoreOptions {
        weights: ScoreWeights::from_map(weights)?,
        ..Default::default()
    };
    Ok(score_extraction(predicted, truth, &options))
}

/// Percentage of `part` in `whole`, 0 for an empty whole
fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Mean of the values as a percentage, or `empty` when there are none
fn mean_percent(values: impl Iterator<Item = f64>, empty: f64) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        empty
    } else {
        sum / count as f64 * 100.0
    }
}

fn aggregate<'a>(
    outcome: MatchOutcome<'a>,
    predicted: &'a [Field],
    truth: &'a [Field],
    weights: &ScoreWeights,
) -> ExtractionScore<'a> {
    let MatchOutcome {
        matched,
        missed,
        extra,
    } = outcome;

    let n_matched = matched.len();
    let n_truth = n_matched + missed.len();
    let n_pred = n_matched + extra.len();

    let detection_rate = rate(n_matched, n_truth);
    let precision_rate = rate(n_matched, n_pred);

    let avg_iou = mean_percent(matched.iter().map(|m| m.iou), 0.0);
    let mut iou_distribution = IouDistribution::default();
    for m in &matched {
        iou_distribution.record(m.iou);
    }

    let type_correct = matched.iter().filter(|m| m.type_correct).count();
    let type_accuracy = rate(type_correct, n_matched);

    let mut type_confusion = TypeConfusion::new();
    for m in &matched {
        *type_confusion
            .entry(m.ground_truth.field_type)
            .or_default()
            .entry(m.predicted.field_type)
            .or_default() += 1;
    }

    let label_accuracy = mean_percent(matched.iter().map(|m| m.label_similarity), 0.0);

    let count_tables =
        |fields: &[Field]| fields.iter().filter(|f| f.field_type == FieldType::Table).count();
    let truth_tables = count_tables(truth);
    let table_detection = truth_tables == 0 || count_tables(predicted) >= truth_tables;

    let table_cell_accuracy = mean_percent(
        matched
            .iter()
            .filter(|m| m.ground_truth.field_type == FieldType::Table)
            .map(|m| m.iou),
        100.0,
    );

    let overall_score = weights.detection_rate * detection_rate
        + weights.precision_rate * precision_rate
        + weights.avg_iou * avg_iou
        + weights.type_accuracy * type_accuracy
        + weights.label_accuracy * label_accuracy;

    ExtractionScore {
        detection_rate,
        precision_rate,
        avg_iou,
        iou_distribution,
        type_accuracy,
        type_confusion,
        label_accuracy,
        table_detection,
        table_cell_accuracy,
        matched_fields: matched,
        missed_fields: missed,
        extra_fields: extra,
        overall_score,
    }
}

// ============================================================
// Batch Scoring
// ============================================================

/// A named prediction set, e.g. one model/prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRun {
    pub name: String,
    pub fields: Vec<Field>,
}

impl PredictionRun {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Score of one prediction run
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRun<'a> {
    pub name: &'a str,
    pub score: ExtractionScore<'a>,
}

/// Score many runs against the same ground truth in parallel.
///
/// Results come back in input order.
pub fn score_batch<'a>(
    runs: &'a [PredictionRun],
    truth: &'a [Field],
    options: &ScoreOptions,
) -> Vec<ScoredRun<'a>> {
    runs.par_iter()
        .map(|run| ScoredRun {
            name: &run.name,
            score: score_extraction(&run.fields, truth, options),
        })
        .collect()
}

/// Order runs by overall score, best first. Equal scores keep input order.
pub fn rank_by_overall(runs: &mut [ScoredRun<'_>]) {
    runs.sort_by(|a, b| b.score.overall_score.total_cmp(&a.score.overall_score));
}
