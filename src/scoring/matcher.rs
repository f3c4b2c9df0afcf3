//! Optimal field matching
//!
//! Pairs predicted fields with ground-truth fields by maximizing the total
//! pair score over a one-to-one assignment:
//!
//! 1. Resolve every field's effective rectangle once
//! 2. Score each pair as `iou_weight·IoU + label_weight·label similarity`,
//!    or 0 when IoU is below the threshold
//! 3. Solve the assignment with Kuhn-Munkres, smaller side as rows
//! 4. Keep only assigned pairs with a strictly positive score
//!
//! A pair score that is not finite counts as 0.
//!
//! Ties between equal-score assignments resolve in the solver's internal
//! order.

use pathfinding::kuhn_munkres::kuhn_munkres;
use pathfinding::matrix::Matrix;
use tracing::debug;

use super::similarity::{label_similarity, types_compatible};
use super::types::{FieldMatch, MatchOptions, MatchOutcome};
use crate::field::{Field, Rect};
use crate::geometry::{effective_rect, iou};

/// Fixed-point scale used to hand float scores to the integer solver
const SCORE_SCALE: f64 = 1_000_000.0;

/// Bound on a single pair score so solver sums cannot overflow `i64`
const MAX_PAIR_SCORE: f64 = 1_000_000.0;

/// Match predicted fields against ground truth.
///
/// Every predicted and every ground-truth field ends up in exactly one of
/// `matched`, `missed` or `extra`.
pub fn match_fields<'a>(
    predicted: &'a [Field],
    truth: &'a [Field],
    options: &MatchOptions,
) -> MatchOutcome<'a> {
    if predicted.is_empty() || truth.is_empty() {
        debug!(
            predicted = predicted.len(),
            truth = truth.len(),
            "empty field set, nothing to match"
        );
        return MatchOutcome {
            matched: Vec::new(),
            missed: truth.iter().collect(),
            extra: predicted.iter().collect(),
        };
    }

    let pred_rects: Vec<Rect> = predicted.iter().map(effective_rect).collect();
    let truth_rects: Vec<Rect> = truth.iter().map(effective_rect).collect();

    let scores = score_matrix(predicted, truth, &pred_rects, &truth_rects, options);
    let assignment = solve_assignment(&scores);

    let mut pred_taken = vec![false; predicted.len()];
    let mut truth_taken = vec![false; truth.len()];
    let mut matched = Vec::with_capacity(assignment.len());

    for (i, j) in assignment {
        // Zero-score pairs are only there to complete the assignment
        if scores[(i, j)] <= 0.0 {
            continue;
        }

        let pred = &predicted[i];
        let gt = &truth[j];
        matched.push(FieldMatch {
            predicted: pred,
            ground_truth: gt,
            predicted_index: i,
            truth_index: j,
            iou: iou(&pred_rects[i], &truth_rects[j]),
            label_similarity: label_similarity(&pred.label, &gt.label),
            type_correct: types_compatible(pred.field_type, gt.field_type),
        });
        pred_taken[i] = true;
        truth_taken[j] = true;
    }

    matched.sort_by_key(|m| m.predicted_index);

    let missed: Vec<&Field> = truth
        .iter()
        .zip(&truth_taken)
        .filter(|(_, taken)| !**taken)
        .map(|(f, _)| f)
        .collect();
    let extra: Vec<&Field> = predicted
        .iter()
        .zip(&pred_taken)
        .filter(|(_, taken)| !**taken)
        .map(|(f, _)| f)
        .collect();

    debug!(
        predicted = predicted.len(),
        truth = truth.len(),
        matched = matched.len(),
        missed = missed.len(),
        extra = extra.len(),
        "field matching complete"
    );

    MatchOutcome {
        matched,
        missed,
        extra,
    }
}

/// Build the `predicted × truth` pair score matrix
fn score_matrix(
    predicted: &[Field],
    truth: &[Field],
    pred_rects: &[Rect],
    truth_rects: &[Rect],
    options: &MatchOptions,
) -> Matrix<f64> {
    let threshold = options.iou_threshold.clamp(0.0, 1.0);
    let mut scores = Matrix::new(predicted.len(), truth.len(), 0.0);

    for (i, (pred, pred_rect)) in predicted.iter().zip(pred_rects).enumerate() {
        for (j, (gt, truth_rect)) in truth.iter().zip(truth_rects).enumerate() {
            let overlap = iou(pred_rect, truth_rect);
            if overlap < threshold {
                continue;
            }
            let score = options.pair_score(overlap, label_similarity(&pred.label, &gt.label));
            if score.is_finite() {
                scores[(i, j)] = score;
            }
        }
    }

    scores
}

/// Maximum-weight assignment over the score matrix.
///
/// Returns `min(rows, columns)` `(row, column)` pairs of the input matrix.
fn solve_assignment(scores: &Matrix<f64>) -> Vec<(usize, usize)> {
    // The solver needs rows <= columns
    let transpose = scores.rows > scores.columns;
    let (rows, columns) = if transpose {
        (scores.columns, scores.rows)
    } else {
        (scores.rows, scores.columns)
    };

    let mut weights = Matrix::new(rows, columns, 0_i64);
    for r in 0..rows {
        for c in 0..columns {
            let score = if transpose {
                scores[(c, r)]
            } else {
                scores[(r, c)]
            };
            let bounded = score.clamp(-MAX_PAIR_SCORE, MAX_PAIR_SCORE);
            weights[(r, c)] = (bounded * SCORE_SCALE).round() as i64;
        }
    }

    let (_, assignment) = kuhn_munkres(&weights);

    assignment
        .into_iter()
        .enumerate()
        .map(|(r, c)| if transpose { (c, r) } else { (r, c) })
        .collect()
}
