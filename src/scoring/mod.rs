//! Matching and scoring engine
//!
//! Compares a predicted field set against hand-labeled ground truth:
//!
//! - Pairwise signals: IoU, label similarity, type compatibility
//! - Optimal one-to-one matching under a minimum-overlap gate
//! - Aggregate percentage metrics and a weighted overall score
//!
//! All entry points are pure functions; results borrow from the inputs.

mod aggregate;
mod matcher;
mod similarity;
mod types;

// Re-export public API
pub use aggregate::{
    rank_by_overall, score_batch, score_extraction, score_extraction_with_weights,
    PredictionRun, ScoredRun,
};
pub use matcher::match_fields;
pub use similarity::{
    indel_distance, label_similarity, labels_match, normalize_label, types_compatible,
};
pub use types::{
    ExtractionScore, FieldMatch, IouDistribution, MatchOptions, MatchOptionsBuilder,
    MatchOutcome, Result, ScoreMetrics, ScoreOptions, ScoreWeights, ScoringError, TypeConfusion,
    DEFAULT_IOU_THRESHOLD, DEFAULT_IOU_WEIGHT, DEFAULT_LABEL_WEIGHT,
};
