//! fieldscore - Form field detection scoring
//!
//! Scores a predicted set of form fields (text boxes, checkboxes, tables,
//! linked date groups, ...) against hand-labeled ground truth on the same
//! page.
//!
//! # Pipeline
//!
//! 1. Load both field sets ([`load_field_set`])
//! 2. Optionally collapse boundary duplicates from regional passes ([`dedup`])
//! 3. Resolve one rectangle per field ([`effective_rect`])
//! 4. Optimal one-to-one matching ([`match_fields`])
//! 5. Aggregate metrics and overall score ([`score_extraction`])
//!
//! # Example
//!
//! ```
//! use fieldscore::{score_extraction, Field, FieldType, Rect, ScoreOptions};
//!
//! let truth = vec![Field::new("Name", FieldType::Text)
//!     .with_coordinates(Rect::new(10.0, 10.0, 40.0, 4.0))];
//! let predicted = truth.clone();
//!
//! let score = score_extraction(&predicted, &truth, &ScoreOptions::default());
//! assert_eq!(score.detection_rate, 100.0);
//! assert!((score.overall_score - 100.0).abs() < 1e-9);
//! ```

pub mod config;
pub mod dedup;
pub mod field;
pub mod geometry;
pub mod scoring;

pub use config::{ConfigError, ScoringConfig};
pub use dedup::{
    deduplicate, deduplicate_by_identity, deduplicate_by_position, fields_match, tag_region,
    DedupOptions, DedupStrategy, RegionTagged,
};
pub use field::{
    load_field_set, parse_field_set, DatePart, DateSegment, Field, FieldError, FieldType, Rect,
    TableConfig,
};
pub use geometry::{coordinates_match, effective_rect, iou};
pub use scoring::{
    label_similarity, labels_match, match_fields, rank_by_overall, score_batch, score_extraction,
    score_extraction_with_weights, types_compatible, ExtractionScore, FieldMatch, MatchOptions,
    MatchOutcome, PredictionRun, ScoreMetrics, ScoreOptions, ScoreWeights, ScoredRun,
    ScoringError,
};
