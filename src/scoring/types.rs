//! Scoring module core types
//!
//! Options, weights, and result structures shared by the matcher and the
//! aggregate scorer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::field::{Field, FieldType};

// ============================================================
// Constants
// ============================================================

/// Default minimum IoU for a pair to be considered at all
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.1;

/// Default weight of IoU in the pair score
pub const DEFAULT_IOU_WEIGHT: f64 = 0.6;

/// Default weight of label similarity in the pair score
pub const DEFAULT_LABEL_WEIGHT: f64 = 0.4;

pub const KEY_DETECTION_RATE: &str = "detection_rate";
pub const KEY_PRECISION_RATE: &str = "precision_rate";
pub const KEY_AVG_IOU: &str = "avg_iou";
pub const KEY_TYPE_ACCURACY: &str = "type_accuracy";
pub const KEY_LABEL_ACCURACY: &str = "label_accuracy";

// ============================================================
// Error Types
// ============================================================

/// Scoring error types
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Missing weight for metric: {0}")]
    MissingWeight(String),

    #[error("Invalid weight for {name}: {value} (expected a number in 0-1)")]
    InvalidWeight { name: String, value: f64 },
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Weights must be finite and within 0-1
fn check_weight(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ScoringError::InvalidWeight {
            name: name.to_string(),
            value,
        })
    }
}

// ============================================================
// Options
// ============================================================

/// Pair scoring and acceptance options for the optimal matcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Pairs with IoU below this never match
    pub iou_threshold: f64,
    /// Weight of IoU in the pair score
    pub iou_weight: f64,
    /// Weight of label similarity in the pair score
    pub label_weight: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            iou_weight: DEFAULT_IOU_WEIGHT,
            label_weight: DEFAULT_LABEL_WEIGHT,
        }
    }
}

impl MatchOptions {
    /// Create a new options builder
    pub fn builder() -> MatchOptionsBuilder {
        MatchOptionsBuilder::default()
    }

    /// Reject weights that are not finite or fall outside 0-1
    pub fn validate(&self) -> Result<()> {
        check_weight("iou_weight", self.iou_weight)?;
        check_weight("label_weight", self.label_weight)?;
        Ok(())
    }

    /// Blend IoU and label similarity into a pair score
    pub fn pair_score(&self, iou: f64, label_similarity: f64) -> f64 {
        self.iou_weight * iou + self.label_weight * label_similarity
    }
}

/// Builder for MatchOptions
#[derive(Debug, Default)]
pub struct MatchOptionsBuilder {
    options: MatchOptions,
}

impl MatchOptionsBuilder {
    /// Set IoU acceptance threshold (clamped to 0-1)
    #[must_use]
    pub fn iou_threshold(mut self, threshold: f64) -> Self {
        self.options.iou_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set IoU weight (clamped to 0-1)
    #[must_use]
    pub fn iou_weight(mut self, weight: f64) -> Self {
        self.options.iou_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Set label weight (clamped to 0-1)
    #[must_use]
    pub fn label_weight(mut self, weight: f64) -> Self {
        self.options.label_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> MatchOptions {
        self.options
    }
}

/// Weights of each metric in the overall score.
///
/// Conventionally sums to 1 so that the overall score stays a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct ScoreWeights {
    pub detection_rate: f64,
    pub precision_rate: f64,
    pub avg_iou: f64,
    pub type_accuracy: f64,
    pub label_accuracy: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            detection_rate: 0.25,
            precision_rate: 0.10,
            avg_iou: 0.30,
            type_accuracy: 0.20,
            label_accuracy: 0.15,
        }
    }
}

impl ScoreWeights {
    /// Build weights from a metric-name map. Every metric must be present;
    /// unrelated keys are ignored.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        Self::from_lookup(|key| map.get(key).copied())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<f64>) -> Result<Self> {
        let weight = |key: &str| {
            let value = lookup(key).ok_or_else(|| ScoringError::MissingWeight(key.to_string()))?;
            check_weight(key, value)
        };

        Ok(Self {
            detection_rate: weight(KEY_DETECTION_RATE)?,
            precision_rate: weight(KEY_PRECISION_RATE)?,
            avg_iou: weight(KEY_AVG_IOU)?,
            type_accuracy: weight(KEY_TYPE_ACCURACY)?,
            label_accuracy: weight(KEY_LABEL_ACCURACY)?,
        })
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.detection_rate
            + self.precision_rate
            + self.avg_iou
            + self.type_accuracy
            + self.label_accuracy
    }
}

impl TryFrom<BTreeMap<String, f64>> for ScoreWeights {
    type Error = ScoringError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_lookup(|key| map.get(key).copied())
    }
}

/// Complete scoring options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreOptions {
    pub matching: MatchOptions,
    pub weights: ScoreWeights,
}

impl ScoreOptions {
    pub fn new(matching: MatchOptions, weights: ScoreWeights) -> Self {
        Self { matching, weights }
    }
}

// ============================================================
// Results
// ============================================================

/// An accepted pairing of one predicted and one ground-truth field
#[derive(Debug, Clone, Serialize)]
pub struct FieldMatch<'a> {
    pub predicted: &'a Field,
    pub ground_truth: &'a Field,
    /// Index into the predicted set
    pub predicted_index: usize,
    /// Index into the ground-truth set
    pub truth_index: usize,
    /// Intersection over union (0-1)
    pub iou: f64,
    /// Label similarity (0-1)
    pub label_similarity: f64,
    /// Whether the field types are compatible
    pub type_correct: bool,
}

/// Partition of both sets produced by the optimal matcher
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome<'a> {
    /// Accepted pairs, ordered by predicted index
    pub matched: Vec<FieldMatch<'a>>,
    /// Ground-truth fields without a match, in input order
    pub missed: Vec<&'a Field>,
    /// Predicted fields without a match, in input order
    pub extra: Vec<&'a Field>,
}

/// Histogram of match IoU values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouDistribution {
    #[serde(rename = "<25%")]
    pub below_25: usize,
    #[serde(rename = "25-50%")]
    pub from_25_to_50: usize,
    #[serde(rename = "50-75%")]
    pub from_50_to_75: usize,
    #[serde(rename = ">75%")]
    pub above_75: usize,
}

impl IouDistribution {
    /// Count one IoU value into its bucket
    pub fn record(&mut self, iou: f64) {
        if iou < 0.25 {
            self.below_25 += 1;
        } else if iou < 0.5 {
            self.from_25_to_50 += 1;
        } else if iou < 0.75 {
            self.from_50_to_75 += 1;
        } else {
            self.above_75 += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.below_25 + self.from_25_to_50 + self.from_50_to_75 + self.above_75
    }
}

/// Ground-truth type -> predicted type -> count
pub type TypeConfusion = BTreeMap<FieldType, BTreeMap<FieldType, usize>>;

/// Complete scoring result. All rates are percentages (0-100).
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionScore<'a> {
    /// Share of ground-truth fields found (recall)
    pub detection_rate: f64,
    /// Share of predicted fields that matched
    pub precision_rate: f64,
    pub avg_iou: f64,
    pub iou_distribution: IouDistribution,
    /// Share of matches with compatible types
    pub type_accuracy: f64,
    pub type_confusion: TypeConfusion,
    /// Mean label similarity of matches
    pub label_accuracy: f64,
    /// Whether at least as many tables were predicted as exist
    pub table_detection: bool,
    /// Mean IoU of matched tables
    pub table_cell_accuracy: f64,
    pub matched_fields: Vec<FieldMatch<'a>>,
    pub missed_fields: Vec<&'a Field>,
    pub extra_fields: Vec<&'a Field>,
    pub overall_score: f64,
}

impl ExtractionScore<'_> {
    /// Headline metrics without the field lists
    pub fn metrics(&self) -> ScoreMetrics {
        ScoreMetrics {
            detection_rate: self.detection_rate,
            precision_rate: self.precision_rate,
            avg_iou: self.avg_iou,
            type_accuracy: self.type_accuracy,
            label_accuracy: self.label_accuracy,
            overall_score: self.overall_score,
            matched: self.matched_fields.len(),
            missed: self.missed_fields.len(),
            extra: self.extra_fields.len(),
        }
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Detection: {:.1}% recall, {:.1}% precision\n\
             Coordinates: {:.1}% avg IoU\n\
             Types: {:.1}% correct\n\
             Labels: {:.1}% similarity\n\
             Overall: {:.1}%\n\
             Matched: {}, Missed: {}, Extra: {}\n",
            self.detection_rate,
            self.precision_rate,
            self.avg_iou,
            self.type_accuracy,
            self.label_accuracy,
            self.overall_score,
            self.matched_fields.len(),
            self.missed_fields.len(),
            self.extra_fields.len()
        )
    }
}

/// Owned headline metrics of one scoring run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub detection_rate: f64,
    pub precision_rate: f64,
    pub avg_iou: f64,
    pub type_accuracy: f64,
    pub label_accuracy: f64,
    pub overall_score: f64,
    pub matched: usize,
    pub missed: usize,
    pub extra: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_options_default() {
        let opts = MatchOptions::default();
        assert_eq!(opts.iou_threshold, 0.1);
        assert_eq!(opts.iou_weight, 0.6);
        assert_eq!(opts.label_weight, 0.4);
    }

    #[test]
    fn test_match_options_builder_clamping() {
        let opts = MatchOptions::builder().iou_threshold(1.5).build();
        assert_eq!(opts.iou_threshold, 1.0);

        let opts = MatchOptions::builder()
            .iou_threshold(-0.2)
            .iou_weight(0.5)
            .label_weight(0.5)
            .build();
        assert_eq!(opts.iou_threshold, 0.0);
        assert_eq!(opts.pair_score(1.0, 0.0), 0.5);
    }

    #[test]
    fn test_match_options_validate_weights() {
        assert!(MatchOptions::default().validate().is_ok());

        let nan = MatchOptions {
            label_weight: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(ScoringError::InvalidWeight { ref name, .. }) if name == "label_weight"
        ));

        let huge = MatchOptions {
            iou_weight: 1e300,
            ..Default::default()
        };
        assert!(huge.validate().is_err());

        let clamped = MatchOptions::builder().iou_weight(7.0).label_weight(-1.0).build();
        assert_eq!(clamped.iou_weight, 1.0);
        assert_eq!(clamped.label_weight, 0.0);
        assert!(clamped.validate().is_ok());
    }

    #[test]
    fn test_score_weights_reject_non_finite() {
        let map: HashMap<String, f64> = [
            ("detection_rate", 0.25),
            ("precision_rate", 0.10),
            ("avg_iou", f64::INFINITY),
            ("type_accuracy", 0.20),
            ("label_accuracy", 0.15),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        assert_eq!(
            ScoreWeights::from_map(&map),
            Err(ScoringError::InvalidWeight {
                name: "avg_iou".to_string(),
                value: f64::INFINITY,
            })
        );
    }

    #[test]
    fn test_score_weights_default_sums_to_one() {
        assert!((ScoreWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_weights_from_map() {
        let map: HashMap<String, f64> = [
            ("detection_rate", 0.2),
            ("precision_rate", 0.2),
            ("avg_iou", 0.2),
            ("type_accuracy", 0.2),
            ("label_accuracy", 0.2),
            ("speed", 1.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let weights = ScoreWeights::from_map(&map).unwrap();
        assert_eq!(weights.avg_iou, 0.2);
        assert!((weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_weights_missing_key() {
        let mut map = HashMap::new();
        map.insert("detection_rate".to_string(), 0.5);
        map.insert("precision_rate".to_string(), 0.5);

        assert_eq!(
            ScoreWeights::from_map(&map),
            Err(ScoringError::MissingWeight("avg_iou".to_string()))
        );
    }

    #[test]
    fn test_score_weights_deserialize_checks_keys() {
        let ok: ScoreWeights = serde_json::from_str(
            r#"{"detection_rate": 0.25, "precision_rate": 0.1, "avg_iou": 0.3,
                "type_accuracy": 0.2, "label_accuracy": 0.15}"#,
        )
        .unwrap();
        assert_eq!(ok, ScoreWeights::default());

        let err = serde_json::from_str::<ScoreWeights>(r#"{"detection_rate": 1.0}"#).unwrap_err();
        assert!(err.to_string().contains("precision_rate"));
    }

    #[test]
    fn test_iou_distribution_buckets() {
        let mut dist = IouDistribution::default();
        for iou in [0.0, 0.249, 0.25, 0.49, 0.5, 0.74, 0.75, 1.0] {
            dist.record(iou);
        }
        assert_eq!(dist.below_25, 2);
        assert_eq!(dist.from_25_to_50, 2);
        assert_eq!(dist.from_50_to_75, 2);
        assert_eq!(dist.above_75, 2);
        assert_eq!(dist.total(), 8);
    }

    #[test]
    fn test_iou_distribution_serialized_keys() {
        let json = serde_json::to_value(IouDistribution::default()).unwrap();
        for key in ["<25%", "25-50%", "50-75%", ">75%"] {
            assert_eq!(json[key], 0);
        }
    }
}
