//! Scoring configuration
//!
//! All policy constants (IoU gate, pair weights, metric weights, dedup
//! tolerances) can be overridden from a TOML file:
//!
//! ```toml
//! [matching]
//! iou_threshold = 0.1
//! iou_weight = 0.6
//! label_weight = 0.4
//!
//! [weights]
//! detection_rate = 0.25
//! precision_rate = 0.10
//! avg_iou = 0.30
//! type_accuracy = 0.20
//! label_accuracy = 0.15
//!
//! [dedup]
//! strategy = "identity"
//! identity_tolerance = 3.0
//! position_tolerance = 2.0
//! ```
//!
//! Missing sections fall back to defaults. A `[weights]` section must name
//! all five metrics. Every weight must be a finite number in 0-1.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dedup::DedupOptions;
use crate::scoring::{MatchOptions, ScoreOptions, ScoreWeights, ScoringError};

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory inside the per-user config directory
pub const CONFIG_APP_DIR: &str = "fieldscore";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(#[from] ScoringError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete scoring configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub matching: MatchOptions,
    pub weights: ScoreWeights,
    pub dedup: DedupOptions,
}

impl ScoringConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text)?;
        config.matching.validate()?;
        // Re-apply builder clamping to values read from disk
        config.matching = MatchOptions::builder()
            .iou_threshold(config.matching.iou_threshold)
            .iou_weight(config.matching.iou_weight)
            .label_weight(config.matching.label_weight)
            .build();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded scoring config");
        Ok(config)
    }

    /// Per-user default location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_APP_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load an explicit file, else the per-user file if it exists, else defaults.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Options for the scoring engine
    pub fn score_options(&self) -> ScoreOptions {
        ScoreOptions::new(self.matching, self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::DedupStrategy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        let config = ScoringConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScoringConfig::default());
        assert_eq!(config.matching.iou_threshold, 0.1);
        assert_eq!(config.weights, ScoreWeights::default());
        assert_eq!(config.dedup.identity_tolerance, 3.0);
        assert_eq!(config.dedup.position_tolerance, 2.0);
        assert_eq!(config.dedup.strategy, DedupStrategy::None);
    }

    #[test]
    fn test_partial_sections() {
        let config = ScoringConfig::from_toml_str(
            r#"
            [matching]
            iou_threshold = 0.3

            [dedup]
            strategy = "position"
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.iou_threshold, 0.3);
        assert_eq!(config.matching.iou_weight, 0.6);
        assert_eq!(config.matching.label_weight, 0.4);
        assert_eq!(config.dedup.strategy, DedupStrategy::Position);
        assert_eq!(config.dedup.position_tolerance, 2.0);
    }

    #[test]
    fn test_threshold_clamped() {
        let config = ScoringConfig::from_toml_str("[matching]\niou_threshold = 1.5\n").unwrap();
        assert_eq!(config.matching.iou_threshold, 1.0);
    }

    #[test]
    fn test_full_weights() {
        let config = ScoringConfig::from_toml_str(
            r#"
            [weights]
            detection_rate = 0.2
            precision_rate = 0.2
            avg_iou = 0.2
            type_accuracy = 0.2
            label_accuracy = 0.2
            unrelated = 9.0
            "#,
        )
        .unwrap();
        assert_eq!(config.weights.avg_iou, 0.2);
        assert!((config.weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_weight_key_is_error() {
        let result = ScoringConfig::from_toml_str(
            r#"
            [weights]
            detection_rate = 0.25
            precision_rate = 0.10
            avg_iou = 0.30
            type_accuracy = 0.20
            "#,
        );
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("label_accuracy"));
    }

    #[test]
    fn test_non_finite_match_weight_is_error() {
        let result = ScoringConfig::from_toml_str("[matching]\nlabel_weight = nan\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid(ScoringError::InvalidWeight { .. }))
        ));

        let result = ScoringConfig::from_toml_str("[matching]\niou_weight = 1e300\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_strategy_is_error() {
        let result = ScoringConfig::from_toml_str("[dedup]\nstrategy = \"fuzzy\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[matching]\niou_threshold = 0.25").unwrap();

        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.score_options().matching.iou_threshold, 0.25);
        assert_eq!(config.score_options().weights, ScoreWeights::default());

        let explicit = ScoringConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(explicit, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(matches!(
            ScoringConfig::load(&missing),
            Err(ConfigError::NotFound(_))
        ));
        assert!(ScoringConfig::load_or_default(Some(&missing)).is_err());
    }

    #[test]
    fn test_default_path_layout() {
        if let Some(path) = ScoringConfig::default_path() {
            assert!(path.ends_with("fieldscore/config.toml"));
        }
    }
}
