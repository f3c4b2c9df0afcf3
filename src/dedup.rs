//! Boundary deduplication
//!
//! When a page is extracted in overlapping regional passes (e.g. quadrants),
//! fields near the region boundaries are detected more than once. This
//! module collapses those duplicates before scoring.
//!
//! The source region of a field is carried next to it in [`RegionTagged`],
//! never on the [`Field`] itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::Field;
use crate::geometry::coordinates_match;
use crate::scoring::labels_match;

// ============================================================
// Constants
// ============================================================

/// Default coordinate tolerance for identity deduplication (percentage points)
pub const DEFAULT_IDENTITY_TOLERANCE: f64 = 3.0;

/// Default coordinate tolerance for position deduplication (percentage points)
pub const DEFAULT_POSITION_TOLERANCE: f64 = 2.0;

// ============================================================
// Data Structures
// ============================================================

/// A field annotated with the scan region that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTagged {
    /// Scan region; lower regions win ties
    #[serde(rename = "_region", alias = "_quadrant", default)]
    pub region: u32,
    #[serde(flatten)]
    pub field: Field,
}

impl RegionTagged {
    pub fn new(region: u32, field: Field) -> Self {
        Self { region, field }
    }
}

/// Tag every field of one regional pass
pub fn tag_region(region: u32, fields: Vec<Field>) -> Vec<RegionTagged> {
    fields
        .into_iter()
        .map(|field| RegionTagged::new(region, field))
        .collect()
}

/// Deduplication strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Keep every field
    #[default]
    None,
    /// Same type, same label and near-identical box
    Identity,
    /// Near-identical box regardless of label and type
    Position,
}

/// Deduplication options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupOptions {
    pub strategy: DedupStrategy,
    pub identity_tolerance: f64,
    pub position_tolerance: f64,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            strategy: DedupStrategy::None,
            identity_tolerance: DEFAULT_IDENTITY_TOLERANCE,
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
        }
    }
}

// ============================================================
// Matching
// ============================================================

/// Check whether two fields are duplicates of each other.
///
/// Requires equal types, matching labels, and primary coordinates on both
/// fields within `tolerance` on all four components.
pub fn fields_match(a: &Field, b: &Field, tolerance: f64) -> bool {
    if a.field_type != b.field_type || !labels_match(&a.label, &b.label) {
        return false;
    }

    match (&a.coordinates, &b.coordinates) {
        (Some(ra), Some(rb)) => coordinates_match(ra, rb, tolerance),
        _ => false,
    }
}

// ============================================================
// Strategies
// ============================================================

/// Remove boundary duplicates, keeping the copy from the earliest region.
///
/// Fields are stably sorted by region; each surviving field discards every
/// later field that [`fields_match`] it. Survivors are returned in that
/// sorted order with their region tags dropped.
pub fn deduplicate_by_identity(tagged: Vec<RegionTagged>, tolerance: f64) -> Vec<Field> {
    let mut sorted = tagged;
    sorted.sort_by_key(|t| t.region);

    let mut duplicate = vec![false; sorted.len()];
    for (i, current) in sorted.iter().enumerate() {
        if duplicate[i] {
            continue;
        }
        for (j, later) in sorted.iter().enumerate().skip(i + 1) {
            if !duplicate[j] && fields_match(&current.field, &later.field, tolerance) {
                duplicate[j] = true;
            }
        }
    }

    let before = sorted.len();
    let survivors: Vec<Field> = sorted
        .into_iter()
        .zip(duplicate)
        .filter(|(_, dup)| !dup)
        .map(|(t, _)| t.field)
        .collect();

    debug!(
        before,
        after = survivors.len(),
        tolerance,
        "identity deduplication"
    );
    survivors
}

/// Remove fields occupying the same box, whatever their label or type.
///
/// The first occurrence wins. Fields without primary coordinates are
/// always kept.
pub fn deduplicate_by_position(fields: Vec<Field>, tolerance: f64) -> Vec<Field> {
    let before = fields.len();
    let mut kept: Vec<Field> = Vec::with_capacity(before);

    for field in fields {
        let duplicate = field.coordinates.is_some_and(|rect| {
            kept.iter().any(|k| {
                k.coordinates
                    .is_some_and(|existing| coordinates_match(&rect, &existing, tolerance))
            })
        });
        if !duplicate {
            kept.push(field);
        }
    }

    debug!(before, after = kept.len(), tolerance, "position deduplication");
    kept
}

/// Apply the configured strategy
pub fn deduplicate(tagged: Vec<RegionTagged>, options: &DedupOptions) -> Vec<Field> {
    match options.strategy {
        DedupStrategy::None => tagged.into_iter().map(|t| t.field).collect(),
        DedupStrategy::Identity => deduplicate_by_identity(tagged, options.identity_tolerance),
        DedupStrategy::Position => deduplicate_by_position(
            tagged.into_iter().map(|t| t.field).collect(),
            options.position_tolerance,
        ),
    }
}
