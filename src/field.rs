//! Field data model
//!
//! Field records as produced by the extraction provider and stored in the
//! benchmark ground truth. All geometry is expressed in page-percentage
//! units (0-100) measured from the top-left corner.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Field loading error types
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Unknown field type: {0}")]
    UnknownType(String),

    #[error("Field file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FieldError>;

// ============================================================
// Field Type
// ============================================================

/// Kind of fillable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    Text,
    Textarea,
    Checkbox,
    Radio,
    Date,
    Signature,
    Initials,
    CircleChoice,
    Table,
    LinkedText,
    LinkedDate,
}

impl FieldType {
    /// Every field type, in declaration order
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::Date,
        FieldType::Signature,
        FieldType::Initials,
        FieldType::CircleChoice,
        FieldType::Table,
        FieldType::LinkedText,
        FieldType::LinkedDate,
    ];

    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Date => "date",
            FieldType::Signature => "signature",
            FieldType::Initials => "initials",
            FieldType::CircleChoice => "circle_choice",
            FieldType::Table => "table",
            FieldType::LinkedText => "linkedText",
            FieldType::LinkedDate => "linkedDate",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FieldError;

    /// Parse a type name, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == normalized)
            .ok_or_else(|| FieldError::UnknownType(s.to_string()))
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================
// Geometry
// ============================================================

/// Axis-aligned rectangle in page-percentage space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Zero-area rectangle at the origin
    pub const DEGENERATE: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new rectangle
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Calculate area
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Calculate intersection with another rectangle
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > left && bottom > top {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Minimal box enclosing every rectangle, or None for an empty input
    pub fn enclosing<'a, I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        rects.into_iter().fold(None, |acc: Option<Rect>, r| {
            Some(match acc {
                None => *r,
                Some(bounds) => {
                    let left = bounds.left.min(r.left);
                    let top = bounds.top.min(r.top);
                    let right = bounds.right().max(r.right());
                    let bottom = bounds.bottom().max(r.bottom());
                    Rect::new(left, top, right - left, bottom - top)
                }
            })
        })
    }
}

/// Read a rectangle from loosely-typed JSON.
///
/// Missing keys default to 0. Anything else that is not a number (strings,
/// arrays, a non-object value) makes the whole rectangle unusable, as does
/// an object with none of the four keys.
fn rect_from_value(value: &Value) -> Option<Rect> {
    let object = value.as_object()?;
    let mut parts = [None; 4];
    for (slot, key) in parts.iter_mut().zip(["left", "top", "width", "height"]) {
        match object.get(key) {
            None | Some(Value::Null) => {}
            Some(v) => *slot = Some(v.as_f64()?),
        }
    }
    if parts.iter().all(Option::is_none) {
        return None;
    }
    let [left, top, width, height] = parts.map(|p| p.unwrap_or(0.0));
    Some(Rect::new(left, top, width, height))
}

/// Optional rectangle; malformed geometry is treated as absent.
fn lenient_rect<'de, D>(deserializer: D) -> std::result::Result<Option<Rect>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(rect_from_value(&value))
}

/// List of rectangles; unusable entries are dropped.
fn lenient_rects<'de, D>(deserializer: D) -> std::result::Result<Vec<Rect>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_array()
        .map(|items| items.iter().filter_map(rect_from_value).collect())
        .unwrap_or_default())
}

fn lenient_date_segments<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<DateSegment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(items) = value.as_array() else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| {
            let rect = rect_from_value(item)?;
            let part = item
                .get("part")
                .and_then(Value::as_str)
                .and_then(DatePart::from_name);
            Some(DateSegment { rect, part })
        })
        .collect())
}

fn lenient_date_part<'de, D>(deserializer: D) -> std::result::Result<Option<DatePart>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(DatePart::from_name))
}

/// Non-negative whole count; accepts `4` and `4.0`, anything else is absent.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value.as_u64() {
        Some(n) => u32::try_from(n).ok(),
        None => value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u32),
    };
    Ok(count)
}

/// Component of a segmented date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    Day,
    Month,
    Year,
    Year2,
}

impl DatePart {
    /// Case-insensitive lookup; unknown names give None
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "day" => Some(DatePart::Day),
            "month" => Some(DatePart::Month),
            "year" => Some(DatePart::Year),
            "year2" => Some(DatePart::Year2),
            _ => None,
        }
    }
}

/// One box of a `linkedDate` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSegment {
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(
        default,
        deserialize_with = "lenient_date_part",
        skip_serializing_if = "Option::is_none"
    )]
    pub part: Option<DatePart>,
}

impl DateSegment {
    pub fn new(rect: Rect, part: DatePart) -> Self {
        Self {
            rect,
            part: Some(part),
        }
    }
}

/// Table layout attached to a `table` field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Authoritative table region
    #[serde(
        default,
        deserialize_with = "lenient_rect",
        skip_serializing_if = "Option::is_none"
    )]
    pub coordinates: Option<Rect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_headers: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_positions: Vec<f64>,
}

// ============================================================
// Field
// ============================================================

/// A detected or ground-truth fillable region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Purpose of the field; not unique
    #[serde(default)]
    pub label: String,
    #[serde(alias = "type")]
    pub field_type: FieldType,
    /// Contextual grouping, ignored by scoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    /// Primary geometry
    #[serde(
        default,
        alias = "box",
        deserialize_with = "lenient_rect",
        skip_serializing_if = "Option::is_none"
    )]
    pub coordinates: Option<Rect>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_config: Option<TableConfig>,
    #[serde(
        default,
        deserialize_with = "lenient_date_segments",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub date_segments: Vec<DateSegment>,
    /// Boxes of a `linkedText` field
    #[serde(
        default,
        deserialize_with = "lenient_rects",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub segments: Vec<Rect>,
}

impl Field {
    /// Create a field with no geometry
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            field_type,
            group_label: None,
            coordinates: None,
            rows: None,
            table_config: None,
            date_segments: Vec::new(),
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_coordinates(mut self, rect: Rect) -> Self {
        self.coordinates = Some(rect);
        self
    }

    #[must_use]
    pub fn with_group_label(mut self, group: impl Into<String>) -> Self {
        self.group_label = Some(group.into());
        self
    }

    /// Set the table region
    #[must_use]
    pub fn with_table_coordinates(mut self, rect: Rect) -> Self {
        self.table_config
            .get_or_insert_with(TableConfig::default)
            .coordinates = Some(rect);
        self
    }

    #[must_use]
    pub fn with_date_segments(mut self, segments: Vec<DateSegment>) -> Self {
        self.date_segments = segments;
        self
    }

    #[must_use]
    pub fn with_segments(mut self, segments: Vec<Rect>) -> Self {
        self.segments = segments;
        self
    }
}

// ============================================================
// Field Sets
// ============================================================

/// Parse a field set from JSON.
///
/// Accepts either a bare array or an object with a `fields` array; an
/// object without `fields` is an empty set.
pub fn parse_field_set<T: DeserializeOwned>(json: &str) -> Result<Vec<T>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let list = match value {
        serde_json::Value::Object(mut map) => map
            .remove("fields")
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

/// Load a field set from a JSON file
pub fn load_field_set<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(FieldError::FileNotFound(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path)?;
    parse_field_set(&json)
}
