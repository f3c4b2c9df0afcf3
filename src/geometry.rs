//! Geometry resolution and overlap measures
//!
//! Every field is reduced to a single effective rectangle before it is
//! compared. Fields whose geometry cannot be resolved collapse to
//! [`Rect::DEGENERATE`], which overlaps nothing.

use crate::field::{Field, FieldType, Rect};

/// Resolve the effective rectangle of a field.
///
/// Resolution order:
/// 1. Primary `coordinates`
/// 2. `tableConfig.coordinates` for table fields
/// 3. Enclosing box of `dateSegments`
/// 4. Enclosing box of `segments`
/// 5. The degenerate rectangle
pub fn effective_rect(field: &Field) -> Rect {
    if let Some(rect) = field.coordinates {
        return rect;
    }

    if field.field_type == FieldType::Table {
        if let Some(rect) = field.table_config.as_ref().and_then(|t| t.coordinates) {
            return rect;
        }
    }

    if let Some(rect) = Rect::enclosing(field.date_segments.iter().map(|s| &s.rect)) {
        return rect;
    }

    Rect::enclosing(&field.segments).unwrap_or(Rect::DEGENERATE)
}

/// Intersection over union of two rectangles, in `[0, 1]`
pub fn iou(a: &Rect, b: &Rect) -> f64 {
    let Some(inter) = a.intersection(b) else {
        return 0.0;
    };

    let inter_area = inter.area();
    let union_area = a.area() + b.area() - inter_area;
    if union_area <= 0.0 {
        return 0.0;
    }

    (inter_area / union_area).clamp(0.0, 1.0)
}

/// Check that all four components differ by at most `tolerance` points
pub fn coordinates_match(a: &Rect, b: &Rect, tolerance: f64) -> bool {
    (a.left - b.left).abs() <= tolerance
        && (a.top - b.top).abs() <= tolerance
        && (a.width - b.width).abs() <= tolerance
        && (a.height - b.height).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DatePart, DateSegment};

    #[test]
    fn test_effective_rect_prefers_coordinates() {
        let field = Field::new("Total", FieldType::Table)
            .with_coordinates(Rect::new(1.0, 2.0, 3.0, 4.0))
            .with_table_coordinates(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(effective_rect(&field), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_effective_rect_table_config() {
        let field = Field::new("Line items", FieldType::Table)
            .with_table_coordinates(Rect::new(5.0, 40.0, 90.0, 30.0));
        assert_eq!(effective_rect(&field), Rect::new(5.0, 40.0, 90.0, 30.0));
    }

    #[test]
    fn test_table_config_ignored_for_other_types() {
        let field = Field::new("Notes", FieldType::Textarea)
            .with_table_coordinates(Rect::new(5.0, 40.0, 90.0, 30.0));
        assert_eq!(effective_rect(&field), Rect::DEGENERATE);
    }

    #[test]
    fn test_effective_rect_date_segments() {
        let field = Field::new("Date of birth", FieldType::LinkedDate).with_date_segments(vec![
            DateSegment::new(Rect::new(10.0, 50.0, 4.0, 3.0), DatePart::Day),
            DateSegment::new(Rect::new(15.0, 50.0, 4.0, 3.0), DatePart::Month),
            DateSegment::new(Rect::new(20.0, 49.5, 8.0, 3.0), DatePart::Year),
        ]);
        let rect = effective_rect(&field);
        assert_eq!(rect.left, 10.0);
        assert_eq!(rect.top, 49.5);
        assert!((rect.width - 18.0).abs() < 1e-9);
        assert!((rect.height - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_effective_rect_linked_text_segments() {
        let field = Field::new("Address", FieldType::LinkedText).with_segments(vec![
            Rect::new(10.0, 60.0, 80.0, 3.0),
            Rect::new(10.0, 64.0, 60.0, 3.0),
        ]);
        assert_eq!(effective_rect(&field), Rect::new(10.0, 60.0, 80.0, 7.0));
    }

    #[test]
    fn test_effective_rect_missing_geometry() {
        let field = Field::new("Name", FieldType::Text);
        assert_eq!(effective_rect(&field), Rect::DEGENERATE);
    }

    #[test]
    fn test_iou_identical() {
        let a = Rect::new(10.0, 10.0, 30.0, 3.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap_is_symmetric() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 0.0, 10.0, 10.0);
        // 50 / (100 + 100 - 50)
        let expected = 50.0 / 150.0;
        assert!((iou(&a, &b) - expected).abs() < 1e-12);
        assert_eq!(iou(&a, &b), iou(&b, &a));
    }

    #[test]
    fn test_iou_degenerate() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(iou(&a, &Rect::DEGENERATE), 0.0);
        assert_eq!(iou(&Rect::DEGENERATE, &Rect::DEGENERATE), 0.0);
    }

    #[test]
    fn test_iou_bounds_over_grid() {
        let rects: Vec<Rect> = (0..6)
            .flat_map(|i| {
                (0..4).map(move |j| {
                    Rect::new(i as f64 * 7.5, j as f64 * 4.0, 12.0 + j as f64, 5.0 + i as f64)
                })
            })
            .collect();
        for a in &rects {
            for b in &rects {
                let v = iou(a, b);
                assert!((0.0..=1.0).contains(&v));
                assert_eq!(v, iou(b, a));
            }
        }
    }

    #[test]
    fn test_coordinates_match_tolerance() {
        let a = Rect::new(10.0, 10.0, 30.0, 3.0);
        let b = Rect::new(12.5, 9.0, 31.0, 3.5);
        assert!(coordinates_match(&a, &b, 3.0));
        assert!(!coordinates_match(&a, &b, 2.0));
    }
}
