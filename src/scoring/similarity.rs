//! Label and type similarity
//!
//! # Label similarity
//! Labels are compared after lowercasing and trimming. The similarity is
//! the normalized Indel ratio: an alignment where insert/delete cost 1 and
//! substitution costs 2, giving `(|a| + |b| - cost) / (|a| + |b|)`.
//!
//! # Time Complexity
//! O(|a| × |b|) per pair, O(min(|a|, |b|)) memory.

use crate::field::FieldType;

/// Lowercase and trim a label for comparison
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Case- and whitespace-insensitive label equality. Empty labels never match.
pub fn labels_match(a: &str, b: &str) -> bool {
    let a = normalize_label(a);
    let b = normalize_label(b);
    !a.is_empty() && !b.is_empty() && a == b
}

/// Indel edit cost between two strings (substitution = delete + insert).
///
/// Equal to `|a| + |b| - 2·LCS(a, b)`.
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    // Keep the shorter string in the inner loop
    let (outer, inner) = if a_chars.len() >= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    let mut prev: Vec<usize> = (0..=inner.len()).collect();
    let mut curr: Vec<usize> = vec![0; inner.len() + 1];

    for (j, oc) in outer.iter().enumerate() {
        curr[0] = j + 1;

        for (i, ic) in inner.iter().enumerate() {
            let substitution = if oc == ic { 0 } else { 2 };

            curr[i + 1] = (prev[i + 1] + 1) // deletion
                .min(curr[i] + 1) // insertion
                .min(prev[i] + substitution);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

/// Fuzzy label similarity in `[0, 1]`.
///
/// Empty labels (after normalization) score 0; equal labels score 1.
pub fn label_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_label(a);
    let b = normalize_label(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let total = a.chars().count() + b.chars().count();
    let distance = indel_distance(&a, &b);
    ((total - distance) as f64 / total as f64).clamp(0.0, 1.0)
}

/// Whether a predicted type is an acceptable stand-in for the truth type.
///
/// Besides equality, `text`/`textarea` and `date`/`linkedDate` are
/// interchangeable in either direction.
pub fn types_compatible(predicted: FieldType, truth: FieldType) -> bool {
    use FieldType::{Date, LinkedDate, Text, Textarea};

    predicted == truth
        || matches!(
            (predicted, truth),
            (Text, Textarea) | (Textarea, Text) | (Date, LinkedDate) | (LinkedDate, Date)
        )
}
