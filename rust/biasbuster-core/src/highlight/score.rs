//! Score aggregation over raw (unresolved) spans
//!
//! `overall = clamp(10 - 2 * mean_severity, 0, 10)`, with an empty set scoring
//! a clean 10. Aggregation runs on detections, not on visual runs, so a region
//! flagged twice counts twice.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::highlight::span::{Span, MAX_SEVERITY};

/// Best possible score (no bias detected).
pub const MAX_SCORE: f64 = 10.0;

/// Points removed per unit of mean severity.
const SEVERITY_WEIGHT: f64 = 2.0;

/// Arithmetic mean of span severities, 0 for an empty set.
pub fn mean_severity(spans: &[Span]) -> f64 {
    if spans.is_empty() {
        return 0.0;
    }
    let total: u64 = spans.iter().map(|s| s.severity as u64).sum();
    total as f64 / spans.len() as f64
}

/// Overall score in `[0, 10]`; higher means less biased.
pub fn overall_score(spans: &[Span]) -> f64 {
    (MAX_SCORE - SEVERITY_WEIGHT * mean_severity(spans)).clamp(0.0, MAX_SCORE)
}

/// Span count per category, ordered by category name.
pub fn by_category(spans: &[Span]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for span in spans {
        *counts.entry(span.category.clone()).or_insert(0) += 1;
    }
    counts
}

/// Span count per severity level; index `i` holds the count for severity `i`.
pub fn severity_distribution(spans: &[Span]) -> [usize; MAX_SEVERITY as usize + 1] {
    let mut counts = [0usize; MAX_SEVERITY as usize + 1];
    for span in spans {
        counts[span.severity.min(MAX_SEVERITY) as usize] += 1;
    }
    counts
}

// =============================================================================
// AnalysisResult
// =============================================================================

/// An accepted analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    spans: Vec<Span>,
    overall_score: f64,
    by_category: BTreeMap<String, usize>,
    produced_from_version: u64,
}

impl AnalysisResult {
    /// Aggregate `spans` (all computed at `version`).
    pub fn new(spans: Vec<Span>, version: u64) -> Self {
        let overall_score = overall_score(&spans);
        let by_category = by_category(&spans);
        Self {
            spans,
            overall_score,
            by_category,
            produced_from_version: version,
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn by_category(&self) -> &BTreeMap<String, usize> {
        &self.by_category
    }

    pub fn produced_from_version(&self) -> u64 {
        self.produced_from_version
    }

    pub fn mean_severity(&self) -> f64 {
        mean_severity(&self.spans)
    }

    pub fn severity_distribution(&self) -> [usize; MAX_SEVERITY as usize + 1] {
        severity_distribution(&self.spans)
    }

    pub fn is_clean(&self) -> bool {
        self.spans.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::span::{RawSpan, SpanId};

    fn spans(items: &[(&str, i64)]) -> Vec<Span> {
        items
            .iter()
            .enumerate()
            .map(|(i, (category, severity))| {
                Span::from_raw(
                    SpanId(i as u32),
                    &RawSpan::new(0, 1, *category, *severity),
                    10,
                    1,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_scores_ten() {
        assert_eq!(overall_score(&[]), 10.0);
        assert_eq!(mean_severity(&[]), 0.0);
    }

    #[test]
    fn test_mean_formula_three_and_four() {
        // 10 - 2 * 3.5
        let s = spans(&[("political", 3), ("gender", 4)]);
        assert!((overall_score(&s) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_severity_clamps_to_zero() {
        let s = spans(&[("political", 5), ("political", 5), ("racial", 5)]);
        assert_eq!(overall_score(&s), 0.0);
    }

    #[test]
    fn test_zero_severity_keeps_full_score() {
        let s = spans(&[("cultural", 0)]);
        assert_eq!(overall_score(&s), 10.0);
    }

    #[test]
    fn test_by_category_counts_duplicates() {
        let s = spans(&[("political", 1), ("gender", 2), ("political", 3)]);
        let counts = by_category(&s);
        assert_eq!(counts.get("political"), Some(&2));
        assert_eq!(counts.get("gender"), Some(&1));
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["gender", "political"]);
    }

    #[test]
    fn test_severity_distribution() {
        let s = spans(&[("a", 0), ("a", 2), ("b", 2), ("c", 5)]);
        assert_eq!(severity_distribution(&s), [1, 0, 2, 0, 0, 1]);
    }

    #[test]
    fn test_analysis_result_fields() {
        let result = AnalysisResult::new(spans(&[("political", 2)]), 7);
        assert_eq!(result.produced_from_version(), 7);
        assert!((result.overall_score() - 6.0).abs() < 1e-9);
        assert_eq!(result.by_category().len(), 1);
        assert!(!result.is_clean());
    }
}
