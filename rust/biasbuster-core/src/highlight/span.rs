//! Span model: validated, versioned bias detections
//!
//! Oracle output is untrusted. Each raw detection is checked against the
//! buffer it was computed for. Bad offsets reject the span; out-of-range
//! severity is clamped with a warning.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::highlight::error::InvalidSpan;

/// Highest severity a span can carry.
pub const MAX_SEVERITY: u8 = 5;

/// Category assigned when the oracle leaves it blank.
pub const DEFAULT_CATEGORY: &str = "other";

// =============================================================================
// Types
// =============================================================================

/// Identity of a span within one analysis (its index in the oracle response).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub u32);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A detection as reported by the oracle, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub severity: i64,
    #[serde(default)]
    pub explanation: String,
    /// Suggested neutral rewrite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl RawSpan {
    pub fn new(start: i64, end: i64, category: impl Into<String>, severity: i64) -> Self {
        Self {
            start,
            end,
            category: category.into(),
            severity,
            explanation: String::new(),
            suggestion: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A validated span over `[start, end)` UTF-16 units of the buffer at
/// `source_version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub start: usize,
    pub end: usize,
    pub category: String,
    pub severity: u8,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub source_version: u64,
}

impl Span {
    /// Validate `raw` against a buffer of `buffer_len` units at `version`.
    pub fn from_raw(
        id: SpanId,
        raw: &RawSpan,
        buffer_len: usize,
        version: u64,
    ) -> Result<Self, InvalidSpan> {
        if raw.start < 0 {
            return Err(InvalidSpan::NegativeStart { start: raw.start });
        }
        if raw.start >= raw.end {
            return Err(InvalidSpan::EmptyRange {
                start: raw.start,
                end: raw.end,
            });
        }
        let end = usize::try_from(raw.end).map_err(|_| InvalidSpan::PastEnd {
            end: raw.end,
            len: buffer_len,
        })?;
        if end > buffer_len {
            return Err(InvalidSpan::PastEnd {
                end: raw.end,
                len: buffer_len,
            });
        }

        let category = raw.category.trim();
        let category = if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.to_lowercase()
        };

        Ok(Self {
            id,
            // start >= 0 and start < end <= buffer_len
            start: raw.start as usize,
            end,
            category,
            severity: clamp_severity(id, raw.severity),
            explanation: raw.explanation.clone(),
            suggestion: raw.suggestion.clone(),
            source_version: version,
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Key used for deterministic ordering: `(start, end, id)`.
    pub fn sort_key(&self) -> (usize, usize, SpanId) {
        (self.start, self.end, self.id)
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Clamp an untrusted severity into `0..=MAX_SEVERITY`.
fn clamp_severity(id: SpanId, severity: i64) -> u8 {
    let clamped = severity.clamp(0, MAX_SEVERITY as i64);
    if clamped != severity {
        tracing::warn!(
            span_id = %id,
            severity,
            clamped,
            "span severity out of range, clamping"
        );
    }
    clamped as u8
}

// =============================================================================
// Batch validation
// =============================================================================

/// A raw span that failed validation, with its position in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedSpan {
    pub index: u32,
    pub error: InvalidSpan,
}

/// Validate a whole oracle batch. Malformed entries are dropped and reported;
/// the rest are kept in response order.
pub fn validate_batch(
    raw: &[RawSpan],
    buffer_len: usize,
    version: u64,
) -> (Vec<Span>, Vec<RejectedSpan>) {
    let mut spans = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (index, raw_span) in raw.iter().enumerate() {
        let id = SpanId(index as u32);
        match Span::from_raw(id, raw_span, buffer_len, version) {
            Ok(span) => spans.push(span),
            Err(error) => {
                tracing::warn!(span_id = %id, version, %error, "dropping invalid span");
                rejected.push(RejectedSpan {
                    index: index as u32,
                    error,
                });
            }
        }
    }

    (spans, rejected)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn build(raw: RawSpan, len: usize) -> Result<Span, InvalidSpan> {
        Span::from_raw(SpanId(0), &raw, len, 1)
    }

    #[test]
    fn test_valid_span() {
        let span = build(RawSpan::new(2, 5, "Political", 3), 10).unwrap();
        assert_eq!(span.start, 2);
        assert_eq!(span.end, 5);
        assert_eq!(span.len(), 3);
        assert_eq!(span.category, "political");
        assert_eq!(span.severity, 3);
        assert_eq!(span.source_version, 1);
    }

    #[test]
    fn test_start_equal_end_rejected() {
        let err = build(RawSpan::new(4, 4, "gender", 1), 10).unwrap_err();
        assert_eq!(err, InvalidSpan::EmptyRange { start: 4, end: 4 });
    }

    #[test]
    fn test_inverted_span_rejected() {
        let err = build(RawSpan::new(6, 2, "gender", 1), 10).unwrap_err();
        assert!(matches!(err, InvalidSpan::EmptyRange { .. }));
    }

    #[test]
    fn test_negative_start_rejected() {
        let err = build(RawSpan::new(-1, 2, "gender", 1), 10).unwrap_err();
        assert_eq!(err, InvalidSpan::NegativeStart { start: -1 });
    }

    #[test]
    fn test_end_past_buffer_rejected() {
        let err = build(RawSpan::new(0, 11, "gender", 1), 10).unwrap_err();
        assert_eq!(err, InvalidSpan::PastEnd { end: 11, len: 10 });
    }

    #[test]
    fn test_end_at_buffer_length_accepted() {
        assert!(build(RawSpan::new(0, 10, "gender", 1), 10).is_ok());
    }

    #[traced_test]
    #[test]
    fn test_severity_clamped_high_with_warning() {
        let span = build(RawSpan::new(0, 3, "racial", 9), 10).unwrap();
        assert_eq!(span.severity, MAX_SEVERITY);
        assert!(logs_contain("span severity out of range"));
    }

    #[test]
    fn test_severity_clamped_low() {
        let span = build(RawSpan::new(0, 3, "racial", -4), 10).unwrap();
        assert_eq!(span.severity, 0);
    }

    #[test]
    fn test_blank_category_defaults_to_other() {
        let span = build(RawSpan::new(0, 3, "  ", 1), 10).unwrap();
        assert_eq!(span.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_validate_batch_drops_only_bad_spans() {
        let raw = vec![
            RawSpan::new(0, 3, "political", 2),
            RawSpan::new(5, 5, "political", 2),
            RawSpan::new(4, 8, "gender", 1),
            RawSpan::new(7, 40, "gender", 1),
        ];
        let (spans, rejected) = validate_batch(&raw, 10, 3);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].id, SpanId(0));
        assert_eq!(spans[1].id, SpanId(2));
        assert!(spans.iter().all(|s| s.source_version == 3));

        let indexes: Vec<u32> = rejected.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 3]);
    }

    #[test]
    fn test_raw_span_deserializes_with_defaults() {
        let raw: RawSpan = serde_json::from_str(r#"{"start": 1, "end": 4}"#).unwrap();
        assert_eq!(raw.severity, 0);
        assert!(raw.category.is_empty());
        assert!(raw.suggestion.is_none());
    }

    #[test]
    fn test_overlaps() {
        let a = build(RawSpan::new(0, 5, "a", 1), 20).unwrap();
        let b = build(RawSpan::new(5, 9, "b", 1), 20).unwrap();
        let c = build(RawSpan::new(4, 6, "c", 1), 20).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }
}
