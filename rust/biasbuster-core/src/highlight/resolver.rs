//! Overlap resolver: spans → non-overlapping runs
//!
//! Boundary-event sweep. Every span contributes an open event at `start` and
//! a close event at `end`. Events are sorted by `(offset, close-before-open,
//! start, end, id)` and swept left to right with an ordered open set, so the
//! output is identical for any permutation of the input.
//!
//! Runs partition `[0, len)` exactly: contiguous, ordered, no gaps. Cost is
//! O(S log S) plus the size of the output.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::highlight::error::ResolveError;
use crate::highlight::span::{Span, SpanId};

// =============================================================================
// Types
// =============================================================================

/// One unit of the output partition. `spans` is empty for plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run<'a> {
    pub start: usize,
    pub end: usize,
    /// Covering spans, ordered by `(start, end, id)`
    pub spans: Vec<&'a Span>,
}

impl<'a> Run<'a> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_plain(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn max_severity(&self) -> Option<u8> {
        self.spans.iter().map(|s| s.severity).max()
    }

    pub fn span_ids(&self) -> Vec<SpanId> {
        self.spans.iter().map(|s| s.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    // Close sorts first so touching spans never overlap at a shared offset
    Close,
    Open,
}

type SortKey = (usize, usize, SpanId);

// =============================================================================
// Resolver
// =============================================================================

/// Resolve `spans` (all computed at `version`) over a buffer of `len` units.
pub fn resolve(spans: &[Span], version: u64, len: usize) -> Result<Vec<Run<'_>>, ResolveError> {
    let mut events: Vec<(usize, Boundary, SortKey, &Span)> = Vec::with_capacity(spans.len() * 2);

    for span in spans {
        if span.source_version != version {
            return Err(ResolveError::VersionMismatch {
                id: span.id.0,
                expected: version,
                found: span.source_version,
            });
        }
        if span.end > len {
            return Err(ResolveError::OutOfBounds {
                id: span.id.0,
                end: span.end,
                len,
            });
        }
        if span.is_empty() {
            continue;
        }
        let key = span.sort_key();
        events.push((span.start, Boundary::Open, key, span));
        events.push((span.end, Boundary::Close, key, span));
    }

    events.sort_unstable_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut runs = Vec::with_capacity(events.len() + 1);
    let mut open: BTreeMap<SortKey, &Span> = BTreeMap::new();
    let mut cursor = 0;
    let mut i = 0;

    while i < events.len() {
        let at = events[i].0;
        if at > cursor {
            runs.push(Run {
                start: cursor,
                end: at,
                spans: open.values().copied().collect(),
            });
            cursor = at;
        }
        while i < events.len() && events[i].0 == at {
            let (_, boundary, key, span) = events[i];
            match boundary {
                Boundary::Close => {
                    open.remove(&key);
                }
                Boundary::Open => {
                    open.insert(key, span);
                }
            }
            i += 1;
        }
    }

    if cursor < len || runs.is_empty() {
        runs.push(Run {
            start: cursor,
            end: len,
            spans: Vec::new(),
        });
    }

    Ok(runs)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::span::RawSpan;

    fn span(id: u32, start: i64, end: i64, severity: i64) -> Span {
        Span::from_raw(SpanId(id), &RawSpan::new(start, end, "political", severity), 10_000, 1)
            .unwrap()
    }

    fn shape(runs: &[Run<'_>]) -> Vec<(usize, usize, Vec<u32>)> {
        runs.iter()
            .map(|r| (r.start, r.end, r.spans.iter().map(|s| s.id.0).collect()))
            .collect()
    }

    #[test]
    fn test_no_spans_single_plain_run() {
        let runs = resolve(&[], 1, 11).unwrap();
        assert_eq!(shape(&runs), vec![(0, 11, vec![])]);
    }

    #[test]
    fn test_empty_buffer_yields_one_empty_run() {
        let runs = resolve(&[], 1, 0).unwrap();
        assert_eq!(shape(&runs), vec![(0, 0, vec![])]);
    }

    #[test]
    fn test_partial_overlap() {
        let spans = vec![span(1, 5, 10, 3), span(2, 8, 15, 2)];
        let runs = resolve(&spans, 1, 20).unwrap();
        assert_eq!(
            shape(&runs),
            vec![
                (0, 5, vec![]),
                (5, 8, vec![1]),
                (8, 10, vec![1, 2]),
                (10, 15, vec![2]),
                (15, 20, vec![]),
            ]
        );
    }

    #[test]
    fn test_adjacent_spans_do_not_merge() {
        let spans = vec![span(0, 0, 4, 1), span(1, 4, 8, 1)];
        let runs = resolve(&spans, 1, 8).unwrap();
        assert_eq!(shape(&runs), vec![(0, 4, vec![0]), (4, 8, vec![1])]);
    }

    #[test]
    fn test_coincident_spans_share_run() {
        let spans = vec![span(3, 2, 6, 1), span(1, 2, 6, 4)];
        let runs = resolve(&spans, 1, 6).unwrap();
        assert_eq!(shape(&runs), vec![(0, 2, vec![]), (2, 6, vec![1, 3])]);
        assert_eq!(runs[1].max_severity(), Some(4));
    }

    #[test]
    fn test_nested_spans() {
        let spans = vec![span(0, 0, 10, 1), span(1, 3, 5, 1)];
        let runs = resolve(&spans, 1, 10).unwrap();
        assert_eq!(
            shape(&runs),
            vec![(0, 3, vec![0]), (3, 5, vec![0, 1]), (5, 10, vec![0])]
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = vec![span(0, 1, 4, 1), span(1, 2, 9, 2), span(2, 2, 9, 3), span(3, 6, 7, 0)];
        let mut b = a.clone();
        b.reverse();
        b.swap(0, 2);
        assert_eq!(resolve(&a, 1, 12).unwrap(), resolve(&b, 1, 12).unwrap());
    }

    #[test]
    fn test_version_mismatch() {
        let mut spans = vec![span(0, 0, 2, 1), span(1, 3, 4, 1)];
        spans[1].source_version = 2;
        let err = resolve(&spans, 1, 10).unwrap_err();
        assert_eq!(
            err,
            ResolveError::VersionMismatch {
                id: 1,
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let spans = vec![span(0, 0, 12, 1)];
        let err = resolve(&spans, 1, 10).unwrap_err();
        assert_eq!(err, ResolveError::OutOfBounds { id: 0, end: 12, len: 10 });
    }

    #[test]
    fn test_ten_thousand_spans() {
        let spans: Vec<Span> = (0..10_000u32)
            .map(|i| span(i, (i % 9_000) as i64, (i % 9_000 + 7) as i64, (i % 6) as i64))
            .collect();
        let runs = resolve(&spans, 1, 10_000).unwrap();
        assert_eq!(runs.first().map(|r| r.start), Some(0));
        assert_eq!(runs.last().map(|r| r.end), Some(10_000));
        assert!(runs.windows(2).all(|w| w[0].end == w[1].start));
    }
}
