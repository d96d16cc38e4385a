//! SentenceLocator: sentence-keyed detections → offset spans
//!
//! The extension's analysis service reports bias per sentence
//! (`{ sentence, bias_type, severity, ... }`) with no offsets. The locator
//! finds every ASCII-case-insensitive occurrence of each sentence in the text
//! with one Aho-Corasick pass and emits a span per occurrence.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::highlight::buffer::TextBuffer;
use crate::highlight::error::{InvalidSpan, OracleError};
use crate::highlight::oracle::{AnalysisRequest, Oracle, RawAnalysis};
use crate::highlight::span::{RawSpan, RejectedSpan};

// =============================================================================
// Types
// =============================================================================

/// A bias instance as reported by the sentence-level service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceInstance {
    #[serde(alias = "Sentence")]
    pub sentence: String,
    #[serde(default, alias = "BiasType", alias = "biasType")]
    pub bias_type: String,
    #[serde(default, alias = "Severity")]
    pub severity: i64,
    #[serde(default, alias = "Explanation")]
    pub explanation: String,
    #[serde(default, alias = "Mitigation")]
    pub mitigation: Option<String>,
}

impl SentenceInstance {
    pub fn new(sentence: impl Into<String>, bias_type: impl Into<String>, severity: i64) -> Self {
        Self {
            sentence: sentence.into(),
            bias_type: bias_type.into(),
            severity,
            explanation: String::new(),
            mitigation: None,
        }
    }
}

/// Sentence-form oracle response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentenceAnalysis {
    pub version: u64,
    #[serde(default, alias = "BiasInstances")]
    pub instances: Vec<SentenceInstance>,
}

/// Located spans plus the instances that could not be found.
#[derive(Debug, Clone, Default)]
pub struct Located {
    pub spans: Vec<RawSpan>,
    pub missing: Vec<RejectedSpan>,
}

// =============================================================================
// Locator
// =============================================================================

/// Find every occurrence of each instance's sentence in `buffer`.
///
/// Spans are emitted in instance order, then by position, so ids assigned
/// downstream are stable for a given response.
pub fn locate(buffer: &TextBuffer, instances: &[SentenceInstance]) -> Located {
    let mut located = Located::default();

    // unique needles; several instances may flag the same sentence
    let mut needles: Vec<String> = Vec::new();
    let mut needle_of: HashMap<String, usize> = HashMap::new();
    let mut instance_needle: Vec<Option<usize>> = Vec::with_capacity(instances.len());
    for instance in instances {
        let needle = instance.sentence.trim().to_ascii_lowercase();
        if needle.is_empty() {
            instance_needle.push(None);
            continue;
        }
        let next = needles.len();
        let idx = *needle_of.entry(needle.clone()).or_insert(next);
        if idx == next {
            needles.push(needle);
        }
        instance_needle.push(Some(idx));
    }

    let matches = match build_automaton(&needles) {
        Some(automaton) => find_all(&automaton, buffer, needles.len()),
        None => vec![Vec::new(); needles.len()],
    };

    for (index, (instance, needle)) in instances.iter().zip(&instance_needle).enumerate() {
        let hits = needle.map(|n| matches[n].as_slice()).unwrap_or(&[]);
        if hits.is_empty() {
            tracing::warn!(index, "bias sentence not found in text");
            located.missing.push(RejectedSpan {
                index: index as u32,
                error: InvalidSpan::SentenceNotFound {
                    sentence: instance.sentence.clone(),
                },
            });
            continue;
        }
        for &(start, end) in hits {
            let mut span = RawSpan::new(start as i64, end as i64, instance.bias_type.clone(), instance.severity)
                .with_explanation(instance.explanation.clone());
            span.suggestion = instance.mitigation.clone();
            located.spans.push(span);
        }
    }

    located
}

fn build_automaton(needles: &[String]) -> Option<AhoCorasick> {
    if needles.is_empty() {
        return None;
    }
    match AhoCorasickBuilder::new()
        .match_kind(MatchKind::Standard)
        .ascii_case_insensitive(true)
        .build(needles)
    {
        Ok(automaton) => Some(automaton),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build sentence automaton");
            None
        }
    }
}

/// UTF-16 `(start, end)` hits per needle, in text order.
fn find_all(automaton: &AhoCorasick, buffer: &TextBuffer, count: usize) -> Vec<Vec<(usize, usize)>> {
    let byte_hits: Vec<(usize, usize, usize)> = automaton
        .find_overlapping_iter(buffer.text())
        .map(|m| (m.pattern().as_usize(), m.start(), m.end()))
        .collect();

    let offsets: Vec<usize> = byte_hits.iter().flat_map(|&(_, s, e)| [s, e]).collect();
    let units = buffer.to_units(&offsets);

    let mut hits = vec![Vec::new(); count];
    for (i, &(pattern, _, _)) in byte_hits.iter().enumerate() {
        hits[pattern].push((units[2 * i], units[2 * i + 1]));
    }
    for list in &mut hits {
        list.sort_unstable();
    }
    hits
}

impl SentenceAnalysis {
    /// Convert to offset form against the text the request carried.
    pub fn into_raw(self, text: &str) -> RawAnalysis {
        let buffer = TextBuffer::new(text);
        let located = locate(&buffer, &self.instances);
        RawAnalysis::new(self.version, located.spans)
    }
}

// =============================================================================
// Oracle adapter
// =============================================================================

/// A detector that answers in sentence form.
#[allow(async_fn_in_trait)]
pub trait SentenceOracle {
    async fn analyze_sentences(&self, request: &AnalysisRequest) -> Result<SentenceAnalysis, OracleError>;
}

/// Adapts a [`SentenceOracle`] to the offset-based [`Oracle`] contract.
pub struct SentenceAdapter<S>(pub S);

impl<S: SentenceOracle> Oracle for SentenceAdapter<S> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis, OracleError> {
        let analysis = self.0.analyze_sentences(request).await?;
        Ok(analysis.into_raw(&request.text))
    }
}

// =============================================================================
// Tests
// =============================================================================
