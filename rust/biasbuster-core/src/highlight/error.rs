//! Error taxonomy for the annotation pipeline.
//!
//! - [`InvalidSpan`]: one malformed detection. Dropped, the batch continues.
//! - [`ResolveError`]: resolver called with a mixed or out-of-range batch.
//! - [`OracleError`]: the detection service failed as a whole. Surfaced as
//!   `AnalysisFailed` by the annotator with the last good result attached.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw span rejected during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvalidSpan {
    #[error("span start {start} is negative")]
    NegativeStart { start: i64 },
    #[error("span [{start}, {end}) is empty or inverted")]
    EmptyRange { start: i64, end: i64 },
    #[error("span end {end} exceeds buffer length {len}")]
    PastEnd { end: i64, len: usize },
    #[error("sentence not found in buffer: {sentence:?}")]
    SentenceNotFound { sentence: String },
}

/// Failure to resolve a span batch into runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("span {id} belongs to version {found}, batch is version {expected}")]
    VersionMismatch { id: u32, expected: u64, found: u64 },
    #[error("span {id} ends at {end}, past buffer length {len}")]
    OutOfBounds { id: u32, end: usize, len: usize },
}

/// Failure reported by a detection oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum OracleError {
    /// Network or host-side failure before a response was produced.
    #[error("oracle transport failed: {0}")]
    Transport(String),
    /// A response arrived but could not be decoded.
    #[error("oracle response malformed: {0}")]
    Malformed(String),
    /// The oracle declined the request (quota, unsupported language, ...).
    #[error("oracle rejected request: {0}")]
    Rejected(String),
}

/// Invalid configuration payload.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid lexicon pattern for {word:?}: {source}")]
    Pattern {
        word: String,
        #[source]
        source: regex::Error,
    },
}
