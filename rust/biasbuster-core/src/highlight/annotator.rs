//! Annotator: incremental re-analysis of a mutable text buffer
//!
//! # Design Principles
//! 1. State machine: Idle → Pending → Resolving → Idle, with Stale when a
//!    response loses the race against an edit
//! 2. Optimistic concurrency: a response is applied only if it was computed
//!    for the current buffer version. Arrival order is irrelevant.
//! 3. Sans-IO: the host owns timers and transport. It feeds edits, polls for
//!    due requests and hands back responses.
//!
//! # Usage
//! ```rust,ignore
//! let mut annotator = Annotator::new(AnnotatorConfig::default());
//! annotator.mutate("The chairman spoke.", Instant::now());
//! // ... debounce elapses ...
//! if let Some(request) = annotator.poll(Instant::now()) {
//!     let response = oracle.analyze(&request).await;
//!     match annotator.complete(request.version, response) { ... }
//! }
//! ```

use instant::Instant;
use serde::Serialize;
use thiserror::Error;

use crate::highlight::buffer::TextBuffer;
use crate::highlight::config::AnnotatorConfig;
use crate::highlight::error::{OracleError, ResolveError};
use crate::highlight::oracle::{AnalysisRequest, RawAnalysis};
use crate::highlight::projection::{project, DrawInstruction};
use crate::highlight::resolver::{resolve, Run};
use crate::highlight::score::AnalysisResult;
use crate::highlight::span::{validate_batch, RejectedSpan};

// =============================================================================
// State Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing scheduled, nothing in flight
    Idle,
    /// Edited; waiting for the debounce window (or for the in-flight request)
    Pending,
    /// A request for the current version is in flight
    Resolving,
    /// Transient: a response arrived for an outdated version
    Stale,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Pending => "pending",
            Phase::Resolving => "resolving",
            Phase::Stale => "stale",
        }
    }
}

/// Per-session state. Owned by one [`Annotator`], never shared.
#[derive(Debug, Clone, Default)]
pub struct AnnotatorState {
    pub buffer: TextBuffer,
    pub last_accepted: Option<AnalysisResult>,
    /// Version of the request currently in flight
    pub pending_request_version: Option<u64>,
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnotatorStats {
    pub edits: u64,
    pub skipped_edits: u64,
    pub dispatched: u64,
    pub accepted: u64,
    pub stale: u64,
    pub failed: u64,
    pub dropped: u64,
}

// =============================================================================
// Outcomes
// =============================================================================

/// A response that was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accepted {
    pub result: AnalysisResult,
    /// Malformed spans dropped from the response
    pub rejected: Vec<RejectedSpan>,
    /// Valid spans removed by the sensitivity filter or the span cap
    pub filtered: usize,
}

/// The oracle failed for the current version. Carries the last good result
/// so the UI can keep showing it.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("analysis of version {version} failed: {error}")]
pub struct AnalysisFailed {
    pub version: u64,
    pub error: OracleError,
    pub last_good: Option<AnalysisResult>,
}

/// What happened to a response handed to [`Annotator::complete`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Accepted(Accepted),
    /// Computed for an outdated version and discarded
    Stale { version: u64, current: u64 },
    Failed(AnalysisFailed),
    /// Session already disposed
    Dropped,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }
}

// =============================================================================
// Annotator
// =============================================================================

/// Drives analysis for one editing session.
#[derive(Debug)]
pub struct Annotator {
    config: AnnotatorConfig,
    state: AnnotatorState,
    phase: Phase,
    deadline: Option<Instant>,
    flush_requested: bool,
    disposed: bool,
    stats: AnnotatorStats,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(AnnotatorConfig::default())
    }
}

impl Annotator {
    /// Start a session over an empty buffer.
    pub fn new(config: AnnotatorConfig) -> Self {
        Self::with_text(config, "")
    }

    /// Start a session over `text` (version 0). Nothing is scheduled until
    /// the first edit or [`flush`](Self::flush).
    pub fn with_text(config: AnnotatorConfig, text: impl Into<String>) -> Self {
        Self {
            config,
            state: AnnotatorState {
                buffer: TextBuffer::new(text),
                ..AnnotatorState::default()
            },
            phase: Phase::Idle,
            deadline: None,
            flush_requested: false,
            disposed: false,
            stats: AnnotatorStats::default(),
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &AnnotatorState {
        &self.state
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.state.buffer
    }

    pub fn version(&self) -> u64 {
        self.state.buffer.version()
    }

    pub fn last_accepted(&self) -> Option<&AnalysisResult> {
        self.state.last_accepted.as_ref()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.state.pending_request_version
    }

    pub fn stats(&self) -> AnnotatorStats {
        self.stats
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// When the host should call [`poll`](Self::poll) next. `None` if nothing
    /// is scheduled or a request is still in flight.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.disposed || self.phase != Phase::Pending || self.in_flight().is_some() {
            return None;
        }
        self.deadline
    }

    /// Replace the buffer content. Returns `true` if this was a real edit.
    ///
    /// Restarts the debounce window. An in-flight request is left alone; its
    /// response will be discarded as stale and a new cycle queues behind it.
    pub fn mutate(&mut self, text: impl Into<String>, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        if !self.state.buffer.replace(text) {
            self.stats.skipped_edits += 1;
            return false;
        }
        self.stats.edits += 1;
        self.deadline = Some(now + self.config.debounce());
        self.transition(Phase::Pending);
        true
    }

    /// Issue a request if one is due: Pending, debounce elapsed (or flush
    /// requested), and nothing in flight.
    pub fn poll(&mut self, now: Instant) -> Option<AnalysisRequest> {
        if self.disposed || self.phase != Phase::Pending || self.in_flight().is_some() {
            return None;
        }
        let due = self.flush_requested || self.deadline.map_or(true, |d| d <= now);
        if !due {
            return None;
        }
        Some(self.dispatch())
    }

    /// Analyze now, skipping the debounce window. If a request is already in
    /// flight the flush is remembered and fires as soon as it settles.
    pub fn flush(&mut self) -> Option<AnalysisRequest> {
        if self.disposed {
            return None;
        }
        if self.in_flight().is_some() {
            self.flush_requested = true;
            self.transition(Phase::Pending);
            return None;
        }
        Some(self.dispatch())
    }

    fn dispatch(&mut self) -> AnalysisRequest {
        let version = self.version();
        self.state.pending_request_version = Some(version);
        self.deadline = None;
        self.flush_requested = false;
        self.stats.dispatched += 1;
        self.transition(Phase::Resolving);
        AnalysisRequest {
            text: self.state.buffer.text().to_string(),
            version,
        }
    }

    /// Hand back the oracle's answer to the request issued for
    /// `requested_version`.
    pub fn complete(
        &mut self,
        requested_version: u64,
        response: Result<RawAnalysis, OracleError>,
    ) -> Outcome {
        if self.disposed {
            self.stats.dropped += 1;
            tracing::debug!(requested_version, "late response after dispose, dropping");
            return Outcome::Dropped;
        }
        if self.state.pending_request_version == Some(requested_version) {
            self.state.pending_request_version = None;
        }

        let current = self.version();
        let outcome = match response {
            Ok(raw) if raw.version != requested_version => {
                tracing::warn!(
                    requested_version,
                    response_version = raw.version,
                    "oracle answered with a different version, discarding"
                );
                self.discard(raw.version, current)
            }
            Ok(_) if requested_version != current => self.discard(requested_version, current),
            Ok(raw) => Outcome::Accepted(self.accept(raw)),
            Err(error) if requested_version != current => {
                tracing::debug!(requested_version, %error, "oracle failed for superseded version");
                self.discard(requested_version, current)
            }
            Err(error) => {
                self.stats.failed += 1;
                tracing::warn!(version = current, %error, "analysis failed, keeping last result");
                Outcome::Failed(AnalysisFailed {
                    version: current,
                    error,
                    last_good: self.state.last_accepted.clone(),
                })
            }
        };

        self.settle();
        outcome
    }

    fn discard(&mut self, version: u64, current: u64) -> Outcome {
        self.stats.stale += 1;
        if self.phase == Phase::Resolving && self.in_flight().is_none() {
            self.transition(Phase::Stale);
        }
        Outcome::Stale { version, current }
    }

    fn accept(&mut self, raw: RawAnalysis) -> Accepted {
        let len = self.state.buffer.len();
        let (mut spans, rejected) = validate_batch(&raw.spans, len, raw.version);
        let valid = spans.len();

        let min_severity = self.config.sensitivity.min_severity();
        spans.retain(|s| s.severity >= min_severity);
        if spans.len() > self.config.max_spans {
            tracing::warn!(
                count = spans.len(),
                max = self.config.max_spans,
                "response exceeds span cap, truncating"
            );
            spans.truncate(self.config.max_spans);
        }
        let filtered = valid - spans.len();

        let result = AnalysisResult::new(spans, raw.version);
        tracing::info!(
            version = raw.version,
            spans = result.spans().len(),
            rejected = rejected.len(),
            score = result.overall_score(),
            "analysis accepted"
        );
        self.state.last_accepted = Some(result.clone());
        self.stats.accepted += 1;

        Accepted {
            result,
            rejected,
            filtered,
        }
    }

    /// Leave Resolving/Stale once nothing is in flight.
    fn settle(&mut self) {
        if self.in_flight().is_some() {
            return;
        }
        match self.phase {
            Phase::Resolving | Phase::Stale => self.transition(Phase::Idle),
            Phase::Pending | Phase::Idle => {}
        }
    }

    fn transition(&mut self, next: Phase) {
        if self.phase != next {
            tracing::debug!(
                from = self.phase.name(),
                to = next.name(),
                version = self.version(),
                "annotator transition"
            );
            self.phase = next;
        }
    }

    /// End the session. Later responses are dropped silently.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.deadline = None;
        self.flush_requested = false;
        self.state.pending_request_version = None;
        self.transition(Phase::Idle);
    }

    /// Runs for the current buffer. Plain unless the last accepted result
    /// was computed for exactly this version.
    pub fn runs(&self) -> Result<Vec<Run<'_>>, ResolveError> {
        let buffer = &self.state.buffer;
        match &self.state.last_accepted {
            Some(result) if result.produced_from_version() == buffer.version() => {
                resolve(result.spans(), buffer.version(), buffer.len())
            }
            _ => resolve(&[], buffer.version(), buffer.len()),
        }
    }

    /// Draw instructions for the current buffer.
    pub fn draw(&self) -> Result<Vec<DrawInstruction<'_>>, ResolveError> {
        let runs = self.runs()?;
        Ok(project(&runs, &self.state.buffer))
    }
}

// =============================================================================
// Tests
// =============================================================================
