//! Biasbuster Core: span annotation engine for bias highlighting
//!
//! A Rust/WASM implementation of the Biasbuster highlighting pipeline. An
//! external detector reports possibly-biased ranges of a text; this crate
//! validates them, flattens overlaps, scores the result and keeps it in step
//! with a text that is still being edited.
//!
//! # Architecture
//!
//! ## Span Pipeline
//! - `buffer.rs` - TextBuffer: versioned text with UTF-16 offsets
//! - `span.rs` - Span model and batch validation
//! - `resolver.rs` - Overlap resolver: boundary sweep into disjoint runs
//! - `score.rs` - Score aggregator: overall score and per-category counts
//! - `projection.rs` - Render projection: runs → draw instructions
//!
//! ## Session
//! - `annotator.rs` - Annotator: debounced, version-checked re-analysis
//! - `oracle.rs` - Oracle contract for the detection service
//! - `session.rs` - Session: annotator + oracle, async driver
//! - `config.rs` - Configuration types and presets
//!
//! ## Detectors and Reporting
//! - `locator.rs` - SentenceLocator: sentence-form responses → offsets (Aho-Corasick)
//! - `lexicon.rs` - LexiconOracle: local keyword detection (regex)
//! - `summary.rs` - Human-readable analysis summary
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { WasmAnnotator, WasmLexicon } from 'biasbuster-core';
//!
//! await init();
//!
//! const annotator = new WasmAnnotator({ debounce_ms: 500 });
//! const lexicon = new WasmLexicon();
//!
//! editor.oninput = () => {
//!   annotator.mutate(editor.value);
//!   setTimeout(tick, annotator.nextDelayMs() ?? 0);
//! };
//!
//! async function tick() {
//!   const request = annotator.poll();
//!   if (!request) return;
//!   const response = lexicon.detect(request.text, request.version);
//!   const { outcome, draw, summary } = annotator.complete(request.version, response);
//!   paint(draw);   // [{ start, end, text, annotation, max_severity }]
//! }
//! ```

pub mod highlight;

pub use highlight::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("biasbuster-core v{}", env!("CARGO_PKG_VERSION"))
}
