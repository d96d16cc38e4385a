//! WASM bindings
//!
//! `WasmAnnotator` exposes the sans-IO state machine: the page calls
//! `mutate` on input, `poll` from a timer, sends the request itself and
//! reports back with `complete` or `fail`. `analyzeWithOracle` is the
//! one-shot path for callers that just want an answer for a string.

use instant::Instant;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::highlight::annotator::{Annotator, Outcome};
use crate::highlight::buffer::TextBuffer;
use crate::highlight::config::AnnotatorConfig;
use crate::highlight::error::OracleError;
use crate::highlight::lexicon::{LexiconConfig, LexiconEntry, LexiconOracle};
use crate::highlight::locator::SentenceAnalysis;
use crate::highlight::oracle::{AnalysisRequest, Oracle, RawAnalysis};
use crate::highlight::projection::{project, DrawInstruction};
use crate::highlight::resolver::resolve;
use crate::highlight::score::AnalysisResult;
use crate::highlight::session::Session;
use crate::highlight::span::{validate_batch, RawSpan};
use crate::highlight::summary::{summarize, AnalysisSummary};

// =============================================================================
// Conversions
// =============================================================================

/// Plain JS objects for maps, numbers for u64.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_config(config: JsValue) -> Result<AnnotatorConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(AnnotatorConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))
}

fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: &'a Outcome,
    draw: Vec<DrawInstruction<'a>>,
    summary: Option<AnalysisSummary>,
}

fn report(annotator: &Annotator, outcome: &Outcome) -> Result<JsValue, JsValue> {
    let draw = annotator
        .draw()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let summary = annotator.last_accepted().map(summarize);
    to_js(&Report {
        outcome,
        draw,
        summary,
    })
}

// =============================================================================
// WasmAnnotator
// =============================================================================

#[wasm_bindgen]
pub struct WasmAnnotator {
    inner: Annotator,
}

#[wasm_bindgen]
impl WasmAnnotator {
    /// `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmAnnotator, JsValue> {
        Ok(WasmAnnotator {
            inner: Annotator::new(parse_config(config)?),
        })
    }

    #[wasm_bindgen(js_name = "withText")]
    pub fn with_text(text: String, config: JsValue) -> Result<WasmAnnotator, JsValue> {
        Ok(WasmAnnotator {
            inner: Annotator::with_text(parse_config(config)?, text),
        })
    }

    /// Returns false when the text was unchanged.
    #[wasm_bindgen(js_name = "mutate")]
    pub fn js_mutate(&mut self, text: String) -> bool {
        self.inner.mutate(text, Instant::now())
    }

    /// `{ text, version }` when a request is due, otherwise `null`.
    #[wasm_bindgen(js_name = "poll")]
    pub fn js_poll(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.poll(Instant::now()) {
            Some(request) => to_js(&request),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = "flush")]
    pub fn js_flush(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.flush() {
            Some(request) => to_js(&request),
            None => Ok(JsValue::NULL),
        }
    }

    /// Milliseconds until `poll` should be called, or `undefined`.
    #[wasm_bindgen(js_name = "nextDelayMs")]
    pub fn next_delay_ms(&self) -> Option<f64> {
        let now = Instant::now();
        self.inner.next_deadline().map(|deadline| {
            if deadline > now {
                (deadline - now).as_secs_f64() * 1000.0
            } else {
                0.0
            }
        })
    }

    /// Hand back an offset-form response `{ version, spans }`. A response
    /// that fails to decode counts as a malformed oracle failure.
    #[wasm_bindgen(js_name = "complete")]
    pub fn js_complete(&mut self, version: f64, response: JsValue) -> Result<JsValue, JsValue> {
        let result: Result<RawAnalysis, OracleError> = serde_wasm_bindgen::from_value(response)
            .map_err(|e| OracleError::Malformed(e.to_string()));
        let outcome = self.inner.complete(version as u64, result);
        report(&self.inner, &outcome)
    }

    /// Hand back a sentence-form response `{ version, instances }`.
    #[wasm_bindgen(js_name = "completeSentences")]
    pub fn js_complete_sentences(&mut self, version: f64, response: JsValue) -> Result<JsValue, JsValue> {
        let result = serde_wasm_bindgen::from_value::<SentenceAnalysis>(response)
            .map(|analysis| analysis.into_raw(self.inner.buffer().text()))
            .map_err(|e| OracleError::Malformed(e.to_string()));
        let outcome = self.inner.complete(version as u64, result);
        report(&self.inner, &outcome)
    }

    /// Report a transport failure for the request at `version`.
    #[wasm_bindgen(js_name = "fail")]
    pub fn js_fail(&mut self, version: f64, message: String) -> Result<JsValue, JsValue> {
        let outcome = self
            .inner
            .complete(version as u64, Err(OracleError::Transport(message)));
        report(&self.inner, &outcome)
    }

    #[wasm_bindgen(js_name = "draw")]
    pub fn js_draw(&self) -> Result<JsValue, JsValue> {
        let draw = self
            .inner
            .draw()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&draw)
    }

    #[wasm_bindgen(js_name = "lastResult")]
    pub fn last_result(&self) -> Result<JsValue, JsValue> {
        match self.inner.last_accepted() {
            Some(result) => to_js(result),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = "summary")]
    pub fn js_summary(&self) -> Result<JsValue, JsValue> {
        match self.inner.last_accepted() {
            Some(result) => to_js(&summarize(result)),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = "version")]
    pub fn js_version(&self) -> f64 {
        self.inner.version() as f64
    }

    #[wasm_bindgen(js_name = "phaseName")]
    pub fn phase_name(&self) -> String {
        self.inner.phase().name().to_string()
    }

    #[wasm_bindgen(js_name = "stats")]
    pub fn js_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.stats())
    }

    #[wasm_bindgen(js_name = "dispose")]
    pub fn js_dispose(&mut self) {
        self.inner.dispose();
    }
}

// =============================================================================
// WasmLexicon
// =============================================================================

#[wasm_bindgen]
pub struct WasmLexicon {
    inner: LexiconOracle,
}

#[wasm_bindgen]
impl WasmLexicon {
    /// `config` is `{ categories: { name: [{ word, severity?, suggestion? }] } }`
    /// or `undefined` for the built-in word lists.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmLexicon, JsValue> {
        let inner = if config.is_undefined() || config.is_null() {
            LexiconOracle::default()
        } else {
            let config: LexiconConfig = serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse lexicon: {}", e)))?;
            LexiconOracle::new(&config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        Ok(WasmLexicon { inner })
    }

    /// Offset-form analysis of `text`, ready for `WasmAnnotator.complete`.
    #[wasm_bindgen(js_name = "detect")]
    pub fn js_detect(&self, text: &str, version: f64) -> Result<JsValue, JsValue> {
        to_js(&self.inner.detect(text, version as u64))
    }

    #[wasm_bindgen(js_name = "setCategory")]
    pub fn set_category(&mut self, category: &str, entries: JsValue) -> Result<(), JsValue> {
        let entries: Vec<LexiconEntry> = serde_wasm_bindgen::from_value(entries)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse entries: {}", e)))?;
        self.inner
            .set_category(category, &entries)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "patternCount")]
    pub fn pattern_count(&self) -> usize {
        self.inner.pattern_count()
    }
}

// =============================================================================
// Stateless helpers
// =============================================================================

/// Validate, resolve and project `spans` over `text` in one call.
#[wasm_bindgen(js_name = "renderSpans")]
pub fn render_spans(text: String, spans: JsValue) -> Result<JsValue, JsValue> {
    let raw: Vec<RawSpan> = serde_wasm_bindgen::from_value(spans)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse spans: {}", e)))?;
    let buffer = TextBuffer::new(text);
    let (valid, _) = validate_batch(&raw, buffer.len(), buffer.version());
    let runs = resolve(&valid, buffer.version(), buffer.len())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&project(&runs, &buffer))
}

/// Score and summary for an offset-form span list over `text`.
#[wasm_bindgen(js_name = "summarizeSpans")]
pub fn summarize_spans(text: String, spans: JsValue) -> Result<JsValue, JsValue> {
    let raw: Vec<RawSpan> = serde_wasm_bindgen::from_value(spans)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse spans: {}", e)))?;
    let buffer = TextBuffer::new(text);
    let (valid, _) = validate_batch(&raw, buffer.len(), buffer.version());
    to_js(&summarize(&AnalysisResult::new(valid, buffer.version())))
}

// =============================================================================
// JS oracle
// =============================================================================

/// Oracle backed by a JS function `(request) => response | Promise<response>`.
struct JsOracle {
    callback: js_sys::Function,
}

impl Oracle for JsOracle {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis, OracleError> {
        let arg = to_js(request).map_err(|e| OracleError::Transport(js_error_message(&e)))?;
        let returned = self
            .callback
            .call1(&JsValue::NULL, &arg)
            .map_err(|e| OracleError::Transport(js_error_message(&e)))?;

        let value = match returned.dyn_into::<js_sys::Promise>() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .map_err(|e| OracleError::Transport(js_error_message(&e)))?,
            Err(value) => value,
        };
        serde_wasm_bindgen::from_value(value).map_err(|e| OracleError::Malformed(e.to_string()))
    }
}

/// Analyze `text` once through a JS oracle and return
/// `{ outcome, draw, summary }`.
#[wasm_bindgen(js_name = "analyzeWithOracle")]
pub async fn analyze_with_oracle(
    text: String,
    oracle: js_sys::Function,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    let config = parse_config(config)?;
    let mut session = Session::with_text(JsOracle { callback: oracle }, config, text);
    let outcome = session.analyze_now().await.unwrap_or(Outcome::Dropped);
    report(session.annotator(), &outcome)
}
