//! Binding tests, run with `wasm-pack test --node`.
#![cfg(target_arch = "wasm32")]

use biasbuster_core::{render_spans, WasmAnnotator, WasmLexicon};
use js_sys::{Array, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn test_flush_complete_draw() {
    let mut annotator = WasmAnnotator::with_text("The chairman spoke.".into(), JsValue::UNDEFINED).unwrap();
    let lexicon = WasmLexicon::new(JsValue::UNDEFINED).unwrap();

    let request = annotator.js_flush().unwrap();
    let text = get(&request, "text").as_string().unwrap();
    let version = get(&request, "version").as_f64().unwrap();
    assert_eq!(annotator.phase_name(), "resolving");

    let response = lexicon.js_detect(&text, version).unwrap();
    let report = annotator.js_complete(version, response).unwrap();
    assert_eq!(get(&get(&report, "outcome"), "kind").as_string().as_deref(), Some("accepted"));

    let draw: Array = get(&report, "draw").into();
    assert_eq!(draw.length(), 3);
    assert_eq!(get(&draw.get(1), "text").as_string().as_deref(), Some("chairman"));
    assert_eq!(annotator.phase_name(), "idle");
}

#[wasm_bindgen_test]
fn test_fail_reports_failure() {
    let mut annotator = WasmAnnotator::with_text("offline".into(), JsValue::UNDEFINED).unwrap();
    let request = annotator.js_flush().unwrap();
    let version = get(&request, "version").as_f64().unwrap();
    let report = annotator.js_fail(version, "network down".into()).unwrap();
    assert_eq!(get(&get(&report, "outcome"), "kind").as_string().as_deref(), Some("failed"));
}

#[wasm_bindgen_test]
fn test_bad_config_is_an_error() {
    let config = js_sys::JSON::parse(r#"{"sensitivity": "paranoid"}"#).unwrap();
    assert!(WasmAnnotator::new(config).is_err());
}

#[wasm_bindgen_test]
fn test_render_spans_partitions_text() {
    let spans = js_sys::JSON::parse(r#"[{"start": 0, "end": 4, "category": "a", "severity": 1, "explanation": ""}]"#).unwrap();
    let draw: Array = render_spans("abcdefgh".into(), spans).unwrap().into();
    assert_eq!(draw.length(), 2);
}
