use strum::VariantNames;
use wasm_bindgen::prelude::*;

use crate::clock::FixedClock;
use crate::diagnostics::{DiagnosticEngine, ErrorKind};
use crate::programs::ProgramRegistry;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = JSON)]
    fn parse(s: &str) -> JsValue;
}

fn to_js<T: serde::Serialize>(value: &T) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json_str) => parse(&json_str),
        Err(_) => JsValue::NULL,
    }
}

fn error_result(msg: &str) -> JsValue {
    let obj = serde_json::json!({"error": msg});
    to_js(&obj)
}

/// Diagnose a `getTransaction` JSON result. `now_unix` is the caller's
/// current time in seconds, since wasm has no system clock.
#[wasm_bindgen]
pub fn diagnose_transaction(signature: &str, json: &str, now_unix: f64) -> JsValue {
    let engine = match DiagnosticEngine::standard() {
        Ok(engine) => engine.with_clock(FixedClock(now_unix as i64)),
        Err(e) => return error_result(&e.to_string()),
    };
    match engine.diagnose_json(signature, json) {
        Ok(report) => to_js(&report),
        Err(e) => error_result(&e.to_string()),
    }
}

/// Display name for a program address, or "Unknown Program".
#[wasm_bindgen]
pub fn program_name(address: &str) -> String {
    ProgramRegistry::well_known().name(address).to_string()
}

/// Names of every finding kind a report can contain.
#[wasm_bindgen]
pub fn error_kinds() -> JsValue {
    to_js(&ErrorKind::VARIANTS)
}
