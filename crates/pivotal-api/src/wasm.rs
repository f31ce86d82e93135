//! WASM bindings for the browser front end.

use wasm_bindgen::prelude::*;

use crate::handler;

/// Solve a JSON request and return the response body with its status code.
#[wasm_bindgen]
pub fn solve(request: &str) -> Result<JsValue, JsValue> {
    let response = handler::handle(request);
    let envelope = Envelope {
        status_code: response.status_code,
        body: &response.body,
    };
    serde_wasm_bindgen::to_value(&envelope).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(serde::Serialize)]
struct Envelope<'a> {
    status_code: u16,
    body: &'a crate::response::SolveResponse,
}

/// Validate a JSON request and return the list of problems found
#[wasm_bindgen]
pub fn validate(request: &str) -> JsValue {
    let problems = handler::validate(request);
    serde_wasm_bindgen::to_value(&problems).unwrap_or(JsValue::NULL)
}

/// Format a number the way tableau cells are shown
#[wasm_bindgen]
pub fn format_number(value: f64) -> String {
    crate::display::format_number(value)
}
