//! Browser integration tests for the WASM facade.

#![cfg(target_arch = "wasm32")]

use circuit::{AbiType, AbiVisibility, CircuitBuilder};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web::{Program, WebBackend};

wasm_bindgen_test_configure!(run_in_browser);

/// `x * x == y` with `y` public
fn artifact_json() -> String {
    let mut b = CircuitBuilder::new();
    let x = b
        .add_parameter("x", AbiType::Field, AbiVisibility::Private)
        .unwrap()[0];
    let y = b
        .add_parameter("y", AbiType::Field, AbiVisibility::Public)
        .unwrap()[0];
    let sq = b.mul(x, x);
    b.assert_equal(sq, y);
    b.build_artifact("square").unwrap().to_json().unwrap()
}

#[wasm_bindgen_test]
fn test_version() {
    assert!(!web::version().is_empty());
}

#[wasm_bindgen_test]
fn test_execute_prove_verify() {
    let json = artifact_json();
    let program = Program::new(&json).unwrap();
    let witness = program.execute(r#"{"x": 4, "y": 16}"#).unwrap();
    assert_eq!(witness.len(), 3 * 32);

    let backend = WebBackend::new(&json, Some(11)).unwrap();
    let proof = backend.generate_proof(&witness).unwrap();
    assert!(backend.verify_proof(proof).unwrap());
}

#[wasm_bindgen_test]
fn test_execute_reports_unsatisfied_inputs() {
    let program = Program::new(&artifact_json()).unwrap();
    let err = program.execute(r#"{"x": 4, "y": 15}"#).unwrap_err();
    assert!(err.as_string().unwrap().starts_with("Cannot satisfy constraint"));
}

#[wasm_bindgen_test]
fn test_run_streams_progress() {
    let lines = js_sys::Array::new();
    let sink = lines.clone();
    let callback = wasm_bindgen::closure::Closure::<dyn FnMut(JsValue, JsValue)>::new(
        move |_target: JsValue, message: JsValue| {
            sink.push(&message);
        },
    );
    let valid = web::run(
        &artifact_json(),
        r#"{"x": 3, "y": 9}"#,
        callback.as_ref().unchecked_ref(),
        Some(3),
    );
    assert!(valid);
    assert_eq!(lines.length(), 7);
    assert_eq!(
        lines.get(6).as_string().unwrap(),
        pipeline::messages::PROOF_VALID
    );
}

#[wasm_bindgen_test]
fn test_run_reports_bad_artifact() {
    let lines = js_sys::Array::new();
    let sink = lines.clone();
    let callback = wasm_bindgen::closure::Closure::<dyn FnMut(JsValue, JsValue)>::new(
        move |_target: JsValue, message: JsValue| {
            sink.push(&message);
        },
    );
    // Tamper with the circuit so the recorded hash no longer matches
    let tampered = artifact_json().replacen(
        "\"current_witness_index\": 2",
        "\"current_witness_index\": 3",
        1,
    );
    let valid = web::run(
        &tampered,
        r#"{"x": 3, "y": 9}"#,
        callback.as_ref().unchecked_ref(),
        Some(3),
    );
    assert!(!valid);
    assert_eq!(lines.length(), 1);
    assert!(lines
        .get(0)
        .as_string()
        .unwrap()
        .starts_with(pipeline::messages::FAILURE_PREFIX));
}
