//! Browser bindings
//!
//! Mirrors the library entry points for JavaScript: a [`Program`] executes
//! inputs into witness bytes, a [`WebBackend`] (exported as `Backend`)
//! proves and verifies, and [`run`] drives the whole flow while streaming
//! progress lines to a JS callback.

use core::fmt::Display;

use circuit::Artifact;
use pipeline::Target;
use prover::{ProofData, encoding, keys};
use rand::rngs::OsRng;
use types::WitnessMap;
use wasm_bindgen::prelude::*;

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Set up panic reporting and logging to the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    wasm_log::init(wasm_log::Config::default());
}

/// Get the module version
#[wasm_bindgen]
pub fn version() -> String {
    String::from(env!("CARGO_PKG_VERSION"))
}

/// A loaded program artifact
#[wasm_bindgen]
pub struct Program {
    artifact: Artifact,
}

#[wasm_bindgen]
impl Program {
    /// Parse and validate an artifact
    #[wasm_bindgen(constructor)]
    pub fn new(artifact_json: &str) -> Result<Program, JsValue> {
        let artifact = Artifact::from_json(artifact_json).map_err(js_err)?;
        Ok(Program { artifact })
    }

    /// Program name
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.artifact.name.clone()
    }

    /// Number of wires in the circuit
    #[wasm_bindgen(getter)]
    pub fn num_witnesses(&self) -> u32 {
        self.artifact.circuit.num_witnesses()
    }

    /// Solve the witness for a JSON input object.
    ///
    /// Returns every wire as 32-byte Little-Endian field elements.
    #[wasm_bindgen]
    pub fn execute(&self, inputs_json: &str) -> Result<Vec<u8>, JsValue> {
        let execution = witness::execute_json(&self.artifact, inputs_json).map_err(js_err)?;
        execution.witness.to_bytes().map_err(js_err)
    }

    /// Decoded return value for the given inputs, as JSON text
    #[wasm_bindgen(js_name = returnValue)]
    pub fn return_value(&self, inputs_json: &str) -> Result<String, JsValue> {
        let execution = witness::execute_json(&self.artifact, inputs_json).map_err(js_err)?;
        serde_json::to_string(&execution.return_value).map_err(js_err)
    }
}

/// Proving backend for one program
#[wasm_bindgen(js_name = Backend)]
pub struct WebBackend {
    inner: prover::Backend,
}

#[wasm_bindgen(js_class = Backend)]
impl WebBackend {
    /// Generate keys for the artifact's circuit. With a seed the keys are
    /// deterministic and must only be used for development.
    #[wasm_bindgen(constructor)]
    pub fn new(artifact_json: &str, seed: Option<u64>) -> Result<WebBackend, JsValue> {
        let artifact = Artifact::from_json(artifact_json).map_err(js_err)?;
        let inner = match seed {
            Some(seed) => prover::Backend::from_seed(artifact.circuit, seed),
            None => prover::Backend::setup(artifact.circuit, &mut OsRng),
        }
        .map_err(js_err)?;
        Ok(WebBackend { inner })
    }

    /// Use an existing compressed proving key
    #[wasm_bindgen(js_name = fromProvingKey)]
    pub fn from_proving_key(artifact_json: &str, pk_bytes: &[u8]) -> Result<WebBackend, JsValue> {
        let artifact = Artifact::from_json(artifact_json).map_err(js_err)?;
        let inner = prover::Backend::from_key_bytes(artifact.circuit, pk_bytes).map_err(js_err)?;
        Ok(WebBackend { inner })
    }

    /// Number of public inputs per proof
    #[wasm_bindgen(getter)]
    pub fn num_public_inputs(&self) -> usize {
        self.inner.num_public_inputs()
    }

    /// Number of R1CS constraints
    #[wasm_bindgen(getter)]
    pub fn num_constraints(&self) -> usize {
        self.inner.num_constraints()
    }

    /// Compressed verifying key
    #[wasm_bindgen(js_name = verifyingKey)]
    pub fn verifying_key(&self) -> Result<Vec<u8>, JsValue> {
        keys::verifying_key_to_bytes(self.inner.verifying_key()).map_err(js_err)
    }

    /// Verifying key in the uncompressed on-chain layout
    #[wasm_bindgen(js_name = verifyingKeyUncompressed)]
    pub fn verifying_key_uncompressed(&self) -> Result<Vec<u8>, JsValue> {
        encoding::vk_to_uncompressed(self.inner.verifying_key()).map_err(js_err)
    }

    /// Prove witness bytes from [`Program::execute`].
    ///
    /// Returns `{ proof, public_inputs }` with hex-encoded values.
    #[wasm_bindgen(js_name = generateProof)]
    pub fn generate_proof(&self, witness: &[u8]) -> Result<JsValue, JsValue> {
        let witness = WitnessMap::from_bytes(witness).map_err(js_err)?;
        let data = self.inner.generate_proof(&witness).map_err(js_err)?;
        serde_wasm_bindgen::to_value(&data).map_err(js_err)
    }

    /// Check an object produced by `generateProof`
    #[wasm_bindgen(js_name = verifyProof)]
    pub fn verify_proof(&self, proof: JsValue) -> Result<bool, JsValue> {
        let data: ProofData = serde_wasm_bindgen::from_value(proof).map_err(js_err)?;
        self.inner.verify_proof(&data).map_err(js_err)
    }
}

/// Verify with only a compressed verifying key.
///
/// `public_inputs` holds concatenated 32-byte Little-Endian elements.
#[wasm_bindgen]
pub fn verify(vk: &[u8], proof: &[u8], public_inputs: &[u8]) -> Result<bool, JsValue> {
    let vk = keys::verifying_key_from_bytes(vk).map_err(js_err)?;
    let data = ProofData::from_bytes(proof, public_inputs).map_err(js_err)?;
    prover::verify(&vk, &data.proof, &data.public_inputs).map_err(js_err)
}

/// Re-encode a compressed proof as `A (64) || B (128) || C (64)`
#[wasm_bindgen(js_name = convertProof)]
pub fn convert_proof(proof: &[u8]) -> Result<Vec<u8>, JsValue> {
    encoding::convert_proof(proof).map_err(js_err)
}

/// Execute, prove and verify, calling `callback(target, message)` for
/// every progress line. `target` is `"logs"` or `"results"`.
///
/// Returns whether a valid proof was produced. Every failure, including an
/// artifact or input document that does not parse, is reported through the
/// callback as a single line.
#[wasm_bindgen]
pub fn run(
    artifact_json: &str,
    inputs_json: &str,
    callback: &js_sys::Function,
    seed: Option<u64>,
) -> bool {
    let mut sink = |target: Target, message: &str| {
        let target = JsValue::from_str(&target.to_string());
        if let Err(e) = callback.call2(&JsValue::NULL, &target, &JsValue::from_str(message)) {
            log::warn!("progress callback failed: {:?}", e);
        }
    };

    let outcome = match prepare(artifact_json, inputs_json, seed) {
        Ok((artifact, inputs, backend)) => pipeline::run(&artifact, &inputs, &backend, &mut sink),
        Err(e) => pipeline::fail(&mut sink, e),
    };
    outcome.is_valid()
}

/// Load the artifact once, parse the inputs and generate keys
fn prepare(
    artifact_json: &str,
    inputs_json: &str,
    seed: Option<u64>,
) -> Result<(Artifact, serde_json::Value, prover::Backend), String> {
    let artifact = Artifact::from_json(artifact_json).map_err(|e| e.to_string())?;
    let inputs = serde_json::from_str(inputs_json).map_err(|e| e.to_string())?;
    let backend = match seed {
        Some(seed) => prover::Backend::from_seed(artifact.circuit.clone(), seed),
        None => prover::Backend::setup(artifact.circuit.clone(), &mut OsRng),
    }
    .map_err(|e| e.to_string())?;
    Ok((artifact, inputs, backend))
}
