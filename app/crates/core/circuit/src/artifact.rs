//! Compiled program artifacts
//!
//! An artifact is the JSON document a circuit compiler emits: the circuit,
//! its ABI and a SHA-256 hash of the circuit. Loading checks the hash to
//! detect tampering; `zkrun setup` stores it as `<name>.hash` beside the keys
//! so later commands can refuse keys made for another circuit.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CircuitError, abi::Abi, circuit::Circuit};

/// A compiled program
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Program name
    pub name: String,
    /// Version of the compiler or program
    #[serde(default)]
    pub version: String,
    /// Hex SHA-256 of the canonical circuit JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Parameter and return types
    pub abi: Abi,
    /// The constraint system
    pub circuit: Circuit,
}

impl Artifact {
    /// Assemble an artifact and stamp its hash
    pub fn new(name: impl Into<String>, abi: Abi, circuit: Circuit) -> Result<Self, CircuitError> {
        let mut artifact = Artifact {
            name: name.into(),
            version: String::from(env!("CARGO_PKG_VERSION")),
            hash: None,
            abi,
            circuit,
        };
        artifact.validate()?;
        artifact.hash = Some(artifact.compute_hash()?);
        Ok(artifact)
    }

    /// Parse and validate an artifact from JSON
    pub fn from_json(json: &str) -> Result<Self, CircuitError> {
        let artifact: Artifact = serde_json::from_str(json)?;
        artifact.verify_hash()?;
        artifact.validate()?;
        log::debug!(
            "loaded artifact {} ({} wires, {} opcodes)",
            artifact.name,
            artifact.circuit.num_witnesses(),
            artifact.circuit.opcodes.len()
        );
        Ok(artifact)
    }

    /// Read, parse and validate an artifact file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CircuitError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, CircuitError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Hex SHA-256 of the circuit's canonical JSON encoding
    pub fn compute_hash(&self) -> Result<String, CircuitError> {
        let canonical = serde_json::to_vec(&self.circuit)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }

    /// Compare the recorded hash, if any, with the circuit
    pub fn verify_hash(&self) -> Result<(), CircuitError> {
        let Some(expected) = &self.hash else {
            return Ok(());
        };
        let actual = self.compute_hash()?;
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(CircuitError::HashMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Check the circuit and its agreement with the ABI
    pub fn validate(&self) -> Result<(), CircuitError> {
        self.circuit.validate()?;
        self.abi.check_circuit(&self.circuit)
    }
}
