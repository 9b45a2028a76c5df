//! Witness generation
//!
//! Encodes a program's JSON inputs onto its parameter wires and runs the
//! circuit's opcodes to derive every other wire.

pub mod inputs;
pub mod solver;

pub use inputs::{InputError, decode_value, encode_inputs, encode_value};
pub use solver::solve;

use circuit::{Artifact, CircuitError};
use serde_json::Value;
use types::{Witness, WitnessMap};

/// Errors raised while generating a witness
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// Known values violate a constraint; the inputs do not satisfy the
    /// circuit
    #[error("Cannot satisfy constraint {opcode_index}: {reason}")]
    UnsatisfiableConstraint {
        /// Position of the failing opcode
        opcode_index: usize,
        /// What went wrong
        reason: String,
    },
    /// The opcode cannot be solved with the wires known so far
    #[error("Cannot solve opcode {opcode_index}: {reason}")]
    Unsolvable {
        /// Position of the stuck opcode
        opcode_index: usize,
        /// What is missing
        reason: String,
    },
    /// A wire has no value after solving
    #[error("wire {0} was never assigned")]
    MissingAssignment(Witness),
    /// The inputs do not match the ABI
    #[error(transparent)]
    Input(#[from] InputError),
    /// The artifact is malformed
    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// Result of running a program on concrete inputs
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    /// Full assignment of every wire
    pub witness: WitnessMap,
    /// Decoded return value, if the program has one
    pub return_value: Option<Value>,
}

/// Encode `inputs` against the artifact's ABI and solve the circuit
pub fn execute(artifact: &Artifact, inputs: &Value) -> Result<Execution, SolverError> {
    let initial = encode_inputs(&artifact.abi, inputs)?;
    let witness = solve(&artifact.circuit, initial)?;

    let return_value = match &artifact.abi.return_type {
        Some(ret) => {
            let values = artifact
                .circuit
                .return_values
                .iter()
                .map(|w| {
                    witness
                        .get(w)
                        .copied()
                        .ok_or(SolverError::MissingAssignment(*w))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(decode_value(&ret.abi_type, &values)?)
        }
        None => None,
    };
    log::debug!(
        "executed {}: {} wires assigned",
        artifact.name,
        witness.len()
    );
    Ok(Execution {
        witness,
        return_value,
    })
}

/// Parse the input document and execute
pub fn execute_json(artifact: &Artifact, inputs: &str) -> Result<Execution, SolverError> {
    let inputs: Value = serde_json::from_str(inputs).map_err(InputError::from)?;
    execute(artifact, &inputs)
}
