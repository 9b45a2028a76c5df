//! Circuit representation
//!
//! A circuit is an ordered list of [`Opcode`]s over numbered wires
//! ([`types::Witness`]). Arithmetic constraints are quadratic
//! [`Expression`]s asserted to be zero; range constraints bound a wire to a
//! number of bits; directives are unconstrained hints the witness solver uses
//! to compute values that are awkward to derive from constraints alone.
//!
//! A compiled program is shipped as an [`Artifact`]: the circuit together
//! with the [`Abi`] describing how named inputs map onto wires.

pub mod abi;
pub mod artifact;
pub mod builder;
pub mod circuit;
pub mod hash;
pub mod opcodes;
pub mod r1cs;

pub use abi::{Abi, AbiField, AbiParameter, AbiType, AbiVisibility, IntegerSign};
pub use artifact::Artifact;
pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use hash::mimc7;
pub use opcodes::{Directive, Expression, LinearTerm, MulTerm, Opcode};

use types::Witness;

/// Largest bit width a range constraint may use.
///
/// Recomposing more bits than this could wrap around the BN254 modulus.
pub const MAX_RANGE_BITS: u32 = 253;

/// Errors raised while loading or validating circuits
#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    /// An opcode references a wire beyond `current_witness_index`
    #[error("opcode {opcode_index} references {witness}, beyond the last wire {last}")]
    WitnessOutOfRange {
        /// Position of the opcode in the circuit
        opcode_index: usize,
        /// Offending wire
        witness: Witness,
        /// Highest wire the circuit declares
        last: Witness,
    },
    /// A parameter or return wire is beyond `current_witness_index`
    #[error("parameter {0} is beyond the last wire")]
    ParameterOutOfRange(Witness),
    /// A range constraint with an unsupported width
    #[error("opcode {opcode_index}: range width {num_bits} not in 1..=253")]
    InvalidRange {
        /// Position of the opcode in the circuit
        opcode_index: usize,
        /// Requested width
        num_bits: u32,
    },
    /// A radix decomposition with an unsupported radix
    #[error("opcode {opcode_index}: radix {radix} must be a power of two in 2..=256")]
    InvalidRadix {
        /// Position of the opcode in the circuit
        opcode_index: usize,
        /// Requested radix
        radix: u32,
    },
    /// An integer parameter or return type wider than a range constraint allows
    #[error("{name}: integer width {width} not in 1..=253")]
    InvalidIntegerWidth {
        /// Parameter path
        name: String,
        /// Declared width
        width: u32,
    },
    /// A wire is declared both public and private, or twice
    #[error("wire {0} is declared as a parameter more than once")]
    DuplicateParameter(Witness),
    /// The ABI does not describe the circuit's parameters
    #[error("ABI mismatch: {0}")]
    AbiMismatch(String),
    /// The artifact hash does not match its circuit
    #[error("artifact hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch {
        /// Hash recorded in the artifact
        expected: String,
        /// Hash of the circuit as loaded
        actual: String,
    },
    /// Parameters must be allocated before any other wire
    #[error("parameter {0} declared after intermediate wires were allocated")]
    ParameterAfterWitness(String),
    /// The binary R1CS file is malformed or unsupported
    #[error("invalid R1CS: {0}")]
    InvalidR1cs(String),
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading an artifact failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
