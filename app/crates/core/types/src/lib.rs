//! Shared types
//!
//! Wire identifiers, witness maps and the BN254 scalar field codecs used by
//! the circuit, witness and prover crates.
//!
//! All byte encodings of field elements are 32-byte Little-Endian, matching
//! Arkworks' canonical representation.

pub mod field;
pub mod witness;

pub use ark_bn254::Fr;
pub use field::{
    FIELD_SIZE, field_from_bigint, fr_from_le_bytes, fr_to_bigint, fr_to_hex, fr_to_le_bytes,
    parse_bigint, parse_field,
};
pub use witness::{Witness, WitnessMap};

/// Errors raised by the codecs in this crate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// A byte buffer did not have the expected length
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },
    /// Bytes encode an integer that is not smaller than the field modulus
    #[error("value is not a canonical field element")]
    NonCanonical,
    /// A string could not be parsed as a field element
    #[error("invalid field element string: {0}")]
    InvalidFieldString(String),
    /// A witness map does not cover the wires `0..len` without gaps
    #[error("witness map is not contiguous: wire {missing} is unassigned")]
    NonContiguous {
        /// First wire missing from the map
        missing: u32,
    },
}
