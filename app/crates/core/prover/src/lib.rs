//! Groth16 proving engine and verifier over BN254
//!
//! Circuits are lowered to R1CS by [`synthesis::CircuitSynthesizer`] and
//! proven with arkworks. Proofs travel as compressed `[A || B || C]` bytes
//! alongside their public inputs ([`ProofData`]); [`encoding`] re-encodes
//! proofs and verifying keys for EVM-style on-chain verifiers.

pub mod encoding;
pub mod keys;
pub mod proof;
pub mod prover;
pub mod synthesis;

pub use ark_groth16::{ProvingKey, VerifyingKey};
pub use proof::{PROOF_SIZE, ProofData, UNCOMPRESSED_PROOF_SIZE};
pub use prover::{Backend, verify};
pub use synthesis::CircuitSynthesizer;

/// Errors raised by setup, proving and verification
#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// Key generation failed
    #[error("Setup failed: {0}")]
    Setup(String),
    /// A key could not be (de)serialized or does not fit the circuit
    #[error("Invalid key: {0}")]
    Key(String),
    /// The witness is malformed or does not satisfy the circuit
    #[error("Proving failed: {0}")]
    Proving(String),
    /// Proof bytes are not a well-formed proof
    #[error("Malformed proof: {0}")]
    MalformedProof(String),
    /// Public inputs have the wrong count or encoding
    #[error("Public input mismatch: {0}")]
    PublicInputs(String),
    /// The pairing check could not be evaluated
    #[error("Verification error: {0}")]
    Verification(String),
    /// Field element encoding error
    #[error(transparent)]
    Types(#[from] types::TypesError),
}
