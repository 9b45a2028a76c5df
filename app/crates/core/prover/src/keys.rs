//! Circuit-specific Groth16 key generation and key (de)serialization

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::CircuitSpecificSetupSNARK;
use circuit::Circuit;
use rand::{CryptoRng, RngCore, SeedableRng, rngs::StdRng};

use crate::{ProverError, synthesis::CircuitSynthesizer};

/// Run the trusted setup for `circuit` with the given randomness
pub fn setup<R: RngCore + CryptoRng>(
    circuit: &Circuit,
    rng: &mut R,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ProverError> {
    let (pk, vk) = Groth16::<Bn254>::setup(CircuitSynthesizer::for_setup(circuit), rng)
        .map_err(|e| ProverError::Setup(e.to_string()))?;
    log::debug!(
        "generated keys for {} public inputs",
        vk.gamma_abc_g1.len().saturating_sub(1)
    );
    Ok((pk, vk))
}

/// Setup from a fixed seed.
///
/// Anyone knowing the seed can forge proofs; only for development and tests.
pub fn setup_with_seed(
    circuit: &Circuit,
    seed: u64,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ProverError> {
    let mut rng = StdRng::seed_from_u64(seed);
    setup(circuit, &mut rng)
}

/// Compressed proving key bytes
pub fn proving_key_to_bytes(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, ProverError> {
    let mut bytes = Vec::new();
    pk.serialize_compressed(&mut bytes)
        .map_err(|e| ProverError::Key(format!("Failed to serialize proving key: {}", e)))?;
    Ok(bytes)
}

/// Load a proving key without point validation; proving keys are trusted
pub fn proving_key_from_bytes(bytes: &[u8]) -> Result<ProvingKey<Bn254>, ProverError> {
    ProvingKey::<Bn254>::deserialize_compressed_unchecked(bytes)
        .map_err(|e| ProverError::Key(format!("Failed to load proving key: {}", e)))
}

/// Compressed verifying key bytes
pub fn verifying_key_to_bytes(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ProverError> {
    let mut bytes = Vec::new();
    vk.serialize_compressed(&mut bytes)
        .map_err(|e| ProverError::Key(format!("Failed to serialize verifying key: {}", e)))?;
    Ok(bytes)
}

/// Load and validate a verifying key
pub fn verifying_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ProverError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ProverError::Key(format!("Failed to load verifying key: {}", e)))
}

/// Number of public inputs a verifying key expects
pub fn num_public_inputs(vk: &VerifyingKey<Bn254>) -> usize {
    vk.gamma_abc_g1.len().saturating_sub(1)
}

/// Reject keys generated for a circuit with a different public input count
pub fn check_key(circuit: &Circuit, vk: &VerifyingKey<Bn254>) -> Result<(), ProverError> {
    let expected = circuit.public_inputs().len();
    let actual = num_public_inputs(vk);
    if expected != actual {
        return Err(ProverError::Key(format!(
            "key expects {} public inputs, circuit has {}",
            actual, expected
        )));
    }
    Ok(())
}
