//! Uncompressed big-endian encodings for on-chain verifiers
//!
//! EVM precompiles (and chains that copy them) expect points as raw
//! coordinates: G1 as `x || y`, G2 as `x.c1 || x.c0 || y.c1 || y.c0`, each
//! coordinate 32 bytes big-endian. Arkworks orders G2 coefficients `c0, c1`,
//! so they are swapped here. The point at infinity encodes as all zeros.

use ark_bn254::{Bn254, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;

use crate::{ProverError, proof::UNCOMPRESSED_PROOF_SIZE};

/// Size of the verifying key header: alpha (64), beta, gamma, delta (128
/// each) and the 4-byte IC count
const VK_HEADER_SIZE: usize = 452;

fn bigint_to_be_32<B: BigInteger>(value: B) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    out[start..].copy_from_slice(&bytes[..bytes.len().min(32)]);
    out
}

/// G1 point as `x || y`
pub fn g1_to_bytes(p: &G1Affine) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&bigint_to_be_32(p.x.into_bigint()));
    out[32..].copy_from_slice(&bigint_to_be_32(p.y.into_bigint()));
    out
}

/// G2 point as `x.c1 || x.c0 || y.c1 || y.c0`
pub fn g2_to_bytes(p: &G2Affine) -> [u8; 128] {
    let mut out = [0u8; 128];
    out[..32].copy_from_slice(&bigint_to_be_32(p.x.c1.into_bigint()));
    out[32..64].copy_from_slice(&bigint_to_be_32(p.x.c0.into_bigint()));
    out[64..96].copy_from_slice(&bigint_to_be_32(p.y.c1.into_bigint()));
    out[96..].copy_from_slice(&bigint_to_be_32(p.y.c0.into_bigint()));
    out
}

/// `A (64) || B (128) || C (64)`
pub fn proof_to_uncompressed(proof: &Proof<Bn254>) -> Vec<u8> {
    let mut out = Vec::with_capacity(UNCOMPRESSED_PROOF_SIZE);
    out.extend_from_slice(&g1_to_bytes(&proof.a));
    out.extend_from_slice(&g2_to_bytes(&proof.b));
    out.extend_from_slice(&g1_to_bytes(&proof.c));
    out
}

/// Re-encode a compressed proof for on-chain use
pub fn convert_proof(proof_bytes: &[u8]) -> Result<Vec<u8>, ProverError> {
    let proof = Proof::<Bn254>::deserialize_compressed(proof_bytes)
        .map_err(|e| ProverError::MalformedProof(e.to_string()))?;
    Ok(proof_to_uncompressed(&proof))
}

/// `alpha | beta | gamma | delta | ic_count (u32 LE) | ic[]`
pub fn vk_to_uncompressed(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ProverError> {
    let ic_count = vk.gamma_abc_g1.len();
    let total = ic_count
        .checked_mul(64)
        .and_then(|ic| ic.checked_add(VK_HEADER_SIZE))
        .ok_or_else(|| ProverError::Key(String::from("IC count overflow")))?;
    let ic_count = u32::try_from(ic_count)
        .map_err(|_| ProverError::Key(String::from("IC count does not fit in u32")))?;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&g1_to_bytes(&vk.alpha_g1));
    out.extend_from_slice(&g2_to_bytes(&vk.beta_g2));
    out.extend_from_slice(&g2_to_bytes(&vk.gamma_g2));
    out.extend_from_slice(&g2_to_bytes(&vk.delta_g2));
    out.extend_from_slice(&ic_count.to_le_bytes());
    for ic in &vk.gamma_abc_g1 {
        out.extend_from_slice(&g1_to_bytes(ic));
    }
    Ok(out)
}
