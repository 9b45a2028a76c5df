//! Proof container shared by the prover and its callers

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use types::{FIELD_SIZE, field::field_vec_serde, fr_from_le_bytes, fr_to_le_bytes};

use crate::ProverError;

/// Size of a compressed Groth16 proof over BN254: A (32) || B (64) || C (32)
pub const PROOF_SIZE: usize = 128;

/// Size of an uncompressed proof: A (64) || B (128) || C (64)
pub const UNCOMPRESSED_PROOF_SIZE: usize = 256;

/// A proof together with the public inputs it was generated for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData {
    /// Compressed proof bytes `[A || B || C]`
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
    /// Public inputs in verifier order
    #[serde(with = "field_vec_serde")]
    pub public_inputs: Vec<Fr>,
}

impl ProofData {
    /// Public inputs as concatenated 32-byte little-endian elements
    pub fn public_inputs_bytes(&self) -> Vec<u8> {
        self.public_inputs
            .iter()
            .flat_map(fr_to_le_bytes)
            .collect()
    }

    /// Rebuild from proof bytes and concatenated little-endian inputs
    pub fn from_bytes(proof: &[u8], public_inputs: &[u8]) -> Result<Self, ProverError> {
        if !public_inputs.len().is_multiple_of(FIELD_SIZE) {
            return Err(ProverError::PublicInputs(format!(
                "{} bytes is not a multiple of {}",
                public_inputs.len(),
                FIELD_SIZE
            )));
        }
        let public_inputs = public_inputs
            .chunks_exact(FIELD_SIZE)
            .map(fr_from_le_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            proof: proof.to_vec(),
            public_inputs,
        })
    }

    /// `0x`-prefixed hex of the proof bytes
    pub fn proof_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.proof))
    }
}

/// Hex (de)serialization of byte vectors, `0x` prefix optional on input
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Serialize as a `0x`-prefixed hex string
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    /// Deserialize from a hex string
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(digits).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let data = ProofData {
            proof: vec![0xab, 0x01],
            public_inputs: vec![Fr::from(3u64)],
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["proof"], "0xab01");
        let back: ProofData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_public_inputs_bytes() {
        let data = ProofData {
            proof: vec![],
            public_inputs: vec![Fr::from(1u64), Fr::from(2u64)],
        };
        let bytes = data.public_inputs_bytes();
        assert_eq!(bytes.len(), 64);
        assert_eq!(bytes[32], 2);
        assert_eq!(ProofData::from_bytes(&[], &bytes).unwrap(), data);
        assert!(ProofData::from_bytes(&[], &bytes[1..]).is_err());
    }
}
