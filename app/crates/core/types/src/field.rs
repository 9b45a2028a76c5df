//! BN254 scalar field codecs
//!
//! Conversions between [`Fr`] and bytes, hex strings and big integers. Byte
//! arrays use Little-Endian order (as expected by Arkworks); hex strings are
//! `0x`-prefixed Big-Endian for human readability.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::{BigInt, BigUint, Sign};

use crate::TypesError;

/// Field element size in bytes (BN254 scalar field)
pub const FIELD_SIZE: usize = 32;

/// Convert a field element to 32 Little-Endian bytes
pub fn fr_to_le_bytes(value: &Fr) -> [u8; FIELD_SIZE] {
    let bytes = value.into_bigint().to_bytes_le();
    let mut out = [0u8; FIELD_SIZE];
    let len = bytes.len().min(FIELD_SIZE);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Convert 32 Little-Endian bytes into a field element.
///
/// Unlike `Fr::from_le_bytes_mod_order` this rejects integers `>= p`, so a
/// byte string has exactly one accepted meaning.
pub fn fr_from_le_bytes(bytes: &[u8]) -> Result<Fr, TypesError> {
    if bytes.len() != FIELD_SIZE {
        return Err(TypesError::InvalidLength {
            expected: FIELD_SIZE,
            actual: bytes.len(),
        });
    }
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(word);
    }
    Fr::from_bigint(ark_ff::BigInt::new(limbs)).ok_or(TypesError::NonCanonical)
}

/// Convert a field element to a `0x`-prefixed, zero-padded Big-Endian hex
/// string
pub fn fr_to_hex(value: &Fr) -> String {
    let mut bytes = fr_to_le_bytes(value);
    bytes.reverse();
    format!("0x{}", hex::encode(bytes))
}

/// The field modulus as an unsigned big integer
fn modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// Parse a decimal or `0x` hex string, with an optional leading `-`, into a
/// signed big integer
pub fn parse_bigint(s: &str) -> Option<BigInt> {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (Sign::Plus, s),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16)?,
        None => BigUint::parse_bytes(digits.as_bytes(), 10)?,
    };
    Some(BigInt::from_biguint(sign, magnitude))
}

/// Convert a signed big integer to its field element representation.
///
/// Negative numbers are converted to `p - |value|`. Values whose magnitude
/// is not below the modulus are rejected instead of being reduced.
pub fn field_from_bigint(value: &BigInt) -> Result<Fr, TypesError> {
    let magnitude = value.magnitude();
    if *magnitude >= modulus() {
        return Err(TypesError::InvalidFieldString(value.to_string()));
    }
    let element = Fr::from_le_bytes_mod_order(&magnitude.to_bytes_le());
    if value.sign() == Sign::Minus {
        Ok(-element)
    } else {
        Ok(element)
    }
}

/// Convert a field element to an unsigned big integer
pub fn fr_to_bigint(value: &Fr) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// Parse a decimal or `0x` hex string into a field element
pub fn parse_field(s: &str) -> Result<Fr, TypesError> {
    let value = parse_bigint(s).ok_or_else(|| TypesError::InvalidFieldString(s.to_string()))?;
    field_from_bigint(&value)
}

/// Serde adapter writing a field element as a hex string.
///
/// Deserialization accepts hex or decimal strings and unsigned JSON numbers.
pub mod field_serde {
    use ark_bn254::Fr;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    /// Serialize as `0x`-prefixed hex
    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::fr_to_hex(value))
    }

    /// Deserialize from a string or an unsigned integer
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => super::parse_field(&s).map_err(D::Error::custom),
            Repr::Number(n) => Ok(Fr::from(n)),
        }
    }
}

/// Serde adapter for a sequence of field elements, see [`field_serde`]
pub mod field_vec_serde {
    use ark_bn254::Fr;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(transparent)]
    struct Element(#[serde(with = "super::field_serde")] Fr);

    /// Serialize as a list of hex strings
    pub fn serialize<S: Serializer>(values: &[Fr], serializer: S) -> Result<S::Ok, S::Error> {
        let elements: Vec<Element> = values.iter().copied().map(Element).collect();
        elements.serialize(serializer)
    }

    /// Deserialize from a list of strings or unsigned integers
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Fr>, D::Error> {
        let elements = Vec::<Element>::deserialize(deserializer)?;
        Ok(elements.into_iter().map(|e| e.0).collect())
    }
}
