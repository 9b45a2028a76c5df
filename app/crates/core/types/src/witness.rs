//! Wire identifiers and witness assignments

use ark_bn254::Fr;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error, ser::SerializeMap};
use std::collections::BTreeMap;

use crate::{
    TypesError,
    field::{FIELD_SIZE, fr_from_le_bytes, fr_to_hex, fr_to_le_bytes, parse_field},
};

/// Identifier of a wire (variable) in a circuit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Witness(pub u32);

impl Witness {
    /// Index of the wire as a `usize`
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for Witness {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "_{}", self.0)
    }
}

impl From<u32> for Witness {
    fn from(value: u32) -> Self {
        Witness(value)
    }
}

/// Assignment of field element values to wires
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WitnessMap(BTreeMap<Witness, Fr>);

impl WitnessMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Assign a value, returning the previous one if the wire was assigned
    pub fn insert(&mut self, witness: Witness, value: Fr) -> Option<Fr> {
        self.0.insert(witness, value)
    }

    /// Value assigned to a wire
    pub fn get(&self, witness: &Witness) -> Option<&Fr> {
        self.0.get(witness)
    }

    /// Whether a wire is assigned
    pub fn contains(&self, witness: &Witness) -> bool {
        self.0.contains_key(witness)
    }

    /// Number of assigned wires
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no wire is assigned
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over assignments in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&Witness, &Fr)> {
        self.0.iter()
    }

    /// First wire in `0..count` that is not assigned
    pub fn first_gap(&self, count: u32) -> Option<Witness> {
        (0..count).map(Witness).find(|w| !self.0.contains_key(w))
    }

    /// Values of the wires `0..len` as a dense vector.
    ///
    /// Fails if any wire below the highest assigned one is missing.
    pub fn to_dense(&self) -> Result<Vec<Fr>, TypesError> {
        let mut dense = Vec::with_capacity(self.0.len());
        for (expected, (witness, value)) in (0u32..).zip(self.0.iter()) {
            if witness.0 != expected {
                return Err(TypesError::NonContiguous { missing: expected });
            }
            dense.push(*value);
        }
        Ok(dense)
    }

    /// Encode as Little-Endian bytes, 32 bytes per wire, wires `0..len`
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        let dense = self.to_dense()?;
        let mut bytes = Vec::with_capacity(dense.len().saturating_mul(FIELD_SIZE));
        for value in &dense {
            bytes.extend_from_slice(&fr_to_le_bytes(value));
        }
        Ok(bytes)
    }

    /// Decode the format produced by [`WitnessMap::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        if !bytes.len().is_multiple_of(FIELD_SIZE) {
            return Err(TypesError::InvalidLength {
                expected: bytes
                    .len()
                    .div_ceil(FIELD_SIZE)
                    .saturating_mul(FIELD_SIZE),
                actual: bytes.len(),
            });
        }
        let mut map = BTreeMap::new();
        for (index, chunk) in (0u32..).zip(bytes.chunks_exact(FIELD_SIZE)) {
            map.insert(Witness(index), fr_from_le_bytes(chunk)?);
        }
        Ok(Self(map))
    }
}

impl FromIterator<(Witness, Fr)> for WitnessMap {
    fn from_iter<I: IntoIterator<Item = (Witness, Fr)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Fr>> for WitnessMap {
    fn from(values: Vec<Fr>) -> Self {
        (0u32..).zip(values).map(|(i, v)| (Witness(i), v)).collect()
    }
}

impl Serialize for WitnessMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (witness, value) in &self.0 {
            map.serialize_entry(witness, &fr_to_hex(value))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WitnessMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Witness, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(w, s)| parse_field(&s).map(|v| (w, v)).map_err(D::Error::custom))
            .collect()
    }
}
