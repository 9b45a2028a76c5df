//! Program ABI
//!
//! Describes the named, typed parameters of a compiled program. Parameters
//! occupy consecutive wires starting at wire 0, in declaration order; each
//! type flattens to [`AbiType::field_count`] wires.

use core::ops::Range;

use serde::{Deserialize, Serialize};
use types::Witness;

use crate::{CircuitError, MAX_RANGE_BITS, circuit::Circuit};

/// Whether a value is revealed to the verifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiVisibility {
    /// Part of the public inputs
    Public,
    /// Known only to the prover
    Private,
}

/// Signedness of an integer type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerSign {
    /// Two's complement
    Signed,
    /// Non-negative
    Unsigned,
}

/// Type of a parameter or return value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AbiType {
    /// A raw field element
    Field,
    /// `0` or `1`
    Boolean,
    /// A bounded integer
    Integer {
        /// Signedness
        sign: IntegerSign,
        /// Width in bits
        width: u32,
    },
    /// Fixed-length array
    Array {
        /// Number of elements
        length: u32,
        /// Element type
        #[serde(rename = "type")]
        typ: Box<AbiType>,
    },
    /// Fixed-length byte string, one wire per byte
    String {
        /// Number of bytes
        length: u32,
    },
    /// Named fields, flattened in declaration order
    Struct {
        /// Fully qualified type name
        path: String,
        /// Members
        fields: Vec<AbiField>,
    },
}

impl AbiType {
    /// Reject integer widths a range constraint cannot enforce
    fn check_widths(&self, name: &str) -> Result<(), CircuitError> {
        match self {
            AbiType::Integer { width, .. } if *width == 0 || *width > MAX_RANGE_BITS => {
                Err(CircuitError::InvalidIntegerWidth {
                    name: name.to_owned(),
                    width: *width,
                })
            }
            AbiType::Array { typ, .. } => typ.check_widths(name),
            AbiType::Struct { fields, .. } => fields
                .iter()
                .try_for_each(|f| f.typ.check_widths(&format!("{name}.{}", f.name))),
            _ => Ok(()),
        }
    }

    /// Number of wires a value of this type occupies
    pub fn field_count(&self) -> u32 {
        match self {
            AbiType::Field | AbiType::Boolean | AbiType::Integer { .. } => 1,
            AbiType::Array { length, typ } => length.saturating_mul(typ.field_count()),
            AbiType::String { length } => *length,
            AbiType::Struct { fields, .. } => fields
                .iter()
                .fold(0u32, |acc, f| acc.saturating_add(f.typ.field_count())),
        }
    }
}

/// Member of a struct type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiField {
    /// Member name
    pub name: String,
    /// Member type
    #[serde(rename = "type")]
    pub typ: AbiType,
}

/// A program parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    /// Name used in the input object
    pub name: String,
    /// Type of the parameter
    #[serde(rename = "type")]
    pub typ: AbiType,
    /// Whether the parameter is public
    pub visibility: AbiVisibility,
}

/// Type of the program's return value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiReturnType {
    /// Value type
    pub abi_type: AbiType,
    /// Return values are public inputs of the proof
    pub visibility: AbiVisibility,
}

/// Interface of a compiled program
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abi {
    /// Parameters in wire order
    pub parameters: Vec<AbiParameter>,
    /// Return type, if the program returns a value
    #[serde(default)]
    pub return_type: Option<AbiReturnType>,
}

impl Abi {
    /// Total number of parameter wires
    pub fn field_count(&self) -> u32 {
        self.parameters
            .iter()
            .fold(0u32, |acc, p| acc.saturating_add(p.typ.field_count()))
    }

    /// Each parameter with the range of wires it occupies
    pub fn layout(&self) -> Vec<(&AbiParameter, Range<u32>)> {
        let mut start = 0u32;
        self.parameters
            .iter()
            .map(|p| {
                let end = start.saturating_add(p.typ.field_count());
                let range = start..end;
                start = end;
                (p, range)
            })
            .collect()
    }

    /// Wires of parameters with the given visibility, in order
    pub fn witnesses(&self, visibility: AbiVisibility) -> Vec<Witness> {
        self.layout()
            .into_iter()
            .filter(|(p, _)| p.visibility == visibility)
            .flat_map(|(_, range)| range.map(Witness))
            .collect()
    }

    /// Check that the circuit's parameter and return wires match this ABI
    pub fn check_circuit(&self, circuit: &Circuit) -> Result<(), CircuitError> {
        for param in &self.parameters {
            param.typ.check_widths(&param.name)?;
        }
        if let Some(ret) = &self.return_type {
            ret.abi_type.check_widths("return")?;
        }
        let public = self.witnesses(AbiVisibility::Public);
        if public != circuit.public_parameters {
            return Err(CircuitError::AbiMismatch(format!(
                "ABI declares public wires {:?}, circuit has {:?}",
                public, circuit.public_parameters
            )));
        }
        let private = self.witnesses(AbiVisibility::Private);
        if private != circuit.private_parameters {
            return Err(CircuitError::AbiMismatch(format!(
                "ABI declares private wires {:?}, circuit has {:?}",
                private, circuit.private_parameters
            )));
        }
        let returns = self
            .return_type
            .as_ref()
            .map_or(0, |r| r.abi_type.field_count());
        if usize::try_from(returns).ok() != Some(circuit.return_values.len()) {
            return Err(CircuitError::AbiMismatch(format!(
                "ABI return type has {} fields, circuit returns {} wires",
                returns,
                circuit.return_values.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abi() -> Abi {
        serde_json::from_str(
            r#"{
                "parameters": [
                    {"name": "x", "type": {"kind": "field"}, "visibility": "private"},
                    {"name": "ys", "type": {"kind": "array", "length": 2,
                        "type": {"kind": "integer", "sign": "unsigned", "width": 8}},
                     "visibility": "public"},
                    {"name": "p", "type": {"kind": "struct", "path": "Point", "fields": [
                        {"name": "a", "type": {"kind": "boolean"}},
                        {"name": "b", "type": {"kind": "string", "length": 3}}
                    ]}, "visibility": "private"}
                ],
                "return_type": {"abi_type": {"kind": "field"}, "visibility": "public"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_layout() {
        let abi = abi();
        assert_eq!(abi.field_count(), 7);
        let ranges: Vec<_> = abi.layout().into_iter().map(|(_, r)| r).collect();
        assert_eq!(ranges, vec![0..1, 1..3, 3..7]);
        assert_eq!(
            abi.witnesses(AbiVisibility::Public),
            vec![Witness(1), Witness(2)]
        );
    }

    #[test]
    fn test_check_circuit() {
        let abi = abi();
        let mut circuit = Circuit {
            current_witness_index: 7,
            private_parameters: vec![0, 3, 4, 5, 6].into_iter().map(Witness).collect(),
            public_parameters: vec![Witness(1), Witness(2)],
            return_values: vec![Witness(7)],
            ..Circuit::default()
        };
        assert!(abi.check_circuit(&circuit).is_ok());

        circuit.return_values.clear();
        assert!(matches!(
            abi.check_circuit(&circuit),
            Err(CircuitError::AbiMismatch(_))
        ));
    }

    #[test]
    fn test_integer_width_must_fit_the_field() {
        let circuit = Circuit {
            current_witness_index: 7,
            private_parameters: vec![0, 3, 4, 5, 6].into_iter().map(Witness).collect(),
            public_parameters: vec![Witness(1), Witness(2)],
            return_values: vec![Witness(7)],
            ..Circuit::default()
        };
        let with_width = |width: u32| {
            let mut abi = abi();
            abi.parameters[1].typ = AbiType::Array {
                length: 2,
                typ: Box::new(AbiType::Integer {
                    sign: IntegerSign::Unsigned,
                    width,
                }),
            };
            abi
        };
        assert!(with_width(MAX_RANGE_BITS).check_circuit(&circuit).is_ok());
        for width in [0, 254, u32::MAX] {
            assert!(matches!(
                with_width(width).check_circuit(&circuit),
                Err(CircuitError::InvalidIntegerWidth { ref name, .. }) if name == "ys"
            ));
        }

        let mut abi = abi();
        if let AbiType::Struct { fields, .. } = &mut abi.parameters[2].typ {
            fields[0].typ = AbiType::Integer {
                sign: IntegerSign::Signed,
                width: 300,
            };
        }
        assert!(matches!(
            abi.check_circuit(&circuit),
            Err(CircuitError::InvalidIntegerWidth { ref name, width: 300 }) if name == "p.a"
        ));
    }
}
