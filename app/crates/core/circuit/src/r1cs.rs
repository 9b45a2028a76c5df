//! Import of iden3 binary R1CS files
//!
//! Parses the `.r1cs` format produced by the Circom compiler and converts
//! each constraint `A * B = C` into an [`Opcode::AssertZero`]. Circom wire 0
//! is the constant one; it is folded into constants, so Circom wire `i`
//! becomes wire `i - 1` of the imported circuit.
//!
//! Imported circuits carry no solving hints: they are proven from a witness
//! computed by Circom's own witness calculator.
//!
//! # Reference
//! https://github.com/iden3/r1csfile/blob/master/doc/r1cs_bin_format.md

// Field arithmetic is modular and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, BigInteger, Field, PrimeField};
use types::{FIELD_SIZE, Witness, WitnessMap};

use crate::{
    CircuitError,
    abi::{Abi, AbiParameter, AbiType, AbiVisibility},
    artifact::Artifact,
    circuit::Circuit,
    opcodes::{Expression, Opcode},
};

/// A term in a linear combination: coefficient * wire
#[derive(Clone, Debug)]
pub struct Term {
    /// Circom wire index
    pub wire_id: u32,
    /// Coefficient as a field element
    pub coefficient: Fr,
}

/// A linear combination: sum of (coefficient * wire)
pub type LinearCombination = Vec<Term>;

/// A single R1CS constraint: A * B = C
#[derive(Clone, Debug)]
pub struct Constraint {
    /// Linear combination A
    pub a: LinearCombination,
    /// Linear combination B
    pub b: LinearCombination,
    /// Linear combination C
    pub c: LinearCombination,
}

/// Parsed R1CS file
#[derive(Clone, Debug)]
pub struct R1cs {
    /// Number of wires including the constant one
    pub num_wires: u32,
    /// Number of public outputs
    pub num_pub_out: u32,
    /// Number of public inputs
    pub num_pub_in: u32,
    /// Number of private inputs
    pub num_prv_in: u32,
    /// The constraints
    pub constraints: Vec<Constraint>,
}

fn invalid(msg: impl Into<String>) -> CircuitError {
    CircuitError::InvalidR1cs(msg.into())
}

impl R1cs {
    /// Parse R1CS from binary data
    pub fn parse(data: &[u8]) -> Result<Self, CircuitError> {
        let mut cursor = Cursor::new(data);

        if cursor.read_bytes(4)? != b"r1cs" {
            return Err(invalid("bad magic number"));
        }
        let version = cursor.read_u32_le()?;
        if version != 1 {
            return Err(invalid(format!("unsupported version {version}")));
        }
        let num_sections = cursor.read_u32_le()?;

        let mut header: Option<Header> = None;
        let mut constraints_at: Option<(usize, usize)> = None;

        // Sections may come in any order; constraints need the header, so
        // remember where they start and parse them afterwards.
        for _ in 0..num_sections {
            let section_type = cursor.read_u32_le()?;
            let section_size = usize::try_from(cursor.read_u64_le()?)
                .map_err(|_| invalid("section size overflows usize"))?;
            let section_start = cursor.position;

            match section_type {
                1 => header = Some(Header::parse(&mut cursor)?),
                2 => constraints_at = Some((section_start, section_size)),
                // Wire2LabelId and custom-gate sections are not needed
                _ => {}
            }

            let end = section_start
                .checked_add(section_size)
                .ok_or_else(|| invalid("section size overflow"))?;
            cursor.seek(end)?;
        }

        let header = header.ok_or_else(|| invalid("missing header section"))?;
        let constraints = match constraints_at {
            Some((start, size)) => {
                // Each constraint holds at least three term counts
                let min_size = (header.num_constraints as usize).saturating_mul(12);
                if min_size > size {
                    return Err(invalid(format!(
                        "{} constraints do not fit in a {size}-byte section",
                        header.num_constraints
                    )));
                }
                cursor.seek(start)?;
                let mut constraints =
                    Vec::with_capacity((header.num_constraints as usize).min(1 << 16));
                for _ in 0..header.num_constraints {
                    let a = cursor.read_linear_combination()?;
                    let b = cursor.read_linear_combination()?;
                    let c = cursor.read_linear_combination()?;
                    constraints.push(Constraint { a, b, c });
                }
                constraints
            }
            None => Vec::new(),
        };

        log::debug!(
            "parsed R1CS: {} wires, {} constraints",
            header.num_wires,
            constraints.len()
        );

        Ok(R1cs {
            num_wires: header.num_wires,
            num_pub_out: header.num_pub_out,
            num_pub_in: header.num_pub_in,
            num_prv_in: header.num_prv_in,
            constraints,
        })
    }

    /// Total number of public values (outputs + inputs, excluding the
    /// constant one)
    pub fn num_public(&self) -> u32 {
        self.num_pub_out.saturating_add(self.num_pub_in)
    }

    /// Convert into a circuit of assert-zero opcodes.
    ///
    /// Public outputs and inputs become public parameters in Circom order,
    /// private inputs become private parameters.
    pub fn into_circuit(self) -> Result<Circuit, CircuitError> {
        let num_public = self.num_public();
        let first_private = num_public;
        let end_private = num_public
            .checked_add(self.num_prv_in)
            .ok_or_else(|| invalid("input count overflow"))?;
        if end_private >= self.num_wires {
            return Err(invalid("more inputs than wires"));
        }

        let opcodes = self
            .constraints
            .iter()
            .map(|c| Opcode::AssertZero(constraint_to_expression(c)))
            .collect();

        let circuit = Circuit {
            current_witness_index: self.num_wires.saturating_sub(2),
            opcodes,
            private_parameters: (first_private..end_private).map(Witness).collect(),
            public_parameters: (0..num_public).map(Witness).collect(),
            return_values: Vec::new(),
        };
        circuit.validate()?;
        Ok(circuit)
    }

    /// Convert into an artifact named `name`. The ABI exposes the public
    /// values as a `public` field array and the private inputs as a
    /// `private` field array; empty groups are omitted.
    pub fn into_artifact(self, name: &str) -> Result<Artifact, CircuitError> {
        let groups = [
            ("public", self.num_public(), AbiVisibility::Public),
            ("private", self.num_prv_in, AbiVisibility::Private),
        ];
        let abi = Abi {
            parameters: groups
                .into_iter()
                .filter(|(_, length, _)| *length > 0)
                .map(|(group, length, visibility)| AbiParameter {
                    name: group.to_string(),
                    typ: AbiType::Array {
                        length,
                        typ: Box::new(AbiType::Field),
                    },
                    visibility,
                })
                .collect(),
            return_type: None,
        };
        Artifact::new(name, abi, self.into_circuit()?)
    }
}

/// Map a Circom wire id to an imported wire, `None` for the constant one
fn shifted(wire_id: u32) -> Option<Witness> {
    wire_id.checked_sub(1).map(Witness)
}

/// Expand `A * B - C` into a quadratic expression
fn constraint_to_expression(constraint: &Constraint) -> Expression {
    let mut expr = Expression::zero();
    for a in &constraint.a {
        for b in &constraint.b {
            let q = a.coefficient * b.coefficient;
            if q == Fr::ZERO {
                continue;
            }
            expr = match (shifted(a.wire_id), shifted(b.wire_id)) {
                (None, None) => expr.add_constant(q),
                (Some(w), None) | (None, Some(w)) => expr.add_linear(q, w),
                (Some(l), Some(r)) => expr.add_mul(q, l, r),
            };
        }
    }
    for c in &constraint.c {
        expr = match shifted(c.wire_id) {
            None => expr.add_constant(-c.coefficient),
            Some(w) => expr.add_linear(-c.coefficient, w),
        };
    }
    expr
}

/// Convert a Circom witness (Little-Endian, 32 bytes per wire, wire 0 the
/// constant one) into a witness for the imported circuit
pub fn witness_from_circom(bytes: &[u8]) -> Result<WitnessMap, CircuitError> {
    let full = WitnessMap::from_bytes(bytes).map_err(|e| invalid(e.to_string()))?;
    let mut values = full.iter().map(|(_, v)| *v);
    if values.next() != Some(Fr::ONE) {
        return Err(invalid("witness wire 0 must be the constant one"));
    }
    Ok(WitnessMap::from(values.collect::<Vec<_>>()))
}

/// Header section contents
struct Header {
    num_wires: u32,
    num_pub_out: u32,
    num_pub_in: u32,
    num_prv_in: u32,
    num_constraints: u32,
}

impl Header {
    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, CircuitError> {
        let field_size = cursor.read_u32_le()?;
        if field_size as usize != FIELD_SIZE {
            return Err(invalid(format!(
                "unsupported field size {field_size} (expected {FIELD_SIZE})"
            )));
        }
        let prime = cursor.read_bytes(FIELD_SIZE)?;
        if prime != Fr::MODULUS.to_bytes_le().as_slice() {
            return Err(invalid("prime is not the BN254 scalar field"));
        }

        let num_wires = cursor.read_u32_le()?;
        let num_pub_out = cursor.read_u32_le()?;
        let num_pub_in = cursor.read_u32_le()?;
        let num_prv_in = cursor.read_u32_le()?;
        let _num_labels = cursor.read_u64_le()?;
        let num_constraints = cursor.read_u32_le()?;

        Ok(Header {
            num_wires,
            num_pub_out,
            num_pub_in,
            num_prv_in,
            num_constraints,
        })
    }
}

/// Bounds-checked reader over the file contents
struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, position: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CircuitError> {
        let end = self
            .position
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| invalid("unexpected end of data"))?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_u32_le(&mut self) -> Result<u32, CircuitError> {
        let mut word = [0u8; 4];
        word.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(word))
    }

    fn read_u64_le(&mut self) -> Result<u64, CircuitError> {
        let mut word = [0u8; 8];
        word.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(word))
    }

    fn seek(&mut self, position: usize) -> Result<(), CircuitError> {
        if position > self.data.len() {
            return Err(invalid("unexpected end of data"));
        }
        self.position = position;
        Ok(())
    }

    fn read_linear_combination(&mut self) -> Result<LinearCombination, CircuitError> {
        let num_terms = self.read_u32_le()?;
        let mut terms = Vec::with_capacity((num_terms as usize).min(1 << 16));
        for _ in 0..num_terms {
            let wire_id = self.read_u32_le()?;
            let coefficient = Fr::from_le_bytes_mod_order(self.read_bytes(FIELD_SIZE)?);
            terms.push(Term {
                wire_id,
                coefficient,
            });
        }
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a file with the given header values and constraints
    fn encode(
        num_wires: u32,
        pub_out: u32,
        pub_in: u32,
        prv_in: u32,
        constraints: &[Constraint],
    ) -> Vec<u8> {
        fn lc(out: &mut Vec<u8>, terms: &[Term]) {
            out.extend_from_slice(&(terms.len() as u32).to_le_bytes());
            for t in terms {
                out.extend_from_slice(&t.wire_id.to_le_bytes());
                out.extend_from_slice(&types::fr_to_le_bytes(&t.coefficient));
            }
        }

        let mut header = Vec::new();
        header.extend_from_slice(&32u32.to_le_bytes());
        header.extend_from_slice(&Fr::MODULUS.to_bytes_le());
        for v in [num_wires, pub_out, pub_in, prv_in] {
            header.extend_from_slice(&v.to_le_bytes());
        }
        header.extend_from_slice(&u64::from(num_wires).to_le_bytes());
        header.extend_from_slice(&(constraints.len() as u32).to_le_bytes());

        let mut body = Vec::new();
        for c in constraints {
            lc(&mut body, &c.a);
            lc(&mut body, &c.b);
            lc(&mut body, &c.c);
        }

        let mut out = b"r1cs".to_vec();
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        // Constraints before header, as Circom writes them
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(body.len() as u64).to_le_bytes());
        out.extend_from_slice(&body);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(header.len() as u64).to_le_bytes());
        out.extend_from_slice(&header);
        out
    }

    fn term(wire_id: u32, c: u64) -> Term {
        Term {
            wire_id,
            coefficient: Fr::from(c),
        }
    }

    /// out = a * b, with out public (wire 1) and a, b private (wires 2, 3)
    fn multiplier() -> Vec<u8> {
        encode(
            4,
            1,
            0,
            2,
            &[Constraint {
                a: vec![term(2, 1)],
                b: vec![term(3, 1)],
                c: vec![term(1, 1)],
            }],
        )
    }

    #[test]
    fn test_cursor_reads() {
        let data = [0x72, 0x31, 0x63, 0x73, 0x01, 0x00, 0x00, 0x00]; // "r1cs" + version 1
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_bytes(4).unwrap(), b"r1cs");
        assert_eq!(cursor.read_u32_le().unwrap(), 1);
        assert!(cursor.read_u32_le().is_err());
    }

    #[test]
    fn test_parse_and_convert() {
        let r1cs = R1cs::parse(&multiplier()).unwrap();
        assert_eq!(r1cs.num_public(), 1);
        assert_eq!(r1cs.constraints.len(), 1);

        let circuit = r1cs.into_circuit().unwrap();
        assert_eq!(circuit.num_witnesses(), 3);
        assert_eq!(circuit.public_parameters, vec![Witness(0)]);
        assert_eq!(circuit.private_parameters, vec![Witness(1), Witness(2)]);

        let good = WitnessMap::from(vec![Fr::from(12u64), Fr::from(3u64), Fr::from(4u64)]);
        let bad = WitnessMap::from(vec![Fr::from(13u64), Fr::from(3u64), Fr::from(4u64)]);
        let Opcode::AssertZero(expr) = &circuit.opcodes[0] else {
            panic!("expected assert_zero");
        };
        assert_eq!(expr.evaluate(&good), Some(Fr::ZERO));
        assert_ne!(expr.evaluate(&bad), Some(Fr::ZERO));
    }

    #[test]
    fn test_into_artifact() {
        let artifact = R1cs::parse(&multiplier())
            .unwrap()
            .into_artifact("multiplier")
            .unwrap();
        let names: Vec<_> = artifact.abi.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["public", "private"]);
        assert_eq!(artifact.abi.field_count(), 3);
        assert!(artifact.verify_hash().is_ok());
    }

    #[test]
    fn test_constant_wire_folds_into_constant() {
        // (w1 + 2) * 1 = 5
        let bytes = encode(
            2,
            0,
            1,
            0,
            &[Constraint {
                a: vec![term(1, 1), term(0, 2)],
                b: vec![term(0, 1)],
                c: vec![term(0, 5)],
            }],
        );
        let circuit = R1cs::parse(&bytes).unwrap().into_circuit().unwrap();
        let Opcode::AssertZero(expr) = &circuit.opcodes[0] else {
            panic!("expected assert_zero");
        };
        assert!(expr.is_linear());
        assert_eq!(expr.q_c, -Fr::from(3u64));
        assert_eq!(expr.evaluate(&WitnessMap::from(vec![Fr::from(3u64)])), Some(Fr::ZERO));
    }

    #[test]
    fn test_rejects_constraint_count_beyond_section() {
        let mut bytes = encode(4, 1, 0, 2, &[]);
        // The constraint count is the header's last field, at the end of the file
        let at = bytes.len() - 4;
        bytes[at..].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(R1cs::parse(&bytes), Err(CircuitError::InvalidR1cs(_))));
    }

    #[test]
    fn test_rejects_bad_magic_and_truncation() {
        let mut bytes = multiplier();
        bytes[0] = b'x';
        assert!(matches!(R1cs::parse(&bytes), Err(CircuitError::InvalidR1cs(_))));

        let bytes = multiplier();
        assert!(R1cs::parse(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_circom_witness() {
        let mut bytes = Vec::new();
        for v in [1u64, 12, 3, 4] {
            bytes.extend_from_slice(&types::fr_to_le_bytes(&Fr::from(v)));
        }
        let w = witness_from_circom(&bytes).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.get(&Witness(0)), Some(&Fr::from(12u64)));

        bytes[0] = 2;
        assert!(witness_from_circom(&bytes).is_err());
    }
}
