//! Programmatic circuit construction
//!
//! [`CircuitBuilder`] allocates wires, records opcodes in solving order and
//! keeps the ABI in sync with the parameter wires. Gadgets emit both the
//! solver hints and the constraints that make their results sound.

// Field arithmetic is modular and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, Field};
use types::Witness;

use crate::{
    CircuitError,
    abi::{Abi, AbiParameter, AbiReturnType, AbiType, AbiVisibility},
    artifact::Artifact,
    circuit::Circuit,
    hash,
    opcodes::{Directive, Expression, Opcode},
};

/// Incremental circuit constructor
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    next_witness: u32,
    opcodes: Vec<Opcode>,
    abi: Abi,
    private_parameters: Vec<Witness>,
    public_parameters: Vec<Witness>,
    return_values: Vec<Witness>,
    sealed_parameters: bool,
}

impl CircuitBuilder {
    /// Start an empty circuit
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> Witness {
        let w = Witness(self.next_witness);
        self.next_witness = self.next_witness.saturating_add(1);
        w
    }

    /// Declare a parameter; returns its wires in flattening order.
    ///
    /// Parameters must be declared before any intermediate wire.
    pub fn add_parameter(
        &mut self,
        name: &str,
        typ: AbiType,
        visibility: AbiVisibility,
    ) -> Result<Vec<Witness>, CircuitError> {
        if self.sealed_parameters {
            return Err(CircuitError::ParameterAfterWitness(name.to_string()));
        }
        let wires: Vec<Witness> = (0..typ.field_count()).map(|_| self.allocate()).collect();
        match visibility {
            AbiVisibility::Public => self.public_parameters.extend(&wires),
            AbiVisibility::Private => self.private_parameters.extend(&wires),
        }
        self.abi.parameters.push(AbiParameter {
            name: name.to_string(),
            typ,
            visibility,
        });
        Ok(wires)
    }

    /// Allocate an intermediate wire
    pub fn new_witness(&mut self) -> Witness {
        self.sealed_parameters = true;
        self.allocate()
    }

    /// Append a raw opcode
    pub fn push(&mut self, opcode: Opcode) {
        self.opcodes.push(opcode);
    }

    /// Constrain `expr = 0`
    pub fn assert_zero(&mut self, expr: Expression) {
        self.push(Opcode::AssertZero(expr));
    }

    /// Constrain `a = b`
    pub fn assert_equal(&mut self, a: Witness, b: Witness) {
        self.assert_zero(Expression::from_witness(a).add_linear(-Fr::ONE, b));
    }

    /// Constrain `a = value`
    pub fn assert_constant(&mut self, a: Witness, value: Fr) {
        self.assert_zero(Expression::from_witness(a).add_constant(-value));
    }

    /// New wire constrained to `Σ q·w + constant`
    pub fn linear(&mut self, terms: &[(Fr, Witness)], constant: Fr) -> Witness {
        let out = self.new_witness();
        let mut expr = Expression::constant(constant).add_linear(-Fr::ONE, out);
        for (q, w) in terms {
            expr = expr.add_linear(*q, *w);
        }
        self.assert_zero(expr);
        out
    }

    /// New wire constrained to `a + b`
    pub fn add(&mut self, a: Witness, b: Witness) -> Witness {
        self.linear(&[(Fr::ONE, a), (Fr::ONE, b)], Fr::ZERO)
    }

    /// New wire constrained to `a * b`
    pub fn mul(&mut self, a: Witness, b: Witness) -> Witness {
        let out = self.new_witness();
        self.assert_zero(
            Expression::zero()
                .add_mul(Fr::ONE, a, b)
                .add_linear(-Fr::ONE, out),
        );
        out
    }

    /// Constrain `0 <= a < 2^num_bits`
    pub fn range(&mut self, a: Witness, num_bits: u32) {
        self.push(Opcode::Range {
            input: a,
            num_bits,
        });
    }

    /// Little-endian bits of `a`, each constrained boolean and recomposed
    /// to `a`. `num_bits` must not exceed [`crate::MAX_RANGE_BITS`].
    pub fn to_bits(&mut self, a: Witness, num_bits: u32) -> Vec<Witness> {
        let bits: Vec<Witness> = (0..num_bits).map(|_| self.new_witness()).collect();
        self.push(Opcode::Directive(Directive::ToLeRadix {
            input: a,
            outputs: bits.clone(),
            radix: 2,
        }));
        for bit in &bits {
            self.assert_zero(
                Expression::zero()
                    .add_mul(Fr::ONE, *bit, *bit)
                    .add_linear(-Fr::ONE, *bit),
            );
        }
        let mut recomposed = Expression::zero().add_linear(-Fr::ONE, a);
        let mut weight = Fr::ONE;
        for bit in &bits {
            recomposed = recomposed.add_linear(weight, *bit);
            weight.double_in_place();
        }
        self.assert_zero(recomposed);
        bits
    }

    /// New wire equal to `1` if `a = 0` and `0` otherwise
    pub fn is_zero(&mut self, a: Witness) -> Witness {
        let inverse = self.new_witness();
        let out = self.new_witness();
        self.push(Opcode::Directive(Directive::Invert {
            input: a,
            output: inverse,
        }));
        // a * inverse + out - 1 = 0
        self.assert_zero(
            Expression::constant(-Fr::ONE)
                .add_mul(Fr::ONE, a, inverse)
                .add_linear(Fr::ONE, out),
        );
        // a * out = 0
        self.assert_zero(Expression::zero().add_mul(Fr::ONE, a, out));
        out
    }

    /// MiMC-7 of `x` keyed by the wire `k`; see [`crate::hash`]
    pub fn mimc7(&mut self, x: Witness, k: Witness) -> Witness {
        self.mimc7_rounds(x, Expression::from_witness(k))
    }

    /// MiMC-7 of `x` keyed by a constant
    pub fn mimc7_with_key(&mut self, x: Witness, k: Fr) -> Witness {
        self.mimc7_rounds(x, Expression::constant(k))
    }

    fn mimc7_rounds(&mut self, x: Witness, key: Expression) -> Witness {
        let mut r = x;
        for c in hash::mimc7_constants() {
            // t = r + k + c
            let t = self.new_witness();
            self.assert_zero(
                key.clone()
                    .add_linear(Fr::ONE, r)
                    .add_constant(*c)
                    .add_linear(-Fr::ONE, t),
            );
            let t2 = self.mul(t, t);
            let t4 = self.mul(t2, t2);
            let t6 = self.mul(t4, t2);
            r = self.mul(t6, t);
        }
        let out = self.new_witness();
        self.assert_zero(key.add_linear(Fr::ONE, r).add_linear(-Fr::ONE, out));
        out
    }

    /// Expose wires as the program's public return value
    pub fn set_return(&mut self, values: Vec<Witness>, typ: AbiType) {
        self.return_values = values;
        self.abi.return_type = Some(AbiReturnType {
            abi_type: typ,
            visibility: AbiVisibility::Public,
        });
    }

    /// Finish the circuit and check it is well formed
    pub fn build(mut self) -> Result<(Abi, Circuit), CircuitError> {
        if self.next_witness == 0 {
            let w = self.new_witness();
            self.assert_constant(w, Fr::ZERO);
        }
        let circuit = Circuit {
            current_witness_index: self.next_witness.saturating_sub(1),
            opcodes: self.opcodes,
            private_parameters: self.private_parameters,
            public_parameters: self.public_parameters,
            return_values: self.return_values,
        };
        circuit.validate()?;
        self.abi.check_circuit(&circuit)?;
        Ok((self.abi, circuit))
    }

    /// Finish the circuit as a hashed artifact
    pub fn build_artifact(self, name: &str) -> Result<Artifact, CircuitError> {
        let (abi, circuit) = self.build()?;
        Artifact::new(name, abi, circuit)
    }
}
