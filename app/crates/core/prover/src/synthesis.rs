//! Lowering of circuits to R1CS
//!
//! Public inputs are allocated first, in [`Circuit::public_inputs`] order,
//! followed by every other wire in index order. Assert-zero opcodes become
//! one R1CS row for their first product term plus one row per extra product;
//! range opcodes become a booleanity row per bit and a recomposition row.
//! Directives are solver hints and produce no constraints.

// Field arithmetic is modular and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, BigInteger, Field, PrimeField, Zero};
use ark_relations::{
    lc,
    r1cs::{
        ConstraintSynthesizer, ConstraintSystemRef, LinearCombination, SynthesisError, Variable,
    },
};
use circuit::{Circuit, Expression, Opcode};
use types::{Witness, WitnessMap};

/// Adapter feeding a [`Circuit`] to arkworks.
///
/// Without a witness it only shapes the constraint system, which is all
/// key generation needs.
pub struct CircuitSynthesizer<'a> {
    circuit: &'a Circuit,
    witness: Option<&'a WitnessMap>,
}

impl<'a> CircuitSynthesizer<'a> {
    /// Synthesizer for key generation
    pub fn for_setup(circuit: &'a Circuit) -> Self {
        Self {
            circuit,
            witness: None,
        }
    }

    /// Synthesizer carrying a full assignment
    pub fn for_proving(circuit: &'a Circuit, witness: &'a WitnessMap) -> Self {
        Self {
            circuit,
            witness: Some(witness),
        }
    }
}

fn lookup(witness: Option<&WitnessMap>, w: Witness) -> Result<Fr, SynthesisError> {
    witness
        .and_then(|m| m.get(&w).copied())
        .ok_or(SynthesisError::AssignmentMissing)
}

impl ConstraintSynthesizer<Fr> for CircuitSynthesizer<'_> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let num_wires = usize::try_from(self.circuit.num_witnesses())
            .map_err(|_| SynthesisError::Unsatisfiable)?;
        let mut slots: Vec<Option<Variable>> = vec![None; num_wires];

        for w in self.circuit.public_inputs() {
            let var = cs.new_input_variable(|| lookup(self.witness, w))?;
            let slot = slots
                .get_mut(w.index())
                .ok_or(SynthesisError::Unsatisfiable)?;
            *slot = Some(var);
        }
        for (idx, slot) in slots.iter_mut().enumerate() {
            if slot.is_none() {
                let w = Witness(u32::try_from(idx).map_err(|_| SynthesisError::Unsatisfiable)?);
                *slot = Some(cs.new_witness_variable(|| lookup(self.witness, w))?);
            }
        }

        let mut lowering = Lowering {
            cs,
            variables: slots.into_iter().flatten().collect(),
            witness: self.witness,
        };
        for opcode in &self.circuit.opcodes {
            match opcode {
                Opcode::AssertZero(expr) => lowering.assert_zero(expr)?,
                Opcode::Range { input, num_bits } => lowering.range(*input, *num_bits)?,
                Opcode::Directive(_) => {}
            }
        }
        Ok(())
    }
}

struct Lowering<'a> {
    cs: ConstraintSystemRef<Fr>,
    /// Variable of each wire, by wire index
    variables: Vec<Variable>,
    witness: Option<&'a WitnessMap>,
}

impl Lowering<'_> {
    fn var(&self, w: Witness) -> Result<Variable, SynthesisError> {
        self.variables
            .get(w.index())
            .copied()
            .ok_or(SynthesisError::Unsatisfiable)
    }

    /// Auxiliary wire constrained to `lhs * rhs`
    fn product(&mut self, lhs: Witness, rhs: Witness) -> Result<Variable, SynthesisError> {
        let value = lookup(self.witness, lhs).and_then(|a| Ok(a * lookup(self.witness, rhs)?));
        let product = self.cs.new_witness_variable(|| value)?;
        self.cs.enforce_constraint(
            lc!() + self.var(lhs)?,
            lc!() + self.var(rhs)?,
            lc!() + product,
        )?;
        Ok(product)
    }

    /// `q0·a0·b0 + Σ qi·pi + Σ q·w + c = 0` as `(q0·a0) · b0 = -(rest)`
    fn assert_zero(&mut self, expr: &Expression) -> Result<(), SynthesisError> {
        let mut rest: LinearCombination<Fr> = lc!() + (-expr.q_c, Variable::One);
        for term in &expr.linear_combinations {
            rest = rest + (-term.q, self.var(term.witness)?);
        }

        let mut products = expr.mul_terms.iter().filter(|t| !t.q.is_zero());
        let Some(first) = products.next() else {
            return self
                .cs
                .enforce_constraint(rest, lc!() + Variable::One, lc!());
        };
        for term in products {
            let p = self.product(term.lhs, term.rhs)?;
            rest = rest + (-term.q, p);
        }
        self.cs.enforce_constraint(
            lc!() + (first.q, self.var(first.lhs)?),
            lc!() + self.var(first.rhs)?,
            rest,
        )
    }

    /// Bit decomposition: `b·b = b` for each bit and `Σ 2^k·b_k = input`
    fn range(&mut self, input: Witness, num_bits: u32) -> Result<(), SynthesisError> {
        let bigint = lookup(self.witness, input).map(|v| v.into_bigint());
        let mut recomposed: LinearCombination<Fr> = lc!() + (-Fr::ONE, self.var(input)?);
        let mut weight = Fr::ONE;
        for k in 0..num_bits {
            let bit = match &bigint {
                Ok(b) => Ok(Fr::from(b.get_bit(k as usize))),
                Err(_) => Err(SynthesisError::AssignmentMissing),
            };
            let b = self.cs.new_witness_variable(|| bit)?;
            self.cs
                .enforce_constraint(lc!() + b, lc!() + b, lc!() + b)?;
            recomposed = recomposed + (weight, b);
            weight.double_in_place();
        }
        self.cs
            .enforce_constraint(recomposed, lc!() + Variable::One, lc!())
    }
}

/// Number of R1CS rows the lowering produces
pub fn constraint_count(circuit: &Circuit) -> usize {
    circuit
        .opcodes
        .iter()
        .map(|op| match op {
            Opcode::AssertZero(expr) => expr
                .mul_terms
                .iter()
                .filter(|t| !t.q.is_zero())
                .count()
                .max(1),
            Opcode::Range { num_bits, .. } => (*num_bits as usize).saturating_add(1),
            Opcode::Directive(_) => 0,
        })
        .fold(0usize, usize::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use circuit::{AbiType, AbiVisibility, CircuitBuilder};
    use witness::solve;

    fn circuit() -> Circuit {
        // out = x*x*3 + x*y - 1, y < 2^4
        let mut b = CircuitBuilder::new();
        let x = b
            .add_parameter("x", AbiType::Field, AbiVisibility::Private)
            .unwrap()[0];
        let y = b
            .add_parameter("y", AbiType::Field, AbiVisibility::Public)
            .unwrap()[0];
        b.range(y, 4);
        let out = b.new_witness();
        b.assert_zero(
            Expression::constant(-Fr::ONE)
                .add_mul(Fr::from(3u64), x, x)
                .add_mul(Fr::ONE, x, y)
                .add_linear(-Fr::ONE, out),
        );
        b.set_return(vec![out], AbiType::Field);
        b.build().unwrap().1
    }

    fn synthesize(circuit: &Circuit, witness: &WitnessMap) -> ConstraintSystemRef<Fr> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        CircuitSynthesizer::for_proving(circuit, witness)
            .generate_constraints(cs.clone())
            .unwrap();
        cs
    }

    #[test]
    fn test_lowering_is_satisfied_by_solved_witness() {
        let circuit = circuit();
        let initial: WitnessMap = vec![Fr::from(2u64), Fr::from(5u64)].into();
        let witness = solve(&circuit, initial).unwrap();
        let cs = synthesize(&circuit, &witness);

        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_constraints(), constraint_count(&circuit));
        // y and out are public
        assert_eq!(cs.num_instance_variables(), 3);
    }

    #[test]
    fn test_tampered_witness_is_not_satisfied() {
        let circuit = circuit();
        let initial: WitnessMap = vec![Fr::from(2u64), Fr::from(5u64)].into();
        let mut witness = solve(&circuit, initial).unwrap();
        witness.insert(Witness(2), Fr::from(1000u64));
        assert!(!synthesize(&circuit, &witness).is_satisfied().unwrap());
    }

    #[test]
    fn test_range_rejects_wide_value() {
        let circuit = circuit();
        // Bypass the solver: y = 16 needs five bits, out = 12 + 32 - 1
        let witness: WitnessMap = vec![Fr::from(2u64), Fr::from(16u64), Fr::from(43u64)].into();
        assert!(!synthesize(&circuit, &witness).is_satisfied().unwrap());
    }

    #[test]
    fn test_setup_mode_needs_no_witness() {
        let circuit = circuit();
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        CircuitSynthesizer::for_setup(&circuit)
            .generate_constraints(cs.clone())
            .unwrap();
        assert_eq!(cs.num_constraints(), constraint_count(&circuit));
    }
}
