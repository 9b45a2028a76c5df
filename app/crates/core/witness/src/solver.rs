//! Sequential opcode solver
//!
//! Opcodes are visited once, in order. An assert-zero opcode either checks
//! an expression whose wires are all known or solves for the single unknown
//! wire it is linear in. Directives compute their outputs from known inputs;
//! range opcodes check their input. Solving is deterministic: the same
//! circuit and initial witness always produce the same assignment.

// Field and big integer arithmetic is modular or unbounded.
#![allow(clippy::arithmetic_side_effects)]

use std::collections::BTreeMap;

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, Field};
use circuit::{Circuit, Directive, Expression, Opcode};
use num_bigint::BigUint;
use num_traits::Zero;
use types::{Witness, WitnessMap, fr_to_bigint};

use crate::SolverError;

/// Why a single opcode could not be processed
#[derive(Debug)]
enum OpcodeFailure {
    /// The constraint is violated by the known values
    Unsatisfied(String),
    /// Not enough is known to make progress
    Stalled(String),
}

/// Extend `initial` to a full assignment of every wire in the circuit
pub fn solve(circuit: &Circuit, initial: WitnessMap) -> Result<WitnessMap, SolverError> {
    let mut witness = initial;

    for w in circuit
        .private_parameters
        .iter()
        .chain(&circuit.public_parameters)
    {
        if !witness.contains(w) {
            return Err(SolverError::MissingAssignment(*w));
        }
    }

    for (opcode_index, opcode) in circuit.opcodes.iter().enumerate() {
        let step = match opcode {
            Opcode::AssertZero(expr) => solve_assert_zero(expr, &mut witness),
            Opcode::Range { input, num_bits } => check_range(*input, *num_bits, &witness),
            Opcode::Directive(directive) => solve_directive(directive, &mut witness),
        };
        step.map_err(|failure| match failure {
            OpcodeFailure::Unsatisfied(reason) => {
                log::debug!("opcode {} failed: {}", opcode_index, opcode);
                SolverError::UnsatisfiableConstraint {
                    opcode_index,
                    reason,
                }
            }
            OpcodeFailure::Stalled(reason) => SolverError::Unsolvable {
                opcode_index,
                reason,
            },
        })?;
    }

    if let Some(missing) = witness.first_gap(circuit.num_witnesses()) {
        return Err(SolverError::MissingAssignment(missing));
    }
    log::trace!(
        "solved {} wires over {} opcodes",
        witness.len(),
        circuit.opcodes.len()
    );
    Ok(witness)
}

fn value_of(witness: &WitnessMap, w: Witness) -> Result<Fr, OpcodeFailure> {
    witness
        .get(&w)
        .copied()
        .ok_or_else(|| OpcodeFailure::Stalled(format!("wire {} is not yet known", w)))
}

/// Write a wire, rejecting a conflicting earlier assignment
fn assign(witness: &mut WitnessMap, w: Witness, value: Fr) -> Result<(), OpcodeFailure> {
    match witness.get(&w) {
        Some(existing) if *existing != value => Err(OpcodeFailure::Unsatisfied(format!(
            "wire {} is already assigned a different value",
            w
        ))),
        _ => {
            witness.insert(w, value);
            Ok(())
        }
    }
}

fn solve_assert_zero(expr: &Expression, witness: &mut WitnessMap) -> Result<(), OpcodeFailure> {
    let mut constant = expr.q_c;
    // Coefficients of wires not yet assigned
    let mut unknowns: BTreeMap<Witness, Fr> = BTreeMap::new();

    for term in &expr.mul_terms {
        if term.q.is_zero() {
            continue;
        }
        match (witness.get(&term.lhs), witness.get(&term.rhs)) {
            (Some(a), Some(b)) => constant += term.q * a * b,
            (Some(a), None) => *unknowns.entry(term.rhs).or_insert(Fr::ZERO) += term.q * a,
            (None, Some(b)) => *unknowns.entry(term.lhs).or_insert(Fr::ZERO) += term.q * b,
            (None, None) => {
                return Err(OpcodeFailure::Stalled(format!(
                    "product {}*{} has two unknown factors",
                    term.lhs, term.rhs
                )));
            }
        }
    }
    for term in &expr.linear_combinations {
        match witness.get(&term.witness) {
            Some(v) => constant += term.q * v,
            None => *unknowns.entry(term.witness).or_insert(Fr::ZERO) += term.q,
        }
    }
    unknowns.retain(|_, q| !q.is_zero());

    match unknowns.len() {
        0 if constant.is_zero() => Ok(()),
        0 => Err(OpcodeFailure::Unsatisfied(String::from(
            "expression does not evaluate to zero",
        ))),
        1 => {
            let (w, q) = unknowns
                .into_iter()
                .next()
                .ok_or_else(|| OpcodeFailure::Stalled(String::from("no unknown")))?;
            let q_inv = q
                .inverse()
                .ok_or_else(|| OpcodeFailure::Stalled(format!("zero coefficient on {}", w)))?;
            assign(witness, w, -constant * q_inv)
        }
        n => Err(OpcodeFailure::Stalled(format!(
            "{} unknown wires in one expression",
            n
        ))),
    }
}

fn check_range(input: Witness, num_bits: u32, witness: &WitnessMap) -> Result<(), OpcodeFailure> {
    let value = value_of(witness, input)?;
    let bits = fr_to_bigint(&value).bits();
    if bits > u64::from(num_bits) {
        return Err(OpcodeFailure::Unsatisfied(format!(
            "{} does not fit in {} bits",
            input, num_bits
        )));
    }
    Ok(())
}

fn solve_directive(directive: &Directive, witness: &mut WitnessMap) -> Result<(), OpcodeFailure> {
    match directive {
        Directive::Invert { input, output } => {
            let value = value_of(witness, *input)?;
            assign(witness, *output, value.inverse().unwrap_or(Fr::ZERO))
        }
        Directive::ToLeRadix {
            input,
            outputs,
            radix,
        } => {
            let mut remaining = fr_to_bigint(&value_of(witness, *input)?);
            let radix = BigUint::from(*radix);
            for out in outputs {
                let digit = &remaining % &radix;
                remaining /= &radix;
                assign(witness, *out, Fr::from(digit))?;
            }
            if !remaining.is_zero() {
                return Err(OpcodeFailure::Unsatisfied(format!(
                    "{} does not fit in {} digits",
                    input,
                    outputs.len()
                )));
            }
            Ok(())
        }
        Directive::Quotient { a, b, q, r } => {
            let dividend = fr_to_bigint(&value_of(witness, *a)?);
            let divisor = fr_to_bigint(&value_of(witness, *b)?);
            if divisor.is_zero() {
                return Err(OpcodeFailure::Unsatisfied(format!("division of {} by zero", a)));
            }
            assign(witness, *q, Fr::from(&dividend / &divisor))?;
            assign(witness, *r, Fr::from(&dividend % &divisor))
        }
    }
}
