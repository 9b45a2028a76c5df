//! Opcodes and arithmetic expressions

// Field arithmetic is modular and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use ark_bn254::Fr;
use ark_ff::{AdditiveGroup, Field};
use serde::{Deserialize, Serialize};
use types::{Witness, WitnessMap, field::field_serde};

/// Product term `q * lhs * rhs`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulTerm {
    /// Coefficient
    #[serde(with = "field_serde")]
    pub q: Fr,
    /// Left factor
    pub lhs: Witness,
    /// Right factor
    pub rhs: Witness,
}

/// Linear term `q * witness`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearTerm {
    /// Coefficient
    #[serde(with = "field_serde")]
    pub q: Fr,
    /// Wire
    pub witness: Witness,
}

/// Quadratic expression `Σ q·a·b + Σ q·w + q_c`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Product terms
    #[serde(default)]
    pub mul_terms: Vec<MulTerm>,
    /// Linear terms
    #[serde(default)]
    pub linear_combinations: Vec<LinearTerm>,
    /// Constant term
    #[serde(with = "field_serde")]
    pub q_c: Fr,
}

impl Default for Expression {
    fn default() -> Self {
        Self::zero()
    }
}

impl Expression {
    /// The empty expression
    pub fn zero() -> Self {
        Self {
            mul_terms: Vec::new(),
            linear_combinations: Vec::new(),
            q_c: Fr::ZERO,
        }
    }

    /// A constant expression
    pub fn constant(value: Fr) -> Self {
        Self {
            q_c: value,
            ..Self::zero()
        }
    }

    /// The expression `1 * witness`
    pub fn from_witness(witness: Witness) -> Self {
        Self::zero().add_linear(Fr::ONE, witness)
    }

    /// Append a product term
    pub fn add_mul(mut self, q: Fr, lhs: Witness, rhs: Witness) -> Self {
        self.mul_terms.push(MulTerm { q, lhs, rhs });
        self
    }

    /// Append a linear term
    pub fn add_linear(mut self, q: Fr, witness: Witness) -> Self {
        self.linear_combinations.push(LinearTerm { q, witness });
        self
    }

    /// Add to the constant term
    pub fn add_constant(mut self, value: Fr) -> Self {
        self.q_c += value;
        self
    }

    /// Whether the expression has no product terms
    pub fn is_linear(&self) -> bool {
        self.mul_terms.is_empty()
    }

    /// Every wire the expression mentions, in order of appearance
    pub fn witnesses(&self) -> impl Iterator<Item = Witness> + '_ {
        self.mul_terms
            .iter()
            .flat_map(|t| [t.lhs, t.rhs])
            .chain(self.linear_combinations.iter().map(|t| t.witness))
    }

    /// Evaluate under a full assignment; `None` if a wire is unassigned
    pub fn evaluate(&self, witness: &WitnessMap) -> Option<Fr> {
        let mut acc = self.q_c;
        for term in &self.mul_terms {
            acc += term.q * witness.get(&term.lhs)? * witness.get(&term.rhs)?;
        }
        for term in &self.linear_combinations {
            acc += term.q * witness.get(&term.witness)?;
        }
        Some(acc)
    }
}

/// Unconstrained hints evaluated by the witness solver.
///
/// Directives add no constraints; a circuit that relies on a directive's
/// output must constrain it with other opcodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// `output = 1 / input`, or `0` when `input = 0`
    Invert {
        /// Value to invert
        input: Witness,
        /// Receives the inverse
        output: Witness,
    },
    /// Little-endian digits of `input` in base `radix`
    ToLeRadix {
        /// Value to decompose
        input: Witness,
        /// Receive the digits, least significant first
        outputs: Vec<Witness>,
        /// Base of the decomposition
        radix: u32,
    },
    /// Integer division `a = q * b + r` with `r < b`
    Quotient {
        /// Dividend
        a: Witness,
        /// Divisor
        b: Witness,
        /// Receives the quotient
        q: Witness,
        /// Receives the remainder
        r: Witness,
    },
}

impl Directive {
    /// Wires the directive reads
    pub fn inputs(&self) -> Vec<Witness> {
        match self {
            Directive::Invert { input, .. } | Directive::ToLeRadix { input, .. } => vec![*input],
            Directive::Quotient { a, b, .. } => vec![*a, *b],
        }
    }

    /// Wires the directive writes
    pub fn outputs(&self) -> Vec<Witness> {
        match self {
            Directive::Invert { output, .. } => vec![*output],
            Directive::ToLeRadix { outputs, .. } => outputs.clone(),
            Directive::Quotient { q, r, .. } => vec![*q, *r],
        }
    }
}

/// A single step of a circuit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    /// Constrain an expression to equal zero
    AssertZero(Expression),
    /// Constrain `0 <= input < 2^num_bits`
    Range {
        /// Constrained wire
        input: Witness,
        /// Bit width
        num_bits: u32,
    },
    /// Unconstrained solver hint
    Directive(Directive),
}

impl Opcode {
    /// Every wire the opcode mentions
    pub fn witnesses(&self) -> Vec<Witness> {
        match self {
            Opcode::AssertZero(expr) => expr.witnesses().collect(),
            Opcode::Range { input, .. } => vec![*input],
            Opcode::Directive(directive) => {
                let mut all = directive.inputs();
                all.extend(directive.outputs());
                all
            }
        }
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Opcode::AssertZero(expr) => {
                write!(f, "ASSERT 0 = ")?;
                for t in &expr.mul_terms {
                    write!(f, "{}*{}*{} + ", t.q, t.lhs, t.rhs)?;
                }
                for t in &expr.linear_combinations {
                    write!(f, "{}*{} + ", t.q, t.witness)?;
                }
                write!(f, "{}", expr.q_c)
            }
            Opcode::Range { input, num_bits } => write!(f, "RANGE {input} < 2^{num_bits}"),
            Opcode::Directive(Directive::Invert { input, output }) => {
                write!(f, "DIRECTIVE {output} = 1/{input}")
            }
            Opcode::Directive(Directive::ToLeRadix {
                input,
                outputs,
                radix,
            }) => write!(f, "DIRECTIVE {input} -> {} base-{radix} digits", outputs.len()),
            Opcode::Directive(Directive::Quotient { a, b, q, r }) => {
                write!(f, "DIRECTIVE ({q}, {r}) = {a} divmod {b}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        // 2*w0*w1 + 3*w2 - 10
        let expr = Expression::constant(-Fr::from(10u64))
            .add_mul(Fr::from(2u64), Witness(0), Witness(1))
            .add_linear(Fr::from(3u64), Witness(2));
        let witness = WitnessMap::from(vec![Fr::from(1u64), Fr::from(2u64), Fr::from(2u64)]);
        assert_eq!(expr.evaluate(&witness), Some(Fr::ZERO));

        let partial = WitnessMap::from(vec![Fr::from(1u64)]);
        assert_eq!(expr.evaluate(&partial), None);
    }

    #[test]
    fn test_opcode_json_shape() {
        let op = Opcode::Range {
            input: Witness(3),
            num_bits: 8,
        };
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"range":{"input":3,"num_bits":8}}"#);

        let parsed: Opcode = serde_json::from_str(
            r#"{"assert_zero":{"linear_combinations":[{"q":"-1","witness":1}],"q_c":"5"}}"#,
        )
        .unwrap();
        let Opcode::AssertZero(expr) = parsed else {
            panic!("expected assert_zero");
        };
        assert!(expr.is_linear());
        assert_eq!(expr.q_c, Fr::from(5u64));
        assert_eq!(expr.linear_combinations[0].q, -Fr::ONE);
    }

    #[test]
    fn test_directive_wires() {
        let d = Directive::Quotient {
            a: Witness(0),
            b: Witness(1),
            q: Witness(2),
            r: Witness(3),
        };
        assert_eq!(d.inputs(), vec![Witness(0), Witness(1)]);
        assert_eq!(d.outputs(), vec![Witness(2), Witness(3)]);
        assert_eq!(Opcode::Directive(d).witnesses().len(), 4);
    }
}
