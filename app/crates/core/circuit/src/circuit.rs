//! The circuit container and its structural checks

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use types::Witness;

use crate::{
    CircuitError, MAX_RANGE_BITS,
    opcodes::{Directive, Opcode},
};

/// An ordered list of opcodes over the wires `0..=current_witness_index`.
///
/// Parameter wires are assigned from inputs; every other wire is derived by
/// the witness solver. The public inputs of a proof are the public
/// parameters followed by the return values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    /// Highest wire index in use
    pub current_witness_index: u32,
    /// Constraints and hints, in solving order
    pub opcodes: Vec<Opcode>,
    /// Input wires known only to the prover
    #[serde(default)]
    pub private_parameters: Vec<Witness>,
    /// Input wires revealed to the verifier
    #[serde(default)]
    pub public_parameters: Vec<Witness>,
    /// Output wires revealed to the verifier
    #[serde(default)]
    pub return_values: Vec<Witness>,
}

impl Circuit {
    /// Number of wires, `current_witness_index + 1`
    pub fn num_witnesses(&self) -> u32 {
        self.current_witness_index.saturating_add(1)
    }

    /// Wires exposed as public inputs, in the order the verifier expects
    /// them: public parameters first, then return values, without repeats.
    pub fn public_inputs(&self) -> Vec<Witness> {
        let mut seen = BTreeSet::new();
        self.public_parameters
            .iter()
            .chain(&self.return_values)
            .copied()
            .filter(|w| seen.insert(*w))
            .collect()
    }

    /// Number of assert-zero opcodes
    pub fn num_assertions(&self) -> usize {
        self.opcodes
            .iter()
            .filter(|op| matches!(op, Opcode::AssertZero(_)))
            .count()
    }

    /// Check the circuit is well formed
    pub fn validate(&self) -> Result<(), CircuitError> {
        let last = Witness(self.current_witness_index);

        let mut parameters = BTreeSet::new();
        for w in self.private_parameters.iter().chain(&self.public_parameters) {
            if *w > last {
                return Err(CircuitError::ParameterOutOfRange(*w));
            }
            if !parameters.insert(*w) {
                return Err(CircuitError::DuplicateParameter(*w));
            }
        }
        if let Some(w) = self.return_values.iter().find(|w| **w > last) {
            return Err(CircuitError::ParameterOutOfRange(*w));
        }

        for (opcode_index, opcode) in self.opcodes.iter().enumerate() {
            if let Some(witness) = opcode.witnesses().into_iter().find(|w| *w > last) {
                return Err(CircuitError::WitnessOutOfRange {
                    opcode_index,
                    witness,
                    last,
                });
            }
            match opcode {
                Opcode::Range { num_bits, .. }
                    if *num_bits == 0 || *num_bits > MAX_RANGE_BITS =>
                {
                    return Err(CircuitError::InvalidRange {
                        opcode_index,
                        num_bits: *num_bits,
                    });
                }
                Opcode::Directive(Directive::ToLeRadix { radix, .. })
                    if *radix < 2 || *radix > 256 || !radix.is_power_of_two() =>
                {
                    return Err(CircuitError::InvalidRadix {
                        opcode_index,
                        radix: *radix,
                    });
                }
                _ => {}
            }
        }
        log::trace!(
            "circuit validated: {} wires, {} opcodes",
            self.num_witnesses(),
            self.opcodes.len()
        );
        Ok(())
    }
}
