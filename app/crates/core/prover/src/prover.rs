//! Groth16 proof generation and verification
//!
//! A [`Backend`] owns a circuit and its keys. Proofs are produced from a
//! solved [`WitnessMap`] and verified against the prepared verifying key;
//! [`verify`] checks a proof with nothing but the verifying key.

use ark_bn254::{Bn254, Fr};
use ark_ff::AdditiveGroup;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use circuit::{Circuit, Opcode, r1cs::witness_from_circom};
use rand::{CryptoRng, RngCore, rngs::OsRng};
use types::{WitnessMap, fr_to_bigint};

use crate::{
    ProverError, encoding, keys,
    proof::{PROOF_SIZE, ProofData},
    synthesis::{CircuitSynthesizer, constraint_count},
};

/// Proving backend for a single circuit
pub struct Backend {
    circuit: Circuit,
    pk: ProvingKey<Bn254>,
    pvk: PreparedVerifyingKey<Bn254>,
}

impl Backend {
    /// Wrap a circuit and a proving key generated for it
    pub fn new(circuit: Circuit, pk: ProvingKey<Bn254>) -> Result<Self, ProverError> {
        keys::check_key(&circuit, &pk.vk)?;
        let pvk = Groth16::<Bn254>::process_vk(&pk.vk)
            .map_err(|e| ProverError::Key(format!("Failed to process verifying key: {}", e)))?;
        Ok(Self { circuit, pk, pvk })
    }

    /// Generate fresh keys and wrap them
    pub fn setup<R: RngCore + CryptoRng>(
        circuit: Circuit,
        rng: &mut R,
    ) -> Result<Self, ProverError> {
        let (pk, _) = keys::setup(&circuit, rng)?;
        Self::new(circuit, pk)
    }

    /// Deterministic development keys, see [`keys::setup_with_seed`]
    pub fn from_seed(circuit: Circuit, seed: u64) -> Result<Self, ProverError> {
        let (pk, _) = keys::setup_with_seed(&circuit, seed)?;
        Self::new(circuit, pk)
    }

    /// Load a serialized proving key
    pub fn from_key_bytes(circuit: Circuit, pk_bytes: &[u8]) -> Result<Self, ProverError> {
        let pk = keys::proving_key_from_bytes(pk_bytes)?;
        Self::new(circuit, pk)
    }

    /// The circuit being proven
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Proving key
    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.pk
    }

    /// Verifying key
    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.pk.vk
    }

    /// Number of public inputs a proof carries
    pub fn num_public_inputs(&self) -> usize {
        keys::num_public_inputs(&self.pk.vk)
    }

    /// Number of R1CS constraints
    pub fn num_constraints(&self) -> usize {
        constraint_count(&self.circuit)
    }

    /// Public input values of a solved witness, in verifier order
    pub fn public_inputs(&self, witness: &WitnessMap) -> Result<Vec<Fr>, ProverError> {
        self.circuit
            .public_inputs()
            .iter()
            .map(|w| {
                witness
                    .get(w)
                    .copied()
                    .ok_or_else(|| ProverError::Proving(format!("public wire {} is unassigned", w)))
            })
            .collect()
    }

    /// Prove that `witness` satisfies the circuit
    pub fn generate_proof(&self, witness: &WitnessMap) -> Result<ProofData, ProverError> {
        let num_wires = self.circuit.num_witnesses();
        if let Some(missing) = witness.first_gap(num_wires) {
            return Err(ProverError::Proving(format!(
                "witness has no value for wire {}",
                missing
            )));
        }
        if witness.len() != num_wires as usize {
            return Err(ProverError::Proving(format!(
                "witness has {} values, circuit has {} wires",
                witness.len(),
                num_wires
            )));
        }
        check_satisfied(&self.circuit, witness)?;

        let public_inputs = self.public_inputs(witness)?;
        let proof = Groth16::<Bn254>::prove(
            &self.pk,
            CircuitSynthesizer::for_proving(&self.circuit, witness),
            &mut OsRng,
        )
        .map_err(|e| ProverError::Proving(format!("Proof generation failed: {}", e)))?;

        let mut bytes = Vec::with_capacity(PROOF_SIZE);
        proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProverError::Proving(format!("Failed to serialize proof: {}", e)))?;
        log::debug!(
            "generated proof with {} public inputs",
            public_inputs.len()
        );
        Ok(ProofData {
            proof: bytes,
            public_inputs,
        })
    }

    /// Prove from a dense little-endian witness whose first element is the
    /// constant one, as emitted by circom-style witness calculators
    pub fn generate_proof_from_bytes(
        &self,
        witness_bytes: &[u8],
    ) -> Result<ProofData, ProverError> {
        let witness = witness_from_circom(witness_bytes)
            .map_err(|e| ProverError::Proving(format!("Invalid witness: {}", e)))?;
        self.generate_proof(&witness)
    }

    /// Proof re-encoded for on-chain verifiers
    pub fn generate_proof_uncompressed(
        &self,
        witness: &WitnessMap,
    ) -> Result<Vec<u8>, ProverError> {
        let data = self.generate_proof(witness)?;
        encoding::convert_proof(&data.proof)
    }

    /// Check a proof against this backend's verifying key
    pub fn verify_proof(&self, data: &ProofData) -> Result<bool, ProverError> {
        let proof = decode_proof(&data.proof)?;
        check_arity(self.num_public_inputs(), data.public_inputs.len())?;
        Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, &data.public_inputs, &proof)
            .map_err(|e| ProverError::Verification(e.to_string()))
    }
}

/// Check a compressed proof with only the verifying key.
///
/// Byte strings that are not a well-formed proof fail with
/// [`ProverError::MalformedProof`]; well-formed but invalid proofs return
/// `Ok(false)`.
pub fn verify(
    vk: &VerifyingKey<Bn254>,
    proof: &[u8],
    public_inputs: &[Fr],
) -> Result<bool, ProverError> {
    let proof = decode_proof(proof)?;
    check_arity(keys::num_public_inputs(vk), public_inputs.len())?;
    Groth16::<Bn254>::verify(vk, public_inputs, &proof)
        .map_err(|e| ProverError::Verification(e.to_string()))
}

fn decode_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProverError> {
    if bytes.len() != PROOF_SIZE {
        return Err(ProverError::MalformedProof(format!(
            "expected {} bytes, got {}",
            PROOF_SIZE,
            bytes.len()
        )));
    }
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ProverError::MalformedProof(e.to_string()))
}

fn check_arity(expected: usize, actual: usize) -> Result<(), ProverError> {
    if expected != actual {
        return Err(ProverError::PublicInputs(format!(
            "got {}, expected {}",
            actual, expected
        )));
    }
    Ok(())
}

/// Evaluate constraints directly so an unsatisfying witness is reported
/// instead of yielding a proof that cannot verify
fn check_satisfied(circuit: &Circuit, witness: &WitnessMap) -> Result<(), ProverError> {
    for (idx, opcode) in circuit.opcodes.iter().enumerate() {
        let holds = match opcode {
            Opcode::AssertZero(expr) => expr.evaluate(witness) == Some(Fr::ZERO),
            Opcode::Range { input, num_bits } => witness
                .get(input)
                .is_some_and(|v| fr_to_bigint(v).bits() <= u64::from(*num_bits)),
            Opcode::Directive(_) => true,
        };
        if !holds {
            return Err(ProverError::Proving(format!(
                "witness does not satisfy opcode {}: {}",
                idx, opcode
            )));
        }
    }
    Ok(())
}
