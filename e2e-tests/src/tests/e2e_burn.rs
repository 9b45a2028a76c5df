//! Proof of burn: a private secret opens a public burn address and nullifier

use anyhow::Result;
use ark_bn254::Fr;
use pipeline::{MemorySink, Outcome};
use prover::Backend;
use serde_json::json;
use types::field::fr_to_hex;
use witness::SolverError;

use super::utils::{POW_BITS, SEED, burn_artifact, find_secret};

#[test]
fn test_burn_proof_reveals_address_and_nullifier() -> Result<()> {
    let artifact = burn_artifact()?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;
    let secret = find_secret(0xb0b, POW_BITS, true);
    let address = circuit::mimc7(secret, Fr::from(0u64));
    let nullifier = circuit::mimc7(secret, Fr::from(1u64));

    let mut sink = MemorySink::default();
    let inputs = json!({ "secret": fr_to_hex(&secret) });
    let Outcome::Completed {
        proof,
        valid,
        return_value,
    } = pipeline::run(&artifact, &inputs, &backend, &mut sink)
    else {
        panic!("run failed: {:?}", sink.logs);
    };
    assert!(valid);
    assert_eq!(proof.public_inputs, vec![address, nullifier]);
    assert_eq!(
        return_value,
        Some(json!({
            "address": fr_to_hex(&address),
            "nullifier": fr_to_hex(&nullifier),
        }))
    );
    Ok(())
}

#[test]
fn test_burn_proof_rejects_other_nullifier() -> Result<()> {
    let artifact = burn_artifact()?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;
    let secret = find_secret(0xb0b, POW_BITS, true);
    let execution = witness::execute(&artifact, &json!({ "secret": fr_to_hex(&secret) }))?;
    let mut data = backend.generate_proof(&execution.witness)?;
    assert!(backend.verify_proof(&data)?);

    // Claiming the nullifier of another secret
    let other = find_secret(0xa11ce, POW_BITS, true);
    data.public_inputs[1] = circuit::mimc7(other, Fr::from(1u64));
    assert!(!backend.verify_proof(&data)?);
    Ok(())
}

#[test]
fn test_burn_secret_without_work_is_rejected() -> Result<()> {
    let artifact = burn_artifact()?;
    let secret = find_secret(0xb0b, POW_BITS, false);
    let result = witness::execute(&artifact, &json!({ "secret": fr_to_hex(&secret) }));
    assert!(matches!(result, Err(SolverError::UnsatisfiableConstraint { .. })));
    Ok(())
}
