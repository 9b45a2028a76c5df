//! Full runs from input documents to verified proofs

use anyhow::Result;
use ark_bn254::Fr;
use pipeline::{MemorySink, Outcome, messages};
use prover::{Backend, PROOF_SIZE, ProverError, keys};
use serde_json::json;
use witness::SolverError;

use super::utils::{SEED, cubic_artifact, load_artifact, load_inputs};

#[test]
fn test_fixture_artifact_proves() -> Result<()> {
    let artifact = load_artifact("range_product.json")?;
    let inputs = load_inputs("range_product_inputs.json")?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;

    let mut sink = MemorySink::default();
    let outcome = pipeline::run(&artifact, &inputs, &backend, &mut sink);
    let Outcome::Completed {
        proof,
        valid,
        return_value,
    } = outcome
    else {
        panic!("run failed: {:?}", sink.logs);
    };
    assert!(valid);
    assert_eq!(proof.public_inputs, vec![Fr::from(3200u64)]);
    assert_eq!(return_value, Some(json!(format!("0x{:064x}", 3200))));
    assert_eq!(
        sink.logs,
        vec![
            messages::GENERATING_WITNESS,
            messages::GENERATED_WITNESS,
            messages::GENERATING_PROOF,
            messages::GENERATED_PROOF,
            messages::VERIFYING_PROOF,
            messages::PROOF_VALID,
        ]
    );
    assert_eq!(sink.results, vec![proof.proof_hex()]);
    Ok(())
}

#[test]
fn test_out_of_range_input_is_reported() -> Result<()> {
    let artifact = load_artifact("range_product.json")?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;

    let mut sink = MemorySink::default();
    let outcome = pipeline::run(&artifact, &json!({"x": 256, "y": 1}), &backend, &mut sink);
    assert!(!outcome.is_valid());
    assert_eq!(sink.logs.len(), 2);
    assert!(sink.logs[1].starts_with(messages::FAILURE_PREFIX));
    assert!(sink.results.is_empty());
    Ok(())
}

#[test]
fn test_standalone_verifier() -> Result<()> {
    let artifact = cubic_artifact()?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;
    let vk = keys::verifying_key_from_bytes(&keys::verifying_key_to_bytes(
        backend.verifying_key(),
    )?)?;

    // 3^3 + 3 + 5 = 35
    let execution = witness::execute(&artifact, &json!({"x": 3, "out": 35}))?;
    let data = backend.generate_proof(&execution.witness)?;
    assert_eq!(data.proof.len(), PROOF_SIZE);
    assert_eq!(data.public_inputs, vec![Fr::from(35u64), Fr::from(38u64)]);
    assert!(prover::verify(&vk, &data.proof, &data.public_inputs)?);

    // Swapped public inputs describe a different statement
    let swapped = vec![data.public_inputs[1], data.public_inputs[0]];
    assert!(!prover::verify(&vk, &data.proof, &swapped)?);
    Ok(())
}

#[test]
fn test_wrong_preimage_is_unsatisfiable() -> Result<()> {
    let artifact = cubic_artifact()?;
    let err = witness::execute(&artifact, &json!({"x": 3, "out": 36})).unwrap_err();
    assert!(matches!(err, SolverError::UnsatisfiableConstraint { .. }));
    Ok(())
}

#[test]
fn test_keys_from_other_seed_reject() -> Result<()> {
    let artifact = cubic_artifact()?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;
    let other = Backend::from_seed(artifact.circuit.clone(), SEED + 1)?;

    let execution = witness::execute(&artifact, &json!({"x": 2, "out": 15}))?;
    let data = backend.generate_proof(&execution.witness)?;
    assert!(backend.verify_proof(&data)?);
    assert!(!other.verify_proof(&data)?);
    Ok(())
}

#[test]
fn test_many_proofs_verify_in_any_order() -> Result<()> {
    let artifact = cubic_artifact()?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;

    let proofs = (1u64..=4)
        .map(|x| {
            let out = x * x * x + x + 5;
            let execution = witness::execute(&artifact, &json!({"x": x, "out": out}))?;
            Ok(backend.generate_proof(&execution.witness)?)
        })
        .collect::<Result<Vec<_>>>()?;

    for data in proofs.iter().rev().chain(proofs.iter().step_by(2)) {
        assert!(backend.verify_proof(data)?);
    }
    // A proof checked against another proof's statement fails
    assert!(!prover::verify(
        backend.verifying_key(),
        &proofs[0].proof,
        &proofs[1].public_inputs
    )?);
    Ok(())
}

#[test]
fn test_truncated_proof_is_malformed() -> Result<()> {
    let artifact = cubic_artifact()?;
    let backend = Backend::from_seed(artifact.circuit.clone(), SEED)?;
    let execution = witness::execute(&artifact, &json!({"x": 1, "out": 7}))?;
    let mut data = backend.generate_proof(&execution.witness)?;
    data.proof.truncate(PROOF_SIZE - 1);
    assert!(matches!(
        backend.verify_proof(&data),
        Err(ProverError::MalformedProof(_))
    ));
    Ok(())
}
