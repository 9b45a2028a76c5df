//! End-to-end run of a program: solve the witness, prove, verify.
//!
//! Each stage reports to a [`ProgressSink`]. Any failure ends the run and
//! is shown as a single line; nothing is retried.

mod sink;

pub use sink::{LogSink, MemorySink, ProgressSink, Target};

use core::fmt;

use circuit::Artifact;
use prover::{Backend, ProofData, ProverError};
use serde_json::Value;
use witness::SolverError;

/// Progress lines, in the order they are shown
pub mod messages {
    /// Before witness solving
    pub const GENERATING_WITNESS: &str = "Generating witness... ⏳";
    /// After witness solving
    pub const GENERATED_WITNESS: &str = "Generated witness... ✅";
    /// Before proving
    pub const GENERATING_PROOF: &str = "Generating proof... ⏳";
    /// After proving
    pub const GENERATED_PROOF: &str = "Generated proof... ✅";
    /// Before verification
    pub const VERIFYING_PROOF: &str = "Verifying proof... ⌛";
    /// Verification accepted the proof
    pub const PROOF_VALID: &str = "Proof is valid... ✅";
    /// Verification rejected the proof
    pub const PROOF_INVALID: &str = "Proof is invalid... ✅";
    /// Prefix of the failure line
    pub const FAILURE_PREFIX: &str = "Oh 💔";
}

/// Errors from any stage of a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Witness generation failed
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// Proving or verification failed
    #[error(transparent)]
    Prover(#[from] ProverError),
}

/// How a run ended
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A proof was produced and checked
    Completed {
        /// The proof and its public inputs
        proof: ProofData,
        /// Verifier verdict
        valid: bool,
        /// Decoded return value, if any
        return_value: Option<Value>,
    },
    /// A stage failed; carries the line that was shown
    Failed(String),
}

impl Outcome {
    /// Whether a proof was produced and accepted
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Completed { valid: true, .. })
    }
}

/// Run the program on `inputs`, reporting progress to `sink`
pub fn run<S: ProgressSink + ?Sized>(
    artifact: &Artifact,
    inputs: &Value,
    backend: &Backend,
    sink: &mut S,
) -> Outcome {
    match try_run(artifact, inputs, backend, sink) {
        Ok(outcome) => outcome,
        Err(err) => {
            log::warn!("run of {} failed: {}", artifact.name, err);
            fail(sink, err)
        }
    }
}

/// Show `err` as the single failure line and return the failed outcome.
///
/// Front ends use this for errors raised before [`run`] can start, such as
/// an artifact that does not load.
pub fn fail<S: ProgressSink + ?Sized>(sink: &mut S, err: impl fmt::Display) -> Outcome {
    let line = format!("{}{}", messages::FAILURE_PREFIX, err);
    sink.show(Target::Logs, &line);
    Outcome::Failed(line)
}

fn try_run<S: ProgressSink + ?Sized>(
    artifact: &Artifact,
    inputs: &Value,
    backend: &Backend,
    sink: &mut S,
) -> Result<Outcome, PipelineError> {
    sink.show(Target::Logs, messages::GENERATING_WITNESS);
    let execution = witness::execute(artifact, inputs)?;
    sink.show(Target::Logs, messages::GENERATED_WITNESS);

    sink.show(Target::Logs, messages::GENERATING_PROOF);
    let proof = backend.generate_proof(&execution.witness)?;
    sink.show(Target::Logs, messages::GENERATED_PROOF);
    sink.show(Target::Results, &proof.proof_hex());

    sink.show(Target::Logs, messages::VERIFYING_PROOF);
    let valid = backend.verify_proof(&proof)?;
    sink.show(
        Target::Logs,
        if valid {
            messages::PROOF_VALID
        } else {
            messages::PROOF_INVALID
        },
    );

    Ok(Outcome::Completed {
        proof,
        valid,
        return_value: execution.return_value,
    })
}
