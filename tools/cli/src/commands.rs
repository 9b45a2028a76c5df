//! Subcommand implementations

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use circuit::{Artifact, r1cs::R1cs};
use clap::Args;
use pipeline::{LogSink, Outcome, ProgressSink, Target};
use prover::{Backend, ProofData, encoding, keys, synthesis::constraint_count};
use rand::rngs::OsRng;
use serde_json::Value;
use types::WitnessMap;

use crate::config::Config;

/// Artifact selection shared by most subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct ArtifactArg {
    /// Program artifact (JSON)
    #[arg(short, long)]
    pub artifact: Option<PathBuf>,
}

impl ArtifactArg {
    fn load(&self, config: &Config) -> Result<Artifact> {
        let path = self
            .artifact
            .clone()
            .or_else(|| config.artifact.clone())
            .context("No artifact given; pass --artifact or set `artifact` in the config")?;
        Artifact::from_file(&path)
            .with_context(|| format!("Failed to load artifact {}", path.display()))
    }
}

fn keys_dir(arg: &Option<PathBuf>, config: &Config) -> PathBuf {
    arg.clone().unwrap_or_else(|| config.keys_dir())
}

fn key_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (dir.join(format!("{name}.pk")), dir.join(format!("{name}.vk")))
}

fn hash_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.hash"))
}

/// Read `<name>.pk`, refusing keys that `setup` recorded for another circuit
fn read_proving_key(dir: &Path, artifact: &Artifact) -> Result<Vec<u8>> {
    let (pk_path, _) = key_paths(dir, &artifact.name);
    let hash_path = hash_path(dir, &artifact.name);
    match fs::read_to_string(&hash_path) {
        Ok(recorded) => {
            let current = artifact.compute_hash()?;
            if recorded.trim() != current {
                bail!(
                    "Keys in {} were generated for circuit {}, but {} has hash {}; rerun setup",
                    dir.display(),
                    recorded.trim(),
                    artifact.name,
                    current
                );
            }
        }
        Err(_) => log::warn!(
            "No {} next to the proving key; cannot tell whether it matches the circuit",
            hash_path.display()
        ),
    }
    fs::read(&pk_path)
        .with_context(|| format!("Failed to read proving key {}", pk_path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn write(path: &Path, bytes: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Arguments of `info`
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
}

/// Print a summary of the artifact
pub fn info(args: &InfoArgs, config: &Config) -> Result<()> {
    let artifact = args.artifact.load(config)?;
    let circuit = &artifact.circuit;
    println!("name:           {}", artifact.name);
    println!("version:        {}", artifact.version);
    println!("hash:           {}", artifact.compute_hash()?);
    println!("wires:          {}", circuit.num_witnesses());
    println!("opcodes:        {}", circuit.opcodes.len());
    println!("assertions:     {}", circuit.num_assertions());
    println!("r1cs rows:      {}", constraint_count(circuit));
    println!("public inputs:  {}", circuit.public_inputs().len());
    for (param, wires) in artifact.abi.layout() {
        println!(
            "  {:<12} {:?} {:?} wires {}..{}",
            param.name, param.visibility, param.typ, wires.start, wires.end
        );
    }
    Ok(())
}

/// Arguments of `setup`
#[derive(Args, Debug)]
pub struct SetupArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
    /// Output directory for `<name>.pk`, `<name>.vk` and the circuit `<name>.hash`
    #[arg(long)]
    keys_dir: Option<PathBuf>,
    /// Derive keys from a seed. Insecure, for development only.
    #[arg(long)]
    seed: Option<u64>,
}

/// Generate and store keys; returns the key paths
pub fn setup(args: &SetupArgs, config: &Config) -> Result<(PathBuf, PathBuf)> {
    let artifact = args.artifact.load(config)?;
    let (pk, vk) = match args.seed.or(config.seed) {
        Some(seed) => {
            log::warn!("Using seeded keys; anyone with the seed can forge proofs");
            keys::setup_with_seed(&artifact.circuit, seed)?
        }
        None => keys::setup(&artifact.circuit, &mut OsRng)?,
    };
    let dir = keys_dir(&args.keys_dir, config);
    let (pk_path, vk_path) = key_paths(&dir, &artifact.name);
    write(&pk_path, keys::proving_key_to_bytes(&pk)?)?;
    write(&vk_path, keys::verifying_key_to_bytes(&vk)?)?;
    write(&hash_path(&dir, &artifact.name), artifact.compute_hash()?)?;
    println!("Wrote {} and {}", pk_path.display(), vk_path.display());
    Ok((pk_path, vk_path))
}

/// Arguments of `execute`
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
    /// Input document (JSON object keyed by parameter name)
    #[arg(short, long)]
    inputs: Option<PathBuf>,
    /// Where to write the witness bytes
    #[arg(short, long, default_value = "witness.bin")]
    out: PathBuf,
}

/// Solve the witness and write it; returns the decoded return value
pub fn execute(args: &ExecuteArgs, config: &Config) -> Result<Option<Value>> {
    let artifact = args.artifact.load(config)?;
    let inputs_path = args
        .inputs
        .clone()
        .or_else(|| config.inputs.clone())
        .context("No inputs given; pass --inputs or set `inputs` in the config")?;
    let execution = witness::execute(&artifact, &read_json(&inputs_path)?)?;
    write(&args.out, execution.witness.to_bytes()?)?;
    println!(
        "Wrote {} wires to {}",
        execution.witness.len(),
        args.out.display()
    );
    if let Some(value) = &execution.return_value {
        println!("return: {}", value);
    }
    Ok(execution.return_value)
}

/// Arguments of `prove`
#[derive(Args, Debug)]
pub struct ProveArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
    /// Witness bytes from `execute`
    #[arg(short, long, default_value = "witness.bin")]
    witness: PathBuf,
    /// The witness starts with the constant one (Circom layout)
    #[arg(long)]
    circom: bool,
    /// Directory holding the proving key
    #[arg(long)]
    keys_dir: Option<PathBuf>,
    /// Where to write the proof JSON
    #[arg(short, long, default_value = "proof.json")]
    out: PathBuf,
}

/// Prove a stored witness and write the proof JSON
pub fn prove(args: &ProveArgs, config: &Config) -> Result<ProofData> {
    let artifact = args.artifact.load(config)?;
    let pk_bytes = read_proving_key(&keys_dir(&args.keys_dir, config), &artifact)?;
    let backend = Backend::from_key_bytes(artifact.circuit, &pk_bytes)?;

    let witness_bytes = fs::read(&args.witness)
        .with_context(|| format!("Failed to read witness {}", args.witness.display()))?;
    let data = if args.circom {
        backend.generate_proof_from_bytes(&witness_bytes)?
    } else {
        backend.generate_proof(&WitnessMap::from_bytes(&witness_bytes)?)?
    };
    write(&args.out, serde_json::to_string_pretty(&data)?)?;
    println!("Wrote proof to {}", args.out.display());
    Ok(data)
}

/// Arguments of `verify`
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
    /// Verifying key; defaults to `<keys dir>/<name>.vk`
    #[arg(long)]
    vk: Option<PathBuf>,
    /// Directory holding the verifying key
    #[arg(long)]
    keys_dir: Option<PathBuf>,
    /// Proof JSON from `prove`
    #[arg(short, long, default_value = "proof.json")]
    proof: PathBuf,
}

fn vk_path(
    vk: &Option<PathBuf>,
    artifact: &ArtifactArg,
    dir: &Option<PathBuf>,
    config: &Config,
) -> Result<PathBuf> {
    match vk {
        Some(path) => Ok(path.clone()),
        None => {
            let artifact = artifact.load(config)?;
            Ok(key_paths(&keys_dir(dir, config), &artifact.name).1)
        }
    }
}

/// Verify a proof file; prints and returns the verdict
pub fn verify(args: &VerifyArgs, config: &Config) -> Result<bool> {
    let path = vk_path(&args.vk, &args.artifact, &args.keys_dir, config)?;
    let vk_bytes = fs::read(&path)
        .with_context(|| format!("Failed to read verifying key {}", path.display()))?;
    let vk = keys::verifying_key_from_bytes(&vk_bytes)?;
    let data: ProofData = serde_json::from_value(read_json(&args.proof)?)
        .with_context(|| format!("Invalid proof file {}", args.proof.display()))?;
    let valid = prover::verify(&vk, &data.proof, &data.public_inputs)?;
    println!("{}", if valid { "valid" } else { "invalid" });
    Ok(valid)
}

/// Arguments of `run`
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
    /// Input document
    #[arg(short, long)]
    inputs: Option<PathBuf>,
    /// Use `<keys dir>/<name>.pk` when it exists
    #[arg(long)]
    keys_dir: Option<PathBuf>,
    /// Seed for throwaway development keys when no proving key is stored
    #[arg(long)]
    seed: Option<u64>,
}

/// Results go to stdout, progress to the logger
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn show(&mut self, target: Target, message: &str) {
        match target {
            Target::Logs => LogSink.show(target, message),
            Target::Results => println!("{message}"),
        }
    }
}

/// Execute, prove and verify in one go
pub fn run(args: &RunArgs, config: &Config) -> Result<Outcome> {
    let artifact = args.artifact.load(config)?;
    let inputs_path = args
        .inputs
        .clone()
        .or_else(|| config.inputs.clone())
        .context("No inputs given; pass --inputs or set `inputs` in the config")?;
    let inputs = read_json(&inputs_path)?;

    let dir = keys_dir(&args.keys_dir, config);
    let (pk_path, _) = key_paths(&dir, &artifact.name);
    let backend = if pk_path.exists() {
        log::debug!("Using proving key {}", pk_path.display());
        Backend::from_key_bytes(artifact.circuit.clone(), &read_proving_key(&dir, &artifact)?)?
    } else {
        match args.seed.or(config.seed) {
            Some(seed) => Backend::from_seed(artifact.circuit.clone(), seed)?,
            None => Backend::setup(artifact.circuit.clone(), &mut OsRng)?,
        }
    };
    Ok(pipeline::run(&artifact, &inputs, &backend, &mut ConsoleSink))
}

/// Arguments of `export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    artifact: ArtifactArg,
    /// Verifying key; defaults to `<keys dir>/<name>.vk`
    #[arg(long)]
    vk: Option<PathBuf>,
    /// Directory holding the verifying key
    #[arg(long)]
    keys_dir: Option<PathBuf>,
    /// Export this proof JSON instead of the verifying key
    #[arg(long)]
    proof: Option<PathBuf>,
    /// Write hex text instead of raw bytes
    #[arg(long)]
    hex: bool,
    /// Output file
    #[arg(short, long)]
    out: PathBuf,
}

/// Write the verifying key or a proof in the uncompressed on-chain layout
pub fn export(args: &ExportArgs, config: &Config) -> Result<Vec<u8>> {
    let bytes = match &args.proof {
        Some(proof) => {
            let data: ProofData = serde_json::from_value(read_json(proof)?)
                .with_context(|| format!("Invalid proof file {}", proof.display()))?;
            encoding::convert_proof(&data.proof)?
        }
        None => {
            let path = vk_path(&args.vk, &args.artifact, &args.keys_dir, config)?;
            let vk = keys::verifying_key_from_bytes(&fs::read(&path)?)?;
            encoding::vk_to_uncompressed(&vk)?
        }
    };
    if args.hex {
        write(&args.out, format!("0x{}\n", hex::encode(&bytes)))?;
    } else {
        write(&args.out, &bytes)?;
    }
    println!("Wrote {} bytes to {}", bytes.len(), args.out.display());
    Ok(bytes)
}

/// Arguments of `import`
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Circom `.r1cs` file
    r1cs: PathBuf,
    /// Program name; defaults to the file stem
    #[arg(long)]
    name: Option<String>,
    /// Where to write the artifact JSON
    #[arg(short, long)]
    out: PathBuf,
}

/// Convert a Circom R1CS file into an artifact
pub fn import(args: &ImportArgs) -> Result<Artifact> {
    let bytes =
        fs::read(&args.r1cs).with_context(|| format!("Failed to read {}", args.r1cs.display()))?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .r1cs
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .context("Cannot derive a program name; pass --name")?,
    };
    let artifact = R1cs::parse(&bytes)?.into_artifact(&name)?;
    if artifact.circuit.opcodes.is_empty() {
        bail!("{} has no constraints", args.r1cs.display());
    }
    write(&args.out, artifact.to_json()?)?;
    println!(
        "Imported {} ({} wires) to {}",
        artifact.name,
        artifact.circuit.num_witnesses(),
        args.out.display()
    );
    Ok(artifact)
}
