//! `zkrun`: execute, prove and verify compiled circuits
//!
//! ```text
//! zkrun setup   -a program.json --keys-dir keys
//! zkrun execute -a program.json -i inputs.json -o witness.bin
//! zkrun prove   -a program.json -w witness.bin -o proof.json
//! zkrun verify  -a program.json -p proof.json
//! ```

mod commands;
mod config;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{commands::*, config::Config};

#[derive(Parser)]
#[command(name = "zkrun", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "ZKRUN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize an artifact
    Info(InfoArgs),
    /// Generate proving and verifying keys
    Setup(SetupArgs),
    /// Solve the witness for an input document
    Execute(ExecuteArgs),
    /// Prove a solved witness
    Prove(ProveArgs),
    /// Verify a proof; exits with status 1 when it is invalid
    Verify(VerifyArgs),
    /// Execute, prove and verify in one step
    Run(RunArgs),
    /// Write the verifying key or a proof in the on-chain layout
    Export(ExportArgs),
    /// Convert a Circom R1CS file into an artifact
    Import(ImportArgs),
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let filter = config.log_level.clone().unwrap_or_else(|| String::from("info"));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let ok = match &cli.command {
        Command::Info(args) => info(args, &config).map(|_| true)?,
        Command::Setup(args) => setup(args, &config).map(|_| true)?,
        Command::Execute(args) => execute(args, &config).map(|_| true)?,
        Command::Prove(args) => prove(args, &config).map(|_| true)?,
        Command::Verify(args) => verify(args, &config)?,
        Command::Run(args) => run(args, &config)?.is_valid(),
        Command::Export(args) => export(args, &config).map(|_| true)?,
        Command::Import(args) => import(args).map(|_| true)?,
    };
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_prove() {
        let cli = Cli::try_parse_from([
            "zkrun", "prove", "-a", "p.json", "-w", "w.bin", "--circom", "-c", "zk.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("zk.toml")));
        assert!(matches!(cli.command, Command::Prove(_)));
    }
}
