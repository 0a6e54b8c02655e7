//! # fisc CLI entry point
//!
//! Parses command-line arguments, initialises logging, and dispatches to the
//! subcommand handlers on a Tokio runtime.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fisc_cli::calculate::{run_calculate, CalculateArgs};
use fisc_cli::rules::{run_rules, RulesArgs};
use fisc_cli::validate::{run_validate, ValidateArgs};

/// fisc — tax calculation with authority fallback.
///
/// Computes tax liabilities by asking configured tax authorities in priority
/// order and falling back to locally registered rules.
#[derive(Parser, Debug)]
#[command(name = "fisc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs and results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a tax liability.
    Calculate(CalculateArgs),

    /// Validate input locally and against every configured authority.
    Validate(ValidateArgs),

    /// Inspect registered rules.
    Rules(RulesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let config = cli.config.as_deref();

    runtime.block_on(async {
        match &cli.command {
            Commands::Calculate(args) => run_calculate(args, config, cli.json).await,
            Commands::Validate(args) => run_validate(args, config, cli.json).await,
            Commands::Rules(args) => {
                let engine = fisc_cli::load_engine(config)?;
                run_rules(args, &engine, cli.json)
            }
        }
    })
}
