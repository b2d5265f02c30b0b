//! Plexa Explain Binary
//!
//! Run with: `plexa-explain [OPTIONS] <SCENARIO>`

mod report;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use plexa::ScenarioConfig;

#[derive(Parser)]
#[command(name = "plexa-explain")]
#[command(about = "Explain dispatch decisions for a scenario file")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Scenario file (TOML)
    #[arg(value_name = "SCENARIO")]
    scenario: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 1 when a registration is rejected or a call does not resolve
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default scenario configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    if let Some(Commands::Config) = &cli.command {
        let config = ScenarioConfig::default();
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            print!("{}", config.to_toml_string()?);
        }
        return Ok(());
    }

    let Some(path) = &cli.scenario else {
        anyhow::bail!("no scenario file given (see --help)");
    };

    debug!("Loading: {}", path.display());
    let scenario = ScenarioConfig::load(path)
        .with_context(|| format!("Failed to load scenario: {}", path.display()))?;
    let report = report::run(&scenario)
        .with_context(|| format!("Failed to run scenario: {}", path.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    info!(
        "Resolved {} of {} calls",
        report
            .calls
            .iter()
            .filter(|c| matches!(c.outcome, report::CallOutcome::Resolved { .. }))
            .count(),
        report.calls.len()
    );

    if cli.strict && !report.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}
