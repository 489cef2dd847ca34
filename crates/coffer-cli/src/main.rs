//! Coffer CLI - Command line for the Coffer treasury DAO.
//!
//! Operators and token holders drive the DAO stored in a local data
//! directory: deploy it, seed balances, fund the treasury, propose,
//! vote, and finalize.

pub mod commands;
pub mod config;
pub mod output;
pub mod telemetry;

use clap::Parser;
use colored::Colorize;

fn main() {
    let cli = commands::Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: commands::Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir();
    let config_path = cli.config_path();
    let config = config::CliConfig::load(&config_path)?;

    telemetry::init_telemetry(&cli.logging(config.as_ref()))?;
    tracing::debug!("Using data directory {}", data_dir.display());

    commands::execute(cli.command, &data_dir, &config_path, config)
}
