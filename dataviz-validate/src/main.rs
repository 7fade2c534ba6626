//! Connection parameter validation tool.
//!
//! Validates a connection payload the way the Data Viz server does before
//! persisting a database, and prints the result as JSON.
//!
//! # Security Guarantees
//! - Only masked URIs are printed or logged
//! - No database session is opened; the port check is a bare TCP connect

use clap::Parser;
use dataviz_core::{EngineSpecRegistry, SystemProbe, logging::init_logging};
use dataviz_validate::{Cli, output, run};
use std::process::ExitCode;
use tracing::error;

/// Exit code for configuration and I/O failures.
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_json) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let registry = EngineSpecRegistry::global();
    match run(&cli, registry, &SystemProbe).await {
        Ok(report) => {
            if let Err(e) = output::print_json(&report.body) {
                error!("Failed to write output: {:#}", e);
                return ExitCode::from(EXIT_FAILURE);
            }
            ExitCode::from(report.exit_code)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
