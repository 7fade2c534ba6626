//! Library module for dataviz-validate.
//!
//! Argument parsing and command handlers live here so they can be tested
//! without spawning the binary; `main.rs` only wires them to the terminal.

pub mod output;
pub mod records;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dataviz_core::{
    DataVizError, EngineSpecRegistry, MemoryRecordStore, NetworkProbe, ValidateDatabaseParameters,
    ValidateParametersPayload, ValidatorConfig,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Exit code for a payload with parameter errors.
pub const EXIT_INVALID: u8 = 1;

/// CLI argument structure
#[derive(Parser, Debug)]
#[command(name = "dataviz-validate")]
#[command(about = "Validate database connection parameters")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "
Data Viz connection validator

Checks submitted connection parameters against the engine's parameter
schema, resolves the host and probes the port, and prints the masked
connection URI that would be stored.

EXIT CODES:
  0  parameters are valid (or the engine is bypassed)
  1  parameters are invalid; the errors are printed as JSON
  2  configuration or I/O failure

EXAMPLES:
  dataviz-validate validate --payload payload.json
  dataviz-validate validate --payload update.json --records records.json
  dataviz-validate engines
  dataviz-validate column-type --engine postgresql 'VARCHAR(50)'
")]
pub struct Cli {
    /// Logging flags shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a connection parameters payload
    Validate(ValidateArgs),
    /// List engines that accept structured parameters
    Engines,
    /// Map a native column type to its generic category
    ColumnType(ColumnTypeArgs),
}

/// Arguments of the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON payload to validate
    #[arg(long, value_name = "FILE")]
    pub payload: PathBuf,

    /// JSON array of stored records the payload may update
    #[arg(long, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Seconds allowed for each TCP connect attempt
    #[arg(long, env = "DATAVIZ_PORT_TIMEOUT", default_value = "5")]
    pub port_timeout: u64,

    /// Engines accepted without validation
    #[arg(long = "bypass-engine", env = "DATAVIZ_BYPASS_ENGINES", value_delimiter = ',')]
    pub bypass_engines: Vec<String>,

    /// Fail if the payload's record id does not exist
    #[arg(long, env = "DATAVIZ_STRICT_RECORDS")]
    pub strict_records: bool,
}

impl ValidateArgs {
    /// Builds the validator configuration from the arguments.
    pub fn validator_config(&self) -> ValidatorConfig {
        self.bypass_engines.iter().fold(
            ValidatorConfig::new()
                .with_port_timeout(Duration::from_secs(self.port_timeout))
                .with_require_existing_record(self.strict_records),
            |config, engine| config.with_bypass_engine(engine.trim()),
        )
    }
}

/// Arguments of the `column-type` command.
#[derive(Args, Debug)]
pub struct ColumnTypeArgs {
    /// Engine name or alias
    #[arg(long)]
    pub engine: String,

    /// Driver name
    #[arg(long)]
    pub driver: Option<String>,

    /// Native column type, e.g. "VARCHAR(50)"
    pub native_type: String,
}

/// Logging flags.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, help = "Write logs as JSON lines")]
    pub log_json: bool,
}

/// JSON document to print and the process exit code.
#[derive(Debug)]
pub struct CommandOutput {
    /// Report printed to stdout
    pub body: serde_json::Value,
    /// `0` on success, [`EXIT_INVALID`] for invalid parameters
    pub exit_code: u8,
}

impl CommandOutput {
    fn success(body: serde_json::Value) -> Self {
        Self { body, exit_code: 0 }
    }
}

/// Runs the selected command.
///
/// # Errors
/// Returns an error for unreadable input files and for every failure that
/// is not a parameter validation failure.
pub async fn run(
    cli: &Cli,
    registry: &EngineSpecRegistry,
    probe: &dyn NetworkProbe,
) -> anyhow::Result<CommandOutput> {
    match &cli.command {
        Command::Validate(args) => validate(args, registry, probe).await,
        Command::Engines => Ok(CommandOutput::success(output::engines_report(registry)?)),
        Command::ColumnType(args) => Ok(CommandOutput::success(output::column_type_report(
            registry,
            &args.engine,
            args.driver.as_deref(),
            &args.native_type,
        ))),
    }
}

/// Validates a payload file against the optional records file.
///
/// # Errors
/// Returns an error if a file cannot be read or parsed, or if validation
/// fails for any reason other than invalid parameters.
pub async fn validate(
    args: &ValidateArgs,
    registry: &EngineSpecRegistry,
    probe: &dyn NetworkProbe,
) -> anyhow::Result<CommandOutput> {
    let payload = load_payload(&args.payload).await?;
    let store = match &args.records {
        Some(path) => records::load_records(path).await?,
        None => MemoryRecordStore::new(),
    };
    let config = args.validator_config();
    debug!("Using {}", config);
    info!("Validating parameters for engine '{}'", payload.engine);

    let result = ValidateDatabaseParameters::new(payload, registry, &store, probe)
        .with_config(config)
        .run()
        .await;

    match result {
        Ok(outcome) => Ok(CommandOutput::success(output::outcome_report(&outcome))),
        Err(DataVizError::InvalidParameters { errors }) => Ok(CommandOutput {
            body: output::failure_report(&errors),
            exit_code: EXIT_INVALID,
        }),
        Err(e) => Err(e.into()),
    }
}

async fn load_payload(path: &Path) -> anyhow::Result<ValidateParametersPayload> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse payload {}", path.display()))
}
