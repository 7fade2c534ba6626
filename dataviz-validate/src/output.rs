//! JSON reports printed by the validator.

use dataviz_core::{
    EngineSpecRegistry, ValidationError, ValidationOutcome, errors_to_json,
};
use serde_json::{Value, json};
use std::io::Write;

/// Report for a successful run.
///
/// Only the masked URI is included; the secret never reaches the output.
pub fn outcome_report(outcome: &ValidationOutcome) -> Value {
    match outcome {
        ValidationOutcome::Bypassed => json!({"status": "bypassed"}),
        ValidationOutcome::Validated(record) => json!({
            "status": "valid",
            "sqlalchemy_uri": record.safe_uri(),
            "backend": record.backend(),
            "impersonate_user": record.impersonate_user,
            "extra": record.extra_json(),
        }),
    }
}

/// Report listing every parameter error in client-facing form.
pub fn failure_report(errors: &[ValidationError]) -> Value {
    json!({
        "status": "invalid",
        "errors": errors_to_json(errors),
    })
}

/// Engines that accept structured parameters.
///
/// # Errors
/// Returns an error if the engine list cannot be serialized.
pub fn engines_report(registry: &EngineSpecRegistry) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(registry.available_engines())?)
}

/// Generic category of a native column type for an engine.
///
/// An unrecognized type reports `null` for the column spec.
pub fn column_type_report(
    registry: &EngineSpecRegistry,
    engine: &str,
    driver: Option<&str>,
    native_type: &str,
) -> Value {
    let spec = registry.resolve(engine, driver);
    json!({
        "engine": spec.engine(),
        "native_type": native_type,
        "datatype": spec.datatype(native_type),
        "column_spec": spec.column_spec(native_type),
    })
}

/// Writes a report to stdout as pretty JSON.
///
/// # Errors
/// Returns an error if stdout cannot be written.
pub fn print_json(value: &Value) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
