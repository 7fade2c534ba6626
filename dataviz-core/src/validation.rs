//! Structured validation errors and inbound payload checks.
//!
//! A [`ValidationError`] describes one offending field in a form that a UI can
//! highlight. Several of them accumulate during a single validation pass so a
//! client sees every problem in one round trip.
//!
//! The serialized shape of [`DataVizErrorType`] and [`ErrorLevel`] is a fixed
//! output contract shared with the frontend.

use crate::models::{RecordExtra, ValidateParametersPayload};
use crate::{DataVizError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Maximum length of a connection name.
pub const MAX_NAME_LENGTH: usize = 250;

/// Keyword arguments accepted in `extra.metadata_params`.
pub const METADATA_PARAMS: &[&str] = &["schema", "quote_schema", "naming_convention", "info"];

/// Closed set of error types reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataVizErrorType {
    GenericDbEngineError,
    ColumnDoesNotExistError,
    TableDoesNotExistError,
    SchemaDoesNotExistError,
    ConnectionInvalidUsernameError,
    ConnectionInvalidPasswordError,
    ConnectionInvalidHostnameError,
    ConnectionPortClosedError,
    ConnectionInvalidPortError,
    ConnectionHostDownError,
    ConnectionAccessDeniedError,
    ConnectionUnknownDatabaseError,
    ConnectionDatabasePermissionsError,
    ConnectionMissingParametersError,
    ObjectDoesNotExistError,
    SyntaxError,
    ConnectionDatabaseTimeout,
}

/// Severity of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
}

/// Field-level details attached to an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtra {
    /// Required parameters that were not supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    /// Parameters whose value was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid: Option<Vec<String>>,
}

/// One structural problem with submitted connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// User-facing description
    pub message: String,
    /// Stable error code
    pub error_type: DataVizErrorType,
    /// Severity
    pub level: ErrorLevel,
    /// Affected parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ErrorExtra>,
}

impl ValidationError {
    /// Creates an error without field details.
    pub fn new(message: impl Into<String>, error_type: DataVizErrorType, level: ErrorLevel) -> Self {
        Self {
            message: message.into(),
            error_type,
            level,
            extra: None,
        }
    }

    /// Attaches field details.
    pub fn with_extra(mut self, extra: ErrorExtra) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Warning listing every missing required field.
    pub fn missing_parameters(missing: Vec<String>) -> Self {
        Self::new(
            format!("One or more parameters are missing: {}", missing.join(", ")),
            DataVizErrorType::ConnectionMissingParametersError,
            ErrorLevel::Warning,
        )
        .with_extra(ErrorExtra {
            missing: Some(missing),
            invalid: None,
        })
    }

    /// The host could not be resolved.
    pub fn invalid_hostname() -> Self {
        Self::new(
            "The hostname provided can't be resolved.",
            DataVizErrorType::ConnectionInvalidHostnameError,
            ErrorLevel::Error,
        )
        .with_extra(ErrorExtra::invalid("host"))
    }

    /// The port is not an integer.
    pub fn port_not_integer() -> Self {
        Self::new(
            "Port must be a valid integer.",
            DataVizErrorType::ConnectionInvalidPortError,
            ErrorLevel::Error,
        )
        .with_extra(ErrorExtra::invalid("port"))
    }

    /// The port is outside `[0, 65536)`.
    pub fn port_out_of_range() -> Self {
        Self::new(
            "The port must be an integer between 0 and 65535 (inclusive).",
            DataVizErrorType::ConnectionInvalidPortError,
            ErrorLevel::Error,
        )
        .with_extra(ErrorExtra::invalid("port"))
    }

    /// Nothing accepted a TCP connection on the port.
    pub fn port_closed() -> Self {
        Self::new(
            "The port is closed.",
            DataVizErrorType::ConnectionPortClosedError,
            ErrorLevel::Error,
        )
        .with_extra(ErrorExtra::invalid("port"))
    }

    /// Renders the client-facing shape: `{message, error_type, extra?}`.
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "message": self.message,
            "error_type": self.error_type,
        });
        if let (Some(extra), Value::Object(map)) = (&self.extra, &mut value) {
            map.insert("extra".to_string(), json!(extra));
        }
        value
    }
}

impl ErrorExtra {
    fn invalid(field: &str) -> Self {
        Self {
            missing: None,
            invalid: Some(vec![field.to_string()]),
        }
    }
}

/// Renders an ordered error list in the client-facing shape.
pub fn errors_to_json(errors: &[ValidationError]) -> Value {
    Value::Array(errors.iter().map(ValidationError::to_json).collect())
}

/// Checks the inbound payload shape before any engine work happens.
///
/// # Errors
/// Returns [`DataVizError::Configuration`] if the name is empty or too long,
/// or if `extra.metadata_params` names an unknown keyword.
pub fn validate_payload(payload: &ValidateParametersPayload) -> Result<()> {
    if payload.engine.trim().is_empty() {
        return Err(DataVizError::configuration("engine cannot be empty"));
    }

    if let Some(name) = &payload.name {
        let length = name.chars().count();
        if length == 0 || length > MAX_NAME_LENGTH {
            return Err(DataVizError::configuration(format!(
                "name must be between 1 and {} characters",
                MAX_NAME_LENGTH
            )));
        }
    }

    if let Some(extra) = &payload.extra {
        validate_extra(extra)?;
    }

    Ok(())
}

/// Rejects unknown metadata keywords in a record's extra blob.
///
/// # Errors
/// Returns [`DataVizError::Configuration`] naming the first unknown key.
pub fn validate_extra(extra: &RecordExtra) -> Result<()> {
    if let Some(key) = extra
        .metadata_params
        .keys()
        .find(|key| !METADATA_PARAMS.contains(&key.as_str()))
    {
        return Err(DataVizError::configuration(format!(
            "Invalid metadata parameter {}",
            key
        )));
    }
    Ok(())
}
