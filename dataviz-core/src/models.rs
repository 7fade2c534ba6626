//! Core data models for connection validation.
//!
//! This module defines the inbound payload, the typed connection parameters
//! an engine spec builds a URI from, the record `extra` blob, and the column
//! type categories every native type reduces to.

use crate::{DataVizError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Generic category every native column type maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GenericDataType {
    Numeric,
    String,
    Temporal,
    Boolean,
}

impl std::fmt::Display for GenericDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericDataType::Numeric => write!(f, "NUMERIC"),
            GenericDataType::String => write!(f, "STRING"),
            GenericDataType::Temporal => write!(f, "TEMPORAL"),
            GenericDataType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// Target column type a native type string resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    String,
    UnicodeText,
    TinyInteger,
    SmallInteger,
    MediumInteger,
    Integer,
    BigInteger,
    Float,
    DoublePrecision,
    Real,
    Numeric,
    Bit,
    Timestamp,
    DateTime,
    Date,
    Time,
    Interval,
    Boolean,
    Json,
    Enum,
}

/// Resolved column type with its generic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Target column type
    pub column_type: ColumnType,
    /// Generic category
    pub generic_type: GenericDataType,
    /// True for temporal columns
    pub is_dttm: bool,
}

impl ColumnSpec {
    /// Creates a spec, deriving `is_dttm` from the generic category.
    pub fn new(column_type: ColumnType, generic_type: GenericDataType) -> Self {
        Self {
            column_type,
            generic_type,
            is_dttm: generic_type == GenericDataType::Temporal,
        }
    }
}

/// Typed connection parameters an engine spec turns into a URI.
///
/// # Security
/// The password travels in this struct only between validation and URI
/// construction; `Debug` output never shows it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParameters {
    /// Login name
    #[serde(default)]
    pub username: Option<String>,
    /// Login password, possibly the masking sentinel
    #[serde(default)]
    pub password: Option<String>,
    /// Server host name or address
    pub host: String,
    /// Server TCP port
    pub port: u16,
    /// Database name; empty for the server default
    #[serde(default)]
    pub database: String,
    /// Extra URI query parameters
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Whether an encrypted connection is requested
    #[serde(default)]
    pub encryption: bool,
    /// Whether the connection goes through an SSH tunnel
    #[serde(default)]
    pub ssh: bool,
}

impl std::fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("query", &self.query)
            .field("encryption", &self.encryption)
            .field("ssh", &self.ssh)
            .finish()
    }
}

impl ConnectionParameters {
    /// Creates parameters for a host and port with everything else empty.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            username: None,
            password: None,
            host: host.into(),
            port,
            database: String::new(),
            query: BTreeMap::new(),
            encryption: false,
            ssh: false,
        }
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Builder method to set the database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Builder method to add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Builder method to request an encrypted connection.
    pub fn with_encryption(mut self, encryption: bool) -> Self {
        self.encryption = encryption;
        self
    }

    /// Converts loosely typed submitted parameters.
    ///
    /// Scalars are coerced to strings, the port is coerced to an integer the
    /// same way structural validation does it.
    ///
    /// # Errors
    /// Returns [`DataVizError::Configuration`] if the host is absent or the
    /// port cannot be coerced into `[0, 65536)`.
    pub fn from_map(parameters: &Map<String, Value>) -> Result<Self> {
        let host = parameters
            .get("host")
            .and_then(scalar_to_string)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DataVizError::configuration("host is required"))?;

        let port = parameters
            .get("port")
            .and_then(coerce_port)
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| DataVizError::configuration("port must be an integer in [0, 65536)"))?;

        let query = match parameters.get("query") {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => BTreeMap::new(),
        };

        Ok(Self {
            username: parameters.get("username").and_then(scalar_to_string),
            password: parameters.get("password").and_then(scalar_to_string),
            host,
            port,
            database: parameters
                .get("database")
                .and_then(scalar_to_string)
                .unwrap_or_default(),
            query,
            encryption: parameters.get("encryption").is_some_and(coerce_flag),
            ssh: parameters.get("ssh").is_some_and(coerce_flag),
        })
    }
}

/// Renders a JSON scalar as a string; `null` and containers yield nothing.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerces a submitted port value to an integer.
///
/// Accepts integers, integral floats and numeric strings; anything else is
/// not coercible. Integers too large for `i64` saturate so they are reported
/// as out of range rather than as non-integers.
pub(crate) fn coerce_port(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .and_then(|f| parse_integer(&format!("{:.0}", f)))
            }),
        Value::String(s) => parse_integer(s.trim()),
        _ => None,
    }
}

/// Parses an optionally signed run of decimal digits, saturating at the
/// `i64` bounds.
fn parse_integer(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>()
        .ok()
        .or(Some(if negative { i64::MIN } else { i64::MAX }))
}

/// Interprets a submitted on/off flag.
///
/// Numbers are true unless zero; only the strings `"true"`/`"1"` are true.
pub(crate) fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Returns true if a submitted value counts as provided.
///
/// Numbers always count, so a port of `0` reaches the range and reachability
/// checks instead of being reported missing.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Recognized keys of a connection record's `extra` blob.
///
/// Unknown keys are preserved untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExtra {
    /// Keyword arguments for schema metadata reflection
    #[serde(default)]
    pub metadata_params: Map<String, Value>,
    /// Keyword arguments for the engine connection
    #[serde(default)]
    pub engine_params: Map<String, Value>,
    /// Cache timeouts for metadata lookups
    #[serde(default = "empty_object")]
    pub metadata_cache_timeout: Value,
    /// Schemas that accept file uploads
    #[serde(default)]
    pub schemas_allowed_for_file_upload: Vec<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for RecordExtra {
    fn default() -> Self {
        Self {
            metadata_params: Map::new(),
            engine_params: Map::new(),
            metadata_cache_timeout: empty_object(),
            schemas_allowed_for_file_upload: Vec::new(),
            other: Map::new(),
        }
    }
}

impl RecordExtra {
    /// Parses a stored blob, falling back to the defaults on malformed JSON.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.filter(|r| !r.trim().is_empty()) {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!("Malformed extra JSON, using defaults: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Serializes the blob for storage.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Inbound request to validate (and later persist) connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateParametersPayload {
    /// Id of the record being updated, absent on create
    #[serde(default)]
    pub id: Option<i64>,
    pub engine: String,
    #[serde(default)]
    pub driver: Option<String>,
    /// Engine-specific parameters, loosely typed as submitted
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub extra: Option<RecordExtra>,
    /// Encrypted extra as the client saw it (secrets masked)
    #[serde(default)]
    pub masked_encrypted_extra: Option<String>,
    #[serde(default)]
    pub server_cert: Option<String>,
    #[serde(default)]
    pub impersonate_user: bool,
}

impl ValidateParametersPayload {
    /// Creates a payload for an engine and driver with no parameters.
    pub fn new(engine: impl Into<String>, driver: Option<&str>) -> Self {
        Self {
            id: None,
            engine: engine.into(),
            driver: driver.map(str::to_string),
            parameters: Map::new(),
            name: None,
            extra: None,
            masked_encrypted_extra: None,
            server_cert: None,
            impersonate_user: false,
        }
    }

    /// Builder method to set one submitted parameter.
    pub fn with_parameter(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Builder method to target an existing record.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder method to set the submitted encrypted extra.
    pub fn with_masked_encrypted_extra(mut self, encrypted_extra: impl Into<String>) -> Self {
        self.masked_encrypted_extra = Some(encrypted_extra.into());
        self
    }

    /// Returns the driver, treating an empty string as absent.
    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref().filter(|d| !d.is_empty())
    }
}
