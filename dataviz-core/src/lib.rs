//! Core library for Data Viz database connections.
//!
//! This crate resolves a database engine (and optional driver) to an
//! [`EngineSpec`] and uses it to validate submitted connection parameters,
//! build connection URIs, and map native column types to generic
//! categories.
//!
//! # Security Guarantees
//! - Passwords never appear in serialized records, `Debug` output, logs or
//!   error messages; every visible URI carries the masking sentinel
//! - Stored secrets are zeroed on drop
//! - No connection is ever opened to a database beyond a bare TCP probe
//!
//! # Architecture
//! - Registry pattern for engine capability lookup
//! - Trait seam ([`NetworkProbe`]) between validation and the network
//! - Repository trait ([`RecordStore`]) for record lookup

pub mod config;
pub mod engines;
pub mod error;
pub mod logging;
pub mod models;
pub mod network;
pub mod pipeline;
pub mod record;
pub mod repository;
pub mod uri;
pub mod validation;

// Re-export commonly used types
pub use config::ValidatorConfig;
pub use engines::{
    AvailableEngine, BaseEngineSpec, EngineDescriptor, EngineSpec, EngineSpecRegistry,
    ParametersSchema,
};
pub use error::{DataVizError, Result, mask_database_url};
pub use models::{
    ColumnSpec, ColumnType, ConnectionParameters, GenericDataType, RecordExtra,
    ValidateParametersPayload,
};
pub use network::{NetworkProbe, PORT_TIMEOUT, SystemProbe};
pub use pipeline::{ValidateDatabaseParameters, ValidationOutcome};
pub use record::ConnectionRecord;
pub use repository::{MemoryRecordStore, RecordStore};
pub use uri::{ConnectionUri, PASSWORD_MASK};
pub use validation::{DataVizErrorType, ErrorLevel, ValidationError, errors_to_json};
