//! Connection parameter validation pipeline.
//!
//! [`ValidateDatabaseParameters`] takes a submitted payload through engine
//! resolution, structural and network validation, encrypted-extra merging
//! and URI construction, and produces the transient record a connection
//! test would use.
//!
//! Structural problems come back as [`DataVizError::InvalidParameters`]
//! carrying every [`ValidationError`](crate::validation::ValidationError)
//! found; configuration problems (unknown engine, unsupported encryption)
//! are their own error kinds.

use crate::config::ValidatorConfig;
use crate::engines::{EngineSpec, EngineSpecRegistry};
use crate::models::{ConnectionParameters, ValidateParametersPayload};
use crate::network::NetworkProbe;
use crate::record::ConnectionRecord;
use crate::repository::RecordStore;
use crate::validation::validate_payload;
use crate::{DataVizError, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Result of a successful validation run.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// The engine is configured to skip validation
    Bypassed,
    /// Parameters are valid; the record is ready for a connection test
    Validated(Box<ConnectionRecord>),
}

impl ValidationOutcome {
    /// The connection-test record, if one was built.
    pub fn record(&self) -> Option<&ConnectionRecord> {
        match self {
            Self::Bypassed => None,
            Self::Validated(record) => Some(&**record),
        }
    }
}

/// One validation run for a submitted payload.
pub struct ValidateDatabaseParameters<'a> {
    payload: ValidateParametersPayload,
    registry: &'a EngineSpecRegistry,
    store: &'a dyn RecordStore,
    probe: &'a dyn NetworkProbe,
    config: ValidatorConfig,
}

impl<'a> ValidateDatabaseParameters<'a> {
    /// Creates a run with the default configuration.
    pub fn new(
        payload: ValidateParametersPayload,
        registry: &'a EngineSpecRegistry,
        store: &'a dyn RecordStore,
        probe: &'a dyn NetworkProbe,
    ) -> Self {
        Self {
            payload,
            registry,
            store,
            probe,
            config: ValidatorConfig::default(),
        }
    }

    /// Builder method to set the configuration.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs every validation step.
    ///
    /// # Errors
    /// - [`DataVizError::Configuration`] for an invalid payload or config, or
    ///   when encryption is requested on an engine without encryption support
    /// - [`DataVizError::NotFound`] for an unknown record id when
    ///   [`ValidatorConfig::require_existing_record`] is set
    /// - [`DataVizError::NotImplemented`] if the engine has no parameter schema
    /// - [`DataVizError::InvalidParameters`] with every structural problem found
    pub async fn run(&self) -> Result<ValidationOutcome> {
        self.config.validate()?;
        validate_payload(&self.payload)?;

        let engine = self.payload.engine.as_str();
        if self.config.is_bypassed(engine) {
            info!("Validation bypassed for engine '{}'", engine);
            return Ok(ValidationOutcome::Bypassed);
        }

        let existing = self.load_existing().await?;

        let spec = self.registry.resolve(engine, self.payload.driver());
        if spec.parameters_schema().is_none() {
            return Err(DataVizError::not_implemented(engine));
        }

        let errors = spec
            .validate_parameters(&self.payload.parameters, self.probe, self.config.port_timeout)
            .await?;
        if !errors.is_empty() {
            debug!("{} validation errors for engine '{}'", errors.len(), engine);
            return Err(DataVizError::InvalidParameters { errors });
        }

        let encrypted_extra = self.merged_encrypted_extra(&*spec, existing.as_ref());
        let encrypted_extra_json = parse_encrypted_extra(&encrypted_extra);

        let parameters = ConnectionParameters::from_map(&self.payload.parameters)?;
        let mut uri = spec
            .build_uri(&parameters, &encrypted_extra_json)?
            .to_string();

        if let Some(model) = &existing
            && uri == model.safe_uri()
        {
            debug!("Submitted URI matches stored masked URI, reusing stored secret");
            uri = model.uri_decrypted();
        }

        let mut record = ConnectionRecord::for_connection_test();
        record.server_cert = self.payload.server_cert.clone();
        record.extra = self
            .payload
            .extra
            .clone()
            .unwrap_or_default()
            .to_json_string();
        record.impersonate_user = self.payload.impersonate_user;
        record.encrypted_extra = Some(encrypted_extra);
        record.set_uri(&uri)?;
        spec.mutate_for_connection_test(&mut record);

        info!(
            "Connection parameters for engine '{}' are valid: {}",
            spec.engine(),
            record.safe_uri()
        );
        Ok(ValidationOutcome::Validated(Box::new(record)))
    }

    async fn load_existing(&self) -> Result<Option<ConnectionRecord>> {
        let Some(id) = self.payload.id else {
            return Ok(None);
        };

        match self.store.find_by_id(id).await? {
            Some(record) => Ok(Some(record)),
            None if self.config.require_existing_record => {
                Err(DataVizError::not_found("Database", id))
            }
            None => {
                warn!("Database with id {} not found, validating as new", id);
                Ok(None)
            }
        }
    }

    /// Submitted encrypted extra, unmasked against the stored one on update.
    fn merged_encrypted_extra(
        &self,
        spec: &dyn EngineSpec,
        existing: Option<&ConnectionRecord>,
    ) -> String {
        let submitted = self
            .payload
            .masked_encrypted_extra
            .as_deref()
            .unwrap_or("{}");
        match existing {
            Some(model) => spec
                .unmask_encrypted_extra(model.encrypted_extra.as_deref(), Some(submitted))
                .unwrap_or_else(|| "{}".to_string()),
            None => submitted.to_string(),
        }
    }
}

/// Parses an encrypted-extra blob; anything but a JSON object is empty.
fn parse_encrypted_extra(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            warn!("Malformed encrypted extra JSON, using empty object: {}", e);
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encrypted_extra() {
        assert_eq!(parse_encrypted_extra(r#"{"a": 1}"#).len(), 1);
        assert!(parse_encrypted_extra("[1, 2]").is_empty());
        assert!(parse_encrypted_extra("{not json").is_empty());
        assert!(parse_encrypted_extra("").is_empty());
    }

    #[test]
    fn test_outcome_record() {
        assert!(ValidationOutcome::Bypassed.record().is_none());
        let outcome = ValidationOutcome::Validated(Box::new(ConnectionRecord::new("x")));
        assert_eq!(outcome.record().map(|r| r.name.as_str()), Some("x"));
    }
}
