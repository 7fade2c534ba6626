//! Validator configuration.

use crate::network::PORT_TIMEOUT;
use crate::{DataVizError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Longest accepted TCP probe timeout.
pub const MAX_PORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for a parameter validation run.
///
/// # Example
/// ```rust
/// use dataviz_core::config::ValidatorConfig;
/// use std::time::Duration;
///
/// let config = ValidatorConfig::new()
///     .with_port_timeout(Duration::from_secs(2))
///     .with_bypass_engine("sqlite");
///
/// assert!(config.validate().is_ok());
/// assert!(config.is_bypassed("sqlite"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Time allowed for each TCP connect attempt
    pub port_timeout: Duration,
    /// Engines accepted without any validation
    pub bypass_engines: BTreeSet<String>,
    /// Fail when the payload names a record id that does not exist
    pub require_existing_record: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            port_timeout: PORT_TIMEOUT,
            bypass_engines: BTreeSet::new(),
            require_existing_record: false,
        }
    }
}

impl std::fmt::Display for ValidatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ValidatorConfig(port_timeout={:?}, bypass=[{}], strict_records={})",
            self.port_timeout,
            self.bypass_engines
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(","),
            self.require_existing_record
        )
    }
}

impl ValidatorConfig {
    /// Creates a config with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates configuration values.
    ///
    /// # Errors
    /// Returns [`DataVizError::Configuration`] for a zero timeout, a timeout
    /// above [`MAX_PORT_TIMEOUT`], or a blank bypass engine name.
    pub fn validate(&self) -> Result<()> {
        if self.port_timeout.is_zero() {
            return Err(DataVizError::configuration(
                "port_timeout must be greater than 0",
            ));
        }

        if self.port_timeout > MAX_PORT_TIMEOUT {
            return Err(DataVizError::configuration(format!(
                "port_timeout should not exceed {} seconds",
                MAX_PORT_TIMEOUT.as_secs()
            )));
        }

        if self.bypass_engines.iter().any(|e| e.trim().is_empty()) {
            return Err(DataVizError::configuration(
                "bypass engine names cannot be empty",
            ));
        }

        Ok(())
    }

    /// Builder method to set the probe timeout.
    pub fn with_port_timeout(mut self, timeout: Duration) -> Self {
        self.port_timeout = timeout;
        self
    }

    /// Builder method to skip validation for an engine.
    pub fn with_bypass_engine(mut self, engine: impl Into<String>) -> Self {
        self.bypass_engines.insert(engine.into());
        self
    }

    /// Builder method to reject unknown record ids.
    pub fn with_require_existing_record(mut self, require: bool) -> Self {
        self.require_existing_record = require;
        self
    }

    /// Returns true if validation is skipped for the engine.
    pub fn is_bypassed(&self, engine: &str) -> bool {
        self.bypass_engines.contains(engine)
    }
}
