//! Engine spec registry and `(engine, driver)` resolution.

use super::{BaseEngineSpec, EngineSpec};
use crate::uri::ConnectionUri;
use crate::{DataVizError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static GLOBAL: OnceLock<EngineSpecRegistry> = OnceLock::new();

/// Summary of a usable engine, as offered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableEngine {
    /// Canonical engine name
    pub engine: String,
    /// Human readable name
    pub engine_name: String,
    /// Driver used in built URIs
    pub default_driver: String,
    /// Example URI
    pub sqlalchemy_uri_placeholder: String,
    /// Supported drivers and their labels
    pub drivers: BTreeMap<String, String>,
    /// JSON schema of the connection parameters
    pub parameters: Value,
}

/// Ordered collection of engine specs.
///
/// Registration order is priority order: the first spec that matches a
/// lookup wins. Lookups never fail; an unknown engine resolves to the
/// schema-less base spec.
#[derive(Debug, Clone)]
pub struct EngineSpecRegistry {
    specs: Vec<Arc<dyn EngineSpec>>,
    base: Arc<dyn EngineSpec>,
}

impl EngineSpecRegistry {
    /// Creates a registry with no engines.
    pub fn empty() -> Self {
        Self {
            specs: Vec::new(),
            base: Arc::new(BaseEngineSpec::new()),
        }
    }

    /// Creates a registry holding the engine families compiled into this
    /// crate.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut specs: Vec<Arc<dyn EngineSpec>> = Vec::new();

        #[cfg(feature = "postgresql")]
        specs.push(Arc::new(super::PostgresEngineSpec::new()));

        #[cfg(feature = "mysql")]
        specs.push(Arc::new(super::MySqlEngineSpec::new()));

        Self {
            specs,
            base: Arc::new(BaseEngineSpec::new()),
        }
    }

    /// Process-wide registry, the built-in one unless [`Self::install`] ran
    /// first.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::builtin)
    }

    /// Installs the process-wide registry.
    ///
    /// # Errors
    /// Returns [`DataVizError::Configuration`] if the global registry was
    /// already installed or used.
    pub fn install(registry: Self) -> Result<()> {
        GLOBAL
            .set(registry)
            .map_err(|_| DataVizError::configuration("Engine registry is already initialized"))
    }

    /// Appends an externally supplied spec after every existing one.
    ///
    /// # Errors
    /// Returns [`DataVizError::Configuration`] if the engine name is empty
    /// or collides with a registered engine name or alias.
    pub fn register(&mut self, spec: Arc<dyn EngineSpec>) -> Result<()> {
        let descriptor = spec.descriptor();
        if descriptor.engine.trim().is_empty() {
            return Err(DataVizError::configuration("Engine name cannot be empty"));
        }

        let names = std::iter::once(&descriptor.engine).chain(descriptor.aliases.iter());
        for name in names {
            if let Some(existing) = self
                .specs
                .iter()
                .find(|existing| existing.descriptor().matches_backend(name))
            {
                return Err(DataVizError::configuration(format!(
                    "Engine name '{}' is already registered by '{}'",
                    name,
                    existing.engine()
                )));
            }
        }

        debug!("Registered engine spec '{}'", descriptor.engine);
        self.specs.push(spec);
        Ok(())
    }

    /// Builder form of [`Self::register`].
    ///
    /// # Errors
    /// Same as [`Self::register`].
    pub fn with_spec(mut self, spec: Arc<dyn EngineSpec>) -> Result<Self> {
        self.register(spec)?;
        Ok(self)
    }

    /// Resolves an engine and optional driver to a spec.
    ///
    /// A spec that supports the driver is preferred; otherwise the first
    /// spec for the engine is returned, and failing that the base spec.
    pub fn resolve(&self, engine: &str, driver: Option<&str>) -> Arc<dyn EngineSpec> {
        let driver = driver.filter(|d| !d.is_empty());

        if let Some(driver) = driver
            && let Some(spec) = self
                .specs
                .iter()
                .find(|spec| spec.supports_backend(engine, Some(driver)))
        {
            debug!("Resolved '{}+{}' to '{}'", engine, driver, spec.engine());
            return Arc::clone(spec);
        }

        if let Some(spec) = self
            .specs
            .iter()
            .find(|spec| spec.supports_backend(engine, None))
        {
            debug!("Resolved '{}' to '{}'", engine, spec.engine());
            return Arc::clone(spec);
        }

        debug!("No engine spec for '{}', using base spec", engine);
        Arc::clone(&self.base)
    }

    /// Resolves the spec for a connection URI's `backend+driver` scheme.
    ///
    /// # Errors
    /// Returns [`DataVizError::InvalidUri`] if the URI does not parse.
    pub fn resolve_uri(&self, uri: &str) -> Result<Arc<dyn EngineSpec>> {
        let parsed = ConnectionUri::parse(uri)?;
        Ok(self.resolve(&parsed.backend, parsed.driver.as_deref()))
    }

    /// The fallback spec.
    pub fn base(&self) -> &Arc<dyn EngineSpec> {
        &self.base
    }

    /// Registered specs in priority order.
    pub fn specs(&self) -> &[Arc<dyn EngineSpec>] {
        &self.specs
    }

    /// Engines that accept structured parameters.
    pub fn available_engines(&self) -> Vec<AvailableEngine> {
        self.specs
            .iter()
            .filter_map(|spec| {
                let schema = spec.parameters_schema()?;
                let descriptor = spec.descriptor();
                Some(AvailableEngine {
                    engine: descriptor.engine.clone(),
                    engine_name: descriptor
                        .engine_name
                        .clone()
                        .unwrap_or_else(|| descriptor.engine.clone()),
                    default_driver: descriptor.default_driver.clone(),
                    sqlalchemy_uri_placeholder: descriptor.uri_placeholder.clone(),
                    drivers: descriptor.drivers.clone(),
                    parameters: schema.to_json_schema(),
                })
            })
            .collect()
    }
}

impl Default for EngineSpecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
