//! Registry of exporter factories.
//!
//! The registry is built once at startup, optionally narrowed to the
//! exporters enabled in the configuration, and then turned into the set of
//! long-lived exporter instances handed to the scrape driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::exporter::Exporter;
use crate::fetch::Fetcher;
use crate::overview::{OVERVIEW_EXPORTER, overview_exporter};

/// Constructor for one exporter.
pub type ExporterFactory = Box<dyn Fn() -> Box<dyn Exporter> + Send + Sync>;

/// Exporter instances by name.
pub type Exporters = BTreeMap<String, Arc<dyn Exporter>>;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown exporter: {0}")]
    UnknownExporter(String),
}

/// Mapping from exporter name to factory.
#[derive(Default)]
pub struct ExporterRegistry {
    factories: BTreeMap<String, ExporterFactory>,
}

impl ExporterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in exporter, all sharing `fetcher`.
    pub fn builtin(fetcher: Arc<dyn Fetcher>) -> Self {
        let mut registry = Self::new();
        registry.register(OVERVIEW_EXPORTER, move || {
            Box::new(overview_exporter(fetcher.clone()))
        });
        registry
    }

    /// Register a factory under `name`. An existing registration under the
    /// same name is replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Exporter> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            debug!(exporter = %name, "Replaced exporter registration");
        }
    }

    /// Registered exporter names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Keep only the exporters named in `enabled`. An empty list keeps all.
    pub fn retain_enabled(&mut self, enabled: &[String]) -> Result<(), RegistryError> {
        if enabled.is_empty() {
            return Ok(());
        }

        if let Some(unknown) = enabled.iter().find(|n| !self.factories.contains_key(*n)) {
            return Err(RegistryError::UnknownExporter(unknown.clone()));
        }

        self.factories.retain(|name, _| enabled.contains(name));
        Ok(())
    }

    /// Build one instance per registered factory.
    pub fn instantiate_all(&self) -> Exporters {
        self.factories
            .iter()
            .map(|(name, factory)| (name.clone(), Arc::from(factory())))
            .collect()
    }
}

impl std::fmt::Debug for ExporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterRegistry")
            .field("exporters", &self.names())
            .finish()
    }
}
