//! Exporters: dotted-path field maps bound to a management API resource.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::document::Document;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::metric::{Gauge, MetricDescriptor, Sample};

/// A named unit that publishes gauges for one management API resource.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Registry name of this exporter.
    fn name(&self) -> &str;

    /// Descriptors of every gauge, whether or not a value was ever collected.
    fn describe(&self) -> Vec<MetricDescriptor>;

    /// Run one fetch, resolve and emit cycle.
    ///
    /// On error no gauge is modified and nothing is emitted.
    async fn collect(&self) -> Result<Vec<Sample>, FetchError>;
}

/// Static declaration of one observed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Dotted path of a numeric leaf in the resource document.
    pub path: &'static str,
    /// Metric name, without prefix.
    pub name: &'static str,
    pub help: &'static str,
}

/// Mapping from dotted path to the gauge it feeds.
#[derive(Debug, Default)]
pub struct FieldMap {
    gauges: BTreeMap<String, Gauge>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field map from a declaration table.
    pub fn from_specs(specs: &[FieldSpec]) -> Self {
        let mut map = Self::new();
        for spec in specs {
            map.insert(spec.path, MetricDescriptor::new(spec.name, spec.help));
        }
        map
    }

    /// Declare a field. A second declaration for the same path replaces the
    /// first gauge.
    pub fn insert(&mut self, path: impl Into<String>, descriptor: MetricDescriptor) {
        self.gauges.insert(path.into(), Gauge::new(descriptor));
    }

    pub fn get(&self, path: &str) -> Option<&Gauge> {
        self.gauges.get(path)
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Iterate over `(path, gauge)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Gauge)> {
        self.gauges.iter().map(|(path, gauge)| (path.as_str(), gauge))
    }

    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        self.gauges.values().map(|g| g.descriptor().clone()).collect()
    }

    /// Set every gauge whose path resolves in `document`.
    ///
    /// Gauges whose field is absent keep their last value. Returns the number
    /// of gauges that were set.
    pub fn update(&self, document: &Document) -> usize {
        let mut updated = 0;
        for (path, gauge) in self.iter() {
            match document.resolve(path) {
                Some(value) => {
                    debug!(key = path, value, "Set metric for key");
                    gauge.set(value);
                    updated += 1;
                }
                None => trace!(key = path, "Field absent, keeping last value"),
            }
        }
        updated
    }

    /// Current value of every gauge.
    pub fn samples(&self) -> Vec<Sample> {
        self.gauges.values().map(Gauge::sample).collect()
    }
}

/// Generic [`Exporter`] over a [`FieldMap`] and one API endpoint.
pub struct FieldMapExporter {
    name: String,
    endpoint: String,
    fields: FieldMap,
    fetcher: Arc<dyn Fetcher>,
    /// Serializes overlapping cycles on the same gauges.
    cycle: Mutex<()>,
}

impl FieldMapExporter {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        fields: FieldMap,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            fields,
            fetcher,
            cycle: Mutex::new(()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

impl std::fmt::Debug for FieldMapExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMapExporter")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("fields", &self.fields.len())
            .finish()
    }
}

#[async_trait]
impl Exporter for FieldMapExporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        self.fields.descriptors()
    }

    async fn collect(&self) -> Result<Vec<Sample>, FetchError> {
        let _cycle = self.cycle.lock().await;

        let document = self.fetcher.fetch(&self.endpoint).await?;
        debug!(exporter = %self.name, document = ?document, "Fetched document");

        let updated = self.fields.update(&document);
        debug!(
            exporter = %self.name,
            updated,
            declared = self.fields.len(),
            "Collection cycle complete"
        );

        Ok(self.fields.samples())
    }
}
