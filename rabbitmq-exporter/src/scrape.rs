//! Scrape driver: runs every exporter's collection cycle and encodes the
//! result in the Prometheus text format.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::RwLock;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::{ConstGauge, Gauge};
use prometheus_client::registry::Registry;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::metric::{MetricDescriptor, Sample, is_valid_metric_name};
use crate::registry::Exporters;

/// Label set identifying an exporter in the self-metrics.
type ExporterLabels = Vec<(String, String)>;

/// Names taken by the driver's own metrics, including the `_total` series
/// the encoder emits for counters.
const RESERVED_NAMES: &[&str] = &[
    "up",
    "exporter_scrape_duration_seconds",
    "exporter_scrapes",
    "exporter_scrapes_total",
    "exporter_scrape_errors",
    "exporter_scrape_errors_total",
];

fn exporter_labels(name: &str) -> ExporterLabels {
    vec![("exporter".to_string(), name.to_string())]
}

/// Scrape driver errors.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Metric {name} is declared by both {first} and {second}")]
    DuplicateMetric {
        name: String,
        first: String,
        second: String,
    },
    #[error("Metric {name} declared by {exporter} clashes with an exporter self-metric")]
    ReservedMetric { name: String, exporter: String },
    #[error("Metric name {name:?} declared by {exporter} is not a valid Prometheus name")]
    InvalidMetricName { name: String, exporter: String },
}

/// Result of one exporter's cycle within a scrape.
#[derive(Debug)]
pub struct ExporterOutcome {
    pub exporter: String,
    pub duration: Duration,
    pub result: Result<Vec<Sample>, FetchError>,
}

impl ExporterOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of every exporter for one scrape, in exporter name order.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub outcomes: Vec<ExporterOutcome>,
}

impl ScrapeReport {
    /// Samples of the exporters that succeeded.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExporterOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn any_succeeded(&self) -> bool {
        self.outcomes.iter().any(ExporterOutcome::is_ok)
    }
}

/// Scrape statistics.
#[derive(Debug, Clone, Default)]
pub struct ScrapeStats {
    /// Total scrapes run.
    pub scrapes: u64,
    /// Total failed exporter cycles.
    pub exporter_failures: u64,
    /// Whether at least one exporter succeeded in the latest scrape.
    pub last_scrape_ok: bool,
}

/// Runs all exporters on demand and renders their samples.
pub struct ScrapeDriver {
    exporters: Exporters,
    prefix: String,
    scrapes: Counter,
    scrape_errors: Family<ExporterLabels, Counter>,
    stats: RwLock<ScrapeStats>,
}

impl ScrapeDriver {
    /// Create a driver over the instantiated exporters.
    ///
    /// Fails if two exporters declare the same metric name, or if a declared
    /// name is malformed or taken by the self-metrics.
    pub fn new(exporters: Exporters, prefix: impl Into<String>) -> Result<Self, ScrapeError> {
        let mut owners: HashMap<String, String> = HashMap::new();
        for (exporter_name, exporter) in &exporters {
            for descriptor in exporter.describe() {
                if !is_valid_metric_name(&descriptor.name) {
                    return Err(ScrapeError::InvalidMetricName {
                        name: descriptor.name,
                        exporter: exporter_name.clone(),
                    });
                }
                if RESERVED_NAMES.contains(&descriptor.name.as_str()) {
                    return Err(ScrapeError::ReservedMetric {
                        name: descriptor.name,
                        exporter: exporter_name.clone(),
                    });
                }
                if let Some(first) = owners.insert(descriptor.name.clone(), exporter_name.clone())
                {
                    return Err(ScrapeError::DuplicateMetric {
                        name: descriptor.name,
                        first,
                        second: exporter_name.clone(),
                    });
                }
                debug!(
                    exporter = %exporter_name,
                    metric = %descriptor.name,
                    help = %descriptor.help,
                    "Declared metric"
                );
            }
        }

        Ok(Self {
            exporters,
            prefix: prefix.into(),
            scrapes: Counter::default(),
            scrape_errors: Family::default(),
            stats: RwLock::new(ScrapeStats::default()),
        })
    }

    /// Names of the active exporters.
    pub fn exporter_names(&self) -> Vec<&str> {
        self.exporters.keys().map(String::as_str).collect()
    }

    /// Descriptors of every metric of every exporter.
    pub fn describe_all(&self) -> Vec<MetricDescriptor> {
        self.exporters.values().flat_map(|e| e.describe()).collect()
    }

    /// Run one collection cycle on every exporter concurrently.
    ///
    /// A failing exporter is reported in its outcome and never affects the
    /// others.
    pub async fn scrape(&self) -> ScrapeReport {
        let cycles = self.exporters.iter().map(|(name, exporter)| async move {
            let started = Instant::now();
            let result = exporter.collect().await;
            ExporterOutcome {
                exporter: name.clone(),
                duration: started.elapsed(),
                result,
            }
        });
        let report = ScrapeReport {
            outcomes: join_all(cycles).await,
        };

        self.scrapes.inc();
        for failure in report.failures() {
            if let Err(e) = &failure.result {
                warn!(exporter = %failure.exporter, error = %e, "Exporter collection failed");
            }
            self.scrape_errors
                .get_or_create(&exporter_labels(&failure.exporter))
                .inc();
        }

        let mut stats = self.stats.write();
        stats.scrapes += 1;
        stats.exporter_failures += report.failures().count() as u64;
        stats.last_scrape_ok = report.any_succeeded();
        drop(stats);

        report
    }

    /// Encode a scrape report, plus exporter self-metrics, as Prometheus text.
    pub fn render(&self, report: &ScrapeReport) -> Result<String, std::fmt::Error> {
        let mut registry = Registry::with_prefix(self.prefix.as_str());

        for sample in report.samples() {
            registry.register(
                sample.descriptor.name.as_str(),
                // The encoder terminates help text with a period itself
                sample.descriptor.help.trim_end_matches('.'),
                ConstGauge::new(sample.value),
            );
        }

        let up = Family::<ExporterLabels, Gauge>::default();
        let durations = Family::<ExporterLabels, Gauge<f64, AtomicU64>>::default();
        for outcome in &report.outcomes {
            let labels = exporter_labels(&outcome.exporter);
            up.get_or_create(&labels).set(i64::from(outcome.is_ok()));
            durations
                .get_or_create(&labels)
                .set(outcome.duration.as_secs_f64());
        }

        registry.register(
            "up",
            "Whether the last collection of the exporter succeeded",
            up,
        );
        registry.register(
            "exporter_scrape_duration_seconds",
            "Duration of the last collection of the exporter",
            durations,
        );
        registry.register(
            "exporter_scrapes",
            "Total number of scrapes",
            self.scrapes.clone(),
        );
        registry.register(
            "exporter_scrape_errors",
            "Total number of failed collections per exporter",
            self.scrape_errors.clone(),
        );

        let mut output = String::new();
        encode(&mut output, &registry)?;
        Ok(output)
    }

    /// Scrape and render in one step.
    pub async fn scrape_and_render(&self) -> Result<String, std::fmt::Error> {
        let report = self.scrape().await;
        self.render(&report)
    }

    /// Get scrape statistics.
    pub fn stats(&self) -> ScrapeStats {
        self.stats.read().clone()
    }
}

impl std::fmt::Debug for ScrapeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeDriver")
            .field("exporters", &self.exporter_names())
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Create a shareable driver handle.
pub type SharedDriver = Arc<ScrapeDriver>;
