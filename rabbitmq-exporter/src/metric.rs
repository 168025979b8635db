//! Gauge handles and the descriptors they are published under.

use std::sync::atomic::AtomicU64;

use prometheus_client::metrics::gauge::Gauge as PromGauge;

/// Name and help text of one published gauge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricDescriptor {
    /// Metric name without the exporter-wide prefix.
    pub name: String,
    /// Help text.
    pub help: String,
}

impl MetricDescriptor {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
        }
    }
}

/// A mutable `f64` gauge created once from a descriptor.
///
/// The value lives for as long as the exporter that owns the gauge, so a
/// field missing from one response keeps the value of the previous one.
#[derive(Debug)]
pub struct Gauge {
    descriptor: MetricDescriptor,
    value: PromGauge<f64, AtomicU64>,
}

impl Gauge {
    pub fn new(descriptor: MetricDescriptor) -> Self {
        Self {
            descriptor,
            value: PromGauge::default(),
        }
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    /// Set the value, returning the previous one.
    pub fn set(&self, value: f64) -> f64 {
        self.value.set(value)
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }

    /// Snapshot of the current value.
    pub fn sample(&self) -> Sample {
        Sample {
            descriptor: self.descriptor.clone(),
            value: self.get(),
        }
    }
}

/// One emitted gauge value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub descriptor: MetricDescriptor,
    pub value: f64,
}

/// Check a name against the Prometheus metric name grammar
/// `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
