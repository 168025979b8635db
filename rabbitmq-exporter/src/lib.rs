//! Prometheus exporter for the RabbitMQ management API.
//!
//! On every scrape the exporter fetches management API resources, resolves a
//! fixed set of dotted JSON paths in each response and publishes the values
//! as gauges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Management API  │<────│    Exporters    │<────│   HTTP Server   │
//! │  (/api/...)     │     │ (field → gauge) │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! - [`document`] - fetched documents and dotted-path resolution
//! - [`exporter`] - the [`Exporter`] trait and field-map based exporters
//! - [`registry`] - exporter registration and instantiation
//! - [`scrape`] - concurrent collection and text encoding
//!
//! # Adding an exporter
//!
//! ```ignore
//! use rabbitmq_exporter::{ExporterRegistry, FieldMap, FieldMapExporter, FieldSpec};
//!
//! const NODE_FIELDS: &[FieldSpec] = &[FieldSpec {
//!     path: "mem_used",
//!     name: "node_mem_used",
//!     help: "Memory used in bytes.",
//! }];
//!
//! let mut registry = ExporterRegistry::builtin(fetcher.clone());
//! registry.register("node", move || {
//!     Box::new(FieldMapExporter::new(
//!         "node",
//!         "nodes/rabbit@broker-0",
//!         FieldMap::from_specs(NODE_FIELDS),
//!         fetcher.clone(),
//!     ))
//! });
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod exporter;
pub mod fetch;
pub mod http;
pub mod metric;
pub mod overview;
pub mod registry;
pub mod scrape;

#[cfg(test)]
mod test_support;

pub use config::ExporterConfig;
pub use document::{Document, resolve};
pub use error::FetchError;
pub use exporter::{Exporter, FieldMap, FieldMapExporter, FieldSpec};
pub use fetch::{Fetcher, ManagementClient};
pub use http::HttpServer;
pub use metric::{Gauge, MetricDescriptor, Sample};
pub use registry::{ExporterRegistry, Exporters};
pub use scrape::{ScrapeDriver, SharedDriver};
