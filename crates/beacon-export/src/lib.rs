//! beacon-export: the Beacon metrics export pipeline.
//!
//! Turns one collection cycle's stream of metric records into Prometheus
//! text exposition. The batcher collapses records that share a metric name
//! and label set into one series each; the serializer renders the merged
//! checkpoint with exact escaping, naming, and numeric-formatting rules.
//!
//! # Architecture
//!
//! ```text
//! PullExporter::run() ── per tick ──► MetricProducer::collect()
//!   └── LabelsBatcher::process() per record
//!         └── checkpoint() → CheckpointSet
//!               └── PrometheusSerializer::serialize() → text for /metrics
//! ```
//!
//! The batcher and serializer are synchronous and in-memory; only the
//! `PullExporter` driver is async, and only for its timer loop. Transport
//! (HTTP framing, push delivery) is an external collaborator that reads the
//! rendered text.

pub mod batcher;
pub mod config;
pub mod exporter;
pub mod prometheus;

pub use batcher::LabelsBatcher;
pub use config::ExporterConfig;
pub use exporter::{MetricProducer, PullExporter};
pub use prometheus::{PrometheusSerializer, SerializerConfig};
