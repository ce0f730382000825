//! Pull-exporter cycle driver.
//!
//! Owns the boundary with the instrumentation runtime: once per tick it
//! pulls the cycle's records, drives the batcher and serializer, and
//! retains the rendered text for whatever transport serves it. Transport
//! itself (HTTP framing, push delivery) is an external collaborator.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info};

use beacon_model::MetricRecord;

use crate::batcher::LabelsBatcher;
use crate::config::ExporterConfig;
use crate::prometheus::PrometheusSerializer;

/// Pull-based collection boundary with the instrumentation runtime.
///
/// The runtime supplies one cycle's worth of freshly checkpointed records
/// per call; the exporter never initiates collection between ticks.
pub trait MetricProducer: Send + Sync {
    fn collect(&self) -> Vec<MetricRecord>;
}

/// Periodically collects, batches, and serializes metrics.
///
/// Cycles run strictly one at a time on the driver task. Each cycle gets a
/// fresh batcher; a failed cycle is discarded whole, so partial state never
/// leaks into the next checkpoint.
pub struct PullExporter {
    producer: Arc<dyn MetricProducer>,
    serializer: PrometheusSerializer,
    interval: Duration,
    /// Latest successfully rendered exposition text.
    latest: Arc<RwLock<String>>,
}

impl PullExporter {
    pub fn new(producer: Arc<dyn MetricProducer>, config: &ExporterConfig) -> Self {
        Self {
            producer,
            serializer: PrometheusSerializer::new(config.serializer_config()),
            interval: config.interval(),
            latest: Arc::new(RwLock::new(String::new())),
        }
    }

    /// Run one collection cycle and return the rendered text.
    ///
    /// On success the shared latest text is replaced; on error it is left
    /// untouched and the error propagates for the embedder to decide.
    pub async fn export_once(&self) -> anyhow::Result<String> {
        let records = self.producer.collect();
        let record_count = records.len();

        let mut batcher = LabelsBatcher::new();
        for record in records {
            batcher
                .process(record)
                .context("batching collected records")?;
        }
        let checkpoint = batcher.checkpoint();
        let text = self.serializer.serialize(&checkpoint);

        *self.latest.write().await = text.clone();
        debug!(
            records = record_count,
            families = checkpoint.len(),
            bytes = text.len(),
            "collection cycle exported"
        );
        Ok(text)
    }

    /// Handle to the latest rendered text, for a scrape handler to read.
    pub fn latest_handle(&self) -> Arc<RwLock<String>> {
        Arc::clone(&self.latest)
    }

    pub async fn latest(&self) -> String {
        self.latest.read().await.clone()
    }

    /// Run the collection loop until shutdown signal.
    ///
    /// A failed cycle is logged and skipped; the previous text keeps
    /// serving. No final cycle runs on shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "pull exporter started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.export_once().await {
                        error!(error = %e, "collection cycle failed, keeping previous exposition");
                    }
                }
                _ = shutdown.changed() => {
                    info!("pull exporter shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_model::{
        Aggregation, LabelSet, MetricDescriptor, MetricKind, ValueType,
    };
    use std::sync::Mutex;

    struct StubProducer {
        batches: Mutex<Vec<Vec<MetricRecord>>>,
    }

    impl StubProducer {
        fn new(batches: Vec<Vec<MetricRecord>>) -> Self {
            Self { batches: Mutex::new(batches) }
        }
    }

    impl MetricProducer for StubProducer {
        fn collect(&self) -> Vec<MetricRecord> {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() { Vec::new() } else { batches.remove(0) }
        }
    }

    fn counter(name: &str, kind: MetricKind, value: f64) -> MetricRecord {
        MetricRecord {
            descriptor: MetricDescriptor {
                name: name.to_string(),
                description: "requests served".to_string(),
                unit: "1".to_string(),
                metric_kind: kind,
                value_type: ValueType::Double,
            },
            labels: LabelSet::new(),
            aggregation: Aggregation::Sum { value },
            unix_ms: 1_700_000_000_000,
        }
    }

    fn config() -> ExporterConfig {
        ExporterConfig {
            prefix: None,
            append_timestamp: false,
            interval_secs: 1,
        }
    }

    #[tokio::test]
    async fn export_once_renders_and_stores() {
        let producer = Arc::new(StubProducer::new(vec![vec![counter(
            "requests_total",
            MetricKind::Counter,
            3.0,
        )]]));
        let exporter = PullExporter::new(producer, &config());

        let text = exporter.export_once().await.unwrap();
        assert_eq!(
            text,
            "# HELP requests_total requests served\n\
             # TYPE requests_total counter\n\
             requests_total 3\n"
        );
        assert_eq!(exporter.latest().await, text);
    }

    #[tokio::test]
    async fn empty_cycle_exports_empty_text() {
        let producer = Arc::new(StubProducer::new(vec![]));
        let exporter = PullExporter::new(producer, &config());

        let text = exporter.export_once().await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn failed_cycle_keeps_previous_text() {
        let good = vec![counter("requests_total", MetricKind::Counter, 1.0)];
        // Same name, different kind: ambiguous series identity.
        let bad = vec![
            counter("requests_total", MetricKind::Counter, 1.0),
            counter("requests_total", MetricKind::UpDownCounter, 1.0),
        ];
        let producer = Arc::new(StubProducer::new(vec![good, bad]));
        let exporter = PullExporter::new(producer, &config());

        let first = exporter.export_once().await.unwrap();
        let err = exporter.export_once().await.unwrap_err();
        assert!(err.to_string().contains("batching"));
        assert_eq!(exporter.latest().await, first);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let producer = Arc::new(StubProducer::new(vec![]));
        let mut cfg = config();
        cfg.interval_secs = 3600;
        let exporter = Arc::new(PullExporter::new(producer, &cfg));

        let (tx, rx) = watch::channel(false);
        let handle = {
            let exporter = Arc::clone(&exporter);
            tokio::spawn(async move { exporter.run(rx).await })
        };

        tx.send(true).unwrap();
        handle.await.unwrap();

        // No cycle ran before shutdown; nothing was exported.
        assert_eq!(exporter.latest().await, "");
    }
}
