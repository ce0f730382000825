//! Domain types for the Beacon metric model.
//!
//! These types describe one collection cycle's worth of metric state as it
//! moves from the instrumentation runtime through batching to serialization.
//! All types are serializable so checkpoints can be captured as fixtures or
//! shipped across process boundaries.

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::labels::LabelSet;

// ── Descriptors ────────────────────────────────────────────────────

/// The kind of instrument a metric was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Monotonically increasing sum.
    Counter,
    /// Sum that may also decrease.
    UpDownCounter,
    /// Asynchronous instrument reporting the last observed value.
    ValueObserver,
    /// Synchronous instrument recording a value distribution.
    ValueRecorder,
}

impl MetricKind {
    /// The Prometheus exposition type this kind maps to.
    pub fn exposition_type(&self) -> &'static str {
        match self {
            MetricKind::Counter | MetricKind::UpDownCounter => "counter",
            MetricKind::ValueObserver => "gauge",
            MetricKind::ValueRecorder => "histogram",
        }
    }
}

/// Numeric type of the raw measurements behind a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Double,
}

/// Immutable identity of an instrument, created once by the runtime.
///
/// Two records belong to the same exported metric iff their descriptors
/// agree on `name`, `metric_kind`, and `value_type`; a cycle containing a
/// disagreement is a configuration error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub description: String,
    /// Unit string as provided by the instrumentation API, e.g. "ms".
    pub unit: String,
    pub metric_kind: MetricKind,
    pub value_type: ValueType,
}

impl MetricDescriptor {
    /// Compact `kind/value_type` signature used in conflict diagnostics.
    pub fn signature(&self) -> String {
        format!("{:?}/{:?}", self.metric_kind, self.value_type)
    }
}

// ── Records ────────────────────────────────────────────────────────

/// One instrument's checkpointed value for one label set in one cycle.
///
/// Produced fresh by the runtime on every collection tick and consumed
/// exactly once by the batcher for that cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub descriptor: MetricDescriptor,
    pub labels: LabelSet,
    pub aggregation: Aggregation,
    /// Collection timestamp, milliseconds since the Unix epoch.
    pub unix_ms: u64,
}

// ── Checkpoints ────────────────────────────────────────────────────

/// One merged series within a metric family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub labels: LabelSet,
    pub aggregation: Aggregation,
    /// Timestamp of the newest record merged into this point.
    pub unix_ms: u64,
}

/// All series exported under one metric name, in first-seen label-set order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub descriptor: MetricDescriptor,
    pub series: Vec<SeriesPoint>,
}

/// The immutable per-cycle snapshot of all merged metric series.
///
/// Families appear in first-seen metric-name order. Consumers treat a
/// checkpoint as read-only; the cycle that produced it discards it after
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSet {
    pub families: Vec<MetricFamily>,
}

impl CheckpointSet {
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricFamily> {
        self.families.iter()
    }
}
