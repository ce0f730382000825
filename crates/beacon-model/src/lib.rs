//! beacon-model: the shared metric data model for Beacon.
//!
//! Holds everything the export pipeline passes between its stages:
//! instrument descriptors, insertion-ordered label sets with canonical
//! fingerprints, per-cycle aggregation snapshots with merge semantics,
//! and the immutable per-cycle checkpoint set.
//!
//! # Architecture
//!
//! ```text
//! MetricRecord { descriptor, labels, aggregation, unix_ms }
//!   ├── MetricDescriptor  ← identity + kind, immutable
//!   ├── LabelSet          ← display order preserved, equality by fingerprint
//!   └── Aggregation       ← Sum | LastValue | Histogram, merge() per cycle
//!
//! CheckpointSet ← one MetricFamily per name, one SeriesPoint per label set
//! ```
//!
//! Nothing here performs I/O; every type is a plain in-memory value that is
//! safe to snapshot and hand to a serializer.

pub mod aggregate;
pub mod error;
pub mod labels;
pub mod types;

pub use aggregate::Aggregation;
pub use error::{MetricError, MetricResult};
pub use labels::{LabelSet, LabelValue};
pub use types::*;
