//! Per-cycle batching of metric records by name and label set.
//!
//! The instrumentation runtime may report several records under the same
//! metric name in one cycle (multiple bound instances of one instrument, or
//! multiple instruments sharing a name). The batcher collapses them into one
//! entry per (name, label-set) pair so the scraper sees exactly one series
//! per dimension combination.

use std::collections::HashMap;

use tracing::debug;

use beacon_model::{
    CheckpointSet, MetricDescriptor, MetricError, MetricFamily, MetricRecord, MetricResult,
    SeriesPoint,
};

/// Accumulated state for one metric name within a cycle.
///
/// `series` keeps first-seen order; `by_fingerprint` is the cached label
/// fingerprint index used for merging.
struct FamilyState {
    descriptor: MetricDescriptor,
    series: Vec<SeriesPoint>,
    by_fingerprint: HashMap<String, usize>,
}

/// Groups and merges one collection cycle's records into a checkpoint set.
///
/// A batcher belongs to exactly one cycle: call [`process`](Self::process)
/// once per record, then [`checkpoint`](Self::checkpoint) once, then discard
/// or [`reset`](Self::reset) it. It never emits partial state mid-cycle.
#[derive(Default)]
pub struct LabelsBatcher {
    families: Vec<FamilyState>,
    by_name: HashMap<String, usize>,
}

impl LabelsBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the cycle's accumulated state.
    ///
    /// A record for an unseen (name, label-set) pair starts a new series; a
    /// record for a known pair merges via the aggregation's own semantics.
    /// Two records whose descriptors disagree on kind or value type for the
    /// same name make the series identity ambiguous and abort the cycle.
    pub fn process(&mut self, record: MetricRecord) -> MetricResult<()> {
        let family_idx = match self.by_name.get(&record.descriptor.name) {
            Some(&idx) => {
                let existing = &self.families[idx].descriptor;
                if existing.metric_kind != record.descriptor.metric_kind
                    || existing.value_type != record.descriptor.value_type
                {
                    return Err(MetricError::ConflictingDescriptor {
                        name: record.descriptor.name.clone(),
                        existing: existing.signature(),
                        incoming: record.descriptor.signature(),
                    });
                }
                idx
            }
            None => {
                self.by_name
                    .insert(record.descriptor.name.clone(), self.families.len());
                self.families.push(FamilyState {
                    descriptor: record.descriptor.clone(),
                    series: Vec::new(),
                    by_fingerprint: HashMap::new(),
                });
                self.families.len() - 1
            }
        };

        let fingerprint = record.labels.fingerprint();
        let family = &mut self.families[family_idx];
        match family.by_fingerprint.get(&fingerprint) {
            Some(&idx) => {
                let point = &mut family.series[idx];
                point
                    .aggregation
                    .merge(&record.aggregation, &family.descriptor.name)?;
                point.unix_ms = point.unix_ms.max(record.unix_ms);
                debug!(metric = %family.descriptor.name, "merged record into existing series");
            }
            None => {
                family.by_fingerprint.insert(fingerprint, family.series.len());
                family.series.push(SeriesPoint {
                    labels: record.labels,
                    aggregation: record.aggregation,
                    unix_ms: record.unix_ms,
                });
                debug!(
                    metric = %family.descriptor.name,
                    series = family.series.len(),
                    "started new series"
                );
            }
        }
        Ok(())
    }

    /// Snapshot the accumulated mapping as an immutable checkpoint set.
    ///
    /// Families appear in first-insertion metric-name order, series in
    /// first-insertion label-set order. Internal state is left untouched;
    /// the caller owns cycle boundaries and resets or discards the batcher.
    pub fn checkpoint(&self) -> CheckpointSet {
        CheckpointSet {
            families: self
                .families
                .iter()
                .map(|f| MetricFamily {
                    descriptor: f.descriptor.clone(),
                    series: f.series.clone(),
                })
                .collect(),
        }
    }

    /// Clear all accumulated state for the next cycle.
    pub fn reset(&mut self) {
        self.families.clear();
        self.by_name.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
