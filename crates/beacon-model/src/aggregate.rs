//! Aggregation snapshots and per-cycle merge semantics.
//!
//! An `Aggregation` is the point-in-time value an instrument checkpointed
//! for one label set. It is an explicit sum type; merging and rendering
//! dispatch on the discriminant, never on runtime type inspection.

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, MetricResult};

/// Point-in-time aggregated value for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    /// Running sum of all measurements.
    Sum { value: f64 },
    /// Most recent measurement and when it was observed.
    LastValue { value: f64, unix_ms: u64 },
    /// Bucketed value distribution.
    ///
    /// `counts` has one slot per boundary plus a final overflow slot for
    /// observations above the last boundary, so
    /// `counts.len() == boundaries.len() + 1` and the slots sum to `count`.
    /// The serializer derives the cumulative per-bucket counts and the
    /// terminal `+Inf` bucket (whose count equals `count`) from this.
    Histogram {
        boundaries: Vec<f64>,
        counts: Vec<u64>,
        sum: f64,
        count: u64,
    },
}

impl Aggregation {
    /// Checked histogram constructor enforcing the model invariants:
    /// strictly increasing boundaries, one overflow slot, consistent total.
    pub fn histogram(
        boundaries: Vec<f64>,
        counts: Vec<u64>,
        sum: f64,
        count: u64,
    ) -> MetricResult<Self> {
        if counts.len() != boundaries.len() + 1 {
            return Err(MetricError::InvalidHistogram(format!(
                "expected {} bucket counts for {} boundaries, got {}",
                boundaries.len() + 1,
                boundaries.len(),
                counts.len()
            )));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MetricError::InvalidHistogram(
                "boundaries must be strictly increasing".to_string(),
            ));
        }
        let total: u64 = counts.iter().sum();
        if total != count {
            return Err(MetricError::InvalidHistogram(format!(
                "bucket counts sum to {total} but total count is {count}"
            )));
        }
        Ok(Aggregation::Histogram { boundaries, counts, sum, count })
    }

    /// Discriminant name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Aggregation::Sum { .. } => "sum",
            Aggregation::LastValue { .. } => "last_value",
            Aggregation::Histogram { .. } => "histogram",
        }
    }

    /// Merge another snapshot of the same series into this one.
    ///
    /// Sums add; last-values keep the newer observation (ties go to the
    /// incoming record, so repeated observations within one cycle behave
    /// like overwrites); histograms add bucket-wise and require identical
    /// boundary vectors. Mixing kinds is a configuration error.
    pub fn merge(&mut self, incoming: &Aggregation, metric_name: &str) -> MetricResult<()> {
        match (self, incoming) {
            (Aggregation::Sum { value }, Aggregation::Sum { value: other }) => {
                *value += other;
                Ok(())
            }
            (
                Aggregation::LastValue { value, unix_ms },
                Aggregation::LastValue { value: other_value, unix_ms: other_ms },
            ) => {
                if *other_ms >= *unix_ms {
                    *value = *other_value;
                    *unix_ms = *other_ms;
                }
                Ok(())
            }
            (
                Aggregation::Histogram { boundaries, counts, sum, count },
                Aggregation::Histogram {
                    boundaries: other_boundaries,
                    counts: other_counts,
                    sum: other_sum,
                    count: other_count,
                },
            ) => {
                if boundaries != other_boundaries {
                    return Err(MetricError::BoundaryMismatch {
                        name: metric_name.to_string(),
                    });
                }
                for (slot, other) in counts.iter_mut().zip(other_counts) {
                    *slot += other;
                }
                *sum += other_sum;
                *count += other_count;
                Ok(())
            }
            (existing, incoming) => Err(MetricError::KindMismatch {
                name: metric_name.to_string(),
                existing: existing.kind_name(),
                incoming: incoming.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_add() {
        let mut agg = Aggregation::Sum { value: 2.0 };
        agg.merge(&Aggregation::Sum { value: 3.5 }, "m").unwrap();
        assert_eq!(agg, Aggregation::Sum { value: 5.5 });
    }

    #[test]
    fn last_value_later_timestamp_wins() {
        let mut agg = Aggregation::LastValue { value: 1.0, unix_ms: 100 };
        agg.merge(&Aggregation::LastValue { value: 2.0, unix_ms: 200 }, "m")
            .unwrap();
        assert_eq!(agg, Aggregation::LastValue { value: 2.0, unix_ms: 200 });
    }

    #[test]
    fn last_value_earlier_timestamp_ignored() {
        let mut agg = Aggregation::LastValue { value: 1.0, unix_ms: 200 };
        agg.merge(&Aggregation::LastValue { value: 2.0, unix_ms: 100 }, "m")
            .unwrap();
        assert_eq!(agg, Aggregation::LastValue { value: 1.0, unix_ms: 200 });
    }

    #[test]
    fn last_value_tie_takes_incoming() {
        let mut agg = Aggregation::LastValue { value: 1.0, unix_ms: 100 };
        agg.merge(&Aggregation::LastValue { value: 2.0, unix_ms: 100 }, "m")
            .unwrap();
        assert_eq!(agg, Aggregation::LastValue { value: 2.0, unix_ms: 100 });
    }

    #[test]
    fn histograms_add_bucket_wise() {
        let mut agg =
            Aggregation::histogram(vec![1.0, 10.0], vec![1, 2, 0], 7.0, 3).unwrap();
        let other =
            Aggregation::histogram(vec![1.0, 10.0], vec![0, 1, 4], 100.0, 5).unwrap();
        agg.merge(&other, "m").unwrap();
        assert_eq!(
            agg,
            Aggregation::Histogram {
                boundaries: vec![1.0, 10.0],
                counts: vec![1, 3, 4],
                sum: 107.0,
                count: 8,
            }
        );
    }

    #[test]
    fn histogram_boundary_mismatch_is_fatal() {
        let mut agg = Aggregation::histogram(vec![1.0, 10.0], vec![0, 0, 0], 0.0, 0).unwrap();
        let other = Aggregation::histogram(vec![1.0, 100.0], vec![0, 0, 0], 0.0, 0).unwrap();
        let err = agg.merge(&other, "latency").unwrap_err();
        assert!(matches!(err, MetricError::BoundaryMismatch { name } if name == "latency"));
    }

    #[test]
    fn kind_mismatch_is_fatal() {
        let mut agg = Aggregation::Sum { value: 1.0 };
        let err = agg
            .merge(&Aggregation::LastValue { value: 1.0, unix_ms: 0 }, "m")
            .unwrap_err();
        assert!(matches!(err, MetricError::KindMismatch { .. }));
    }

    #[test]
    fn histogram_constructor_validates() {
        assert!(Aggregation::histogram(vec![1.0, 10.0], vec![0, 0], 0.0, 0).is_err());
        assert!(Aggregation::histogram(vec![10.0, 1.0], vec![0, 0, 0], 0.0, 0).is_err());
        assert!(Aggregation::histogram(vec![1.0], vec![1, 1], 2.0, 3).is_err());
        assert!(Aggregation::histogram(vec![1.0], vec![1, 1], 2.0, 2).is_ok());
    }
}
