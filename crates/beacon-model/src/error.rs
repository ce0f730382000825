//! Error types for the Beacon metric model.

use thiserror::Error;

/// Result type alias for metric model and batching operations.
pub type MetricResult<T> = Result<T, MetricError>;

/// Errors that can occur while building or merging metric state.
///
/// All variants are fatal configuration errors: they indicate that two
/// records cannot name the same series, and the current cycle's checkpoint
/// must be aborted rather than silently repaired.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("conflicting descriptors for metric {name}: {existing} vs {incoming}")]
    ConflictingDescriptor {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error("cannot merge {existing} aggregation with {incoming} for metric {name}")]
    KindMismatch {
        name: String,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("histogram boundary mismatch for metric {name}")]
    BoundaryMismatch { name: String },

    #[error("invalid histogram: {0}")]
    InvalidHistogram(String),
}
