// Error types for the clustering core.
//
// Loaders and the binary use anyhow with file context. The pure pipeline
// stages return ClusterError so callers can match on the failure kind.

use thiserror::Error;

/// Errors raised by the vectorize / cluster / score stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// A sentence produced zero tokens, so its mean vector is undefined.
    #[error("sentence has no tokens; empty sentences must be filtered before vectorization")]
    EmptySentence,

    /// The requested cluster count is zero or exceeds the number of points.
    #[error("invalid cluster count {k} for {n} sentences (need 1 <= k <= n)")]
    InvalidClusterCount { k: usize, n: usize },

    /// Two vectors that must share a dimensionality do not.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Per-item sequences (vectors, labels, distances) disagree in length.
    #[error("length mismatch: expected {expected} items, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// An assignment refers to a cluster that has no centroid.
    #[error("cluster label {label} out of range for {k} clusters")]
    LabelOutOfRange { label: usize, k: usize },
}

/// Result alias for the clustering core.
pub type Result<T> = std::result::Result<T, ClusterError>;
