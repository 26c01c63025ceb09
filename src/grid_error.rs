//! GridError: Unified error type for sparse-grid-hash public APIs
//!
//! Every fallible operation of the storage, the generators and the adaptive
//! mutators reports through this type. Configuration errors are raised before
//! the storage is touched; degenerate-but-valid inputs never produce an error.

use thiserror::Error;

/// Unified error type for grid storage, generation, refinement and coarsening.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A requested level is zero where that is meaningless, or exceeds [`MAX_LEVEL`](crate::storage::MAX_LEVEL).
    #[error("invalid level {level}: {reason}")]
    InvalidLevel { level: u32, reason: &'static str },
    /// A `(level, index)` pair violates the odd-index/range rule.
    #[error("invalid level/index pair ({level}, {index}) in dimension {dim}")]
    InvalidLevelIndex { dim: usize, level: u32, index: u32 },
    /// The granularity parameter of a regular grid must be finite and at most 1.
    #[error("invalid granularity parameter {0}")]
    InvalidGranularity(String),
    /// A point, vector or term had the wrong number of dimensions.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// Generators only fill empty storages.
    #[error("storage not empty ({size} points)")]
    StorageNotEmpty { size: usize },
    /// An interaction term refers to a dimension outside the grid.
    #[error("invalid interaction term: {0}")]
    InvalidInteractionTerm(String),
    /// Clique size must lie in `1..=dimension`.
    #[error("clique size {clique_size} must be in 1..={dimension}")]
    InvalidCliqueSize { clique_size: usize, dimension: usize },
    /// A sequence number does not address a stored point.
    #[error("sequence number {seq} out of range (size {size})")]
    SequenceOutOfRange { seq: usize, size: usize },
    /// The point is already stored at another sequence number.
    #[error("point {point} already stored at sequence number {seq}")]
    DuplicatePoint { point: String, seq: usize },
    /// Removing the requested points would leave a point without its parent.
    #[error("removal would strand point {point} (sequence number {seq}) without its parent")]
    StrandedPoint { point: String, seq: usize },
    /// A coefficient vector is not index-consistent with the storage.
    #[error("coefficient vector has length {found}, storage has {expected} points")]
    CoefficientLengthMismatch { expected: usize, found: usize },
    /// More algorithmic dimensions than real dimensions, or an out-of-range one.
    #[error("invalid algorithmic dimensions {dims:?} for a {dimension}-dimensional grid")]
    TooManyAlgorithmicDimensions { dims: Vec<usize>, dimension: usize },
    /// A serialized storage was written by a newer format.
    #[error("storage format version {found} is newer than supported version {supported}")]
    UnsupportedFormatVersion { found: u32, supported: u32 },
    /// A structural invariant of the storage does not hold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The operation is not available for this grid type.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}
