//! Error type shared by the whole crate.
//!
//! Only caller mistakes surface here (bad arguments, stale handles, bad
//! configuration). Arithmetic overflow saturates and degenerate geometry
//! falls back to zero vectors, so neither ever produces an error.

use thiserror::Error;

use crate::core::fixed::FixedScalar;
use crate::dynamics::body::BodyHandle;
use crate::dynamics::constraints::ConstraintHandle;

/// Errors raised by the physics core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// `sqrt` called with a negative value.
    #[error("negative value passed to sqrt: {0}")]
    NegativeSqrt(FixedScalar),

    /// `log2`/`ln`/`pow` called with a non-positive value.
    #[error("non-positive value passed to logarithm: {0}")]
    NonPositiveLogarithm(FixedScalar),

    /// `acos`/`asin` called outside [-1, 1].
    #[error("acos/asin argument {0} outside [-1, 1]")]
    AcosOutOfRange(FixedScalar),

    /// A point-on-line constraint was given a zero-length line.
    #[error("line direction must not be zero")]
    ZeroLineDirection,

    /// Handle does not refer to a live body.
    #[error("body {0} not found")]
    BodyNotFound(BodyHandle),

    /// A pairwise operation was given the same body twice.
    #[error("body {0} used on both sides of a pair")]
    SameBody(BodyHandle),

    /// Handle does not refer to a live constraint.
    #[error("constraint {0} not found")]
    ConstraintNotFound(ConstraintHandle),

    /// Solver or contact configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot bytes could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Result alias used throughout the crate.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
