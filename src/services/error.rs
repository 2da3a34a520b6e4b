//! Error taxonomy of the engine's service layer.
//!
//! Three caller-visible failure classes, plus pass-through of storage
//! failures:
//!
//! - [`SchedulingError::Validation`]: bad input, rejected synchronously,
//!   nothing persisted.
//! - [`SchedulingError::PreconditionFailed`] /
//!   [`SchedulingError::QuotaExceeded`]: a business precondition does not
//!   hold; the caller must resolve it externally (assign a plan, pick fewer
//!   series) and retry. Rejected before any ledger write.
//! - [`SchedulingError::NotFound`]: unknown series/record references,
//!   surfaced as-is.

use crate::db::RepositoryError;

/// Result type for service-layer operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Error type for service-layer operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Bad input rejected before anything is persisted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A business precondition does not hold.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Quota rejection, naming the limit and the current count so the caller
    /// can decide how to proceed.
    #[error("exceeds plan limit of {limit} commitments ({count} already active)")]
    QuotaExceeded { limit: u32, count: usize },

    /// Unknown entity reference.
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage failure, propagated unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SchedulingError {
    /// Whether this error maps to a missing entity (including storage-level
    /// not-found).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchedulingError::NotFound(_)
                | SchedulingError::Repository(RepositoryError::NotFound { .. })
        )
    }
}
