//! Repository traits for abstracting storage operations.
//!
//! These traits define the interface the engine needs from its store,
//! allowing different implementations (in-memory, database-backed) to be
//! swapped via dependency injection.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync` to work with async Rust and allow
//! sharing across threads.
//!
//! # Consistency
//! The commitment repository is append-mostly: records are inserted and the
//! single permitted mutation is back-filling `effective_to` during a split.
//! Cross-call atomicity (quota check followed by append) is the service
//! layer's responsibility, not the repository's.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::{OccurrenceId, OccurrenceOverride, ParticipantOverride, RecordId, SeriesId, StudentId};
use crate::models::{CommitmentRecord, RecurrenceSeries};

pub use super::error::{ErrorContext, RepositoryError, RepositoryResult};

/// Storage operations for recurrence lineages and their version rows.
#[async_trait]
pub trait RecurrenceRepository: Send + Sync {
    /// Check if the store is healthy and able to serve requests.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a new version row.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(RepositoryError::Conflict)` if the lineage already has a version
    ///   with the same `effective_from`
    async fn insert_series_version(&self, version: &RecurrenceSeries) -> RepositoryResult<()>;

    /// All version rows of one lineage, ordered by `effective_from` ascending.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` if the lineage is unknown
    async fn series_versions(&self, series_id: SeriesId) -> RepositoryResult<Vec<RecurrenceSeries>>;

    /// Every version row of every lineage. The materializer groups these by
    /// lineage itself; the store does not interpret them.
    async fn all_series_versions(&self) -> RepositoryResult<Vec<RecurrenceSeries>>;

    /// Soft-delete a lineage: flag its not-yet-deleted version rows with
    /// `deleted_at = at`.
    ///
    /// # Returns
    /// * `Ok(usize)` - number of version rows flagged (0 when all were
    ///   already deleted)
    /// * `Err(RepositoryError::NotFound)` if the lineage is unknown
    async fn mark_series_deleted(
        &self,
        series_id: SeriesId,
        at: DateTime<Utc>,
    ) -> RepositoryResult<usize>;
}

/// Storage operations for per-occurrence overrides (notes + roster diffs).
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// Set or clear the free-text notes for an occurrence.
    async fn set_occurrence_notes(
        &self,
        occurrence_id: &OccurrenceId,
        notes: Option<String>,
    ) -> RepositoryResult<()>;

    /// Replace the full roster diff for an occurrence.
    ///
    /// Last-write-wins at occurrence granularity: the previous list is
    /// discarded entirely.
    async fn replace_occurrence_participants(
        &self,
        occurrence_id: &OccurrenceId,
        participants: Vec<ParticipantOverride>,
    ) -> RepositoryResult<()>;

    /// Fetch the override for an occurrence.
    ///
    /// Absence is the normal case and yields the empty default, not an error.
    async fn fetch_override(
        &self,
        occurrence_id: &OccurrenceId,
    ) -> RepositoryResult<OccurrenceOverride>;
}

/// Storage operations for the append-only commitment ledger.
#[async_trait]
pub trait CommitmentRepository: Send + Sync {
    /// Append one record to the ledger.
    async fn append_commitment(&self, record: &CommitmentRecord) -> RepositoryResult<()>;

    /// Append a batch of records as one write. Either all records land or
    /// none do.
    async fn append_commitments(&self, records: &[CommitmentRecord]) -> RepositoryResult<()>;

    /// Fetch a single record by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` if the record is unknown
    async fn commitment(&self, id: RecordId) -> RepositoryResult<CommitmentRecord>;

    /// Full chain for one (student, series) pair in insertion order.
    async fn commitments_for_pair(
        &self,
        student_id: StudentId,
        series_id: SeriesId,
    ) -> RepositoryResult<Vec<CommitmentRecord>>;

    /// Every record for one student across all series, in insertion order.
    async fn commitments_for_student(
        &self,
        student_id: StudentId,
    ) -> RepositoryResult<Vec<CommitmentRecord>>;

    /// Back-fill `effective_to` on an existing record. This is the only
    /// mutation the ledger permits.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` if the record is unknown
    /// * `Err(RepositoryError::Conflict)` if the record is already bounded
    async fn set_commitment_effective_to(
        &self,
        id: RecordId,
        effective_to: DateTime<Utc>,
    ) -> RepositoryResult<()>;
}

/// Umbrella trait for a store implementing every repository the engine needs.
pub trait FullRepository:
    RecurrenceRepository + OverrideRepository + CommitmentRepository
{
}

impl<T> FullRepository for T where
    T: RecurrenceRepository + OverrideRepository + CommitmentRepository
{
}
