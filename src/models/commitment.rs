//! Append-only commitment ledger records and chain queries.
//!
//! Records for a (student, series) pair form a linear chain ordered by
//! `effective_from`; the status as of an instant is a pure function of the
//! chain. State changes append new records, a split additionally back-fills
//! `effective_to` on the record it supersedes, and nothing is ever deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CommitmentStatus, RecordId, SeriesId, StudentId};

/// One entry in a (student, series) commitment chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub id: RecordId,
    pub student_id: StudentId,
    pub series_id: SeriesId,
    pub status: CommitmentStatus,
    /// Instant from which this record is the authoritative status.
    pub effective_from: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Upper bound of this record's validity window, set only by a split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<DateTime<Utc>>,
}

impl CommitmentRecord {
    /// Build a fresh, unbounded record stamped with the current wall clock.
    pub fn new(
        student_id: StudentId,
        series_id: SeriesId,
        status: CommitmentStatus,
        effective_from: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            student_id,
            series_id,
            status,
            effective_from,
            created_at: Utc::now(),
            effective_to: None,
        }
    }
}

/// The record governing `instant`: greatest `effective_from` at or before it.
///
/// Ties on `effective_from` (not expected in normal usage) resolve to the
/// most recently created record.
pub fn current_as_of<'a, I>(records: I, instant: DateTime<Utc>) -> Option<&'a CommitmentRecord>
where
    I: IntoIterator<Item = &'a CommitmentRecord>,
{
    records
        .into_iter()
        .filter(|r| r.effective_from <= instant)
        .max_by_key(|r| (r.effective_from, r.created_at))
}

/// Status as of `instant`, defaulting to [`CommitmentStatus::NotAttending`]
/// when the chain is empty or starts later. The default is a business rule,
/// not an error.
pub fn status_as_of<'a, I>(records: I, instant: DateTime<Utc>) -> CommitmentStatus
where
    I: IntoIterator<Item = &'a CommitmentRecord>,
{
    current_as_of(records, instant)
        .map(|r| r.status)
        .unwrap_or(CommitmentStatus::DEFAULT)
}

/// Order a chain for audit display: descending by `effective_from`, most
/// recently created first on ties.
pub fn sort_history_descending(records: &mut [CommitmentRecord]) {
    records.sort_by(|a, b| {
        (b.effective_from, b.created_at).cmp(&(a.effective_from, a.created_at))
    });
}
