//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! Domain types that already carry their wire form (recurrence versions,
//! commitment records) are re-exported and serialized directly.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{
    CommitmentStatus, OccurrenceId, ParticipationType, SeriesId, SessionOccurrence, StudentId,
    TrainerId,
};

// Re-export existing types that are already serializable
pub use crate::api::{OccurrenceOverride, ParticipantOverride};
pub use crate::models::{CommitmentRecord, RecurrenceSeries};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository connectivity
    pub repository: String,
}

// =============================================================================
// Occurrences
// =============================================================================

/// Query parameters for listing occurrences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceQuery {
    /// First calendar day of the range (inclusive)
    pub start: NaiveDate,
    /// Last calendar day of the range (inclusive)
    pub end: NaiveDate,
    /// Restrict to one trainer's series (optional)
    #[serde(default)]
    pub trainer_id: Option<TrainerId>,
}

/// One materialized occurrence with display names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceDto {
    pub occurrence_id: OccurrenceId,
    pub series_id: SeriesId,
    pub trainer_id: TrainerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_name: Option<String>,
    pub series_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub participants: Vec<ParticipantDto>,
    pub has_override: bool,
}

/// One roster entry with the student's display name resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub student_id: StudentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub participation: ParticipationType,
    pub is_present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_notes: Option<String>,
}

impl OccurrenceDto {
    /// Build the DTO from a projection; names are attached by the handler.
    pub fn from_occurrence(occurrence: SessionOccurrence) -> Self {
        Self {
            occurrence_id: occurrence.occurrence_id,
            series_id: occurrence.series_id,
            trainer_id: occurrence.trainer_id,
            trainer_name: None,
            series_name: occurrence.series_name,
            start: occurrence.start,
            end: occurrence.end,
            notes: occurrence.notes,
            participants: occurrence
                .participants
                .into_iter()
                .map(|p| ParticipantDto {
                    student_id: p.student_id,
                    student_name: None,
                    participation: p.participation,
                    is_present: p.is_present,
                    attendance_notes: p.attendance_notes,
                })
                .collect(),
            has_override: occurrence.has_override,
        }
    }
}

/// Response for occurrence listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceListResponse {
    pub occurrences: Vec<OccurrenceDto>,
    pub total: usize,
}

/// Request body for setting occurrence notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetNotesRequest {
    /// New notes; blank or absent clears them
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for replacing the roster diff of an occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetParticipantsRequest {
    pub participants: Vec<ParticipantOverride>,
}

// =============================================================================
// Series administration
// =============================================================================

/// Request body for creating a series or revising one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub trainer_id: TrainerId,
    /// Weekday index, 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interval_minutes: u32,
    pub series_name: String,
    /// Defaults to now when absent
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
}

/// Response for series listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesListResponse {
    pub series: Vec<RecurrenceSeries>,
    pub total: usize,
}

/// Query parameters for deleting a series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteSeriesQuery {
    /// Deletion instant; defaults to now
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

// =============================================================================
// Commitments
// =============================================================================

/// Query parameters for point-in-time status reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusQuery {
    /// Query instant; defaults to now
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Response for a point-in-time status read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentStatusResponse {
    pub student_id: StudentId,
    pub series_id: SeriesId,
    pub at: DateTime<Utc>,
    pub status: CommitmentStatus,
}

/// Request body for a single commitment change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommitmentRequest {
    pub status: CommitmentStatus,
    /// Defaults to now when absent
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
}

/// Request body for a bulk commitment change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateCommitmentsRequest {
    pub series_ids: Vec<SeriesId>,
    pub status: CommitmentStatus,
    /// Defaults to now when absent
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
}

/// Response for bulk commitment changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentListResponse {
    pub records: Vec<CommitmentRecord>,
    pub total: usize,
}

/// Request body for splitting a commitment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitCommitmentRequest {
    pub split_from: DateTime<Utc>,
    pub new_status: CommitmentStatus,
}
