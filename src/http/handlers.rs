//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic; no rule lives here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::collections::HashMap;

use super::dto::{
    BulkUpdateCommitmentsRequest, CommitmentListResponse, CommitmentStatusResponse,
    DeleteSeriesQuery, HealthResponse, OccurrenceDto, OccurrenceListResponse, OccurrenceOverride,
    OccurrenceQuery, RecurrenceSeries, SeriesListResponse, SeriesRequest, SetNotesRequest,
    SetParticipantsRequest, SplitCommitmentRequest, StatusQuery, UpdateCommitmentRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{weekday_from_index, OccurrenceId, RecordId, SeriesId, StudentId, TrainerId};
use crate::db::repository::RecurrenceRepository;
use crate::directory::{StudentDirectory, TrainerDirectory};
use crate::models::CommitmentRecord;
use crate::services::SeriesDefinition;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the repository
/// is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
    }))
}

// =============================================================================
// Occurrences
// =============================================================================

/// GET /v1/occurrences?start=YYYY-MM-DD&end=YYYY-MM-DD[&trainer_id=…]
///
/// Materialize the occurrences of the inclusive date range, merged with
/// per-occurrence overrides and display names.
pub async fn list_occurrences(
    State(state): State<AppState>,
    Query(query): Query<OccurrenceQuery>,
) -> HandlerResult<OccurrenceListResponse> {
    let occurrences = match query.trainer_id {
        Some(trainer_id) => {
            state
                .materializer
                .get_occurrences_for_trainer(trainer_id, query.start, query.end)
                .await?
        }
        None => state.materializer.get_occurrences(query.start, query.end).await?,
    };

    // Display names are resolved once per distinct id, not per occurrence.
    let mut trainer_names: HashMap<TrainerId, Option<String>> = HashMap::new();
    let mut student_names: HashMap<StudentId, Option<String>> = HashMap::new();

    let mut dtos = Vec::with_capacity(occurrences.len());
    for occurrence in occurrences {
        let mut dto = OccurrenceDto::from_occurrence(occurrence);

        dto.trainer_name = match trainer_names.get(&dto.trainer_id) {
            Some(cached) => cached.clone(),
            None => {
                let resolved = state
                    .trainers
                    .resolve_trainer(dto.trainer_id)
                    .await
                    .map(|t| t.name);
                trainer_names.insert(dto.trainer_id, resolved.clone());
                resolved
            }
        };

        for participant in &mut dto.participants {
            participant.student_name = match student_names.get(&participant.student_id) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved = state
                        .students
                        .resolve_student(participant.student_id)
                        .await
                        .map(|s| s.name);
                    student_names.insert(participant.student_id, resolved.clone());
                    resolved
                }
            };
        }

        dtos.push(dto);
    }

    let total = dtos.len();
    Ok(Json(OccurrenceListResponse {
        occurrences: dtos,
        total,
    }))
}

/// GET /v1/occurrences/{occurrence_id}/override
///
/// Notes and roster diff persisted for one occurrence; the empty default
/// when none exists.
pub async fn get_occurrence_override(
    State(state): State<AppState>,
    Path(occurrence_id): Path<String>,
) -> HandlerResult<OccurrenceOverride> {
    let occurrence_id = OccurrenceId::from(occurrence_id);
    Ok(Json(state.overrides.get(&occurrence_id).await?))
}

/// PUT /v1/occurrences/{occurrence_id}/notes
///
/// Set or clear the free-text notes of an occurrence.
pub async fn set_occurrence_notes(
    State(state): State<AppState>,
    Path(occurrence_id): Path<String>,
    Json(request): Json<SetNotesRequest>,
) -> Result<StatusCode, AppError> {
    let occurrence_id = OccurrenceId::from(occurrence_id);
    state.overrides.set_notes(&occurrence_id, request.notes).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/occurrences/{occurrence_id}/participants
///
/// Replace the full roster diff of an occurrence (full replace, not merge).
pub async fn set_occurrence_participants(
    State(state): State<AppState>,
    Path(occurrence_id): Path<String>,
    Json(request): Json<SetParticipantsRequest>,
) -> Result<StatusCode, AppError> {
    let occurrence_id = OccurrenceId::from(occurrence_id);
    state
        .overrides
        .set_participants(&occurrence_id, request.participants)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Series administration
// =============================================================================

/// GET /v1/series
///
/// Current catalogue: the latest version of each non-deleted lineage.
pub async fn list_series(State(state): State<AppState>) -> HandlerResult<SeriesListResponse> {
    let series = state.catalog.list_series().await?;
    let total = series.len();
    Ok(Json(SeriesListResponse { series, total }))
}

/// POST /v1/series
///
/// Create a new recurrence lineage.
pub async fn create_series(
    State(state): State<AppState>,
    Json(request): Json<SeriesRequest>,
) -> Result<(StatusCode, Json<RecurrenceSeries>), AppError> {
    let (definition, effective_from) = parse_series_request(request)?;
    let series = state.catalog.create_series(definition, effective_from).await?;
    Ok((StatusCode::CREATED, Json(series)))
}

/// POST /v1/series/{series_id}/revisions
///
/// Append a version row to an existing lineage.
pub async fn revise_series(
    State(state): State<AppState>,
    Path(series_id): Path<SeriesId>,
    Json(request): Json<SeriesRequest>,
) -> Result<(StatusCode, Json<RecurrenceSeries>), AppError> {
    let (definition, effective_from) = parse_series_request(request)?;
    let series = state
        .catalog
        .revise_series(series_id, definition, effective_from)
        .await?;
    Ok((StatusCode::CREATED, Json(series)))
}

/// DELETE /v1/series/{series_id}[?at=…]
///
/// Soft-delete a lineage; it stops producing occurrences from `at` forward.
pub async fn delete_series(
    State(state): State<AppState>,
    Path(series_id): Path<SeriesId>,
    Query(query): Query<DeleteSeriesQuery>,
) -> Result<StatusCode, AppError> {
    let at = query.at.unwrap_or_else(Utc::now);
    state.catalog.delete_series(series_id, at).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_series_request(
    request: SeriesRequest,
) -> Result<(SeriesDefinition, chrono::DateTime<Utc>), AppError> {
    let weekday = weekday_from_index(request.weekday).ok_or_else(|| {
        AppError::BadRequest(format!(
            "weekday must be 0 (Sunday) through 6 (Saturday), got {}",
            request.weekday
        ))
    })?;
    let definition = SeriesDefinition {
        trainer_id: request.trainer_id,
        weekday,
        start_time: request.start_time,
        end_time: request.end_time,
        interval_minutes: request.interval_minutes,
        series_name: request.series_name,
    };
    Ok((definition, request.effective_from.unwrap_or_else(Utc::now)))
}

// =============================================================================
// Commitments
// =============================================================================

/// GET /v1/students/{student_id}/series/{series_id}/commitment[?at=…]
///
/// Point-in-time status read, defaulting to NOT_ATTENDING when no record
/// governs the instant.
pub async fn get_commitment_status(
    State(state): State<AppState>,
    Path((student_id, series_id)): Path<(StudentId, SeriesId)>,
    Query(query): Query<StatusQuery>,
) -> HandlerResult<CommitmentStatusResponse> {
    let at = query.at.unwrap_or_else(Utc::now);
    let status = state.ledger.get_status_at(student_id, series_id, at).await?;
    Ok(Json(CommitmentStatusResponse {
        student_id,
        series_id,
        at,
        status,
    }))
}

/// POST /v1/students/{student_id}/series/{series_id}/commitment
///
/// Append a status change; ATTENDING changes are quota-checked first.
pub async fn update_commitment(
    State(state): State<AppState>,
    Path((student_id, series_id)): Path<(StudentId, SeriesId)>,
    Json(request): Json<UpdateCommitmentRequest>,
) -> Result<(StatusCode, Json<CommitmentRecord>), AppError> {
    let effective_from = request.effective_from.unwrap_or_else(Utc::now);
    let record = state
        .ledger
        .update(student_id, series_id, request.status, effective_from)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /v1/students/{student_id}/commitments
///
/// Bulk status change across several series; all-or-nothing.
pub async fn bulk_update_commitments(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
    Json(request): Json<BulkUpdateCommitmentsRequest>,
) -> Result<(StatusCode, Json<CommitmentListResponse>), AppError> {
    let effective_from = request.effective_from.unwrap_or_else(Utc::now);
    let records = state
        .ledger
        .bulk_update(student_id, &request.series_ids, request.status, effective_from)
        .await?;
    let total = records.len();
    Ok((
        StatusCode::CREATED,
        Json(CommitmentListResponse { records, total }),
    ))
}

/// GET /v1/students/{student_id}/series/{series_id}/commitments
///
/// Full audit trail for a pair, descending by effective-from.
pub async fn get_commitment_history(
    State(state): State<AppState>,
    Path((student_id, series_id)): Path<(StudentId, SeriesId)>,
) -> HandlerResult<CommitmentListResponse> {
    let records = state.ledger.get_history(student_id, series_id).await?;
    let total = records.len();
    Ok(Json(CommitmentListResponse { records, total }))
}

/// POST /v1/commitments/{record_id}/split
///
/// "This and all following" edit: bound the record at the split point and
/// append its successor.
pub async fn split_commitment(
    State(state): State<AppState>,
    Path(record_id): Path<RecordId>,
    Json(request): Json<SplitCommitmentRequest>,
) -> Result<(StatusCode, Json<CommitmentRecord>), AppError> {
    let record = state
        .ledger
        .split(record_id, request.split_from, request.new_status)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
