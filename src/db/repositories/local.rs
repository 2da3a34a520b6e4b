//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory using HashMap and Vec structures, providing fast, deterministic,
//! and isolated execution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{OccurrenceId, OccurrenceOverride, ParticipantOverride, RecordId, SeriesId, StudentId};
use crate::db::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::db::repository::{CommitmentRepository, OverrideRepository, RecurrenceRepository};
use crate::models::{CommitmentRecord, RecurrenceSeries};

/// In-memory local repository.
///
/// Version rows and ledger records are kept as append-ordered vectors to
/// mirror the append-only contract; overrides are a map keyed by the
/// deterministic occurrence id. The interior lock is never held across an
/// await point.
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct LocalData {
    series_versions: Vec<RecurrenceSeries>,
    overrides: HashMap<OccurrenceId, OccurrenceOverride>,
    commitments: Vec<CommitmentRecord>,
    is_healthy: bool,
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                is_healthy: true,
                ..Default::default()
            })),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let healthy = data.is_healthy;
        *data = LocalData {
            is_healthy: healthy,
            ..Default::default()
        };
    }

    /// Number of ledger records stored.
    pub fn commitment_count(&self) -> usize {
        self.data.read().commitments.len()
    }

    /// Number of recurrence version rows stored.
    pub fn series_version_count(&self) -> usize {
        self.data.read().series_versions.len()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::internal("Repository is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecurrenceRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_series_version(&self, version: &RecurrenceSeries) -> RepositoryResult<()> {
        self.check_health()?;

        let mut data = self.data.write();
        let duplicate = data.series_versions.iter().any(|v| {
            v.series_id == version.series_id && v.effective_from == version.effective_from
        });
        if duplicate {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "Series {} already has a version effective at {}",
                    version.series_id, version.effective_from
                ),
                ErrorContext::new("insert_series_version")
                    .with_entity("series")
                    .with_entity_id(version.series_id),
            ));
        }
        data.series_versions.push(version.clone());
        Ok(())
    }

    async fn series_versions(&self, series_id: SeriesId) -> RepositoryResult<Vec<RecurrenceSeries>> {
        let data = self.data.read();
        let mut versions: Vec<RecurrenceSeries> = data
            .series_versions
            .iter()
            .filter(|v| v.series_id == series_id)
            .cloned()
            .collect();
        if versions.is_empty() {
            return Err(RepositoryError::not_found_with_context(
                format!("Series {} not found", series_id),
                ErrorContext::new("series_versions")
                    .with_entity("series")
                    .with_entity_id(series_id),
            ));
        }
        versions.sort_by_key(|v| v.effective_from);
        Ok(versions)
    }

    async fn all_series_versions(&self) -> RepositoryResult<Vec<RecurrenceSeries>> {
        Ok(self.data.read().series_versions.clone())
    }

    async fn mark_series_deleted(
        &self,
        series_id: SeriesId,
        at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        self.check_health()?;

        let mut data = self.data.write();
        let mut seen = false;
        let mut flagged = 0;
        for version in data
            .series_versions
            .iter_mut()
            .filter(|v| v.series_id == series_id)
        {
            seen = true;
            if !version.is_deleted {
                version.is_deleted = true;
                version.deleted_at = Some(at);
                flagged += 1;
            }
        }
        if !seen {
            return Err(RepositoryError::not_found_with_context(
                format!("Series {} not found", series_id),
                ErrorContext::new("mark_series_deleted")
                    .with_entity("series")
                    .with_entity_id(series_id),
            ));
        }
        Ok(flagged)
    }
}

#[async_trait]
impl OverrideRepository for LocalRepository {
    async fn set_occurrence_notes(
        &self,
        occurrence_id: &OccurrenceId,
        notes: Option<String>,
    ) -> RepositoryResult<()> {
        self.check_health()?;

        let mut data = self.data.write();
        let entry = data.overrides.entry(occurrence_id.clone()).or_default();
        entry.notes = notes;
        // Drop empty map entries so absence stays the normal case.
        if !entry.is_populated() {
            data.overrides.remove(occurrence_id);
        }
        Ok(())
    }

    async fn replace_occurrence_participants(
        &self,
        occurrence_id: &OccurrenceId,
        participants: Vec<ParticipantOverride>,
    ) -> RepositoryResult<()> {
        self.check_health()?;

        let mut data = self.data.write();
        let entry = data.overrides.entry(occurrence_id.clone()).or_default();
        entry.participants = participants;
        if !entry.is_populated() {
            data.overrides.remove(occurrence_id);
        }
        Ok(())
    }

    async fn fetch_override(
        &self,
        occurrence_id: &OccurrenceId,
    ) -> RepositoryResult<OccurrenceOverride> {
        let data = self.data.read();
        Ok(data.overrides.get(occurrence_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CommitmentRepository for LocalRepository {
    async fn append_commitment(&self, record: &CommitmentRecord) -> RepositoryResult<()> {
        self.check_health()?;
        self.data.write().commitments.push(record.clone());
        Ok(())
    }

    async fn append_commitments(&self, records: &[CommitmentRecord]) -> RepositoryResult<()> {
        self.check_health()?;
        // Single write-lock acquisition keeps the batch all-or-nothing.
        self.data.write().commitments.extend_from_slice(records);
        Ok(())
    }

    async fn commitment(&self, id: RecordId) -> RepositoryResult<CommitmentRecord> {
        let data = self.data.read();
        data.commitments
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Commitment record {} not found", id),
                    ErrorContext::new("commitment")
                        .with_entity("commitment")
                        .with_entity_id(id),
                )
            })
    }

    async fn commitments_for_pair(
        &self,
        student_id: StudentId,
        series_id: SeriesId,
    ) -> RepositoryResult<Vec<CommitmentRecord>> {
        let data = self.data.read();
        Ok(data
            .commitments
            .iter()
            .filter(|r| r.student_id == student_id && r.series_id == series_id)
            .cloned()
            .collect())
    }

    async fn commitments_for_student(
        &self,
        student_id: StudentId,
    ) -> RepositoryResult<Vec<CommitmentRecord>> {
        let data = self.data.read();
        Ok(data
            .commitments
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn set_commitment_effective_to(
        &self,
        id: RecordId,
        effective_to: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.check_health()?;

        let mut data = self.data.write();
        let record = data.commitments.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Commitment record {} not found", id),
                ErrorContext::new("set_commitment_effective_to")
                    .with_entity("commitment")
                    .with_entity_id(id),
            )
        })?;
        if record.effective_to.is_some() {
            return Err(RepositoryError::conflict_with_context(
                format!("Commitment record {} is already bounded", id),
                ErrorContext::new("set_commitment_effective_to")
                    .with_entity("commitment")
                    .with_entity_id(id),
            ));
        }
        record.effective_to = Some(effective_to);
        Ok(())
    }
}
