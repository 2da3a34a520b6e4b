//! The append-only commitment ledger.
//!
//! All writes for a student funnel through a per-student mutex held across
//! the quota check and the append, closing the check-then-act window in
//! which two concurrent writers could both pass validation and over-book the
//! plan. Reads never take the lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::info;

use crate::api::{CommitmentStatus, RecordId, SeriesId, StudentId};
use crate::db::repository::{CommitmentRepository, FullRepository};
use crate::directory::PlanProvider;
use crate::models::commitment::{sort_history_descending, status_as_of};
use crate::models::CommitmentRecord;

use super::error::{SchedulingError, SchedulingResult};
use super::quota::QuotaEnforcer;

/// Append-only store of per-(student, series) attendance-intent records.
pub struct CommitmentLedger {
    repository: Arc<dyn FullRepository>,
    quota: QuotaEnforcer,
    /// Per-student write serialization. The outer lock only guards the map;
    /// the inner async mutex spans the quota-check + append critical section.
    student_locks: Mutex<HashMap<StudentId, Arc<tokio::sync::Mutex<()>>>>,
}

impl CommitmentLedger {
    pub fn new(repository: Arc<dyn FullRepository>, plans: Arc<dyn PlanProvider>) -> Self {
        let quota = QuotaEnforcer::new(repository.clone(), plans);
        Self {
            repository,
            quota,
            student_locks: Mutex::new(HashMap::new()),
        }
    }

    fn student_lock(&self, student_id: StudentId) -> Arc<tokio::sync::Mutex<()>> {
        self.student_locks
            .lock()
            .entry(student_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Status of a (student, series) pair as of `at`, defaulting to
    /// NOT_ATTENDING when no record governs that instant.
    pub async fn get_status_at(
        &self,
        student_id: StudentId,
        series_id: SeriesId,
        at: DateTime<Utc>,
    ) -> SchedulingResult<CommitmentStatus> {
        let records = self
            .repository
            .commitments_for_pair(student_id, series_id)
            .await?;
        Ok(status_as_of(&records, at))
    }

    /// Append a status change for one series.
    ///
    /// An ATTENDING change is quota-validated first; on rejection nothing is
    /// written and the error propagates unchanged.
    pub async fn update(
        &self,
        student_id: StudentId,
        series_id: SeriesId,
        status: CommitmentStatus,
        effective_from: DateTime<Utc>,
    ) -> SchedulingResult<CommitmentRecord> {
        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        self.ensure_fresh_timestamp(student_id, series_id, effective_from)
            .await?;
        if status == CommitmentStatus::Attending {
            self.quota.validate(student_id, effective_from).await?;
        }

        let record = CommitmentRecord::new(student_id, series_id, status, effective_from);
        self.repository.append_commitment(&record).await?;
        info!(
            student = %student_id,
            series = %series_id,
            %status,
            effective_from = %effective_from,
            "commitment recorded"
        );
        Ok(record)
    }

    /// Append the same status change for several series at once.
    ///
    /// All-or-nothing: the whole batch is quota-prechecked (current count +
    /// batch length against the plan limit) before any record is appended;
    /// on rejection zero records are written.
    pub async fn bulk_update(
        &self,
        student_id: StudentId,
        series_ids: &[SeriesId],
        status: CommitmentStatus,
        effective_from: DateTime<Utc>,
    ) -> SchedulingResult<Vec<CommitmentRecord>> {
        if series_ids.is_empty() {
            return Err(SchedulingError::Validation(
                "bulk update requires at least one series".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for series_id in series_ids {
            if !seen.insert(*series_id) {
                return Err(SchedulingError::Validation(format!(
                    "series {} appears more than once in the batch",
                    series_id
                )));
            }
        }

        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        for series_id in series_ids {
            self.ensure_fresh_timestamp(student_id, *series_id, effective_from)
                .await?;
        }
        if status == CommitmentStatus::Attending {
            self.quota
                .validate_batch(student_id, effective_from, series_ids.len())
                .await?;
        }

        let records: Vec<CommitmentRecord> = series_ids
            .iter()
            .map(|series_id| CommitmentRecord::new(student_id, *series_id, status, effective_from))
            .collect();
        self.repository.append_commitments(&records).await?;
        info!(
            student = %student_id,
            batch = %series_ids.len(),
            %status,
            effective_from = %effective_from,
            "bulk commitment recorded"
        );
        Ok(records)
    }

    /// Change "this and all following" occurrences without rewriting history.
    ///
    /// Back-fills `effective_to = split_from` on the superseded record (the
    /// only mutation the ledger ever applies) and appends a record carrying
    /// `new_status` from `split_from` forward.
    pub async fn split(
        &self,
        record_id: RecordId,
        split_from: DateTime<Utc>,
        new_status: CommitmentStatus,
    ) -> SchedulingResult<CommitmentRecord> {
        let original = self.repository.commitment(record_id).await?;
        if original.effective_to.is_some() {
            return Err(SchedulingError::Validation(format!(
                "commitment record {} was already superseded by a split",
                record_id
            )));
        }
        if split_from <= original.effective_from {
            return Err(SchedulingError::Validation(
                "split point must lie after the record's effective-from".to_string(),
            ));
        }

        let lock = self.student_lock(original.student_id);
        let _guard = lock.lock().await;

        let chain = self
            .repository
            .commitments_for_pair(original.student_id, original.series_id)
            .await?;
        if chain.iter().any(|r| r.effective_from == split_from) {
            return Err(SchedulingError::Validation(format!(
                "a commitment for this series already takes effect at {}",
                split_from
            )));
        }
        // Quota applies only when the split introduces a new ATTENDING
        // segment; re-asserting an already-attending chain is not a new slot.
        if new_status == CommitmentStatus::Attending
            && status_as_of(&chain, split_from) != CommitmentStatus::Attending
        {
            self.quota.validate(original.student_id, split_from).await?;
        }

        self.repository
            .set_commitment_effective_to(record_id, split_from)
            .await?;
        let record = CommitmentRecord::new(
            original.student_id,
            original.series_id,
            new_status,
            split_from,
        );
        self.repository.append_commitment(&record).await?;
        info!(
            student = %original.student_id,
            series = %original.series_id,
            superseded = %record_id,
            split_from = %split_from,
            "commitment split"
        );
        Ok(record)
    }

    /// Full, unfiltered audit trail for a pair, descending by
    /// `effective_from`.
    pub async fn get_history(
        &self,
        student_id: StudentId,
        series_id: SeriesId,
    ) -> SchedulingResult<Vec<CommitmentRecord>> {
        let mut records = self
            .repository
            .commitments_for_pair(student_id, series_id)
            .await?;
        sort_history_descending(&mut records);
        Ok(records)
    }

    /// Reject a write whose `effective_from` duplicates an existing record
    /// of the pair; chains stay strictly ordered.
    async fn ensure_fresh_timestamp(
        &self,
        student_id: StudentId,
        series_id: SeriesId,
        effective_from: DateTime<Utc>,
    ) -> SchedulingResult<()> {
        let records = self
            .repository
            .commitments_for_pair(student_id, series_id)
            .await?;
        if records.iter().any(|r| r.effective_from == effective_from) {
            return Err(SchedulingError::Validation(format!(
                "a commitment for this series already takes effect at {}",
                effective_from
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod ledger_tests;
