//! Plan-quota enforcement for ATTENDING commitments.
//!
//! Quota is scoped to the active plan assignment's validity window: only
//! current ATTENDING commitments whose `effective_from` lies inside the
//! window count against the plan limit. Switching plans implicitly resets
//! the count because the new assignment brings its own window.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::{CommitmentStatus, SeriesId, StudentId};
use crate::db::repository::{CommitmentRepository, FullRepository};
use crate::directory::PlanProvider;
use crate::models::{commitment::current_as_of, CommitmentRecord, PlanAssignment};

use super::error::{SchedulingError, SchedulingResult};

/// Validates commitment writes against the student's active plan limit.
pub struct QuotaEnforcer {
    repository: Arc<dyn FullRepository>,
    plans: Arc<dyn PlanProvider>,
}

impl QuotaEnforcer {
    pub fn new(repository: Arc<dyn FullRepository>, plans: Arc<dyn PlanProvider>) -> Self {
        Self { repository, plans }
    }

    /// Validate that one more ATTENDING commitment fits the active plan at
    /// `at`.
    ///
    /// # Returns
    /// * `Err(SchedulingError::PreconditionFailed)` when no assignment is
    ///   active at `at`
    /// * `Err(SchedulingError::QuotaExceeded)` when the window's current
    ///   count has reached the plan limit
    pub async fn validate(&self, student_id: StudentId, at: DateTime<Utc>) -> SchedulingResult<()> {
        self.validate_batch(student_id, at, 1).await
    }

    /// Validate that `additional` more ATTENDING commitments fit the active
    /// plan at `at`. All-or-nothing: the whole batch must fit.
    pub async fn validate_batch(
        &self,
        student_id: StudentId,
        at: DateTime<Utc>,
        additional: usize,
    ) -> SchedulingResult<()> {
        let assignment = self
            .plans
            .active_assignment(student_id, at)
            .await
            .ok_or_else(|| {
                SchedulingError::PreconditionFailed(format!(
                    "no active plan for student {} at {}",
                    student_id, at
                ))
            })?;

        let count = self.attending_count(student_id, &assignment, at).await?;
        let limit = assignment.max_days_allowed;
        if count + additional > limit as usize {
            warn!(
                student = %student_id,
                %limit,
                %count,
                %additional,
                "commitment rejected: plan quota exhausted"
            );
            return Err(SchedulingError::QuotaExceeded { limit, count });
        }
        Ok(())
    }

    /// Current ATTENDING commitments for the student whose `effective_from`
    /// falls inside the assignment window, evaluated as of `at`.
    async fn attending_count(
        &self,
        student_id: StudentId,
        assignment: &PlanAssignment,
        at: DateTime<Utc>,
    ) -> SchedulingResult<usize> {
        let records = self.repository.commitments_for_student(student_id).await?;

        let mut chains: HashMap<SeriesId, Vec<&CommitmentRecord>> = HashMap::new();
        for record in &records {
            chains.entry(record.series_id).or_default().push(record);
        }

        let count = chains
            .values()
            .filter_map(|chain| current_as_of(chain.iter().copied(), at))
            .filter(|r| {
                r.status == CommitmentStatus::Attending && assignment.contains(r.effective_from)
            })
            .count();
        Ok(count)
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod quota_tests;
