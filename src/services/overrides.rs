//! Per-occurrence override editing.
//!
//! Overrides are snapshots, not event-sourced: replacing the participant
//! list for an occurrence discards the previous list entirely
//! (last-write-wins at occurrence granularity), and notes are a single
//! mutable field. Overrides never auto-expire.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::api::{OccurrenceId, OccurrenceOverride, ParticipantOverride};
use crate::db::repository::{FullRepository, OverrideRepository};

use super::error::{SchedulingError, SchedulingResult};

/// Editing surface for per-occurrence notes and roster diffs.
pub struct OverrideStore {
    repository: Arc<dyn FullRepository>,
}

impl OverrideStore {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    /// Set or clear the free-text notes of an occurrence. Blank text clears.
    pub async fn set_notes(
        &self,
        occurrence_id: &OccurrenceId,
        notes: Option<String>,
    ) -> SchedulingResult<()> {
        Self::validate_key(occurrence_id)?;
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.repository
            .set_occurrence_notes(occurrence_id, notes)
            .await?;
        Ok(())
    }

    /// Replace the full roster diff of an occurrence.
    pub async fn set_participants(
        &self,
        occurrence_id: &OccurrenceId,
        participants: Vec<ParticipantOverride>,
    ) -> SchedulingResult<()> {
        Self::validate_key(occurrence_id)?;
        let mut seen = HashSet::new();
        for entry in &participants {
            if !seen.insert(entry.student_id) {
                return Err(SchedulingError::Validation(format!(
                    "student {} appears more than once in the override list",
                    entry.student_id
                )));
            }
        }

        let count = participants.len();
        self.repository
            .replace_occurrence_participants(occurrence_id, participants)
            .await?;
        info!(occurrence = %occurrence_id, %count, "occurrence roster replaced");
        Ok(())
    }

    /// Notes and roster diff for an occurrence; absence yields the empty
    /// default.
    pub async fn get(&self, occurrence_id: &OccurrenceId) -> SchedulingResult<OccurrenceOverride> {
        Self::validate_key(occurrence_id)?;
        Ok(self.repository.fetch_override(occurrence_id).await?)
    }

    fn validate_key(occurrence_id: &OccurrenceId) -> SchedulingResult<()> {
        if occurrence_id.as_str().trim().is_empty() {
            return Err(SchedulingError::Validation(
                "occurrence id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
