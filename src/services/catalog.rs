//! Series administration: the write surface of recurrence lineages.
//!
//! Creation starts a new lineage, revisions append version rows, deletion is
//! soft. The (trainer, weekday) uniqueness invariant is enforced here at the
//! write boundary so reads can assume at most one effective version per slot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{weekday_index, SeriesId, TrainerId};
use crate::db::repository::{FullRepository, RecurrenceRepository};
use crate::models::recurrence::weekday_wire;
use crate::models::{effective_version, RecurrenceSeries};

use super::error::{SchedulingError, SchedulingResult};

/// The administrator-supplied shape of a series version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDefinition {
    pub trainer_id: TrainerId,
    #[serde(with = "weekday_wire")]
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interval_minutes: u32,
    pub series_name: String,
}

/// Write operations on recurrence lineages.
pub struct SeriesCatalog {
    repository: Arc<dyn FullRepository>,
}

impl SeriesCatalog {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    /// Start a new lineage effective from `effective_from`.
    ///
    /// # Returns
    /// * `Err(SchedulingError::Validation)` for a malformed definition
    /// * `Err(SchedulingError::PreconditionFailed)` when another lineage
    ///   already holds the (trainer, weekday) slot at that instant
    pub async fn create_series(
        &self,
        definition: SeriesDefinition,
        effective_from: DateTime<Utc>,
    ) -> SchedulingResult<RecurrenceSeries> {
        Self::validate_definition(&definition)?;
        self.ensure_slot_free(None, &definition, effective_from).await?;

        let version = RecurrenceSeries {
            series_id: SeriesId::generate(),
            trainer_id: definition.trainer_id,
            weekday: definition.weekday,
            start_time: definition.start_time,
            end_time: definition.end_time,
            interval_minutes: definition.interval_minutes,
            series_name: definition.series_name,
            effective_from,
            is_deleted: false,
            deleted_at: None,
        };
        self.repository.insert_series_version(&version).await?;
        info!(
            series = %version.series_id,
            name = %version.series_name,
            effective_from = %effective_from,
            "series created"
        );
        Ok(version)
    }

    /// Append a version row to an existing lineage. History before
    /// `effective_from` is untouched; occurrences from it forward follow the
    /// new definition.
    pub async fn revise_series(
        &self,
        series_id: SeriesId,
        definition: SeriesDefinition,
        effective_from: DateTime<Utc>,
    ) -> SchedulingResult<RecurrenceSeries> {
        Self::validate_definition(&definition)?;
        // Lineage must exist; a missing one surfaces as NotFound here.
        self.repository.series_versions(series_id).await?;
        self.ensure_slot_free(Some(series_id), &definition, effective_from)
            .await?;

        let version = RecurrenceSeries {
            series_id,
            trainer_id: definition.trainer_id,
            weekday: definition.weekday,
            start_time: definition.start_time,
            end_time: definition.end_time,
            interval_minutes: definition.interval_minutes,
            series_name: definition.series_name,
            effective_from,
            is_deleted: false,
            deleted_at: None,
        };
        self.repository.insert_series_version(&version).await?;
        info!(series = %series_id, effective_from = %effective_from, "series revised");
        Ok(version)
    }

    /// Soft-delete a lineage: it stops producing occurrences from `at`
    /// forward. Already-deleted lineages are left as they are.
    pub async fn delete_series(&self, series_id: SeriesId, at: DateTime<Utc>) -> SchedulingResult<()> {
        let flagged = self.repository.mark_series_deleted(series_id, at).await?;
        if flagged > 0 {
            info!(series = %series_id, at = %at, "series deleted");
        }
        Ok(())
    }

    /// Current catalogue: the latest non-deleted version of each lineage,
    /// sorted by series name.
    pub async fn list_series(&self) -> SchedulingResult<Vec<RecurrenceSeries>> {
        let versions = self.repository.all_series_versions().await?;
        let mut lineages: HashMap<SeriesId, Vec<&RecurrenceSeries>> = HashMap::new();
        for version in &versions {
            lineages.entry(version.series_id).or_default().push(version);
        }

        let mut current: Vec<RecurrenceSeries> = lineages
            .values()
            .filter_map(|lineage| {
                lineage
                    .iter()
                    .filter(|v| !v.is_deleted)
                    .max_by_key(|v| v.effective_from)
                    .map(|v| (*v).clone())
            })
            .collect();
        current.sort_by(|a, b| {
            (&a.series_name, a.start_time).cmp(&(&b.series_name, b.start_time))
        });
        Ok(current)
    }

    fn validate_definition(definition: &SeriesDefinition) -> SchedulingResult<()> {
        if definition.series_name.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "series name must not be empty".to_string(),
            ));
        }
        if definition.end_time <= definition.start_time {
            return Err(SchedulingError::Validation(
                "series end time must be after its start time".to_string(),
            ));
        }
        if definition.interval_minutes == 0 {
            return Err(SchedulingError::Validation(
                "series interval must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject a definition whose (trainer, weekday) slot is already held by
    /// a different lineage effective at `effective_from`.
    async fn ensure_slot_free(
        &self,
        exclude: Option<SeriesId>,
        definition: &SeriesDefinition,
        effective_from: DateTime<Utc>,
    ) -> SchedulingResult<()> {
        let versions = self.repository.all_series_versions().await?;
        let mut lineages: HashMap<SeriesId, Vec<&RecurrenceSeries>> = HashMap::new();
        for version in &versions {
            lineages.entry(version.series_id).or_default().push(version);
        }

        for (series_id, lineage) in &lineages {
            if Some(*series_id) == exclude {
                continue;
            }
            if let Some(effective) = effective_version(lineage.iter().copied(), effective_from) {
                if effective.trainer_id == definition.trainer_id
                    && effective.weekday == definition.weekday
                {
                    return Err(SchedulingError::PreconditionFailed(format!(
                        "trainer {} already has series \"{}\" on weekday {} at {}",
                        definition.trainer_id,
                        effective.series_name,
                        weekday_index(definition.weekday),
                        effective_from
                    )));
                }
            }
        }
        Ok(())
    }
}
