//! On-demand expansion of recurrence definitions into session occurrences.
//!
//! Occurrences are never persisted: every call recomputes them from the
//! recurrence version effective on each day joined with the override store,
//! so there is no invalidation path to get wrong. The occurrence key is
//! deterministic, which keeps persisted overrides attached across
//! re-materialization.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::debug;

use crate::api::{OccurrenceId, SeriesId, SessionOccurrence, TrainerId};
use crate::db::repository::{FullRepository, OverrideRepository, RecurrenceRepository};
use crate::models::{effective_version, RecurrenceSeries};

use super::error::SchedulingResult;

/// Expands date ranges into concrete, override-merged session occurrences.
pub struct ScheduleMaterializer {
    repository: Arc<dyn FullRepository>,
}

impl ScheduleMaterializer {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    /// All occurrences in `[start_date, end_date]` inclusive, ordered by
    /// start ascending.
    ///
    /// An inverted range yields an empty list, not an error.
    pub async fn get_occurrences(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> SchedulingResult<Vec<SessionOccurrence>> {
        self.materialize(start_date, end_date, None).await
    }

    /// The same projection restricted to one trainer's series.
    pub async fn get_occurrences_for_trainer(
        &self,
        trainer_id: TrainerId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> SchedulingResult<Vec<SessionOccurrence>> {
        self.materialize(start_date, end_date, Some(trainer_id)).await
    }

    async fn materialize(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        trainer: Option<TrainerId>,
    ) -> SchedulingResult<Vec<SessionOccurrence>> {
        if end_date < start_date {
            return Ok(Vec::new());
        }

        let versions = self.repository.all_series_versions().await?;
        let mut lineages: HashMap<SeriesId, Vec<&RecurrenceSeries>> = HashMap::new();
        for version in &versions {
            lineages.entry(version.series_id).or_default().push(version);
        }

        let mut occurrences = Vec::new();
        let mut day = start_date;
        loop {
            // The recurrence version governing a day is the one effective at
            // that day's start (00:00 UTC).
            let reference = day.and_time(NaiveTime::MIN).and_utc();
            for lineage in lineages.values() {
                let Some(version) = effective_version(lineage.iter().copied(), reference) else {
                    continue;
                };
                if version.weekday != day.weekday() {
                    continue;
                }
                if let Some(trainer_id) = trainer {
                    if version.trainer_id != trainer_id {
                        continue;
                    }
                }
                occurrences.push(self.project(version, day).await?);
            }

            if day >= end_date {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        occurrences.sort_by(|a, b| {
            (a.start, &a.occurrence_id).cmp(&(b.start, &b.occurrence_id))
        });
        debug!(
            from = %start_date,
            to = %end_date,
            count = %occurrences.len(),
            "materialized occurrences"
        );
        Ok(occurrences)
    }

    /// Project one version onto one calendar date and merge its override.
    async fn project(
        &self,
        version: &RecurrenceSeries,
        date: NaiveDate,
    ) -> SchedulingResult<SessionOccurrence> {
        let occurrence_id = OccurrenceId::derive(&version.series_name, date, version.start_time);
        let merged = self.repository.fetch_override(&occurrence_id).await?;
        let has_override = merged.is_populated();

        Ok(SessionOccurrence {
            occurrence_id,
            series_id: version.series_id,
            trainer_id: version.trainer_id,
            series_name: version.series_name.clone(),
            start: date.and_time(version.start_time).and_utc(),
            end: date.and_time(version.end_time).and_utc(),
            notes: merged.notes,
            participants: merged.participants,
            has_override,
        })
    }
}

#[cfg(test)]
#[path = "materializer_tests.rs"]
mod materializer_tests;
