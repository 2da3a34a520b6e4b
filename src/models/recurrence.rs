//! Versioned weekly recurrence definitions.
//!
//! A recurrence lineage is the logical identity of a weekly slot ("Yoga,
//! Mondays with trainer X"). Each administrator edit inserts a new version
//! row sharing the lineage's [`SeriesId`] with a fresh `effective_from`;
//! nothing is rewritten in place. The version that governs a given instant is
//! the one with the greatest `effective_from` at or before that instant among
//! versions still selectable there.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::api::{SeriesId, TrainerId};

/// One version row of a weekly recurrence lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceSeries {
    /// Stable lineage identity shared by every version of this series.
    pub series_id: SeriesId,
    pub trainer_id: TrainerId,
    /// Weekday this series occurs on (0 = Sunday .. 6 = Saturday on the wire).
    #[serde(with = "weekday_wire")]
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interval_minutes: u32,
    pub series_name: String,
    /// Instant from which this version is the authoritative definition.
    pub effective_from: DateTime<Utc>,
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecurrenceSeries {
    /// Whether this version may be selected for `instant`.
    ///
    /// A soft-deleted version stops producing occurrences from `deleted_at`
    /// forward but remains selectable strictly before it, so history already
    /// materialized under this version is preserved.
    pub fn selectable_at(&self, instant: DateTime<Utc>) -> bool {
        if !self.is_deleted {
            return true;
        }
        match self.deleted_at {
            Some(deleted_at) => instant < deleted_at,
            None => false,
        }
    }
}

/// Select the version of a lineage effective at `instant`.
///
/// Returns the version with the greatest `effective_from` at or before
/// `instant` among versions selectable there, or `None` when the lineage has
/// no governing version at that instant.
pub fn effective_version<'a, I>(versions: I, instant: DateTime<Utc>) -> Option<&'a RecurrenceSeries>
where
    I: IntoIterator<Item = &'a RecurrenceSeries>,
{
    versions
        .into_iter()
        .filter(|v| v.effective_from <= instant && v.selectable_at(instant))
        .max_by_key(|v| v.effective_from)
}

/// Wire form for weekdays: 0 = Sunday .. 6 = Saturday.
pub mod weekday_wire {
    use chrono::Weekday;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::api::{weekday_from_index, weekday_index};

    pub fn serialize<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(weekday_index(*weekday))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let index = u8::deserialize(deserializer)?;
        weekday_from_index(index)
            .ok_or_else(|| de::Error::custom(format!("weekday index out of range: {index}")))
    }
}
