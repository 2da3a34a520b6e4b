//! Shared identifiers, enums, and externally visible projections.
//!
//! Everything in this module crosses the engine boundary: identifiers are
//! stable newtypes, enums carry their wire spelling, and
//! [`SessionOccurrence`] is the projection handed to callers of the
//! materializer. Nothing here owns temporal logic; that lives in
//! [`crate::models`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==================== Identifiers ====================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Raw UUID value.
            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(v: Uuid) -> Self {
                Self(v)
            }
        }
    };
}

uuid_id!(
    /// Stable identity of a recurrence lineage, shared by all of its versions.
    SeriesId
);
uuid_id!(
    /// Trainer reference, resolved by an external directory.
    TrainerId
);
uuid_id!(
    /// Student reference, resolved by an external directory.
    StudentId
);
uuid_id!(
    /// Subscription plan reference.
    PlanId
);
uuid_id!(
    /// Identity of a single commitment ledger record.
    RecordId
);

/// Deterministic identifier of one concrete occurrence of a series.
///
/// Derived from the series name, calendar date, and start time so that
/// re-materializing the same day yields the same key and persisted overrides
/// stay attached. The format is externally visible and must remain stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccurrenceId(pub String);

impl OccurrenceId {
    /// Derive the occurrence key for `series_name` on `date` at `start_time`.
    ///
    /// The key is `<slug>_<YYYY-MM-DD>_<HHMM>` where `<slug>` is the series
    /// name lower-cased with whitespace and underscores collapsed to `-`.
    pub fn derive(series_name: &str, date: NaiveDate, start_time: NaiveTime) -> Self {
        let mut slug = String::with_capacity(series_name.len());
        let mut pending_dash = false;
        for c in series_name.trim().chars() {
            if c.is_whitespace() || c == '_' || c == '-' {
                pending_dash = !slug.is_empty();
            } else {
                if pending_dash {
                    slug.push('-');
                    pending_dash = false;
                }
                for lc in c.to_lowercase() {
                    slug.push(lc);
                }
            }
        }
        Self(format!(
            "{}_{}_{}",
            slug,
            date.format("%Y-%m-%d"),
            start_time.format("%H%M")
        ))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OccurrenceId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

// ==================== Enums ====================

/// A student's declared attendance intent for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitmentStatus {
    Attending,
    NotAttending,
    Tentative,
}

impl CommitmentStatus {
    /// Business-rule default when no ledger entry exists for a pair.
    pub const DEFAULT: CommitmentStatus = CommitmentStatus::NotAttending;
}

impl fmt::Display for CommitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommitmentStatus::Attending => "ATTENDING",
            CommitmentStatus::NotAttending => "NOT_ATTENDING",
            CommitmentStatus::Tentative => "TENTATIVE",
        };
        f.write_str(s)
    }
}

/// Direction of a per-occurrence roster diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationType {
    /// Add the student to this one occurrence.
    Included,
    /// Suppress a student a standing commitment would otherwise imply.
    Excluded,
}

// ==================== Weekday wire form ====================

/// Weekday index per the external contract: 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

/// Parse a 0=Sunday..6=Saturday index into a weekday.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

// ==================== Occurrence projection ====================

/// One roster-diff entry attached to an occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantOverride {
    pub student_id: StudentId,
    pub participation: ParticipationType,
    pub is_present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_notes: Option<String>,
}

/// Persisted per-occurrence state: free-text notes plus the roster diff.
///
/// Absence of an override is the normal case, so the default value (no notes,
/// empty roster) doubles as the "no override" answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub participants: Vec<ParticipantOverride>,
}

impl OccurrenceOverride {
    /// True when this value carries any explicit override content.
    pub fn is_populated(&self) -> bool {
        self.notes.is_some() || !self.participants.is_empty()
    }
}

/// One concrete calendar-date instance of a series.
///
/// Always recomputed from the effective recurrence version plus the override
/// store; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOccurrence {
    pub occurrence_id: OccurrenceId,
    pub series_id: SeriesId,
    pub trainer_id: TrainerId,
    pub series_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub participants: Vec<ParticipantOverride>,
    pub has_override: bool,
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
