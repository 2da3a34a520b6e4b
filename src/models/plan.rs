//! Plan assignments, consumed read-only from the plan-management component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{PlanId, StudentId};

/// A student's subscription-plan assignment with its validity window.
///
/// At most one assignment is active for a student at any instant; overlap is
/// a precondition violation owned by the assignment-management component, not
/// something this engine repairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAssignment {
    pub student_id: StudentId,
    pub plan_id: PlanId,
    pub effective_from: DateTime<Utc>,
    /// `None` means the assignment is open-ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<DateTime<Utc>>,
    /// Maximum number of ATTENDING commitments the referenced plan permits
    /// within this window.
    pub max_days_allowed: u32,
}

impl PlanAssignment {
    /// Closed-interval containment: an instant exactly on `effective_to` is
    /// still inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if instant < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(effective_to) => instant <= effective_to,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, d, 12, 0, 0).unwrap()
    }

    fn assignment(from: u32, to: Option<u32>) -> PlanAssignment {
        PlanAssignment {
            student_id: StudentId::generate(),
            plan_id: PlanId::generate(),
            effective_from: ts(from),
            effective_to: to.map(ts),
            max_days_allowed: 3,
        }
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        let a = assignment(5, Some(20));
        assert!(!a.contains(ts(4)));
        assert!(a.contains(ts(5)));
        assert!(a.contains(ts(12)));
        assert!(a.contains(ts(20)));
        assert!(!a.contains(ts(21)));
    }

    #[test]
    fn open_ended_window_has_no_upper_bound() {
        let a = assignment(5, None);
        assert!(a.contains(ts(5)));
        assert!(a.contains(ts(31)));
        assert!(!a.contains(ts(1)));
    }
}
