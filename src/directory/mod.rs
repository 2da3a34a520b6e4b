//! External collaborators consumed by the engine.
//!
//! Trainer and student records, plans, and plan assignments are owned by
//! other components of the studio system. The engine consumes them through
//! the traits in this module; the bundled in-memory implementations serve
//! tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::{PlanId, StudentId, TrainerId};
use crate::models::PlanAssignment;

/// Display-only trainer reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerRef {
    pub trainer_id: TrainerId,
    pub name: String,
}

/// Display-only student reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRef {
    pub student_id: StudentId,
    pub name: String,
}

/// Resolves trainer references for display. Resolution failures are not
/// errors; unknown ids simply stay unresolved.
#[async_trait]
pub trait TrainerDirectory: Send + Sync {
    async fn resolve_trainer(&self, trainer_id: TrainerId) -> Option<TrainerRef>;
}

/// Resolves student references for display.
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn resolve_student(&self, student_id: StudentId) -> Option<StudentRef>;
}

/// Read-only access to plans and plan assignments.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    /// The assignment whose window contains `at`, if any. Window containment
    /// is closed on both ends.
    async fn active_assignment(
        &self,
        student_id: StudentId,
        at: DateTime<Utc>,
    ) -> Option<PlanAssignment>;

    /// Maximum ATTENDING commitments the plan permits within an assignment
    /// window.
    async fn plan_limit(&self, plan_id: PlanId) -> Option<u32>;
}

// ==================== In-memory implementations ====================

/// In-memory trainer/student directory for tests and local development.
#[derive(Default)]
pub struct InMemoryDirectory {
    trainers: RwLock<HashMap<TrainerId, String>>,
    students: RwLock<HashMap<StudentId, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trainer(&self, trainer_id: TrainerId, name: impl Into<String>) {
        self.trainers.write().insert(trainer_id, name.into());
    }

    pub fn add_student(&self, student_id: StudentId, name: impl Into<String>) {
        self.students.write().insert(student_id, name.into());
    }
}

#[async_trait]
impl TrainerDirectory for InMemoryDirectory {
    async fn resolve_trainer(&self, trainer_id: TrainerId) -> Option<TrainerRef> {
        self.trainers
            .read()
            .get(&trainer_id)
            .map(|name| TrainerRef {
                trainer_id,
                name: name.clone(),
            })
    }
}

#[async_trait]
impl StudentDirectory for InMemoryDirectory {
    async fn resolve_student(&self, student_id: StudentId) -> Option<StudentRef> {
        self.students
            .read()
            .get(&student_id)
            .map(|name| StudentRef {
                student_id,
                name: name.clone(),
            })
    }
}

struct StoredAssignment {
    student_id: StudentId,
    plan_id: PlanId,
    effective_from: DateTime<Utc>,
    effective_to: Option<DateTime<Utc>>,
}

/// In-memory plan/assignment store for tests and local development.
#[derive(Default)]
pub struct InMemoryPlanProvider {
    plans: RwLock<HashMap<PlanId, u32>>,
    assignments: RwLock<Vec<StoredAssignment>>,
}

impl InMemoryPlanProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a plan and its commitment limit.
    pub fn define_plan(&self, plan_id: PlanId, max_days_allowed: u32) {
        self.plans.write().insert(plan_id, max_days_allowed);
    }

    /// Assign a plan to a student for a window (`None` = open-ended).
    pub fn assign(
        &self,
        student_id: StudentId,
        plan_id: PlanId,
        effective_from: DateTime<Utc>,
        effective_to: Option<DateTime<Utc>>,
    ) {
        self.assignments.write().push(StoredAssignment {
            student_id,
            plan_id,
            effective_from,
            effective_to,
        });
    }
}

#[async_trait]
impl PlanProvider for InMemoryPlanProvider {
    async fn active_assignment(
        &self,
        student_id: StudentId,
        at: DateTime<Utc>,
    ) -> Option<PlanAssignment> {
        let plans = self.plans.read();
        let assignments = self.assignments.read();
        assignments
            .iter()
            .filter(|a| a.student_id == student_id)
            .filter(|a| {
                at >= a.effective_from && a.effective_to.map_or(true, |to| at <= to)
            })
            .max_by_key(|a| a.effective_from)
            .and_then(|a| {
                let max_days_allowed = *plans.get(&a.plan_id)?;
                Some(PlanAssignment {
                    student_id: a.student_id,
                    plan_id: a.plan_id,
                    effective_from: a.effective_from,
                    effective_to: a.effective_to,
                    max_days_allowed,
                })
            })
    }

    async fn plan_limit(&self, plan_id: PlanId) -> Option<u32> {
        self.plans.read().get(&plan_id).copied()
    }
}
