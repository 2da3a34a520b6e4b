use super::*;
use crate::api::PlanId;
use crate::db::repositories::LocalRepository;
use crate::db::repository::CommitmentRepository;
use crate::directory::InMemoryPlanProvider;
use chrono::TimeZone;

fn ts(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()
}

struct Fixture {
    repo: Arc<LocalRepository>,
    plans: Arc<InMemoryPlanProvider>,
    enforcer: QuotaEnforcer,
    student: StudentId,
}

fn fixture() -> Fixture {
    let repo = Arc::new(LocalRepository::new());
    let plans = Arc::new(InMemoryPlanProvider::new());
    let enforcer = QuotaEnforcer::new(repo.clone(), plans.clone());
    Fixture {
        repo,
        plans,
        enforcer,
        student: StudentId::generate(),
    }
}

async fn attend(f: &Fixture, effective_from: DateTime<Utc>) {
    let record = CommitmentRecord::new(
        f.student,
        SeriesId::generate(),
        CommitmentStatus::Attending,
        effective_from,
    );
    f.repo.append_commitment(&record).await.unwrap();
}

#[tokio::test]
async fn rejects_without_active_plan() {
    let f = fixture();
    let result = f.enforcer.validate(f.student, ts(10)).await;
    assert!(matches!(
        result,
        Err(SchedulingError::PreconditionFailed(msg)) if msg.contains("no active plan")
    ));
}

#[tokio::test]
async fn accepts_below_limit_and_rejects_at_limit() {
    let f = fixture();
    let plan = PlanId::generate();
    f.plans.define_plan(plan, 3);
    f.plans.assign(f.student, plan, ts(1), Some(ts(28)));

    attend(&f, ts(2)).await;
    attend(&f, ts(3)).await;
    assert!(f.enforcer.validate(f.student, ts(10)).await.is_ok());

    attend(&f, ts(4)).await;
    let result = f.enforcer.validate(f.student, ts(10)).await;
    match result {
        Err(SchedulingError::QuotaExceeded { limit, count }) => {
            assert_eq!(limit, 3);
            assert_eq!(count, 3);
        }
        other => panic!("expected quota rejection, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn batch_must_fit_entirely() {
    let f = fixture();
    let plan = PlanId::generate();
    f.plans.define_plan(plan, 2);
    f.plans.assign(f.student, plan, ts(1), Some(ts(28)));

    assert!(f.enforcer.validate_batch(f.student, ts(10), 2).await.is_ok());
    assert!(matches!(
        f.enforcer.validate_batch(f.student, ts(10), 3).await,
        Err(SchedulingError::QuotaExceeded { limit: 2, count: 0 })
    ));
}

#[tokio::test]
async fn commitments_outside_window_do_not_count() {
    let f = fixture();
    let plan = PlanId::generate();
    f.plans.define_plan(plan, 1);
    f.plans.assign(f.student, plan, ts(10), Some(ts(20)));

    // Effective before the assignment window opened.
    attend(&f, ts(2)).await;

    assert!(f.enforcer.validate(f.student, ts(15)).await.is_ok());
}

#[tokio::test]
async fn instant_on_window_end_is_still_active() {
    let f = fixture();
    let plan = PlanId::generate();
    f.plans.define_plan(plan, 5);
    f.plans.assign(f.student, plan, ts(1), Some(ts(20)));

    assert!(f.enforcer.validate(f.student, ts(20)).await.is_ok());
    assert!(matches!(
        f.enforcer.validate(f.student, ts(21)).await,
        Err(SchedulingError::PreconditionFailed(_))
    ));
}

#[tokio::test]
async fn superseded_records_do_not_count() {
    let f = fixture();
    let plan = PlanId::generate();
    f.plans.define_plan(plan, 1);
    f.plans.assign(f.student, plan, ts(1), Some(ts(28)));

    // One series went Attending then NotAttending; only the current status
    // matters.
    let series = SeriesId::generate();
    let first = CommitmentRecord::new(f.student, series, CommitmentStatus::Attending, ts(2));
    let second = CommitmentRecord::new(f.student, series, CommitmentStatus::NotAttending, ts(5));
    f.repo.append_commitment(&first).await.unwrap();
    f.repo.append_commitment(&second).await.unwrap();

    assert!(f.enforcer.validate(f.student, ts(10)).await.is_ok());
}

#[tokio::test]
async fn switching_plans_resets_the_window() {
    let f = fixture();
    let old_plan = PlanId::generate();
    let new_plan = PlanId::generate();
    f.plans.define_plan(old_plan, 1);
    f.plans.define_plan(new_plan, 1);
    f.plans.assign(f.student, old_plan, ts(1), Some(ts(14)));
    f.plans.assign(f.student, new_plan, ts(15), Some(ts(28)));

    // Saturated the old window.
    attend(&f, ts(2)).await;
    assert!(matches!(
        f.enforcer.validate(f.student, ts(10)).await,
        Err(SchedulingError::QuotaExceeded { .. })
    ));

    // The new window starts empty even though the old commitment is still
    // current: its effective_from lies outside the new assignment's window.
    assert!(f.enforcer.validate(f.student, ts(20)).await.is_ok());
}
