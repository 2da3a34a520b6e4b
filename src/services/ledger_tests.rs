use super::*;
use crate::api::PlanId;
use crate::db::repositories::LocalRepository;
use crate::directory::InMemoryPlanProvider;
use chrono::TimeZone;

fn ts(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, d, h, 0, 0).unwrap()
}

struct Fixture {
    repo: Arc<LocalRepository>,
    plans: Arc<InMemoryPlanProvider>,
    ledger: CommitmentLedger,
    student: StudentId,
}

/// Ledger over a fresh repository with one plan (limit `max_days`) assigned
/// for all of September.
fn fixture(max_days: u32) -> Fixture {
    let repo = Arc::new(LocalRepository::new());
    let plans = Arc::new(InMemoryPlanProvider::new());
    let plan = PlanId::generate();
    let student = StudentId::generate();
    plans.define_plan(plan, max_days);
    plans.assign(student, plan, ts(1, 0), Some(ts(30, 23)));

    let ledger = CommitmentLedger::new(repo.clone(), plans.clone());
    Fixture {
        repo,
        plans,
        ledger,
        student,
    }
}

#[tokio::test]
async fn status_defaults_to_not_attending() {
    let f = fixture(3);
    let status = f
        .ledger
        .get_status_at(f.student, SeriesId::generate(), ts(10, 0))
        .await
        .unwrap();
    assert_eq!(status, CommitmentStatus::NotAttending);
}

#[tokio::test]
async fn update_appends_and_is_visible_from_effective_from() {
    let f = fixture(3);
    let series = SeriesId::generate();

    let record = f
        .ledger
        .update(f.student, series, CommitmentStatus::Attending, ts(5, 9))
        .await
        .unwrap();
    assert_eq!(record.status, CommitmentStatus::Attending);
    assert_eq!(record.effective_to, None);

    assert_eq!(
        f.ledger.get_status_at(f.student, series, ts(4, 0)).await.unwrap(),
        CommitmentStatus::NotAttending
    );
    assert_eq!(
        f.ledger.get_status_at(f.student, series, ts(5, 9)).await.unwrap(),
        CommitmentStatus::Attending
    );
}

#[tokio::test]
async fn fourth_attending_is_rejected_and_nothing_is_written() {
    let f = fixture(3);
    for _ in 0..3 {
        f.ledger
            .update(
                f.student,
                SeriesId::generate(),
                CommitmentStatus::Attending,
                ts(2, 8),
            )
            .await
            .unwrap();
    }
    assert_eq!(f.repo.commitment_count(), 3);

    let result = f
        .ledger
        .update(
            f.student,
            SeriesId::generate(),
            CommitmentStatus::Attending,
            ts(2, 9),
        )
        .await;
    match result {
        Err(SchedulingError::QuotaExceeded { limit, count }) => {
            assert_eq!(limit, 3);
            assert_eq!(count, 3);
        }
        other => panic!("expected quota rejection, got {:?}", other.map(|_| ())),
    }
    assert_eq!(f.repo.commitment_count(), 3);
}

#[tokio::test]
async fn non_attending_updates_skip_quota() {
    let f = fixture(0);
    let record = f
        .ledger
        .update(
            f.student,
            SeriesId::generate(),
            CommitmentStatus::Tentative,
            ts(3, 0),
        )
        .await
        .unwrap();
    assert_eq!(record.status, CommitmentStatus::Tentative);
}

#[tokio::test]
async fn bulk_update_is_all_or_nothing() {
    let f = fixture(2);
    let series: Vec<SeriesId> = (0..3).map(|_| SeriesId::generate()).collect();

    let result = f
        .ledger
        .bulk_update(f.student, &series, CommitmentStatus::Attending, ts(2, 8))
        .await;
    assert!(matches!(
        result,
        Err(SchedulingError::QuotaExceeded { limit: 2, count: 0 })
    ));
    // Not two-accepted-one-rejected: zero records.
    assert_eq!(f.repo.commitment_count(), 0);

    let records = f
        .ledger
        .bulk_update(f.student, &series[..2], CommitmentStatus::Attending, ts(2, 8))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(f.repo.commitment_count(), 2);
}

#[tokio::test]
async fn bulk_update_rejects_empty_and_duplicate_batches() {
    let f = fixture(5);
    let result = f
        .ledger
        .bulk_update(f.student, &[], CommitmentStatus::Attending, ts(2, 8))
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));

    let series = SeriesId::generate();
    let result = f
        .ledger
        .bulk_update(
            f.student,
            &[series, series],
            CommitmentStatus::Attending,
            ts(2, 8),
        )
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));
    assert_eq!(f.repo.commitment_count(), 0);
}

#[tokio::test]
async fn duplicate_effective_from_for_pair_is_rejected() {
    let f = fixture(5);
    let series = SeriesId::generate();
    f.ledger
        .update(f.student, series, CommitmentStatus::Attending, ts(5, 9))
        .await
        .unwrap();

    let result = f
        .ledger
        .update(f.student, series, CommitmentStatus::Tentative, ts(5, 9))
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));
}

#[tokio::test]
async fn split_bounds_original_and_switches_status_at_boundary() {
    let f = fixture(3);
    let series = SeriesId::generate();
    let original = f
        .ledger
        .update(f.student, series, CommitmentStatus::Attending, ts(1, 9))
        .await
        .unwrap();

    let successor = f
        .ledger
        .split(original.id, ts(15, 9), CommitmentStatus::NotAttending)
        .await
        .unwrap();
    assert_eq!(successor.effective_from, ts(15, 9));
    assert_eq!(successor.status, CommitmentStatus::NotAttending);

    let stored_original = f.repo.commitment(original.id).await.unwrap();
    assert_eq!(stored_original.effective_to, Some(ts(15, 9)));
    assert_eq!(stored_original.status, CommitmentStatus::Attending);

    // Just before the split point the old status governs; at it, the new one.
    assert_eq!(
        f.ledger.get_status_at(f.student, series, ts(15, 8)).await.unwrap(),
        CommitmentStatus::Attending
    );
    assert_eq!(
        f.ledger.get_status_at(f.student, series, ts(15, 9)).await.unwrap(),
        CommitmentStatus::NotAttending
    );
}

#[tokio::test]
async fn split_rejects_bad_split_points() {
    let f = fixture(3);
    let series = SeriesId::generate();
    let original = f
        .ledger
        .update(f.student, series, CommitmentStatus::Attending, ts(10, 9))
        .await
        .unwrap();

    let result = f
        .ledger
        .split(original.id, ts(10, 9), CommitmentStatus::NotAttending)
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));

    let result = f
        .ledger
        .split(original.id, ts(5, 9), CommitmentStatus::NotAttending)
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));

    // A successful split, then a second split of the same record.
    f.ledger
        .split(original.id, ts(20, 9), CommitmentStatus::Tentative)
        .await
        .unwrap();
    let result = f
        .ledger
        .split(original.id, ts(25, 9), CommitmentStatus::NotAttending)
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));
}

#[tokio::test]
async fn split_of_unknown_record_is_not_found() {
    let f = fixture(3);
    let result = f
        .ledger
        .split(RecordId::generate(), ts(5, 0), CommitmentStatus::Tentative)
        .await;
    assert!(result.err().map(|e| e.is_not_found()).unwrap_or(false));
}

#[tokio::test]
async fn split_to_attending_counts_against_quota() {
    let f = fixture(1);
    let series = SeriesId::generate();
    let original = f
        .ledger
        .update(f.student, series, CommitmentStatus::Attending, ts(1, 9))
        .await
        .unwrap();

    // The only slot is taken by another series.
    let other = SeriesId::generate();
    let paused = f
        .ledger
        .split(original.id, ts(5, 9), CommitmentStatus::NotAttending)
        .await
        .unwrap();
    f.ledger
        .update(f.student, other, CommitmentStatus::Attending, ts(6, 9))
        .await
        .unwrap();

    // Resuming attendance on the first series now exceeds the limit.
    let result = f
        .ledger
        .split(paused.id, ts(10, 9), CommitmentStatus::Attending)
        .await;
    assert!(matches!(
        result,
        Err(SchedulingError::QuotaExceeded { limit: 1, count: 1 })
    ));
}

#[tokio::test]
async fn history_is_descending_and_complete() {
    let f = fixture(5);
    let series = SeriesId::generate();
    f.ledger
        .update(f.student, series, CommitmentStatus::Attending, ts(1, 9))
        .await
        .unwrap();
    f.ledger
        .update(f.student, series, CommitmentStatus::NotAttending, ts(10, 9))
        .await
        .unwrap();
    f.ledger
        .update(f.student, series, CommitmentStatus::Tentative, ts(20, 9))
        .await
        .unwrap();

    let history = f.ledger.get_history(f.student, series).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].status, CommitmentStatus::Tentative);
    assert_eq!(history[1].status, CommitmentStatus::NotAttending);
    assert_eq!(history[2].status, CommitmentStatus::Attending);
    assert!(history
        .windows(2)
        .all(|w| w[0].effective_from > w[1].effective_from));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_never_overbook() {
    let f = fixture(3);
    let ledger = Arc::new(f.ledger);

    let tasks: Vec<_> = (0..16u32)
        .map(|i| {
            let ledger = ledger.clone();
            let student = f.student;
            tokio::spawn(async move {
                ledger
                    .update(
                        student,
                        SeriesId::generate(),
                        CommitmentStatus::Attending,
                        ts(2, 0) + chrono::Duration::minutes(i as i64),
                    )
                    .await
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    let accepted = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(accepted, 3);
    assert_eq!(f.repo.commitment_count(), 3);
}

#[tokio::test]
async fn quota_windows_are_per_student() {
    let f = fixture(1);
    // A second student with an identical plan gets an independent window.
    let other_student = StudentId::generate();
    let plan = PlanId::generate();
    f.plans.define_plan(plan, 1);
    f.plans.assign(other_student, plan, ts(1, 0), Some(ts(30, 23)));

    f.ledger
        .update(
            f.student,
            SeriesId::generate(),
            CommitmentStatus::Attending,
            ts(2, 8),
        )
        .await
        .unwrap();
    f.ledger
        .update(
            other_student,
            SeriesId::generate(),
            CommitmentStatus::Attending,
            ts(2, 8),
        )
        .await
        .unwrap();
    assert_eq!(f.repo.commitment_count(), 2);
}
