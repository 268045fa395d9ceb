//! Integration tests for recording job outcomes.

mod common;

use assert_matches::assert_matches;
use common::{create_runner, create_user, submit_ok};
use predictcr_db::models::job::{DispatchedJob, ResultRejection};
use predictcr_db::models::status::{JobStatus, SampleStatus};
use predictcr_db::repositories::{JobRepo, SampleRepo};
use sqlx::PgPool;

async fn dispatch_one(pool: &PgPool) -> DispatchedJob {
    create_user(pool, "a@example.com", 10).await;
    let runner = create_runner(pool).await;
    submit_ok(pool, "a@example.com", "s").await;
    JobRepo::request_job(pool, runner.id, "h").await.unwrap().unwrap()
}

async fn record(
    pool: &PgPool,
    job_id: i64,
    sample_id: i64,
    success: bool,
    error: Option<&str>,
) -> Result<(), ResultRejection> {
    let mut tx = pool.begin().await.unwrap();
    let locked = match JobRepo::lock_for_result(&mut *tx, job_id, sample_id).await.unwrap() {
        Ok(locked) => locked,
        Err(rejection) => {
            tx.rollback().await.unwrap();
            return Err(rejection);
        }
    };
    JobRepo::record_outcome(&mut *tx, &locked, success, error).await.unwrap();
    tx.commit().await.unwrap();
    Ok(())
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_success_completes_job_and_sample(pool: PgPool) {
    let job = dispatch_one(&pool).await;
    record(&pool, job.job_id, job.sample_id, true, None).await.unwrap();

    let sample = SampleRepo::find_by_id(&pool, job.sample_id).await.unwrap().unwrap();
    assert_eq!(sample.status(), Some(SampleStatus::Completed));
    assert!(sample.has_results);
    assert!(sample.job_completed_at.is_some());

    let stored = JobRepo::find_by_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(JobStatus::Completed));
    assert!(stored.completed_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failure_records_error(pool: PgPool) {
    let job = dispatch_one(&pool).await;
    record(&pool, job.job_id, job.sample_id, false, Some("script exited with 1"))
        .await
        .unwrap();

    let sample = SampleRepo::find_by_id(&pool, job.sample_id).await.unwrap().unwrap();
    assert_eq!(sample.status(), Some(SampleStatus::Failed));
    assert!(!sample.has_results);
    assert_eq!(sample.error_message.as_deref(), Some("script exited with 1"));

    let stored = JobRepo::find_by_id(&pool, job.job_id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(JobStatus::Failed));
    assert_eq!(stored.error_message.as_deref(), Some("script exited with 1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_result_is_rejected(pool: PgPool) {
    let job = dispatch_one(&pool).await;
    record(&pool, job.job_id, job.sample_id, true, None).await.unwrap();

    let second = record(&pool, job.job_id, job.sample_id, false, Some("late")).await;
    assert_eq!(
        second,
        Err(ResultRejection::AlreadyRecorded {
            sample_id: job.sample_id
        })
    );

    let sample = SampleRepo::find_by_id(&pool, job.sample_id).await.unwrap().unwrap();
    assert_eq!(sample.status(), Some(SampleStatus::Completed));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_ids_are_rejected(pool: PgPool) {
    let job = dispatch_one(&pool).await;

    assert_eq!(
        record(&pool, job.job_id, 9999, true, None).await,
        Err(ResultRejection::UnknownSample(9999))
    );
    assert_eq!(
        record(&pool, 9999, job.sample_id, true, None).await,
        Err(ResultRejection::UnknownJob(9999))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_job_must_belong_to_sample(pool: PgPool) {
    let job = dispatch_one(&pool).await;
    let other = submit_ok(&pool, "a@example.com", "other").await;

    assert_matches!(
        record(&pool, job.job_id, other.id, true, None).await,
        Err(ResultRejection::SampleMismatch { .. })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_result_for_timed_out_job_is_rejected(pool: PgPool) {
    let job = dispatch_one(&pool).await;
    common::backdate_job_start(&pool, job.sample_id, 24 * 60).await;
    JobRepo::sweep_stale(&pool).await.unwrap();

    assert_matches!(
        record(&pool, job.job_id, job.sample_id, true, None).await,
        Err(ResultRejection::AlreadyRecorded { .. })
    );
    let sample = SampleRepo::find_by_id(&pool, job.sample_id).await.unwrap().unwrap();
    assert_eq!(sample.status(), Some(SampleStatus::Queued));
}
