//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use chrono::Utc;
use predictcr_db::models::sample::{NewSample, Sample, SubmissionOutcome};
use predictcr_db::models::user::{CreateUser, User};
use predictcr_db::repositories::{SampleRepo, UserRepo};
use sqlx::PgPool;

/// An activated, enabled user with the given quota and no submission interval.
pub async fn create_user(pool: &PgPool, email: &str, quota: i32) -> User {
    let input = CreateUser {
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        activated: true,
        enabled: true,
        quota,
        submission_interval_minutes: 0,
        is_admin: false,
        is_runner: false,
        full_results: false,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

pub async fn create_runner(pool: &PgPool) -> User {
    UserRepo::create_runner(pool).await.unwrap()
}

pub fn new_sample(email: &str, name: &str) -> NewSample {
    NewSample {
        email: email.to_string(),
        name: name.to_string(),
        tumor_type: "Lung".to_string(),
        source: "TIL".to_string(),
        platform: "10x".to_string(),
    }
}

/// Submit a sample through the quota gate and commit it.
pub async fn submit(pool: &PgPool, email: &str, name: &str) -> SubmissionOutcome {
    let mut tx = pool.begin().await.unwrap();
    let outcome = SampleRepo::create_with_quota(&mut *tx, &new_sample(email, name), Utc::now())
        .await
        .unwrap();
    tx.commit().await.unwrap();
    outcome
}

/// Submit a sample that is expected to pass the gate.
pub async fn submit_ok(pool: &PgPool, email: &str, name: &str) -> Sample {
    match submit(pool, email, name).await {
        SubmissionOutcome::Accepted(sample) => sample,
        SubmissionOutcome::Rejected(reason) => panic!("submission rejected: {reason}"),
    }
}

/// Pretend the sample's current job started `mins` minutes ago.
pub async fn backdate_job_start(pool: &PgPool, sample_id: i64, mins: i32) {
    sqlx::query(
        "UPDATE samples SET job_started_at = NOW() - make_interval(mins => $2) WHERE id = $1",
    )
    .bind(sample_id)
    .bind(mins)
    .execute(pool)
    .await
    .unwrap();
}
