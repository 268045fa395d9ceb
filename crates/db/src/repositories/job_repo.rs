//! Repository for the `jobs` table and the dispatch / result transactions.

use predictcr_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::job::{DispatchedJob, Job, JobListQuery, LockedResult, ResultRejection};
use crate::models::status::{JobStatus, SampleStatus};
use crate::repositories::{SampleRepo, SettingsRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, sample_id, runner_id, runner_hostname, status_id, error_message, \
    started_at, completed_at, created_at, updated_at";

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Error text stored on jobs whose sample was requeued after a timeout.
pub const TIMED_OUT_MESSAGE: &str = "Job timed out";

/// Provides dispatch, outcome and listing operations for jobs.
pub struct JobRepo;

impl JobRepo {
    /// Hand the oldest queued sample to a runner.
    ///
    /// In one transaction: requeue stale samples, claim the next queued
    /// sample and insert a running job for it. Returns `None` when the
    /// queue is empty.
    pub async fn request_job(
        pool: &PgPool,
        runner_id: DbId,
        runner_hostname: &str,
    ) -> Result<Option<DispatchedJob>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let settings = SettingsRepo::get_in(&mut *tx).await?;
        Self::requeue_stale(&mut *tx, settings.runner_job_timeout_mins).await?;

        let Some(sample) = SampleRepo::claim_next(&mut *tx).await? else {
            tx.commit().await?;
            return Ok(None);
        };

        let job_id: DbId = sqlx::query_scalar(
            "INSERT INTO jobs (sample_id, runner_id, runner_hostname, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(sample.id)
        .bind(runner_id)
        .bind(runner_hostname)
        .bind(JobStatus::Running.id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(DispatchedJob {
            job_id,
            sample_id: sample.id,
        }))
    }

    /// Requeue samples running longer than `timeout_mins` and fail their
    /// in-flight jobs. Returns the requeued sample IDs.
    pub async fn requeue_stale(
        conn: &mut PgConnection,
        timeout_mins: i32,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let sample_ids = SampleRepo::requeue_stale(&mut *conn, timeout_mins).await?;
        if sample_ids.is_empty() {
            return Ok(sample_ids);
        }

        sqlx::query(
            "UPDATE jobs \
             SET status_id = $1, error_message = $2, completed_at = NOW() \
             WHERE sample_id = ANY($3) AND status_id = $4",
        )
        .bind(JobStatus::Failed.id())
        .bind(TIMED_OUT_MESSAGE)
        .bind(&sample_ids)
        .bind(JobStatus::Running.id())
        .execute(&mut *conn)
        .await?;

        tracing::warn!(sample_ids = ?sample_ids, timeout_mins, "Requeued timed-out samples");
        Ok(sample_ids)
    }

    /// Run the stale-sample requeue in its own transaction.
    pub async fn sweep_stale(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let settings = SettingsRepo::get_in(&mut *tx).await?;
        let requeued = Self::requeue_stale(&mut *tx, settings.runner_job_timeout_mins).await?;
        tx.commit().await?;
        Ok(requeued)
    }

    /// Lock the sample and then the job a result refers to, and check the
    /// upload can be recorded.
    pub async fn lock_for_result(
        conn: &mut PgConnection,
        job_id: DbId,
        sample_id: DbId,
    ) -> Result<Result<LockedResult, ResultRejection>, sqlx::Error> {
        let Some(sample) = SampleRepo::lock(&mut *conn, sample_id).await? else {
            return Ok(Err(ResultRejection::UnknownSample(sample_id)));
        };

        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE");
        let Some(job) = sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(Err(ResultRejection::UnknownJob(job_id)));
        };

        if job.sample_id != sample.id {
            return Ok(Err(ResultRejection::SampleMismatch { job_id, sample_id }));
        }
        let job_finished = job.status().is_some_and(JobStatus::is_terminal);
        let sample_finished = sample.has_results
            || matches!(
                sample.status(),
                Some(SampleStatus::Completed | SampleStatus::Failed)
            );
        if job_finished || sample_finished {
            return Ok(Err(ResultRejection::AlreadyRecorded { sample_id }));
        }

        Ok(Ok(LockedResult { job, sample }))
    }

    /// Transition a locked job and its sample to completed or failed.
    pub async fn record_outcome(
        conn: &mut PgConnection,
        locked: &LockedResult,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<Job, sqlx::Error> {
        let status = if success {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        let query = format!(
            "UPDATE jobs \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(locked.job.id)
            .bind(status.id())
            .bind(error_message)
            .fetch_one(&mut *conn)
            .await?;

        SampleRepo::finish(&mut *conn, locked.sample.id, success, error_message).await?;
        Ok(job)
    }

    /// Find a job by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs, newest first, with optional filters and pagination.
    pub async fn list(pool: &PgPool, params: &JobListQuery) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
               AND ($2::BIGINT IS NULL OR sample_id = $2) \
             ORDER BY started_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(params.status_id)
            .bind(params.sample_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
