//! Repository for the `samples` table.
//!
//! A sample moves `queued -> running -> completed | failed`. A running sample
//! whose job exceeds the configured timeout goes back to `queued`; an admin
//! resubmission does the same from any state.

use predictcr_core::quota::{check_submission, QuotaRejection, QuotaState};
use predictcr_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::sample::{NewSample, Sample, SubmissionOutcome};
use crate::models::status::{JobStatus, SampleStatus};
use crate::repositories::{SettingsRepo, UserRepo};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "\
    id, email, name, tumor_type, source, platform, status_id, has_results, \
    error_message, submitted_at, job_started_at, job_completed_at, \
    created_at, updated_at";

/// Provides persistence operations for samples.
pub struct SampleRepo;

impl SampleRepo {
    /// Run the quota gate and, if it passes, consume quota and insert the
    /// sample. Everything happens on `conn`, which must be inside a
    /// transaction the caller commits once the input files are stored.
    ///
    /// Lock order: user row, then the settings row.
    pub async fn create_with_quota(
        conn: &mut PgConnection,
        input: &NewSample,
        now: Timestamp,
    ) -> Result<SubmissionOutcome, sqlx::Error> {
        let Some(user) = UserRepo::lock_by_email(&mut *conn, &input.email).await? else {
            return Ok(SubmissionOutcome::Rejected(QuotaRejection::UnknownUser(
                input.email.clone(),
            )));
        };
        let settings = SettingsRepo::lock(&mut *conn).await?;

        let state = QuotaState {
            user_quota: user.quota,
            global_quota: settings.global_quota,
            interval_mins: user.submission_interval_minutes,
            last_submission_at: user.last_submission_at,
        };
        if let Err(rejection) = check_submission(&state, now) {
            return Ok(SubmissionOutcome::Rejected(rejection));
        }

        UserRepo::record_submission(&mut *conn, user.id, now).await?;
        SettingsRepo::decrement_global_quota(&mut *conn).await?;

        let query = format!(
            "INSERT INTO samples (email, name, tumor_type, source, platform, status_id, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let sample = sqlx::query_as::<_, Sample>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.tumor_type)
            .bind(&input.source)
            .bind(&input.platform)
            .bind(SampleStatus::Queued.id())
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;
        Ok(SubmissionOutcome::Accepted(sample))
    }

    /// Find a sample by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = $1");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find and lock a sample for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List samples, newest submission first. With `email` set, only that
    /// user's samples are returned.
    pub async fn list(pool: &PgPool, email: Option<&str>) -> Result<Vec<Sample>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM samples \
             WHERE ($1::TEXT IS NULL OR email = $1) \
             ORDER BY submitted_at DESC, id DESC"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(email)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim the oldest queued sample and mark it running.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent runners never
    /// receive the same sample.
    pub async fn claim_next(conn: &mut PgConnection) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!(
            "UPDATE samples \
             SET status_id = $1, job_started_at = NOW(), job_completed_at = NULL \
             WHERE id = ( \
                 SELECT id FROM samples \
                 WHERE status_id = $2 \
                 ORDER BY submitted_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(SampleStatus::Running.id())
            .bind(SampleStatus::Queued.id())
            .fetch_optional(&mut *conn)
            .await
    }

    /// Put running samples whose job started more than `timeout_mins` ago
    /// back in the queue. Returns the requeued sample IDs.
    pub async fn requeue_stale(
        conn: &mut PgConnection,
        timeout_mins: i32,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "UPDATE samples \
             SET status_id = $1, job_started_at = NULL \
             WHERE status_id = $2 \
               AND job_started_at < NOW() - make_interval(mins => $3) \
             RETURNING id",
        )
        .bind(SampleStatus::Queued.id())
        .bind(SampleStatus::Running.id())
        .bind(timeout_mins)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Record a job outcome on its sample. The caller holds the row lock.
    pub async fn finish(
        conn: &mut PgConnection,
        id: DbId,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<Sample, sqlx::Error> {
        let status = if success {
            SampleStatus::Completed
        } else {
            SampleStatus::Failed
        };
        let query = format!(
            "UPDATE samples \
             SET status_id = $2, has_results = $3, error_message = $4, job_completed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(status.id())
            .bind(success)
            .bind(error_message)
            .fetch_one(&mut *conn)
            .await
    }

    /// Put a sample back in the queue regardless of its state, clearing any
    /// previous outcome. Running jobs for it are marked failed.
    ///
    /// Returns `None` if the sample does not exist.
    pub async fn resubmit(pool: &PgPool, id: DbId) -> Result<Option<Sample>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE samples \
             SET status_id = $2, has_results = false, error_message = NULL, \
                 job_started_at = NULL, job_completed_at = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let sample = sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(SampleStatus::Queued.id())
            .fetch_optional(&mut *tx)
            .await?;

        if sample.is_some() {
            sqlx::query(
                "UPDATE jobs \
                 SET status_id = $2, error_message = 'Resubmitted', completed_at = NOW() \
                 WHERE sample_id = $1 AND status_id = $3",
            )
            .bind(id)
            .bind(JobStatus::Failed.id())
            .bind(JobStatus::Running.id())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(sample)
    }
}
