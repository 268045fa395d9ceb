//! Repository for the `settings` singleton.

use sqlx::{PgConnection, PgPool};

use crate::models::settings::{Settings, UpdateSettings};

/// Column list for `settings` queries.
const COLUMNS: &str = "\
    id, default_personal_submission_quota, default_personal_submission_interval_mins, \
    global_quota, tumor_types, sources, platforms, csv_required_columns, \
    runner_job_timeout_mins, max_filesize_h5_mb, max_filesize_csv_mb, about_md, \
    created_at, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    /// Load the settings row.
    pub async fn get(pool: &PgPool) -> Result<Settings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = 1");
        sqlx::query_as::<_, Settings>(&query).fetch_one(pool).await
    }

    /// Load the settings row inside a transaction without locking it.
    pub async fn get_in(conn: &mut PgConnection) -> Result<Settings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = 1");
        sqlx::query_as::<_, Settings>(&query)
            .fetch_one(&mut *conn)
            .await
    }

    /// Load and lock the settings row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection) -> Result<Settings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE id = 1 FOR UPDATE");
        sqlx::query_as::<_, Settings>(&query)
            .fetch_one(&mut *conn)
            .await
    }

    /// Apply a partial update. Only non-`None` fields change.
    pub async fn update(pool: &PgPool, input: &UpdateSettings) -> Result<Settings, sqlx::Error> {
        let query = format!(
            "UPDATE settings SET
                default_personal_submission_quota = COALESCE($1, default_personal_submission_quota),
                default_personal_submission_interval_mins = COALESCE($2, default_personal_submission_interval_mins),
                global_quota = COALESCE($3, global_quota),
                tumor_types = COALESCE($4, tumor_types),
                sources = COALESCE($5, sources),
                platforms = COALESCE($6, platforms),
                csv_required_columns = COALESCE($7, csv_required_columns),
                runner_job_timeout_mins = COALESCE($8, runner_job_timeout_mins),
                max_filesize_h5_mb = COALESCE($9, max_filesize_h5_mb),
                max_filesize_csv_mb = COALESCE($10, max_filesize_csv_mb),
                about_md = COALESCE($11, about_md)
             WHERE id = 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Settings>(&query)
            .bind(input.default_personal_submission_quota)
            .bind(input.default_personal_submission_interval_mins)
            .bind(input.global_quota)
            .bind(&input.tumor_types)
            .bind(&input.sources)
            .bind(&input.platforms)
            .bind(&input.csv_required_columns)
            .bind(input.runner_job_timeout_mins)
            .bind(input.max_filesize_h5_mb)
            .bind(input.max_filesize_csv_mb)
            .bind(&input.about_md)
            .fetch_one(pool)
            .await
    }

    /// Decrement the global quota by one. The caller must hold the row lock
    /// and have checked the quota is positive.
    pub async fn decrement_global_quota(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE settings SET global_quota = global_quota - 1 WHERE id = 1")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
