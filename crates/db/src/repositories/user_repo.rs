//! Repository for the `users` table.

use predictcr_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, activated, enabled, quota, \
                       submission_interval_minutes, last_submission_at, is_admin, \
                       is_runner, full_results, created_at, updated_at";

/// Email prefix for generated runner accounts (`runner1`, `runner2`, ...).
const RUNNER_EMAIL_PREFIX: &str = "runner";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users
                (email, password_hash, activated, enabled, quota,
                 submission_interval_minutes, is_admin, is_runner, full_results)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.activated)
            .bind(input.enabled)
            .bind(input.quota)
            .bind(input.submission_interval_minutes)
            .bind(input.is_admin)
            .bind(input.is_runner)
            .bind(input.full_results)
            .fetch_one(pool)
            .await
    }

    /// Create a runner account named `runnerN` with the lowest free `N`.
    ///
    /// Runner accounts have no password and cannot log in; they authenticate
    /// with a long-lived token issued at creation.
    pub async fn create_runner(pool: &PgPool) -> Result<User, sqlx::Error> {
        let taken: Vec<(String,)> =
            sqlx::query_as("SELECT email FROM users WHERE email LIKE $1 || '%'")
                .bind(RUNNER_EMAIL_PREFIX)
                .fetch_all(pool)
                .await?;
        let mut number = 1;
        while taken
            .iter()
            .any(|(email,)| *email == format!("{RUNNER_EMAIL_PREFIX}{number}"))
        {
            number += 1;
        }

        let input = CreateUser {
            email: format!("{RUNNER_EMAIL_PREFIX}{number}"),
            password_hash: String::new(),
            activated: false,
            enabled: true,
            quota: 0,
            submission_interval_minutes: 0,
            is_admin: false,
            is_runner: true,
            full_results: false,
        };
        Self::create(pool, &input).await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find and lock a user row for the rest of the transaction.
    pub async fn lock_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1 FOR UPDATE");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List all users, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY id DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Update a user identified by email. Only non-`None` fields in `input`
    /// are applied.
    ///
    /// Returns `None` if no user with that email exists.
    pub async fn update_by_email(
        pool: &PgPool,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                enabled = COALESCE($2, enabled),
                activated = COALESCE($3, activated),
                quota = COALESCE($4, quota),
                full_results = COALESCE($5, full_results),
                submission_interval_minutes = COALESCE($6, submission_interval_minutes)
             WHERE email = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(input.enabled)
            .bind(input.activated)
            .bind(input.quota)
            .bind(input.full_results)
            .bind(input.submission_interval_minutes)
            .fetch_optional(pool)
            .await
    }

    /// Mark an account as activated.
    ///
    /// Returns `true` if the row changed, `false` if it was already active
    /// or does not exist.
    pub async fn activate(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET activated = true WHERE email = $1 AND activated = false")
                .bind(email)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Consume one unit of the user's quota and stamp the submission time.
    /// The caller must hold the row lock and have checked the quota.
    pub async fn record_submission(
        conn: &mut PgConnection,
        id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET quota = quota - 1, last_submission_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
