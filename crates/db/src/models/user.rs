//! User entity model and DTOs.

use predictcr_core::roles::role_for;
use predictcr_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
    pub enabled: bool,
    pub quota: i32,
    pub submission_interval_minutes: i32,
    pub last_submission_at: Option<Timestamp>,
    pub is_admin: bool,
    pub is_runner: bool,
    pub full_results: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Role name embedded in access tokens.
    pub fn role(&self) -> &'static str {
        role_for(self.is_admin, self.is_runner)
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub role: &'static str,
    pub activated: bool,
    pub enabled: bool,
    pub quota: i32,
    pub submission_interval_minutes: i32,
    pub last_submission_at: Option<Timestamp>,
    pub is_admin: bool,
    pub is_runner: bool,
    pub full_results: bool,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role(),
            activated: user.activated,
            enabled: user.enabled,
            quota: user.quota,
            submission_interval_minutes: user.submission_interval_minutes,
            last_submission_at: user.last_submission_at,
            is_admin: user.is_admin,
            is_runner: user.is_runner,
            full_results: user.full_results,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
    pub enabled: bool,
    pub quota: i32,
    pub submission_interval_minutes: i32,
    pub is_admin: bool,
    pub is_runner: bool,
    pub full_results: bool,
}

/// Admin update of an account, identified by email. Only non-`None`
/// fields are applied.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    pub email: String,
    pub enabled: Option<bool>,
    pub activated: Option<bool>,
    pub quota: Option<i32>,
    pub full_results: Option<bool>,
    pub submission_interval_minutes: Option<i32>,
}
