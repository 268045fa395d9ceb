//! Admin-only handlers: samples, jobs, users, runner tokens and settings.

use axum::extract::{Path, Query, State};
use axum::Json;
use predictcr_core::error::CoreError;
use predictcr_core::types::DbId;
use predictcr_db::models::job::{JobListQuery, JobResponse};
use predictcr_db::models::sample::SampleResponse;
use predictcr_db::models::settings::{Settings, UpdateSettings};
use predictcr_db::models::user::{UpdateUser, UserResponse};
use predictcr_db::repositories::{JobRepo, SampleRepo, SettingsRepo, UserRepo};
use serde::Serialize;

use crate::auth::jwt::generate_runner_token;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response of `GET /admin/runner_token`.
#[derive(Debug, Serialize)]
pub struct RunnerTokenResponse {
    pub access_token: String,
    pub runner: UserResponse,
}

/// GET /api/v1/admin/samples
pub async fn list_samples(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SampleResponse>>>> {
    let samples = SampleRepo::list(&state.pool, None).await?;
    Ok(Json(DataResponse {
        data: samples.into_iter().map(SampleResponse::from).collect(),
    }))
}

/// POST /api/v1/admin/samples/{id}/resubmit
///
/// Put a sample back in the queue from any state and delete its stored
/// result archives. A failed deletion is logged, not returned.
pub async fn resubmit_sample(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SampleResponse>>> {
    let sample = SampleRepo::resubmit(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Sample",
            id,
        }))?;
    // Already committed with has_results cleared; leftovers are unreachable.
    if let Err(e) = state.storage.delete_results(id).await {
        tracing::warn!(sample_id = id, error = %e, "Failed to delete old result archives");
    }

    tracing::info!(sample_id = id, admin_id = admin.user_id, "Sample resubmitted");
    Ok(Json(DataResponse {
        data: SampleResponse::from(sample),
    }))
}

/// GET /api/v1/admin/jobs
pub async fn list_jobs(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<Json<DataResponse<Vec<JobResponse>>>> {
    let jobs = JobRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse {
        data: jobs.into_iter().map(JobResponse::from).collect(),
    }))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/v1/admin/users/update
///
/// Update `enabled`, `activated`, `quota`, `full_results` and
/// `submission_interval_minutes` of the account with the given email.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if input.quota.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("quota must not be negative".into()));
    }
    if input.submission_interval_minutes.is_some_and(|m| m < 0) {
        return Err(AppError::BadRequest(
            "submission_interval_minutes must not be negative".into(),
        ));
    }

    let user = UserRepo::update_by_email(&state.pool, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown email address {}", input.email)))?;

    tracing::info!(user_id = user.id, admin_id = admin.user_id, "User updated");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// GET /api/v1/admin/runner_token
///
/// Create a new runner account and return a long-lived token for it.
pub async fn runner_token(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<RunnerTokenResponse>> {
    let runner = UserRepo::create_runner(&state.pool).await?;
    let access_token = generate_runner_token(runner.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(runner_id = runner.id, runner = %runner.email, admin_id = admin.user_id, "Runner account created");
    Ok(Json(RunnerTokenResponse {
        access_token,
        runner: UserResponse::from(&runner),
    }))
}

/// POST /api/v1/admin/settings
///
/// Partial update; unknown keys are rejected.
pub async fn update_settings(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettings>,
) -> AppResult<Json<DataResponse<Settings>>> {
    input.validate().map_err(AppError::BadRequest)?;
    let settings = SettingsRepo::update(&state.pool, &input).await?;

    tracing::info!(admin_id = admin.user_id, "Settings updated");
    Ok(Json(DataResponse { data: settings }))
}
