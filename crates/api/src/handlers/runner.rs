//! Handlers for runner accounts: job polling and result upload.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use predictcr_core::results::ResultTier;
use predictcr_core::types::DbId;
use serde::Deserialize;

use crate::engine::dispatcher::dispatch_next;
use crate::engine::results::{process_result, ResultUpload};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireRunner;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Request body for `POST /runner/request_job`.
#[derive(Debug, Default, Deserialize)]
pub struct RequestJobBody {
    #[serde(default)]
    pub runner_hostname: String,
}

/// POST /api/v1/runner/request_job
///
/// 200 with `{job_id, sample_id}` when a sample was claimed, 204 when the
/// queue is empty.
pub async fn request_job(
    State(state): State<AppState>,
    RequireRunner(runner): RequireRunner,
    Json(body): Json<RequestJobBody>,
) -> AppResult<Response> {
    let job = dispatch_next(&state.pool, runner.user_id, &body.runner_hostname).await?;
    Ok(match job {
        Some(job) => Json(job).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

fn parse_id(field: &str, value: &str) -> AppResult<DbId> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {field} '{value}'")))
}

/// Accepts `true`/`false` in any case, and `1`/`0`.
fn parse_success(value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::BadRequest(format!(
            "Invalid success value '{value}', expected true or false"
        ))),
    }
}

/// POST /api/v1/runner/result
///
/// Multipart fields: `job_id`, `sample_id`, `success`, optional
/// `error_message` and `runner_hostname`, and on success the three archives
/// `user_results`, `trusted_user_results`, `admin_results`.
pub async fn upload_result(
    State(state): State<AppState>,
    RequireRunner(runner): RequireRunner,
    mut multipart: Multipart,
) -> AppResult<Json<MessageResponse>> {
    let mut job_id = None;
    let mut sample_id = None;
    let mut success = None;
    let mut error_message = None;
    let mut runner_hostname = None;
    let mut artifacts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::multipart)?
    {
        let name = field.name().unwrap_or("").to_string();
        if let Some(tier) = ResultTier::from_field_name(&name) {
            let data = field
                .bytes()
                .await
                .map_err(AppError::multipart)?;
            artifacts.push((tier, data));
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(AppError::multipart)?;
        match name.as_str() {
            "job_id" => job_id = Some(parse_id("job_id", &text)?),
            "sample_id" => sample_id = Some(parse_id("sample_id", &text)?),
            "success" => success = Some(parse_success(&text)?),
            "error_message" => error_message = Some(text),
            "runner_hostname" => runner_hostname = Some(text),
            _ => {} // ignore unknown fields
        }
    }

    let upload = ResultUpload {
        job_id: job_id.ok_or_else(|| AppError::BadRequest("Missing key: job_id".into()))?,
        sample_id: sample_id.ok_or_else(|| AppError::BadRequest("Missing key: sample_id".into()))?,
        success: success
            .ok_or_else(|| AppError::BadRequest("Missing key: success=true/false".into()))?,
        error_message,
        runner_hostname,
        artifacts,
    };
    tracing::debug!(
        runner_id = runner.user_id,
        job_id = upload.job_id,
        sample_id = upload.sample_id,
        "Result upload received",
    );

    let sample_id = upload.sample_id;
    process_result(&state, upload).await?;
    Ok(Json(MessageResponse::new(format!(
        "Result for sample {sample_id} recorded"
    ))))
}
