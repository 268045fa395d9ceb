//! File download handlers: sample inputs and tiered result archives.
//!
//! All three endpoints take `{"sample_id": N}` as a JSON body and stream the
//! file back as an attachment.

use std::path::Path;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use predictcr_core::error::CoreError;
use predictcr_core::results::ResultTier;
use predictcr_core::types::DbId;
use predictcr_db::models::sample::Sample;
use predictcr_db::models::user::User;
use predictcr_db::repositories::SampleRepo;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::storage::InputFile;

/// Request body shared by the download endpoints.
#[derive(Debug, Deserialize)]
pub struct SampleFileRequest {
    pub sample_id: DbId,
}

/// Load a sample the caller may see. Owners and admins always can; runners
/// only for input files, which they need to run the job.
async fn visible_sample(
    state: &AppState,
    user: &User,
    sample_id: DbId,
    allow_runner: bool,
) -> AppResult<Sample> {
    let sample = SampleRepo::find_by_id(&state.pool, sample_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Sample",
            id: sample_id,
        }))?;

    let allowed = user.is_admin || sample.email == user.email || (allow_runner && user.is_runner);
    if !allowed {
        // Same response as a missing sample: other users' samples are not disclosed.
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Sample",
            id: sample_id,
        }));
    }
    Ok(sample)
}

/// Stream a file from disk as an attachment named `download_name`.
async fn send_file(path: &Path, download_name: &str) -> AppResult<Response> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("File {download_name} not found")));
        }
        Err(e) => return Err(AppError::storage(e)),
    };
    let len = file
        .metadata()
        .await
        .map_err(AppError::storage)?
        .len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, len.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{download_name}\""),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

async fn input_file(
    state: &AppState,
    auth: &AuthUser,
    sample_id: DbId,
    input: InputFile,
) -> AppResult<Response> {
    let user = auth.load(&state.pool).await?;
    let sample = visible_sample(state, &user, sample_id, true).await?;
    let path = state.storage.input_path(sample.id, input);
    send_file(&path, input.file_name()).await
}

/// POST /api/v1/input_h5_file
pub async fn input_h5_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SampleFileRequest>,
) -> AppResult<Response> {
    input_file(&state, &auth, input.sample_id, InputFile::H5).await
}

/// POST /api/v1/input_csv_file
pub async fn input_csv_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SampleFileRequest>,
) -> AppResult<Response> {
    input_file(&state, &auth, input.sample_id, InputFile::Csv).await
}

/// POST /api/v1/result
///
/// Admins receive the admin archive, trusted users (`full_results`) the
/// trusted-user archive, everyone else the user archive.
pub async fn result(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SampleFileRequest>,
) -> AppResult<Response> {
    let user = auth.load(&state.pool).await?;
    let sample = visible_sample(&state, &user, input.sample_id, false).await?;
    if !sample.has_results {
        return Err(AppError::BadRequest("No results available".into()));
    }

    let tier = ResultTier::for_viewer(user.is_admin, user.full_results);
    let path = state.storage.result_path(sample.id, tier);
    tracing::debug!(sample_id = sample.id, user_id = user.id, tier = tier.field_name(), "Serving results");
    send_file(&path, tier.file_name()).await
}
