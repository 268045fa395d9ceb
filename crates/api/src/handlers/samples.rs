//! Handlers for the `/samples` resource.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use predictcr_db::models::sample::SampleResponse;
use predictcr_db::repositories::SampleRepo;

use crate::engine::submission::{submit_sample, SubmissionForm};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/samples
///
/// The caller's own samples, newest first.
pub async fn list_samples(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<SampleResponse>>>> {
    let user = auth.load(&state.pool).await?;
    let samples = SampleRepo::list(&state.pool, Some(&user.email)).await?;
    Ok(Json(DataResponse {
        data: samples.into_iter().map(SampleResponse::from).collect(),
    }))
}

/// POST /api/v1/samples
///
/// Multipart fields: `name`, `tumor_type`, `source`, `platform` (text) and
/// `h5_file`, `csv_file` (files). Unknown fields are ignored.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<SampleResponse>>)> {
    let user = auth.load(&state.pool).await?;

    let mut form = SubmissionForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::multipart)?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "h5_file" | "csv_file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(AppError::multipart)?;
                if name == "h5_file" {
                    form.h5_file = Some(data);
                } else {
                    form.csv_file = Some(data);
                }
            }
            "name" | "tumor_type" | "source" | "platform" => {
                let text = field
                    .text()
                    .await
                    .map_err(AppError::multipart)?;
                match name.as_str() {
                    "name" => form.name = text,
                    "tumor_type" => form.tumor_type = text,
                    "source" => form.source = text,
                    _ => form.platform = text,
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    let sample = submit_sample(&state, &user, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SampleResponse::from(sample),
        }),
    ))
}
