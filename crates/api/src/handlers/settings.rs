use axum::extract::State;
use axum::Json;
use predictcr_db::models::settings::Settings;
use predictcr_db::repositories::SettingsRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/settings
///
/// Public: the submission form needs the allowed values and size limits.
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<DataResponse<Settings>>> {
    let settings = SettingsRepo::get(&state.pool).await?;
    Ok(Json(DataResponse { data: settings }))
}
