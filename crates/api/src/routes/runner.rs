use axum::routing::post;
use axum::Router;

use crate::handlers::runner;
use crate::state::AppState;

/// Routes mounted at `/runner`.
///
/// ```text
/// POST /request_job   -> request_job
/// POST /result        -> upload_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request_job", post(runner::request_job))
        .route("/result", post(runner::upload_result))
}
