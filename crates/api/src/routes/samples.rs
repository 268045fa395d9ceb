//! Route definitions for samples and their files.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{files, samples};
use crate::state::AppState;

/// Routes mounted at the `/api/v1` root.
///
/// ```text
/// GET  /samples           -> list_samples
/// POST /samples           -> submit
/// POST /input_h5_file     -> input_h5_file
/// POST /input_csv_file    -> input_csv_file
/// POST /result            -> result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/samples", get(samples::list_samples).post(samples::submit))
        .route("/input_h5_file", post(files::input_h5_file))
        .route("/input_csv_file", post(files::input_csv_file))
        .route("/result", post(files::result))
}
