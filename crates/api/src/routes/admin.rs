//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires the admin role.
///
/// ```text
/// GET  /samples                 -> list_samples
/// POST /samples/{id}/resubmit   -> resubmit_sample
/// GET  /jobs                    -> list_jobs
/// GET  /users                   -> list_users
/// POST /users/update            -> update_user
/// GET  /runner_token            -> runner_token
/// POST /settings                -> update_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/samples", get(admin::list_samples))
        .route("/samples/{id}/resubmit", post(admin::resubmit_sample))
        .route("/jobs", get(admin::list_jobs))
        .route("/users", get(admin::list_users))
        .route("/users/update", post(admin::update_user))
        .route("/runner_token", get(admin::runner_token))
        .route("/settings", post(admin::update_settings))
}
