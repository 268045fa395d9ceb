pub mod admin;
pub mod auth;
pub mod health;
pub mod runner;
pub mod samples;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                           login (public)
/// /auth/signup                          signup (public)
/// /auth/activate/{token}                activate account (public)
/// /auth/change-password                 change own password (auth)
///
/// /settings                             get settings (public)
///
/// /samples                              list own, submit (auth)
/// /input_h5_file                        download h5 input (owner, admin, runner)
/// /input_csv_file                       download csv input (owner, admin, runner)
/// /result                               download tiered results (owner, admin)
///
/// /runner/request_job                   claim next queued sample (runner)
/// /runner/result                        upload job outcome (runner)
///
/// /admin/samples                        list all samples (admin)
/// /admin/samples/{id}/resubmit          requeue a sample (admin)
/// /admin/jobs                           job audit list (admin)
/// /admin/users                          list users (admin)
/// /admin/users/update                   update user by email (admin)
/// /admin/runner_token                   create runner account + token (admin)
/// /admin/settings                       update settings (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/settings", get(handlers::settings::get_settings))
        .merge(samples::router())
        .nest("/runner", runner::router())
        .nest("/admin", admin::router())
}
