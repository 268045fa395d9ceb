//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login              -> login
/// POST /signup             -> signup
/// GET  /activate/{token}   -> activate
/// POST /change-password    -> change_password (requires auth)
/// POST /request-password-reset -> request_password_reset
/// POST /reset-password     -> reset_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/activate/{token}", get(auth::activate))
        .route("/change-password", post(auth::change_password))
        .route("/request-password-reset", post(auth::request_password_reset))
        .route("/reset-password", post(auth::reset_password))
}
