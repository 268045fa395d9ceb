//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose token role
//! does not match. The account row is then loaded, so a disabled account or
//! a revoked flag takes effect before the token expires.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use predictcr_core::error::CoreError;
use predictcr_core::roles::{ROLE_ADMIN, ROLE_RUNNER};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN || !user.load(&state.pool).await?.is_admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin account required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires the `runner` role. Rejects with 403 Forbidden otherwise.
pub struct RequireRunner(pub AuthUser);

impl FromRequestParts<AppState> for RequireRunner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_RUNNER || !user.load(&state.pool).await?.is_runner {
            return Err(AppError::Core(CoreError::Forbidden(
                "Runner account required".into(),
            )));
        }
        Ok(RequireRunner(user))
    }
}
