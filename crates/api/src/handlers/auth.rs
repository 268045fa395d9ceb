//! Handlers for the `/auth` resource: login, signup, activation and the
//! password change and reset flows.

use axum::extract::{Path, State};
use axum::Json;
use predictcr_core::error::CoreError;
use predictcr_core::validation::{validate_email, validate_password};
use predictcr_db::models::user::{CreateUser, UserResponse};
use predictcr_db::repositories::{SettingsRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{
    generate_access_token, generate_activation_token, generate_password_reset_token,
    validate_activation_token, validate_password_reset_token,
};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for `POST /auth/request-password-reset`.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub email: String,
    pub new_password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Only activated and enabled accounts
/// may log in.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown email address".into())))?;

    if !user.activated {
        return Err(AppError::Core(CoreError::Forbidden(
            "User account is not yet activated".into(),
        )));
    }
    if !user.enabled {
        return Err(AppError::Core(CoreError::Forbidden(
            "User account is not yet enabled".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Incorrect password".into(),
        )));
    }

    let access_token = generate_access_token(user.id, user.role(), &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, role = user.role(), "User logged in");
    Ok(Json(LoginResponse {
        access_token,
        user: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/signup
///
/// Create an account that must be activated through the emailed link and
/// enabled by an admin before it can log in. Email delivery is not wired
/// up; the activation link is written to the log.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> AppResult<Json<MessageResponse>> {
    let email = input.email.trim();
    validate_email(email).map_err(AppError::BadRequest)?;
    validate_password(&input.password).map_err(AppError::BadRequest)?;

    if UserRepo::find_by_email(&state.pool, email).await?.is_some() {
        return Err(AppError::BadRequest(
            "This email address is already in use".into(),
        ));
    }

    let settings = SettingsRepo::get(&state.pool).await?;
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: email.to_string(),
            password_hash,
            activated: false,
            enabled: false,
            quota: settings.default_personal_submission_quota,
            submission_interval_minutes: settings.default_personal_submission_interval_mins,
            is_admin: false,
            is_runner: false,
            full_results: false,
        },
    )
    .await?;

    let token = generate_activation_token(&user.email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    tracing::info!(
        user_id = user.id,
        email = %user.email,
        activation_path = %format!("/api/v1/auth/activate/{token}"),
        "New signup, activation link issued",
    );

    Ok(Json(MessageResponse::new(format!(
        "Successful signup for {}. To activate your account, please click on the link in the activation email.",
        user.email
    ))))
}

/// GET /api/v1/auth/activate/{token}
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let email = validate_activation_token(&token, &state.config.jwt)
        .ok_or_else(|| AppError::BadRequest("Invalid or expired activation link".into()))?;

    if UserRepo::activate(&state.pool, &email).await? {
        tracing::info!(email = %email, "Account activated");
        return Ok(Json(MessageResponse::new(format!("Account {email} activated"))));
    }

    match UserRepo::find_by_email(&state.pool, &email).await? {
        Some(_) => Err(AppError::BadRequest(format!(
            "Account for {email} is already activated"
        ))),
        None => Err(AppError::BadRequest(format!("Unknown email address {email}"))),
    }
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = auth.load(&state.pool).await?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Incorrect password".into(),
        )));
    }
    validate_password(&input.new_password).map_err(AppError::BadRequest)?;

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(Json(MessageResponse::new("Password changed.")))
}

/// POST /api/v1/auth/request-password-reset
///
/// Issue a one-hour reset link for the account. The response is the same
/// whether or not the address belongs to an account; like signup, the link
/// is written to the log instead of being emailed.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(input): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = input.email.trim();

    match UserRepo::find_by_email(&state.pool, email).await? {
        Some(user) if !user.is_runner => {
            let token = generate_password_reset_token(&user.email, &state.config.jwt)
                .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
            tracing::info!(
                user_id = user.id,
                email = %user.email,
                reset_path = %format!("/reset_password/{token}"),
                "Password reset link issued",
            );
        }
        _ => tracing::info!(email, "Password reset requested for unknown email address"),
    }

    Ok(Json(MessageResponse::new(format!(
        "Sent password reset email to '{email}'"
    ))))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = input.email.trim();
    let token_email = validate_password_reset_token(&input.reset_token, &state.config.jwt)
        .ok_or_else(|| AppError::BadRequest("Invalid or expired password reset link".into()))?;
    if !token_email.eq_ignore_ascii_case(email) {
        tracing::info!(email, "Password reset email does not match the link");
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    validate_password(&input.new_password).map_err(AppError::BadRequest)?;

    let user = UserRepo::find_by_email(&state.pool, &token_email)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Unknown email address {token_email}")))?;

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password reset");
    Ok(Json(MessageResponse::new("Password changed")))
}
