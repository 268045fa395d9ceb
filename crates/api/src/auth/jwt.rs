//! JWT generation and validation.
//!
//! Four kinds of HS256 token share one secret:
//! - access tokens for logged-in users ([`Claims`], short-lived),
//! - runner tokens (also [`Claims`], role `runner`, long-lived),
//! - activation links sent at signup ([`EmailClaims`]),
//! - password reset links ([`EmailClaims`], one hour).
//!
//! Email tokens carry the account email as a string subject plus a
//! `purpose` claim, so they never decode as access [`Claims`] and an
//! activation link cannot reset a password.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use predictcr_core::roles::ROLE_RUNNER;
use predictcr_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `purpose` claim value for account activation tokens.
const PURPOSE_ACTIVATION: &str = "activation";

/// `purpose` claim value for password reset tokens.
const PURPOSE_PASSWORD_RESET: &str = "password_reset";

/// Activation links are valid for one week.
const ACTIVATION_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// Password reset links are valid for one hour.
const PASSWORD_RESET_EXPIRY_SECS: i64 = 60 * 60;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's role name (`"admin"`, `"runner"` or `"user"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Claims of a token sent to an email address (activation, password reset).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmailClaims {
    /// Email of the account the link acts on.
    pub sub: String,
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 60).
    pub access_token_expiry_mins: i64,
    /// Runner token lifetime in days (default: 182, i.e. 26 weeks).
    pub runner_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;
/// Default runner token expiry in days.
const DEFAULT_RUNNER_EXPIRY_DAYS: i64 = 26 * 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `60`    |
    /// | `JWT_RUNNER_EXPIRY_DAYS`   | no       | `182`   |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let runner_token_expiry_days: i64 = std::env::var("JWT_RUNNER_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_RUNNER_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_RUNNER_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            runner_token_expiry_days,
        }
    }
}

fn sign<T: Serialize>(claims: &T, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(), // HS256
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

fn issue(user_id: DbId, role: &str, lifetime_secs: i64) -> Claims {
    let now = chrono::Utc::now().timestamp();
    Claims {
        sub: user_id,
        role: role.to_string(),
        exp: now + lifetime_secs,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    }
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = issue(user_id, role, config.access_token_expiry_mins * 60);
    sign(&claims, config)
}

/// Generate a long-lived token for a runner account.
pub fn generate_runner_token(
    runner_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let lifetime = config.runner_token_expiry_days * 24 * 60 * 60;
    let claims = issue(runner_id, ROLE_RUNNER, lifetime);
    sign(&claims, config)
}

/// Validate and decode an access or runner token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

fn sign_email_token(
    email: &str,
    purpose: &str,
    lifetime_secs: i64,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = EmailClaims {
        sub: email.to_string(),
        purpose: purpose.to_string(),
        exp: now + lifetime_secs,
        iat: now,
    };
    sign(&claims, config)
}

/// Decode an email token, returning its subject if `purpose` matches.
fn decode_email_token(token: &str, purpose: &str, config: &JwtConfig) -> Option<String> {
    let data = decode::<EmailClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    (data.claims.purpose == purpose).then_some(data.claims.sub)
}

/// Generate the token embedded in an account activation link.
pub fn generate_activation_token(
    email: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign_email_token(email, PURPOSE_ACTIVATION, ACTIVATION_EXPIRY_SECS, config)
}

/// Decode an activation token, returning the account email.
///
/// Returns `None` for expired, tampered or non-activation tokens.
pub fn validate_activation_token(token: &str, config: &JwtConfig) -> Option<String> {
    decode_email_token(token, PURPOSE_ACTIVATION, config)
}

/// Generate the token embedded in a password reset link.
pub fn generate_password_reset_token(
    email: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign_email_token(email, PURPOSE_PASSWORD_RESET, PASSWORD_RESET_EXPIRY_SECS, config)
}

/// Decode a password reset token, returning the account email.
pub fn validate_password_reset_token(token: &str, config: &JwtConfig) -> Option<String> {
    decode_email_token(token, PURPOSE_PASSWORD_RESET, config)
}
