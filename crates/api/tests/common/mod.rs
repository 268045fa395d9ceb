//! Shared helpers for API integration tests.
//!
//! The app is built with [`build_app_router`], so tests exercise the same
//! middleware stack as production. Requests go through
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use predictcr_api::auth::jwt::{generate_access_token, JwtConfig};
use predictcr_api::auth::password::hash_password;
use predictcr_api::config::ServerConfig;
use predictcr_api::router::build_app_router;
use predictcr_api::state::AppState;
use predictcr_api::storage::SampleStorage;
use predictcr_db::models::user::{CreateUser, User};
use predictcr_db::repositories::UserRepo;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "abcABC123";
pub const BOUNDARY: &str = "predictcr-test-boundary";

/// A router plus the temporary data directory backing its storage.
pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    pub data_dir: TempDir,
}

impl TestApp {
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.path().to_path_buf()
    }

    /// Access token for `user`, as issued at login.
    pub fn token_for(&self, user: &User) -> String {
        generate_access_token(user.id, user.role(), &self.config.jwt).unwrap()
    }
}

pub fn test_config(data_path: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        data_path,
        max_upload_mb: 16,
        stale_job_sweep_secs: 60,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
            runner_token_expiry_days: 182,
        },
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, |_| {})
}

/// Like [`build_test_app`], with `configure` applied to the config first.
pub fn build_test_app_with(pool: PgPool, configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let data_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(data_dir.path().to_path_buf());
    configure(&mut config);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage: Arc::new(SampleStorage::new(data_dir.path())),
    };
    TestApp {
        router: build_app_router(state, &config),
        config,
        data_dir,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct NewAccount<'a> {
    pub email: &'a str,
    pub is_admin: bool,
    pub full_results: bool,
    pub quota: i32,
}

impl<'a> NewAccount<'a> {
    pub fn user(email: &'a str) -> Self {
        Self {
            email,
            is_admin: false,
            full_results: false,
            quota: 10,
        }
    }
}

/// Create an activated, enabled account with password [`PASSWORD`].
pub async fn create_account(pool: &PgPool, account: NewAccount<'_>) -> User {
    let input = CreateUser {
        email: account.email.to_string(),
        password_hash: hash_password(PASSWORD).unwrap(),
        activated: true,
        enabled: true,
        quota: account.quota,
        submission_interval_minutes: 0,
        is_admin: account.is_admin,
        is_runner: false,
        full_results: account.full_results,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

pub async fn create_user(pool: &PgPool, email: &str) -> User {
    create_account(pool, NewAccount::user(email)).await
}

pub async fn create_admin(pool: &PgPool, email: &str) -> User {
    create_account(
        pool,
        NewAccount {
            is_admin: true,
            ..NewAccount::user(email)
        },
    )
    .await
}

pub async fn create_runner(pool: &PgPool) -> User {
    UserRepo::create_runner(pool).await.unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header("authorization", format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str, token: Option<&str>) -> Response<Body> {
    let request = with_auth(Request::builder().method("GET").uri(uri), token)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let request = with_auth(Request::builder().method("POST").uri(uri), token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// One part of a multipart body: `(field name, file name, content)`.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(
    app: &TestApp,
    uri: &str,
    parts: &[Part<'_>],
    token: Option<&str>,
) -> Response<Body> {
    let request = with_auth(Request::builder().method("POST").uri(uri), token)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

pub const CSV: &[u8] = b"barcode,cdr3,chain\nAAAC,CASSL,TRB\n";

/// Submit a valid sample as `token`'s owner, returning the response.
pub async fn submit_sample(app: &TestApp, token: &str, name: &str) -> Response<Body> {
    post_multipart(
        app,
        "/api/v1/samples",
        &[
            ("name", None, name.as_bytes()),
            ("tumor_type", None, "Lung".as_bytes()),
            ("source", None, "TIL".as_bytes()),
            ("platform", None, "10x".as_bytes()),
            ("h5_file", Some("input.h5"), "h5-bytes".as_bytes()),
            ("csv_file", Some("input.csv"), CSV),
        ],
        Some(token),
    )
    .await
}

/// Submit a sample that must be accepted and return its id.
pub async fn submit_sample_ok(app: &TestApp, token: &str, name: &str) -> i64 {
    let response = submit_sample(app, token, name).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
