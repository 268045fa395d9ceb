//! Health endpoint, authentication failures and the JSON error shape.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    body_json, build_test_app, build_test_app_with, create_user, get, post_json, post_multipart,
    send, submit_sample, CSV,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_reports_database(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["storage_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_token_is_401_with_error_body(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app, "/api/v1/samples", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Missing Authorization header");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_and_invalid_tokens(pool: PgPool) {
    let app = build_test_app(pool);

    let request = Request::builder()
        .uri("/api/v1/samples")
        .header("authorization", "Token abc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/api/v1/samples", Some("not.a.jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid or expired token");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_of_deleted_account_is_rejected(pool: PgPool) {
    let user = create_user(&pool, "user@embl.de").await;
    let app = build_test_app(pool.clone());
    let token = app.token_for(&user);

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let response = get(&app, "/api/v1/samples", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_sample_download_is_404(pool: PgPool) {
    let user = create_user(&pool, "user@embl.de").await;
    let app = build_test_app(pool);

    let response = post_json(
        &app,
        "/api/v1/result",
        json!({ "sample_id": 42 }),
        Some(&app.token_for(&user)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Sample with id 42 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_route_is_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(&app, "/api/v1/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "No route for /api/v1/nope");
}

fn upload_parts(h5: &[u8]) -> Vec<common::Part<'_>> {
    vec![
        ("name", None, b"big".as_slice()),
        ("tumor_type", None, b"Lung".as_slice()),
        ("source", None, b"TIL".as_slice()),
        ("platform", None, b"10x".as_slice()),
        ("h5_file", Some("input.h5"), h5),
        ("csv_file", Some("input.csv"), CSV),
    ]
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_above_axum_default_is_accepted(pool: PgPool) {
    let user = create_user(&pool, "user@embl.de").await;
    let app = build_test_app(pool);
    let token = app.token_for(&user);

    let h5 = vec![7u8; 3 * 1024 * 1024];
    let response = post_multipart(&app, "/api/v1/samples", &upload_parts(&h5), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_over_limit_is_413(pool: PgPool) {
    let user = create_user(&pool, "user@embl.de").await;
    let app = build_test_app_with(pool, |config| config.max_upload_mb = 1);
    let token = app.token_for(&user);

    let h5 = vec![7u8; 2 * 1024 * 1024];
    let response = post_multipart(&app, "/api/v1/samples", &upload_parts(&h5), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");

    // Small uploads still go through.
    let response = submit_sample(&app, &token, "small").await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
