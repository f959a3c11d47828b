//! Integration tests for the webhook routes.
//!
//! Everything here is decided before persistence, so no database is needed.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use casecrafters_integration_tests::{WEBHOOK_SECRET, json_body, lazy_app};
use serde_json::json;
use tower::ServiceExt;

fn receive(secret: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::post("/api/webhooks/receive")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-webhook-secret", secret);
    }
    builder.body(Body::from(body)).unwrap()
}

// =============================================================================
// Receiver
// =============================================================================

#[tokio::test]
async fn test_missing_secret_is_forbidden() {
    let response = lazy_app()
        .oneshot(receive(None, r#"{"type":"order.paid"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await, json!({ "message": "Unauthorized" }));
}

#[tokio::test]
async fn test_wrong_secret_is_forbidden() {
    let response = lazy_app()
        .oneshot(receive(Some("whk_wrong_secret"), r#"{"type":"order.paid"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_secret_is_checked_before_body() {
    let response = lazy_app()
        .oneshot(receive(Some("whk_wrong_secret"), "not json at all"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_valid_secret_and_json_is_processed() {
    let response = lazy_app()
        .oneshot(receive(Some(WEBHOOK_SECRET), r#"{"type":"order.paid","id":"evt_1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "message": "Webhook processed", "ok": true })
    );
}

#[tokio::test]
async fn test_valid_secret_with_invalid_json_is_bad_request() {
    let response = lazy_app()
        .oneshot(receive(Some(WEBHOOK_SECRET), "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_with_missing_fields_is_bad_request() {
    let request = Request::post("/api/webhooks/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"eventType":"order.paid","url":"https://hooks.example.com"}"#))
        .unwrap();

    let response = lazy_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Missing required fields" })
    );
}

#[tokio::test]
async fn test_register_with_empty_body_is_bad_request() {
    let request = Request::post("/api/webhooks/register")
        .body(Body::empty())
        .unwrap();

    let response = lazy_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
