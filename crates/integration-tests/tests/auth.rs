//! Integration tests for authentication rejection, health and request IDs.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use casecrafters_integration_tests::{json_body, lazy_app};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let body = json!({ "configurationId": Uuid::new_v4() }).to_string();
    let request = Request::post("/api/checkout")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = lazy_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Authentication required" })
    );
}

#[tokio::test]
async fn test_order_routes_require_sign_in() {
    let id = Uuid::new_v4();
    for path in [
        format!("/api/orders/{id}/status"),
        format!("/api/orders/{id}/receipt"),
        format!("/api/profile/orders/{id}"),
        "/api/profile".to_string(),
    ] {
        let request = Request::get(path.as_str()).body(Body::empty()).unwrap();
        let response = lazy_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn test_health_is_ok() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let response = lazy_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let request = Request::get("/health")
        .header("x-request-id", "edge-1234")
        .body(Body::empty())
        .unwrap();
    let response = lazy_app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-1234");

    let request = Request::get("/health")
        .header("x-request-id", "bad id with spaces")
        .body(Body::empty())
        .unwrap();
    let response = lazy_app().oneshot(request).await.unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}
