//! Inbound webhook receiver and webhook registration.
//!
//! The receiver authenticates callers with a shared secret in the
//! `x-webhook-secret` header. Events are acknowledged but not dispatched;
//! order state only changes through the payment flow.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::{NewWebhook, WebhookRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Header carrying the shared webhook secret.
pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Compare two strings in constant time (for the same length).
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check the shared secret header against `expected`.
fn verify_secret(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| constant_time_compare(provided, expected))
}

/// Receive an external webhook.
///
/// The secret is verified before the body is looked at, and rejected
/// payloads are never logged.
///
/// # Route
///
/// `POST /api/webhooks/receive`
#[instrument(skip_all)]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    if !verify_secret(&headers, state.config().webhook_secret.expose_secret()) {
        tracing::warn!(
            has_secret = headers.contains_key(SECRET_HEADER),
            "Rejected webhook with invalid secret"
        );
        return Err(AppError::Unauthorized);
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid JSON payload".to_string()))?;

    let event_type = payload
        .get("type")
        .or_else(|| payload.get("eventType"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    tracing::info!(event_type, bytes = body.len(), "Webhook received");

    Ok(Json(json!({ "message": "Webhook processed", "ok": true })))
}

/// Body of a registration request. Every field is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub event_type: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
}

impl RegisterRequest {
    fn into_new_webhook(self) -> Option<NewWebhook> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(NewWebhook {
            event_type: non_empty(self.event_type)?,
            url: non_empty(self.url)?,
            secret: non_empty(self.secret)?,
        })
    }
}

/// Register a webhook target.
///
/// An unparseable body is treated the same as one with missing fields.
///
/// # Route
///
/// `POST /api/webhooks/register`
#[instrument(skip_all)]
pub async fn register(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RegisterRequest = serde_json::from_slice(&body).unwrap_or_default();

    let Some(new) = request.into_new_webhook() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing required fields" })),
        )
            .into_response();
    };

    match WebhookRepository::new(state.pool()).create(&new).await {
        Ok(webhook) => {
            tracing::info!(
                webhook_id = %webhook.id,
                event_type = %webhook.event_type,
                "Webhook registered"
            );
            Json(json!({ "webhook": webhook, "ok": true })).into_response()
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                error = %e,
                sentry_event_id = %event_id,
                "Failed to register webhook"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Something went wrong", "ok": false })),
            )
                .into_response()
        }
    }
}
