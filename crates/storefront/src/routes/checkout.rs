//! Checkout entry point.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use casecrafters_core::ConfigurationId;

use crate::db::CheckoutRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::checkout::start_checkout;
use crate::state::AppState;

/// Body of `POST /api/checkout`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub configuration_id: ConfigurationId,
}

/// Where to send the shopper to pay.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Reconcile the shopper's order for a configuration and open a payment
/// session for it.
///
/// # Route
///
/// `POST /api/checkout`
#[instrument(skip_all, fields(configuration_id = %request.configuration_id, user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let configuration_id = request.configuration_id.to_string();
    add_breadcrumb(
        "checkout",
        "Started checkout",
        Some(&[("configuration_id", configuration_id.as_str())]),
    );

    let store = CheckoutRepository::new(state.pool());
    let url = start_checkout(
        &store,
        state.payments(),
        &state.config().prices,
        state.checkout(),
        request.configuration_id,
        &user,
    )
    .await?;

    Ok(Json(CheckoutResponse { url }))
}
