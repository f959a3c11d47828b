//! Shopper dashboard.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use casecrafters_core::OrderId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{OrderProjection, OrderSummary, User};
use crate::services::orders::{Visibility, list_paid_summaries, load_projection};
use crate::state::AppState;

/// Body of `GET /api/profile`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: User,
    /// Name as reported by the identity provider at sign-in.
    pub display_name: Option<String>,
    pub orders: Vec<OrderSummary>,
}

/// The signed-in shopper and their paid orders, newest first.
///
/// # Route
///
/// `GET /api/profile`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileResponse>> {
    let local = UserRepository::new(state.pool())
        .get_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;

    let orders = list_paid_summaries(state.pool(), &user.id, state.checkout().currency).await?;

    Ok(Json(ProfileResponse {
        user: local,
        display_name: user.display_name(),
        orders,
    }))
}

/// One paid order with its configuration and addresses.
///
/// # Route
///
/// `GET /api/profile/orders/{id}`
#[instrument(skip_all, fields(order_id = %order_id, user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderProjection>> {
    let projection = load_projection(
        state.pool(),
        order_id,
        &user.id,
        Visibility::PaidOnly,
        state.checkout().currency,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    Ok(Json(projection))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use casecrafters_core::UserId;

    use super::*;

    #[test]
    fn test_profile_body_carries_display_name() {
        let now = Utc::now();
        let body = ProfileResponse {
            user: User {
                id: UserId::new("kp_42"),
                email: "asha@example.com".to_string(),
                created_at: now,
                updated_at: now,
            },
            display_name: Some("Asha Rao".to_string()),
            orders: Vec::new(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["displayName"], "Asha Rao");
        assert_eq!(json["user"]["id"], "kp_42");
        assert_eq!(json["orders"], serde_json::json!([]));
    }
}
