//! Order status and receipt downloads.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use casecrafters_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::orders::{Visibility, load_projection};
use crate::services::receipt::assets::DEFAULT_LOAD_TIMEOUT;
use crate::services::{PaymentStatus, Receipt, render_receipt};
use crate::state::AppState;

/// Report whether an order has been paid.
///
/// `404` until the order exists for the caller; the thank-you page keeps
/// polling through it.
///
/// # Route
///
/// `GET /api/orders/{id}/status`
#[instrument(skip_all, fields(order_id = %order_id, user_id = %user.id))]
pub async fn status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<PaymentStatus>> {
    let projection = load_projection(
        state.pool(),
        order_id,
        &user.id,
        Visibility::Any,
        state.checkout().currency,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    let status = if projection.order.is_paid {
        PaymentStatus::Paid {
            order: Box::new(projection),
        }
    } else {
        PaymentStatus::Pending
    };

    Ok(Json(status))
}

/// Download the PDF receipt for a paid order.
///
/// # Route
///
/// `GET /api/orders/{id}/receipt`
#[instrument(skip_all, fields(order_id = %order_id, user_id = %user.id))]
pub async fn receipt(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Response> {
    let currency = state.checkout().currency;
    let projection = load_projection(
        state.pool(),
        order_id,
        &user.id,
        Visibility::PaidOnly,
        currency,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    let receipt = Receipt::from_projection(&projection, currency);
    let file = render_receipt(state.assets(), &receipt, DEFAULT_LOAD_TIMEOUT).await?;

    tracing::info!(bytes = file.bytes.len(), "Receipt rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response())
}
