//! Read-side assembly of orders with their configuration and addresses.

use sqlx::PgPool;

use casecrafters_core::{CurrencyCode, OrderId, Price, UserId};

use crate::db::orders::AddressKind;
use crate::db::{ConfigurationRepository, OrderRepository, RepositoryError};
use crate::models::{Address, Order, OrderProjection, OrderSummary};

/// Which orders a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Paid or unpaid (payment status checks).
    Any,
    /// Paid only (order details, receipts).
    PaidOnly,
}

/// Load one order owned by `user_id` with its configuration and addresses.
///
/// Returns `None` if the order does not exist, belongs to someone else, or is
/// excluded by `visibility`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
/// Returns `RepositoryError::DataCorruption` if the order's configuration is missing.
pub async fn load_projection(
    pool: &PgPool,
    order_id: OrderId,
    user_id: &UserId,
    visibility: Visibility,
    currency: CurrencyCode,
) -> Result<Option<OrderProjection>, RepositoryError> {
    let orders = OrderRepository::new(pool);
    let order = match visibility {
        Visibility::Any => orders.get_for_user(order_id, user_id).await?,
        Visibility::PaidOnly => orders.get_paid_for_user(order_id, user_id).await?,
    };
    let Some(order) = order else {
        return Ok(None);
    };

    let configuration = ConfigurationRepository::new(pool)
        .get(order.configuration_id)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "order {} references missing configuration {}",
                order.id, order.configuration_id
            ))
        })?;

    let (shipping, billing) = load_addresses(&orders, &order).await?;

    Ok(Some(OrderProjection::new(
        order,
        configuration,
        shipping,
        billing,
        currency,
    )))
}

/// List a user's paid orders, newest first, for the dashboard.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails or a configuration is missing.
pub async fn list_paid_summaries(
    pool: &PgPool,
    user_id: &UserId,
    currency: CurrencyCode,
) -> Result<Vec<OrderSummary>, RepositoryError> {
    let orders = OrderRepository::new(pool);
    let configurations = ConfigurationRepository::new(pool);

    let mut summaries = Vec::new();
    for order in orders.list_paid_for_user(user_id).await? {
        let configuration = configurations
            .get(order.configuration_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {} references missing configuration {}",
                    order.id, order.configuration_id
                ))
            })?;
        let (shipping_address, _) = load_addresses(&orders, &order).await?;

        summaries.push(OrderSummary {
            display_amount: Price::new(order.amount, currency).display(),
            status_label: order.status.label(),
            order,
            configuration,
            shipping_address,
        });
    }

    Ok(summaries)
}

async fn load_addresses(
    orders: &OrderRepository<'_>,
    order: &Order,
) -> Result<(Option<Address>, Option<Address>), RepositoryError> {
    let shipping = match order.shipping_address_id {
        Some(id) => orders.get_address(AddressKind::Shipping, id).await?,
        None => None,
    };
    let billing = match order.billing_address_id {
        Some(id) => orders.get_address(AddressKind::Billing, id).await?,
        None => None,
    };
    Ok((shipping, billing))
}
