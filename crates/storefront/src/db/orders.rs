//! Order repository for database operations.

use sqlx::PgPool;

use casecrafters_core::{AddressId, OrderId, UserId};

use super::RepositoryError;
use crate::models::{Address, Order};

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, configuration_id, amount, is_paid, status, \
     shipping_address_id, billing_address_id, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, name, street, city, postal_code, country, state, phone_number";

/// Which address table to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Shipping,
    Billing,
}

impl AddressKind {
    const fn table(self) -> &'static str {
        match self {
            Self::Shipping => "storefront.shipping_addresses",
            Self::Billing => "storefront.billing_addresses",
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order owned by `user_id`, paid or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: &UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE id = $1 AND user_id = $2");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Get a paid order owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_paid_for_user(
        &self,
        id: OrderId,
        user_id: &UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders \
             WHERE id = $1 AND user_id = $2 AND is_paid"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// List a user's paid orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_paid_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders \
             WHERE user_id = $1 AND is_paid \
             ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(orders)
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_address(
        &self,
        kind: AddressKind,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM {} WHERE id = $1", kind.table());
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(address)
    }
}
