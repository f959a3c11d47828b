//! Postgres-backed checkout store.
//!
//! The user upsert and the order insert-or-select run in one transaction.
//! Duplicate concurrent checkouts are resolved by the partial unique index
//! `orders_one_unpaid_per_configuration`, not by application locks.

use sqlx::PgPool;

use casecrafters_core::{Amount, ConfigurationId, OrderId};

use super::orders::ORDER_COLUMNS;
use super::{ConfigurationRepository, RepositoryError, users};
use crate::models::{Configuration, CurrentUser, Order};
use crate::services::checkout::{CheckoutStore, ReconciledOrder};

/// How often to retry when the conflicting unpaid order was paid between
/// our insert and select.
const MAX_RECONCILE_ATTEMPTS: usize = 3;

/// Checkout store over the storefront database.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for CheckoutRepository<'_> {
    async fn get_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<Option<Configuration>, RepositoryError> {
        ConfigurationRepository::new(self.pool).get(id).await
    }

    async fn reconcile(
        &self,
        identity: &CurrentUser,
        configuration_id: ConfigurationId,
        amount: Amount,
    ) -> Result<ReconciledOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let user = users::upsert_identity(&mut *tx, identity).await?;

        let insert = format!(
            "INSERT INTO storefront.orders (id, user_id, configuration_id, amount) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, configuration_id) WHERE NOT is_paid DO NOTHING \
             RETURNING {ORDER_COLUMNS}"
        );
        let select = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders \
             WHERE user_id = $1 AND configuration_id = $2 AND NOT is_paid"
        );

        for _ in 0..MAX_RECONCILE_ATTEMPTS {
            let inserted = sqlx::query_as::<_, Order>(&insert)
                .bind(OrderId::generate())
                .bind(&user.id)
                .bind(configuration_id)
                .bind(amount)
                .fetch_optional(&mut *tx)
                .await?;

            if let Some(order) = inserted {
                tx.commit().await?;
                return Ok(ReconciledOrder {
                    user,
                    order,
                    created: true,
                });
            }

            let existing = sqlx::query_as::<_, Order>(&select)
                .bind(&user.id)
                .bind(configuration_id)
                .fetch_optional(&mut *tx)
                .await?;

            if let Some(order) = existing {
                tx.commit().await?;
                return Ok(ReconciledOrder {
                    user,
                    order,
                    created: false,
                });
            }
        }

        Err(RepositoryError::Conflict(format!(
            "unpaid order for configuration {configuration_id} kept changing"
        )))
    }
}
