//! Outbound webhook registrations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use casecrafters_core::WebhookId;

use super::RepositoryError;

/// A stored webhook registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    pub id: WebhookId,
    pub event_type: String,
    pub url: String,
    pub secret: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a new registration. All fields are required and non-empty.
#[derive(Debug, Clone)]
pub struct NewWebhook {
    pub event_type: String,
    pub url: String,
    pub secret: String,
}

/// Repository for webhook registrations.
pub struct WebhookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WebhookRepository<'a> {
    /// Create a new webhook repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a registration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewWebhook) -> Result<WebhookRegistration, RepositoryError> {
        let webhook = sqlx::query_as::<_, WebhookRegistration>(
            r"
            INSERT INTO storefront.webhooks (id, event_type, url, secret)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_type, url, secret, created_at
            ",
        )
        .bind(WebhookId::generate())
        .bind(&new.event_type)
        .bind(&new.url)
        .bind(&new.secret)
        .fetch_one(self.pool)
        .await?;

        Ok(webhook)
    }
}
