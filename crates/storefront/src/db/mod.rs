//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `casecrafters`
//!
//! ## Tables (schema `storefront`)
//!
//! - `users` - Local mirror of identity-provider users
//! - `configurations` - Saved case configurations (written by the configurator)
//! - `orders` - One row per checkout attempt; partial unique index keeps at
//!   most one unpaid order per (user, configuration)
//! - `shipping_addresses`, `billing_addresses` - Collected by the payment provider
//! - `webhooks` - Outbound webhook registrations
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p casecrafters-cli -- migrate
//! ```

pub mod checkout;
pub mod configurations;
pub mod orders;
pub mod users;
pub mod webhooks;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use checkout::CheckoutRepository;
pub use configurations::{ConfigurationRepository, NewConfiguration};
pub use orders::OrderRepository;
pub use users::UserRepository;
pub use webhooks::{NewWebhook, WebhookRegistration, WebhookRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation that could not be resolved.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
