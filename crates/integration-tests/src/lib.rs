//! Integration tests for CaseCrafters.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests (no database needed)
//! cargo test -p casecrafters-integration-tests
//!
//! # Including Postgres-backed tests
//! TEST_DATABASE_URL=postgres://localhost/casecrafters_test \
//!     cargo test -p casecrafters-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `webhooks` - Webhook receiver and registration over the router
//! - `auth` - Authentication rejection, health and request IDs
//! - `reconcile` - Concurrent order reconciliation against Postgres

use std::time::Duration;

use axum::{Router, body::Body, http::Response};
use casecrafters_core::{CurrencyCode, PriceTable};
use casecrafters_storefront::config::{IdentityConfig, PaymentConfig, StorefrontConfig};
use casecrafters_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use url::Url;

/// Shared secret the test router expects on inbound webhooks.
pub const WEBHOOK_SECRET: &str = "whk_9fQ2xL7pR4mZ";

/// Database URL for tests marked `#[ignore]`.
///
/// # Panics
///
/// Panics if `TEST_DATABASE_URL` is not set.
#[must_use]
pub fn test_database_url() -> String {
    std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for database tests")
}

/// A configuration that never reaches real providers.
///
/// # Panics
///
/// Panics if a hard-coded URL fails to parse.
#[must_use]
pub fn test_config(database_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from(database_url.to_string()),
        host: "127.0.0.1".parse().expect("valid host"),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        identity: IdentityConfig {
            issuer_url: Url::parse("https://casecrafters.kinde.com").expect("valid URL"),
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
        },
        payments: PaymentConfig {
            secret_key: SecretString::from("sk_test_super_secret_key"),
            api_base: Url::parse("http://127.0.0.1:9").expect("valid URL"),
            currency: CurrencyCode::INR,
            shipping_countries: vec!["DE".to_string(), "US".to_string()],
            request_timeout: Duration::from_secs(1),
            max_retries: 0,
        },
        prices: PriceTable::default(),
        webhook_secret: SecretString::from(WEBHOOK_SECRET),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Build the full application router over a pool that connects on first use.
///
/// Requests that never touch the database work without one.
///
/// # Panics
///
/// Panics if the state cannot be built.
#[must_use]
pub fn lazy_app() -> Router {
    let database_url = "postgres://localhost/casecrafters_unused";
    let pool = PgPool::connect_lazy(database_url).expect("lazy pool");
    let state = AppState::new(test_config(database_url), pool).expect("app state");
    casecrafters_storefront::app(state)
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body cannot be read or is not JSON.
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
