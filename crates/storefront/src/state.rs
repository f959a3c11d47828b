//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::checkout::CheckoutSettings;
use crate::services::{HttpAssetLoader, IdentityClient, PaymentError, StripeClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the immutable configuration, the
/// database pool and the outbound clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    checkout: CheckoutSettings,
    payments: StripeClient,
    identity: IdentityClient,
    assets: HttpAssetLoader,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let payments = StripeClient::new(&config.payments)?;
        let identity = IdentityClient::new(&config.identity);
        let checkout = CheckoutSettings::from_config(&config);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                checkout,
                payments,
                identity,
                assets: HttpAssetLoader::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Checkout URLs, currency and shipping countries.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutSettings {
        &self.inner.checkout
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn payments(&self) -> &StripeClient {
        &self.inner.payments
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the receipt image loader.
    #[must_use]
    pub fn assets(&self) -> &HttpAssetLoader {
        &self.inner.assets
    }
}
