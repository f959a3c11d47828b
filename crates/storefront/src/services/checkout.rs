//! Order reconciliation and checkout session creation.
//!
//! Checkout is two steps. [`reconcile_order`] prices the configuration and
//! finds or creates the single unpaid order for (user, configuration) inside
//! one transaction. [`create_checkout_session`] then asks the payment
//! provider for a hosted page for that order. The second step mutates no
//! local state, so the whole flow can be retried by the shopper.

use std::future::Future;

use thiserror::Error;
use tracing::instrument;

use casecrafters_core::{
    Amount, ConfigurationError, ConfigurationId, CurrencyCode, PriceTable,
};

use crate::config::StorefrontConfig;
use crate::db::RepositoryError;
use crate::models::{Configuration, CurrentUser, Order, User};
use crate::services::payments::{CheckoutSessionRequest, PaymentError, PaymentProvider};

/// Product name shown on the hosted checkout page.
pub const PRODUCT_NAME: &str = "Custom iPhone Case";

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("configuration not found")]
    ConfigurationNotFound,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Result of reconciling an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledOrder {
    pub user: User,
    pub order: Order,
    /// `false` when an existing unpaid order was reused.
    pub created: bool,
}

/// Persistence needed by checkout.
pub trait CheckoutStore: Send + Sync {
    /// Load a configuration.
    fn get_configuration(
        &self,
        id: ConfigurationId,
    ) -> impl Future<Output = Result<Option<Configuration>, RepositoryError>> + Send;

    /// Atomically ensure the user row exists and return the unpaid order for
    /// (user, configuration), creating it with `amount` if there is none.
    ///
    /// Implementations must guarantee that concurrent calls with the same
    /// arguments observe the same order.
    fn reconcile(
        &self,
        identity: &CurrentUser,
        configuration_id: ConfigurationId,
        amount: Amount,
    ) -> impl Future<Output = Result<ReconciledOrder, RepositoryError>> + Send;
}

/// Settings for building checkout sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Public base URL without trailing slash.
    pub base_url: String,
    pub currency: CurrencyCode,
    pub shipping_countries: Vec<String>,
}

impl CheckoutSettings {
    /// Build from the storefront configuration.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            currency: config.payments.currency,
            shipping_countries: config.payments.shipping_countries.clone(),
        }
    }

    /// Where the provider sends the shopper after paying.
    #[must_use]
    pub fn success_url(&self, order: &Order) -> String {
        format!("{}/thank-you?orderId={}", self.base_url, order.id)
    }

    /// Where the provider sends the shopper on cancel.
    #[must_use]
    pub fn cancel_url(&self, configuration_id: ConfigurationId) -> String {
        format!("{}/configure/preview?id={configuration_id}", self.base_url)
    }
}

/// Find or create the unpaid order for this shopper and configuration.
///
/// # Errors
///
/// Returns `CheckoutError::ConfigurationNotFound` if the configuration does not exist.
/// Returns `CheckoutError::InvalidConfiguration` if material or finish is missing or unknown.
/// Returns `CheckoutError::Repository` if persistence fails.
#[instrument(skip(store, prices, identity), fields(user_id = %identity.id))]
pub async fn reconcile_order<S: CheckoutStore>(
    store: &S,
    prices: &PriceTable,
    configuration_id: ConfigurationId,
    identity: &CurrentUser,
) -> Result<(ReconciledOrder, Configuration), CheckoutError> {
    let configuration = store
        .get_configuration(configuration_id)
        .await?
        .ok_or(CheckoutError::ConfigurationNotFound)?;

    let amount = prices.compute(configuration.price_options()?);
    let reconciled = store.reconcile(identity, configuration_id, amount).await?;

    if reconciled.created {
        tracing::info!(order_id = %reconciled.order.id, %amount, "Created order");
    } else if reconciled.order.amount != amount {
        // The stored amount wins; the shopper pays what the order was opened at.
        tracing::info!(
            order_id = %reconciled.order.id,
            stored = %reconciled.order.amount,
            current = %amount,
            "Reusing order with a stale price"
        );
    }

    Ok((reconciled, configuration))
}

/// Open a hosted checkout page for `order` and return its URL.
///
/// # Errors
///
/// Returns `CheckoutError::Payment` if the provider fails or returns a
/// session without a URL.
#[instrument(skip_all, fields(order_id = %order.id))]
pub async fn create_checkout_session<P: PaymentProvider>(
    provider: &P,
    settings: &CheckoutSettings,
    user: &User,
    order: &Order,
    configuration: &Configuration,
) -> Result<String, CheckoutError> {
    let request = CheckoutSessionRequest {
        success_url: settings.success_url(order),
        cancel_url: settings.cancel_url(configuration.id),
        customer_email: Some(user.email.clone()).filter(|email| !email.is_empty()),
        currency: settings.currency,
        unit_amount: order.amount,
        product_name: PRODUCT_NAME.to_string(),
        product_image: Some(configuration.preview_image_url().to_string()),
        shipping_countries: settings.shipping_countries.clone(),
        metadata: vec![
            ("userId".to_string(), user.id.to_string()),
            ("orderId".to_string(), order.id.to_string()),
        ],
    };

    let session = provider.create_checkout_session(&request).await?;
    let url = session
        .url
        .ok_or(PaymentError::MissingUrl(session.id))?;

    Ok(url)
}

/// Reconcile the order, then open a checkout session for it.
///
/// # Errors
///
/// See [`reconcile_order`] and [`create_checkout_session`].
pub async fn start_checkout<S, P>(
    store: &S,
    provider: &P,
    prices: &PriceTable,
    settings: &CheckoutSettings,
    configuration_id: ConfigurationId,
    identity: &CurrentUser,
) -> Result<String, CheckoutError>
where
    S: CheckoutStore,
    P: PaymentProvider,
{
    let (reconciled, configuration) =
        reconcile_order(store, prices, configuration_id, identity).await?;
    create_checkout_session(
        provider,
        settings,
        &reconciled.user,
        &reconciled.order,
        &configuration,
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use casecrafters_core::{FulfillmentStatus, OrderId, UserId};

    use super::*;
    use crate::models::order::tests::configuration;
    use crate::services::payments::CheckoutSession;

    /// Checkout store backed by a mutex; the lock plays the role of the
    /// transaction plus unique index.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        configurations: Mutex<HashMap<ConfigurationId, Configuration>>,
        users: Mutex<HashMap<UserId, User>>,
        pub(crate) orders: Mutex<Vec<Order>>,
        pub(crate) fail: bool,
    }

    impl MemoryStore {
        pub(crate) fn with(configuration: Configuration) -> Self {
            let store = Self::default();
            store
                .configurations
                .lock()
                .unwrap()
                .insert(configuration.id, configuration);
            store
        }
    }

    impl CheckoutStore for MemoryStore {
        async fn get_configuration(
            &self,
            id: ConfigurationId,
        ) -> Result<Option<Configuration>, RepositoryError> {
            Ok(self.configurations.lock().unwrap().get(&id).cloned())
        }

        async fn reconcile(
            &self,
            identity: &CurrentUser,
            configuration_id: ConfigurationId,
            amount: Amount,
        ) -> Result<ReconciledOrder, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Conflict("store unavailable".to_string()));
            }
            let now = Utc::now();
            let user = self
                .users
                .lock()
                .unwrap()
                .entry(identity.id.clone())
                .or_insert_with(|| User {
                    id: identity.id.clone(),
                    email: identity.email_or_empty().to_string(),
                    created_at: now,
                    updated_at: now,
                })
                .clone();

            let mut orders = self.orders.lock().unwrap();
            if let Some(order) = orders
                .iter()
                .find(|o| o.user_id == user.id && o.configuration_id == configuration_id && !o.is_paid)
            {
                return Ok(ReconciledOrder {
                    user,
                    order: order.clone(),
                    created: false,
                });
            }

            let order = Order {
                id: OrderId::generate(),
                user_id: user.id.clone(),
                configuration_id,
                amount,
                is_paid: false,
                status: FulfillmentStatus::AwaitingShipment,
                shipping_address_id: None,
                billing_address_id: None,
                created_at: now,
                updated_at: now,
            };
            orders.push(order.clone());
            Ok(ReconciledOrder {
                user,
                order,
                created: true,
            })
        }
    }

    /// Payment provider that records requests.
    #[derive(Default)]
    pub(crate) struct RecordingProvider {
        pub(crate) requests: Mutex<Vec<CheckoutSessionRequest>>,
        pub(crate) omit_url: bool,
    }

    impl PaymentProvider for RecordingProvider {
        async fn create_checkout_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            let id = format!("cs_test_{}", requests.len());
            let url = (!self.omit_url).then(|| format!("https://checkout.stripe.com/c/pay/{id}"));
            Ok(CheckoutSession { id, url })
        }
    }

    fn identity() -> CurrentUser {
        CurrentUser {
            id: UserId::new("kp_asha"),
            email: Some("asha@example.com".to_string()),
            given_name: Some("Asha".to_string()),
            family_name: None,
        }
    }

    fn settings() -> CheckoutSettings {
        CheckoutSettings::from_config(&crate::config::tests::test_config())
    }

    #[tokio::test]
    async fn test_reconcile_creates_order_at_computed_price() {
        let config = configuration(Some("polycarbonate"), Some("textured"));
        let store = MemoryStore::with(config.clone());

        let (reconciled, _) = reconcile_order(&store, &PriceTable::default(), config.id, &identity())
            .await
            .unwrap();

        assert!(reconciled.created);
        assert_eq!(reconciled.order.amount, Amount::from_minor(28_500));
        assert!(!reconciled.order.is_paid);
        assert_eq!(reconciled.user.email, "asha@example.com");
    }

    #[tokio::test]
    async fn test_reconcile_twice_reuses_the_unpaid_order() {
        let config = configuration(Some("silicone"), Some("smooth"));
        let store = MemoryStore::with(config.clone());
        let prices = PriceTable::default();

        let (first, _) = reconcile_order(&store, &prices, config.id, &identity()).await.unwrap();
        let (second, _) = reconcile_order(&store, &prices, config.id, &identity()).await.unwrap();

        assert_eq!(first.order.id, second.order.id);
        assert_eq!(first.user, second.user);
        assert!(!second.created);
        assert_eq!(store.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_after_payment_creates_a_new_order() {
        let config = configuration(Some("silicone"), Some("smooth"));
        let store = MemoryStore::with(config.clone());
        let prices = PriceTable::default();

        let (first, _) = reconcile_order(&store, &prices, config.id, &identity()).await.unwrap();
        store.orders.lock().unwrap()[0].is_paid = true;
        let (second, _) = reconcile_order(&store, &prices, config.id, &identity()).await.unwrap();

        assert_ne!(first.order.id, second.order.id);
        assert!(second.created);
    }

    #[tokio::test]
    async fn test_reuse_keeps_stored_amount() {
        let config = configuration(Some("polycarbonate"), Some("smooth"));
        let store = MemoryStore::with(config.clone());

        let (first, _) = reconcile_order(&store, &PriceTable::default(), config.id, &identity())
            .await
            .unwrap();

        let raised = PriceTable {
            base: Amount::from_minor(9_000),
            ..PriceTable::default()
        };
        let (second, _) = reconcile_order(&store, &raised, config.id, &identity()).await.unwrap();

        assert_eq!(second.order.amount, first.order.amount);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reconciles_yield_one_order() {
        let config = configuration(Some("polycarbonate"), Some("textured"));
        let store = Arc::new(MemoryStore::with(config.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = config.id;
                tokio::spawn(async move {
                    reconcile_order(store.as_ref(), &PriceTable::default(), id, &identity())
                        .await
                        .map(|(r, _)| r.order.id)
                })
            })
            .collect();

        let ids: Vec<OrderId> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_configuration_is_not_found() {
        let store = MemoryStore::default();
        let result =
            reconcile_order(&store, &PriceTable::default(), ConfigurationId::generate(), &identity())
                .await;
        assert!(matches!(result, Err(CheckoutError::ConfigurationNotFound)));
    }

    #[tokio::test]
    async fn test_missing_finish_is_invalid_and_writes_nothing() {
        let config = configuration(Some("silicone"), None);
        let store = MemoryStore::with(config.clone());

        let result = reconcile_order(&store, &PriceTable::default(), config.id, &identity()).await;

        assert!(matches!(result, Err(CheckoutError::InvalidConfiguration(_))));
        assert!(store.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_repository_error() {
        let config = configuration(Some("silicone"), Some("smooth"));
        let mut store = MemoryStore::with(config.clone());
        store.fail = true;

        let result = reconcile_order(&store, &PriceTable::default(), config.id, &identity()).await;
        assert!(matches!(result, Err(CheckoutError::Repository(_))));
    }

    #[tokio::test]
    async fn test_session_request_correlates_order() {
        let config = configuration(Some("polycarbonate"), Some("textured"));
        let store = MemoryStore::with(config.clone());
        let provider = RecordingProvider::default();

        let url = start_checkout(
            &store,
            &provider,
            &PriceTable::default(),
            &settings(),
            config.id,
            &identity(),
        )
        .await
        .unwrap();
        assert!(url.starts_with("https://checkout.stripe.com/"));

        let order = store.orders.lock().unwrap()[0].clone();
        let requests = provider.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(
            request.success_url,
            format!("http://localhost:3000/thank-you?orderId={}", order.id)
        );
        assert_eq!(
            request.cancel_url,
            format!("http://localhost:3000/configure/preview?id={}", config.id)
        );
        assert_eq!(request.unit_amount, Amount::from_minor(28_500));
        assert_eq!(request.currency, CurrencyCode::INR);
        assert_eq!(request.product_name, PRODUCT_NAME);
        assert_eq!(request.shipping_countries, ["DE", "US"]);
        assert!(request.metadata.contains(&("orderId".to_string(), order.id.to_string())));
        assert!(request.metadata.contains(&("userId".to_string(), "kp_asha".to_string())));
    }

    #[tokio::test]
    async fn test_session_without_url_is_provider_error() {
        let config = configuration(Some("silicone"), Some("smooth"));
        let store = MemoryStore::with(config.clone());
        let provider = RecordingProvider {
            omit_url: true,
            ..RecordingProvider::default()
        };

        let result = start_checkout(
            &store,
            &provider,
            &PriceTable::default(),
            &settings(),
            config.id,
            &identity(),
        )
        .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Payment(PaymentError::MissingUrl(_)))
        ));
    }

    #[tokio::test]
    async fn test_retrying_checkout_reuses_order_and_opens_new_session() {
        let config = configuration(Some("silicone"), Some("textured"));
        let store = MemoryStore::with(config.clone());
        let provider = RecordingProvider::default();
        let prices = PriceTable::default();

        let first = start_checkout(&store, &provider, &prices, &settings(), config.id, &identity())
            .await
            .unwrap();
        let second = start_checkout(&store, &provider, &prices, &settings(), config.id, &identity())
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(store.orders.lock().unwrap().len(), 1);
    }
}
