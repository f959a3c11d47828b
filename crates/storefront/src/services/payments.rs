//! Payment provider client.
//!
//! The hosted checkout page is owned by Stripe. We only create sessions; the
//! provider collects card details and addresses and later reports payment.
//!
//! Stripe's checkout API takes `application/x-www-form-urlencoded` bodies with
//! bracketed keys for nested objects (`line_items[0][price_data][currency]`).

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use casecrafters_core::{Amount, CurrencyCode};

use crate::config::PaymentConfig;

/// Stripe API version pinned for request/response shapes.
const API_VERSION: &str = "2024-06-20";

/// Delay before the first retry; doubled for each later attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed (timeout, connection, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider created a session without a hosted page URL.
    #[error("checkout session {0} has no URL")]
    MissingUrl(String),

    /// Failed to parse the response or build the client.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Everything the provider needs to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub currency: CurrencyCode,
    pub unit_amount: Amount,
    pub product_name: String,
    pub product_image: Option<String>,
    pub shipping_countries: Vec<String>,
    pub metadata: Vec<(String, String)>,
}

impl CheckoutSessionRequest {
    /// Encode as Stripe form fields.
    #[must_use]
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[]".to_string(), "card".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        if let Some(email) = &self.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }

        for country in &self.shipping_countries {
            form.push((
                "shipping_address_collection[allowed_countries][]".to_string(),
                country.clone(),
            ));
        }

        let item = "line_items[0]";
        form.push((format!("{item}[quantity]"), "1".to_string()));
        form.push((
            format!("{item}[price_data][currency]"),
            self.currency.as_lower().to_string(),
        ));
        form.push((
            format!("{item}[price_data][unit_amount]"),
            self.unit_amount.minor().to_string(),
        ));
        form.push((
            format!("{item}[price_data][product_data][name]"),
            self.product_name.clone(),
        ));
        if let Some(image) = &self.product_image {
            form.push((
                format!("{item}[price_data][product_data][images][]"),
                image.clone(),
            ));
        }

        for (key, value) in &self.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        form
    }
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted page URL. Absent for embedded sessions.
    pub url: Option<String>,
}

/// A payment provider that can open hosted checkout sessions.
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session.
    fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> impl Future<Output = Result<CheckoutSession, PaymentError>> + Send;
}

/// Stripe REST client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    sessions_url: Url,
    max_retries: u32,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Stripe-Version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let sessions_url = config
            .api_base
            .join("v1/checkout/sessions")
            .map_err(|e| PaymentError::Parse(format!("Invalid API base: {e}")))?;

        Ok(Self {
            client,
            sessions_url,
            max_retries: config.max_retries,
        })
    }
}

impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = request.to_form();
        // One key for every attempt so a retried create never opens two sessions.
        let idempotency_key = uuid::Uuid::new_v4().to_string();
        let mut attempt = 0;

        loop {
            let result = self
                .client
                .post(self.sessions_url.clone())
                .header("Idempotency-Key", &idempotency_key)
                .form(&form)
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<CheckoutSession>()
                        .await
                        .map_err(|e| PaymentError::Parse(e.to_string()));
                }
                Ok(response) => {
                    let status = response.status();
                    let message = response.text().await.unwrap_or_default();
                    let error = PaymentError::Api {
                        status: status.as_u16(),
                        message,
                    };
                    if !is_retryable_status(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_timeout() || e.is_connect() => PaymentError::Http(e),
                Err(e) => return Err(PaymentError::Http(e)),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }

            let delay = retry_delay(attempt);
            tracing::warn!(
                attempt = attempt + 1,
                ?delay,
                error = %error,
                "Retrying checkout session creation"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Statuses worth retrying: rate limiting and server-side failures.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            success_url: "http://localhost:3000/thank-you?orderId=o1".to_string(),
            cancel_url: "http://localhost:3000/configure/preview?id=c1".to_string(),
            customer_email: Some("asha@example.com".to_string()),
            currency: CurrencyCode::INR,
            unit_amount: Amount::from_minor(28_500),
            product_name: "Custom iPhone Case".to_string(),
            product_image: Some("https://cdn.casecrafters.in/u/cropped.png".to_string()),
            shipping_countries: vec!["DE".to_string(), "US".to_string()],
            metadata: vec![
                ("userId".to_string(), "kp_1".to_string()),
                ("orderId".to_string(), "o1".to_string()),
            ],
        }
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        form.iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn test_form_has_payment_mode_and_card() {
        let form = request().to_form();
        assert_eq!(value(&form, "mode"), ["payment"]);
        assert_eq!(value(&form, "payment_method_types[]"), ["card"]);
    }

    #[test]
    fn test_form_line_item_carries_amount_and_currency() {
        let form = request().to_form();
        assert_eq!(value(&form, "line_items[0][quantity]"), ["1"]);
        assert_eq!(value(&form, "line_items[0][price_data][currency]"), ["inr"]);
        assert_eq!(value(&form, "line_items[0][price_data][unit_amount]"), ["28500"]);
        assert_eq!(
            value(&form, "line_items[0][price_data][product_data][name]"),
            ["Custom iPhone Case"]
        );
    }

    #[test]
    fn test_form_lists_every_shipping_country() {
        let form = request().to_form();
        assert_eq!(
            value(&form, "shipping_address_collection[allowed_countries][]"),
            ["DE", "US"]
        );
    }

    #[test]
    fn test_form_metadata_correlates_user_and_order() {
        let form = request().to_form();
        assert_eq!(value(&form, "metadata[userId]"), ["kp_1"]);
        assert_eq!(value(&form, "metadata[orderId]"), ["o1"]);
    }

    #[test]
    fn test_form_omits_absent_email() {
        let mut req = request();
        req.customer_email = None;
        let form = req.to_form();
        assert!(value(&form, "customer_email").is_empty());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_retry_delay_doubles() {
        assert_eq!(retry_delay(0), Duration::from_millis(250));
        assert_eq!(retry_delay(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_client_targets_sessions_endpoint() {
        let config = crate::config::tests::test_config();
        let client = StripeClient::new(&config.payments).unwrap();
        assert_eq!(
            client.sessions_url.as_str(),
            "https://api.stripe.com/v1/checkout/sessions"
        );
    }
}
