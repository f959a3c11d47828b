//! Storefront configuration loaded from environment variables.
//!
//! Loaded once at startup into an immutable [`StorefrontConfig`] and handed to
//! components through `AppState`. Nothing reads the environment after boot.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of the shop front end (redirect targets)
//! - `IDENTITY_ISSUER_URL` - Identity provider base URL (e.g. `https://shop.kinde.com`)
//! - `IDENTITY_CLIENT_ID` - OAuth client ID
//! - `IDENTITY_CLIENT_SECRET` - OAuth client secret
//! - `STRIPE_SECRET_KEY` - Payment provider secret API key
//! - `EXTERNAL_WEBHOOK_SECRET` - Shared secret expected in `x-webhook-secret`
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STRIPE_API_BASE` - Payment API base URL (default: <https://api.stripe.com>)
//! - `CHECKOUT_CURRENCY` - Charge currency (default: inr)
//! - `CHECKOUT_SHIPPING_COUNTRIES` - Comma-separated ISO codes (default: DE,US)
//! - `PAYMENT_TIMEOUT_SECS` - Per-request timeout for the payment API (default: 10)
//! - `PAYMENT_MAX_RETRIES` - Retries after the first attempt (default: 2)
//! - `PRICE_BASE`, `PRICE_TEXTURED_SURCHARGE`, `PRICE_POLYCARBONATE_SURCHARGE`,
//!   `PRICE_MINIMUM` - Price table in minor units (defaults: 4000, 4500, 20000, 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use casecrafters_core::{Amount, CurrencyCode, PriceTable};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the shop (no trailing slash)
    pub base_url: String,
    /// Identity provider OAuth configuration
    pub identity: IdentityConfig,
    /// Payment provider and checkout configuration
    pub payments: PaymentConfig,
    /// Price table used for new orders
    pub prices: PriceTable,
    /// Shared secret for inbound webhooks
    pub webhook_secret: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Provider base URL; authorize/token/profile endpoints hang off it
    pub issuer_url: Url,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("issuer_url", &self.issuer_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Payment provider configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Secret API key
    pub secret_key: SecretString,
    /// API base URL
    pub api_base: Url,
    /// Currency all checkouts are charged in
    pub currency: CurrencyCode,
    /// Countries the hosted page accepts shipping addresses for
    pub shipping_countries: Vec<String>,
    /// Timeout applied to each outbound request
    pub request_timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base.as_str())
            .field("currency", &self.currency)
            .field("shipping_countries", &self.shipping_countries)
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let identity = IdentityConfig::from_env()?;
        let payments = PaymentConfig::from_env()?;
        let prices = price_table_from_env()?;
        let webhook_secret = get_validated_secret("EXTERNAL_WEBHOOK_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            identity,
            payments,
            prices,
            webhook_secret,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public site is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            issuer_url: get_url("IDENTITY_ISSUER_URL", None)?,
            client_id: get_required_env("IDENTITY_CLIENT_ID")?,
            client_secret: get_validated_secret("IDENTITY_CLIENT_SECRET")?,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let currency = get_env_or_default("CHECKOUT_CURRENCY", "inr")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_CURRENCY".to_string(), e))?;
        let shipping_countries =
            parse_country_list(&get_env_or_default("CHECKOUT_SHIPPING_COUNTRIES", "DE,US"))
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("CHECKOUT_SHIPPING_COUNTRIES".to_string(), e)
                })?;
        let timeout_secs = parse_env_or_default::<u64>("PAYMENT_TIMEOUT_SECS", "10")?;

        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            api_base: get_url("STRIPE_API_BASE", Some("https://api.stripe.com"))?,
            currency,
            shipping_countries,
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries: parse_env_or_default("PAYMENT_MAX_RETRIES", "2")?,
        })
    }
}

/// Load the price table from `PRICE_*` variables, falling back to defaults.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a value is not a non-negative
/// integer or the table would price every case at zero.
pub fn price_table_from_env() -> Result<PriceTable, ConfigError> {
    let defaults = PriceTable::default();
    let amount = |key: &str, default: Amount| -> Result<Amount, ConfigError> {
        let value = parse_env_or_default::<i64>(key, &default.minor().to_string())?;
        if value < 0 {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must not be negative".to_string(),
            ));
        }
        Ok(Amount::from_minor(value))
    };

    let table = PriceTable {
        base: amount("PRICE_BASE", defaults.base)?,
        textured_surcharge: amount("PRICE_TEXTURED_SURCHARGE", defaults.textured_surcharge)?,
        polycarbonate_surcharge: amount(
            "PRICE_POLYCARBONATE_SURCHARGE",
            defaults.polycarbonate_surcharge,
        )?,
        minimum: amount("PRICE_MINIMUM", defaults.minimum)?,
    };

    if table.minimum.minor() == 0 && table.base.minor() == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "PRICE_MINIMUM".to_string(),
            "base price and minimum cannot both be zero".to_string(),
        ));
    }

    Ok(table)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a URL-valued environment variable.
fn get_url(key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
    let raw = match default {
        Some(default) => get_env_or_default(key, default),
        None => get_required_env(key)?,
    };
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a comma-separated list of two-letter country codes.
fn parse_country_list(raw: &str) -> Result<Vec<String>, String> {
    let countries: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_ascii_uppercase)
        .collect();

    if countries.is_empty() {
        return Err("at least one country is required".to_string());
    }
    if let Some(bad) = countries
        .iter()
        .find(|c| c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_alphabetic()))
    {
        return Err(format!("not an ISO 3166 alpha-2 code: {bad}"));
    }
    Ok(countries)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            identity: IdentityConfig {
                issuer_url: Url::parse("https://casecrafters.kinde.com").unwrap(),
                client_id: "client_id_value".to_string(),
                client_secret: SecretString::from("super_secret_client_secret"),
            },
            payments: PaymentConfig {
                secret_key: SecretString::from("sk_test_super_secret_key"),
                api_base: Url::parse("https://api.stripe.com").unwrap(),
                currency: CurrencyCode::INR,
                shipping_countries: vec!["DE".to_string(), "US".to_string()],
                request_timeout: Duration::from_secs(10),
                max_retries: 2,
            },
            prices: PriceTable::default(),
            webhook_secret: SecretString::from("whk_9fQ2xL7pR4mZ"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-webhook-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk_test_51Hx9QpL2mZ7vR4tK8wY", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_country_list() {
        assert_eq!(
            parse_country_list("de, us").unwrap(),
            vec!["DE".to_string(), "US".to_string()]
        );
        assert!(parse_country_list("").is_err());
        assert!(parse_country_list("DEU").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());

        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
        assert!(!debug_output.contains("sk_test_super_secret_key"));
    }
}
