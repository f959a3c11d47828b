//! Price quotes from the configured price table.
//!
//! # Usage
//!
//! ```bash
//! cc-cli price quote --material polycarbonate --finish textured
//! ```
//!
//! # Environment Variables
//!
//! - `PRICE_*` - Price table overrides (see storefront configuration)
//! - `CHECKOUT_CURRENCY` - Display currency (default `inr`)

use casecrafters_core::{CaseFinish, CaseMaterial, CurrencyCode, Price, PriceOptions};
use casecrafters_storefront::config::price_table_from_env;

use super::CommandError;

/// Read the checkout currency the storefront would use.
pub fn currency_from_env() -> Result<CurrencyCode, CommandError> {
    std::env::var("CHECKOUT_CURRENCY")
        .ok()
        .map_or(Ok(CurrencyCode::INR), |raw| raw.parse())
        .map_err(|e| CommandError::InvalidArgument("CHECKOUT_CURRENCY", e))
}

/// Print the price of a material and finish combination.
pub fn quote(material: CaseMaterial, finish: CaseFinish) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let prices = price_table_from_env()?;
    let currency = currency_from_env()?;
    let amount = prices.compute(PriceOptions { material, finish });

    tracing::info!(
        "{} / {}: {} ({} minor units)",
        material.label(),
        finish.label(),
        Price::new(amount, currency).display(),
        amount.minor()
    );
    Ok(())
}
