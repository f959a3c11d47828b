//! Case configuration commands.
//!
//! The configurator front end normally writes configurations; this command
//! creates one directly for testing checkout.
//!
//! # Usage
//!
//! ```bash
//! cc-cli configuration create \
//!     --image-url https://cdn.example.com/u/original.png \
//!     --width 1080 --height 1920 \
//!     --model iphone15 --color rose --material polycarbonate --finish textured
//! ```

use casecrafters_core::{CaseColor, CaseFinish, CaseMaterial, PhoneModel, Price, PriceOptions};
use casecrafters_storefront::config::price_table_from_env;
use casecrafters_storefront::db::{ConfigurationRepository, NewConfiguration};

use super::price::currency_from_env;
use super::{CommandError, connect};

/// Arguments for a new configuration.
#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub image_url: String,
    pub cropped_image_url: Option<String>,
    pub width: i32,
    pub height: i32,
    pub model: Option<PhoneModel>,
    pub color: Option<CaseColor>,
    pub material: Option<CaseMaterial>,
    pub finish: Option<CaseFinish>,
}

/// Create a configuration and print its id and current price.
pub async fn create(args: CreateArgs) -> Result<(), CommandError> {
    if args.width <= 0 || args.height <= 0 {
        return Err(CommandError::InvalidArgument(
            "width/height",
            "image dimensions must be positive".to_string(),
        ));
    }
    if args.image_url.trim().is_empty() {
        return Err(CommandError::InvalidArgument(
            "image-url",
            "must not be empty".to_string(),
        ));
    }

    let pool = connect().await?;
    let configuration = ConfigurationRepository::new(&pool)
        .create(&NewConfiguration {
            width: args.width,
            height: args.height,
            image_url: args.image_url,
            cropped_image_url: args.cropped_image_url,
            color: args.color,
            model: args.model,
            material: args.material,
            finish: args.finish,
        })
        .await?;

    tracing::info!("Configuration created: {}", configuration.id);

    if let (Some(material), Some(finish)) = (args.material, args.finish) {
        let prices = price_table_from_env()?;
        let amount = prices.compute(PriceOptions { material, finish });
        let currency = currency_from_env()?;
        tracing::info!("  Price: {}", Price::new(amount, currency).display());
    } else {
        tracing::warn!("Material and finish are required before checkout");
    }

    Ok(())
}
