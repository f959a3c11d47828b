//! CaseCrafters CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cc-cli migrate
//!
//! # Create a case configuration
//! cc-cli configuration create --image-url https://... --width 1080 --height 1920 \
//!     --material silicone --finish smooth
//!
//! # Quote a price
//! cc-cli price quote --material polycarbonate --finish textured
//!
//! # Wait for an order to be paid
//! cc-cli order wait <ORDER_ID> --cookie "cc_session=..."
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use casecrafters_core::{CaseColor, CaseFinish, CaseMaterial, OrderId, PhoneModel};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(author, version, about = "CaseCrafters CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage case configurations
    Configuration {
        #[command(subcommand)]
        action: ConfigurationAction,
    },
    /// Price calculator
    Price {
        #[command(subcommand)]
        action: PriceAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ConfigurationAction {
    /// Create a configuration
    Create {
        /// Uploaded image URL
        #[arg(long)]
        image_url: String,

        /// Cropped image URL
        #[arg(long)]
        cropped_image_url: Option<String>,

        /// Image width in pixels
        #[arg(long)]
        width: i32,

        /// Image height in pixels
        #[arg(long)]
        height: i32,

        /// Phone model (e.g. `iphone15`)
        #[arg(long)]
        model: Option<PhoneModel>,

        /// Case color (e.g. `rose`)
        #[arg(long)]
        color: Option<CaseColor>,

        /// Case material (`silicone`, `polycarbonate`)
        #[arg(long)]
        material: Option<CaseMaterial>,

        /// Case finish (`smooth`, `textured`)
        #[arg(long)]
        finish: Option<CaseFinish>,
    },
}

#[derive(Subcommand)]
enum PriceAction {
    /// Quote the price of a material and finish
    Quote {
        #[arg(long)]
        material: CaseMaterial,

        #[arg(long)]
        finish: CaseFinish,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Wait until an order is paid
    Wait {
        /// Order ID
        id: OrderId,

        /// Storefront base URL
        #[arg(long, default_value = "http://localhost:3000")]
        base_url: String,

        /// Session cookie header value of the order's owner
        #[arg(long)]
        cookie: Option<String>,

        /// Milliseconds between checks
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Checks before giving up
        #[arg(long, default_value_t = 120)]
        max_attempts: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Configuration { action } => match action {
            ConfigurationAction::Create {
                image_url,
                cropped_image_url,
                width,
                height,
                model,
                color,
                material,
                finish,
            } => {
                commands::configuration::create(commands::configuration::CreateArgs {
                    image_url,
                    cropped_image_url,
                    width,
                    height,
                    model,
                    color,
                    material,
                    finish,
                })
                .await?;
            }
        },
        Commands::Price { action } => match action {
            PriceAction::Quote { material, finish } => {
                commands::price::quote(material, finish)?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::Wait {
                id,
                base_url,
                cookie,
                interval_ms,
                max_attempts,
            } => {
                commands::order::wait(commands::order::WaitArgs {
                    id,
                    base_url,
                    cookie,
                    interval: Duration::from_millis(interval_ms),
                    max_attempts,
                })
                .await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_wait_parses() {
        let cli = Cli::try_parse_from([
            "cc-cli",
            "order",
            "wait",
            "9061f1dd-4a3c-4a57-9d1e-1f3a8c2b7e10",
            "--interval-ms",
            "250",
        ]);
        assert!(matches!(
            cli.map(|cli| cli.command),
            Ok(Commands::Order {
                action: OrderAction::Wait {
                    interval_ms: 250,
                    max_attempts: 120,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_orders_cannot_be_marked_paid() {
        let cli = Cli::try_parse_from([
            "cc-cli",
            "order",
            "mark-paid",
            "9061f1dd-4a3c-4a57-9d1e-1f3a8c2b7e10",
        ]);
        assert!(cli.is_err());
    }
}
