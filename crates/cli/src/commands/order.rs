//! Order commands.
//!
//! # Usage
//!
//! ```bash
//! # Wait for an order to be paid, as the thank-you page does
//! cc-cli order wait 7f9c... --base-url http://localhost:3000 --cookie "cc_session=..."
//! ```

use std::time::Duration;

use casecrafters_core::{OrderId, PaymentState};
use casecrafters_storefront::services::payment_status::HttpStatusSource;
use casecrafters_storefront::services::{PollOutcome, PollerConfig, poll_payment_status};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::CommandError;

/// Arguments for waiting on an order.
#[derive(Debug, Clone)]
pub struct WaitArgs {
    pub id: OrderId,
    pub base_url: String,
    pub cookie: Option<String>,
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Poll the storefront until the order is paid, Ctrl+C, or the attempt cap.
pub async fn wait(args: WaitArgs) -> Result<(), CommandError> {
    let mut base = args.base_url;
    if !base.ends_with('/') {
        base.push('/');
    }
    let base_url =
        Url::parse(&base).map_err(|e| CommandError::InvalidArgument("base-url", e.to_string()))?;

    let source = HttpStatusSource::new(base_url, args.cookie);
    let config = PollerConfig {
        interval: args.interval,
        max_attempts: args.max_attempts,
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let (updates, mut states) = watch::channel(PaymentState::Unknown);
    let reporter = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            tracing::info!("Payment state: {:?}", state);
        }
    });

    let outcome = poll_payment_status(&source, args.id, config, &cancel, &updates).await;
    drop(updates);
    if let Err(e) = reporter.await {
        tracing::warn!("Payment state reporter failed: {e}");
    }

    match outcome {
        PollOutcome::Confirmed(order) => {
            tracing::info!("Order {} is paid: {}", order.order.id, order.display_amount);
            Ok(())
        }
        PollOutcome::Cancelled => Err(CommandError::NotConfirmed("cancelled".to_string())),
        PollOutcome::Exhausted(state) => Err(CommandError::NotConfirmed(format!(
            "gave up after {} attempts in state {state:?}",
            config.max_attempts
        ))),
    }
}
