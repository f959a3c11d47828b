//! Payment status polling.
//!
//! After the hosted payment page redirects back, the shopper waits on the
//! thank-you page while the provider's confirmation lands. The server answers
//! `GET /api/orders/{id}/status`; [`poll_payment_status`] is the client loop
//! that asks at a fixed interval until the order is paid, the caller cancels,
//! or the attempt budget runs out.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

use casecrafters_core::{OrderId, PaymentState};

use crate::models::OrderProjection;

/// Default delay between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default number of checks before giving up (one minute at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// Longest a single status check may take before it counts as failed.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Body of `GET /api/orders/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid { order: Box<OrderProjection> },
}

impl PaymentStatus {
    /// The poller state this answer corresponds to.
    #[must_use]
    pub const fn state(&self) -> PaymentState {
        match self {
            Self::Pending => PaymentState::Pending,
            Self::Paid { .. } => PaymentState::Confirmed,
        }
    }
}

/// Transport failure while checking status.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Unexpected(u16),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("status check timed out")]
    Timeout,
}

/// Something that can answer "is this order paid yet?".
pub trait StatusSource: Send + Sync {
    /// Fetch the current status. `Ok(None)` means the order is not (yet)
    /// resolvable, which the poller treats like "no answer".
    fn fetch(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Option<PaymentStatus>, StatusError>> + Send;
}

/// Status source that calls the storefront's status route.
#[derive(Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    base_url: Url,
    session_cookie: Option<String>,
    request_timeout: Duration,
}

impl HttpStatusSource {
    /// Create a source against `base_url`, optionally authenticated with a
    /// session cookie header value (`cc_session=...`).
    #[must_use]
    pub fn new(base_url: Url, session_cookie: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            session_cookie,
            request_timeout: FETCH_TIMEOUT,
        }
    }

    /// Use a different per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn status_url(&self, order_id: OrderId) -> Result<Url, url::ParseError> {
        self.base_url
            .join(&format!("api/orders/{order_id}/status"))
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&self, order_id: OrderId) -> Result<Option<PaymentStatus>, StatusError> {
        let mut request = self
            .client
            .get(self.status_url(order_id)?)
            .timeout(self.request_timeout);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StatusError::Unexpected(status.as_u16()));
        }

        Ok(Some(response.json().await?))
    }
}

/// Poller timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// How polling ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The order is paid.
    Confirmed(Box<OrderProjection>),
    /// The cancellation token fired (the waiting view went away).
    Cancelled,
    /// The attempt budget ran out; carries the last observed state.
    Exhausted(PaymentState),
}

/// Poll `source` until the order is paid, `cancel` fires, or
/// `config.max_attempts` checks have been made.
///
/// Every state change is published on `updates`. The state never moves
/// backwards: transport errors, timeouts and unresolvable answers leave it
/// unchanged. A check that takes longer than [`FETCH_TIMEOUT`] is abandoned,
/// so the whole poll ends within `max_attempts * (interval + FETCH_TIMEOUT)`.
pub async fn poll_payment_status<S: StatusSource>(
    source: &S,
    order_id: OrderId,
    config: PollerConfig,
    cancel: &CancellationToken,
    updates: &watch::Sender<PaymentState>,
) -> PollOutcome {
    let mut state = *updates.borrow();

    for attempt in 1..=config.max_attempts {
        let answer = tokio::select! {
            biased;
            () = cancel.cancelled() => return PollOutcome::Cancelled,
            answer = tokio::time::timeout(FETCH_TIMEOUT, source.fetch(order_id)) => {
                answer.unwrap_or(Err(StatusError::Timeout))
            }
        };

        match answer {
            Ok(Some(PaymentStatus::Paid { order })) => {
                updates.send_replace(PaymentState::Confirmed);
                tracing::debug!(%order_id, attempt, "Payment confirmed");
                return PollOutcome::Confirmed(order);
            }
            Ok(Some(PaymentStatus::Pending)) => {
                state = state.advance(PaymentState::Pending);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(%order_id, attempt, error = %e, "Status check failed");
            }
        }
        updates.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });

        if attempt == config.max_attempts {
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return PollOutcome::Cancelled,
            () = tokio::time::sleep(config.interval) => {}
        }
    }

    PollOutcome::Exhausted(state)
}
