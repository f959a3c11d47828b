//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    #[default]
    AwaitingShipment,
    Shipped,
    Fulfilled,
}

impl FulfillmentStatus {
    /// Human-readable label (e.g. "Awaiting Shipment").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AwaitingShipment => "Awaiting Shipment",
            Self::Shipped => "Shipped",
            Self::Fulfilled => "Fulfilled",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingShipment => write!(f, "awaiting_shipment"),
            Self::Shipped => write!(f, "shipped"),
            Self::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

impl std::str::FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_shipment" => Ok(Self::AwaitingShipment),
            "shipped" => Ok(Self::Shipped),
            "fulfilled" => Ok(Self::Fulfilled),
            _ => Err(format!("invalid fulfillment status: {s}")),
        }
    }
}

/// Payment confirmation state as observed by a client waiting on an order.
///
/// Only moves forward: `Unknown -> Pending -> Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// No answer yet (order not resolvable).
    #[default]
    Unknown,
    /// Order found but the provider has not confirmed payment.
    Pending,
    /// Order found and paid.
    Confirmed,
}

impl PaymentState {
    /// Whether polling can stop.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Advance to `next`, never moving backwards.
    #[must_use]
    pub fn advance(self, next: Self) -> Self {
        self.max(next)
    }
}

impl PartialOrd for PaymentState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PaymentState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        const fn rank(state: PaymentState) -> u8 {
            match state {
                PaymentState::Unknown => 0,
                PaymentState::Pending => 1,
                PaymentState::Confirmed => 2,
            }
        }
        rank(*self).cmp(&rank(*other))
    }
}
