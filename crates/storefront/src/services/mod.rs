//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Order reconciliation and checkout session creation
//! - `payments` - Payment provider (Stripe) client
//! - `identity` - Identity provider OAuth client
//! - `orders` - Order projections for the thank-you, profile and receipt views
//! - `payment_status` - Payment status polling
//! - `receipt` - PDF receipt rendering

pub mod checkout;
pub mod identity;
pub mod orders;
pub mod payment_status;
pub mod payments;
pub mod receipt;

pub use checkout::{CheckoutError, CheckoutSettings, CheckoutStore};
pub use identity::{IdentityClient, IdentityError};
pub use payment_status::{PaymentStatus, PollOutcome, PollerConfig, poll_payment_status};
pub use payments::{PaymentError, PaymentProvider, StripeClient};
pub use receipt::{HttpAssetLoader, Receipt, ReceiptFile, RenderError, render_receipt};
