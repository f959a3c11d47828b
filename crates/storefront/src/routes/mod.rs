//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Auth
//! GET  /api/auth/login              - Redirect to the identity provider
//! GET  /api/auth/callback           - Handle the OAuth callback
//! GET  /api/auth/logout             - Sign out
//!
//! # Checkout (requires auth)
//! POST /api/checkout                - Reconcile order, open payment session
//!
//! # Orders (requires auth)
//! GET  /api/orders/{id}/status      - Payment status for the thank-you page
//! GET  /api/orders/{id}/receipt     - PDF receipt for a paid order
//!
//! # Profile (requires auth)
//! GET  /api/profile                 - Shopper and paid orders
//! GET  /api/profile/orders/{id}     - Paid order details
//!
//! # Webhooks
//! POST /api/webhooks/receive        - Inbound events (shared secret)
//! POST /api/webhooks/register       - Register a webhook target
//! ```

pub mod auth;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod profile;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/status", get(orders::status))
        .route("/{id}/receipt", get(orders::receipt))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show))
        .route("/orders/{id}", get(profile::order))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/receive", post(webhooks::receive))
        .route("/register", post(webhooks::register))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes())
        .route("/api/checkout", post(checkout::create))
        .nest("/api/orders", order_routes())
        .nest("/api/profile", profile_routes())
        .nest("/api/webhooks", webhook_routes())
}
