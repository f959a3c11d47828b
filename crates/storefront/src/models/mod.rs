//! Domain models for the storefront.
//!
//! Row types double as domain types: every table read here maps 1:1 onto a
//! struct deriving `sqlx::FromRow`, and option columns stay as text until
//! they are parsed at the pricing boundary.

pub mod order;
pub mod session;
pub mod user;

pub use order::{Address, Configuration, Order, OrderProjection, OrderSummary};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
