//! CaseCrafters Core - Shared types library.
//!
//! This crate provides common types used across all CaseCrafters components:
//! - `storefront` - Checkout, order and receipt HTTP service
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing lives here so the CLI can quote prices
//! with exactly the rules the storefront charges.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, case options, amounts, statuses and the price table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
