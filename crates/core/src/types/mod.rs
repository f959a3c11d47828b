//! Core types for CaseCrafters.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod options;
pub mod price;
pub mod pricing;
pub mod status;

pub use id::*;
pub use options::{CaseColor, CaseFinish, CaseMaterial, ConfigurationError, PhoneModel, PriceOptions};
pub use price::{Amount, CurrencyCode, Price};
pub use pricing::PriceTable;
pub use status::*;
