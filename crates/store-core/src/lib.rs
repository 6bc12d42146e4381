//! # store-core
//!
//! Shared foundation for the solostore workspace: environment-driven
//! configuration, the single-product catalog entry, and money formatting.
//!
//! Everything this site sells is one fixed product; its Stripe price id
//! comes from the environment while display fallbacks are compiled in, so
//! the storefront stays usable even when the payment provider is down.

mod config;
mod error;
mod product;

pub use config::{AppEnv, CapiConfig, SiteConfig, StripeConfig};
pub use error::ConfigError;
pub use product::{format_amount, ProductInfo, PRODUCT};
