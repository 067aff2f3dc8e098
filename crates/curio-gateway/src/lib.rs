//! HTTP payment gateway for the Curio checkout.
//!
//! This crate provides:
//! - `HttpGateway` - `PaymentGateway` over JSON/HTTP with reqwest
//! - `GatewayConfig` - Base URL, API key and timeouts
//! - `ConfigError` - Construction failures

mod client;
mod config;
mod error;

pub use client::HttpGateway;
pub use config::GatewayConfig;
pub use error::ConfigError;
