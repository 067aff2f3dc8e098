//! Commerce error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the money utilities, the cart reducer, the pricing
/// engines and configuration loading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// A cart item with a negative shipping weight.
    #[error("Invalid unit weight {weight} for {product}")]
    InvalidWeight { product: String, weight: Decimal },

    /// An engine was invoked with input its caller should have rejected.
    ///
    /// This is a programming error in the caller, not a user mistake.
    #[error("Engine contract violated: {0}")]
    EngineContract(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for CommerceError {
    fn from(e: toml::de::Error) -> Self {
        CommerceError::Config(e.to_string())
    }
}
