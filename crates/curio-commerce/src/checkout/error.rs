//! Checkout error types.

use super::flow::CheckoutState;
use super::gateway::GatewayError;
use crate::error::CommerceError;
use crate::ids::ShippingTierId;
use thiserror::Error;

/// Why a checkout operation was refused or failed.
///
/// Everything except an engine contract violation is something the shopper
/// can fix or retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    /// Required input is missing; `missing` names the fields for display.
    #[error("Please complete: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("Calculate shipping for this address before continuing")]
    ShippingNotCalculated,

    #[error("Shipping option '{0}' is not available for this address")]
    UnknownShippingTier(ShippingTierId),

    #[error("Shipping uses the billing address; turn off \"same as billing\" to edit it")]
    ShippingFollowsBilling,

    #[error("Cannot {action} while checkout is {state}")]
    InvalidTransition {
        state: CheckoutState,
        action: &'static str,
    },

    /// The gateway refused or failed to create the order.
    #[error("Could not create your order: {}", .0.user_message())]
    OrderCreation(GatewayError),

    /// The gateway refused or failed to capture payment.
    #[error("Payment failed: {}", .0.user_message())]
    Payment(GatewayError),

    #[error(transparent)]
    Engine(#[from] CommerceError),
}

impl CheckoutError {
    pub fn validation<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CheckoutError::Validation {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// False only for engine contract violations, which indicate a bug
    /// rather than bad input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CheckoutError::Engine(CommerceError::EngineContract(_)))
    }

    /// The gateway failure behind this error, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            CheckoutError::OrderCreation(e) | CheckoutError::Payment(e) => Some(e),
            _ => None,
        }
    }
}
