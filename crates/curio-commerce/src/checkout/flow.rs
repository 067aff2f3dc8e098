//! Checkout state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Browsing the cart; no checkout in progress.
    #[default]
    Cart,
    /// Filling in addresses. Shipping has not been quoted (or the quote was invalidated).
    EnteringAddress,
    /// Shipping options quoted for the current destination and cart.
    ShippingCalculated,
    /// Waiting for the gateway to create the order.
    OrderCreating,
    /// Remote order exists; ready for payment.
    OrderCreated,
    /// Waiting for the gateway to capture payment.
    PaymentInProgress,
    /// Paid. Terminal.
    PaymentSucceeded,
    /// Capture was rejected; the remote order is kept for a retry.
    PaymentFailed,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Cart => "cart",
            CheckoutState::EnteringAddress => "entering_address",
            CheckoutState::ShippingCalculated => "shipping_calculated",
            CheckoutState::OrderCreating => "order_creating",
            CheckoutState::OrderCreated => "order_created",
            CheckoutState::PaymentInProgress => "payment_in_progress",
            CheckoutState::PaymentSucceeded => "payment_succeeded",
            CheckoutState::PaymentFailed => "payment_failed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutState::Cart => "Cart",
            CheckoutState::EnteringAddress => "Address",
            CheckoutState::ShippingCalculated => "Shipping",
            CheckoutState::OrderCreating => "Creating order",
            CheckoutState::OrderCreated => "Payment",
            CheckoutState::PaymentInProgress => "Processing payment",
            CheckoutState::PaymentSucceeded => "Complete",
            CheckoutState::PaymentFailed => "Payment failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::PaymentSucceeded)
    }

    /// States in which addresses, email and shipping selection may change.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            CheckoutState::EnteringAddress | CheckoutState::ShippingCalculated
        )
    }

    /// States that hold a remote order.
    pub fn has_remote_order(&self) -> bool {
        matches!(
            self,
            CheckoutState::OrderCreated
                | CheckoutState::PaymentInProgress
                | CheckoutState::PaymentFailed
        )
    }

    /// The transition table.
    ///
    /// Returning to `Cart` is always allowed; it abandons the session.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        match (self, next) {
            (_, Cart) => true,
            (Cart, EnteringAddress) => true,
            (EnteringAddress, ShippingCalculated) => true,
            (ShippingCalculated, ShippingCalculated) => true,
            (ShippingCalculated, EnteringAddress) => true,
            (ShippingCalculated, OrderCreating) => true,
            (OrderCreating, OrderCreated) => true,
            (OrderCreating, ShippingCalculated) => true,
            (OrderCreated, PaymentInProgress) => true,
            (PaymentFailed, PaymentInProgress) => true,
            (PaymentInProgress, PaymentSucceeded) => true,
            (PaymentInProgress, PaymentFailed) => true,
            // The cart changed under a created order: quote again.
            (OrderCreated | PaymentFailed, EnteringAddress) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
