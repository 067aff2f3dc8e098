//! Shipping options produced by the rate engine.

use super::tier::ServiceLevel;
use crate::ids::ShippingTierId;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business-day delivery window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEstimate {
    pub min_days: u32,
    pub max_days: u32,
}

impl DeliveryEstimate {
    pub fn new(min_days: u32, max_days: u32) -> Self {
        Self {
            min_days: min_days.min(max_days),
            max_days: max_days.max(min_days),
        }
    }
}

impl fmt::Display for DeliveryEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min_days, self.max_days) {
            (1, 1) => write!(f, "1 business day"),
            (min, max) if min == max => write!(f, "{} business days", min),
            (min, max) => write!(f, "{}-{} business days", min, max),
        }
    }
}

/// A priced shipping option for one destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingOption {
    /// Tier this option was priced from.
    pub tier: ShippingTierId,
    /// Service level.
    pub service: ServiceLevel,
    /// Shipping price (zero when the free-shipping threshold is met).
    pub cost: Money,
    /// Display description, e.g. "Standard Ground (5-7 business days)".
    pub description: String,
    /// Delivery window.
    pub estimated_days: DeliveryEstimate,
}

impl ShippingOption {
    /// Check if this is free shipping.
    pub fn is_free(&self) -> bool {
        self.cost.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_delivery_estimate_display() {
        assert_eq!(DeliveryEstimate::new(5, 7).to_string(), "5-7 business days");
        assert_eq!(DeliveryEstimate::new(2, 2).to_string(), "2 business days");
        assert_eq!(DeliveryEstimate::new(1, 1).to_string(), "1 business day");
        assert_eq!(DeliveryEstimate::new(9, 3), DeliveryEstimate::new(3, 9));
    }

    #[test]
    fn test_free_shipping() {
        let option = ShippingOption {
            tier: ShippingTierId::new("standard"),
            service: ServiceLevel::Ground,
            cost: Money::zero(Currency::USD),
            description: "Standard Ground (5-7 business days)".to_string(),
            estimated_days: DeliveryEstimate::new(5, 7),
        };
        assert!(option.is_free());
    }
}
