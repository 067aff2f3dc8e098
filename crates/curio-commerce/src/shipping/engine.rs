//! Shipping rate computation.

use super::option::{DeliveryEstimate, ShippingOption};
use super::tier::{ShippingConfig, ShippingTier, Zone};
use crate::checkout::Address;
use crate::error::CommerceError;
use crate::money::{Currency, Money};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Prices shipping tiers for a destination.
///
/// Holds only configuration; every call is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct ShippingEngine {
    config: ShippingConfig,
    currency: Currency,
}

impl ShippingEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: ShippingConfig, currency: Currency) -> Result<Self, CommerceError> {
        config.validate()?;
        Ok(Self { config, currency })
    }

    pub fn config(&self) -> &ShippingConfig {
        &self.config
    }

    /// Compute the shipping options for a parcel, cheapest first.
    ///
    /// The destination must be complete and the weight positive; callers
    /// gate on both before calling. A violation is reported as
    /// `CommerceError::EngineContract` rather than priced.
    ///
    /// The result is never empty: when no configured tier serves the
    /// destination the fallback tier is quoted.
    pub fn compute_rates(
        &self,
        destination: &Address,
        subtotal: Money,
        total_weight: Decimal,
    ) -> Result<Vec<ShippingOption>, CommerceError> {
        let missing = destination.missing_fields();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            return Err(CommerceError::EngineContract(format!(
                "destination is missing {}",
                names.join(", ")
            )));
        }
        if total_weight <= Decimal::ZERO {
            return Err(CommerceError::EngineContract(format!(
                "parcel weight must be positive, got {}",
                total_weight
            )));
        }
        if subtotal.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: subtotal.currency.code().to_string(),
            });
        }
        if subtotal.is_negative() {
            return Err(CommerceError::EngineContract(format!(
                "subtotal must not be negative, got {}",
                subtotal.minor_units
            )));
        }

        let zone = self.zone_for(destination);
        let mut options = self
            .config
            .tiers
            .iter()
            .filter(|tier| tier.serves(zone))
            .map(|tier| self.price_tier(tier, zone, subtotal, total_weight))
            .collect::<Result<Vec<_>, _>>()?;

        if options.is_empty() {
            options.push(self.price_tier(&self.config.fallback, zone, subtotal, total_weight)?);
        }

        options.sort_by(|a, b| {
            a.cost
                .minor_units
                .cmp(&b.cost.minor_units)
                .then(a.estimated_days.max_days.cmp(&b.estimated_days.max_days))
                .then_with(|| a.tier.cmp(&b.tier))
        });

        tracing::debug!(
            zone = ?zone,
            weight = %total_weight,
            subtotal = subtotal.minor_units,
            options = options.len(),
            "shipping rates computed"
        );

        Ok(options)
    }

    /// Classify a destination.
    pub fn zone_for(&self, destination: &Address) -> Zone {
        let country = normalize_country(&destination.country);
        if country != normalize_country(&self.config.home_country) {
            return Zone::International;
        }
        let region = destination.region.trim().to_uppercase();
        if self
            .config
            .remote_regions
            .iter()
            .any(|r| r.trim().eq_ignore_ascii_case(&region))
        {
            Zone::DomesticRemote
        } else {
            Zone::Domestic
        }
    }

    fn price_tier(
        &self,
        tier: &ShippingTier,
        zone: Zone,
        subtotal: Money,
        weight: Decimal,
    ) -> Result<ShippingOption, CommerceError> {
        let qualifies_free = tier
            .free_threshold
            .is_some_and(|threshold| subtotal.minor_units >= threshold);

        let cost = if qualifies_free {
            0
        } else {
            let extra_pounds = (weight - tier.included_weight)
                .max(Decimal::ZERO)
                .ceil()
                .to_i64()
                .ok_or(CommerceError::Overflow)?;
            let surcharge = if zone == Zone::DomesticRemote {
                self.config.remote_surcharge
            } else {
                0
            };
            tier.per_pound
                .checked_mul(extra_pounds)
                .and_then(|w| w.checked_add(tier.base_cost))
                .and_then(|c| c.checked_add(surcharge))
                .ok_or(CommerceError::Overflow)?
        };

        let estimated_days = DeliveryEstimate::new(tier.min_days, tier.max_days);
        Ok(ShippingOption {
            tier: tier.id.clone(),
            service: tier.service,
            cost: Money::new(cost, self.currency),
            description: format!("{} ({})", tier.label, estimated_days),
            estimated_days,
        })
    }
}

fn normalize_country(country: &str) -> String {
    let upper = country.trim().to_uppercase();
    match upper.as_str() {
        "USA" | "UNITED STATES" | "UNITED STATES OF AMERICA" => "US".to_string(),
        _ => upper,
    }
}
