//! Tax rate tables.

use crate::error::CommerceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a jurisdiction taxes the shipping charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingTaxPolicy {
    /// Shipping billed as a separate charge is not taxable.
    #[default]
    Exempt,
    /// Shipping is part of the taxable base.
    Taxable,
}

/// Combined rate for one postal code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CityRate {
    pub postal_code: String,
    pub city: String,
    pub rate: Decimal,
}

/// Rate for every postal code starting with `prefix`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrefixRate {
    pub prefix: String,
    pub rate: Decimal,
}

/// Rules for one nexus jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JurisdictionRules {
    /// Rate used when neither the city nor the prefix table matches.
    pub default_rate: Decimal,
    #[serde(default)]
    pub cities: Vec<CityRate>,
    #[serde(default)]
    pub postal_prefixes: Vec<PrefixRate>,
    #[serde(default)]
    pub shipping: ShippingTaxPolicy,
}

impl JurisdictionRules {
    pub fn flat(default_rate: Decimal) -> Self {
        Self {
            default_rate,
            cities: Vec::new(),
            postal_prefixes: Vec::new(),
            shipping: ShippingTaxPolicy::Exempt,
        }
    }

    pub fn with_city(mut self, postal_code: &str, city: &str, rate: Decimal) -> Self {
        self.cities.push(CityRate {
            postal_code: postal_code.to_string(),
            city: city.to_string(),
            rate,
        });
        self
    }

    pub fn with_prefix(mut self, prefix: &str, rate: Decimal) -> Self {
        self.postal_prefixes.push(PrefixRate {
            prefix: prefix.to_string(),
            rate,
        });
        self
    }

    pub fn with_shipping(mut self, policy: ShippingTaxPolicy) -> Self {
        self.shipping = policy;
        self
    }

    fn rates(&self) -> impl Iterator<Item = Decimal> + '_ {
        std::iter::once(self.default_rate)
            .chain(self.cities.iter().map(|c| c.rate))
            .chain(self.postal_prefixes.iter().map(|p| p.rate))
    }
}

/// Every jurisdiction where the store collects sales tax, keyed by region code.
///
/// A region absent from the map has no nexus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TaxTables {
    pub jurisdictions: BTreeMap<String, JurisdictionRules>,
}

impl TaxTables {
    pub fn new() -> Self {
        Self {
            jurisdictions: BTreeMap::new(),
        }
    }

    pub fn with_jurisdiction(mut self, region: &str, rules: JurisdictionRules) -> Self {
        self.jurisdictions.insert(region.trim().to_uppercase(), rules);
        self
    }

    /// Rates must lie in `[0, 1)`.
    pub fn validate(&self) -> Result<(), CommerceError> {
        for (region, rules) in &self.jurisdictions {
            if let Some(bad) = rules.rates().find(|r| *r < Decimal::ZERO || *r >= Decimal::ONE) {
                return Err(CommerceError::Config(format!(
                    "tax rate {} for {} is outside [0, 1)",
                    bad, region
                )));
            }
        }
        Ok(())
    }
}

impl Default for TaxTables {
    fn default() -> Self {
        TaxTables::new()
            .with_jurisdiction(
                "CA",
                JurisdictionRules::flat(dec!(0.0725))
                    .with_city("90001", "Los Angeles", dec!(0.095))
                    .with_city("94102", "San Francisco", dec!(0.08625))
                    .with_city("95112", "San Jose", dec!(0.09375))
                    .with_prefix("900", dec!(0.095))
                    .with_prefix("941", dec!(0.08625))
                    .with_prefix("921", dec!(0.0775)),
            )
            .with_jurisdiction(
                "NY",
                JurisdictionRules::flat(dec!(0.04))
                    .with_city("10001", "New York", dec!(0.08875))
                    .with_city("14201", "Buffalo", dec!(0.0875))
                    .with_prefix("100", dec!(0.08875))
                    .with_prefix("112", dec!(0.08875)),
            )
            .with_jurisdiction(
                "TX",
                JurisdictionRules::flat(dec!(0.0625))
                    .with_city("77001", "Houston", dec!(0.0825))
                    .with_city("78701", "Austin", dec!(0.0825))
                    .with_prefix("752", dec!(0.0825)),
            )
            .with_jurisdiction(
                "WA",
                JurisdictionRules::flat(dec!(0.065))
                    .with_city("98101", "Seattle", dec!(0.1035))
                    .with_prefix("981", dec!(0.1035)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_valid() {
        assert!(TaxTables::default().validate().is_ok());
    }

    #[test]
    fn test_default_tables_leave_shipping_untaxed() {
        let tables = TaxTables::default();
        assert!(!tables.jurisdictions.is_empty());
        for (region, rules) in &tables.jurisdictions {
            assert_eq!(rules.shipping, ShippingTaxPolicy::Exempt, "{}", region);
        }
    }

    #[test]
    fn test_rate_of_one_rejected() {
        let tables = TaxTables::new().with_jurisdiction("OR", JurisdictionRules::flat(Decimal::ONE));
        assert!(matches!(tables.validate(), Err(CommerceError::Config(_))));
    }

    #[test]
    fn test_region_keys_normalized() {
        let tables = TaxTables::new().with_jurisdiction(" ca ", JurisdictionRules::flat(dec!(0.05)));
        assert!(tables.jurisdictions.contains_key("CA"));
    }
}
