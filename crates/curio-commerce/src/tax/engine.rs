//! Sales tax computation.

use super::tables::{JurisdictionRules, ShippingTaxPolicy, TaxTables};
use crate::error::CommerceError;
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which rule produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    NoNexus,
    City,
    PostalPrefix,
    JurisdictionDefault,
}

/// Outcome of a tax computation.
///
/// When `jurisdiction_applies` is false, `rate` and `amount` are zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxResult {
    /// Rate as a decimal fraction (0.0725 for 7.25%).
    pub rate: Decimal,
    pub amount: Money,
    pub jurisdiction_applies: bool,
    pub source: RateSource,
}

impl TaxResult {
    /// Zero tax for a destination where the store has no nexus.
    pub fn no_nexus(subtotal: Money) -> Self {
        Self {
            rate: Decimal::ZERO,
            amount: Money::zero(subtotal.currency),
            jurisdiction_applies: false,
            source: RateSource::NoNexus,
        }
    }
}

/// Sales tax engine over a fixed set of rate tables.
#[derive(Debug, Clone)]
pub struct TaxEngine {
    jurisdictions: BTreeMap<String, JurisdictionRules>,
}

impl TaxEngine {
    /// Create an engine from validated tables.
    pub fn new(tables: TaxTables) -> Result<Self, CommerceError> {
        tables.validate()?;
        let jurisdictions = tables
            .jurisdictions
            .into_iter()
            .map(|(region, rules)| (region.trim().to_uppercase(), rules))
            .collect();
        Ok(Self { jurisdictions })
    }

    /// Whether the store collects tax in `region`.
    pub fn has_nexus(&self, region: &str) -> bool {
        self.rules_for(region).is_some()
    }

    /// Tax on the merchandise subtotal alone.
    pub fn compute_tax(
        &self,
        subtotal: Money,
        region: &str,
        postal_code: Option<&str>,
    ) -> Result<TaxResult, CommerceError> {
        self.compute(subtotal, None, region, postal_code)
    }

    /// Tax for a whole order, adding shipping to the base in
    /// jurisdictions whose policy taxes it.
    pub fn compute_tax_for_order(
        &self,
        subtotal: Money,
        shipping_cost: Money,
        region: &str,
        postal_code: Option<&str>,
    ) -> Result<TaxResult, CommerceError> {
        self.compute(subtotal, Some(shipping_cost), region, postal_code)
    }

    fn compute(
        &self,
        subtotal: Money,
        shipping_cost: Option<Money>,
        region: &str,
        postal_code: Option<&str>,
    ) -> Result<TaxResult, CommerceError> {
        if subtotal.is_negative() {
            return Err(CommerceError::EngineContract(format!(
                "taxable subtotal must not be negative, got {}",
                subtotal.minor_units
            )));
        }

        let Some(rules) = self.rules_for(region) else {
            return Ok(TaxResult::no_nexus(subtotal));
        };

        let (rate, source) = resolve_rate(rules, postal_code);

        let base = match (rules.shipping, shipping_cost) {
            (ShippingTaxPolicy::Taxable, Some(shipping)) => {
                subtotal.try_add(&shipping).ok_or_else(|| CommerceError::CurrencyMismatch {
                    expected: subtotal.currency.code().to_string(),
                    got: shipping.currency.code().to_string(),
                })?
            }
            _ => subtotal,
        };
        let amount = base.apply_rate(rate).ok_or(CommerceError::Overflow)?;

        Ok(TaxResult {
            rate,
            amount,
            jurisdiction_applies: true,
            source,
        })
    }

    fn rules_for(&self, region: &str) -> Option<&JurisdictionRules> {
        self.jurisdictions.get(&region.trim().to_uppercase())
    }
}

/// City table first, then the longest matching postal prefix, then the
/// jurisdiction default. The first rule that matches wins.
fn resolve_rate(rules: &JurisdictionRules, postal_code: Option<&str>) -> (Decimal, RateSource) {
    let Some(postal) = postal_code.map(normalize_postal).filter(|p| !p.is_empty()) else {
        return (rules.default_rate, RateSource::JurisdictionDefault);
    };

    if let Some(city) = rules
        .cities
        .iter()
        .find(|c| normalize_postal(&c.postal_code) == postal)
    {
        return (city.rate, RateSource::City);
    }

    let best_prefix = rules
        .postal_prefixes
        .iter()
        .map(|p| (p.prefix.trim().to_uppercase(), p.rate))
        .filter(|(prefix, _)| !prefix.is_empty() && postal.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len());
    if let Some((_, rate)) = best_prefix {
        return (rate, RateSource::PostalPrefix);
    }

    (rules.default_rate, RateSource::JurisdictionDefault)
}

/// "94102-1234" and " 94102 " both become "94102".
fn normalize_postal(postal: &str) -> String {
    let head = postal.trim().split(['-', ' ']).next().unwrap_or_default();
    head.chars().take(5).collect::<String>().to_uppercase()
}
