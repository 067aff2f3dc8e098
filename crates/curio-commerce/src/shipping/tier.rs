//! Shipping tier configuration.

use crate::error::CommerceError;
use crate::ids::ShippingTierId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Carrier service level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLevel {
    Ground,
    Expedited,
    Overnight,
    International,
    InternationalPriority,
}

impl ServiceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLevel::Ground => "ground",
            ServiceLevel::Expedited => "expedited",
            ServiceLevel::Overnight => "overnight",
            ServiceLevel::International => "international",
            ServiceLevel::InternationalPriority => "international_priority",
        }
    }
}

/// Destination zone a tier can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Home country, contiguous regions.
    Domestic,
    /// Home country, regions that carry a surcharge (e.g. AK, HI).
    DomesticRemote,
    /// Anywhere else.
    International,
}

/// A priced carrier/service tier.
///
/// All costs are minor units of the store currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingTier {
    pub id: ShippingTierId,
    pub service: ServiceLevel,
    pub label: String,
    /// Zones this tier ships to. Ignored for the fallback tier.
    #[serde(default)]
    pub zones: Vec<Zone>,
    pub base_cost: i64,
    /// Weight covered by the base cost, in pounds.
    #[serde(default)]
    pub included_weight: Decimal,
    /// Surcharge per started pound above `included_weight`.
    #[serde(default)]
    pub per_pound: i64,
    /// Subtotal (minor units) at or above which this tier ships free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_threshold: Option<i64>,
    pub min_days: u32,
    pub max_days: u32,
}

impl ShippingTier {
    pub fn serves(&self, zone: Zone) -> bool {
        self.zones.contains(&zone)
    }
}

/// Shipping engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingConfig {
    /// Country treated as domestic.
    #[serde(default = "default_home_country")]
    pub home_country: String,
    /// Home-country regions priced as `Zone::DomesticRemote`.
    #[serde(default = "default_remote_regions")]
    pub remote_regions: Vec<String>,
    /// Added to every tier's cost for remote regions.
    #[serde(default = "default_remote_surcharge")]
    pub remote_surcharge: i64,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<ShippingTier>,
    /// Quoted when no configured tier serves the destination.
    #[serde(default = "default_fallback")]
    pub fallback: ShippingTier,
}

impl ShippingConfig {
    /// Check costs, weights and delivery windows are sane.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.home_country.trim().is_empty() {
            return Err(CommerceError::Config("shipping.home_country is empty".into()));
        }
        if self.remote_surcharge < 0 {
            return Err(CommerceError::Config("shipping.remote_surcharge is negative".into()));
        }
        for tier in self.tiers.iter().chain(std::iter::once(&self.fallback)) {
            if tier.base_cost < 0 || tier.per_pound < 0 {
                return Err(CommerceError::Config(format!(
                    "shipping tier '{}' has a negative cost",
                    tier.id
                )));
            }
            if tier.included_weight < Decimal::ZERO {
                return Err(CommerceError::Config(format!(
                    "shipping tier '{}' has a negative included weight",
                    tier.id
                )));
            }
            if tier.free_threshold.is_some_and(|t| t < 0) {
                return Err(CommerceError::Config(format!(
                    "shipping tier '{}' has a negative free threshold",
                    tier.id
                )));
            }
            if tier.min_days > tier.max_days {
                return Err(CommerceError::Config(format!(
                    "shipping tier '{}' has min_days > max_days",
                    tier.id
                )));
            }
        }
        let mut ids: Vec<&ShippingTierId> = self.tiers.iter().map(|t| &t.id).collect();
        ids.push(&self.fallback.id);
        ids.sort();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(CommerceError::Config("duplicate shipping tier id".into()));
        }
        Ok(())
    }
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            home_country: default_home_country(),
            remote_regions: default_remote_regions(),
            remote_surcharge: default_remote_surcharge(),
            tiers: default_tiers(),
            fallback: default_fallback(),
        }
    }
}

fn default_home_country() -> String {
    "US".to_string()
}

fn default_remote_regions() -> Vec<String> {
    ["AK", "HI", "PR", "GU", "VI"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_remote_surcharge() -> i64 {
    1000
}

fn default_tiers() -> Vec<ShippingTier> {
    let domestic = vec![Zone::Domestic, Zone::DomesticRemote];
    vec![
        ShippingTier {
            id: ShippingTierId::new("standard"),
            service: ServiceLevel::Ground,
            label: "Standard Ground".to_string(),
            zones: domestic.clone(),
            base_cost: 500,
            included_weight: dec!(1),
            per_pound: 100,
            free_threshold: Some(7500),
            min_days: 5,
            max_days: 7,
        },
        ShippingTier {
            id: ShippingTierId::new("expedited"),
            service: ServiceLevel::Expedited,
            label: "Expedited".to_string(),
            zones: domestic,
            base_cost: 1500,
            included_weight: dec!(1),
            per_pound: 150,
            free_threshold: None,
            min_days: 2,
            max_days: 3,
        },
        ShippingTier {
            id: ShippingTierId::new("overnight"),
            service: ServiceLevel::Overnight,
            label: "Overnight".to_string(),
            zones: vec![Zone::Domestic],
            base_cost: 3500,
            included_weight: dec!(1),
            per_pound: 300,
            free_threshold: None,
            min_days: 1,
            max_days: 1,
        },
        ShippingTier {
            id: ShippingTierId::new("intl"),
            service: ServiceLevel::International,
            label: "International Standard".to_string(),
            zones: vec![Zone::International],
            base_cost: 2500,
            included_weight: dec!(0.5),
            per_pound: 500,
            free_threshold: Some(25000),
            min_days: 10,
            max_days: 21,
        },
        ShippingTier {
            id: ShippingTierId::new("intl-priority"),
            service: ServiceLevel::InternationalPriority,
            label: "International Priority".to_string(),
            zones: vec![Zone::International],
            base_cost: 4500,
            included_weight: dec!(0.5),
            per_pound: 700,
            free_threshold: None,
            min_days: 4,
            max_days: 7,
        },
    ]
}

fn default_fallback() -> ShippingTier {
    ShippingTier {
        id: ShippingTierId::new("flat-rate"),
        service: ServiceLevel::Ground,
        label: "Flat Rate Mail".to_string(),
        zones: Vec::new(),
        base_cost: 1200,
        included_weight: dec!(1),
        per_pound: 200,
        free_threshold: None,
        min_days: 7,
        max_days: 14,
    }
}
