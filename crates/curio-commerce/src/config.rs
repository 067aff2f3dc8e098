//! Store configuration.
//!
//! One file describes the store's currency, shipping tiers, tax tables and
//! launch schedule. Every field has a default, so an empty file is a valid
//! configuration for a US store.

use crate::error::CommerceError;
use crate::launches::{LaunchSchedule, ScheduledLaunch};
use crate::money::Currency;
use crate::shipping::{ShippingConfig, ShippingEngine};
use crate::tax::{TaxEngine, TaxTables};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Store configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Currency every price and charge is expressed in.
    #[serde(default)]
    pub currency: Currency,

    /// Country treated as domestic for shipping and tax. Overrides
    /// `shipping.home_country` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_country: Option<String>,

    /// Weight in pounds assumed for items that do not state one.
    #[serde(default = "default_unit_weight")]
    pub default_unit_weight: Decimal,

    #[serde(default)]
    pub shipping: ShippingConfig,

    /// Nexus jurisdictions keyed by region code.
    #[serde(default)]
    pub tax: TaxTables,

    #[serde(default)]
    pub launches: Vec<ScheduledLaunch>,

    /// Seconds between launch checks.
    #[serde(default = "default_launch_poll_secs")]
    pub launch_poll_secs: u64,
}

fn default_unit_weight() -> Decimal {
    dec!(0.5)
}

fn default_launch_poll_secs() -> u64 {
    60
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            home_country: None,
            default_unit_weight: default_unit_weight(),
            shipping: ShippingConfig::default(),
            tax: TaxTables::default(),
            launches: Vec::new(),
            launch_poll_secs: default_launch_poll_secs(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CommerceError> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CommerceError> {
        let config: StoreConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CommerceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommerceError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn to_toml_string(&self) -> Result<String, CommerceError> {
        toml::to_string_pretty(self).map_err(|e| CommerceError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.shipping.tiers.is_empty() {
            return Err(CommerceError::Config(
                "at least one shipping tier is required".into(),
            ));
        }
        if self.default_unit_weight <= Decimal::ZERO {
            return Err(CommerceError::Config(
                "default_unit_weight must be positive".into(),
            ));
        }
        if self.launch_poll_secs == 0 {
            return Err(CommerceError::Config("launch_poll_secs must be positive".into()));
        }
        self.effective_shipping().validate()?;
        self.tax.validate()
    }

    fn effective_shipping(&self) -> ShippingConfig {
        let mut shipping = self.shipping.clone();
        if let Some(country) = &self.home_country {
            shipping.home_country = country.clone();
        }
        shipping
    }

    pub fn shipping_engine(&self) -> Result<ShippingEngine, CommerceError> {
        ShippingEngine::new(self.effective_shipping(), self.currency)
    }

    pub fn tax_engine(&self) -> Result<TaxEngine, CommerceError> {
        TaxEngine::new(self.tax.clone())
    }

    pub fn launch_schedule(&self) -> LaunchSchedule {
        LaunchSchedule::new(self.launches.clone())
    }

    pub fn launch_interval(&self) -> Duration {
        Duration::from_secs(self.launch_poll_secs)
    }
}
