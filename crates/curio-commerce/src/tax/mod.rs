//! Sales tax engine.
//!
//! Resolves a rate for the shipping destination (nexus check, then city,
//! postal prefix and jurisdiction default) and applies it to the taxable
//! base.

mod engine;
mod tables;

pub use engine::{RateSource, TaxEngine, TaxResult};
pub use tables::{CityRate, JurisdictionRules, PrefixRate, ShippingTaxPolicy, TaxTables};
