//! Shipping rate engine.
//!
//! Maps a destination, a parcel weight and the order subtotal to a
//! cheapest-first list of shipping options. Pure: no I/O, no clock.

mod engine;
mod option;
mod tier;

pub use engine::ShippingEngine;
pub use option::{DeliveryEstimate, ShippingOption};
pub use tier::{ServiceLevel, ShippingConfig, ShippingTier, Zone};
