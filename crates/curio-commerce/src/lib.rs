//! Checkout subsystem for the Curio collectibles storefront.
//!
//! - **Cart**: a reducer over immutable snapshots behind a single-writer store
//! - **Shipping**: pure rate engine over configured carrier tiers
//! - **Tax**: pure sales-tax engine over nexus rate tables
//! - **Checkout**: the orchestrator, its state machine and the payment gateway port
//! - **Launches**: background watcher for scheduled product drops
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use curio_commerce::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::default();
//! let cart = Arc::new(CartStore::new(config.currency));
//! cart.add_line(CartItem::new("sku-1", "Dragon Figure", Money::new(2500, Currency::USD), dec!(0.5)))?;
//!
//! let mut checkout = Checkout::new(
//!     cart.clone(),
//!     config.shipping_engine()?,
//!     config.tax_engine()?,
//!     Arc::new(StubGateway::new()),
//! );
//! checkout.begin()?;
//! checkout.set_email("ada@example.com")?;
//! checkout.set_billing(Address::new("Ada", "Lovelace", "1 Pike St", "Seattle", "WA", "98101", "US"))?;
//! checkout.calculate_shipping()?;
//! checkout.continue_to_payment().await?;
//! let receipt = checkout.submit_payment(PaymentToken::new("tok_visa")).await?;
//! println!("paid: {}", receipt.id);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod checkout;
pub mod config;
pub mod launches;
pub mod shipping;
pub mod tax;

pub use config::StoreConfig;
pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{CartAction, CartItem, CartLine, CartState, CartStore};

    // Engines
    pub use crate::shipping::{ShippingConfig, ShippingEngine, ShippingOption};
    pub use crate::tax::{TaxEngine, TaxResult, TaxTables};

    // Checkout
    pub use crate::checkout::{
        Address, AddressField, Checkout, CheckoutError, CheckoutSession, CheckoutState,
        GatewayError, PaymentGateway, PaymentStatus, Receipt, StubGateway,
    };

    // Configuration and launches
    pub use crate::config::StoreConfig;
    pub use crate::launches::{LaunchSchedule, LaunchWatcher, ScheduledLaunch};
}
