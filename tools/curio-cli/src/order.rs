//! Order files: the cart contents and addresses the CLI checks out with.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use curio_commerce::checkout::{Address, Checkout, PaymentGateway};
use curio_commerce::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;

/// An order file.
///
/// ```toml
/// email = "ada@example.com"
///
/// [[items]]
/// id = "sku-1"
/// name = "Dragon Figure"
/// price = 2500
/// quantity = 2
///
/// [billing]
/// first_name = "Ada"
/// ...
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OrderFile {
    #[serde(default)]
    pub email: String,
    pub items: Vec<OrderItem>,
    pub billing: Address,
    /// Ship somewhere other than the billing address.
    #[serde(default)]
    pub shipping: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    /// Unit price in minor units.
    pub price: i64,
    /// Unit weight in pounds; the store default when absent.
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl OrderFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read order file: {}", path.display()))?;
        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON order: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML order: {}", path.display()))
        }
    }

    /// Entries sharing an id collapse into one line with the summed quantity.
    fn merged_items(&self) -> Result<Vec<(&OrderItem, i64)>> {
        let mut merged: Vec<(&OrderItem, i64)> = Vec::new();
        for item in &self.items {
            match merged.iter_mut().find(|(seen, _)| seen.id == item.id) {
                Some((seen, quantity)) => {
                    if seen.price != item.price || seen.weight != item.weight {
                        bail!(
                            "Item {} is listed more than once with different prices or weights",
                            item.id
                        );
                    }
                    *quantity += i64::from(item.quantity);
                }
                None => merged.push((item, i64::from(item.quantity))),
            }
        }
        Ok(merged)
    }

    /// Put the items into a fresh cart.
    pub fn fill_cart(&self, store: &StoreConfig) -> Result<Arc<CartStore>> {
        let cart = Arc::new(CartStore::new(store.currency));
        for (item, quantity) in self.merged_items()? {
            let cart_item = CartItem::new(
                item.id.as_str(),
                item.name.as_str(),
                Money::new(item.price, store.currency),
                item.weight.unwrap_or(store.default_unit_weight),
            );
            cart.add_line(cart_item)?;
            cart.set_quantity(&ProductId::new(item.id.as_str()), quantity)?;
        }
        Ok(cart)
    }

    /// Start a checkout for this order with addresses filled in.
    pub fn start_checkout(
        &self,
        store: &StoreConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Checkout> {
        let cart = self.fill_cart(store)?;
        let mut checkout = Checkout::new(cart, store.shipping_engine()?, store.tax_engine()?, gateway);

        checkout.begin()?;
        if !self.email.is_empty() {
            checkout.set_email(self.email.as_str())?;
        }
        checkout.set_billing(self.billing.clone())?;
        if let Some(shipping) = &self.shipping {
            checkout.set_same_as_billing(false)?;
            checkout.set_shipping_address(shipping.clone())?;
        }
        Ok(checkout)
    }
}
