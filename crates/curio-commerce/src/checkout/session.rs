//! Observable checkout session.

use super::address::Address;
use super::flow::CheckoutState;
use super::gateway::Receipt;
use crate::ids::{CheckoutId, RemoteOrderId, ShippingTierId};
use crate::money::{Currency, Money};
use crate::shipping::ShippingOption;
use crate::tax::TaxResult;
use rust_decimal::Decimal;
use serde::Serialize;

/// Where the payment step stands.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    NotStarted,
    InProgress,
    Failed { message: String },
    Succeeded { receipt: Receipt },
}

/// The inputs a shipping quote was computed from.
///
/// A quote is stale as soon as any of these differ from the live values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuoteBasis {
    pub subtotal: Money,
    pub weight: Decimal,
    pub destination: Address,
}

/// Everything the checkout UI renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    pub id: CheckoutId,
    pub state: CheckoutState,
    pub email: String,
    pub billing: Address,
    /// Distinct shipping address. Ignored while `same_as_billing` is set.
    pub shipping: Address,
    pub same_as_billing: bool,
    pub shipping_options: Vec<ShippingOption>,
    pub selected_shipping: Option<ShippingTierId>,
    /// Present whenever the effective shipping address is complete.
    pub tax: Option<TaxResult>,
    /// Merchandise subtotal as of the last cart sync.
    pub subtotal: Money,
    pub remote_order_id: Option<RemoteOrderId>,
    pub payment_status: PaymentStatus,
    /// Last message for the shopper (gateway rejection, invalidated quote).
    pub notice: Option<String>,
    #[serde(skip)]
    pub(crate) quote_basis: Option<QuoteBasis>,
}

impl CheckoutSession {
    /// A fresh session in the `Cart` state.
    pub fn new(currency: Currency) -> Self {
        Self {
            id: CheckoutId::generate(),
            state: CheckoutState::Cart,
            email: String::new(),
            billing: Address::default(),
            shipping: Address::default(),
            same_as_billing: true,
            shipping_options: Vec::new(),
            selected_shipping: None,
            tax: None,
            subtotal: Money::zero(currency),
            remote_order_id: None,
            payment_status: PaymentStatus::NotStarted,
            notice: None,
            quote_basis: None,
        }
    }

    /// The address parcels go to: billing while the flag is set, the
    /// distinct shipping address otherwise.
    pub fn effective_shipping_address(&self) -> &Address {
        if self.same_as_billing {
            &self.billing
        } else {
            &self.shipping
        }
    }

    pub fn selected_option(&self) -> Option<&ShippingOption> {
        let tier = self.selected_shipping.as_ref()?;
        self.shipping_options.iter().find(|o| &o.tier == tier)
    }

    /// Cost of the selected shipping option, zero when none is selected.
    pub fn shipping_cost(&self) -> Money {
        self.selected_option()
            .map(|o| o.cost)
            .unwrap_or_else(|| Money::zero(self.subtotal.currency))
    }

    pub fn tax_amount(&self) -> Money {
        self.tax
            .as_ref()
            .map(|t| t.amount)
            .unwrap_or_else(|| Money::zero(self.subtotal.currency))
    }

    /// Subtotal plus selected shipping plus tax.
    ///
    /// `None` until a shipping option is selected and tax is known, or if
    /// the sum overflows.
    pub fn total_payable(&self) -> Option<Money> {
        let shipping = self.selected_option()?.cost;
        let tax = self.tax.as_ref()?.amount;
        self.subtotal.try_add(&shipping)?.try_add(&tax)
    }

    pub fn is_shipping_calculated(&self) -> bool {
        self.quote_basis.is_some() && !self.shipping_options.is_empty()
    }

    /// Drop the quote and selection.
    pub(crate) fn clear_quote(&mut self) {
        self.shipping_options.clear();
        self.selected_shipping = None;
        self.quote_basis = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::{DeliveryEstimate, ServiceLevel};
    use crate::tax::RateSource;
    use rust_decimal_macros::dec;

    fn option(tier: &str, cents: i64) -> ShippingOption {
        ShippingOption {
            tier: ShippingTierId::new(tier),
            service: ServiceLevel::Ground,
            cost: Money::new(cents, Currency::USD),
            description: tier.to_string(),
            estimated_days: DeliveryEstimate::new(3, 5),
        }
    }

    #[test]
    fn test_new_session_aliases_billing() {
        let mut session = CheckoutSession::new(Currency::USD);
        assert_eq!(session.state, CheckoutState::Cart);
        session.billing.city = "Austin".into();
        session.shipping.city = "Dallas".into();
        assert_eq!(session.effective_shipping_address().city, "Austin");
        session.same_as_billing = false;
        assert_eq!(session.effective_shipping_address().city, "Dallas");
    }

    #[test]
    fn test_total_payable_requires_selection_and_tax() {
        let mut session = CheckoutSession::new(Currency::USD);
        session.subtotal = Money::new(5000, Currency::USD);
        session.shipping_options = vec![option("standard", 500), option("expedited", 1500)];
        assert_eq!(session.total_payable(), None);

        session.selected_shipping = Some(ShippingTierId::new("standard"));
        assert_eq!(session.total_payable(), None);

        session.tax = Some(TaxResult {
            rate: dec!(0.10),
            amount: Money::new(500, Currency::USD),
            jurisdiction_applies: true,
            source: RateSource::City,
        });
        assert_eq!(session.total_payable(), Some(Money::new(6000, Currency::USD)));

        session.selected_shipping = Some(ShippingTierId::new("expedited"));
        assert_eq!(session.total_payable(), Some(Money::new(7000, Currency::USD)));
    }

    #[test]
    fn test_clear_quote() {
        let mut session = CheckoutSession::new(Currency::USD);
        session.shipping_options = vec![option("standard", 500)];
        session.selected_shipping = Some(ShippingTierId::new("standard"));
        session.clear_quote();
        assert!(session.shipping_options.is_empty());
        assert!(session.selected_option().is_none());
        assert!(session.shipping_cost().is_zero());
    }
}
