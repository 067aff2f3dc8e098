//! Checkout orchestration.
//!
//! [`Checkout`] owns the session, drives it through the state machine in
//! [`flow`](super::flow) and talks to the engines and the payment gateway.
//! Every operation takes `&mut self`, so at most one remote call is ever in
//! flight for a session.

use super::address::{Address, AddressField};
use super::error::CheckoutError;
use super::flow::CheckoutState;
use super::gateway::{
    CapturePaymentRequest, CreateOrderRequest, OrderAmounts, OrderLineItem, OrderMetadata,
    PaymentGateway, Receipt,
};
use super::session::{CheckoutSession, PaymentStatus, QuoteBasis};
use crate::cart::{CartState, CartStore};
use crate::error::CommerceError;
use crate::ids::{PaymentToken, RemoteOrderId, ShippingTierId};
use crate::shipping::{ShippingEngine, ShippingOption, Zone};
use crate::tax::{TaxEngine, TaxResult};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shown when an edit drops a quote the shopper had already seen.
const REQUOTE_NOTICE: &str = "Shipping needs to be recalculated for your updated order.";

/// The checkout orchestrator.
pub struct Checkout {
    cart: Arc<CartStore>,
    shipping: ShippingEngine,
    tax: TaxEngine,
    gateway: Arc<dyn PaymentGateway>,
    session: CheckoutSession,
    tx: watch::Sender<CheckoutSession>,
}

impl Checkout {
    pub fn new(
        cart: Arc<CartStore>,
        shipping: ShippingEngine,
        tax: TaxEngine,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let snapshot = cart.snapshot();
        let mut session = CheckoutSession::new(snapshot.currency());
        session.subtotal = snapshot.total_price();
        let (tx, _) = watch::channel(session.clone());
        Self {
            cart,
            shipping,
            tax,
            gateway,
            session,
            tx,
        }
    }

    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    pub fn state(&self) -> CheckoutState {
        self.session.state
    }

    /// Receive every published session.
    pub fn subscribe(&self) -> watch::Receiver<CheckoutSession> {
        self.tx.subscribe()
    }

    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }

    /// Leave the cart and start entering addresses.
    ///
    /// Also starts over after a completed purchase.
    pub fn begin(&mut self) -> Result<(), CheckoutError> {
        let state = self.session.state;
        if !matches!(state, CheckoutState::Cart | CheckoutState::PaymentSucceeded) {
            return Err(CheckoutError::InvalidTransition {
                state,
                action: "begin checkout",
            });
        }
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if state == CheckoutState::PaymentSucceeded {
            self.reset(&cart);
        }
        self.session.subtotal = cart.total_price();
        self.enter(CheckoutState::EnteringAddress);
        self.finish_edit()
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> Result<(), CheckoutError> {
        self.require_editable("edit the email address")?;
        self.session.email = email.into().trim().to_string();
        self.publish();
        Ok(())
    }

    pub fn set_billing(&mut self, address: Address) -> Result<(), CheckoutError> {
        self.edit_addresses("edit the billing address", |s| s.billing = address)
    }

    pub fn update_billing(
        &mut self,
        field: AddressField,
        value: impl Into<String>,
    ) -> Result<(), CheckoutError> {
        let value = value.into();
        self.edit_addresses("edit the billing address", |s| s.billing.set(field, value))
    }

    /// Replace the distinct shipping address.
    ///
    /// Rejected while shipping follows billing.
    pub fn set_shipping_address(&mut self, address: Address) -> Result<(), CheckoutError> {
        self.require_editable("edit the shipping address")?;
        if self.session.same_as_billing {
            return Err(CheckoutError::ShippingFollowsBilling);
        }
        self.edit_addresses("edit the shipping address", |s| s.shipping = address)
    }

    pub fn update_shipping(
        &mut self,
        field: AddressField,
        value: impl Into<String>,
    ) -> Result<(), CheckoutError> {
        self.require_editable("edit the shipping address")?;
        if self.session.same_as_billing {
            return Err(CheckoutError::ShippingFollowsBilling);
        }
        let value = value.into();
        self.edit_addresses("edit the shipping address", |s| s.shipping.set(field, value))
    }

    /// Couple or decouple the shipping address from billing.
    ///
    /// Decoupling seeds a never-filled shipping address with a copy of
    /// billing. Either direction drops the current quote.
    pub fn set_same_as_billing(&mut self, same: bool) -> Result<(), CheckoutError> {
        self.require_editable("change the shipping address")?;
        if self.session.same_as_billing == same {
            return Ok(());
        }
        self.session.same_as_billing = same;
        if !same && self.session.shipping.is_blank() {
            self.session.shipping = self.session.billing.clone();
        }
        self.invalidate_shipping("same-as-billing toggled");
        self.finish_edit()
    }

    /// Quote shipping for the current cart and destination.
    ///
    /// Every quote resets the selection to the cheapest option.
    pub fn calculate_shipping(&mut self) -> Result<&[ShippingOption], CheckoutError> {
        let state = self.session.state;
        if !state.is_editable() {
            return Err(CheckoutError::InvalidTransition {
                state,
                action: "calculate shipping",
            });
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let destination = self.session.effective_shipping_address().clone();
        let missing = destination.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::validation(
                missing.iter().map(|f| format!("shipping {}", f)),
            ));
        }
        let weight = cart.total_weight();
        if weight <= Decimal::ZERO {
            return Err(CheckoutError::validation(["item weights"]));
        }

        let subtotal = cart.total_price();
        let options = self
            .shipping
            .compute_rates(&destination, subtotal, weight)
            .map_err(|e| self.engine_failure("shipping", e))?;

        self.session.selected_shipping = options.first().map(|o| o.tier.clone());
        self.session.shipping_options = options;
        self.session.subtotal = subtotal;
        self.session.quote_basis = Some(QuoteBasis {
            subtotal,
            weight,
            destination,
        });
        self.session.notice = None;

        if state == CheckoutState::EnteringAddress {
            self.enter(CheckoutState::ShippingCalculated);
        }
        self.finish_edit()?;
        Ok(&self.session.shipping_options)
    }

    /// Choose one of the quoted options.
    ///
    /// A quote the cart has drifted from is dropped instead, and the
    /// checkout goes back to address entry.
    pub fn select_shipping(&mut self, tier: &ShippingTierId) -> Result<(), CheckoutError> {
        let state = self.session.state;
        if state != CheckoutState::ShippingCalculated {
            return Err(CheckoutError::InvalidTransition {
                state,
                action: "select a shipping option",
            });
        }
        if !self.reconcile_cart() {
            self.finish_edit()?;
            return Err(CheckoutError::ShippingNotCalculated);
        }
        if !self.session.shipping_options.iter().any(|o| &o.tier == tier) {
            return Err(CheckoutError::UnknownShippingTier(tier.clone()));
        }
        self.session.selected_shipping = Some(tier.clone());
        self.finish_edit()
    }

    /// Pick up cart changes.
    ///
    /// A quote that no longer matches the cart is dropped, never silently
    /// re-priced. An emptied cart ends the checkout.
    pub fn sync_cart(&mut self) -> Result<(), CheckoutError> {
        let state = self.session.state;
        match state {
            CheckoutState::PaymentSucceeded => return Ok(()),
            CheckoutState::OrderCreating | CheckoutState::PaymentInProgress => {
                return Err(CheckoutError::InvalidTransition {
                    state,
                    action: "update the cart",
                });
            }
            _ => {}
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() && state != CheckoutState::Cart {
            info!(checkout_id = %self.session.id, "cart emptied; leaving checkout");
            self.reset(&cart);
            self.publish();
            return Ok(());
        }

        self.finish_edit()
    }

    /// Create the remote order for the quoted cart.
    pub async fn continue_to_payment(&mut self) -> Result<RemoteOrderId, CheckoutError> {
        let state = self.session.state;
        match state {
            CheckoutState::ShippingCalculated => {}
            CheckoutState::EnteringAddress => return Err(CheckoutError::ShippingNotCalculated),
            _ => {
                return Err(CheckoutError::InvalidTransition {
                    state,
                    action: "continue to payment",
                })
            }
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if !self.quote_matches_cart(&cart) {
            self.session.subtotal = cart.total_price();
            self.invalidate_shipping("quote is stale");
            self.finish_edit()?;
            return Err(CheckoutError::ShippingNotCalculated);
        }
        self.validate_for_order()?;
        let request = self.order_request(&cart)?;

        self.session.notice = None;
        self.enter(CheckoutState::OrderCreating);
        self.publish();

        match self.gateway.create_order(&request).await {
            Ok(order) => {
                info!(
                    checkout_id = %self.session.id,
                    order_id = %order.order_id,
                    total = request.metadata.amounts.total,
                    "remote order created"
                );
                self.session.remote_order_id = Some(order.order_id.clone());
                self.session.payment_status = PaymentStatus::NotStarted;
                self.enter(CheckoutState::OrderCreated);
                self.publish();
                Ok(order.order_id)
            }
            Err(e) => {
                warn!(checkout_id = %self.session.id, error = %e, "order creation failed");
                self.session.notice = Some(e.user_message());
                self.enter(CheckoutState::ShippingCalculated);
                self.publish();
                Err(CheckoutError::OrderCreation(e))
            }
        }
    }

    /// Capture payment for the created order.
    ///
    /// Success clears the cart and tears the session down to the receipt.
    /// A failure keeps the remote order so the shopper can retry.
    pub async fn submit_payment(&mut self, token: PaymentToken) -> Result<Receipt, CheckoutError> {
        let state = self.session.state;
        if !matches!(state, CheckoutState::OrderCreated | CheckoutState::PaymentFailed) {
            return Err(CheckoutError::InvalidTransition {
                state,
                action: "submit payment",
            });
        }
        let Some(order_id) = self.session.remote_order_id.clone() else {
            return Err(CheckoutError::InvalidTransition {
                state,
                action: "submit payment without an order",
            });
        };

        let cart = self.cart.snapshot();
        if cart.is_empty() || !self.quote_matches_cart(&cart) {
            return match self.sync_cart() {
                Ok(()) if self.session.state == CheckoutState::Cart => Err(CheckoutError::EmptyCart),
                Ok(()) => Err(CheckoutError::ShippingNotCalculated),
                Err(e) => Err(e),
            };
        }

        let amounts = self.amounts()?;
        let request = CapturePaymentRequest {
            amount: amounts.total,
            currency: self.session.subtotal.currency.code().to_string(),
            order_id: order_id.clone(),
            payment_token: token,
        };

        self.session.payment_status = PaymentStatus::InProgress;
        self.session.notice = None;
        self.enter(CheckoutState::PaymentInProgress);
        self.publish();

        match self.gateway.capture_payment(&request).await {
            Ok(receipt) => {
                info!(
                    checkout_id = %self.session.id,
                    order_id = %order_id,
                    receipt_id = %receipt.id,
                    amount = request.amount,
                    "payment captured"
                );
                if let Err(e) = self.cart.clear() {
                    warn!(error = %e, "cart could not be cleared after payment");
                }
                self.complete(receipt.clone());
                self.publish();
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    checkout_id = %self.session.id,
                    order_id = %order_id,
                    error = %e,
                    "payment failed"
                );
                let message = e.user_message();
                self.session.payment_status = PaymentStatus::Failed {
                    message: message.clone(),
                };
                self.session.notice = Some(message);
                self.enter(CheckoutState::PaymentFailed);
                self.publish();
                Err(CheckoutError::Payment(e))
            }
        }
    }

    /// Abandon the checkout. Cart lines are left as they are.
    pub fn back_to_cart(&mut self) {
        let cart = self.cart.snapshot();
        self.reset(&cart);
        self.publish();
    }

    fn require_editable(&self, action: &'static str) -> Result<(), CheckoutError> {
        let state = self.session.state;
        if state.is_editable() {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition { state, action })
        }
    }

    fn edit_addresses(
        &mut self,
        action: &'static str,
        edit: impl FnOnce(&mut CheckoutSession),
    ) -> Result<(), CheckoutError> {
        self.require_editable(action)?;
        let before = self.session.effective_shipping_address().clone();
        edit(&mut self.session);
        if *self.session.effective_shipping_address() != before {
            self.invalidate_shipping("shipping destination changed");
        }
        self.finish_edit()
    }

    /// Recompute tax against the live cart and publish, publishing even if
    /// tax fails.
    fn finish_edit(&mut self) -> Result<(), CheckoutError> {
        self.reconcile_cart();
        let outcome = self.refresh_tax();
        self.publish();
        outcome
    }

    /// Take the subtotal from the live cart and drop a quote that no longer
    /// matches it. Returns false if a quote was dropped.
    fn reconcile_cart(&mut self) -> bool {
        let cart = self.cart.snapshot();
        self.session.subtotal = cart.total_price();
        if self.quote_matches_cart(&cart) {
            return true;
        }
        if self.session.state.has_remote_order() {
            self.abandon_order("cart changed after the order was created");
        } else {
            self.invalidate_shipping("cart changed");
        }
        false
    }

    fn refresh_tax(&mut self) -> Result<(), CheckoutError> {
        let destination = self.session.effective_shipping_address();
        if !destination.is_complete() {
            self.session.tax = None;
            return Ok(());
        }

        let result = if self.shipping.zone_for(destination) == Zone::International {
            Ok(TaxResult::no_nexus(self.session.subtotal))
        } else {
            self.tax.compute_tax_for_order(
                self.session.subtotal,
                self.session.shipping_cost(),
                &destination.region,
                Some(destination.postal_code.as_str()),
            )
        };

        match result {
            Ok(tax) => {
                self.session.tax = Some(tax);
                Ok(())
            }
            Err(e) => {
                self.session.tax = None;
                Err(self.engine_failure("tax", e))
            }
        }
    }

    fn invalidate_shipping(&mut self, reason: &str) {
        let had_quote = !self.session.shipping_options.is_empty();
        self.session.clear_quote();
        if self.session.state == CheckoutState::ShippingCalculated {
            self.enter(CheckoutState::EnteringAddress);
        }
        if had_quote {
            self.session.notice = Some(REQUOTE_NOTICE.to_string());
            info!(checkout_id = %self.session.id, reason, "shipping quote invalidated");
        }
    }

    /// Forget a remote order whose contents no longer match the cart.
    fn abandon_order(&mut self, reason: &str) {
        warn!(
            checkout_id = %self.session.id,
            order_id = ?self.session.remote_order_id,
            reason,
            "abandoning remote order"
        );
        self.session.remote_order_id = None;
        self.session.payment_status = PaymentStatus::NotStarted;
        self.session.clear_quote();
        self.session.notice = Some(REQUOTE_NOTICE.to_string());
        self.enter(CheckoutState::EnteringAddress);
    }

    fn quote_matches_cart(&self, cart: &CartState) -> bool {
        match &self.session.quote_basis {
            Some(basis) => {
                basis.subtotal == cart.total_price()
                    && basis.weight == cart.total_weight()
                    && &basis.destination == self.session.effective_shipping_address()
            }
            None => true,
        }
    }

    fn validate_for_order(&self) -> Result<(), CheckoutError> {
        let session = &self.session;
        let mut missing = Vec::new();
        if !looks_like_email(&session.email) {
            missing.push("email".to_string());
        }
        missing.extend(
            session
                .billing
                .missing_fields()
                .iter()
                .map(|f| format!("billing {}", f)),
        );
        if !session.same_as_billing {
            missing.extend(
                session
                    .shipping
                    .missing_fields()
                    .iter()
                    .map(|f| format!("shipping {}", f)),
            );
        }
        if session.selected_option().is_none() {
            missing.push("shipping method".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::Validation { missing })
        }
    }

    fn amounts(&self) -> Result<OrderAmounts, CheckoutError> {
        let session = &self.session;
        if session.selected_option().is_none() || session.tax.is_none() {
            return Err(CheckoutError::ShippingNotCalculated);
        }
        let total = session.total_payable().ok_or(CommerceError::Overflow)?;
        Ok(OrderAmounts {
            subtotal: session.subtotal.minor_units,
            shipping: session.shipping_cost().minor_units,
            tax: session.tax_amount().minor_units,
            total: total.minor_units,
        })
    }

    fn order_request(&self, cart: &CartState) -> Result<CreateOrderRequest, CheckoutError> {
        let session = &self.session;
        let tier = session
            .selected_shipping
            .clone()
            .ok_or(CheckoutError::ShippingNotCalculated)?;
        Ok(CreateOrderRequest {
            line_items: cart
                .lines()
                .iter()
                .map(|line| OrderLineItem {
                    id: line.id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price.minor_units,
                })
                .collect(),
            customer_email: session.email.clone(),
            currency: cart.currency().code().to_string(),
            metadata: OrderMetadata {
                checkout_id: session.id.clone(),
                billing: session.billing.clone(),
                shipping: session.effective_shipping_address().clone(),
                shipping_tier: tier,
                amounts: self.amounts()?,
            },
        })
    }

    fn engine_failure(&self, engine: &'static str, e: CommerceError) -> CheckoutError {
        if matches!(e, CommerceError::EngineContract(_)) {
            error!(checkout_id = %self.session.id, engine, error = %e, "engine contract violated");
        } else {
            warn!(checkout_id = %self.session.id, engine, error = %e, "engine failed");
        }
        CheckoutError::Engine(e)
    }

    /// Replace the session with a fresh one in `Cart`.
    fn reset(&mut self, cart: &CartState) {
        let from = self.session.state;
        let mut fresh = CheckoutSession::new(cart.currency());
        fresh.subtotal = cart.total_price();
        self.session = fresh;
        if from != CheckoutState::Cart {
            info!(checkout_id = %self.session.id, from = %from, to = %CheckoutState::Cart, "checkout reset");
        }
    }

    /// Tear the session down to the receipt.
    fn complete(&mut self, receipt: Receipt) {
        let finished = std::mem::replace(
            &mut self.session,
            CheckoutSession::new(self.cart.snapshot().currency()),
        );
        self.session.id = finished.id;
        self.session.state = finished.state;
        self.session.payment_status = PaymentStatus::Succeeded { receipt };
        self.enter(CheckoutState::PaymentSucceeded);
    }

    fn enter(&mut self, next: CheckoutState) {
        let from = self.session.state;
        debug_assert!(
            from.can_transition_to(next),
            "illegal checkout transition {} -> {}",
            from,
            next
        );
        self.session.state = next;
        info!(checkout_id = %self.session.id, from = %from, to = %next, "checkout transition");
    }

    fn publish(&self) {
        self.tx.send_replace(self.session.clone());
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.trim().contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::checkout::gateway::GatewayError;
    use crate::checkout::stub::{StubGateway, DECLINED_TOKEN};
    use crate::money::{Currency, Money};
    use crate::shipping::ShippingConfig;
    use crate::tax::{JurisdictionRules, TaxTables};
    use rust_decimal_macros::dec;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn seattle() -> Address {
        Address::new("Ada", "Lovelace", "1 Pike St", "Seattle", "WA", "98101", "US")
    }

    fn portland() -> Address {
        Address::new("Ada", "Lovelace", "9 Oak St", "Portland", "OR", "97201", "US")
    }

    struct Fixture {
        checkout: Checkout,
        cart: Arc<CartStore>,
        gateway: Arc<StubGateway>,
    }

    fn fixture() -> Fixture {
        let cart = Arc::new(CartStore::new(Currency::USD));
        let item = CartItem::new("sku-1", "Dragon Figure", usd(2500), dec!(0.5));
        cart.add_line(item.clone()).unwrap();
        cart.add_line(item).unwrap();

        let tables = TaxTables::new().with_jurisdiction(
            "WA",
            JurisdictionRules::flat(dec!(0.065)).with_city("98101", "Seattle", dec!(0.10)),
        );
        let gateway = Arc::new(StubGateway::new());
        let checkout = Checkout::new(
            cart.clone(),
            ShippingEngine::new(ShippingConfig::default(), Currency::USD).unwrap(),
            TaxEngine::new(tables).unwrap(),
            gateway.clone(),
        );
        Fixture {
            checkout,
            cart,
            gateway,
        }
    }

    fn quoted() -> Fixture {
        let mut f = fixture();
        f.checkout.begin().unwrap();
        f.checkout.set_email("ada@example.com").unwrap();
        f.checkout.set_billing(seattle()).unwrap();
        f.checkout.calculate_shipping().unwrap();
        f
    }

    #[test]
    fn test_begin_requires_items() {
        let mut f = fixture();
        f.cart.clear().unwrap();
        assert_eq!(f.checkout.begin(), Err(CheckoutError::EmptyCart));
        assert_eq!(f.checkout.state(), CheckoutState::Cart);
    }

    #[test]
    fn test_tax_follows_complete_address() {
        let mut f = fixture();
        f.checkout.begin().unwrap();
        assert!(f.checkout.session().tax.is_none());

        let mut partial = seattle();
        partial.postal_code.clear();
        f.checkout.set_billing(partial).unwrap();
        assert!(f.checkout.session().tax.is_none());

        f.checkout.update_billing(AddressField::PostalCode, "98101").unwrap();
        let tax = f.checkout.session().tax.clone().unwrap();
        assert_eq!(tax.amount, usd(500));
    }

    #[test]
    fn test_calculate_shipping_selects_cheapest() {
        let f = quoted();
        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::ShippingCalculated);
        assert_eq!(session.selected_shipping, Some(ShippingTierId::new("standard")));
        assert_eq!(session.shipping_cost(), usd(500));
        assert_eq!(session.total_payable(), Some(usd(6000)));
    }

    #[test]
    fn test_calculate_shipping_reports_missing_fields() {
        let mut f = fixture();
        f.checkout.begin().unwrap();
        let mut addr = seattle();
        addr.city.clear();
        f.checkout.set_billing(addr).unwrap();
        match f.checkout.calculate_shipping() {
            Err(CheckoutError::Validation { missing }) => {
                assert_eq!(missing, vec!["shipping city".to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(f.checkout.state(), CheckoutState::EnteringAddress);
    }

    #[test]
    fn test_address_edit_invalidates_quote() {
        let mut f = quoted();
        f.checkout.set_billing(portland()).unwrap();
        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::EnteringAddress);
        assert!(session.shipping_options.is_empty());
        assert!(session.selected_shipping.is_none());
        assert!(session.notice.is_some());
        // Oregon: no nexus.
        assert!(session.tax.as_ref().unwrap().amount.is_zero());
    }

    #[test]
    fn test_billing_edit_while_decoupled_keeps_quote() {
        let mut f = fixture();
        f.checkout.begin().unwrap();
        f.checkout.set_billing(portland()).unwrap();
        f.checkout.set_same_as_billing(false).unwrap();
        // Seeded from billing.
        assert_eq!(f.checkout.session().shipping, portland());
        f.checkout.set_shipping_address(seattle()).unwrap();
        f.checkout.calculate_shipping().unwrap();

        f.checkout.update_billing(AddressField::Street, "10 Elm St").unwrap();
        assert_eq!(f.checkout.state(), CheckoutState::ShippingCalculated);
        assert!(!f.checkout.session().shipping_options.is_empty());
        // Tax follows the shipping destination, not billing.
        assert_eq!(f.checkout.session().tax_amount(), usd(500));
    }

    #[test]
    fn test_toggle_same_as_billing_invalidates() {
        let mut f = quoted();
        f.checkout.set_same_as_billing(false).unwrap();
        assert_eq!(f.checkout.state(), CheckoutState::EnteringAddress);
        assert_eq!(f.checkout.session().shipping, seattle());

        f.checkout.calculate_shipping().unwrap();
        f.checkout.set_same_as_billing(true).unwrap();
        assert_eq!(f.checkout.state(), CheckoutState::EnteringAddress);
    }

    #[test]
    fn test_shipping_edits_rejected_while_aliased() {
        let mut f = quoted();
        assert_eq!(
            f.checkout.update_shipping(AddressField::City, "Tacoma"),
            Err(CheckoutError::ShippingFollowsBilling)
        );
        assert_eq!(
            f.checkout.set_shipping_address(portland()),
            Err(CheckoutError::ShippingFollowsBilling)
        );
    }

    #[test]
    fn test_select_unknown_tier() {
        let mut f = quoted();
        let bogus = ShippingTierId::new("teleport");
        assert_eq!(
            f.checkout.select_shipping(&bogus),
            Err(CheckoutError::UnknownShippingTier(bogus))
        );
        f.checkout.select_shipping(&ShippingTierId::new("expedited")).unwrap();
        assert_eq!(f.checkout.session().total_payable(), Some(usd(5000 + 1500 + 500)));
    }

    #[test]
    fn test_cart_change_invalidates_quote() {
        let mut f = quoted();
        f.cart.set_quantity(&"sku-1".into(), 3).unwrap();
        f.checkout.sync_cart().unwrap();
        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::EnteringAddress);
        assert_eq!(session.subtotal, usd(7500));
        assert!(session.shipping_options.is_empty());
    }

    #[test]
    fn test_select_against_stale_quote_requotes() {
        let mut f = quoted();
        let rx = f.checkout.subscribe();
        f.cart.set_quantity(&"sku-1".into(), 10).unwrap();

        assert_eq!(
            f.checkout.select_shipping(&ShippingTierId::new("expedited")),
            Err(CheckoutError::ShippingNotCalculated)
        );
        let session = rx.borrow().clone();
        assert_eq!(session.state, CheckoutState::EnteringAddress);
        assert_eq!(session.subtotal, usd(25000));
        assert!(session.shipping_options.is_empty());
        assert_eq!(session.selected_shipping, None);
        assert_eq!(session.tax.as_ref().map(|t| t.amount), Some(usd(2500)));
        assert_eq!(session.total_payable(), None);

        let options = f.checkout.calculate_shipping().unwrap();
        assert!(options[0].cost.is_zero());
    }

    #[test]
    fn test_address_edit_taxes_live_subtotal() {
        let mut f = quoted();
        f.cart.set_quantity(&"sku-1".into(), 4).unwrap();
        f.checkout.set_same_as_billing(false).unwrap();
        let session = f.checkout.session();
        assert_eq!(session.subtotal, usd(10000));
        assert_eq!(session.tax.as_ref().map(|t| t.amount), Some(usd(1000)));
    }

    #[test]
    fn test_emptied_cart_returns_to_cart() {
        let mut f = quoted();
        f.cart.clear().unwrap();
        f.checkout.sync_cart().unwrap();
        assert_eq!(f.checkout.state(), CheckoutState::Cart);
        assert!(f.checkout.session().billing.is_blank());
    }

    #[tokio::test]
    async fn test_continue_without_quote() {
        let mut f = fixture();
        f.checkout.begin().unwrap();
        f.checkout.set_billing(seattle()).unwrap();
        assert_eq!(
            f.checkout.continue_to_payment().await,
            Err(CheckoutError::ShippingNotCalculated)
        );
        assert!(f.gateway.order_requests().is_empty());
    }

    #[tokio::test]
    async fn test_continue_requires_email() {
        let mut f = quoted();
        f.checkout.set_email("").unwrap();
        match f.checkout.continue_to_payment().await {
            Err(CheckoutError::Validation { missing }) => assert_eq!(missing, vec!["email"]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(f.checkout.state(), CheckoutState::ShippingCalculated);
    }

    #[tokio::test]
    async fn test_stale_quote_rejected_at_order_time() {
        let mut f = quoted();
        f.cart
            .add_line(CartItem::new("sku-2", "Card Pack", usd(400), dec!(0.1)))
            .unwrap();
        assert_eq!(
            f.checkout.continue_to_payment().await,
            Err(CheckoutError::ShippingNotCalculated)
        );
        assert_eq!(f.checkout.state(), CheckoutState::EnteringAddress);
        assert!(f.gateway.order_requests().is_empty());
    }

    #[tokio::test]
    async fn test_order_request_carries_amounts() {
        let mut f = quoted();
        let order_id = f.checkout.continue_to_payment().await.unwrap();
        assert_eq!(f.checkout.session().remote_order_id, Some(order_id));

        let requests = f.gateway.order_requests();
        let request = &requests[0];
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.line_items[0].unit_price, 2500);
        assert_eq!(request.customer_email, "ada@example.com");
        assert_eq!(
            request.metadata.amounts,
            OrderAmounts {
                subtotal: 5000,
                shipping: 500,
                tax: 500,
                total: 6000
            }
        );
    }

    #[tokio::test]
    async fn test_order_failure_returns_to_shipping() {
        let mut f = quoted();
        f.gateway
            .fail_next_order(GatewayError::rejected("Shipping to this address is unavailable."));
        let err = f.checkout.continue_to_payment().await.unwrap_err();
        assert!(matches!(err, CheckoutError::OrderCreation(_)));

        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::ShippingCalculated);
        assert!(session.remote_order_id.is_none());
        assert_eq!(
            session.notice.as_deref(),
            Some("Shipping to this address is unavailable.")
        );
    }

    #[tokio::test]
    async fn test_payment_success_clears_cart() {
        let mut f = quoted();
        f.checkout.continue_to_payment().await.unwrap();
        let receipt = f
            .checkout
            .submit_payment(PaymentToken::new("tok_visa"))
            .await
            .unwrap();

        assert!(f.cart.snapshot().is_empty());
        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::PaymentSucceeded);
        assert!(session.billing.is_blank());
        assert!(session.remote_order_id.is_none());
        assert_eq!(
            session.payment_status,
            PaymentStatus::Succeeded { receipt }
        );
        assert_eq!(f.gateway.capture_requests()[0].amount, 6000);
    }

    #[tokio::test]
    async fn test_payment_failure_keeps_order_for_retry() {
        let mut f = quoted();
        let order_id = f.checkout.continue_to_payment().await.unwrap();

        let err = f
            .checkout
            .submit_payment(PaymentToken::new(DECLINED_TOKEN))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Payment failed: Your card was declined.");

        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::PaymentFailed);
        assert_eq!(session.remote_order_id.as_ref(), Some(&order_id));
        assert!(matches!(session.payment_status, PaymentStatus::Failed { .. }));
        assert_eq!(f.cart.snapshot().total_items(), 2);

        f.checkout
            .submit_payment(PaymentToken::new("tok_visa"))
            .await
            .unwrap();
        assert_eq!(f.checkout.state(), CheckoutState::PaymentSucceeded);
        assert_eq!(f.gateway.order_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_cart_change_after_order_drops_order() {
        let mut f = quoted();
        f.checkout.continue_to_payment().await.unwrap();
        f.cart.set_quantity(&"sku-1".into(), 1).unwrap();

        let err = f
            .checkout
            .submit_payment(PaymentToken::new("tok_visa"))
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::ShippingNotCalculated);
        assert_eq!(f.checkout.state(), CheckoutState::EnteringAddress);
        assert!(f.checkout.session().remote_order_id.is_none());
        assert!(f.gateway.capture_requests().is_empty());
    }

    #[tokio::test]
    async fn test_edits_locked_once_order_exists() {
        let mut f = quoted();
        f.checkout.continue_to_payment().await.unwrap();
        assert!(matches!(
            f.checkout.set_billing(portland()),
            Err(CheckoutError::InvalidTransition {
                state: CheckoutState::OrderCreated,
                ..
            })
        ));
        assert!(f.checkout.calculate_shipping().is_err());
    }

    #[tokio::test]
    async fn test_submit_payment_before_order() {
        let mut f = quoted();
        assert!(matches!(
            f.checkout.submit_payment(PaymentToken::new("tok_visa")).await,
            Err(CheckoutError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_back_to_cart_discards_session() {
        let mut f = quoted();
        f.checkout.continue_to_payment().await.unwrap();
        f.checkout.back_to_cart();
        let session = f.checkout.session();
        assert_eq!(session.state, CheckoutState::Cart);
        assert!(session.remote_order_id.is_none());
        assert!(session.billing.is_blank());
        assert_eq!(f.cart.snapshot().total_items(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let mut f = fixture();
        let mut rx = f.checkout.subscribe();
        f.checkout.begin().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, CheckoutState::EnteringAddress);

        f.checkout.set_billing(seattle()).unwrap();
        f.checkout.calculate_shipping().unwrap();
        assert_eq!(rx.borrow_and_update().state, CheckoutState::ShippingCalculated);
    }

    #[test]
    fn test_international_destination_is_untaxed() {
        let mut f = fixture();
        f.checkout.begin().unwrap();
        f.checkout
            .set_billing(Address::new("Ada", "Lovelace", "1 Hay St", "Perth", "WA", "6000", "AU"))
            .unwrap();
        let tax = f.checkout.session().tax.clone().unwrap();
        assert!(!tax.jurisdiction_applies);
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada lovelace@example.com"));
    }
}
