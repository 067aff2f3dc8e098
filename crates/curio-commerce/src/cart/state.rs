//! Cart lines, cart snapshots and the cart reducer.

use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An item offered for purchase, as handed to `CartAction::AddLine`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Product identifier; one cart line per product.
    pub id: ProductId,
    /// Product name (denormalized for display).
    pub name: String,
    /// Unit price.
    pub unit_price: Money,
    /// Image reference for the cart drawer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Shipping weight of one unit, in pounds.
    pub unit_weight: Decimal,
}

impl CartItem {
    /// Create a new cart item.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        unit_weight: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            image_ref: None,
            unit_weight,
        }
    }

    /// Attach an image reference.
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// A line in the cart. Quantity is always at least 1.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub unit_weight: Decimal,
    pub quantity: u32,
}

impl CartLine {
    fn from_item(item: CartItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            unit_price: item.unit_price,
            image_ref: item.image_ref,
            unit_weight: item.unit_weight,
            quantity: 1,
        }
    }

    /// Line total (unit price x quantity).
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.try_multiply(i64::from(self.quantity))
    }
}

/// Actions accepted by the cart reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Add one unit of an item, creating the line if needed. Opens the cart.
    AddLine(CartItem),
    /// Remove a line regardless of its quantity.
    RemoveLine(ProductId),
    /// Set a line's quantity. Zero or negative removes the line.
    SetQuantity(ProductId, i64),
    /// Remove every line. Leaves the open/closed flag alone.
    Clear,
    Open,
    Close,
    Toggle,
}

/// An immutable cart snapshot.
///
/// `total_items`, `total_price` and `total_weight` are derived from `lines`
/// every time the reducer runs and have no setters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CartState {
    lines: Vec<CartLine>,
    is_open: bool,
    currency: Currency,
    total_items: u64,
    total_price: Money,
    total_weight: Decimal,
}

impl CartState {
    /// Create an empty, closed cart.
    pub fn empty(currency: Currency) -> Self {
        Self {
            lines: Vec::new(),
            is_open: false,
            currency,
            total_items: 0,
            total_price: Money::zero(currency),
            total_weight: Decimal::ZERO,
        }
    }

    /// Apply an action, returning the next snapshot.
    ///
    /// Fails without producing a state if the new totals would overflow, if
    /// an added item is priced in a different currency or if it weighs less
    /// than nothing.
    pub fn reduce(&self, action: CartAction) -> Result<CartState, CommerceError> {
        let mut lines = self.lines.clone();
        let mut is_open = self.is_open;

        match action {
            CartAction::AddLine(item) => {
                if item.unit_price.currency != self.currency {
                    return Err(CommerceError::CurrencyMismatch {
                        expected: self.currency.code().to_string(),
                        got: item.unit_price.currency.code().to_string(),
                    });
                }
                if item.unit_weight < Decimal::ZERO {
                    return Err(CommerceError::InvalidWeight {
                        product: item.id.to_string(),
                        weight: item.unit_weight,
                    });
                }
                match lines.iter_mut().find(|l| l.id == item.id) {
                    Some(line) => {
                        line.quantity = line
                            .quantity
                            .checked_add(1)
                            .ok_or(CommerceError::Overflow)?;
                    }
                    None => lines.push(CartLine::from_item(item)),
                }
                is_open = true;
            }
            CartAction::RemoveLine(id) => {
                lines.retain(|l| l.id != id);
            }
            CartAction::SetQuantity(id, quantity) => {
                if quantity <= 0 {
                    lines.retain(|l| l.id != id);
                } else if let Some(line) = lines.iter_mut().find(|l| l.id == id) {
                    line.quantity = u32::try_from(quantity).map_err(|_| CommerceError::Overflow)?;
                }
            }
            CartAction::Clear => lines.clear(),
            CartAction::Open => is_open = true,
            CartAction::Close => is_open = false,
            CartAction::Toggle => is_open = !is_open,
        }

        Self::with_totals(lines, is_open, self.currency)
    }

    fn with_totals(
        lines: Vec<CartLine>,
        is_open: bool,
        currency: Currency,
    ) -> Result<CartState, CommerceError> {
        let total_items = lines.iter().map(|l| u64::from(l.quantity)).sum();
        let totals = lines
            .iter()
            .map(|l| l.line_total().ok_or(CommerceError::Overflow))
            .collect::<Result<Vec<_>, _>>()?;
        let total_price =
            Money::try_sum(totals.iter(), currency).ok_or(CommerceError::Overflow)?;
        let total_weight = lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| {
                l.unit_weight
                    .checked_mul(Decimal::from(l.quantity))
                    .and_then(|w| acc.checked_add(w))
            })
            .ok_or(CommerceError::Overflow)?;

        Ok(CartState {
            lines,
            is_open,
            currency,
            total_items,
            total_price,
            total_weight,
        })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Sum of line quantities.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Merchandise subtotal.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Total shipping weight in pounds.
    pub fn total_weight(&self) -> Decimal {
        self.total_weight
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get a line by product ID.
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::empty(Currency::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem::new(id, format!("Card {}", id), Money::new(cents, Currency::USD), dec!(0.25))
    }

    fn catalog_item(id: &str) -> CartItem {
        let cents = match id {
            "a" => 199,
            "b" => 2500,
            "c" => 1,
            _ => 99_999,
        };
        item(id, cents)
    }

    fn any_action() -> impl Strategy<Value = CartAction> {
        let id = prop::sample::select(vec!["a", "b", "c", "d"]);
        prop_oneof![
            4 => id.clone().prop_map(|id| CartAction::AddLine(catalog_item(id))),
            3 => (id.clone(), -3i64..40)
                .prop_map(|(id, qty)| CartAction::SetQuantity(ProductId::new(id), qty)),
            2 => id.prop_map(|id| CartAction::RemoveLine(ProductId::new(id))),
            1 => Just(CartAction::Clear),
            1 => Just(CartAction::Toggle),
        ]
    }

    fn apply(state: CartState, actions: Vec<CartAction>) -> CartState {
        actions
            .into_iter()
            .fold(state, |s, a| s.reduce(a).unwrap())
    }

    fn assert_totals_consistent(state: &CartState) {
        let items: u64 = state.lines().iter().map(|l| u64::from(l.quantity)).sum();
        let price: i64 = state
            .lines()
            .iter()
            .map(|l| l.unit_price.minor_units * i64::from(l.quantity))
            .sum();
        let weight: Decimal = state
            .lines()
            .iter()
            .map(|l| l.unit_weight * Decimal::from(l.quantity))
            .sum();
        assert_eq!(state.total_items(), items);
        assert_eq!(state.total_price().minor_units, price);
        assert_eq!(state.total_weight(), weight);
        assert!(state.lines().iter().all(|l| l.quantity >= 1));

        let mut ids: Vec<_> = state.lines().iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), state.lines().len());
    }

    #[test]
    fn test_add_line_inserts_with_quantity_one_and_opens() {
        let state = CartState::empty(Currency::USD)
            .reduce(CartAction::AddLine(item("sku-1", 2500)))
            .unwrap();
        assert_eq!(state.lines().len(), 1);
        assert_eq!(state.lines()[0].quantity, 1);
        assert!(state.is_open());
        assert_eq!(state.total_price().minor_units, 2500);
    }

    #[test]
    fn test_add_same_item_increments_quantity() {
        let state = apply(
            CartState::empty(Currency::USD),
            vec![
                CartAction::AddLine(item("sku-1", 2500)),
                CartAction::Close,
                CartAction::AddLine(item("sku-1", 2500)),
            ],
        );
        assert_eq!(state.lines().len(), 1);
        assert_eq!(state.total_items(), 2);
        assert_eq!(state.total_price().minor_units, 5000);
        assert!(state.is_open());
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes_line() {
        let base = apply(
            CartState::empty(Currency::USD),
            vec![CartAction::AddLine(item("sku-1", 2500)), CartAction::AddLine(item("sku-2", 100))],
        );

        let zeroed = base
            .reduce(CartAction::SetQuantity(ProductId::new("sku-1"), 0))
            .unwrap();
        assert!(zeroed.line(&ProductId::new("sku-1")).is_none());

        let negative = base
            .reduce(CartAction::SetQuantity(ProductId::new("sku-1"), -5))
            .unwrap();
        assert!(negative.line(&ProductId::new("sku-1")).is_none());
        assert_eq!(negative.total_items(), 1);
        assert_eq!(negative.total_price().minor_units, 100);
    }

    #[test]
    fn test_set_quantity_unknown_id_is_noop() {
        let base = apply(
            CartState::empty(Currency::USD),
            vec![CartAction::AddLine(item("sku-1", 2500))],
        );
        let next = base
            .reduce(CartAction::SetQuantity(ProductId::new("nope"), 4))
            .unwrap();
        assert_eq!(next, base);
    }

    #[test]
    fn test_clear_resets_totals_and_keeps_open_flag() {
        let state = apply(
            CartState::empty(Currency::USD),
            vec![CartAction::AddLine(item("sku-1", 2500)), CartAction::Clear],
        );
        assert!(state.is_empty());
        assert_eq!(state.total_items(), 0);
        assert!(state.total_price().is_zero());
        assert!(state.is_open());
    }

    #[test]
    fn test_open_close_toggle() {
        let state = CartState::empty(Currency::USD);
        assert!(state.reduce(CartAction::Toggle).unwrap().is_open());
        assert!(!state.reduce(CartAction::Open).unwrap().reduce(CartAction::Close).unwrap().is_open());
    }

    #[test]
    fn test_totals_track_every_mutation() {
        let actions = vec![
            CartAction::AddLine(item("a", 199)),
            CartAction::AddLine(item("b", 2500)),
            CartAction::AddLine(item("a", 199)),
            CartAction::SetQuantity(ProductId::new("b"), 7),
            CartAction::AddLine(item("c", 1)),
            CartAction::RemoveLine(ProductId::new("a")),
            CartAction::SetQuantity(ProductId::new("c"), 3),
            CartAction::SetQuantity(ProductId::new("b"), -1),
            CartAction::AddLine(item("a", 199)),
        ];
        let mut state = CartState::empty(Currency::USD);
        for action in actions {
            state = state.reduce(action).unwrap();
            assert_totals_consistent(&state);
        }
        assert_eq!(state.total_items(), 4);
        assert_eq!(state.total_price().minor_units, 3 + 199);
    }

    proptest! {
        #[test]
        fn test_totals_consistent_for_any_action_sequence(
            actions in prop::collection::vec(any_action(), 0..60),
        ) {
            let mut state = CartState::empty(Currency::USD);
            for action in actions {
                state = state.reduce(action).unwrap();
                assert_totals_consistent(&state);
            }
        }
    }

    #[test]
    fn test_total_weight() {
        let state = apply(
            CartState::empty(Currency::USD),
            vec![
                CartAction::AddLine(item("a", 100)),
                CartAction::SetQuantity(ProductId::new("a"), 4),
            ],
        );
        assert_eq!(state.total_weight(), dec!(1.00));
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let eur = CartItem::new("x", "Euro card", Money::new(100, Currency::EUR), dec!(0.1));
        let result = CartState::empty(Currency::USD).reduce(CartAction::AddLine(eur));
        assert!(matches!(result, Err(CommerceError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_overflowing_total_rejected() {
        let pricey = CartItem::new("x", "Grail", Money::new(i64::MAX / 2, Currency::USD), dec!(1));
        let state = CartState::empty(Currency::USD)
            .reduce(CartAction::AddLine(pricey))
            .unwrap();
        let result = state.reduce(CartAction::SetQuantity(ProductId::new("x"), 3));
        assert_eq!(result, Err(CommerceError::Overflow));
    }

    #[test]
    fn test_overflowing_weight_rejected() {
        let anvil = CartItem::new("x", "Anvil", Money::new(100, Currency::USD), Decimal::MAX);
        let state = CartState::empty(Currency::USD)
            .reduce(CartAction::AddLine(anvil.clone()))
            .unwrap();
        assert_eq!(state.total_weight(), Decimal::MAX);

        assert_eq!(state.reduce(CartAction::AddLine(anvil)), Err(CommerceError::Overflow));
        let result = state.reduce(CartAction::SetQuantity(ProductId::new("x"), 2));
        assert_eq!(result, Err(CommerceError::Overflow));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let odd = CartItem::new("x", "Balloon", Money::new(100, Currency::USD), dec!(-0.5));
        let result = CartState::empty(Currency::USD).reduce(CartAction::AddLine(odd));
        assert!(matches!(result, Err(CommerceError::InvalidWeight { .. })));

        let weightless = CartItem::new("y", "Gift card", Money::new(100, Currency::USD), dec!(0));
        let state = CartState::empty(Currency::USD)
            .reduce(CartAction::AddLine(weightless))
            .unwrap();
        assert_eq!(state.total_weight(), Decimal::ZERO);
    }
}
