//! The cart store: a single writer over the cart reducer.

use super::state::{CartAction, CartItem, CartState};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Currency;
use tokio::sync::watch;

/// Holds the current cart snapshot and publishes every change.
///
/// Each dispatch runs the reducer under the channel's write lock, so a
/// reader either sees the snapshot before an action or the one after it,
/// never a partially applied one.
#[derive(Debug)]
pub struct CartStore {
    tx: watch::Sender<CartState>,
}

impl CartStore {
    /// Create a store holding an empty cart.
    pub fn new(currency: Currency) -> Self {
        Self::with_state(CartState::empty(currency))
    }

    /// Create a store from an existing snapshot.
    pub fn with_state(state: CartState) -> Self {
        Self {
            tx: watch::Sender::new(state),
        }
    }

    /// Apply an action.
    ///
    /// A rejected action leaves the published snapshot untouched.
    pub fn dispatch(&self, action: CartAction) -> Result<(), CommerceError> {
        let mut outcome = Ok(());
        let label = action_label(&action);
        self.tx.send_if_modified(|state| match state.reduce(action) {
            Ok(next) => {
                let changed = next != *state;
                *state = next;
                changed
            }
            Err(e) => {
                tracing::warn!(action = label, error = %e, "cart action rejected");
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    pub fn add_line(&self, item: CartItem) -> Result<(), CommerceError> {
        self.dispatch(CartAction::AddLine(item))
    }

    pub fn remove_line(&self, id: &ProductId) -> Result<(), CommerceError> {
        self.dispatch(CartAction::RemoveLine(id.clone()))
    }

    pub fn set_quantity(&self, id: &ProductId, quantity: i64) -> Result<(), CommerceError> {
        self.dispatch(CartAction::SetQuantity(id.clone(), quantity))
    }

    pub fn clear(&self) -> Result<(), CommerceError> {
        self.dispatch(CartAction::Clear)
    }

    pub fn open(&self) -> Result<(), CommerceError> {
        self.dispatch(CartAction::Open)
    }

    pub fn close(&self) -> Result<(), CommerceError> {
        self.dispatch(CartAction::Close)
    }

    pub fn toggle(&self) -> Result<(), CommerceError> {
        self.dispatch(CartAction::Toggle)
    }

    /// Clone the current snapshot.
    pub fn snapshot(&self) -> CartState {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot changes (read-only).
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.tx.subscribe()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}

fn action_label(action: &CartAction) -> &'static str {
    match action {
        CartAction::AddLine(_) => "add_line",
        CartAction::RemoveLine(_) => "remove_line",
        CartAction::SetQuantity(..) => "set_quantity",
        CartAction::Clear => "clear",
        CartAction::Open => "open",
        CartAction::Close => "close",
        CartAction::Toggle => "toggle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn card(id: &str) -> CartItem {
        CartItem::new(id, "Holo card", Money::new(2500, Currency::USD), dec!(0.1))
    }

    #[test]
    fn test_store_reads_after_write() {
        let store = CartStore::new(Currency::USD);
        store.add_line(card("sku-1")).unwrap();
        store.add_line(card("sku-1")).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.total_items(), 2);
        assert_eq!(snapshot.total_price().minor_units, 5000);
    }

    #[test]
    fn test_rejected_action_keeps_snapshot() {
        let store = CartStore::new(Currency::USD);
        store.add_line(card("sku-1")).unwrap();
        let before = store.snapshot();

        let euro = CartItem::new("eu", "Euro card", Money::new(100, Currency::EUR), dec!(0.1));
        assert!(store.add_line(euro).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let store = CartStore::new(Currency::USD);
        let mut rx = store.subscribe();

        store.add_line(card("sku-1")).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().total_items(), 1);

        // No-op action does not notify.
        store.set_quantity(&ProductId::new("missing"), 3).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_rapid_steppers_do_not_lose_updates() {
        let store = Arc::new(CartStore::new(Currency::USD));
        store.add_line(card("sku-1")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.add_line(card("sku-1")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.total_items(), 201);
        assert_eq!(snapshot.total_price().minor_units, 201 * 2500);
    }
}
