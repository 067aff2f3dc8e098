//! Shopping cart module.
//!
//! `CartState` is an immutable snapshot produced by a pure reducer;
//! `CartStore` serialises mutations and publishes each new snapshot.

mod state;
mod store;

pub use state::{CartAction, CartItem, CartLine, CartState};
pub use store::CartStore;
