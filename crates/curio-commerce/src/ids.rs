//! Newtype IDs for type-safe identifiers.
//!
//! A remote order id and a product id are both strings on the wire; the
//! newtypes keep them from being swapped inside the checkout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Catalog product identifier; also keys a cart line.
    ProductId
);
define_id!(
    /// Identifier of a configured shipping tier.
    ShippingTierId
);
define_id!(
    /// Local checkout session identifier.
    CheckoutId
);
define_id!(
    /// Order identifier assigned by the payment gateway.
    RemoteOrderId
);
define_id!(
    /// Receipt identifier assigned by the payment gateway.
    ReceiptId
);
define_id!(
    /// Opaque payment-method token handed over by the payment UI.
    PaymentToken
);

impl CheckoutId {
    /// Generate a new unique checkout ID.
    pub fn generate() -> Self {
        Self(generate_id())
    }
}

/// Generate a unique ID from the clock and a process-wide counter.
fn generate_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

    format!("chk_{:x}{:04x}", timestamp, counter & 0xffff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("sku-1");
        assert_eq!(id.as_str(), "sku-1");
    }

    #[test]
    fn test_checkout_id_generation() {
        let id1 = CheckoutId::generate();
        let id2 = CheckoutId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("chk_"));
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = RemoteOrderId::new("ord_42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ord_42\"");
    }

    #[test]
    fn test_id_display() {
        let id = ShippingTierId::from("standard");
        assert_eq!(format!("{}", id), "standard");
    }
}
