//! Payment gateway port and wire types.
//!
//! The gateway owns remote orders and payment capture. The checkout only
//! talks to it through [`PaymentGateway`]; adapters live elsewhere
//! (`StubGateway` here, the HTTP adapter in `curio-gateway`).

use crate::checkout::Address;
use crate::ids::{CheckoutId, PaymentToken, ProductId, ReceiptId, RemoteOrderId, ShippingTierId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One purchased product as sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor units.
    pub unit_price: i64,
}

/// Amount breakdown attached to an order, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAmounts {
    pub subtotal: i64,
    pub shipping: i64,
    pub tax: i64,
    pub total: i64,
}

/// Free-form order context: who pays, where it ships, how it was priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    pub checkout_id: CheckoutId,
    pub billing: Address,
    pub shipping: Address,
    pub shipping_tier: ShippingTierId,
    pub amounts: OrderAmounts,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub line_items: Vec<OrderLineItem>,
    pub customer_email: String,
    /// ISO 4217 code.
    pub currency: String,
    pub metadata: OrderMetadata,
}

/// Gateway response to order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrder {
    pub order_id: RemoteOrderId,
}

/// Body of `POST /orders/{id}/payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePaymentRequest {
    /// Amount to capture in minor units.
    pub amount: i64,
    pub currency: String,
    pub order_id: RemoteOrderId,
    pub payment_token: PaymentToken,
}

/// Confirmation of a captured payment.
///
/// Fields the gateway adds beyond `id` and `createdAt` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: ReceiptId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Failures reported by a payment gateway adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// The gateway refused the request (validation failure, card decline).
    #[error("{message}")]
    Rejected { message: String },

    /// Non-success HTTP status without a usable rejection message.
    #[error("Payment gateway error (HTTP {status})")]
    Http { status: u16, message: String },

    /// The request never reached the gateway.
    #[error("Could not reach the payment gateway: {0}")]
    Network(String),

    /// No answer within the configured timeout.
    #[error("The payment gateway did not respond in time")]
    Timeout,

    /// The gateway answered with something we could not decode.
    #[error("Unexpected response from the payment gateway: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn rejected(message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            message: message.into(),
        }
    }

    /// Text shown to the shopper. Gateway rejections are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Rejected { message } => message.clone(),
            GatewayError::Http { message, .. } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Remote order and payment operations.
///
/// Implementations must not retry on their own; a retry is always a
/// shopper action.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a remote order for the priced cart.
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<RemoteOrder, GatewayError>;

    /// Capture payment against an existing remote order.
    async fn capture_payment(&self, request: &CapturePaymentRequest) -> Result<Receipt, GatewayError>;
}
