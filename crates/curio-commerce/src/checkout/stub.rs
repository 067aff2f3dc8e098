//! In-memory payment gateway.
//!
//! Behaves like a well-mannered remote gateway without any I/O: sequential
//! ids, the same validation a real gateway applies, and failure injection
//! for exercising the unhappy paths.

use super::gateway::{
    CapturePaymentRequest, CreateOrderRequest, GatewayError, PaymentGateway, Receipt, RemoteOrder,
};
use crate::ids::{ReceiptId, RemoteOrderId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Token the stub always declines.
pub const DECLINED_TOKEN: &str = "tok_declined";

#[derive(Debug, Default)]
struct StubState {
    order_counter: u64,
    receipt_counter: u64,
    orders: HashMap<RemoteOrderId, CreateOrderRequest>,
    paid: HashSet<RemoteOrderId>,
    order_requests: Vec<CreateOrderRequest>,
    capture_requests: Vec<CapturePaymentRequest>,
    fail_next_order: Option<GatewayError>,
    fail_next_payment: Option<GatewayError>,
    declined_tokens: HashSet<String>,
}

/// Stub gateway for tests and dry runs.
#[derive(Debug)]
pub struct StubGateway {
    state: Mutex<StubState>,
}

impl StubGateway {
    pub fn new() -> Self {
        let mut state = StubState::default();
        state.declined_tokens.insert(DECLINED_TOKEN.to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    /// Fail the next `create_order` call with `error`.
    pub fn fail_next_order(&self, error: GatewayError) {
        self.lock().fail_next_order = Some(error);
    }

    /// Fail the next `capture_payment` call with `error`.
    pub fn fail_next_payment(&self, error: GatewayError) {
        self.lock().fail_next_payment = Some(error);
    }

    /// Decline every capture presenting `token`.
    pub fn decline_token(&self, token: impl Into<String>) {
        self.lock().declined_tokens.insert(token.into());
    }

    /// Every `create_order` request received, including rejected ones.
    pub fn order_requests(&self) -> Vec<CreateOrderRequest> {
        self.lock().order_requests.clone()
    }

    /// Every `capture_payment` request received, including rejected ones.
    pub fn capture_requests(&self) -> Vec<CapturePaymentRequest> {
        self.lock().capture_requests.clone()
    }

    pub fn is_paid(&self, order_id: &RemoteOrderId) -> bool {
        self.lock().paid.contains(order_id)
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<RemoteOrder, GatewayError> {
        let mut state = self.lock();
        state.order_requests.push(request.clone());

        if let Some(error) = state.fail_next_order.take() {
            return Err(error);
        }
        if request.line_items.is_empty() {
            return Err(GatewayError::rejected("Order must contain at least one item."));
        }
        if !request.customer_email.contains('@') {
            return Err(GatewayError::rejected("A valid email address is required."));
        }
        if request.line_items.iter().any(|item| item.quantity == 0) {
            return Err(GatewayError::rejected("Item quantities must be positive."));
        }

        state.order_counter += 1;
        let order_id = RemoteOrderId::new(format!("ord_stub_{}", state.order_counter));
        state.orders.insert(order_id.clone(), request.clone());

        tracing::debug!(order_id = %order_id, "stub: order created");
        Ok(RemoteOrder { order_id })
    }

    async fn capture_payment(&self, request: &CapturePaymentRequest) -> Result<Receipt, GatewayError> {
        let mut state = self.lock();
        state.capture_requests.push(request.clone());

        if let Some(error) = state.fail_next_payment.take() {
            return Err(error);
        }
        let Some(order) = state.orders.get(&request.order_id) else {
            return Err(GatewayError::rejected("No such order."));
        };
        if state.paid.contains(&request.order_id) {
            return Err(GatewayError::rejected("This order has already been paid."));
        }
        if request.amount != order.metadata.amounts.total || request.currency != order.currency {
            return Err(GatewayError::rejected("Payment amount does not match the order total."));
        }
        if state.declined_tokens.contains(request.payment_token.as_str()) {
            return Err(GatewayError::rejected("Your card was declined."));
        }

        state.receipt_counter += 1;
        let id = ReceiptId::new(format!("rcpt_stub_{}", state.receipt_counter));
        state.paid.insert(request.order_id.clone());

        let mut extra = serde_json::Map::new();
        extra.insert("orderId".into(), request.order_id.as_str().into());
        extra.insert("amount".into(), request.amount.into());
        extra.insert("currency".into(), request.currency.clone().into());

        tracing::debug!(order_id = %request.order_id, receipt_id = %id, "stub: payment captured");
        Ok(Receipt {
            id,
            created_at: Utc::now(),
            extra,
        })
    }
}
