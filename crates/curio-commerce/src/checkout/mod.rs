//! Checkout module.
//!
//! Addresses, the checkout state machine, the observable session, the
//! payment gateway port and the orchestrator that ties them together.

mod address;
mod error;
mod flow;
mod gateway;
mod orchestrator;
mod session;
mod stub;

pub use address::{Address, AddressField};
pub use error::CheckoutError;
pub use flow::CheckoutState;
pub use gateway::{
    CapturePaymentRequest, CreateOrderRequest, GatewayError, OrderAmounts, OrderLineItem,
    OrderMetadata, PaymentGateway, Receipt, RemoteOrder,
};
pub use orchestrator::Checkout;
pub use session::{CheckoutSession, PaymentStatus};
pub use stub::{StubGateway, DECLINED_TOKEN};
