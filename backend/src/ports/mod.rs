//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `EntitlementRepository` - Bindings and credit, with atomic decrement
//! - `CreditCodeRepository` - Single-use codes, with atomic redemption
//! - `PaymentOrderRepository` - Orders, with atomic settlement
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Order creation and query at the payment gateway
//! - `ChatNotifier` - Best-effort messages to the identity's chat
//! - `IntentAuthenticator` - Bearer-token validation for the front end

mod chat_notifier;
mod credit_code_repository;
mod entitlement_repository;
mod intent_authenticator;
mod payment_gateway;
mod payment_order_repository;

pub use chat_notifier::{ChatNotifier, PaymentNotice};
pub use credit_code_repository::{CreditCodeRepository, RedeemOutcome, SaveResult};
pub use entitlement_repository::{CreditDecrement, EntitlementRepository};
pub use intent_authenticator::IntentAuthenticator;
pub use payment_gateway::{
    CreateOrderRequest, GatewayOrder, GatewayOrderState, PaymentError, PaymentErrorCode,
    PaymentGateway,
};
pub use payment_order_repository::{PaymentOrderRepository, SettlementEffect, SettlementOutcome};
