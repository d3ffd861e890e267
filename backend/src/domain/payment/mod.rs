//! Payment domain module.
//!
//! Orders placed with the external payment gateway and the rules for
//! reconciling the gateway's notifications against them exactly once.
//!
//! # Module Structure
//!
//! - `price` - Money in cents with the gateway's two-decimal text form
//! - `status` - Order lifecycle state machine
//! - `order` - The payment order entity and its settlement effect
//! - `correlation` - The opaque `param` round-tripped through the gateway
//! - `notification` - Parsed webhook parameters
//! - `signature` - Gateway signature field orders and MD5 signing
//! - `errors` - Reconciliation and ordering failures

mod correlation;
mod errors;
mod notification;
mod order;
mod price;
mod signature;
mod status;

pub use correlation::CorrelationParam;
pub use errors::{PaymentOrderError, ReconcileError, ReconcileOutcome};
pub use notification::PaymentNotification;
pub use order::{OrderKind, PaidDetails, PaymentOrder};
pub use price::Price;
pub use signature::{GatewaySigner, CREATE_ORDER_SIGNATURE_FIELDS, NOTIFY_SIGNATURE_FIELDS};
pub use status::OrderStatus;
