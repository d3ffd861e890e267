//! Payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for the merchant gateway's
//! form-encoded HTTP API:
//! - Order creation with an MD5-signed request
//! - Order state queries
//!
//! Notifications from the gateway arrive through the HTTP adapter's
//! `/notify` route, not here.

mod epay_gateway;
mod mock_gateway;
mod response_types;

pub use epay_gateway::{EpayConfig, EpayGateway};
pub use mock_gateway::MockPaymentGateway;
pub use response_types::{EpayEnvelope, EpayOrderData};
