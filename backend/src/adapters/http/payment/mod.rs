//! HTTP adapter for payment endpoints.
//!
//! - `GET|POST /notify` - Gateway payment notification (signature verified)
//! - `GET /return` - Post-payment landing page
//! - `POST /api/orders/credit` - Buy credit
//! - `POST /api/orders/rebind` - Pay to move the token to a new origin
//! - `GET /api/orders/:pay_id` - Order status

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::{gateway_routes, order_routes};
