//! HTTP adapter for entitlement endpoints.
//!
//! - `POST /verify` - Verify a token and consume one credit (public)
//! - `POST /api/tokens` - Issue the caller's token
//! - `GET /api/entitlements/me` - Caller's account info

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::{entitlement_routes, verify_routes};
