//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter; `router` stitches them
//! together with the shared middleware stack.

pub mod credit_code;
pub mod entitlement;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod router;
pub mod service;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::app_router;
pub use state::{AppState, LedgerPorts, LedgerSettings};
