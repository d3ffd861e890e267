//! HTTP adapter for credit code endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::credit_code_routes;
