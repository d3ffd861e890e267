//! HTTP middleware for axum.
//!
//! - `auth` - Bearer-token middleware and the `RequireAuth` extractor
//! - `client_origin` - Client IP extraction behind reverse proxies

pub mod auth;
pub mod client_origin;

pub use auth::{auth_middleware, AuthRejection, AuthState, RequireAuth};
pub use client_origin::ClientOrigin;
