//! Routes for token issuance, account info and verification.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{get_my_entitlement, issue_token, verify_token};

/// Public verification route, called by protected services.
///
/// - `POST /verify`
pub fn verify_routes() -> Router<AppState> {
    Router::new().route("/verify", post(verify_token))
}

/// Authenticated routes, mounted under `/api`.
///
/// - `POST /tokens` - Issue the first token
/// - `GET /entitlements/me` - Account info
pub fn entitlement_routes() -> Router<AppState> {
    Router::new()
        .route("/tokens", post(issue_token))
        .route("/entitlements/me", get(get_my_entitlement))
}
