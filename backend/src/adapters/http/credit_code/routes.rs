//! Credit code routes, mounted under `/api`.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{issue_credit_code, redeem_credit_code};

/// - `POST /credit-codes` - Mint a code
/// - `POST /credit-codes/redeem` - Redeem a code
pub fn credit_code_routes() -> Router<AppState> {
    Router::new()
        .route("/credit-codes", post(issue_credit_code))
        .route("/credit-codes/redeem", post(redeem_credit_code))
}
