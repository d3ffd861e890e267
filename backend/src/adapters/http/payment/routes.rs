//! Payment routes.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    create_credit_purchase, create_rebind_order, get_order_status, payment_notify, payment_return,
};

/// Gateway callbacks. No user authentication; notifications are verified
/// by signature.
///
/// - `GET|POST /notify`
/// - `GET /return`
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/notify", get(payment_notify).post(payment_notify))
        .route("/return", get(payment_return))
}

/// Authenticated order routes, mounted under `/api`.
///
/// - `POST /orders/credit`
/// - `POST /orders/rebind`
/// - `GET /orders/:pay_id`
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/credit", post(create_credit_purchase))
        .route("/orders/rebind", post(create_rebind_order))
        .route("/orders/:pay_id", get(get_order_status))
}
