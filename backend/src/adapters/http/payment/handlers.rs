//! HTTP handlers for payment orders and the gateway callbacks.

use std::collections::HashMap;

use axum::extract::{Form, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    CheckOrderStatusQuery, CreateCreditPurchaseCommand, CreateRebindOrderCommand,
    ReconcilePaymentCommand,
};
use crate::domain::payment::ReconcileError;

use super::dto::{
    CreateCreditPurchaseRequest, CreateRebindOrderRequest, OrderResponse, PlacedOrderResponse,
};

/// Bodies the gateway understands.
const ACK_SUCCESS: &str = "success";
const ACK_FAIL: &str = "fail";

// ════════════════════════════════════════════════════════════════════════════════
// Gateway callbacks (public)
// ════════════════════════════════════════════════════════════════════════════════

/// GET|POST /notify - Payment notification from the gateway.
///
/// Parameters come from the query string and, for POST, the urlencoded body;
/// body values win. The plaintext answer tells the gateway whether to retry.
pub async fn payment_notify(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    form: Option<Form<HashMap<String, String>>>,
) -> Response {
    let mut params = query;
    if let Some(Form(body)) = form {
        params.extend(body);
    }

    tracing::info!(
        order_id = params.get("orderId").map(String::as_str).unwrap_or(""),
        field_count = params.len(),
        "Payment notification received"
    );

    match state
        .reconcile_payment
        .handle(ReconcilePaymentCommand { params })
        .await
    {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Payment notification acknowledged");
            (StatusCode::OK, ACK_SUCCESS).into_response()
        }
        Err(err) => notify_error_response(err),
    }
}

fn notify_error_response(err: ReconcileError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, retryable = err.is_retryable(), "Payment notification failed");
    } else {
        tracing::warn!(error = %err, "Payment notification rejected");
    }
    (status, ACK_FAIL).into_response()
}

/// GET /return - Where the payer's browser lands after paying. No side effects.
pub async fn payment_return() -> Html<&'static str> {
    Html(RETURN_PAGE)
}

const RETURN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Payment received</title>
  <style>
    body { font-family: sans-serif; background: #f5f5f5; display: flex; justify-content: center; padding-top: 15vh; }
    .card { background: #fff; border-radius: 8px; padding: 2rem 3rem; text-align: center; box-shadow: 0 2px 8px rgba(0,0,0,.1); }
    h1 { color: #2e7d32; }
  </style>
</head>
<body>
  <div class="card">
    <h1>Payment received</h1>
    <p>Your order is being processed and will be applied to your account shortly.</p>
    <p>You can return to the chat to check your account.</p>
  </div>
</body>
</html>
"#;

// ════════════════════════════════════════════════════════════════════════════════
// Orders (authenticated)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/orders/credit - Place a credit purchase.
pub async fn create_credit_purchase(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<CreateCreditPurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateCreditPurchaseCommand {
        identity: caller.identity,
        count: request.count,
    };

    let placed = state.create_credit_purchase.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PlacedOrderResponse::from(placed))))
}

/// POST /api/orders/rebind - Place an origin rebind.
pub async fn create_rebind_order(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<CreateRebindOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateRebindOrderCommand {
        identity: caller.identity,
        new_origin: request.new_origin,
    };

    let placed = state.create_rebind_order.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PlacedOrderResponse::from(placed))))
}

/// GET /api/orders/:pay_id - Order status, refreshed from the gateway while pending.
pub async fn get_order_status(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(pay_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let query = CheckOrderStatusQuery {
        identity: caller.identity,
        pay_id,
    };

    let result = state.check_order_status.handle(query).await?;

    Ok(Json(OrderResponse::from(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Price;

    async fn text_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn rejected_notification_is_400_fail() {
        let response = notify_error_response(ReconcileError::SignatureMismatch);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text_of(response).await, "fail");
    }

    #[tokio::test]
    async fn amount_mismatch_is_400() {
        let err = ReconcileError::AmountMismatch {
            expected: Price::from_cents(100).unwrap(),
            actual: Price::from_cents(1).unwrap(),
        };
        assert_eq!(notify_error_response(err).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_order_is_404_fail() {
        let response = notify_error_response(ReconcileError::OrderNotFound);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(text_of(response).await, "fail");
    }

    #[tokio::test]
    async fn store_failure_is_500_fail() {
        let response = notify_error_response(ReconcileError::Store("timeout".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn return_page_is_static_html() {
        let Html(page) = payment_return().await;
        assert!(page.contains("Payment received"));
    }
}
