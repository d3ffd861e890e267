//! Request and response bodies for payment orders.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{CheckOrderStatusResult, PlacedOrder};
use crate::domain::payment::PaymentOrder;
use crate::ports::GatewayOrderState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCreditPurchaseRequest {
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRebindOrderRequest {
    pub new_origin: String,
}

/// A freshly placed order and where to pay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrderResponse {
    pub pay_id: String,
    pub gateway_order_id: Option<String>,
    pub pay_url: Option<String>,
    /// Two-decimal yuan.
    pub price: String,
    /// The amount the payer is asked for; may differ from `price` by cents.
    pub really_price: Option<String>,
    pub timeout_minutes: i64,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        let order = placed.order;
        Self {
            pay_id: order.pay_id,
            gateway_order_id: order.gateway_order_id,
            pay_url: order.pay_url,
            price: order.price.to_string(),
            really_price: order.really_paid.map(|p| p.to_string()),
            timeout_minutes: placed.timeout_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub pay_id: String,
    pub kind: String,
    pub status: String,
    pub requested_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_origin: Option<String>,
    pub goods_name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub really_paid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_url: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
    /// What the gateway reported, when it was asked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_state: Option<GatewayOrderState>,
}

impl From<PaymentOrder> for OrderResponse {
    fn from(order: PaymentOrder) -> Self {
        Self {
            pay_id: order.pay_id,
            kind: order.kind.as_str().to_string(),
            status: order.status.as_str().to_string(),
            requested_amount: order.requested_amount,
            target_origin: order.target_origin.map(|o| o.to_string()),
            goods_name: order.goods_name,
            price: order.price.to_string(),
            really_paid: order.really_paid.map(|p| p.to_string()),
            gateway_order_id: order.gateway_order_id,
            pay_url: order.pay_url,
            created_at: order.created_at.as_datetime().to_rfc3339(),
            paid_at: order.paid_at.map(|t| t.as_datetime().to_rfc3339()),
            gateway_state: None,
        }
    }
}

impl From<CheckOrderStatusResult> for OrderResponse {
    fn from(result: CheckOrderStatusResult) -> Self {
        let mut response = OrderResponse::from(result.order);
        response.gateway_state = result.gateway_state;
        response
    }
}
