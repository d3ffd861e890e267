//! CheckOrderStatusHandler - Query handler for an order's state.
//!
//! A gateway "failed" report moves a pending order to failed. A "paid"
//! report is only shown; credit is granted exclusively by the signed
//! notification.

use std::sync::Arc;

use crate::domain::foundation::Identity;
use crate::domain::payment::{OrderStatus, PaymentOrder, PaymentOrderError};
use crate::ports::{GatewayOrderState, PaymentGateway, PaymentOrderRepository};

#[derive(Debug, Clone)]
pub struct CheckOrderStatusQuery {
    pub identity: Identity,
    pub pay_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOrderStatusResult {
    pub order: PaymentOrder,
    /// `None` when the gateway was not asked or did not answer.
    pub gateway_state: Option<GatewayOrderState>,
}

pub struct CheckOrderStatusHandler {
    orders: Arc<dyn PaymentOrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CheckOrderStatusHandler {
    pub fn new(orders: Arc<dyn PaymentOrderRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { orders, gateway }
    }

    pub async fn handle(
        &self,
        query: CheckOrderStatusQuery,
    ) -> Result<CheckOrderStatusResult, PaymentOrderError> {
        // Someone else's order looks exactly like a missing one
        let mut order = self
            .orders
            .find_by_pay_id(&query.pay_id)
            .await?
            .filter(|o| o.is_owned_by(&query.identity))
            .ok_or(PaymentOrderError::NotFound)?;

        let gateway_order_id = match order.gateway_order_id.clone() {
            Some(id) if order.status == OrderStatus::Pending => id,
            _ => {
                return Ok(CheckOrderStatusResult {
                    order,
                    gateway_state: None,
                })
            }
        };

        let gateway_state = match self.gateway.query_order(&gateway_order_id).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(pay_id = %order.pay_id, error = %e, "Gateway order query failed");
                return Ok(CheckOrderStatusResult {
                    order,
                    gateway_state: None,
                });
            }
        };

        if gateway_state == GatewayOrderState::Failed && self.orders.mark_failed(&order.pay_id).await? {
            tracing::info!(pay_id = %order.pay_id, "Order marked failed after gateway report");
            order.mark_failed()?;
        }

        Ok(CheckOrderStatusResult {
            order,
            gateway_state: Some(gateway_state),
        })
    }
}
