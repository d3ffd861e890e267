//! Shared order placement for credit purchases and rebinds.
//!
//! The order is stored as pending before the gateway is called, so a
//! notification racing the gateway response always finds it.

use std::sync::Arc;

use crate::domain::payment::{PaymentOrder, PaymentOrderError, Price};
use crate::ports::{CreateOrderRequest, PaymentGateway, PaymentOrderRepository};

/// Prices and pay method used when placing orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPricing {
    pub price_per_use: Price,
    pub rebind_price: Price,
    /// 1 = WeChat, 2 = Alipay.
    pub pay_type: i32,
}

/// An order registered with the gateway, ready to be paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: PaymentOrder,
    pub timeout_minutes: i64,
}

pub(super) struct OrderPlacer {
    orders: Arc<dyn PaymentOrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    pay_type: i32,
}

impl OrderPlacer {
    pub(super) fn new(
        orders: Arc<dyn PaymentOrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        pay_type: i32,
    ) -> Self {
        Self {
            orders,
            gateway,
            pay_type,
        }
    }

    pub(super) async fn place(&self, mut order: PaymentOrder) -> Result<PlacedOrder, PaymentOrderError> {
        // 1. Persist as pending
        self.orders.save(&order).await?;

        // 2. Register with the gateway; no lock is held here
        let request = CreateOrderRequest {
            pay_id: order.pay_id.clone(),
            param: order.correlation_param().to_string(),
            pay_type: self.pay_type,
            price: order.price,
            goods_name: order.goods_name.clone(),
        };
        let created = match self.gateway.create_order(request).await {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(pay_id = %order.pay_id, error = %e, "Gateway refused order");
                if let Err(mark_err) = self.orders.mark_failed(&order.pay_id).await {
                    tracing::error!(
                        pay_id = %order.pay_id,
                        error = %mark_err,
                        "Could not mark unplaced order failed"
                    );
                }
                return Err(e.into());
            }
        };

        // 3. Attach what the gateway assigned
        order.attach_gateway(
            created.gateway_order_id,
            created.really_price,
            created.pay_type,
            created.pay_url,
        );
        self.orders.attach_gateway_info(&order).await?;

        tracing::info!(
            pay_id = %order.pay_id,
            kind = %order.kind,
            price = %order.price,
            "Payment order placed"
        );

        Ok(PlacedOrder {
            order,
            timeout_minutes: created.timeout_minutes,
        })
    }
}
