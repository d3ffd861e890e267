//! CreateRebindOrderHandler - Places an order to move an identity to a new origin.
//!
//! The target origin is stored on the order and is what settlement applies,
//! whatever the gateway echoes back in `param`.

use std::sync::Arc;

use super::placement::{OrderPlacer, PaymentPricing, PlacedOrder};
use crate::domain::foundation::{Identity, Origin, Timestamp};
use crate::domain::payment::{PaymentOrder, PaymentOrderError};
use crate::ports::{EntitlementRepository, PaymentGateway, PaymentOrderRepository};

#[derive(Debug, Clone)]
pub struct CreateRebindOrderCommand {
    pub identity: Identity,
    /// Requested origin, unvalidated.
    pub new_origin: String,
}

pub struct CreateRebindOrderHandler {
    entitlements: Arc<dyn EntitlementRepository>,
    placer: OrderPlacer,
    pricing: PaymentPricing,
}

impl CreateRebindOrderHandler {
    pub fn new(
        entitlements: Arc<dyn EntitlementRepository>,
        orders: Arc<dyn PaymentOrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        pricing: PaymentPricing,
    ) -> Self {
        Self {
            entitlements,
            placer: OrderPlacer::new(orders, gateway, pricing.pay_type),
            pricing,
        }
    }

    pub async fn handle(&self, cmd: CreateRebindOrderCommand) -> Result<PlacedOrder, PaymentOrderError> {
        // 1. Validate the target
        let target = Origin::parse_public(&cmd.new_origin)?;

        // 2. Only an existing binding can be moved
        let current = self
            .entitlements
            .find_by_identity(&cmd.identity)
            .await?
            .ok_or(PaymentOrderError::EntitlementMissing)?;
        if current.bound_origin == target {
            return Err(PaymentOrderError::SameOrigin);
        }

        // 3. Early check; settlement re-checks under lock
        if self.entitlements.find_by_origin(&target).await?.is_some() {
            return Err(PaymentOrderError::OriginAlreadyBound);
        }

        let order = PaymentOrder::origin_rebind(
            cmd.identity,
            target,
            self.pricing.rebind_price,
            Timestamp::now(),
        );
        self.placer.place(order).await
    }
}
