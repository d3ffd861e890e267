//! CreateCreditPurchaseHandler - Places an order for additional uses.

use std::sync::Arc;

use super::placement::{OrderPlacer, PaymentPricing, PlacedOrder};
use crate::domain::foundation::{Identity, Timestamp};
use crate::domain::payment::{PaymentOrder, PaymentOrderError};
use crate::ports::{EntitlementRepository, PaymentGateway, PaymentOrderRepository};

#[derive(Debug, Clone)]
pub struct CreateCreditPurchaseCommand {
    pub identity: Identity,
    /// Number of uses to buy.
    pub count: i64,
}

pub struct CreateCreditPurchaseHandler {
    entitlements: Arc<dyn EntitlementRepository>,
    placer: OrderPlacer,
    pricing: PaymentPricing,
}

impl CreateCreditPurchaseHandler {
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

    pub async fn handle(
        &self,
        cmd: CreateCreditPurchaseCommand,
    ) -> Result<PlacedOrder, PaymentOrderError> {
        if self
            .entitlements
            .find_by_identity(&cmd.identity)
            .await?
            .is_none()
        {
            return Err(PaymentOrderError::EntitlementMissing);
        }

        let order = PaymentOrder::credit_purchase(
            cmd.identity,
            cmd.count,
            self.pricing.price_per_use,
            Timestamp::now(),
        )?;
        self.placer.place(order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::application::handlers::testing::{cents, identity, origin, MockGateway};
    use crate::domain::entitlement::EntitlementRecord;
    use crate::domain::payment::{OrderKind, OrderStatus};
    use crate::domain::token::{IssuanceTime, TokenClaims};

    fn pricing() -> PaymentPricing {
        PaymentPricing {
            price_per_use: cents(10),
            rebind_price: cents(100),
            pay_type: 1,
        }
    }

    async fn seed_entitlement(ledger: &InMemoryLedger) {
        let claims = TokenClaims::new(identity("42"), origin("203.0.113.9"), IssuanceTime::from_millis(1_000));
        let record = EntitlementRecord::issue(&claims, "t".into(), 3, Timestamp::now()).unwrap();
        EntitlementRepository::insert(ledger, &record).await.unwrap();
    }

    fn handler(ledger: &InMemoryLedger, gateway: Arc<MockGateway>) -> CreateCreditPurchaseHandler {
        CreateCreditPurchaseHandler::new(
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            gateway,
            pricing(),
        )
    }

    fn command(count: i64) -> CreateCreditPurchaseCommand {
        CreateCreditPurchaseCommand {
            identity: identity("42"),
            count,
        }
    }

    #[tokio::test]
    async fn places_priced_order_and_stores_gateway_info() {
        let ledger = InMemoryLedger::new();
        seed_entitlement(&ledger).await;
        let gateway = Arc::new(MockGateway::new());

        let placed = handler(&ledger, gateway.clone()).handle(command(25)).await.unwrap();

        assert_eq!(placed.order.kind, OrderKind::CreditPurchase);
        assert_eq!(placed.order.price, cents(250));
        assert_eq!(placed.order.requested_amount, 25);
        assert!(placed.order.pay_id.starts_with("RECHARGE_42_"));
        assert_eq!(placed.timeout_minutes, 5);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].param, "42");
        assert_eq!(requests[0].price.to_string(), "2.50");

        let stored = ledger.find_by_pay_id(&placed.order.pay_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(stored.gateway_order_id, Some(format!("GW-{}", placed.order.pay_id)));
        assert!(stored.pay_url.is_some());
    }

    #[tokio::test]
    async fn requires_entitlement() {
        let ledger = InMemoryLedger::new();
        let gateway = Arc::new(MockGateway::new());
        let err = handler(&ledger, gateway.clone()).handle(command(1)).await.unwrap_err();
        assert_eq!(err, PaymentOrderError::EntitlementMissing);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_positive_count() {
        let ledger = InMemoryLedger::new();
        seed_entitlement(&ledger).await;
        let err = handler(&ledger, Arc::new(MockGateway::new()))
            .handle(command(0))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentOrderError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn gateway_failure_marks_order_failed() {
        let ledger = InMemoryLedger::new();
        seed_entitlement(&ledger).await;

        let err = handler(&ledger, Arc::new(MockGateway::failing()))
            .handle(command(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentOrderError::Gateway { retryable: true, .. }));

        let pending = ledger.latest_pending_for_identity(&identity("42")).await.unwrap();
        assert!(pending.is_none());
    }
}
