//! ReconcilePaymentHandler - Applies a gateway payment notification exactly once.
//!
//! The gateway redelivers a notification until it gets a 2xx answer, so
//! every path here is either "applied now", "already applied" (both
//! acknowledged) or an error that makes the gateway try again.
//!
//! # Order Resolution
//!
//! The correlation param names the identity, whose newest pending order is
//! the candidate. The gateway order id wins when it disagrees with the
//! candidate, which also covers replays of orders that are no longer
//! pending.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entitlement::Binding;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{
    GatewaySigner, OrderKind, OrderStatus, PaymentNotification, PaymentOrder, ReconcileError,
    ReconcileOutcome, NOTIFY_SIGNATURE_FIELDS,
};
use crate::domain::token::{IssuanceTime, TokenClaims, TokenCodec};
use crate::ports::{
    ChatNotifier, PaymentNotice, PaymentOrderRepository, SettlementEffect, SettlementOutcome,
};

/// Raw notification parameters, query string and form body merged.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    pub params: HashMap<String, String>,
}

pub struct ReconcilePaymentHandler {
    orders: Arc<dyn PaymentOrderRepository>,
    codec: TokenCodec,
    signer: GatewaySigner,
    merchant_id: String,
    notifier: Arc<dyn ChatNotifier>,
}

impl ReconcilePaymentHandler {
    pub fn new(
        orders: Arc<dyn PaymentOrderRepository>,
        codec: TokenCodec,
        signer: GatewaySigner,
        merchant_id: impl Into<String>,
        notifier: Arc<dyn ChatNotifier>,
    ) -> Self {
        Self {
            orders,
            codec,
            signer,
            merchant_id: merchant_id.into(),
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        // 1. Required fields
        let notification = PaymentNotification::from_params(cmd.params)?;

        // 2. Merchant
        if notification.merchant_id != self.merchant_id {
            tracing::warn!(
                merchant_id = %notification.merchant_id,
                "Notification for another merchant"
            );
            return Err(ReconcileError::MerchantMismatch);
        }

        // 3. Signature
        self.signer
            .verify(NOTIFY_SIGNATURE_FIELDS, notification.params(), &notification.sign)
            .map_err(|e| {
                tracing::warn!(
                    gateway_order_id = %notification.gateway_order_id,
                    "Notification signature rejected"
                );
                e
            })?;

        // 4. Order
        let order = self.resolve_order(&notification).await?;

        if notification.price != order.price {
            tracing::error!(
                pay_id = %order.pay_id,
                expected = %order.price,
                actual = %notification.price,
                "Notification amount does not match order"
            );
            return Err(ReconcileError::AmountMismatch {
                expected: order.price,
                actual: notification.price,
            });
        }

        // 5. Idempotent replay
        if let Some(outcome) = self.already_handled(&order) {
            return Ok(outcome);
        }

        // 6-7. Settle and apply the effect in one transaction
        let effect = self.effect_for(&order)?;
        let details = notification.paid_details(Timestamp::now());

        let outcome = self
            .orders
            .settle(&order.pay_id, effect, &details)
            .await
            .map_err(|e| {
                let err = ReconcileError::from(e);
                tracing::error!(pay_id = %order.pay_id, error = %err, "Settlement failed");
                err
            })?;

        match outcome {
            SettlementOutcome::Settled {
                order,
                remaining_credit,
            } => {
                tracing::info!(
                    pay_id = %order.pay_id,
                    identity = %order.identity,
                    kind = %order.kind,
                    remaining_credit,
                    "Payment settled"
                );

                // 8. Fire and forget
                self.spawn_notice(&order, remaining_credit, &notification);
                Ok(ReconcileOutcome::Processed)
            }
            SettlementOutcome::AlreadyTerminal(status) => {
                // A concurrent delivery won the row lock
                let mut settled = order;
                settled.status = status;
                self.already_handled(&settled).ok_or_else(|| {
                    ReconcileError::InvalidTransition(format!(
                        "order {} reported terminal while {}",
                        settled.pay_id, status
                    ))
                })
            }
        }
    }

    async fn resolve_order(
        &self,
        notification: &PaymentNotification,
    ) -> Result<PaymentOrder, ReconcileError> {
        let candidate = match notification.correlation() {
            Some(param) => self.orders.latest_pending_for_identity(&param.identity).await?,
            None => None,
        };

        if let Some(order) = &candidate {
            if order.gateway_order_id.as_deref() == Some(notification.gateway_order_id.as_str()) {
                return Ok(order.clone());
            }
        }

        if let Some(order) = self
            .orders
            .find_by_gateway_order_id(&notification.gateway_order_id)
            .await?
        {
            return Ok(order);
        }

        candidate.ok_or_else(|| {
            tracing::warn!(
                gateway_order_id = %notification.gateway_order_id,
                "No order matches notification"
            );
            ReconcileError::OrderNotFound
        })
    }

    /// Outcome for an order that needs no further work.
    fn already_handled(&self, order: &PaymentOrder) -> Option<ReconcileOutcome> {
        match order.status {
            OrderStatus::Pending => None,
            OrderStatus::Paid => {
                tracing::info!(pay_id = %order.pay_id, "Notification replay acknowledged");
                Some(ReconcileOutcome::AlreadyProcessed)
            }
            OrderStatus::Failed => {
                tracing::error!(
                    pay_id = %order.pay_id,
                    identity = %order.identity,
                    "Paid notification for a failed order, needs manual review"
                );
                Some(ReconcileOutcome::AlreadyProcessed)
            }
        }
    }

    fn effect_for(&self, order: &PaymentOrder) -> Result<SettlementEffect, ReconcileError> {
        match order.kind {
            OrderKind::CreditPurchase => Ok(SettlementEffect::GrantCredit),
            OrderKind::OriginRebind => {
                let target = order.target_origin.clone().ok_or_else(|| {
                    ReconcileError::InvalidTransition(format!(
                        "rebind order {} has no target origin",
                        order.pay_id
                    ))
                })?;
                let claims = TokenClaims::new(order.identity.clone(), target, IssuanceTime::now());
                let token = self
                    .codec
                    .issue(&claims)
                    .map_err(|e| ReconcileError::Store(e.to_string()))?;
                Ok(SettlementEffect::Rebind(Binding::new(&claims, token)))
            }
        }
    }

    fn spawn_notice(
        &self,
        order: &PaymentOrder,
        remaining_credit: i64,
        notification: &PaymentNotification,
    ) {
        let notice = PaymentNotice {
            identity: order.identity.clone(),
            pay_id: order.pay_id.clone(),
            kind: order.kind,
            goods_name: order.goods_name.clone(),
            really_paid: order.really_paid.unwrap_or(notification.really_price),
            pay_method: order.pay_method.unwrap_or(notification.pay_type),
            remaining_credit,
            bound_origin: match order.kind {
                OrderKind::OriginRebind => order.target_origin.clone(),
                OrderKind::CreditPurchase => None,
            },
        };
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            if let Err(e) = notifier.notify_payment(&notice).await {
                tracing::warn!(pay_id = %notice.pay_id, error = %e, "Payment notice not delivered");
            }
        });
    }
}
