//! Payment order entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::correlation::CorrelationParam;
use super::price::Price;
use super::status::OrderStatus;
use crate::domain::foundation::{Identity, Origin, StateMachine, Timestamp, ValidationError};

/// What a paid order does to the entitlement ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Adds `requested_amount` credit.
    CreditPurchase,
    /// Moves the binding to `target_origin` and reissues the token.
    OriginRebind,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::CreditPurchase => "credit_purchase",
            OrderKind::OriginRebind => "origin_rebind",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "credit_purchase" => Ok(OrderKind::CreditPurchase),
            "origin_rebind" => Ok(OrderKind::OriginRebind),
            other => Err(ValidationError::invalid_format(
                "kind",
                format!("unknown order kind: {}", other),
            )),
        }
    }

    /// Prefix of merchant-assigned pay ids. Informational only; the stored
    /// kind is what reconciliation trusts.
    pub fn pay_id_prefix(&self) -> &'static str {
        match self {
            OrderKind::CreditPurchase => "RECHARGE",
            OrderKind::OriginRebind => "CHANGE_IP",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the gateway reported when it settled an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidDetails {
    pub really_paid: Price,
    pub pay_method: i32,
    pub paid_at: Timestamp,
}

/// A purchase or rebind placed with the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOrder {
    pub pay_id: String,
    pub gateway_order_id: Option<String>,
    pub identity: Identity,
    pub kind: OrderKind,
    /// Credit units to grant; 0 for rebinds.
    pub requested_amount: i64,
    /// Origin to bind on settlement; set only for rebinds.
    pub target_origin: Option<Origin>,
    pub goods_name: String,
    pub price: Price,
    pub status: OrderStatus,
    pub really_paid: Option<Price>,
    pub pay_method: Option<i32>,
    pub pay_url: Option<String>,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
}

impl PaymentOrder {
    /// A pending order for `count` credit units at `unit_price` each.
    pub fn credit_purchase(
        identity: Identity,
        count: i64,
        unit_price: Price,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if count < 1 {
            return Err(ValidationError::out_of_range("count", 1, i64::MAX, count));
        }
        let price = unit_price.times(count)?;

        Ok(Self::pending(
            OrderKind::CreditPurchase,
            identity,
            count,
            None,
            format!("Recharge {} uses", count),
            price,
            now,
        ))
    }

    /// A pending order that rebinds `identity` to `target` once paid.
    pub fn origin_rebind(
        identity: Identity,
        target: Origin,
        price: Price,
        now: Timestamp,
    ) -> Self {
        let goods_name = format!("Rebind origin to {}", target);
        Self::pending(
            OrderKind::OriginRebind,
            identity,
            0,
            Some(target),
            goods_name,
            price,
            now,
        )
    }

    fn pending(
        kind: OrderKind,
        identity: Identity,
        requested_amount: i64,
        target_origin: Option<Origin>,
        goods_name: String,
        price: Price,
        now: Timestamp,
    ) -> Self {
        let pay_id = format!(
            "{}_{}_{}",
            kind.pay_id_prefix(),
            identity.as_str(),
            now.as_unix_nanos()
        );

        Self {
            pay_id,
            gateway_order_id: None,
            identity,
            kind,
            requested_amount,
            target_origin,
            goods_name,
            price,
            status: OrderStatus::Pending,
            really_paid: None,
            pay_method: None,
            pay_url: None,
            created_at: now,
            paid_at: None,
        }
    }

    /// The `param` value sent to the gateway and echoed back on notify.
    pub fn correlation_param(&self) -> CorrelationParam {
        CorrelationParam::new(self.identity.clone(), self.target_origin.clone())
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        &self.identity == identity
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Records what the gateway assigned after order creation.
    pub fn attach_gateway(
        &mut self,
        gateway_order_id: String,
        really_price: Price,
        pay_method: i32,
        pay_url: String,
    ) {
        self.gateway_order_id = Some(gateway_order_id);
        self.really_paid = Some(really_price);
        self.pay_method = Some(pay_method);
        self.pay_url = Some(pay_url);
    }

    /// Moves the order to `Paid`.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if the order is already terminal.
    pub fn mark_paid(&mut self, details: &PaidDetails) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(OrderStatus::Paid)?;
        self.really_paid = Some(details.really_paid);
        self.pay_method = Some(details.pay_method);
        self.paid_at = Some(details.paid_at);
        Ok(())
    }

    /// Moves the order to `Failed`.
    pub fn mark_failed(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(OrderStatus::Failed)?;
        Ok(())
    }
}
