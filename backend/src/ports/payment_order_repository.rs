//! Payment order repository port.
//!
//! # Settlement
//!
//! `settle` is the reconciliation critical section. In one transaction the
//! implementation must:
//!
//! 1. Lock the order row
//! 2. Return `AlreadyTerminal` if the order is no longer pending
//! 3. Mark it paid with the gateway's details
//! 4. Apply the effect to the entitlement of the order's identity
//! 5. Commit, or roll back everything if step 4 fails
//!
//! No network call may happen while the lock is held.

use async_trait::async_trait;

use crate::domain::entitlement::Binding;
use crate::domain::foundation::{DomainError, Identity};
use crate::domain::payment::{OrderStatus, PaidDetails, PaymentOrder};

/// The ledger change a paid order causes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementEffect {
    /// Add the order's `requested_amount` to the entitlement.
    GrantCredit,
    /// Replace the entitlement's binding with a freshly issued one.
    Rebind(Binding),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The order was pending and is now paid, with its effect applied.
    Settled {
        order: PaymentOrder,
        remaining_credit: i64,
    },
    /// The order had already reached this terminal status. Nothing changed.
    AlreadyTerminal(OrderStatus),
}

#[async_trait]
pub trait PaymentOrderRepository: Send + Sync {
    /// Persist a new pending order.
    ///
    /// # Errors
    ///
    /// - `OrderConflict` if the pay id already exists
    async fn save(&self, order: &PaymentOrder) -> Result<(), DomainError>;

    /// Store gateway order id, quoted price, pay method and pay URL.
    async fn attach_gateway_info(&self, order: &PaymentOrder) -> Result<(), DomainError>;

    async fn find_by_pay_id(&self, pay_id: &str) -> Result<Option<PaymentOrder>, DomainError>;

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentOrder>, DomainError>;

    /// Most recently created pending order of `identity`.
    async fn latest_pending_for_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<PaymentOrder>, DomainError>;

    /// Settle a pending order and apply its effect atomically.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if no order has this pay id
    /// - `OriginAlreadyBound` if a rebind target is taken
    /// - `EntitlementNotFound` if the order's identity has no entitlement
    /// - `InvalidStateTransition` if the effect does not fit the order kind
    async fn settle(
        &self,
        pay_id: &str,
        effect: SettlementEffect,
        details: &PaidDetails,
    ) -> Result<SettlementOutcome, DomainError>;

    /// Move a pending order to failed. Returns false if it was not pending.
    async fn mark_failed(&self, pay_id: &str) -> Result<bool, DomainError>;
}
