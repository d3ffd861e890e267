//! In-memory ledger implementing all three store ports.
//!
//! One `tokio::sync::Mutex` guards every table, so each port call is a single
//! critical section. That makes this adapter the reference for the atomicity
//! contracts the Postgres adapters implement with row locks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::credit_code::CreditCode;
use crate::domain::entitlement::EntitlementRecord;
use crate::domain::foundation::{DomainError, ErrorCode, Identity, Origin, Timestamp};
use crate::domain::payment::{OrderKind, OrderStatus, PaidDetails, PaymentOrder};
use crate::domain::token::IssuanceTime;
use crate::ports::{
    CreditCodeRepository, CreditDecrement, EntitlementRepository, PaymentOrderRepository,
    RedeemOutcome, SaveResult, SettlementEffect, SettlementOutcome,
};

#[derive(Debug, Default)]
struct Tables {
    entitlements: HashMap<Identity, EntitlementRecord>,
    codes: HashMap<String, CreditCode>,
    orders: HashMap<String, PaymentOrder>,
}

impl Tables {
    fn origin_holder(&self, origin: &Origin) -> Option<&Identity> {
        self.entitlements
            .values()
            .find(|r| &r.bound_origin == origin)
            .map(|r| &r.identity)
    }
}

/// Shared in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `StoreTimeout` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::StoreTimeout,
                "In-memory store marked unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryLedger {
    async fn insert(&self, record: &EntitlementRecord) -> Result<(), DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        if tables.entitlements.contains_key(&record.identity) {
            return Err(DomainError::new(
                ErrorCode::IdentityAlreadyBound,
                "Identity already has an entitlement",
            ));
        }
        if tables.origin_holder(&record.bound_origin).is_some() {
            return Err(DomainError::new(
                ErrorCode::OriginAlreadyBound,
                "Origin is already bound",
            ));
        }

        tables
            .entitlements
            .insert(record.identity.clone(), record.clone());
        Ok(())
    }

    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        self.check_available()?;
        Ok(self.tables.lock().await.entitlements.get(identity).cloned())
    }

    async fn find_by_origin(
        &self,
        origin: &Origin,
    ) -> Result<Option<EntitlementRecord>, DomainError> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .entitlements
            .values()
            .find(|r| &r.bound_origin == origin)
            .cloned())
    }

    async fn decrement_credit(
        &self,
        identity: &Identity,
        issuance_time: IssuanceTime,
    ) -> Result<CreditDecrement, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        let record = match tables.entitlements.get_mut(identity) {
            Some(r) if r.is_current_issuance(issuance_time) => r,
            _ => return Ok(CreditDecrement::NotFound),
        };

        Ok(match record.consume_one(Timestamp::now()) {
            Some(remaining) => CreditDecrement::Decremented { remaining },
            None => CreditDecrement::Exhausted,
        })
    }

    async fn add_credit(&self, identity: &Identity, amount: i64) -> Result<i64, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        let record = tables.entitlements.get_mut(identity).ok_or_else(|| {
            DomainError::new(ErrorCode::EntitlementNotFound, "No entitlement for identity")
        })?;
        Ok(record.add_credit(amount, Timestamp::now())?)
    }
}

#[async_trait]
impl CreditCodeRepository for InMemoryLedger {
    async fn insert(&self, code: &CreditCode) -> Result<SaveResult, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        if tables.codes.contains_key(&code.code) {
            return Ok(SaveResult::AlreadyExists);
        }
        tables.codes.insert(code.code.clone(), code.clone());
        Ok(SaveResult::Inserted)
    }

    async fn redeem(
        &self,
        code: &str,
        identity: &Identity,
        now: Timestamp,
    ) -> Result<RedeemOutcome, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        let Some(entry) = tables.codes.get_mut(code) else {
            return Ok(RedeemOutcome::NotFound);
        };
        Ok(match entry.redeem(identity, now) {
            Ok(grant_amount) => RedeemOutcome::Redeemed { grant_amount },
            Err(_) => RedeemOutcome::AlreadyUsed,
        })
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<CreditCode>, DomainError> {
        self.check_available()?;
        Ok(self.tables.lock().await.codes.get(code).cloned())
    }
}

#[async_trait]
impl PaymentOrderRepository for InMemoryLedger {
    async fn save(&self, order: &PaymentOrder) -> Result<(), DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        if tables.orders.contains_key(&order.pay_id) {
            return Err(DomainError::new(
                ErrorCode::OrderConflict,
                format!("Order {} already exists", order.pay_id),
            ));
        }
        tables.orders.insert(order.pay_id.clone(), order.clone());
        Ok(())
    }

    async fn attach_gateway_info(&self, order: &PaymentOrder) -> Result<(), DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        let stored = tables.orders.get_mut(&order.pay_id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("Order {} not found", order.pay_id))
        })?;
        stored.gateway_order_id = order.gateway_order_id.clone();
        stored.pay_method = order.pay_method;
        stored.pay_url = order.pay_url.clone();
        if stored.status == OrderStatus::Pending {
            stored.really_paid = order.really_paid;
        }
        Ok(())
    }

    async fn find_by_pay_id(&self, pay_id: &str) -> Result<Option<PaymentOrder>, DomainError> {
        self.check_available()?;
        Ok(self.tables.lock().await.orders.get(pay_id).cloned())
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<PaymentOrder>, DomainError> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .find(|o| o.gateway_order_id.as_deref() == Some(gateway_order_id))
            .cloned())
    }

    async fn latest_pending_for_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<PaymentOrder>, DomainError> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .filter(|o| &o.identity == identity && o.status == OrderStatus::Pending)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn settle(
        &self,
        pay_id: &str,
        effect: SettlementEffect,
        details: &PaidDetails,
    ) -> Result<SettlementOutcome, DomainError> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        let tables = &mut *guard;

        let order = tables.orders.get(pay_id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("Order {} not found", pay_id))
        })?;
        if order.is_terminal() {
            return Ok(SettlementOutcome::AlreadyTerminal(order.status));
        }

        // Work on copies and write back only when every step succeeded.
        let mut order = order.clone();
        let mut record = tables
            .entitlements
            .get(&order.identity)
            .cloned()
            .ok_or_else(|| {
                DomainError::new(ErrorCode::EntitlementNotFound, "No entitlement for identity")
            })?;
        let now = details.paid_at;

        match (order.kind, effect) {
            (OrderKind::CreditPurchase, SettlementEffect::GrantCredit) => {
                record.add_credit(order.requested_amount, now)?;
            }
            (OrderKind::OriginRebind, SettlementEffect::Rebind(binding)) => {
                if let Some(holder) = tables.origin_holder(&binding.origin) {
                    if holder != &order.identity {
                        return Err(DomainError::new(
                            ErrorCode::OriginAlreadyBound,
                            "Rebind target is bound to another identity",
                        ));
                    }
                }
                record.rebind(binding, now);
            }
            (kind, _) => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Effect does not apply to a {} order", kind),
                ));
            }
        }

        order.mark_paid(details).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
        })?;

        let remaining_credit = record.remaining_credit;
        tables.entitlements.insert(record.identity.clone(), record);
        tables.orders.insert(order.pay_id.clone(), order.clone());

        Ok(SettlementOutcome::Settled {
            order,
            remaining_credit,
        })
    }

    async fn mark_failed(&self, pay_id: &str) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;

        match tables.orders.get_mut(pay_id) {
            Some(order) => Ok(order.mark_failed().is_ok()),
            None => Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", pay_id),
            )),
        }
    }
}
