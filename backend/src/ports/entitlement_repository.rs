//! Entitlement repository port.
//!
//! # Atomicity
//!
//! `decrement_credit` is the verification critical section. Implementations
//! must check `remaining_credit > 0` and decrement in one atomic step, so two
//! concurrent verifications against a record with credit 1 cannot both win.

use async_trait::async_trait;

use crate::domain::entitlement::EntitlementRecord;
use crate::domain::foundation::{DomainError, Identity, Origin};
use crate::domain::token::IssuanceTime;

/// Result of an atomic check-and-decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditDecrement {
    /// One unit consumed; `remaining` is the credit after the decrement.
    Decremented { remaining: i64 },
    /// The record exists but has no credit left. Nothing was changed.
    Exhausted,
    /// No record matches the identity and issuance time.
    NotFound,
}

#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Insert a first-time entitlement.
    ///
    /// # Errors
    ///
    /// - `IdentityAlreadyBound` if the identity already has a record
    /// - `OriginAlreadyBound` if another identity is bound to the origin
    /// - `StoreTimeout` / `DatabaseError` on store failure
    async fn insert(&self, record: &EntitlementRecord) -> Result<(), DomainError>;

    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<EntitlementRecord>, DomainError>;

    async fn find_by_origin(&self, origin: &Origin)
        -> Result<Option<EntitlementRecord>, DomainError>;

    /// Atomically consume one unit of credit from the record matching both
    /// `identity` and `issuance_time`.
    async fn decrement_credit(
        &self,
        identity: &Identity,
        issuance_time: IssuanceTime,
    ) -> Result<CreditDecrement, DomainError>;

    /// Atomically add `amount` credit and return the new balance.
    ///
    /// # Errors
    ///
    /// - `EntitlementNotFound` if the identity has no record
    async fn add_credit(&self, identity: &Identity, amount: i64) -> Result<i64, DomainError>;
}
